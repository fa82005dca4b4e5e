use crate::bm25::{Bm25Params, DEFAULT_B, DEFAULT_K1};
use crate::cache::DEFAULT_CACHE_LIMIT;
use crate::error::ConfigError;
use crate::prompt::PromptTemplate;
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_K: usize = 3;
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 600;
pub const DEFAULT_OVERLAP: usize = 60;
pub const DEFAULT_SUMMARIZE_LINES: usize = 3;

/// Construction-time options for [`crate::engine::RagEngine`]. Every field has a
/// default, so a config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Number of passages returned by a search.
    pub k: usize,
    pub max_chunk_chars: usize,
    pub overlap: usize,
    /// Sentences kept per passage in an enhanced prompt.
    pub summarize_lines: usize,
    pub cache_limit: usize,
    pub k1: f64,
    pub b: f64,
    /// Replaces the built-in stop-word list when set.
    pub stop_words: Option<Vec<String>>,
    pub prompt: PromptTemplate,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            overlap: DEFAULT_OVERLAP,
            summarize_lines: DEFAULT_SUMMARIZE_LINES,
            cache_limit: DEFAULT_CACHE_LIMIT,
            k1: DEFAULT_K1,
            b: DEFAULT_B,
            stop_words: None,
            prompt: PromptTemplate::default(),
        }
    }
}

impl RagConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k == 0 {
            return Err(ConfigError::Invalid("k must be at least 1".into()));
        }
        if self.max_chunk_chars == 0 {
            return Err(ConfigError::Invalid("max_chunk_chars must be at least 1".into()));
        }
        if self.summarize_lines == 0 {
            return Err(ConfigError::Invalid("summarize_lines must be at least 1".into()));
        }
        if self.cache_limit == 0 {
            return Err(ConfigError::Invalid("cache_limit must be at least 1".into()));
        }
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(ConfigError::Invalid(format!("k1 must be a non-negative number, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(ConfigError::Invalid(format!("b must be within [0, 1], got {}", self.b)));
        }
        Ok(())
    }

    pub fn bm25(&self) -> Bm25Params { Bm25Params { k1: self.k1, b: self.b } }

    pub fn tokenizer(&self) -> Tokenizer {
        match &self.stop_words {
            Some(words) => Tokenizer::with_stopwords(words),
            None => Tokenizer::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = RagConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!((c.k, c.max_chunk_chars, c.overlap, c.summarize_lines, c.cache_limit), (3, 600, 60, 3, 64));
        assert_eq!(c.bm25(), Bm25Params { k1: 1.5, b: 0.75 });
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad = [
            RagConfig { max_chunk_chars: 0, ..RagConfig::default() },
            RagConfig { cache_limit: 0, ..RagConfig::default() },
            RagConfig { b: 1.5, ..RagConfig::default() },
            RagConfig { k1: f64::NAN, ..RagConfig::default() },
            RagConfig { k: 0, ..RagConfig::default() },
        ];
        for c in bad {
            assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn reads_partial_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag.json");
        std::fs::write(&path, r#"{ "k": 5, "stop_words": ["reze"] }"#).unwrap();
        let c = RagConfig::from_json_file(&path).unwrap();
        assert_eq!(c.k, 5);
        assert_eq!(c.overlap, DEFAULT_OVERLAP);
        assert!(c.tokenizer().tokenize("Reze cafe").iter().all(|t| t != "reze"));
    }

    #[test]
    fn reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(RagConfig::from_json_file(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(RagConfig::from_json_file(dir.path().join("missing.json")), Err(ConfigError::Read { .. })));
    }
}
