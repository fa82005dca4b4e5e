use crate::chunker;
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Position of a chunk in its corpus.
pub type ChunkId = usize;

/// token -> number of chunks containing it at least once
pub type DocumentFrequency = HashMap<String, u32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub tokens: Vec<String>,
    pub term_frequency: HashMap<String, u32>,
}

impl Chunk {
    pub fn new(id: ChunkId, text: String, tokenizer: &Tokenizer) -> Self {
        let tokens = tokenizer.tokenize(&text);
        let mut term_frequency: HashMap<String, u32> = HashMap::new();
        for tok in &tokens {
            *term_frequency.entry(tok.clone()).or_insert(0) += 1;
        }
        Self { id, text, tokens, term_frequency }
    }

    pub fn len(&self) -> usize { self.tokens.len() }
    pub fn is_empty(&self) -> bool { self.tokens.is_empty() }
    pub fn tf(&self, token: &str) -> u32 { self.term_frequency.get(token).copied().unwrap_or(0) }
}

/// Ordered chunks from one load; `chunks[i].id == i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    chunks: Vec<Chunk>,
}

impl Corpus {
    pub fn from_texts<I>(texts: I, tokenizer: &Tokenizer) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let chunks = texts
            .into_iter()
            .enumerate()
            .map(|(idx, text)| Chunk::new(idx, text, tokenizer))
            .collect();
        Self { chunks }
    }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }
    pub fn get(&self, id: ChunkId) -> Option<&Chunk> { self.chunks.get(id) }
    pub fn len(&self) -> usize { self.chunks.len() }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }
}

/// token -> (chunk id -> frequency); postings are ordered by chunk id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvertedIndex {
    postings: HashMap<String, BTreeMap<ChunkId, u32>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn postings(&self, token: &str) -> Option<&BTreeMap<ChunkId, u32>> { self.postings.get(token) }

    pub fn contains(&self, token: &str) -> bool { self.postings.contains_key(token) }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize { self.postings.len() }
    pub fn is_empty(&self) -> bool { self.postings.is_empty() }

    /// Union of the postings of every query token, in ascending chunk id order.
    pub fn candidates(&self, query_tokens: &[String]) -> BTreeSet<ChunkId> {
        query_tokens
            .iter()
            .filter_map(|t| self.postings.get(t))
            .flat_map(|p| p.keys().copied())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub chunk_count: usize,
    pub total_tokens: usize,
    pub average_chunk_length: f64,
}

/// Build postings, document frequencies and length statistics for a corpus.
pub fn build_index(corpus: &Corpus) -> (InvertedIndex, DocumentFrequency, IndexStats) {
    let mut index = InvertedIndex::new();
    let mut total_tokens = 0usize;

    for chunk in corpus.chunks() {
        total_tokens += chunk.len();
        for (tok, &freq) in &chunk.term_frequency {
            index.postings.entry(tok.clone()).or_default().insert(chunk.id, freq);
        }
    }

    let doc_freq: DocumentFrequency = index
        .postings
        .iter()
        .map(|(tok, postings)| (tok.clone(), postings.len() as u32))
        .collect();

    let chunk_count = corpus.len();
    let average_chunk_length = if chunk_count == 0 { 0.0 } else { total_tokens as f64 / chunk_count as f64 };
    let stats = IndexStats { chunk_count, total_tokens, average_chunk_length };
    (index, doc_freq, stats)
}

/// Corpus plus everything derived from it; built together and replaced together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeBase {
    pub corpus: Corpus,
    pub index: InvertedIndex,
    pub doc_freq: DocumentFrequency,
    pub stats: IndexStats,
}

impl KnowledgeBase {
    /// Chunk and index raw corpus text.
    pub fn build(raw: &str, max_chunk_chars: usize, overlap: usize, tokenizer: &Tokenizer) -> Self {
        Self::from_chunk_texts(chunker::chunk(raw, max_chunk_chars, overlap), tokenizer)
    }

    /// Index already-chunked passages, e.g. texts restored from a snapshot.
    pub fn from_chunk_texts(texts: Vec<String>, tokenizer: &Tokenizer) -> Self {
        let corpus = Corpus::from_texts(texts, tokenizer);
        let (index, doc_freq, stats) = build_index(&corpus);
        Self { corpus, index, doc_freq, stats }
    }

    pub fn chunk_texts(&self) -> Vec<String> {
        self.corpus.chunks().iter().map(|c| c.text.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb(texts: &[&str]) -> KnowledgeBase {
        KnowledgeBase::from_chunk_texts(texts.iter().map(|s| s.to_string()).collect(), &Tokenizer::default())
    }

    #[test]
    fn term_frequencies_sum_to_token_count() {
        let kb = kb(&["bomb bomb devil cafe", "denji chainsaw devil"]);
        for chunk in kb.corpus.chunks() {
            let sum: u32 = chunk.term_frequency.values().sum();
            assert_eq!(sum as usize, chunk.tokens.len());
        }
        assert_eq!(kb.corpus.get(0).map(|c| c.tf("bomb")), Some(2));
    }

    #[test]
    fn postings_match_term_frequencies() {
        let kb = kb(&["bomb bomb devil", "denji devil"]);
        let devil = kb.index.postings("devil").cloned().unwrap_or_default();
        assert_eq!(devil.into_iter().collect::<Vec<_>>(), vec![(0, 1), (1, 1)]);
        assert_eq!(kb.index.postings("bomb").and_then(|p| p.get(&0)).copied(), Some(2));
        assert_eq!(kb.doc_freq.get("devil"), Some(&2));
        assert_eq!(kb.doc_freq.get("bomb"), Some(&1));
        for (tok, df) in &kb.doc_freq {
            assert_eq!(kb.index.postings(tok).map(|p| p.len() as u32), Some(*df));
        }
    }

    #[test]
    fn chunk_ids_match_positions() {
        let kb = kb(&["one two", "three four", "five six", "seven eight"]);
        for (pos, chunk) in kb.corpus.chunks().iter().enumerate() {
            assert_eq!(chunk.id, pos);
            assert_eq!(kb.corpus.get(pos).map(|c| c.id), Some(pos));
        }
        assert!(kb.corpus.get(4).is_none());
    }

    #[test]
    fn average_length() {
        let kb = kb(&["bomb devil cafe", "denji"]);
        assert_eq!(kb.stats.total_tokens, 4);
        assert!((kb.stats.average_chunk_length - 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_corpus_is_valid() {
        let kb = kb(&[]);
        assert!(kb.index.is_empty());
        assert!(kb.doc_freq.is_empty());
        assert_eq!(kb.stats.average_chunk_length, 0.0);
    }

    #[test]
    fn rebuild_is_structurally_identical() {
        let texts = ["reze works at a cafe", "reze is the bomb devil"];
        assert_eq!(kb(&texts), kb(&texts));
    }

    #[test]
    fn candidates_are_union_of_postings() {
        let kb = kb(&["cafe coffee", "bomb devil", "cafe bomb"]);
        let q = vec!["cafe".to_string(), "devil".to_string(), "unknown".to_string()];
        assert_eq!(kb.index.candidates(&q).into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
        let q = vec!["coffee".to_string()];
        assert_eq!(kb.index.candidates(&q).into_iter().collect::<Vec<_>>(), vec![0]);
    }
}
