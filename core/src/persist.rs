use crate::index::KnowledgeBase;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub chunk_count: usize,
    pub created_at: String,
    pub version: u32,
}

pub struct SnapshotPaths {
    pub root: PathBuf,
}

impl SnapshotPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn chunks(&self) -> PathBuf { self.root.join("chunks.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Persist the chunk texts of a knowledge base. Tokens and the index are
/// derived data and get rebuilt on load.
pub fn save_snapshot(paths: &SnapshotPaths, kb: &KnowledgeBase) -> Result<()> {
    create_dir_all(&paths.root)?;
    let texts = kb.chunk_texts();
    let mut f = File::create(paths.chunks())?;
    let bytes = bincode::serialize(&texts)?;
    f.write_all(&bytes)?;

    let meta = MetaFile {
        chunk_count: texts.len(),
        created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "".into()),
        version: SNAPSHOT_VERSION,
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), chunks = meta.chunk_count, "snapshot saved");
    Ok(())
}

/// Load chunk texts, checking them against `meta.json`.
pub fn load_snapshot(paths: &SnapshotPaths) -> Result<Vec<String>> {
    let meta = load_meta(paths)?;
    if meta.version != SNAPSHOT_VERSION {
        bail!("unsupported snapshot version {} (expected {})", meta.version, SNAPSHOT_VERSION);
    }
    let mut f = File::open(paths.chunks()).with_context(|| format!("opening {}", paths.chunks().display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let texts: Vec<String> = bincode::deserialize(&buf)?;
    if texts.len() != meta.chunk_count {
        bail!("snapshot holds {} chunks but meta.json records {}", texts.len(), meta.chunk_count);
    }
    tracing::info!(root = %paths.root.display(), chunks = texts.len(), created_at = %meta.created_at, "snapshot loaded");
    Ok(texts)
}

pub fn save_meta(paths: &SnapshotPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &SnapshotPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;
    use tempfile::tempdir;

    #[test]
    fn snapshot_restores_identical_knowledge_base() {
        let dir = tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path());
        let tk = Tokenizer::default();
        let kb = KnowledgeBase::build("Reze works at a cafe.\n\nReze is the Bomb Devil.", 600, 60, &tk);
        save_snapshot(&paths, &kb).unwrap();

        let texts = load_snapshot(&paths).unwrap();
        assert_eq!(KnowledgeBase::from_chunk_texts(texts, &tk), kb);
        assert_eq!(load_meta(&paths).unwrap().chunk_count, 2);
    }

    #[test]
    fn rejects_mismatched_meta() {
        let dir = tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path());
        let kb = KnowledgeBase::build("one\n\ntwo", 600, 60, &Tokenizer::default());
        save_snapshot(&paths, &kb).unwrap();
        save_meta(&paths, &MetaFile { chunk_count: 5, created_at: String::new(), version: SNAPSHOT_VERSION }).unwrap();
        assert!(load_snapshot(&paths).is_err());
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(load_snapshot(&SnapshotPaths::new(dir.path().join("nope"))).is_err());
    }
}
