//! rezerag-core - lexical retrieval over a character's background corpus.
//!
//! The corpus is split into paragraph chunks, indexed once, and ranked with
//! BM25 per query. The best chunks are compressed extractively and wrapped into
//! a prompt for a downstream generator.
//!
//! ```no_run
//! use rezerag_core::{AutoSource, EnhanceOptions, RagConfig, RagEngine};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let engine = RagEngine::new(RagConfig::default())?;
//! engine.load(&AutoSource::new()?, "reze_knowledge.txt").await?;
//! let prompt = engine.enhance_prompt("What did Reze do at the festival?", EnhanceOptions::default());
//! # Ok(())
//! # }
//! ```

pub mod bm25;
pub mod cache;
pub mod chunker;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod persist;
pub mod prompt;
pub mod source;
pub mod summarize;
pub mod tokenizer;

pub use bm25::Bm25Params;
pub use config::RagConfig;
pub use engine::{EngineObserver, EngineState, EnhanceOptions, RagEngine, SearchHit};
pub use error::{ConfigError, LoadError, SourceError};
pub use index::{Chunk, ChunkId, Corpus, DocumentFrequency, IndexStats, InvertedIndex, KnowledgeBase};
pub use prompt::PromptTemplate;
pub use source::{AutoSource, FileSource, HttpSource, StaticSource, TextSource};
