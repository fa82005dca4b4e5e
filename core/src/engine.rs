//! The retrieval engine: owns one knowledge base and its query cache.
//!
//! Lifecycle is `Unloaded -> Loading -> Ready`. Every load, successful or not,
//! discards the previous knowledge base and clears the cache. Loads are
//! serialized; searches only ever read the knowledge base and take a short
//! lock on the cache.

use crate::bm25::{self, Bm25Params};
use crate::cache::{CacheStats, LruCache};
use crate::config::RagConfig;
use crate::error::{ConfigError, LoadError};
use crate::index::{Chunk, ChunkId, KnowledgeBase};
use crate::persist::{self, SnapshotPaths};
use crate::source::TextSource;
use crate::summarize;
use crate::tokenizer::Tokenizer;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    Unloaded,
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: ChunkId,
    pub score: f64,
    pub text: String,
}

/// Per-call overrides for [`RagEngine::enhance_prompt`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EnhanceOptions {
    pub k: Option<usize>,
    pub summarize_lines: Option<usize>,
}

/// Hooks fired by the engine. All methods default to no-ops.
pub trait EngineObserver: Send + Sync {
    fn on_loaded(&self, _chunks: usize, _average_chunk_length: f64) {}
    fn on_cache_hit(&self, _query: &str) {}
    fn on_cache_miss(&self, _query: &str) {}
}

struct NoopObserver;
impl EngineObserver for NoopObserver {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    k: usize,
}

enum Slot {
    Unloaded,
    Loading,
    Ready { kb: Arc<KnowledgeBase>, generation: u64 },
}

/// Drops the engine back to `Unloaded` unless the load it guards reached
/// `Ready`. Covers failed fetches and futures dropped mid-fetch.
struct LoadingGuard<'a> {
    slot: &'a RwLock<Slot>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.write();
        if matches!(*slot, Slot::Loading) {
            *slot = Slot::Unloaded;
        }
    }
}

struct QueryCache {
    /// Generation of the knowledge base the entries were computed against.
    generation: u64,
    lru: LruCache<CacheKey, Vec<SearchHit>>,
}

pub struct RagEngine {
    config: RagConfig,
    tokenizer: Tokenizer,
    bm25: Bm25Params,
    slot: RwLock<Slot>,
    cache: Mutex<QueryCache>,
    load_lock: tokio::sync::Mutex<u64>,
    observer: Arc<dyn EngineObserver>,
}

/// Cache key form of a query: lowercased and trimmed.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

impl RagEngine {
    pub fn new(config: RagConfig) -> Result<Self, ConfigError> {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    pub fn with_observer(config: RagConfig, observer: Arc<dyn EngineObserver>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tokenizer: config.tokenizer(),
            bm25: config.bm25(),
            slot: RwLock::new(Slot::Unloaded),
            cache: Mutex::new(QueryCache { generation: 0, lru: LruCache::new(config.cache_limit) }),
            load_lock: tokio::sync::Mutex::new(0),
            observer,
            config,
        })
    }

    pub fn config(&self) -> &RagConfig { &self.config }
    pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }

    pub fn state(&self) -> EngineState {
        match &*self.slot.read() {
            Slot::Unloaded => EngineState::Unloaded,
            Slot::Loading => EngineState::Loading,
            Slot::Ready { .. } => EngineState::Ready,
        }
    }

    pub fn is_ready(&self) -> bool { self.state() == EngineState::Ready }

    /// The current knowledge base, if ready.
    pub fn knowledge(&self) -> Option<Arc<KnowledgeBase>> {
        match &*self.slot.read() {
            Slot::Ready { kb, .. } => Some(kb.clone()),
            _ => None,
        }
    }

    pub fn chunk_count(&self) -> usize { self.knowledge().map_or(0, |kb| kb.corpus.len()) }

    pub fn average_chunk_length(&self) -> f64 {
        self.knowledge().map_or(0.0, |kb| kb.stats.average_chunk_length)
    }

    pub fn chunk(&self, id: ChunkId) -> Option<Chunk> {
        self.knowledge().and_then(|kb| kb.corpus.get(id).cloned())
    }

    /// Fetch corpus text from `source` and index it.
    pub async fn load(&self, source: &dyn TextSource, location: &str) -> Result<(), LoadError> {
        let mut generation = self.load_lock.lock().await;
        let _loading = self.begin_loading();
        tracing::debug!(location, "loading knowledge");

        match source.fetch(location).await {
            Ok(raw) => {
                let kb = KnowledgeBase::build(&raw, self.config.max_chunk_chars, self.config.overlap, &self.tokenizer);
                self.install(kb, &mut generation);
                Ok(())
            }
            Err(source) => {
                tracing::warn!(location, error = %source, "knowledge load failed");
                Err(LoadError::Source { location: location.to_string(), source })
            }
        }
    }

    /// Index text that has already been fetched.
    pub async fn load_text(&self, raw: &str) {
        let mut generation = self.load_lock.lock().await;
        let _loading = self.begin_loading();
        let kb = KnowledgeBase::build(raw, self.config.max_chunk_chars, self.config.overlap, &self.tokenizer);
        self.install(kb, &mut generation);
    }

    /// Restore chunk texts saved by [`persist::save_snapshot`] and re-index them.
    pub async fn load_snapshot<P: AsRef<Path>>(&self, dir: P) -> Result<(), LoadError> {
        let dir = dir.as_ref();
        let mut generation = self.load_lock.lock().await;
        let _loading = self.begin_loading();

        match persist::load_snapshot(&SnapshotPaths::new(dir)) {
            Ok(texts) => {
                self.install(KnowledgeBase::from_chunk_texts(texts, &self.tokenizer), &mut generation);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(path = %dir.display(), error = %err, "snapshot load failed");
                Err(LoadError::Snapshot { path: dir.to_path_buf(), message: format!("{err:#}") })
            }
        }
    }

    /// Write the current knowledge base to `dir`. Fails when not ready.
    pub fn save_snapshot<P: AsRef<Path>>(&self, dir: P) -> anyhow::Result<()> {
        let kb = self.knowledge().ok_or_else(|| anyhow::anyhow!("no knowledge base loaded"))?;
        persist::save_snapshot(&SnapshotPaths::new(dir), &kb)
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        *self.slot.write() = Slot::Loading;
        self.cache.lock().lru.clear();
        LoadingGuard { slot: &self.slot }
    }

    fn install(&self, kb: KnowledgeBase, generation: &mut u64) {
        *generation += 1;
        let (chunks, avg_len) = (kb.corpus.len(), kb.stats.average_chunk_length);
        {
            let mut cache = self.cache.lock();
            cache.lru.clear();
            cache.generation = *generation;
        }
        *self.slot.write() = Slot::Ready { kb: Arc::new(kb), generation: *generation };
        tracing::info!(chunks, avg_len, "knowledge base loaded");
        self.observer.on_loaded(chunks, avg_len);
    }

    pub fn clear_cache(&self) { self.cache.lock().lru.clear(); }

    pub fn cache_stats(&self) -> CacheStats { self.cache.lock().lru.stats() }

    /// Top passages for `query`, best first. Returns an empty list when the
    /// engine is not ready or the query shares no tokens with the corpus.
    pub fn search(&self, query: &str, k: Option<usize>) -> Vec<SearchHit> {
        let (kb, generation) = match &*self.slot.read() {
            Slot::Ready { kb, generation } => (kb.clone(), *generation),
            _ => return Vec::new(),
        };
        let k = k.unwrap_or(self.config.k).max(1);
        let key = CacheKey { query: normalize_query(query), k };

        let cached = self.cache.lock().lru.get(&key).cloned();
        if let Some(hits) = cached {
            tracing::debug!(query = %key.query, "cache hit");
            self.observer.on_cache_hit(&key.query);
            return hits;
        }
        tracing::debug!(query = %key.query, "cache miss");
        self.observer.on_cache_miss(&key.query);

        let tokens = self.tokenizer.tokenize(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let hits: Vec<SearchHit> = bm25::rank(&kb, &tokens, self.bm25, k)
            .into_iter()
            .filter_map(|r| {
                kb.corpus.get(r.chunk_id).map(|c| SearchHit { chunk_id: r.chunk_id, score: r.score, text: c.text.clone() })
            })
            .collect();

        let mut cache = self.cache.lock();
        // a reload may have happened while scoring
        if cache.generation == generation {
            if let Some(evicted) = cache.lru.put(key, hits.clone()) {
                tracing::trace!(query = %evicted.query, "cache eviction");
            }
        }
        hits
    }

    /// Prefix `query` with summaries of its top passages. Returns `query`
    /// unchanged when retrieval finds nothing.
    pub fn enhance_prompt(&self, query: &str, opts: EnhanceOptions) -> String {
        let hits = self.search(query, opts.k);
        if hits.is_empty() {
            return query.to_string();
        }
        let lines = opts.summarize_lines.unwrap_or(self.config.summarize_lines);
        let summaries: Vec<String> = hits
            .iter()
            .map(|h| summarize::summarize(&self.tokenizer, &h.text, lines))
            .collect();
        self.config.prompt.render(&summaries, query)
    }
}
