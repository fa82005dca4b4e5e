//! Okapi BM25 ranking over a [`KnowledgeBase`].

use crate::index::{Chunk, ChunkId, DocumentFrequency, KnowledgeBase};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_K1: f64 = 1.5;
pub const DEFAULT_B: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length normalization, 0 disables it.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self { Self { k1: DEFAULT_K1, b: DEFAULT_B } }
}

/// `ln((N - df + 0.5) / (df + 0.5) + 1)`, always positive for `df <= N`.
pub fn idf(n: usize, df: u32) -> f64 {
    let n = n as f64;
    let df = df as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Score one chunk. Query tokens missing from `doc_freq` contribute nothing;
/// repeated query tokens contribute once per occurrence.
pub fn score(
    query_tokens: &[String],
    chunk: &Chunk,
    n: usize,
    avg_len: f64,
    doc_freq: &DocumentFrequency,
    params: Bm25Params,
) -> f64 {
    let dl = chunk.len().max(1) as f64;
    let avg_len = if avg_len > 0.0 { avg_len } else { 1.0 };
    let Bm25Params { k1, b } = params;

    let mut total = 0.0;
    for q in query_tokens {
        let Some(&df) = doc_freq.get(q) else { continue };
        let f = chunk.tf(q) as f64;
        let denom = f + k1 * (1.0 - b + b * (dl / avg_len));
        if denom <= 0.0 {
            continue;
        }
        total += idf(n, df) * (f * (k1 + 1.0)) / denom;
    }
    total
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub chunk_id: ChunkId,
    pub score: f64,
}

/// Descending score, ties by ascending chunk id.
pub fn compare(a: &Ranked, b: &Ranked) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.chunk_id.cmp(&b.chunk_id))
}

/// Rank the chunks sharing at least one token with the query and keep the top `k`.
/// Chunks scoring zero are dropped.
pub fn rank(kb: &KnowledgeBase, query_tokens: &[String], params: Bm25Params, k: usize) -> Vec<Ranked> {
    let n = kb.corpus.len();
    let avg_len = kb.stats.average_chunk_length;

    let mut scored: Vec<Ranked> = kb
        .index
        .candidates(query_tokens)
        .into_iter()
        .filter_map(|id| kb.corpus.get(id))
        .map(|chunk| Ranked {
            chunk_id: chunk.id,
            score: score(query_tokens, chunk, n, avg_len, &kb.doc_freq, params),
        })
        .filter(|r| r.score > 0.0)
        .collect();
    scored.sort_by(compare);
    scored.truncate(k);
    scored
}
