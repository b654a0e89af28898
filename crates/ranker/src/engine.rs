use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use catalog::{Catalog, CatalogEntry};
use rayon::prelude::*;

use crate::error::RankError;
use crate::similarity::{cosine_with_norms, l2_norm};
use crate::types::ScoredResult;

/// Catalogs at least this large are scored on the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 4096;

/// Below this size a full sort is always cheaper than heap bookkeeping.
const HEAP_MIN_CATALOG: usize = 64;

/// Rank every catalog entry against `query` and return the best `limit`.
///
/// Output is ordered by descending cosine similarity; equal scores keep
/// catalog order. Entries whose stored vector has zero length score 0.
///
/// Fails with [`RankError::EmptyCatalog`] before looking at anything else,
/// then checks the limit, the query dimensionality and the query contents.
pub fn rank(query: &[f32], catalog: &Catalog, limit: usize) -> Result<Vec<ScoredResult>, RankError> {
    let dimension = match catalog.dimension() {
        Some(d) if !catalog.is_empty() => d,
        _ => return Err(RankError::EmptyCatalog),
    };
    if limit == 0 {
        return Err(RankError::InvalidLimit(limit));
    }
    if query.len() != dimension {
        return Err(RankError::DimensionMismatch {
            query: query.len(),
            catalog: dimension,
        });
    }
    if let Some(pos) = query.iter().position(|v| !v.is_finite()) {
        return Err(RankError::InvalidQuery(format!(
            "component {pos} is not a finite number"
        )));
    }
    let query_norm = l2_norm(query);
    if query_norm == 0.0 {
        return Err(RankError::ZeroQuery);
    }

    if catalog.zero_norm_entries() > 0 {
        tracing::debug!(
            zero_norm_entries = catalog.zero_norm_entries(),
            "catalog contains zero-norm embeddings; scoring them as 0"
        );
    }

    let scores = score_all(query, query_norm, catalog);
    let k = limit.min(scores.len());
    let selected = if k < scores.len() / 4 && scores.len() >= HEAP_MIN_CATALOG {
        heap_select(&scores, k)
    } else {
        full_sort(&scores, k)
    };

    tracing::debug!(
        catalog_size = scores.len(),
        limit,
        returned = selected.len(),
        top_score = selected.first().map(|c| c.score),
        "ranked catalog"
    );

    let entries = catalog.entries();
    Ok(selected
        .into_iter()
        .enumerate()
        .map(|(pos, c)| ScoredResult::new(entries[c.index].product.clone(), c.score, pos + 1, c.index))
        .collect())
}

fn score_all(query: &[f32], query_norm: f64, catalog: &Catalog) -> Vec<f32> {
    let score = |entry: &CatalogEntry| {
        cosine_with_norms(query, query_norm, entry.vector.as_slice(), entry.norm())
    };
    if catalog.len() >= PARALLEL_THRESHOLD {
        catalog.entries().par_iter().map(score).collect()
    } else {
        catalog.entries().iter().map(score).collect()
    }
}

/// Ordering key: a candidate is "greater" when it ranks higher.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    index: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

fn candidates(scores: &[f32]) -> impl Iterator<Item = Candidate> + '_ {
    scores
        .iter()
        .enumerate()
        .map(|(index, &score)| Candidate { score, index })
}

fn full_sort(scores: &[f32], k: usize) -> Vec<Candidate> {
    let mut all: Vec<Candidate> = candidates(scores).collect();
    all.sort_by(|a, b| b.cmp(a));
    all.truncate(k);
    all
}

/// O(N log K) selection: keep the best `k` seen so far in a min-heap.
fn heap_select(scores: &[f32], k: usize) -> Vec<Candidate> {
    let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(k + 1);
    for c in candidates(scores) {
        if heap.len() < k {
            heap.push(Reverse(c));
            continue;
        }
        let beats_worst = heap.peek().is_some_and(|Reverse(worst)| c > *worst);
        if beats_worst {
            heap.pop();
            heap.push(Reverse(c));
        }
    }
    let mut best: Vec<Candidate> = heap.into_iter().map(|Reverse(c)| c).collect();
    best.sort_by(|a, b| b.cmp(a));
    best
}
