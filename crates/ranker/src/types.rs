use catalog::{Catalog, ProductRecord};
use serde::{Deserialize, Serialize};

use crate::engine::rank;
use crate::error::RankError;

/// Result count used when the caller does not ask for one.
pub const DEFAULT_LIMIT: usize = 10;

/// A catalog product with its similarity to the query.
///
/// Only the ranker creates these; fields are read through accessors so a
/// result cannot be altered after ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    #[serde(flatten)]
    product: ProductRecord,
    score: f32,
    /// 1-based position in the ranked output.
    rank: usize,
    /// Position of the product in the catalog snapshot.
    #[serde(skip)]
    index: usize,
}

impl ScoredResult {
    pub(crate) fn new(product: ProductRecord, score: f32, rank: usize, index: usize) -> Self {
        Self {
            product,
            score,
            rank,
            index,
        }
    }

    pub fn product(&self) -> &ProductRecord {
        &self.product
    }

    /// Cosine similarity in [-1, 1].
    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn catalog_index(&self) -> usize {
        self.index
    }
}

/// Query vector, catalog and result bound for one ranking call.
#[derive(Debug, Clone, Copy)]
pub struct RankingRequest<'a> {
    pub query: &'a [f32],
    pub catalog: &'a Catalog,
    pub limit: usize,
}

impl<'a> RankingRequest<'a> {
    pub fn new(query: &'a [f32], catalog: &'a Catalog) -> Self {
        Self {
            query,
            catalog,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn execute(&self) -> Result<Vec<ScoredResult>, RankError> {
        rank(self.query, self.catalog, self.limit)
    }
}
