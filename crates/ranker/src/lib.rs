//! # vismatch ranker (`ranker`)
//!
//! Exhaustive cosine-similarity ranking of a query embedding against a
//! [`catalog::Catalog`], plus the score filter applied before display.
//!
//! Ranking is a pure function of `(query, catalog, limit)`: identical inputs
//! give identical output, ordered by descending score with ties in catalog
//! order. Large catalogs are scored in parallel; when only a small prefix is
//! requested a bounded heap replaces the full sort.
//!
//! ```
//! use catalog::{Catalog, EmbeddingVector, ProductRecord};
//! use ranker::{filter_by_score, rank};
//!
//! let catalog = Catalog::from_parts(
//!     vec![
//!         ProductRecord::new("1", "Red Shoe", "Footwear", "/images/red_shoe.jpg"),
//!         ProductRecord::new("2", "Blue Shoe", "Footwear", "/images/blue_shoe.jpg"),
//!     ],
//!     vec![
//!         EmbeddingVector::new(vec![1.0, 0.0]),
//!         EmbeddingVector::new(vec![0.0, 1.0]),
//!     ],
//! )
//! .unwrap();
//!
//! let results = rank(&[1.0, 0.0], &catalog, 10).unwrap();
//! assert_eq!(results[0].product().name, "Red Shoe");
//! assert_eq!(filter_by_score(&results, 0.8).len(), 1);
//! ```

pub mod engine;
pub mod error;
pub mod filter;
pub mod similarity;
pub mod types;

pub use crate::engine::{rank, PARALLEL_THRESHOLD};
pub use crate::error::RankError;
pub use crate::filter::{filter_by_score, retain_by_score, DisplayThreshold, InvalidThreshold};
pub use crate::similarity::cosine_similarity;
pub use crate::types::{RankingRequest, ScoredResult, DEFAULT_LIMIT};
