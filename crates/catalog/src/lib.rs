//! # vismatch catalog (`catalog`)
//!
//! The product catalog searched by the ranker: product metadata paired
//! one-to-one with precomputed image embeddings.
//!
//! - [`EmbeddingVector`]: immutable `f32` vector of the model's dimensionality.
//! - [`ProductRecord`] / [`CatalogEntry`]: display metadata and its vector.
//! - [`Catalog`]: validated, ordered entries sharing one dimensionality.
//! - [`CatalogSource`]: where the catalog lives on disk (paired or combined JSON).
//! - [`CatalogStore`]: the process-wide snapshot, swapped atomically on reload.
//!
//! ```no_run
//! use catalog::{CatalogSource, CatalogStore};
//!
//! let source = CatalogSource::paired("data/products.json", "data/embeddings.json");
//! let store = CatalogStore::load(&source).expect("catalog");
//! let snapshot = store.snapshot();
//! println!("{} products, D = {:?}", snapshot.len(), snapshot.dimension());
//! ```

pub mod error;
pub mod loader;
pub mod store;
pub mod types;

pub use crate::error::CatalogLoadError;
pub use crate::loader::{load_combined, load_paired, CatalogSource};
pub use crate::store::{CatalogSnapshot, CatalogStore};
pub use crate::types::{Catalog, CatalogEntry, EmbeddingVector, ProductRecord};
