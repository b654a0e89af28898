//! JSON catalog loading.
//!
//! Two on-disk layouts are supported:
//!
//! - **Paired**: a `products.json` array of `{id, name, category, image}` and an
//!   `embeddings.json` array of `{image, embedding}`. Row `i` of one file
//!   belongs to row `i` of the other.
//! - **Combined**: a single array of `{id, name, category, image, embedding}`.
//!
//! Loading always produces a fully validated [`Catalog`] or an error; a
//! partially read catalog is never returned.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CatalogLoadError;
use crate::types::{
    default_category, id_from_string_or_number, Catalog, CatalogEntry, EmbeddingVector,
    ProductRecord,
};

/// Where a catalog is persisted and in which layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum CatalogSource {
    Paired {
        products: PathBuf,
        embeddings: PathBuf,
    },
    Combined {
        path: PathBuf,
    },
}

impl Default for CatalogSource {
    fn default() -> Self {
        CatalogSource::Paired {
            products: PathBuf::from("data/products.json"),
            embeddings: PathBuf::from("data/embeddings.json"),
        }
    }
}

impl CatalogSource {
    pub fn paired(products: impl Into<PathBuf>, embeddings: impl Into<PathBuf>) -> Self {
        CatalogSource::Paired {
            products: products.into(),
            embeddings: embeddings.into(),
        }
    }

    pub fn combined(path: impl Into<PathBuf>) -> Self {
        CatalogSource::Combined { path: path.into() }
    }

    /// Read and validate the catalog this source points at.
    pub fn load(&self) -> Result<Catalog, CatalogLoadError> {
        match self {
            CatalogSource::Paired {
                products,
                embeddings,
            } => load_paired(products, embeddings),
            CatalogSource::Combined { path } => load_combined(path),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    #[serde(default)]
    image: Option<String>,
    embedding: EmbeddingVector,
}

#[derive(Debug, Deserialize)]
struct CombinedRow {
    #[serde(deserialize_with = "id_from_string_or_number")]
    id: String,
    name: String,
    #[serde(default = "default_category")]
    category: String,
    image: String,
    embedding: EmbeddingVector,
}

/// Load the paired `products.json` + `embeddings.json` layout.
pub fn load_paired(products: &Path, embeddings: &Path) -> Result<Catalog, CatalogLoadError> {
    let products: Vec<ProductRecord> = read_json(products)?;
    let rows: Vec<EmbeddingRow> = read_json(embeddings)?;

    if products.len() != rows.len() {
        return Err(CatalogLoadError::LengthMismatch {
            products: products.len(),
            embeddings: rows.len(),
        });
    }

    let mut entries = Vec::with_capacity(products.len());
    for (index, (product, row)) in products.into_iter().zip(rows).enumerate() {
        if let Some(embedding_image) = row.image {
            if embedding_image != product.image {
                return Err(CatalogLoadError::PairingMismatch {
                    index,
                    product_image: product.image,
                    embedding_image,
                });
            }
        }
        entries.push(CatalogEntry::new(product, row.embedding));
    }

    let catalog = Catalog::new(entries)?;
    tracing::info!(
        entries = catalog.len(),
        dimension = ?catalog.dimension(),
        zero_norm = catalog.zero_norm_entries(),
        "loaded paired catalog"
    );
    Ok(catalog)
}

/// Load the single-file layout where each row carries its own embedding.
pub fn load_combined(path: &Path) -> Result<Catalog, CatalogLoadError> {
    let rows: Vec<CombinedRow> = read_json(path)?;
    let entries = rows
        .into_iter()
        .map(|row| {
            CatalogEntry::new(
                ProductRecord {
                    id: row.id,
                    name: row.name,
                    category: row.category,
                    image: row.image,
                },
                row.embedding,
            )
        })
        .collect();

    let catalog = Catalog::new(entries)?;
    tracing::info!(
        entries = catalog.len(),
        dimension = ?catalog.dimension(),
        zero_norm = catalog.zero_norm_entries(),
        path = %path.display(),
        "loaded combined catalog"
    );
    Ok(catalog)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogLoadError> {
    let contents = fs::read_to_string(path).map_err(|e| CatalogLoadError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| CatalogLoadError::parse(path, e))
}
