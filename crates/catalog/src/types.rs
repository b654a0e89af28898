use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CatalogLoadError;

/// Fixed-length embedding produced by the image model.
///
/// The values live behind an `Arc<[f32]>` so clones are cheap and no caller
/// can mutate a vector once it exists.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector(Arc<[f32]>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values.into())
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Number of components (the model's dimensionality D).
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Euclidean length, accumulated in `f64`.
    pub fn l2_norm(&self) -> f64 {
        self.0
            .iter()
            .map(|&v| f64::from(v) * f64::from(v))
            .sum::<f64>()
            .sqrt()
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

impl From<&[f32]> for EmbeddingVector {
    fn from(values: &[f32]) -> Self {
        Self(values.into())
    }
}

impl AsRef<[f32]> for EmbeddingVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl Serialize for EmbeddingVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EmbeddingVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<f32>::deserialize(deserializer).map(Self::new)
    }
}

/// Display metadata for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product identifier. Catalog files may store it as a number or a string.
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    /// Human-readable product name.
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// Image reference (relative path or URL) shown next to the result.
    pub image: String,
}

impl ProductRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            image: image.into(),
        }
    }
}

pub(crate) fn default_category() -> String {
    "General".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    })
}

/// A product paired with its precomputed embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub product: ProductRecord,
    pub vector: EmbeddingVector,
    norm: f64,
}

impl CatalogEntry {
    pub fn new(product: ProductRecord, vector: EmbeddingVector) -> Self {
        let norm = vector.l2_norm();
        Self {
            product,
            vector,
            norm,
        }
    }

    /// L2 norm of the stored vector, computed once at construction.
    pub fn norm(&self) -> f64 {
        self.norm
    }

    pub fn has_zero_norm(&self) -> bool {
        self.norm == 0.0
    }
}

/// Ordered, validated collection of catalog entries.
///
/// A `Catalog` guarantees that every vector has the same non-zero
/// dimensionality and only finite components. It may be empty; ranking
/// against an empty catalog is reported by the ranker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    dimension: Option<usize>,
    zero_norm_entries: usize,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogLoadError> {
        let mut dimension = None;
        let mut zero_norm_entries = 0;

        for (index, entry) in entries.iter().enumerate() {
            let found = entry.vector.dimension();
            if found == 0 {
                return Err(CatalogLoadError::EmptyEmbedding { index });
            }
            if !entry.vector.is_finite() {
                return Err(CatalogLoadError::NonFiniteComponent { index });
            }
            match dimension {
                None => dimension = Some(found),
                Some(expected) if expected != found => {
                    return Err(CatalogLoadError::InconsistentDimensions {
                        index,
                        expected,
                        found,
                    });
                }
                Some(_) => {}
            }
            if entry.has_zero_norm() {
                zero_norm_entries += 1;
                tracing::warn!(
                    index,
                    product_id = %entry.product.id,
                    "catalog entry has a zero-norm embedding; it will always score 0"
                );
            }
        }

        Ok(Self {
            entries,
            dimension,
            zero_norm_entries,
        })
    }

    /// Pair `products[i]` with `vectors[i]` and validate the result.
    pub fn from_parts(
        products: Vec<ProductRecord>,
        vectors: Vec<EmbeddingVector>,
    ) -> Result<Self, CatalogLoadError> {
        if products.len() != vectors.len() {
            return Err(CatalogLoadError::LengthMismatch {
                products: products.len(),
                embeddings: vectors.len(),
            });
        }
        let entries = products
            .into_iter()
            .zip(vectors)
            .map(|(product, vector)| CatalogEntry::new(product, vector))
            .collect();
        Self::new(entries)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shared dimensionality of every vector, `None` for an empty catalog.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    /// Entries whose stored vector has zero length (a data-quality issue).
    pub fn zero_norm_entries(&self) -> usize {
        self.zero_norm_entries
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
