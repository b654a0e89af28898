//! Vector similarity kernels.
//!
//! Accumulation is done in `f64` over fixed-size chunks so the inner loops
//! auto-vectorise and long CLIP-sized vectors keep their precision.

/// Chunk width for the unrolled dot/norm loops.
const SIMD_CHUNK_SIZE: usize = 32;

/// Dot product of two equal-length slices.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut total = 0.0f64;
    let mut a_chunks = a.chunks_exact(SIMD_CHUNK_SIZE);
    let mut b_chunks = b.chunks_exact(SIMD_CHUNK_SIZE);
    for (ca, cb) in a_chunks.by_ref().zip(b_chunks.by_ref()) {
        total += dot_chunk(ca, cb);
    }
    total + dot_chunk(a_chunks.remainder(), b_chunks.remainder())
}

#[inline(always)]
fn dot_chunk(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

/// Euclidean length of `v`.
#[inline]
pub fn l2_norm(v: &[f32]) -> f64 {
    dot(v, v).sqrt()
}

/// Cosine similarity given precomputed norms.
///
/// Returns 0 when either norm is zero and clamps to [-1, 1] so float drift
/// never produces a score like `1.0000001`.
#[inline]
pub fn cosine_with_norms(a: &[f32], norm_a: f64, b: &[f32], norm_b: f64) -> f32 {
    let denom = norm_a * norm_b;
    if denom == 0.0 {
        return 0.0;
    }
    (dot(a, b) / denom).clamp(-1.0, 1.0) as f32
}

/// Cosine similarity of two equal-length slices; 0 if either is a zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    cosine_with_norms(a, l2_norm(a), b, l2_norm(b))
}
