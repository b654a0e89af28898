use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ScoredResult;

/// Keep results scoring at least `min_score`, in their original order.
pub fn filter_by_score(results: &[ScoredResult], min_score: f32) -> Vec<&ScoredResult> {
    results.iter().filter(|r| r.score() >= min_score).collect()
}

/// Owned variant of [`filter_by_score`].
pub fn retain_by_score(mut results: Vec<ScoredResult>, min_score: f32) -> Vec<ScoredResult> {
    results.retain(|r| r.score() >= min_score);
    results
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("display threshold must be within [{min}, {max}], got {0}", min = DisplayThreshold::MIN, max = DisplayThreshold::MAX)]
pub struct InvalidThreshold(pub f32);

/// The minimum-score slider offered to end users.
///
/// Bounded to `[0.5, 1.0]`; starts at `0.8`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct DisplayThreshold(f32);

impl DisplayThreshold {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 1.0;
    pub const DEFAULT: f32 = 0.8;

    pub fn new(value: f32) -> Result<Self, InvalidThreshold> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidThreshold(value))
        }
    }

    /// Clamp `value` into range; NaN falls back to the default.
    pub fn clamped(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn apply(self, results: &[ScoredResult]) -> Vec<&ScoredResult> {
        filter_by_score(results, self.0)
    }
}

impl Default for DisplayThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<f32> for DisplayThreshold {
    type Error = InvalidThreshold;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DisplayThreshold> for f32 {
    fn from(t: DisplayThreshold) -> Self {
        t.0
    }
}
