//! Brute-force cosine scoring
//!
//! Every query is scored against every passage vector. At knowledge base
//! sizes of a few hundred passages this is cheaper than maintaining an index.

use crate::embedding::cosine_similarity;
use crate::error::{Result, RetrievalError};

/// Default minimum similarity for a match
pub const DEFAULT_THRESHOLD: f32 = 0.2;

/// Ranked search configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum results to return
    pub limit: usize,
    /// Minimum cosine similarity (default: 0.2)
    pub threshold: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: 3,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Reject thresholds that would make matching meaningless
///
/// Cosine similarity lives in [-1, 1]; anything above always fails and
/// anything below always passes, so those are treated as caller errors.
pub fn validate_threshold(threshold: f32) -> Result<()> {
    if threshold.is_finite() && (-1.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(RetrievalError::InvalidThreshold(threshold))
    }
}

/// Score a query against every vector, index-aligned
pub fn score_all<V: AsRef<[f32]>>(query: &[f32], vectors: &[V]) -> Vec<f32> {
    vectors
        .iter()
        .map(|v| cosine_similarity(query, v.as_ref()))
        .collect()
}

/// Index and score of the maximum
///
/// Ties resolve to the lowest index. NaN scores never win.
pub fn best_match(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best
}

/// Indices whose score reaches `threshold`, best first, at most `limit`
///
/// Equal scores keep index order.
pub fn rank(scores: &[f32], threshold: f32, limit: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| !score.is_nan() && *score >= threshold)
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}
