use crate::models::JobListing;

/// A scored listing. Immutable once built; re-scoring makes a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    listing: JobListing,
    score: f64,
}

impl MatchResult {
    /// Scores outside `[0, 100]` (or NaN) are clamped into range.
    pub fn new(listing: JobListing, score: f64) -> Self {
        let score = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 100.0)
        };
        Self { listing, score }
    }

    pub fn listing(&self) -> &JobListing {
        &self.listing
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}
