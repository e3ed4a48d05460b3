use std::collections::HashSet;

use crate::models::{JobListing, MatchResult};

/// Drop repeated ids, keeping the first occurrence and discovery order.
pub fn dedupe(listings: Vec<JobListing>) -> Vec<JobListing> {
    let mut seen = HashSet::new();
    let before = listings.len();
    let unique: Vec<JobListing> = listings
        .into_iter()
        .filter(|listing| seen.insert(listing.id.clone()))
        .collect();

    let dropped = before - unique.len();
    if dropped > 0 {
        tracing::debug!("Dropped {dropped} duplicate listings");
    }
    unique
}

/// Order by score, highest first. The sort is stable, so equal scores keep
/// discovery order and repeated runs give identical output.
pub fn rank(mut results: Vec<MatchResult>, top_n: Option<usize>) -> Vec<MatchResult> {
    results.sort_by(|a, b| b.score().total_cmp(&a.score()));
    if let Some(n) = top_n {
        results.truncate(n);
    }
    results
}
