//! Keyword prefilter run before the description stage.
//!
//! A listing matches when any keyword is a substring of its role or
//! department (case-insensitive). Its score is `len(keyword) / len(role)`,
//! maximised over matching keywords, so short titles that are mostly the
//! keyword rank first.

use std::path::Path;

use crate::error::AppError;
use crate::models::JobListing;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionPolicy {
    /// Keep every matching listing, optionally only the `limit` best.
    Membership { limit: Option<usize> },
    /// Keep matching listings scoring at or above the `fraction` quantile of
    /// the score distribution over all listings.
    TopPercentile { fraction: f64 },
}

#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    /// One keyword or phrase per non-empty line.
    pub fn parse(text: &str) -> Self {
        let keywords = text
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|line| !line.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read keywords file {}: {e}", path.display()))
        })?;
        let set = Self::parse(&text);
        if set.is_empty() {
            return Err(AppError::Config(format!(
                "keywords file {} has no keywords",
                path.display()
            )));
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Best `len(keyword) / len(role)` over matching keywords, or `None`.
    pub fn score(&self, listing: &JobListing) -> Option<f64> {
        let role = listing.role.to_lowercase();
        let department = listing
            .department
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();
        let role_len = role.chars().count();
        if role_len == 0 {
            return None;
        }

        self.keywords
            .iter()
            .filter(|keyword| {
                role.contains(keyword.as_str()) || department.contains(keyword.as_str())
            })
            .map(|keyword| keyword.chars().count() as f64 / role_len as f64)
            .reduce(f64::max)
    }

    /// Apply `policy`; the survivors keep discovery order.
    pub fn select(&self, listings: Vec<JobListing>, policy: SelectionPolicy) -> Vec<JobListing> {
        let scored: Vec<(usize, Option<f64>)> = listings
            .iter()
            .enumerate()
            .map(|(idx, listing)| (idx, self.score(listing)))
            .collect();

        let mut keep: Vec<usize> = match policy {
            SelectionPolicy::Membership { limit } => {
                let mut matched: Vec<(usize, f64)> = scored
                    .iter()
                    .filter_map(|(idx, score)| score.map(|s| (*idx, s)))
                    .collect();
                if let Some(limit) = limit {
                    matched.sort_by(|a, b| b.1.total_cmp(&a.1));
                    matched.truncate(limit);
                }
                matched.into_iter().map(|(idx, _)| idx).collect()
            }
            SelectionPolicy::TopPercentile { fraction } => {
                let distribution: Vec<f64> =
                    scored.iter().map(|(_, s)| s.unwrap_or(0.0)).collect();
                match percentile_cutoff(&distribution, fraction) {
                    Some(cutoff) => scored
                        .iter()
                        .filter_map(|(idx, score)| match score {
                            Some(s) if *s >= cutoff => Some(*idx),
                            _ => None,
                        })
                        .collect(),
                    None => Vec::new(),
                }
            }
        };
        keep.sort_unstable();

        let mut keep = keep.into_iter().peekable();
        listings
            .into_iter()
            .enumerate()
            .filter_map(|(idx, listing)| {
                if keep.peek() == Some(&idx) {
                    keep.next();
                    Some(listing)
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Score of the `ceil(fraction * n)`-th largest value. Anything at or above
/// it is in the top `fraction`; ties at the boundary are therefore kept.
pub fn percentile_cutoff(scores: &[f64], fraction: f64) -> Option<f64> {
    if scores.is_empty() || fraction.is_nan() {
        return None;
    }
    let fraction = fraction.clamp(0.0, 1.0);
    // 0.07 * 100 is 7.000000000000001 in f64; it must still keep 7.
    let keep = (fraction * scores.len() as f64 - 1e-9).ceil().max(0.0) as usize;
    if keep == 0 {
        return None;
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted[sorted.len() - keep])
}
