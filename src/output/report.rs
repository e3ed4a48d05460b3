use std::path::Path;

use serde::Serialize;

use crate::error::AppError;
use crate::models::{JobListing, MatchResult};

const LISTING_HEADER: [&str; 7] = [
    "site",
    "id",
    "role",
    "role_url",
    "location",
    "department",
    "first_published",
];

const MATCH_HEADER: [&str; 8] = [
    "role",
    "role_url",
    "location",
    "match_score",
    "department",
    "first_published",
    "id",
    "site",
];

/// Header is written up front so empty runs still produce a valid file.
fn writer_with_header(
    path: &Path,
    header: &[&str],
) -> Result<csv::Writer<std::fs::File>, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(header)?;
    Ok(writer)
}

#[derive(Debug, Serialize)]
struct ListingRow<'a> {
    site: &'a str,
    id: &'a str,
    role: &'a str,
    role_url: &'a str,
    location: &'a str,
    department: Option<&'a str>,
    first_published: Option<String>,
}

#[derive(Debug, Serialize)]
struct MatchRow<'a> {
    role: &'a str,
    role_url: &'a str,
    location: &'a str,
    match_score: String,
    department: Option<&'a str>,
    first_published: Option<String>,
    id: &'a str,
    site: &'a str,
}

pub fn write_listings(path: &Path, listings: &[JobListing]) -> Result<(), AppError> {
    let mut writer = writer_with_header(path, &LISTING_HEADER)?;
    for listing in listings {
        writer.serialize(ListingRow {
            site: &listing.site,
            id: &listing.id,
            role: &listing.role,
            role_url: &listing.url,
            location: &listing.location,
            department: listing.department.as_deref(),
            first_published: listing.published_at.map(|d| d.to_string()),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per ranked result, in the order given.
pub fn write_matches(path: &Path, results: &[MatchResult]) -> Result<(), AppError> {
    let mut writer = writer_with_header(path, &MATCH_HEADER)?;
    for result in results {
        let listing = result.listing();
        writer.serialize(MatchRow {
            role: &listing.role,
            role_url: &listing.url,
            location: &listing.location,
            match_score: format!("{:.2}", result.score()),
            department: listing.department.as_deref(),
            first_published: listing.published_at.map(|d| d.to_string()),
            id: &listing.id,
            site: &listing.site,
        })?;
    }
    writer.flush()?;
    Ok(())
}
