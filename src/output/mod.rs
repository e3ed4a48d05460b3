pub mod archive;
pub mod report;

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::AppError;
use crate::models::{JobListing, MatchResult};

pub use archive::DescriptionArchive;

/// Everything a run leaves on disk, written once after scoring.
pub struct OutputSink {
    dir: PathBuf,
    archive: DescriptionArchive,
    stamp: String,
}

#[derive(Debug, Clone)]
pub struct WrittenFiles {
    pub listings_csv: PathBuf,
    pub matches_csv: PathBuf,
    pub archived: usize,
}

impl OutputSink {
    pub fn create(dir: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(dir)?;
        let archive = DescriptionArchive::open(dir.join("descriptions"))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            archive,
            stamp: Local::now().format("%d%m%Y").to_string(),
        })
    }

    pub fn archive(&self) -> &DescriptionArchive {
        &self.archive
    }

    /// Write both reports: every listing, and the ranked `matches`. Each
    /// listing in `described` that has text goes to the archive, whether or
    /// not it made the cut.
    pub fn write(
        &self,
        listings: &[JobListing],
        matches: &[MatchResult],
        described: &[MatchResult],
    ) -> Result<WrittenFiles, AppError> {
        let listings_csv = self.dir.join(format!("listings_{}.csv", self.stamp));
        report::write_listings(&listings_csv, listings)?;

        let matches_csv = self.dir.join(format!("matched_jobs_{}.csv", self.stamp));
        report::write_matches(&matches_csv, matches)?;

        let mut archived = 0;
        for result in described {
            let listing = result.listing();
            if let Some(description) = listing.description.as_deref() {
                self.archive.store(listing, description)?;
                archived += 1;
            }
        }

        Ok(WrittenFiles {
            listings_csv,
            matches_csv,
            archived,
        })
    }
}
