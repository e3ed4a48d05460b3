use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::models::JobListing;

const MAX_STEM_CHARS: usize = 50;
const URL_TRAILER: &str = "URL: ";

/// One text file per shortlisted listing, reused as a cache on later runs.
///
/// File name: sanitized role title plus a short digest of the listing id,
/// so two postings with the same title never share a file.
#[derive(Debug, Clone)]
pub struct DescriptionArchive {
    dir: PathBuf,
}

impl DescriptionArchive {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// An archive already on disk, for read-only use. `None` when `dir` is
    /// not a directory; nothing is created.
    pub fn existing(dir: impl Into<PathBuf>) -> Option<Self> {
        let dir = dir.into();
        dir.is_dir().then_some(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, listing: &JobListing) -> PathBuf {
        let digest = hex::encode(Sha256::digest(listing.id.as_bytes()));
        self.dir
            .join(format!("{}_{}.txt", sanitize_file_stem(&listing.role), &digest[..8]))
    }

    /// Cached description for `listing`, without the URL trailer.
    pub fn load(&self, listing: &JobListing) -> Option<String> {
        let text = fs::read_to_string(self.path_for(listing)).ok()?;
        let description = strip_trailer(&text);
        (!description.is_empty()).then(|| description.to_string())
    }

    pub fn store(&self, listing: &JobListing, description: &str) -> io::Result<PathBuf> {
        let path = self.path_for(listing);
        fs::write(
            &path,
            format!("{}\n\n{URL_TRAILER}{}\n", description.trim_end(), listing.url),
        )?;
        Ok(path)
    }

    /// Remove every archived description.
    pub fn clear(&self) -> io::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Every archived description as `(file name, text)`, sorted by name.
    pub fn load_all(&self) -> io::Result<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "txt") {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(text) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    entries.push((name, strip_trailer(&text).to_string()));
                }
                Err(e) => tracing::warn!("Skipping unreadable {}: {e}", path.display()),
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

/// Replace characters that are illegal in file names and cap the length.
pub fn sanitize_file_stem(role: &str) -> String {
    let stem: String = role
        .trim()
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
                '_'
            } else {
                c
            }
        })
        .take(MAX_STEM_CHARS)
        .collect();
    let stem = stem.trim_end_matches(['.', ' ']);
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem.to_string()
    }
}

fn strip_trailer(text: &str) -> &str {
    let trimmed = text.trim_end();
    match trimmed.rfind('\n') {
        Some(pos) if trimmed[pos + 1..].starts_with(URL_TRAILER) => trimmed[..pos].trim_end(),
        None if trimmed.starts_with(URL_TRAILER) => "",
        _ => trimmed,
    }
}
