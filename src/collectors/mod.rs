// Source adapters: one configured adapter per employer career site.
// Defines the trait, pagination tokens and the name registry.

pub mod adobe;
pub mod dropbox;
pub mod extract;
pub mod greenhouse_api;
pub mod html_board;
pub mod runner;
pub mod sony;

use std::fmt;

use async_trait::async_trait;
use url::Url;

use crate::error::AppError;
use crate::fetch::{FetchClient, RetryPolicy};
use crate::filters::GeographyFilter;
use crate::models::{JobListing, RawListing};

/// Opaque position within a site's listing. The pipeline only asks the
/// adapter's [`Pagination`] for the first and next token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageToken {
    Offset(u32),
    Page(u32),
    Bulk,
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageToken::Offset(n) => write!(f, "offset {n}"),
            PageToken::Page(n) => write!(f, "page {n}"),
            PageToken::Bulk => write!(f, "bulk"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// `offset = 0, step, 2*step, ..` up to and including `max_offset`.
    Offset { step: u32, max_offset: u32 },
    /// Page numbers `first..=last`.
    Page { first: u32, last: u32 },
    /// One request returns every posting.
    Bulk,
}

impl Pagination {
    pub fn first(&self) -> PageToken {
        match self {
            Pagination::Offset { .. } => PageToken::Offset(0),
            Pagination::Page { first, .. } => PageToken::Page(*first),
            Pagination::Bulk => PageToken::Bulk,
        }
    }

    pub fn next(&self, current: PageToken) -> Option<PageToken> {
        match (self, current) {
            (Pagination::Offset { step, max_offset }, PageToken::Offset(n)) => {
                let next = n.checked_add(*step)?;
                (*step > 0 && next <= *max_offset).then_some(PageToken::Offset(next))
            }
            (Pagination::Page { last, .. }, PageToken::Page(n)) => {
                (n < *last).then_some(PageToken::Page(n + 1))
            }
            _ => None,
        }
    }

    /// Cap the number of pages visited. Bulk listings are unaffected.
    pub fn limited_to(self, pages: u32) -> Self {
        let pages = pages.max(1);
        match self {
            Pagination::Offset { step, max_offset } => Pagination::Offset {
                step,
                max_offset: max_offset.min(step.saturating_mul(pages - 1)),
            },
            Pagination::Page { first, last } => Pagination::Page {
                first,
                last: last.min(first.saturating_add(pages - 1)),
            },
            Pagination::Bulk => Pagination::Bulk,
        }
    }
}

/// Per-site structural knowledge, read-only at run time.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub site: String,
    pub base_url: Url,
    /// Listing URL with an `{offset}` or `{page}` placeholder.
    pub listing_url: String,
    pub pagination: Pagination,
    /// Label some sites print in front of the location text.
    pub location_label: Option<&'static str>,
    pub geography: GeographyFilter,
    pub retry: RetryPolicy,
    /// Re-fetches allowed while a page is not content-ready.
    pub ready_reloads: u32,
}

impl AdapterConfig {
    pub fn page_url(&self, token: PageToken) -> String {
        match token {
            PageToken::Offset(n) => self.listing_url.replace("{offset}", &n.to_string()),
            PageToken::Page(n) => self.listing_url.replace("{page}", &n.to_string()),
            PageToken::Bulk => self.listing_url.clone(),
        }
    }

    /// Resolve a possibly relative link against the site's base URL.
    pub fn absolute_url(&self, href: &str) -> Option<String> {
        self.base_url.join(href.trim()).ok().map(|u| u.to_string())
    }
}

/// Knobs shared by every adapter, set from the command line.
#[derive(Debug, Clone, Copy)]
pub struct AdapterTuning {
    pub retry: RetryPolicy,
    pub ready_reloads: u32,
    pub max_pages: Option<u32>,
}

impl Default for AdapterTuning {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            ready_reloads: 1,
            max_pages: None,
        }
    }
}

impl AdapterTuning {
    pub(crate) fn pagination(&self, pagination: Pagination) -> Pagination {
        match self.max_pages {
            Some(pages) => pagination.limited_to(pages),
            None => pagination,
        }
    }
}

/// Postings found at one page token.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub listings: Vec<RawListing>,
}

impl ListingPage {
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Uniform contract over heterogeneous career sites.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn config(&self) -> &AdapterConfig;

    /// Site tag, also the prefix of every listing id.
    fn name(&self) -> &str {
        &self.config().site
    }

    /// Fetch the postings at `token`. Failures carry the token so the
    /// caller can skip the page and move on.
    async fn list_page(&self, client: &FetchClient, token: PageToken)
    -> Result<ListingPage, AppError>;

    /// Full description text, or `None` when the page never yields one.
    async fn fetch_description(
        &self,
        client: &FetchClient,
        listing: &JobListing,
    ) -> Result<Option<String>, AppError>;
}

/// Look up an adapter by name: `adobe`, `dropbox`, `sony` or
/// `greenhouse:<board>`.
pub fn get_collector(
    name: &str,
    tuning: &AdapterTuning,
) -> Result<Box<dyn SourceAdapter>, AppError> {
    let adapter: Box<dyn SourceAdapter> = match name {
        "adobe" => Box::new(adobe::adapter(tuning)?),
        "dropbox" => Box::new(dropbox::adapter(tuning)?),
        "sony" => Box::new(sony::adapter(tuning)?),
        other => match other.strip_prefix("greenhouse:") {
            Some(board) if !board.trim().is_empty() => {
                Box::new(greenhouse_api::GreenhouseApi::new(board.trim(), tuning)?)
            }
            _ => return Err(AppError::Config(format!("Unknown collector: {name}"))),
        },
    };
    Ok(adapter)
}
