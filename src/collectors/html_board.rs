use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::collectors::extract::{FieldRules, HtmlRule};
use crate::collectors::{AdapterConfig, ListingPage, PageToken, SourceAdapter};
use crate::error::AppError;
use crate::fetch::{FetchClient, FetchError, FetchOptions, RawResponse};
use crate::models::{JobListing, RawListing};

/// Pause before re-fetching a page that was not content-ready.
const RELOAD_PAUSE: Duration = Duration::from_secs(3);

/// Where each field lives in a site's markup.
#[derive(Debug, Clone)]
pub struct BoardMarkup {
    /// One match per posting on a listing page.
    pub listing: Selector,
    pub id: FieldRules<HtmlRule>,
    pub role: FieldRules<HtmlRule>,
    pub url: FieldRules<HtmlRule>,
    pub location: FieldRules<HtmlRule>,
    pub department: FieldRules<HtmlRule>,
    pub published_at: FieldRules<HtmlRule>,
    /// Applied to the whole posting page.
    pub description: FieldRules<HtmlRule>,
}

/// Career site served as server-rendered HTML. Everything site-specific is
/// in its [`AdapterConfig`] and [`BoardMarkup`].
#[derive(Debug, Clone)]
pub struct HtmlBoard {
    config: AdapterConfig,
    markup: BoardMarkup,
}

impl HtmlBoard {
    pub fn new(config: AdapterConfig, markup: BoardMarkup) -> Self {
        Self { config, markup }
    }

    /// `None` when the page is not content-ready (no posting rows at all).
    pub fn parse_listings(&self, body: &str) -> Option<Vec<RawListing>> {
        let document = Html::parse_document(body);
        let rows: Vec<ElementRef<'_>> = document.select(&self.markup.listing).collect();
        if rows.is_empty() {
            return None;
        }
        Some(rows.into_iter().map(|row| self.extract_row(row)).collect())
    }

    fn extract_row(&self, row: ElementRef<'_>) -> RawListing {
        let m = &self.markup;
        RawListing {
            id: m.id.first(&row),
            role: m.role.first(&row),
            url: m
                .url
                .first(&row)
                .and_then(|href| self.config.absolute_url(&href)),
            location: m.location.first(&row),
            department: m.department.first(&row),
            published_at: m.published_at.first(&row),
        }
    }

    /// `None` when no description rule matches.
    pub fn parse_description(&self, body: &str) -> Option<String> {
        let document = Html::parse_document(body);
        self.markup.description.first(&document)
    }
}

/// Fetch, then re-fetch after `pause` while `ready` finds nothing, at most
/// `reloads` extra times. `Ok(None)` when the content never shows up.
pub async fn until_ready<T, F, Fut, P>(
    what: &str,
    reloads: u32,
    pause: Duration,
    mut fetch: F,
    mut ready: P,
) -> Result<Option<T>, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RawResponse, FetchError>>,
    P: FnMut(&RawResponse) -> Option<T>,
{
    let mut attempt = 0;
    loop {
        let response = fetch().await?;
        if let Some(value) = ready(&response) {
            return Ok(Some(value));
        }
        if attempt >= reloads {
            tracing::debug!("{what}: nothing usable at {}", response.url);
            return Ok(None);
        }
        attempt += 1;
        tracing::warn!(
            "{what}: content not rendered yet (HTTP {}), reloading ({attempt}/{reloads})",
            response.status
        );
        tokio::time::sleep(pause).await;
    }
}

#[async_trait]
impl SourceAdapter for HtmlBoard {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    async fn list_page(
        &self,
        client: &FetchClient,
        token: PageToken,
    ) -> Result<ListingPage, AppError> {
        let url = self.config.page_url(token);
        let options = FetchOptions::html();
        let what = format!("{} {token}", self.config.site);
        let (url, options, what) = (url.as_str(), &options, what.as_str());
        let retry = &self.config.retry;

        let listings = until_ready(
            what,
            self.config.ready_reloads,
            RELOAD_PAUSE,
            move || retry.run(what, move || client.fetch(url, options)),
            |response| self.parse_listings(&response.body),
        )
        .await
        .map_err(|e| AppError::page(&self.config.site, token, e))?;

        Ok(ListingPage {
            listings: listings.unwrap_or_default(),
        })
    }

    async fn fetch_description(
        &self,
        client: &FetchClient,
        listing: &JobListing,
    ) -> Result<Option<String>, AppError> {
        let options = FetchOptions::html();
        let what = format!("{} description {}", self.config.site, listing.id);
        let (url, options, what) = (listing.url.as_str(), &options, what.as_str());
        let retry = &self.config.retry;

        let description = until_ready(
            what,
            self.config.ready_reloads,
            RELOAD_PAUSE,
            move || retry.run(what, move || client.fetch(url, options)),
            |response| self.parse_description(&response.body),
        )
        .await?;

        if description.is_none() {
            tracing::warn!("{what}: no description found at {url}");
        }
        Ok(description)
    }
}
