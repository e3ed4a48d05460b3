use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use scraper::Html;
use serde_json::Value;
use url::Url;

use crate::collectors::extract::{FieldRules, JsonRule, element_text};
use crate::collectors::{
    AdapterConfig, AdapterTuning, ListingPage, PageToken, Pagination, SourceAdapter,
};
use crate::error::AppError;
use crate::fetch::{FetchClient, FetchOptions};
use crate::filters::GeographyFilter;
use crate::models::{JobListing, RawListing};

const API_BASE: &str = "https://boards-api.greenhouse.io/v1/boards";

/// Any company on the Greenhouse public board API. One call lists every
/// posting; descriptions come from the per-job endpoint.
pub struct GreenhouseApi {
    config: AdapterConfig,
    board_url: String,
    id: FieldRules<JsonRule>,
    role: FieldRules<JsonRule>,
    url: FieldRules<JsonRule>,
    location: FieldRules<JsonRule>,
    department: FieldRules<JsonRule>,
    published_at: FieldRules<JsonRule>,
}

impl GreenhouseApi {
    pub fn new(board: &str, tuning: &AdapterTuning) -> Result<Self, AppError> {
        let encoded: String = utf8_percent_encode(board, NON_ALPHANUMERIC).to_string();
        let board_url = format!("{API_BASE}/{encoded}");

        let config = AdapterConfig {
            site: format!("greenhouse-{board}"),
            base_url: Url::parse(&format!("{board_url}/"))
                .map_err(|e| AppError::Config(format!("board {board}: {e}")))?,
            listing_url: format!("{board_url}/jobs?content=true"),
            pagination: Pagination::Bulk,
            location_label: None,
            geography: GeographyFilter::united_states()?,
            retry: tuning.retry,
            ready_reloads: tuning.ready_reloads,
        };

        Ok(Self {
            config,
            board_url,
            id: FieldRules::new(vec![
                JsonRule::Pointer("/id"),
                JsonRule::Pointer("/internal_job_id"),
            ]),
            role: FieldRules::new(vec![JsonRule::Pointer("/title")]),
            url: FieldRules::new(vec![JsonRule::Pointer("/absolute_url")]),
            location: FieldRules::new(vec![
                JsonRule::Pointer("/location/name"),
                JsonRule::Join("/offices", "name"),
            ]),
            department: FieldRules::new(vec![JsonRule::Join("/departments", "name")]),
            published_at: FieldRules::new(vec![
                JsonRule::Pointer("/first_published"),
                JsonRule::Pointer("/updated_at"),
            ]),
        })
    }

    /// Decode a listing response body into raw rows.
    pub fn parse_body(&self, body: &str) -> Result<Vec<RawListing>, AppError> {
        let data: Value = serde_json::from_str(body)?;
        self.parse_jobs(&data)
    }

    /// Parse the board listing response into raw rows.
    pub fn parse_jobs(&self, data: &Value) -> Result<Vec<RawListing>, AppError> {
        let jobs = data
            .get("jobs")
            .and_then(|v| v.as_array())
            .ok_or_else(|| AppError::Parse("Missing 'jobs' in response".to_string()))?;

        Ok(jobs.iter().map(|job| self.parse_job(job)).collect())
    }

    fn parse_job(&self, job: &Value) -> RawListing {
        RawListing {
            id: self.id.first(job),
            role: self.role.first(job),
            url: self.url.first(job),
            location: self.location.first(job),
            department: self.department.first(job),
            published_at: self.published_at.first(job),
        }
    }
}

/// Greenhouse returns `content` as entity-escaped HTML: unescape, then
/// flatten to text.
pub fn content_to_text(content: &str) -> Option<String> {
    let unescaped = Html::parse_fragment(content)
        .root_element()
        .text()
        .collect::<String>();
    let text = element_text(Html::parse_fragment(&unescaped).root_element(), "\n");
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl SourceAdapter for GreenhouseApi {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    async fn list_page(
        &self,
        client: &FetchClient,
        token: PageToken,
    ) -> Result<ListingPage, AppError> {
        let url = self.config.page_url(token);
        let options = FetchOptions::json();
        let what = format!("{} {token}", self.config.site);

        let response = self
            .config
            .retry
            .run(&what, || client.fetch(&url, &options))
            .await
            .map_err(|e| AppError::page(&self.config.site, token, e))?;

        let listings = self
            .parse_body(&response.body)
            .map_err(|e| AppError::page(&self.config.site, token, e))?;
        Ok(ListingPage { listings })
    }

    async fn fetch_description(
        &self,
        client: &FetchClient,
        listing: &JobListing,
    ) -> Result<Option<String>, AppError> {
        let url = format!("{}/jobs/{}", self.board_url, listing.source_id);
        let options = FetchOptions::json();
        let what = format!("{} description {}", self.config.site, listing.id);

        let response = self
            .config
            .retry
            .run(&what, || client.fetch(&url, &options))
            .await?;

        let data: Value = serde_json::from_str(&response.body)?;
        Ok(data
            .get("content")
            .and_then(|v| v.as_str())
            .and_then(content_to_text))
    }
}
