// Adobe careers (Phenom-hosted search results), offset pagination.

use url::Url;

use crate::collectors::extract::{FieldRules, HtmlRule, selector};
use crate::collectors::html_board::{BoardMarkup, HtmlBoard};
use crate::collectors::{AdapterConfig, AdapterTuning, Pagination};
use crate::error::AppError;
use crate::filters::GeographyFilter;

const BASE_URL: &str = "https://careers.adobe.com";
const PAGE_SIZE: u32 = 10;
const MAX_OFFSET: u32 = 50;

pub fn adapter(tuning: &AdapterTuning) -> Result<HtmlBoard, AppError> {
    let config = AdapterConfig {
        site: "adobe".to_string(),
        base_url: Url::parse(BASE_URL).map_err(|e| AppError::Config(e.to_string()))?,
        listing_url: format!("{BASE_URL}/us/en/search-results?from={{offset}}&s=1"),
        pagination: tuning.pagination(Pagination::Offset {
            step: PAGE_SIZE,
            max_offset: MAX_OFFSET,
        }),
        location_label: Some("Location"),
        geography: GeographyFilter::united_states()?,
        retry: tuning.retry,
        ready_reloads: tuning.ready_reloads,
    };

    let markup = BoardMarkup {
        listing: selector("li.jobs-list-item")?,
        id: FieldRules::new(vec![
            HtmlRule::attr("a[data-ph-at-job-id-text]", "data-ph-at-job-id-text")?,
            HtmlRule::attr("[data-ph-at-job-seqno-text]", "data-ph-at-job-seqno-text")?,
            HtmlRule::attr_capture("a[href]", "href", r"/job/([A-Za-z0-9_-]+)")?,
        ]),
        role: FieldRules::new(vec![
            HtmlRule::text("div.job-title")?,
            HtmlRule::attr("a[data-ph-at-job-title-text]", "data-ph-at-job-title-text")?,
            HtmlRule::text("a[data-ph-at-id='job-link']")?,
        ]),
        url: FieldRules::new(vec![
            HtmlRule::attr("a[data-ph-at-job-id-text]", "href")?,
            HtmlRule::attr("a[data-ph-at-id='job-link']", "href")?,
        ]),
        location: FieldRules::new(vec![
            HtmlRule::text("span.job-location")?,
            HtmlRule::attr(
                "a[data-ph-at-job-location-text]",
                "data-ph-at-job-location-text",
            )?,
        ]),
        department: FieldRules::new(vec![
            HtmlRule::attr(
                "a[data-ph-at-job-category-text]",
                "data-ph-at-job-category-text",
            )?,
            HtmlRule::text("span.job-category")?,
        ]),
        published_at: FieldRules::new(vec![HtmlRule::attr(
            "a[data-ph-at-job-post-date-text]",
            "data-ph-at-job-post-date-text",
        )?]),
        description: FieldRules::new(vec![
            HtmlRule::block("div[data-ph-at-id='jobdescription-text']")?,
            HtmlRule::block("section.job-description")?,
        ]),
    };

    Ok(HtmlBoard::new(config, markup))
}
