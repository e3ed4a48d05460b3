// Sony Interactive Entertainment, hosted on a Greenhouse HTML job board.
// Rows are grouped under department sections.

use url::Url;

use crate::collectors::extract::{FieldRules, HtmlRule, selector};
use crate::collectors::html_board::{BoardMarkup, HtmlBoard};
use crate::collectors::{AdapterConfig, AdapterTuning, Pagination};
use crate::error::AppError;
use crate::filters::GeographyFilter;

const BASE_URL: &str = "https://job-boards.greenhouse.io";
const BOARD: &str = "sonyinteractiveentertainmentglobal";
const LAST_PAGE: u32 = 5;

pub fn adapter(tuning: &AdapterTuning) -> Result<HtmlBoard, AppError> {
    let config = AdapterConfig {
        site: "sony".to_string(),
        base_url: Url::parse(BASE_URL).map_err(|e| AppError::Config(e.to_string()))?,
        listing_url: format!("{BASE_URL}/{BOARD}?page={{page}}"),
        pagination: tuning.pagination(Pagination::Page {
            first: 1,
            last: LAST_PAGE,
        }),
        location_label: None,
        geography: GeographyFilter::united_states()?,
        retry: tuning.retry,
        ready_reloads: tuning.ready_reloads,
    };

    let markup = BoardMarkup {
        listing: selector("tr.job-post")?,
        id: FieldRules::new(vec![
            HtmlRule::attr_capture("a[href]", "href", r"/jobs/(\d+)")?,
            HtmlRule::attr_capture("a[href]", "href", r"gh_jid=(\d+)")?,
        ]),
        role: FieldRules::new(vec![
            HtmlRule::text("a p.body--medium")?,
            HtmlRule::text("a p")?,
        ]),
        url: FieldRules::new(vec![HtmlRule::attr("a[href]", "href")?]),
        location: FieldRules::new(vec![HtmlRule::text("a p.body__secondary")?]),
        department: FieldRules::new(vec![
            HtmlRule::ancestor_text("div.job-posts", ".job-posts--department-path")?,
            HtmlRule::ancestor_text("div.job-posts", "h3")?,
        ]),
        published_at: FieldRules::none(),
        description: FieldRules::new(vec![
            HtmlRule::block("div.job__description")?,
            HtmlRule::block("#content")?,
        ]),
    };

    Ok(HtmlBoard::new(config, markup))
}
