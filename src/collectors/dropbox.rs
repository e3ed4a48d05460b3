// Dropbox careers: every opening on a single page.

use url::Url;

use crate::collectors::extract::{FieldRules, HtmlRule, selector};
use crate::collectors::html_board::{BoardMarkup, HtmlBoard};
use crate::collectors::{AdapterConfig, AdapterTuning, Pagination};
use crate::error::AppError;
use crate::filters::GeographyFilter;

const BASE_URL: &str = "https://jobs.dropbox.com";

pub fn adapter(tuning: &AdapterTuning) -> Result<HtmlBoard, AppError> {
    let config = AdapterConfig {
        site: "dropbox".to_string(),
        base_url: Url::parse(BASE_URL).map_err(|e| AppError::Config(e.to_string()))?,
        listing_url: format!("{BASE_URL}/all-jobs"),
        pagination: Pagination::Bulk,
        location_label: None,
        geography: GeographyFilter::united_states()?,
        retry: tuning.retry,
        ready_reloads: tuning.ready_reloads,
    };

    let markup = BoardMarkup {
        listing: selector("li.open-positions__listing")?,
        id: FieldRules::new(vec![
            HtmlRule::own_attr("data-id"),
            HtmlRule::attr_capture("a.open-positions__listing-link", "href", r"/listing/(\d+)")?,
            HtmlRule::attr_capture("a[href]", "href", r"(?:gh_jid=|/jobs/)(\d+)")?,
        ]),
        role: FieldRules::new(vec![
            HtmlRule::text(".open-positions__listing-title")?,
            HtmlRule::text("a.open-positions__listing-link")?,
        ]),
        url: FieldRules::new(vec![
            HtmlRule::attr("a.open-positions__listing-link", "href")?,
            HtmlRule::attr("a[href]", "href")?,
        ]),
        location: FieldRules::new(vec![
            HtmlRule::own_attr("data-location"),
            HtmlRule::text(".open-positions__listing-location")?,
        ]),
        department: FieldRules::new(vec![
            HtmlRule::own_attr("data-department"),
            HtmlRule::own_attr("data-team"),
        ]),
        published_at: FieldRules::none(),
        description: FieldRules::new(vec![
            HtmlRule::block(".job-description-details")?,
            HtmlRule::block(".jc03-content")?,
        ]),
    };

    Ok(HtmlBoard::new(config, markup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::SourceAdapter;
    use crate::normalize::normalize;

    const PAGE: &str = r#"<html><body><ul class="open-positions">
      <li class="open-positions__listing" data-location="Remote - US: Select locations" data-department="Engineering">
        <a class="open-positions__listing-link" href="/listing/5648520?gh_src=abc">
          <h5 class="open-positions__listing-title">Staff Software Engineer, Storage</h5>
        </a>
      </li>
      <li class="open-positions__listing" data-location="Remote - Canada: Select locations">
        <a class="open-positions__listing-link" href="/listing/5648521">
          <h5 class="open-positions__listing-title">Product Designer</h5>
        </a>
      </li>
      <li class="open-positions__listing" data-location="Remote - US">
        <span class="open-positions__listing-title">Broken row without link</span>
      </li>
    </ul></body></html>"#;

    #[test]
    fn test_bulk_page_rows() {
        let board = adapter(&AdapterTuning::default()).unwrap();
        assert_eq!(board.config().pagination, Pagination::Bulk);

        let rows = board.parse_listings(PAGE).unwrap();
        assert_eq!(rows.len(), 3);
        let listings: Vec<_> = rows
            .into_iter()
            .filter_map(|raw| normalize("dropbox", raw, None))
            .collect();
        assert_eq!(listings.len(), 2, "row without link is dropped");

        assert_eq!(listings[0].id, "dropbox:5648520");
        assert_eq!(
            listings[0].url,
            "https://jobs.dropbox.com/listing/5648520?gh_src=abc"
        );
        assert_eq!(listings[0].department.as_deref(), Some("Engineering"));

        let geo = &board.config().geography;
        assert!(geo.is_target_geography(&listings[0].location));
        assert!(!geo.is_target_geography(&listings[1].location));
    }

    #[test]
    fn test_description_falls_back_to_second_rule() {
        let board = adapter(&AdapterTuning::default()).unwrap();
        let html = r#"<html><body><div class="jc03-content"><h2>Role Description</h2><p>Own the storage layer.</p></div></body></html>"#;
        assert_eq!(
            board.parse_description(html).as_deref(),
            Some("Role Description\nOwn the storage layer.")
        );
    }
}
