use std::collections::HashMap;

use futures::StreamExt;

use crate::collectors::SourceAdapter;
use crate::error::AppError;
use crate::fetch::FetchClient;
use crate::filters::{KeywordSet, SelectionPolicy};
use crate::matching::{self, TextProcessingContext};
use crate::models::{JobListing, MatchResult, ResumeProfile};
use crate::normalize::normalize;
use crate::output::{DescriptionArchive, OutputSink, WrittenFiles};

#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Concurrent description fetches per site.
    pub concurrency: usize,
    /// Keyword prefilter; `None` sends every listing to the description stage.
    pub prefilter: Option<(KeywordSet, SelectionPolicy)>,
    pub top_n: Option<usize>,
    /// Reuse archived descriptions instead of re-fetching.
    pub use_cache: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            prefilter: None,
            top_n: None,
            use_cache: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub dropped_rows: usize,
    pub failed_pages: usize,
    pub in_geography: usize,
    pub unique: usize,
    pub shortlisted: usize,
    pub described: usize,
    pub cached: usize,
    pub ranked: usize,
}

pub struct RunOutcome {
    pub summary: RunSummary,
    pub results: Vec<MatchResult>,
    pub files: WrittenFiles,
}

/// Run the full pipeline: list, normalize, filter, prefilter, fetch
/// descriptions, score, rank and write.
pub async fn run(
    client: &FetchClient,
    adapters: &[Box<dyn SourceAdapter>],
    ctx: &TextProcessingContext,
    resume: &ResumeProfile,
    sink: &OutputSink,
    settings: &RunSettings,
) -> Result<RunOutcome, AppError> {
    let mut summary = RunSummary::default();

    let mut listings = Vec::new();
    for adapter in adapters {
        let collected = collect_listings(adapter.as_ref(), client, &mut summary).await;
        listings.extend(collected);
    }

    let listings = matching::dedupe(listings);
    summary.unique = listings.len();
    tracing::info!("{} unique listings in target geography", summary.unique);

    let shortlist = match &settings.prefilter {
        Some((keywords, policy)) => {
            let kept = keywords.select(listings.clone(), *policy);
            tracing::info!(
                "Keyword prefilter kept {} of {} listings",
                kept.len(),
                listings.len()
            );
            kept
        }
        None => listings.clone(),
    };
    summary.shortlisted = shortlist.len();

    let mut described = Vec::with_capacity(shortlist.len());
    for adapter in adapters {
        let site_listings: Vec<JobListing> = shortlist
            .iter()
            .filter(|l| l.site == adapter.name())
            .cloned()
            .collect();
        if site_listings.is_empty() {
            continue;
        }
        described.extend(
            fetch_descriptions(
                adapter.as_ref(),
                client,
                site_listings,
                sink.archive(),
                settings,
                &mut summary,
            )
            .await,
        );
    }
    // Back to discovery order across sites.
    let position: HashMap<&str, usize> = shortlist
        .iter()
        .enumerate()
        .map(|(idx, l)| (l.id.as_str(), idx))
        .collect();
    described.sort_by_key(|l| position.get(l.id.as_str()).copied().unwrap_or(usize::MAX));

    let results: Vec<MatchResult> = described
        .into_iter()
        .map(|listing| {
            let score = listing
                .description
                .as_deref()
                .map(|d| matching::score(ctx, resume, d))
                .unwrap_or(0.0);
            MatchResult::new(listing, score)
        })
        .collect();
    // Every described listing is archived; only the top N are reported.
    let mut results = matching::rank(results, None);
    let shown = settings
        .top_n
        .map_or(results.len(), |n| n.min(results.len()));
    let files = sink.write(&listings, &results[..shown], &results)?;
    results.truncate(shown);
    summary.ranked = results.len();

    Ok(RunOutcome {
        summary,
        results,
        files,
    })
}

/// Walk every page of one site. A failed page is logged and skipped; the
/// walk stops at the first empty page.
pub async fn collect_listings(
    adapter: &dyn SourceAdapter,
    client: &FetchClient,
    summary: &mut RunSummary,
) -> Vec<JobListing> {
    let config = adapter.config();
    let site = adapter.name();
    let mut listings = Vec::new();
    let mut token = Some(config.pagination.first());

    while let Some(current) = token {
        token = config.pagination.next(current);

        let page = match adapter.list_page(client, current).await {
            Ok(page) => page,
            Err(e) if e.is_recoverable() => {
                tracing::warn!("Skipping {site} {current}: {e}");
                summary.failed_pages += 1;
                continue;
            }
            Err(e) => {
                tracing::error!("Aborting {site} at {current}: {e}");
                summary.failed_pages += 1;
                break;
            }
        };

        if page.is_empty() {
            tracing::debug!("{site} {current} is empty, end of listings");
            break;
        }

        let found = page.listings.len();
        summary.discovered += found;
        let mut accepted = 0;
        for raw in page.listings {
            let Some(listing) = normalize(site, raw.clone(), config.location_label) else {
                tracing::debug!("{site} {current}: dropped row missing required fields: {raw:?}");
                summary.dropped_rows += 1;
                continue;
            };
            if config.geography.is_target_geography(&listing.location) {
                accepted += 1;
                listings.push(listing);
            }
        }
        summary.in_geography += accepted;
        tracing::info!("{site} {current}: {found} postings, {accepted} in target geography");
    }

    listings
}

/// Fill in descriptions for one site's shortlist with at most
/// `settings.concurrency` requests in flight. Output order matches input.
pub async fn fetch_descriptions(
    adapter: &dyn SourceAdapter,
    client: &FetchClient,
    listings: Vec<JobListing>,
    archive: &DescriptionArchive,
    settings: &RunSettings,
    summary: &mut RunSummary,
) -> Vec<JobListing> {
    let mut pending = Vec::new();
    let mut ready: HashMap<String, Option<String>> = HashMap::new();

    for listing in &listings {
        match settings.use_cache.then(|| archive.load(listing)).flatten() {
            Some(cached) => {
                summary.cached += 1;
                ready.insert(listing.id.clone(), Some(cached));
            }
            None => pending.push(listing),
        }
    }

    tracing::info!(
        "{}: fetching {} descriptions ({} cached)",
        adapter.name(),
        pending.len(),
        listings.len() - pending.len()
    );

    let fetched: Vec<(String, Option<String>)> = futures::stream::iter(pending)
        .map(|listing| async move {
            let description = match adapter.fetch_description(client, listing).await {
                Ok(description) => description,
                Err(e) => {
                    tracing::warn!("No description for {} ({}): {e}", listing.role, listing.url);
                    None
                }
            };
            (listing.id.clone(), description)
        })
        .buffer_unordered(settings.concurrency.max(1))
        .collect()
        .await;

    summary.described += fetched.iter().filter(|(_, d)| d.is_some()).count();
    ready.extend(fetched);

    listings
        .into_iter()
        .map(|listing| {
            let description = ready.remove(&listing.id).flatten();
            listing.with_description(description)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::collectors::{AdapterConfig, ListingPage, PageToken, Pagination};
    use crate::fetch::{FetchError, FetchSettings, RetryPolicy};
    use crate::filters::GeographyFilter;
    use crate::models::RawListing;

    struct FakeBoard {
        config: AdapterConfig,
        pages: HashMap<PageToken, Result<Vec<RawListing>, u16>>,
        descriptions: HashMap<String, String>,
        broken: Vec<String>,
        description_calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: Mutex<usize>,
    }

    impl FakeBoard {
        fn new(site: &str, pages: Vec<(PageToken, Result<Vec<RawListing>, u16>)>) -> Self {
            Self {
                config: AdapterConfig {
                    site: site.to_string(),
                    base_url: url::Url::parse("https://fake.test").unwrap(),
                    listing_url: "https://fake.test/jobs?page={page}".to_string(),
                    pagination: Pagination::Page { first: 1, last: 4 },
                    location_label: None,
                    geography: GeographyFilter::united_states().unwrap(),
                    retry: RetryPolicy::none(),
                    ready_reloads: 0,
                },
                pages: pages.into_iter().collect(),
                descriptions: HashMap::new(),
                broken: Vec::new(),
                description_calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: Mutex::new(0),
            }
        }

        fn describe(mut self, source_id: &str, text: &str) -> Self {
            self.descriptions
                .insert(source_id.to_string(), text.to_string());
            self
        }

        /// Description requests for `source_id` answer HTTP 503.
        fn break_description(mut self, source_id: &str) -> Self {
            self.broken.push(source_id.to_string());
            self
        }
    }

    #[async_trait]
    impl SourceAdapter for FakeBoard {
        fn config(&self) -> &AdapterConfig {
            &self.config
        }

        async fn list_page(
            &self,
            _client: &FetchClient,
            token: PageToken,
        ) -> Result<ListingPage, AppError> {
            match self.pages.get(&token) {
                Some(Ok(listings)) => Ok(ListingPage {
                    listings: listings.clone(),
                }),
                Some(Err(status)) => Err(AppError::page(
                    &self.config.site,
                    token,
                    FetchError::Status {
                        status: *status,
                        url: self.config.page_url(token),
                    },
                )),
                None => Ok(ListingPage::default()),
            }
        }

        async fn fetch_description(
            &self,
            _client: &FetchClient,
            listing: &JobListing,
        ) -> Result<Option<String>, AppError> {
            self.description_calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            {
                let mut max = self.max_in_flight.lock().unwrap();
                *max = (*max).max(now);
            }
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.broken.contains(&listing.source_id) {
                return Err(AppError::Fetch(FetchError::Status {
                    status: 503,
                    url: listing.url.clone(),
                }));
            }
            Ok(self.descriptions.get(&listing.source_id).cloned())
        }
    }

    fn raw(id: &str, role: &str, location: &str) -> RawListing {
        RawListing {
            id: Some(id.to_string()),
            role: Some(role.to_string()),
            url: Some(format!("https://fake.test/jobs/{id}")),
            location: Some(location.to_string()),
            department: None,
            published_at: None,
        }
    }

    fn client() -> FetchClient {
        FetchClient::new(FetchSettings {
            min_delay: std::time::Duration::ZERO,
            max_delay: std::time::Duration::ZERO,
            ..FetchSettings::default()
        })
        .unwrap()
    }

    fn ctx_and_resume() -> (TextProcessingContext, ResumeProfile) {
        let ctx = TextProcessingContext::english().unwrap();
        let resume = ResumeProfile::new("distributed systems Go Rust concurrency", &ctx);
        (ctx, resume)
    }

    #[tokio::test]
    async fn test_failed_page_is_skipped_and_walk_continues() {
        let board = FakeBoard::new(
            "fake",
            vec![
                (PageToken::Page(1), Ok(vec![raw("1", "Platform Engineer", "US")])),
                (PageToken::Page(2), Err(503)),
                (
                    PageToken::Page(3),
                    Ok(vec![
                        raw("3", "Rust Engineer", "United States, Remote"),
                        raw("4", "Engineer", "Toronto, Canada"),
                        RawListing {
                            role: None,
                            ..raw("5", "", "US")
                        },
                    ]),
                ),
            ],
        );
        let mut summary = RunSummary::default();
        let listings = collect_listings(&board, &client(), &mut summary).await;

        let ids: Vec<_> = listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["fake:1", "fake:3"]);
        assert_eq!(summary.failed_pages, 1);
        assert_eq!(summary.discovered, 4);
        assert_eq!(summary.dropped_rows, 1);
        assert_eq!(summary.in_geography, 2);
    }

    #[tokio::test]
    async fn test_descriptions_respect_pool_size_and_order() {
        let mut board = FakeBoard::new("fake", vec![]);
        for i in 0..10 {
            board = board.describe(&i.to_string(), &format!("text {i}"));
        }
        let listings: Vec<JobListing> = (0..10)
            .map(|i| normalize("fake", raw(&i.to_string(), "Engineer", "US"), None).unwrap())
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let archive = DescriptionArchive::open(dir.path()).unwrap();
        let settings = RunSettings {
            concurrency: 3,
            ..RunSettings::default()
        };
        let mut summary = RunSummary::default();
        let described = fetch_descriptions(
            &board,
            &client(),
            listings.clone(),
            &archive,
            &settings,
            &mut summary,
        )
        .await;

        assert!(*board.max_in_flight.lock().unwrap() <= 3);
        assert_eq!(summary.described, 10);
        for (i, listing) in described.iter().enumerate() {
            assert_eq!(listing.id, listings[i].id);
            assert_eq!(listing.description.as_deref(), Some(format!("text {i}").as_str()));
        }
    }

    #[tokio::test]
    async fn test_cached_descriptions_skip_fetch() {
        let board = FakeBoard::new("fake", vec![]).describe("1", "fresh text");
        let listing = normalize("fake", raw("1", "Engineer", "US"), None).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let archive = DescriptionArchive::open(dir.path()).unwrap();
        archive.store(&listing, "cached text").unwrap();

        let mut summary = RunSummary::default();
        let described = fetch_descriptions(
            &board,
            &client(),
            vec![listing.clone()],
            &archive,
            &RunSettings::default(),
            &mut summary,
        )
        .await;
        assert_eq!(described[0].description.as_deref(), Some("cached text"));
        assert_eq!(board.description_calls.load(Ordering::SeqCst), 0);
        assert_eq!(summary.cached, 1);

        let no_cache = RunSettings {
            use_cache: false,
            ..RunSettings::default()
        };
        let described = fetch_descriptions(
            &board,
            &client(),
            vec![listing],
            &archive,
            &no_cache,
            &mut summary,
        )
        .await;
        assert_eq!(described[0].description.as_deref(), Some("fresh text"));
    }

    #[tokio::test]
    async fn test_end_to_end_run() {
        let board = FakeBoard::new(
            "fake",
            vec![
                (
                    PageToken::Page(1),
                    Ok(vec![
                        raw("1", "Senior Platform Engineer", "United States, Remote"),
                        raw("2", "Graphic Designer", "New York, US"),
                        raw("3", "Platform Engineer", "Warsaw, Poland"),
                    ]),
                ),
                (
                    PageToken::Page(2),
                    Ok(vec![
                        raw("1", "Senior Platform Engineer", "United States, Remote"),
                        raw("4", "Platform Engineer, Tooling", "Seattle, WA, US"),
                    ]),
                ),
            ],
        )
        .describe(
            "1",
            "We need a distributed systems engineer with concurrency experience",
        );
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(board)];

        let dir = tempfile::tempdir().unwrap();
        let sink = OutputSink::create(dir.path()).unwrap();
        let (ctx, resume) = ctx_and_resume();
        let settings = RunSettings {
            prefilter: Some((
                KeywordSet::parse("platform engineer"),
                SelectionPolicy::Membership { limit: None },
            )),
            ..RunSettings::default()
        };

        let outcome = run(&client(), &adapters, &ctx, &resume, &sink, &settings)
            .await
            .unwrap();

        assert_eq!(outcome.summary.unique, 3);
        assert_eq!(outcome.summary.shortlisted, 2);
        assert_eq!(outcome.results.len(), 2);

        let top = &outcome.results[0];
        assert_eq!(top.listing().id, "fake:1");
        assert!((top.score() - 50.0).abs() < 1e-9);

        // No description text: kept, scored zero.
        let second = &outcome.results[1];
        assert_eq!(second.listing().id, "fake:4");
        assert_eq!(second.score(), 0.0);

        assert!(
            outcome
                .results
                .iter()
                .all(|r| r.listing().role != "Graphic Designer")
        );
        assert_eq!(outcome.files.archived, 1);
        let csv = std::fs::read_to_string(&outcome.files.matches_csv).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_failed_description_keeps_listing_at_zero() {
        let board = FakeBoard::new(
            "fake",
            vec![(
                PageToken::Page(1),
                Ok(vec![
                    raw("1", "Backend Engineer", "US"),
                    raw("2", "Rust Engineer", "US"),
                    raw("3", "Systems Engineer", "US"),
                ]),
            )],
        )
        .describe("1", "distributed systems")
        .describe("2", "never served")
        .describe("3", "rust concurrency")
        .break_description("2");
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(board)];

        let dir = tempfile::tempdir().unwrap();
        let sink = OutputSink::create(dir.path()).unwrap();
        let (ctx, resume) = ctx_and_resume();
        let outcome = run(
            &client(),
            &adapters,
            &ctx,
            &resume,
            &sink,
            &RunSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.summary.described, 2);
        assert_eq!(outcome.results.len(), 3);
        let broken = outcome
            .results
            .iter()
            .find(|r| r.listing().id == "fake:2")
            .unwrap();
        assert_eq!(broken.score(), 0.0);
        assert!(broken.listing().description.is_none());
        assert!(
            outcome
                .results
                .iter()
                .filter(|r| r.listing().id != "fake:2")
                .all(|r| r.score() == 100.0)
        );

        let csv = std::fs::read_to_string(&outcome.files.matches_csv).unwrap();
        assert!(csv.lines().any(|line| line.contains("fake:2") && line.contains(",0.00,")));
    }

    #[tokio::test]
    async fn test_top_n_still_archives_every_description() {
        let board = FakeBoard::new(
            "fake",
            vec![(
                PageToken::Page(1),
                Ok(vec![
                    raw("1", "Backend Engineer", "US"),
                    raw("2", "Rust Engineer", "US"),
                ]),
            )],
        )
        .describe("1", "distributed systems with kubernetes and terraform")
        .describe("2", "rust concurrency");
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(board)];

        let dir = tempfile::tempdir().unwrap();
        let sink = OutputSink::create(dir.path()).unwrap();
        let (ctx, resume) = ctx_and_resume();
        let settings = RunSettings {
            top_n: Some(1),
            ..RunSettings::default()
        };
        let outcome = run(&client(), &adapters, &ctx, &resume, &sink, &settings)
            .await
            .unwrap();

        assert_eq!(outcome.summary.shortlisted, 2);
        assert_eq!(outcome.summary.ranked, 1);
        assert_eq!(outcome.results[0].listing().id, "fake:2");
        assert_eq!(outcome.files.archived, 2);
        assert_eq!(sink.archive().load_all().unwrap().len(), 2);

        let csv = std::fs::read_to_string(&outcome.files.matches_csv).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }
}
