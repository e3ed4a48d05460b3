mod collectors;
mod config;
mod error;
mod fetch;
mod filters;
mod matching;
mod models;
mod normalize;
mod output;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::collectors::runner::{self, RunSettings};
use crate::collectors::{SourceAdapter, get_collector};
use crate::config::{Command, Config, ScrapeArgs};
use crate::fetch::FetchClient;
use crate::filters::KeywordSet;
use crate::matching::TextProcessingContext;
use crate::models::ResumeProfile;
use crate::output::{DescriptionArchive, OutputSink};

/// Results echoed to the terminal after a run; the CSV has all of them.
const SHOWN_RESULTS: usize = 10;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobscout=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);

    let ctx = TextProcessingContext::english()?;
    let resume_text = std::fs::read_to_string(&config.resume)
        .with_context(|| format!("Cannot read resume file {}", config.resume.display()))?;
    let resume = ResumeProfile::new(resume_text, &ctx);
    if resume.is_empty() {
        anyhow::bail!("Resume {} has no usable words", config.resume.display());
    }
    tracing::info!(
        "Resume {}: {} chars, {} distinct terms",
        config.resume.display(),
        resume.raw_text().len(),
        resume.tokens().len()
    );

    match config.resolved_command() {
        Command::Scrape(args) => scrape(&config, &args, &ctx, &resume).await,
        Command::Analyze => analyze(&config, &ctx, &resume),
    }
}

async fn scrape(
    config: &Config,
    args: &ScrapeArgs,
    ctx: &TextProcessingContext,
    resume: &ResumeProfile,
) -> anyhow::Result<()> {
    // Every configuration problem surfaces here, before the first request.
    let prefilter = match args.selection_policy() {
        Some(policy) => {
            let keywords = KeywordSet::load(&config.keywords)?;
            tracing::info!(
                "Loaded {} keywords from {}",
                keywords.len(),
                config.keywords.display()
            );
            Some((keywords, policy))
        }
        None => None,
    };

    let tuning = args.adapter_tuning();
    let adapters = args
        .sites
        .iter()
        .map(|site| get_collector(site.trim(), &tuning))
        .collect::<Result<Vec<Box<dyn SourceAdapter>>, _>>()?;

    let sink = OutputSink::create(&config.output_dir)?;
    if args.fresh {
        let removed = sink.archive().clear()?;
        tracing::info!("Cleared {removed} archived descriptions");
    }

    let client = FetchClient::new(args.fetch_settings())?;
    let settings = RunSettings {
        concurrency: args.concurrency,
        prefilter,
        top_n: args.top,
        use_cache: !args.fresh,
    };

    tracing::info!(
        "Scraping {} site(s): {}",
        adapters.len(),
        args.sites.join(", ")
    );
    let outcome = runner::run(&client, &adapters, ctx, resume, &sink, &settings).await?;

    let s = &outcome.summary;
    println!(
        "Found {} postings, {} in target geography ({} unique), shortlisted {}.",
        s.discovered, s.in_geography, s.unique, s.shortlisted
    );
    println!(
        "Described {} ({} from archive), archived {}, ranked {}.",
        s.described, s.cached, outcome.files.archived, s.ranked
    );
    if s.failed_pages > 0 || s.dropped_rows > 0 {
        println!(
            "Skipped {} failed page(s) and {} incomplete row(s).",
            s.failed_pages, s.dropped_rows
        );
    }
    for result in outcome.results.iter().take(SHOWN_RESULTS) {
        let listing = result.listing();
        println!(
            "{:>6.2}%  {}  [{}]  {}",
            result.score(),
            listing.role,
            listing.location,
            listing.url
        );
    }
    println!(
        "Results saved to {} and {}",
        outcome.files.matches_csv.display(),
        outcome.files.listings_csv.display()
    );
    Ok(())
}

fn analyze(
    config: &Config,
    ctx: &TextProcessingContext,
    resume: &ResumeProfile,
) -> anyhow::Result<()> {
    let dir = config.output_dir.join("descriptions");
    let Some(archive) = DescriptionArchive::existing(&dir) else {
        println!("No archived descriptions in {}", dir.display());
        return Ok(());
    };
    let entries = archive
        .load_all()
        .with_context(|| format!("Cannot read archive {}", archive.dir().display()))?;
    if entries.is_empty() {
        println!("No archived descriptions in {}", archive.dir().display());
        return Ok(());
    }

    let mut scored: Vec<(String, f64)> = entries
        .into_iter()
        .map(|(name, text)| {
            let score = matching::score(ctx, resume, &text);
            (name, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    println!("Top matches for your resume:");
    for (name, score) in scored {
        println!("{name}: {}% match", score as u32);
    }
    Ok(())
}
