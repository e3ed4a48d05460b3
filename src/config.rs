use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, ValueEnum};

use crate::collectors::AdapterTuning;
use crate::fetch::{FetchSettings, RetryPolicy};
use crate::filters::SelectionPolicy;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "jobscout",
    about = "Scrape career sites and rank postings against a resume"
)]
pub struct Config {
    /// Resume as plain UTF-8 text
    #[arg(
        long,
        short,
        env = "JOBSCOUT_RESUME",
        default_value = "resume.txt",
        global = true
    )]
    pub resume: PathBuf,

    /// Keywords file, one keyword or phrase per line
    #[arg(
        long,
        short,
        env = "JOBSCOUT_KEYWORDS",
        default_value = "keywords.txt",
        global = true
    )]
    pub keywords: PathBuf,

    /// Directory for CSV reports and the description archive
    #[arg(
        long,
        short,
        env = "JOBSCOUT_OUTPUT_DIR",
        default_value = "output",
        global = true
    )]
    pub output_dir: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, env = "JOBSCOUT_LOG_JSON", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Scrape, filter, score and rank (default when no subcommand given)
    Scrape(ScrapeArgs),
    /// Score the archived descriptions against the resume, without network
    Analyze,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefilterMode {
    /// Fetch descriptions for every listing in the target geography
    #[value(name = "none")]
    Off,
    /// Keep listings whose role or department contains a keyword
    Membership,
    /// Keep the top fraction of listings by keyword score
    Percentile,
}

#[derive(Args, Debug, Clone)]
pub struct ScrapeArgs {
    /// Sites to scrape: adobe, dropbox, sony or greenhouse:<board>
    #[arg(
        long = "site",
        env = "JOBSCOUT_SITES",
        value_delimiter = ',',
        default_value = "adobe,dropbox,sony"
    )]
    pub sites: Vec<String>,

    /// Keyword prefilter policy
    #[arg(long, value_enum, default_value_t = PrefilterMode::Membership)]
    pub prefilter: PrefilterMode,

    /// Fraction kept by the percentile prefilter
    #[arg(long, default_value_t = 0.2)]
    pub percentile: f64,

    /// Keep only the N best keyword matches (membership prefilter)
    #[arg(long)]
    pub keyword_limit: Option<usize>,

    /// Keep only the N best-scoring results
    #[arg(long)]
    pub top: Option<usize>,

    /// Concurrent description fetches per site
    #[arg(long, env = "JOBSCOUT_CONCURRENCY", default_value_t = 4)]
    pub concurrency: usize,

    /// Extra attempts for a failed request
    #[arg(long, default_value_t = 2)]
    pub retries: u32,

    /// Minimum random delay before each request, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub min_delay_ms: u64,

    /// Maximum random delay before each request, in milliseconds
    #[arg(long, default_value_t = 1500)]
    pub max_delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Re-fetches of a page whose content is not there yet
    #[arg(long, default_value_t = 1)]
    pub reloads: u32,

    /// Visit at most N listing pages per site
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Clear the description archive before scraping
    #[arg(long)]
    pub fresh: bool,
}

/// Lets `resolved_command` apply the same defaults and env vars as an
/// explicit `scrape`.
#[derive(Parser)]
struct DefaultScrape {
    #[command(flatten)]
    args: ScrapeArgs,
}

impl Config {
    /// Resolve the command, defaulting to Scrape if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Scrape(DefaultScrape::parse_from(["jobscout"]).args))
    }
}

impl ScrapeArgs {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            min_delay: Duration::from_millis(self.min_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms.max(self.min_delay_ms)),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }

    pub fn adapter_tuning(&self) -> AdapterTuning {
        AdapterTuning {
            retry: RetryPolicy {
                max_retries: self.retries,
                ..RetryPolicy::default()
            },
            ready_reloads: self.reloads,
            max_pages: self.max_pages,
        }
    }

    pub fn selection_policy(&self) -> Option<SelectionPolicy> {
        match self.prefilter {
            PrefilterMode::Off => None,
            PrefilterMode::Membership => Some(SelectionPolicy::Membership {
                limit: self.keyword_limit,
            }),
            PrefilterMode::Percentile => Some(SelectionPolicy::TopPercentile {
                fraction: self.percentile,
            }),
        }
    }
}
