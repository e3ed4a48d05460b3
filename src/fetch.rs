// Resilient fetch client shared by every source adapter.
// One attempt per call; retry policy lives with the caller.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use rand::seq::IndexedRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

/// Browser identities rotated across requests so traffic does not carry a
/// single uniform fingerprint.
pub const USER_AGENTS: [&str; 6] = [
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.6; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:131.0) Gecko/20100101 Firefox/131.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
];

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const JSON_ACCEPT: &str = "application/json,text/plain;q=0.9,*/*;q=0.8";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source,
            }
        }
    }

    /// Timeouts, connection failures, 429 and 5xx are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status == 429 || (500..=599).contains(status),
            FetchError::Timeout { .. } | FetchError::Transport { .. } => true,
            FetchError::Client(_) => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Lower bound of the random pause inserted before each request.
    pub min_delay: Duration,
    /// Upper bound of the random pause.
    pub max_delay: Duration,
    /// Ceiling for a single request when the call does not set its own.
    pub timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(1500),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl FetchOptions {
    pub fn html() -> Self {
        Self {
            headers: vec![(ACCEPT.to_string(), HTML_ACCEPT.to_string())],
            timeout: None,
        }
    }

    pub fn json() -> Self {
        Self {
            headers: vec![(ACCEPT.to_string(), JSON_ACCEPT.to_string())],
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

pub struct FetchClient {
    http: reqwest::Client,
    settings: FetchSettings,
}

impl FetchClient {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { http, settings })
    }

    /// Issue a single GET. Sleeps a random jitter first and sends a randomly
    /// chosen identity; any non-2xx status is returned as an error.
    pub async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<RawResponse, FetchError> {
        let delay = jitter(self.settings.min_delay, self.settings.max_delay);
        tokio::time::sleep(delay).await;

        let mut request = self
            .http
            .get(url)
            .header(USER_AGENT, pick_user_agent())
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .timeout(options.timeout.unwrap_or(self.settings.timeout));
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        tracing::debug!("GET {url} (after {}ms jitter)", delay.as_millis());
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(RawResponse {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

pub fn pick_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Uniform random duration in `[min, max]`; `min` when the range is empty.
pub fn jitter(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let millis = rand::rng().random_range(min.as_millis() as u64..=max.as_millis() as u64);
    Duration::from_millis(millis)
}

/// Bounded retry with exponential backoff, applied by adapters around
/// individual fetches. Only transient failures are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let wait = self.backoff.saturating_mul(1 << (attempt - 1).min(16));
                    tracing::warn!(
                        "{what} failed ({e}), retry {attempt}/{} in {}ms",
                        self.max_retries,
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
