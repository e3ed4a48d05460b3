use crate::collectors::PageToken;
use crate::fetch::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Page {token} of '{site}' failed: {source}")]
    Page {
        site: String,
        token: PageToken,
        #[source]
        source: Box<AppError>,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Tag a failure with the page it happened on.
    pub fn page(site: &str, token: PageToken, source: impl Into<AppError>) -> Self {
        AppError::Page {
            site: site.to_string(),
            token,
            source: Box::new(source.into()),
        }
    }

    /// Whether the run can skip the affected page or listing and keep going.
    /// Configuration and output failures abort the run.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Fetch(_) | AppError::Page { .. } | AppError::Parse(_) | AppError::Json(_) => {
                true
            }
            AppError::Selector(_) | AppError::Config(_) | AppError::Io(_) | AppError::Csv(_) => {
                false
            }
        }
    }
}
