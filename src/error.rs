use thiserror::Error;

/// Everything that can stop a scrape or a post-processing pass.
///
/// Player lookups that miss are not represented here; they degrade to
/// `null` in the output instead of failing.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("could not fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not fetch {url}: server answered {status}")]
    FetchStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed page ({context}): {reason}")]
    MalformedPage { context: String, reason: String },

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl ScrapeError {
    pub fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        ScrapeError::MalformedPage {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Fetch failures abort the run; only per-game structure errors may be skipped.
    pub fn is_malformed_page(&self) -> bool {
        matches!(self, ScrapeError::MalformedPage { .. })
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
