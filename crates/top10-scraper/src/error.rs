use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("empty payload from {context}")]
    EmptyPayload { context: String },

    #[error("parse error in {context}: {reason}")]
    Parse { context: String, reason: String },

    #[error("all {attempted} per-item fetches failed")]
    AllItemsFailed {
        attempted: usize,
        errors: Vec<String>,
    },

    #[error("all sources failed")]
    SourcesExhausted { errors: Vec<String> },
}

impl ScraperError {
    /// Flattens the error into the message lines recorded on a run.
    ///
    /// Aggregate variants expand into the individual failures they carry;
    /// every other variant yields its own display string.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            ScraperError::SourcesExhausted { errors } => errors.clone(),
            ScraperError::AllItemsFailed { errors, .. } => {
                let mut lines = vec![self.to_string()];
                lines.extend(errors.iter().cloned());
                lines
            }
            other => vec![other.to_string()],
        }
    }
}
