//! Unified error type for sitewatch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Throttled by provider — retry after {retry_after_ms}ms")]
    Throttled { retry_after_ms: u64 },

    #[error("Provider returned status {status}: {message}")]
    ProviderStatus { status: u16, message: String },

    #[error("Malformed provider response: {0}")]
    Malformed(String),

    #[error("Fetch for {site} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        site: String,
        attempts: u32,
        last: Box<Error>,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Transport failures and 5xx responses are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::ProviderStatus { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }
}
