use thiserror::Error;

use wayfare_shared::{FeedError, FeedErrorKind};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: DNS, connect, TLS, timeout, or a body that
    /// stopped arriving.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success HTTP status.
    #[error("Server responded {status}")]
    Http { status: reqwest::StatusCode },

    /// The stored token was rejected (401) and has been cleared.
    #[error("Authentication rejected, signed out")]
    Unauthorized,

    /// The envelope decoded but carried `success: false`.
    #[error("Backend rejected the request: {detail}")]
    Rejected { detail: String },

    /// The response body was not a well-formed envelope.
    #[error("Malformed response envelope: {0}")]
    Envelope(String),
}

/// Every API failure surfaces to the feed as recoverable network trouble;
/// the distinction between transport and envelope problems only matters
/// for logs.
impl From<ApiError> for FeedError {
    fn from(err: ApiError) -> Self {
        FeedError::new(FeedErrorKind::NetworkOrServer, err.to_string())
    }
}
