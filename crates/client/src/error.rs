//! Sync layer errors.

use thiserror::Error;

/// A failed remote cart call, classified by HTTP status.
#[derive(Debug, Error)]
pub enum SyncError {
    /// 404: the line item (or product) does not exist server-side.
    #[error("Not found: {0}")]
    NotFound(String),

    /// 409: the product cannot be added (e.g. out of stock).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other 4xx: the server rejected the input.
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// 5xx from the server.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Transport failure (connect, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL cannot be joined with an endpoint path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl SyncError {
    /// Whether this failure is transient and may succeed on retry.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::Http(_))
    }
}
