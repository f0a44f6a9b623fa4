//! Error types for the mail.tm client.

use reqwest::StatusCode;
use thiserror::Error;

/// Error type for all mail.tm client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-level failure (DNS, connect, timeout) from the HTTP client.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Response body was malformed or missing an expected field.
    #[error("parse error: {0}")]
    Parse(String),
    /// The domain list endpoint returned no usable domain.
    #[error("no domains available")]
    NoDomains,
    /// Registration rejected because the address is already in use.
    #[error("address already taken")]
    AddressTaken,
    /// Authentication rejected by the server.
    #[error("authentication rejected: {0}")]
    Auth(String),
    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Username does not satisfy the mailbox naming rules.
    #[error("invalid username: {0}")]
    InvalidUsername(String),
    /// Operation requires an active mailbox but none is held.
    #[error("no active mailbox")]
    NoMailbox,
    /// HTTP response returned an unexpected status with body.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl Error {
    /// Whether this error is a transient connectivity failure.
    ///
    /// Transient errors are safe to retry on the next poll tick; everything
    /// else is a server-signaled or client-side condition.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Http(_))
    }

    /// Whether the server rejected the request's bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

/// Result type alias for mail.tm client operations.
pub type Result<T> = std::result::Result<T, Error>;
