//! Unified error types for the saint-of-the-day worker.
//!
//! Every variant carries a stable upper-snake prefix in its display string so
//! log lines can be grepped by failure class.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the cache layer, the ports and the worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure (offline, DNS, timeout, connection reset).
    ///
    /// This is the only class the network-first strategies fall back on.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// A fetch completed but the status was not acceptable for the caller.
    #[error("HTTP_STATUS: {0}")]
    HttpStatus(u16),

    /// A response body was read a second time.
    #[error("BODY_CONSUMED")]
    BodyConsumed,

    /// A URL could not be parsed or resolved against the origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// A page message did not have the expected shape.
    #[error("INVALID_MESSAGE: {0}")]
    InvalidMessage(String),

    /// JSON encoding or decoding failed.
    #[error("ENCODING_ERROR: {0}")]
    Encoding(String),

    /// A cache partition could not be read or written.
    #[error("CACHE_ERROR: {0}")]
    Cache(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// The notification capability rejected a request.
    #[error("NOTIFICATION_FAILED: {0}")]
    NotificationFailed(String),

    /// The worker scope refused a lifecycle call (skip waiting, claim).
    #[error("SCOPE_ERROR: {0}")]
    Scope(String),
}

impl Error {
    /// Whether this error is a transport failure rather than an application one.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}
