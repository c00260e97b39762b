//! Error types for backend adapters.

use thiserror::Error;

/// Errors surfaced by backend adapters.
///
/// `Rejected` is the only variant the backend produced on purpose (a
/// well-formed response with a non-success status); everything else is a
/// transport-level failure and should never reach the player verbatim.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// The backend answered, but reported a failure of its own.
    #[error("backend rejected the request")]
    Rejected { message: Option<String> },

    /// The backend answered with a non-success HTTP status.
    #[error("backend returned status {0}")]
    HttpStatus(reqwest::StatusCode),

    /// The call itself failed (connect error, timeout, undecodable body).
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A success envelope whose payload is missing or malformed.
    #[error("malformed backend payload: {0}")]
    InvalidPayload(String),

    /// The adapter itself is unusable (poisoned state and the like).
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// The server-supplied message for a well-formed rejection, if any.
    #[must_use]
    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            BackendError::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }
}

/// Errors raised while reading backend configuration at startup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("QUIZ_BACKEND_URL is not set")]
    MissingBaseUrl,

    #[error("invalid backend URL: {raw}")]
    InvalidBaseUrl { raw: String },
}
