//! Shared error types for the services crate.

use thiserror::Error;

/// User-facing failures surfaced by `SessionStore` actions.
///
/// The `Display` text of each variant is exactly what lands in the store's
/// `error` field, so the returned error and the displayed message can never
/// diverge. Transport causes are logged where they happen and deliberately
/// kept out of these messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// The backend answered and reported a failure; shown verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Could not reach the backend while loading questions.
    #[error("network error: could not connect to the game server")]
    Connection,

    /// Could not deliver the finished answers for scoring.
    #[error("failed to submit results")]
    Submission,

    /// Remedial generation was requested with nothing to regenerate.
    #[error("no wrong questions to generate from")]
    NothingToRegenerate,
}
