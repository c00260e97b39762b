//! Contract for the single remote collaborator.
//!
//! The quiz backend owns question content, scoring and reward-card storage.
//! Everything the session layer needs from it goes through [`QuizBackend`],
//! so tests can swap in fakes and the HTTP details stay in one place.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use quiz_core::model::{CardId, QuestionId, UserId};

use crate::error::BackendError;

/// Raw question fields as served by the backend, before client-side
/// decoration (avatar derivation happens in the session layer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: QuestionId,
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Everything the backend needs to score a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSubmission {
    pub id: UserId,
    pub subject: String,
    pub answers: HashMap<QuestionId, String>,
    pub pass_threshold_count: u32,
}

/// Scored outcome returned by the backend for a submission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub score: u32,
    pub correct_count: u32,
    #[serde(default)]
    pub review: Value,
    #[serde(default)]
    pub wrong_questions: Vec<Value>,
}

/// The remote quiz backend, one method per supported action.
///
/// Responses are validated at this boundary: a method only returns `Ok` for
/// a well-formed success envelope, so callers never mutate state from an
/// unvalidated payload.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Fetch up to `count` questions for a subject.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` for a reported failure, or a
    /// transport-kind error otherwise.
    async fn fetch_questions(
        &self,
        subject: &str,
        count: u32,
    ) -> Result<Vec<QuestionRecord>, BackendError>;

    /// Fetch the user's collected-card list.
    ///
    /// A success response without a card list means an empty collection.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the collection cannot be read.
    async fn get_collection(&self, user: &UserId) -> Result<Vec<CardId>, BackendError>;

    /// Associate a reward card with a user.
    ///
    /// The response body is not consumed beyond the status envelope.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the association cannot be stored.
    async fn update_collection(&self, user: &UserId, card: &CardId) -> Result<(), BackendError>;

    /// Submit a finished run for scoring.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` for a reported failure, or a
    /// transport-kind error otherwise.
    async fn submit_result(
        &self,
        submission: &ResultSubmission,
    ) -> Result<ScoreReport, BackendError>;

    /// Ask the backend to generate remedial questions from missed items.
    ///
    /// Returns the number of newly generated questions.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` for a reported failure, or a
    /// transport-kind error otherwise.
    async fn generate_questions(
        &self,
        subject: &str,
        wrong_questions: &[Value],
    ) -> Result<u32, BackendError>;
}
