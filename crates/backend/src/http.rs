//! `reqwest`-backed adapter for the remote scripting endpoint.

use std::env;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use quiz_core::model::{CardId, UserId};

use crate::api::{QuestionRecord, QuizBackend, ResultSubmission, ScoreReport};
use crate::error::{BackendError, ConfigError};

/// Content type for POST bodies. The scripting host rejects preflighted JSON
/// requests, so the JSON body travels as plain text.
const PLAIN_TEXT_JSON: &str = "text/plain;charset=utf-8";

const STATUS_SUCCESS: &str = "success";

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Where the remote backend lives. Read once at process start.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: Url,
}

impl BackendConfig {
    /// Parses and validates a base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if the value does not parse.
    pub fn new(raw: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidBaseUrl {
            raw: raw.to_string(),
        })?;
        Ok(Self { base_url })
    }

    /// Reads `QUIZ_BACKEND_URL` from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingBaseUrl` when unset, or
    /// `ConfigError::InvalidBaseUrl` when unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = env::var("QUIZ_BACKEND_URL").map_err(|_| ConfigError::MissingBaseUrl)?;
        Self::new(&raw)
    }
}

//
// ─── HTTP BACKEND ──────────────────────────────────────────────────────────────
//

/// `QuizBackend` implementation speaking to the configured endpoint.
///
/// No retries, no timeouts beyond the client defaults, no cancellation: every
/// call is a single request whose outcome is reported to the caller as-is.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Builds a backend from `QUIZ_BACKEND_URL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(BackendConfig::from_env()?))
    }

    async fn post_action<B: Serialize>(&self, body: &B) -> Result<Value, BackendError> {
        let payload = serde_json::to_string(body)
            .map_err(|e| BackendError::InvalidPayload(e.to_string()))?;

        let response = self
            .client
            .post(self.config.base_url.clone())
            .header(CONTENT_TYPE, PLAIN_TEXT_JSON)
            .body(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }

        accept(response.json::<Value>().await?)
    }
}

#[async_trait::async_trait]
impl QuizBackend for HttpBackend {
    async fn fetch_questions(
        &self,
        subject: &str,
        count: u32,
    ) -> Result<Vec<QuestionRecord>, BackendError> {
        let mut url = self.config.base_url.clone();
        url.query_pairs_mut()
            .append_pair("action", "getQuestions")
            .append_pair("subject", subject)
            .append_pair("count", &count.to_string());

        debug!(subject, count, "requesting questions");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }

        let body = accept(response.json::<Value>().await?)?;
        payload(&body, "questions")
    }

    async fn get_collection(&self, user: &UserId) -> Result<Vec<CardId>, BackendError> {
        let body = self
            .post_action(&CollectionRequest {
                action: "getCollection",
                id: user,
                card_id: None,
            })
            .await?;

        // An absent card list on success means the user has no cards yet.
        match body.get("cards") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(cards) => serde_json::from_value(cards.clone())
                .map_err(|e| BackendError::InvalidPayload(e.to_string())),
        }
    }

    async fn update_collection(&self, user: &UserId, card: &CardId) -> Result<(), BackendError> {
        self.post_action(&CollectionRequest {
            action: "updateCollection",
            id: user,
            card_id: Some(card),
        })
        .await?;
        Ok(())
    }

    async fn submit_result(
        &self,
        submission: &ResultSubmission,
    ) -> Result<ScoreReport, BackendError> {
        debug!(subject = submission.subject, "submitting results");
        let body = self
            .post_action(&SubmitRequest {
                action: "submitResult",
                submission,
            })
            .await?;

        serde_json::from_value(body).map_err(|e| BackendError::InvalidPayload(e.to_string()))
    }

    async fn generate_questions(
        &self,
        subject: &str,
        wrong_questions: &[Value],
    ) -> Result<u32, BackendError> {
        debug!(
            subject,
            missed = wrong_questions.len(),
            "requesting remedial questions"
        );
        let body = self
            .post_action(&GenerateRequest {
                action: "generateQuestions",
                subject,
                wrong_questions,
            })
            .await?;

        payload(&body, "count")
    }
}

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

#[derive(Serialize)]
struct CollectionRequest<'a> {
    action: &'static str,
    id: &'a UserId,
    #[serde(rename = "cardId", skip_serializing_if = "Option::is_none")]
    card_id: Option<&'a CardId>,
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    action: &'static str,
    #[serde(flatten)]
    submission: &'a ResultSubmission,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    action: &'static str,
    subject: &'a str,
    #[serde(rename = "wrongQuestions")]
    wrong_questions: &'a [Value],
}

/// Checks the status envelope before anything is read out of a response.
///
/// Any status other than `"success"` (including a missing one) is a
/// well-formed rejection carrying the optional server message.
fn accept(body: Value) -> Result<Value, BackendError> {
    let status = body.get("status").and_then(Value::as_str).unwrap_or_default();
    if status != STATUS_SUCCESS {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned);
        return Err(BackendError::Rejected { message });
    }
    Ok(body)
}

/// Extracts a required payload field from an accepted envelope.
fn payload<T: DeserializeOwned>(body: &Value, field: &str) -> Result<T, BackendError> {
    let value = body.get(field).cloned().ok_or_else(|| {
        BackendError::InvalidPayload(format!("missing `{field}` in success response"))
    })?;
    serde_json::from_value(value).map_err(|e| BackendError::InvalidPayload(e.to_string()))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accept_passes_a_success_envelope_through() {
        let body = json!({ "status": "success", "questions": [] });
        assert!(accept(body).is_ok());
    }

    #[test]
    fn accept_rejects_non_success_with_the_server_message() {
        let err = accept(json!({ "status": "error", "message": "bad subject" })).unwrap_err();
        assert_eq!(err.rejection_message(), Some("bad subject"));
    }

    #[test]
    fn accept_rejects_a_missing_status_without_a_message() {
        let err = accept(json!({ "questions": [] })).unwrap_err();
        assert!(matches!(err, BackendError::Rejected { message: None }));
    }

    #[test]
    fn payload_requires_the_field_on_success() {
        let body = accept(json!({ "status": "success" })).unwrap();
        let err = payload::<Vec<QuestionRecord>>(&body, "questions").unwrap_err();
        assert!(matches!(err, BackendError::InvalidPayload(_)));
    }

    #[test]
    fn payload_decodes_question_records() {
        let body = accept(json!({
            "status": "success",
            "questions": [
                { "id": "q1", "question": "Prompt?", "options": ["a", "b"] }
            ]
        }))
        .unwrap();

        let records: Vec<QuestionRecord> = payload(&body, "questions").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].prompt, "Prompt?");
        assert_eq!(records[0].options, vec!["a", "b"]);
    }

    #[test]
    fn score_report_defaults_optional_fields() {
        let body = accept(json!({
            "status": "success",
            "score": 70,
            "correctCount": 7
        }))
        .unwrap();

        let report: ScoreReport = serde_json::from_value(body).unwrap();
        assert_eq!(report.score, 70);
        assert_eq!(report.correct_count, 7);
        assert_eq!(report.review, Value::Null);
        assert!(report.wrong_questions.is_empty());
    }

    #[test]
    fn submit_request_flattens_the_submission() {
        let submission = ResultSubmission {
            id: UserId::new("u1"),
            subject: "歷史".into(),
            answers: std::collections::HashMap::new(),
            pass_threshold_count: 6,
        };
        let body = serde_json::to_value(SubmitRequest {
            action: "submitResult",
            submission: &submission,
        })
        .unwrap();

        assert_eq!(body["action"], "submitResult");
        assert_eq!(body["id"], "u1");
        assert_eq!(body["subject"], "歷史");
        assert_eq!(body["passThresholdCount"], 6);
    }

    #[test]
    fn config_rejects_garbage_urls() {
        assert!(matches!(
            BackendConfig::new("not a url"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(BackendConfig::new("https://script.example/macros/s/abc/exec").is_ok());
    }
}
