//! Canned backend for tests and prototyping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use quiz_core::model::{CardId, UserId};

use crate::api::{QuestionRecord, QuizBackend, ResultSubmission, ScoreReport};
use crate::error::BackendError;

/// A seeded question together with its answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededQuestion {
    pub record: QuestionRecord,
    pub answer: String,
}

impl SeededQuestion {
    #[must_use]
    pub fn new(record: QuestionRecord, answer: impl Into<String>) -> Self {
        Self {
            record,
            answer: answer.into(),
        }
    }
}

/// In-memory `QuizBackend` for testing and prototyping.
///
/// Serves a fixed question set per subject, scores submissions against the
/// seeded answer keys, and keeps card collections in process memory.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    questions: Arc<Mutex<HashMap<String, Vec<SeededQuestion>>>>,
    collections: Arc<Mutex<HashMap<UserId, Vec<CardId>>>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds (or replaces) the question bank for a subject.
    pub fn seed_subject(&self, subject: impl Into<String>, questions: Vec<SeededQuestion>) {
        if let Ok(mut guard) = self.questions.lock() {
            guard.insert(subject.into(), questions);
        }
    }

    /// The stored collection for a user, for test assertions.
    #[must_use]
    pub fn stored_collection(&self, user: &UserId) -> Vec<CardId> {
        self.collections
            .lock()
            .ok()
            .and_then(|guard| guard.get(user).cloned())
            .unwrap_or_default()
    }

    fn subject_bank(&self, subject: &str) -> Result<Vec<SeededQuestion>, BackendError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        guard.get(subject).cloned().ok_or(BackendError::Rejected {
            message: Some(format!("unknown subject: {subject}")),
        })
    }
}

#[async_trait::async_trait]
impl QuizBackend for InMemoryBackend {
    async fn fetch_questions(
        &self,
        subject: &str,
        count: u32,
    ) -> Result<Vec<QuestionRecord>, BackendError> {
        let mut bank = self.subject_bank(subject)?;
        bank.truncate(usize::try_from(count).unwrap_or(usize::MAX));
        Ok(bank.into_iter().map(|seeded| seeded.record).collect())
    }

    async fn get_collection(&self, user: &UserId) -> Result<Vec<CardId>, BackendError> {
        let guard = self
            .collections
            .lock()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Ok(guard.get(user).cloned().unwrap_or_default())
    }

    async fn update_collection(&self, user: &UserId, card: &CardId) -> Result<(), BackendError> {
        let mut guard = self
            .collections
            .lock()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        let cards = guard.entry(user.clone()).or_default();
        if !cards.contains(card) {
            cards.push(card.clone());
        }
        Ok(())
    }

    async fn submit_result(
        &self,
        submission: &ResultSubmission,
    ) -> Result<ScoreReport, BackendError> {
        let bank = self.subject_bank(&submission.subject)?;

        // Score only the questions that were actually answered, in seeded
        // order so wrong-question records come out deterministically.
        let mut correct = 0u32;
        let mut wrong = Vec::new();
        let mut answered = 0u32;
        for seeded in &bank {
            let Some(selected) = submission.answers.get(&seeded.record.id) else {
                continue;
            };
            answered += 1;
            if *selected == seeded.answer {
                correct += 1;
            } else {
                wrong.push(
                    serde_json::to_value(&seeded.record)
                        .map_err(|e| BackendError::InvalidPayload(e.to_string()))?,
                );
            }
        }

        let score = if answered == 0 {
            0
        } else {
            (correct * 100).div_ceil(answered).min(100)
        };

        Ok(ScoreReport {
            score,
            correct_count: correct,
            review: json!({
                "subject": submission.subject,
                "correct": correct,
                "answered": answered,
            }),
            wrong_questions: wrong,
        })
    }

    async fn generate_questions(
        &self,
        _subject: &str,
        wrong_questions: &[Value],
    ) -> Result<u32, BackendError> {
        Ok(u32::try_from(wrong_questions.len()).unwrap_or(u32::MAX))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;

    fn record(id: &str) -> QuestionRecord {
        QuestionRecord {
            id: QuestionId::new(id),
            prompt: format!("prompt {id}"),
            options: vec!["a".into(), "b".into()],
        }
    }

    fn seeded_backend() -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        backend.seed_subject(
            "歷史",
            vec![
                SeededQuestion::new(record("q1"), "a"),
                SeededQuestion::new(record("q2"), "b"),
                SeededQuestion::new(record("q3"), "a"),
            ],
        );
        backend
    }

    #[tokio::test]
    async fn fetch_questions_honors_the_count() {
        let backend = seeded_backend();
        let records = backend.fetch_questions("歷史", 2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, QuestionId::new("q1"));
    }

    #[tokio::test]
    async fn unknown_subject_is_a_rejection() {
        let backend = seeded_backend();
        let err = backend.fetch_questions("化學", 5).await.unwrap_err();
        assert_eq!(err.rejection_message(), Some("unknown subject: 化學"));
    }

    #[tokio::test]
    async fn all_correct_answers_score_one_hundred() {
        let backend = seeded_backend();
        let submission = ResultSubmission {
            id: UserId::new("u1"),
            subject: "歷史".into(),
            answers: [
                (QuestionId::new("q1"), "a".to_string()),
                (QuestionId::new("q2"), "b".to_string()),
                (QuestionId::new("q3"), "a".to_string()),
            ]
            .into_iter()
            .collect(),
            pass_threshold_count: 2,
        };

        let report = backend.submit_result(&submission).await.unwrap();
        assert_eq!(report.score, 100);
        assert_eq!(report.correct_count, 3);
        assert!(report.wrong_questions.is_empty());
    }

    #[tokio::test]
    async fn missed_questions_come_back_as_wrong_records() {
        let backend = seeded_backend();
        let submission = ResultSubmission {
            id: UserId::new("u1"),
            subject: "歷史".into(),
            answers: [
                (QuestionId::new("q1"), "a".to_string()),
                (QuestionId::new("q2"), "a".to_string()),
            ]
            .into_iter()
            .collect(),
            pass_threshold_count: 2,
        };

        let report = backend.submit_result(&submission).await.unwrap();
        assert_eq!(report.correct_count, 1);
        assert_eq!(report.wrong_questions.len(), 1);
        assert_eq!(report.wrong_questions[0]["id"], "q2");

        let generated = backend
            .generate_questions("歷史", &report.wrong_questions)
            .await
            .unwrap();
        assert_eq!(generated, 1);
    }

    #[tokio::test]
    async fn collections_stay_duplicate_free() {
        let backend = InMemoryBackend::new();
        let user = UserId::new("u1");
        let card = CardId::new("dragon");

        backend.update_collection(&user, &card).await.unwrap();
        backend.update_collection(&user, &card).await.unwrap();

        assert_eq!(backend.get_collection(&user).await.unwrap(), vec![card]);
    }
}
