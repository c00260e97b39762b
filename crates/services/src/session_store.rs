use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use backend::{BackendError, QuizBackend, ResultSubmission};
use quiz_core::Clock;
use quiz_core::model::{CardId, GameResult, Question, QuestionId, RemedialBatch, UserId};
use quiz_core::scoring;

use crate::error::StoreError;

/// Default question category when the caller does not pick one.
pub const DEFAULT_SUBJECT: &str = "歷史";

/// Default pass threshold, in percent, used when no configuration is given.
pub const DEFAULT_PASS_THRESHOLD: u8 = 60;

const FETCH_FALLBACK: &str = "failed to fetch questions";
const SUBMIT_FALLBACK: &str = "failed to submit results";
const REMEDIAL_FALLBACK: &str = "failed to generate remedial questions";

//
// ─── SESSION STORE ─────────────────────────────────────────────────────────────
//

/// Single authoritative holder of one quiz run's state.
///
/// Every interaction with the remote backend goes through this store; views
/// read the derived values and re-render from the fields mutated here. All
/// mutating actions take `&mut self`, so overlapping invocations of the same
/// store are unrepresentable — one caller at a time, enforced by the borrow
/// checker rather than by convention.
///
/// Each asynchronous action toggles `is_loading` on entry and on every exit
/// path, success or failure, and never retries on its own.
pub struct SessionStore {
    backend: Arc<dyn QuizBackend>,
    clock: Clock,
    pass_threshold: u8,

    user_id: UserId,
    subject: String,
    questions: Vec<Question>,
    current_question_index: usize,
    answers: HashMap<QuestionId, String>,
    score: u32,
    correct_count: u32,
    total_questions: u32,
    is_loading: bool,
    error: Option<String>,
    game_result: Option<GameResult>,
    has_scratched: bool,
    collected_cards: Vec<CardId>,
    started_at: Option<DateTime<Utc>>,
}

impl SessionStore {
    /// Creates a store with default subject and pass threshold.
    #[must_use]
    pub fn new(backend: Arc<dyn QuizBackend>, clock: Clock) -> Self {
        Self {
            backend,
            clock,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            user_id: UserId::new(""),
            subject: DEFAULT_SUBJECT.to_string(),
            questions: Vec::new(),
            current_question_index: 0,
            answers: HashMap::new(),
            score: 0,
            correct_count: 0,
            total_questions: 0,
            is_loading: false,
            error: None,
            game_result: None,
            has_scratched: false,
            collected_cards: Vec::new(),
            started_at: None,
        }
    }

    /// Overrides the configured pass threshold, in percent.
    #[must_use]
    pub fn with_pass_threshold(mut self, percent: u8) -> Self {
        self.pass_threshold = percent;
        self
    }

    // Accessors

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    /// The recorded answer for a question, if any.
    #[must_use]
    pub fn answer_for(&self, question_id: &QuestionId) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    /// Number of questions answered so far.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn game_result(&self) -> Option<&GameResult> {
        self.game_result.as_ref()
    }

    #[must_use]
    pub fn has_scratched(&self) -> bool {
        self.has_scratched
    }

    #[must_use]
    pub fn collected_cards(&self) -> &[CardId] {
        &self.collected_cards
    }

    /// When the current run was started, from the injected clock.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn pass_threshold(&self) -> u8 {
        self.pass_threshold
    }

    // Derived views

    /// The question under the cursor, if any are loaded.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    /// True when the cursor sits on the final question, or none are loaded.
    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current_question_index + 1 >= self.questions.len()
    }

    /// Completion percentage for the progress bar: 0 with no questions,
    /// exactly 100 on the last one.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        let answered = (self.current_question_index + 1) as f64;
        let total = self.questions.len() as f64;
        (answered / total) * 100.0
    }

    // Actions

    /// Replaces the local card collection with the server's copy.
    ///
    /// Card sync is not critical to the quiz flow: both failure kinds are
    /// swallowed and logged, existing state is left unchanged on failure,
    /// and `error` is never touched here.
    pub async fn fetch_user_cards(&mut self, id: &UserId) {
        self.is_loading = true;
        match self.backend.get_collection(id).await {
            Ok(cards) => self.collected_cards = cards,
            Err(err) => warn!(user = %id, error = %err, "failed to fetch card collection"),
        }
        self.is_loading = false;
    }

    /// Optimistically records a reward card, then persists the association.
    ///
    /// The local insert is kept even when the remote update fails — an
    /// accepted inconsistency; the collection re-syncs on the next
    /// `fetch_user_cards`. `error` is never touched here.
    pub async fn save_card(&mut self, id: &UserId, card: CardId) {
        if !self.collected_cards.contains(&card) {
            self.collected_cards.push(card.clone());
        }

        self.is_loading = true;
        if let Err(err) = self.backend.update_collection(id, &card).await {
            warn!(user = %id, card = %card, error = %err, "failed to persist card collection");
        }
        self.is_loading = false;
    }

    /// Resets the per-run fields and loads a fresh question set.
    ///
    /// Answers, cursor, result and the scratch flag are cleared up front;
    /// the previously loaded question list is only replaced on success, so a
    /// failed start never leaves a partially overwritten set. On a
    /// well-formed backend failure the server's message lands in `error`; on
    /// a transport failure a fixed generic message does.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` mirroring whatever was stored in `error`.
    pub async fn start_game(
        &mut self,
        id: &UserId,
        subject: &str,
        count: u32,
    ) -> Result<(), StoreError> {
        self.user_id = id.clone();
        self.subject = subject.to_string();
        self.error = None;
        self.answers.clear();
        self.current_question_index = 0;
        self.game_result = None;
        self.has_scratched = false;
        self.started_at = Some(self.clock.now());

        self.is_loading = true;
        let outcome = self.backend.fetch_questions(subject, count).await;
        self.is_loading = false;

        match outcome {
            Ok(records) => {
                self.questions = records
                    .into_iter()
                    .enumerate()
                    .map(|(position, record)| {
                        Question::decorated(record.id, record.prompt, record.options, position)
                    })
                    .collect();
                self.total_questions =
                    u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
                debug!(subject, total = self.total_questions, "game started");
                Ok(())
            }
            Err(err) => Err(self.fail(err, FETCH_FALLBACK, StoreError::Connection)),
        }
    }

    /// Records (or overwrites) the selected option for a question.
    ///
    /// No network effect, and deliberately no check that the id belongs to
    /// the loaded set — the views only ever pass ids they rendered.
    pub fn register_answer(&mut self, question_id: QuestionId, selected_option: impl Into<String>) {
        self.answers.insert(question_id, selected_option.into());
    }

    /// Advances the cursor by one, saturating at the last question.
    pub fn next_question(&mut self) {
        if !self.is_last_question() {
            self.current_question_index += 1;
        }
    }

    /// Marks the one-time scratch reward as claimed for this run.
    pub fn mark_scratched(&mut self) {
        self.has_scratched = true;
    }

    /// Sends the collected answers for scoring and records the outcome.
    ///
    /// The backend receives the threshold as a rounded-up count of required
    /// correct answers; the pass/fail verdict compares the returned score
    /// against the raw percentage threshold.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Rejected` with the server message (or a generic
    /// fallback), or `StoreError::Submission` on transport failure; either
    /// way the same text is stored in `error`.
    pub async fn submit_results(&mut self) -> Result<(), StoreError> {
        let submission = ResultSubmission {
            id: self.user_id.clone(),
            subject: self.subject.clone(),
            answers: self.answers.clone(),
            pass_threshold_count: scoring::pass_threshold_count(
                self.total_questions,
                self.pass_threshold,
            ),
        };

        self.is_loading = true;
        let outcome = self.backend.submit_result(&submission).await;
        self.is_loading = false;

        match outcome {
            Ok(report) => {
                self.score = report.score;
                self.correct_count = report.correct_count;
                self.game_result = Some(GameResult {
                    score: report.score,
                    correct_count: report.correct_count,
                    total: self.total_questions,
                    passed: scoring::is_passing(report.score, self.pass_threshold),
                    review: report.review,
                    wrong_questions: report.wrong_questions,
                });
                debug!(score = self.score, "results scored");
                Ok(())
            }
            Err(err) => Err(self.fail(err, SUBMIT_FALLBACK, StoreError::Submission)),
        }
    }

    /// Requests fresh questions targeting the wrongly answered ones.
    ///
    /// Fails fast, without a network call, when no result or no wrong
    /// questions are recorded. Session state is left untouched on success —
    /// the caller decides what to do with the generated batch — and `error`
    /// is not set on failure; this action reports through its return value
    /// alone.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NothingToRegenerate` when there is nothing to
    /// work from, otherwise the surfaced backend failure.
    pub async fn generate_remedial_questions(&mut self) -> Result<RemedialBatch, StoreError> {
        let wrong_questions: Vec<serde_json::Value> = match &self.game_result {
            Some(result) if result.has_wrong_questions() => result.wrong_questions.clone(),
            _ => return Err(StoreError::NothingToRegenerate),
        };

        self.is_loading = true;
        let outcome = self
            .backend
            .generate_questions(&self.subject, &wrong_questions)
            .await;
        self.is_loading = false;

        match outcome {
            Ok(count) => Ok(RemedialBatch { count }),
            Err(err) => Err(surface(err, REMEDIAL_FALLBACK, StoreError::Connection)),
        }
    }

    /// Surfaces a backend failure and mirrors it into the `error` field.
    fn fail(&mut self, err: BackendError, fallback: &str, on_transport: StoreError) -> StoreError {
        let store_err = surface(err, fallback, on_transport);
        self.error = Some(store_err.to_string());
        store_err
    }
}

/// Collapses a backend failure into the user-visible form: rejections carry
/// the server message (or the action's fallback), everything else becomes
/// the generic transport error with the cause only logged.
fn surface(err: BackendError, fallback: &str, on_transport: StoreError) -> StoreError {
    match err {
        BackendError::Rejected { message } => {
            StoreError::Rejected(message.unwrap_or_else(|| fallback.to_string()))
        }
        other => {
            warn!(error = %other, "backend call failed");
            on_transport
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("user_id", &self.user_id)
            .field("subject", &self.subject)
            .field("questions_len", &self.questions.len())
            .field("current_question_index", &self.current_question_index)
            .field("answered", &self.answers.len())
            .field("is_loading", &self.is_loading)
            .field("error", &self.error)
            .field("has_result", &self.game_result.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{InMemoryBackend, QuestionRecord, SeededQuestion};
    use quiz_core::time::fixed_now;

    fn seeded_store(count: u64) -> (SessionStore, InMemoryBackend) {
        let backend = InMemoryBackend::new();
        let bank = (1..=count)
            .map(|n| {
                SeededQuestion::new(
                    QuestionRecord {
                        id: QuestionId::new(format!("q{n}")),
                        prompt: format!("prompt {n}"),
                        options: vec!["a".into(), "b".into()],
                    },
                    "a",
                )
            })
            .collect();
        backend.seed_subject(DEFAULT_SUBJECT, bank);

        let store = SessionStore::new(Arc::new(backend.clone()), Clock::fixed(fixed_now()));
        (store, backend)
    }

    #[test]
    fn fresh_store_has_empty_derived_views() {
        let (store, _) = seeded_store(3);
        assert!(store.current_question().is_none());
        assert!(store.is_last_question());
        assert!((store.progress() - 0.0).abs() < f64::EPSILON);
        assert_eq!(store.subject(), DEFAULT_SUBJECT);
        assert_eq!(store.pass_threshold(), DEFAULT_PASS_THRESHOLD);
    }

    #[tokio::test]
    async fn register_answer_overwrites_instead_of_duplicating() {
        let (mut store, _) = seeded_store(3);
        store
            .start_game(&UserId::new("u1"), DEFAULT_SUBJECT, 3)
            .await
            .unwrap();

        store.register_answer(QuestionId::new("q1"), "a");
        store.register_answer(QuestionId::new("q1"), "b");

        assert_eq!(store.answered_count(), 1);
        assert_eq!(store.answer_for(&QuestionId::new("q1")), Some("b"));
    }

    #[tokio::test]
    async fn next_question_saturates_at_the_last_index() {
        let (mut store, _) = seeded_store(3);
        store
            .start_game(&UserId::new("u1"), DEFAULT_SUBJECT, 3)
            .await
            .unwrap();

        for _ in 0..10 {
            store.next_question();
        }
        assert_eq!(store.current_question_index(), 2);
        assert!(store.is_last_question());
        assert!((store.progress() - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn start_game_stamps_started_at_from_the_clock() {
        let (mut store, _) = seeded_store(2);
        assert!(store.started_at().is_none());

        store
            .start_game(&UserId::new("u1"), DEFAULT_SUBJECT, 2)
            .await
            .unwrap();
        assert_eq!(store.started_at(), Some(fixed_now()));
    }

    #[tokio::test]
    async fn mark_scratched_is_idempotent_and_reset_by_start_game() {
        let (mut store, _) = seeded_store(2);
        store.mark_scratched();
        store.mark_scratched();
        assert!(store.has_scratched());

        store
            .start_game(&UserId::new("u1"), DEFAULT_SUBJECT, 2)
            .await
            .unwrap();
        assert!(!store.has_scratched());
    }

    #[tokio::test]
    async fn questions_are_decorated_with_positional_avatars() {
        let (mut store, _) = seeded_store(2);
        store
            .start_game(&UserId::new("u1"), DEFAULT_SUBJECT, 2)
            .await
            .unwrap();

        let questions = store.questions();
        assert_eq!(
            questions[0].avatar_url(),
            quiz_core::model::avatar_url(questions[0].id(), 0)
        );
        assert_eq!(
            questions[1].avatar_url(),
            quiz_core::model::avatar_url(questions[1].id(), 1)
        );
    }
}
