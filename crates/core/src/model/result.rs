use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scored outcome of one finished quiz run.
///
/// Populated only after a successful submission. The `review` blob and the
/// wrong-question records are produced by the backend and carried verbatim;
/// the client never interprets them beyond echoing them back for remedial
/// generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    /// Percentage score reported by the backend.
    pub score: u32,
    /// Number of correctly answered questions.
    pub correct_count: u32,
    /// Number of questions in the run.
    pub total: u32,
    /// Whether `score` cleared the configured percentage threshold.
    pub passed: bool,
    /// Opaque review payload from the backend.
    pub review: Value,
    /// Opaque records of the wrongly answered questions.
    pub wrong_questions: Vec<Value>,
}

impl GameResult {
    /// True when there is at least one missed question to regenerate from.
    #[must_use]
    pub fn has_wrong_questions(&self) -> bool {
        !self.wrong_questions.is_empty()
    }
}

/// Success outcome of a remedial-question generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemedialBatch {
    /// How many new questions the backend generated.
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrong_questions_flag_follows_the_list() {
        let mut result = GameResult {
            score: 80,
            correct_count: 8,
            total: 10,
            passed: true,
            review: Value::Null,
            wrong_questions: vec![],
        };
        assert!(!result.has_wrong_questions());

        result.wrong_questions = vec![json!({ "id": "q3" })];
        assert!(result.has_wrong_questions());
    }
}
