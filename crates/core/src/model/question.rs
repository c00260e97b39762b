use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::ids::QuestionId;

/// Base endpoint for the deterministic per-question avatar images.
const AVATAR_BASE: &str = "https://api.dicebear.com/9.x/pixel-art/svg";

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single quiz question as presented to the player.
///
/// The backend owns the id, prompt and option set; the avatar URL is derived
/// client-side from the (id, position) pair and is stable across reloads of
/// the same question list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    avatar_url: String,
}

impl Question {
    /// Builds a question from backend-supplied fields, deriving the avatar
    /// URL from the question's id and its 0-based position in the list.
    #[must_use]
    pub fn decorated(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        position: usize,
    ) -> Self {
        let avatar_url = avatar_url(&id, position);
        Self {
            id,
            prompt: prompt.into(),
            options,
            avatar_url,
        }
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn avatar_url(&self) -> &str {
        &self.avatar_url
    }
}

/// Deterministic avatar URL for a question at a given list position.
///
/// The seed is `<id>_<position>`, percent-encoded, so the same (id, position)
/// pair always resolves to the same image.
#[must_use]
pub fn avatar_url(id: &QuestionId, position: usize) -> String {
    let seed = format!("{}_{position}", id.as_str());
    let mut url = Url::parse(AVATAR_BASE).expect("avatar base URL is valid");
    url.query_pairs_mut().append_pair("seed", &seed);
    url.into()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_url_is_deterministic_per_id_and_position() {
        let id = QuestionId::new("q1");
        assert_eq!(avatar_url(&id, 0), avatar_url(&id, 0));
        assert_ne!(avatar_url(&id, 0), avatar_url(&id, 1));
        assert_ne!(avatar_url(&id, 0), avatar_url(&QuestionId::new("q2"), 0));
    }

    #[test]
    fn avatar_url_percent_encodes_the_seed() {
        let url = avatar_url(&QuestionId::new("史 1"), 3);
        assert!(url.starts_with("https://api.dicebear.com/9.x/pixel-art/svg?seed="));
        assert!(!url.contains(' '));
        assert!(url.ends_with("_3"));
    }

    #[test]
    fn decorated_question_carries_its_avatar() {
        let question = Question::decorated(
            QuestionId::new("q7"),
            "Who unified the six states?",
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            4,
        );

        assert_eq!(question.id(), &QuestionId::new("q7"));
        assert_eq!(question.prompt(), "Who unified the six states?");
        assert_eq!(question.options().len(), 4);
        assert_eq!(question.avatar_url(), avatar_url(question.id(), 4));
    }
}
