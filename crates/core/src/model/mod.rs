mod ids;
mod question;
mod result;

pub use ids::{CardId, QuestionId, UserId};
pub use question::{Question, avatar_url};
pub use result::{GameResult, RemedialBatch};
