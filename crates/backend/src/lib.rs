#![forbid(unsafe_code)]

pub mod api;
pub mod error;
pub mod http;
pub mod memory;

pub use api::{QuestionRecord, QuizBackend, ResultSubmission, ScoreReport};
pub use error::{BackendError, ConfigError};
pub use http::{BackendConfig, HttpBackend};
pub use memory::{InMemoryBackend, SeededQuestion};
