#![forbid(unsafe_code)]

pub mod error;
pub mod session_store;

pub use quiz_core::Clock;

pub use error::StoreError;
pub use session_store::{DEFAULT_PASS_THRESHOLD, DEFAULT_SUBJECT, SessionStore};
