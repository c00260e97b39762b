//! Pass/fail arithmetic for scored quiz runs.
//!
//! The backend receives the threshold as a count of required correct answers,
//! while the pass/fail verdict compares the returned percentage score against
//! the raw percentage threshold. Both derivations live here so the two views
//! of the same setting cannot drift apart.

/// Number of correct answers needed to pass, from a percentage threshold.
///
/// Rounded up, so a 60% threshold over 5 questions requires 3 correct.
#[must_use]
pub fn pass_threshold_count(total_questions: u32, threshold_percent: u8) -> u32 {
    (total_questions * u32::from(threshold_percent)).div_ceil(100)
}

/// Whether a raw percentage score clears the configured threshold.
#[must_use]
pub fn is_passing(score: u32, threshold_percent: u8) -> bool {
    score >= u32::from(threshold_percent)
}
