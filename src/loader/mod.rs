//! Session feedback sources.
//!
//! A [`FeedbackSource`] resolves a session id to the complete, validated
//! feedback for that session before any aggregation runs.

pub mod directory;
pub mod sample;

pub use directory::DirectorySource;
pub use sample::SampleSource;

use crate::error::{FeedbackError, Result};
use crate::models::SessionFeedbackSummary;
use tracing::debug;

/// Loads session feedback by id.
pub trait FeedbackSource {
    /// Load and validate the feedback for one session.
    fn load_session_feedback(&self, session_id: &str) -> Result<SessionFeedbackSummary>;

    /// List the session ids this source can load, sorted.
    fn list_sessions(&self) -> Result<Vec<String>>;
}

/// Check that a session id is safe to use as a file stem.
pub fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(FeedbackError::InvalidSessionId(session_id.to_string()))
    }
}

/// Parse JSON feedback data and check it belongs to `requested_id`.
pub(crate) fn parse_session(content: &str, requested_id: &str) -> Result<SessionFeedbackSummary> {
    let session: SessionFeedbackSummary = serde_json::from_str(content)?;
    session.validate()?;

    if session.session_id != requested_id {
        return Err(FeedbackError::SessionIdMismatch {
            requested: requested_id.to_string(),
            found: session.session_id,
        });
    }

    debug!(
        "Parsed session {} with {} evaluations",
        session.session_id,
        session.evaluations.len()
    );

    Ok(session)
}
