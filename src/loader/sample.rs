//! Built-in sample session for demos and trying out the tool.

use super::{parse_session, FeedbackSource};
use crate::error::{FeedbackError, Result};
use crate::models::SessionFeedbackSummary;

const SAMPLE_SESSION_ID: &str = "3";
const SAMPLE_SESSION_JSON: &str = include_str!("../../fixtures/sample_session.json");

/// Serves the bundled "Leadership Skills Assessment" session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleSource;

impl FeedbackSource for SampleSource {
    fn load_session_feedback(&self, session_id: &str) -> Result<SessionFeedbackSummary> {
        if session_id != SAMPLE_SESSION_ID {
            return Err(FeedbackError::SessionNotFound(session_id.to_string()));
        }

        parse_session(SAMPLE_SESSION_JSON, SAMPLE_SESSION_ID)
    }

    fn list_sessions(&self) -> Result<Vec<String>> {
        Ok(vec![SAMPLE_SESSION_ID.to_string()])
    }
}
