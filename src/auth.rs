//! Viewer roles and access control for feedback reports.

use crate::error::{FeedbackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a SpeakSpace user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Runs sessions
    Moderator,
    /// Takes part in discussions
    Participant,
    /// Scores participants and reads their feedback
    Evaluator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Moderator => write!(f, "moderator"),
            Role::Participant => write!(f, "participant"),
            Role::Evaluator => write!(f, "evaluator"),
        }
    }
}

/// Whether a viewer may see session feedback.
///
/// `None` is an unauthenticated viewer.
pub fn authorize(role: Option<Role>) -> bool {
    matches!(role, Some(Role::Evaluator))
}

/// Fail with [`FeedbackError::AccessDenied`] unless the viewer is an evaluator.
pub fn require_evaluator(role: Option<Role>) -> Result<()> {
    if authorize(role) {
        Ok(())
    } else {
        Err(FeedbackError::AccessDenied)
    }
}
