//! Error types for feedback loading, validation and authorization.
//!
//! Domain failures are structured with thiserror; the binary workflow wraps
//! them with anyhow context.

use thiserror::Error;

/// Main error type for feedback operations.
#[derive(Error, Debug)]
pub enum FeedbackError {
    /// No feedback data exists for the requested session
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session id contains characters that cannot name a data file
    #[error("Invalid session id '{0}': only letters, digits, '-' and '_' are allowed")]
    InvalidSessionId(String),

    /// Loaded data belongs to a different session than the one requested
    #[error("Session id mismatch: requested '{requested}', data contains '{found}'")]
    SessionIdMismatch { requested: String, found: String },

    /// Session record has an empty id
    #[error("Session data is missing a session id")]
    MissingSessionId,

    /// Evaluation record has an empty participant id
    #[error("Evaluation #{0} is missing a participant id")]
    MissingParticipantId(usize),

    /// Two evaluations share a participant id
    #[error("Duplicate participant id '{participant_id}' in session '{session_id}'")]
    DuplicateParticipant {
        session_id: String,
        participant_id: String,
    },

    /// Rating is not a finite number within 0-10
    #[error("Rating out of range for participant '{participant_id}': {category} = {value} (expected 0-10)")]
    RatingOutOfRange {
        participant_id: String,
        category: String,
        value: f64,
    },

    /// Viewer is not an evaluator
    #[error("Access denied: you need to be logged in as an evaluator to view session feedback")]
    AccessDenied,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON feedback data
    #[error("Malformed feedback data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type alias for feedback operations.
pub type Result<T> = std::result::Result<T, FeedbackError>;
