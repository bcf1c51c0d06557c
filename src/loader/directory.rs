//! Feedback stored as one JSON file per session.
//!
//! Session `<id>` lives at `<data_dir>/<id>.json`.

use super::{parse_session, validate_session_id, FeedbackSource};
use crate::error::{FeedbackError, Result};
use crate::models::SessionFeedbackSummary;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Loads session feedback from a data directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    data_dir: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at `data_dir`.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Directory this source reads from.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.data_dir.join(format!("{}.json", session_id)))
    }
}

impl FeedbackSource for DirectorySource {
    fn load_session_feedback(&self, session_id: &str) -> Result<SessionFeedbackSummary> {
        let path = self.session_path(session_id)?;

        if !path.is_file() {
            debug!("No feedback file at {}", path.display());
            return Err(FeedbackError::SessionNotFound(session_id.to_string()));
        }

        info!("Loading feedback from {}", path.display());
        let content = fs::read_to_string(&path)?;

        parse_session(&content, session_id)
    }

    fn list_sessions(&self) -> Result<Vec<String>> {
        if !self.data_dir.is_dir() {
            return Err(FeedbackError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Data directory not found: {}", self.data_dir.display()),
            )));
        }

        let mut sessions = Vec::new();

        for entry in WalkDir::new(&self.data_dir).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("json")
            {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            if validate_session_id(stem).is_ok() {
                sessions.push(stem.to_string());
            } else {
                debug!("Ignoring file with invalid session id: {}", path.display());
            }
        }

        sessions.sort();
        Ok(sessions)
    }
}
