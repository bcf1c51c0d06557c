//! Data models for session feedback.
//!
//! This module contains the structures loaded from feedback data
//! (sessions and evaluation records) and the derived view models
//! produced by aggregation and exported in reports.

use crate::error::{FeedbackError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Lowest score an evaluator can give.
pub const MIN_RATING: f64 = 0.0;
/// Highest score an evaluator can give.
pub const MAX_RATING: f64 = 10.0;

/// A rating dimension scored for every participant.
///
/// Declaration order is the display order used by charts and tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingCategory {
    Communication,
    Confidence,
    Reasoning,
    Engagement,
}

impl RatingCategory {
    /// All categories in display order.
    pub const ALL: [RatingCategory; 4] = [
        RatingCategory::Communication,
        RatingCategory::Confidence,
        RatingCategory::Reasoning,
        RatingCategory::Engagement,
    ];

    /// Field name used in feedback data and CSV headers.
    pub fn key(&self) -> &'static str {
        match self {
            RatingCategory::Communication => "communication",
            RatingCategory::Confidence => "confidence",
            RatingCategory::Reasoning => "reasoning",
            RatingCategory::Engagement => "engagement",
        }
    }

    /// Chart color, stable across sessions.
    pub fn color(&self) -> &'static str {
        match self {
            RatingCategory::Communication => "#10B981",
            RatingCategory::Confidence => "#3B82F6",
            RatingCategory::Reasoning => "#8B5CF6",
            RatingCategory::Engagement => "#F59E0B",
        }
    }
}

impl fmt::Display for RatingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingCategory::Communication => write!(f, "Communication"),
            RatingCategory::Confidence => write!(f, "Confidence"),
            RatingCategory::Reasoning => write!(f, "Reasoning"),
            RatingCategory::Engagement => write!(f, "Engagement"),
        }
    }
}

/// Scores given to one participant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    pub communication: f64,
    pub confidence: f64,
    pub reasoning: f64,
    pub engagement: f64,
    /// Evaluator's holistic score. Authored independently of the four
    /// categories and never derived from them.
    pub overall: f64,
}

impl Ratings {
    /// Returns the score for a category.
    pub fn get(&self, category: RatingCategory) -> f64 {
        match category {
            RatingCategory::Communication => self.communication,
            RatingCategory::Confidence => self.confidence,
            RatingCategory::Reasoning => self.reasoning,
            RatingCategory::Engagement => self.engagement,
        }
    }

    /// Unrounded mean of the four category scores.
    pub fn category_mean(&self) -> f64 {
        let total: f64 = RatingCategory::ALL.iter().map(|c| self.get(*c)).sum();
        total / RatingCategory::ALL.len() as f64
    }
}

/// One evaluator's scored feedback for one participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    /// Identifier, unique within the session.
    pub participant_id: String,
    pub participant_name: String,
    /// Avatar URL.
    #[serde(default)]
    pub participant_image: String,
    pub ratings: Ratings,
    /// Free-text feedback; missing notes are an empty string.
    #[serde(default)]
    pub notes: String,
    pub submitted_at: NaiveDateTime,
}

/// Moderator of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moderator {
    pub name: String,
    pub id: String,
}

/// A session together with every evaluation submitted for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFeedbackSummary {
    pub session_id: String,
    pub session_title: String,
    pub session_topic: String,
    pub session_type: String,
    /// Scheduled start (local time).
    pub date: NaiveDateTime,
    /// Duration in minutes.
    pub duration: u32,
    pub moderator: Moderator,
    pub participant_count: usize,
    /// Evaluations in submission order.
    #[serde(default)]
    pub evaluations: Vec<EvaluationRecord>,
    #[serde(default)]
    pub session_notes: String,
}

impl SessionFeedbackSummary {
    /// Check the invariants feedback data must satisfy.
    ///
    /// Malformed data is rejected rather than coerced.
    pub fn validate(&self) -> Result<()> {
        if self.session_id.trim().is_empty() {
            return Err(FeedbackError::MissingSessionId);
        }

        let mut seen = HashSet::new();

        for (index, evaluation) in self.evaluations.iter().enumerate() {
            let participant_id = evaluation.participant_id.trim();
            if participant_id.is_empty() {
                return Err(FeedbackError::MissingParticipantId(index + 1));
            }

            if !seen.insert(participant_id) {
                return Err(FeedbackError::DuplicateParticipant {
                    session_id: self.session_id.clone(),
                    participant_id: participant_id.to_string(),
                });
            }

            let scores = RatingCategory::ALL
                .iter()
                .map(|c| (c.key(), evaluation.ratings.get(*c)))
                .chain(std::iter::once(("overall", evaluation.ratings.overall)));

            for (category, value) in scores {
                if !value.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&value) {
                    return Err(FeedbackError::RatingOutOfRange {
                        participant_id: participant_id.to_string(),
                        category: category.to_string(),
                        value,
                    });
                }
            }
        }

        if self.participant_count != self.evaluations.len() {
            debug!(
                "Session {} lists {} participants but has {} evaluations",
                self.session_id,
                self.participant_count,
                self.evaluations.len()
            );
        }

        Ok(())
    }
}

/// Per-category averages across a session's evaluations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageRatings {
    pub communication: f64,
    pub confidence: f64,
    pub reasoning: f64,
    pub engagement: f64,
    /// Grand mean of the four categories.
    pub overall: f64,
    /// Number of evaluations averaged. Zero means there was no data and
    /// every average is 0.0.
    pub evaluation_count: usize,
}

impl AverageRatings {
    /// Returns the average for a category.
    pub fn get(&self, category: RatingCategory) -> f64 {
        match category {
            RatingCategory::Communication => self.communication,
            RatingCategory::Confidence => self.confidence,
            RatingCategory::Reasoning => self.reasoning,
            RatingCategory::Engagement => self.engagement,
        }
    }

    /// True when no evaluations contributed to the averages.
    pub fn is_empty(&self) -> bool {
        self.evaluation_count == 0
    }
}

/// One slice of the average-ratings chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSlice {
    pub category: RatingCategory,
    pub label: String,
    pub value: f64,
    pub color: String,
    /// Fraction of the four-slice total, in `[0, 1]`.
    pub share: f64,
}

/// A participant's position in the session ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedParticipant {
    /// 1-based; tied scores share a rank.
    pub rank: usize,
    pub participant_id: String,
    pub participant_name: String,
    /// Self-reported overall score.
    pub overall: f64,
    /// Mean of the participant's four category scores.
    pub category_mean: f64,
}

/// A record whose self-reported overall strays from its category scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingDivergence {
    pub participant_id: String,
    pub participant_name: String,
    pub reported_overall: f64,
    pub category_mean: f64,
    /// `reported_overall - category_mean`.
    pub difference: f64,
}

/// Metadata about the generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Name and version of the generating tool.
    pub tool: String,
    /// Number of evaluations summarized.
    pub evaluation_count: usize,
    /// Threshold used for divergence detection.
    pub divergence_threshold: f64,
}

/// The complete feedback report for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    pub metadata: ReportMetadata,
    pub session: SessionFeedbackSummary,
    pub averages: AverageRatings,
    pub chart: Vec<ChartSlice>,
    pub rankings: Vec<RankedParticipant>,
    pub divergences: Vec<RatingDivergence>,
}
