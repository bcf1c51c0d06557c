//! Rating aggregation and statistics.
//!
//! This module turns a session's evaluation records into category
//! averages, chart data, a participant ranking and a list of records
//! whose self-reported overall disagrees with their category scores.
//!
//! All averages are rounded to one decimal place, half away from zero.
//! Ratings are never negative, so this is round-half-up in practice.

use crate::models::{
    AverageRatings, ChartSlice, EvaluationRecord, FeedbackReport, RankedParticipant,
    RatingCategory, RatingDivergence, ReportMetadata, SessionFeedbackSummary,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Round to one decimal place, half away from zero.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute per-category averages and the overall average.
///
/// `overall` is the grand mean of all four category scores across all
/// records. Each record's own `overall` rating does not contribute.
/// An empty slice yields all zeros with `evaluation_count == 0`.
pub fn compute_averages(evaluations: &[EvaluationRecord]) -> AverageRatings {
    if evaluations.is_empty() {
        return AverageRatings::default();
    }

    let mut totals = [0.0_f64; 4];

    for evaluation in evaluations {
        for (total, category) in totals.iter_mut().zip(RatingCategory::ALL) {
            *total += evaluation.ratings.get(category);
        }
    }

    let count = evaluations.len() as f64;
    let grand_total: f64 = totals.iter().sum();

    AverageRatings {
        communication: round_to_tenth(totals[0] / count),
        confidence: round_to_tenth(totals[1] / count),
        reasoning: round_to_tenth(totals[2] / count),
        engagement: round_to_tenth(totals[3] / count),
        overall: round_to_tenth(grand_total / (count * RatingCategory::ALL.len() as f64)),
        evaluation_count: evaluations.len(),
    }
}

/// Map category averages to chart slices.
///
/// Always four slices, in [`RatingCategory::ALL`] order, each with its
/// fixed color. `overall` is not charted.
pub fn to_chart_series(averages: &AverageRatings) -> Vec<ChartSlice> {
    let total: f64 = RatingCategory::ALL.iter().map(|c| averages.get(*c)).sum();

    RatingCategory::ALL
        .iter()
        .map(|category| {
            let value = averages.get(*category);
            let share = if total > 0.0 { value / total } else { 0.0 };

            ChartSlice {
                category: *category,
                label: category.to_string(),
                value,
                color: category.color().to_string(),
                share,
            }
        })
        .collect()
}

/// Rank participants by their self-reported overall score (highest first).
///
/// Ties share a rank and the next rank is skipped (1, 2, 2, 4). Tied
/// participants are listed by name, then id.
pub fn rank_participants(evaluations: &[EvaluationRecord]) -> Vec<RankedParticipant> {
    let mut sorted: Vec<&EvaluationRecord> = evaluations.iter().collect();
    sorted.sort_by(|a, b| {
        b.ratings
            .overall
            .total_cmp(&a.ratings.overall)
            .then_with(|| a.participant_name.cmp(&b.participant_name))
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    });

    let mut ranked: Vec<RankedParticipant> = Vec::with_capacity(sorted.len());

    for (position, evaluation) in sorted.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(prev) if prev.overall.total_cmp(&evaluation.ratings.overall) == Ordering::Equal => {
                prev.rank
            }
            _ => position + 1,
        };

        ranked.push(RankedParticipant {
            rank,
            participant_id: evaluation.participant_id.clone(),
            participant_name: evaluation.participant_name.clone(),
            overall: evaluation.ratings.overall,
            category_mean: round_to_tenth(evaluation.ratings.category_mean()),
        });
    }

    ranked
}

/// Find records whose self-reported overall differs from the mean of
/// their four category scores by more than `threshold`.
///
/// Results keep submission order.
pub fn find_divergences(evaluations: &[EvaluationRecord], threshold: f64) -> Vec<RatingDivergence> {
    evaluations
        .iter()
        .filter_map(|evaluation| {
            let mean = evaluation.ratings.category_mean();
            let difference = evaluation.ratings.overall - mean;

            if difference.abs() > threshold {
                Some(RatingDivergence {
                    participant_id: evaluation.participant_id.clone(),
                    participant_name: evaluation.participant_name.clone(),
                    reported_overall: evaluation.ratings.overall,
                    category_mean: round_to_tenth(mean),
                    difference: round_to_tenth(difference),
                })
            } else {
                None
            }
        })
        .collect()
}

/// Assemble the complete report for a session.
pub fn build_report(
    session: SessionFeedbackSummary,
    divergence_threshold: f64,
    generated_at: DateTime<Utc>,
) -> FeedbackReport {
    let averages = compute_averages(&session.evaluations);
    let chart = to_chart_series(&averages);
    let rankings = rank_participants(&session.evaluations);
    let divergences = find_divergences(&session.evaluations, divergence_threshold);

    let metadata = ReportMetadata {
        generated_at,
        tool: format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        evaluation_count: averages.evaluation_count,
        divergence_threshold,
    };

    FeedbackReport {
        metadata,
        session,
        averages,
        chart,
        rankings,
        divergences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::{create_test_evaluation, create_test_session};

    fn sample_evaluations() -> Vec<EvaluationRecord> {
        vec![
            create_test_evaluation("2", [8.5, 7.5, 9.0, 8.0], 8.3),
            create_test_evaluation("5", [7.0, 8.5, 7.5, 9.0], 8.0),
            create_test_evaluation("6", [9.0, 6.5, 8.5, 7.0], 7.8),
            create_test_evaluation("7", [6.5, 7.0, 8.0, 6.0], 6.9),
            create_test_evaluation("8", [8.0, 8.0, 7.0, 7.5], 7.6),
        ]
    }

    #[test]
    fn test_compute_averages_sample_session() {
        let averages = compute_averages(&sample_evaluations());

        assert_eq!(averages.communication, 7.8);
        assert_eq!(averages.confidence, 7.5);
        assert_eq!(averages.reasoning, 8.0);
        assert_eq!(averages.engagement, 7.5);
        assert_eq!(averages.overall, 7.7);
        assert_eq!(averages.evaluation_count, 5);
    }

    #[test]
    fn test_compute_averages_empty() {
        let averages = compute_averages(&[]);

        assert!(averages.is_empty());
        for category in RatingCategory::ALL {
            assert_eq!(averages.get(category), 0.0);
        }
        assert_eq!(averages.overall, 0.0);
        assert!(!averages.overall.is_nan());
    }

    #[test]
    fn test_averages_bounded_by_inputs() {
        let evaluations = vec![
            create_test_evaluation("a", [0.0, 10.0, 3.3, 9.9], 5.0),
            create_test_evaluation("b", [10.0, 10.0, 0.1, 0.0], 5.0),
            create_test_evaluation("c", [4.4, 10.0, 7.7, 2.2], 5.0),
        ];
        let averages = compute_averages(&evaluations);

        for category in RatingCategory::ALL {
            let value = averages.get(category);
            assert!((0.0..=10.0).contains(&value), "{category} = {value}");
        }
        assert_eq!(averages.confidence, 10.0);
    }

    #[test]
    fn test_compute_averages_order_independent() {
        let evaluations = sample_evaluations();
        let mut reversed = evaluations.clone();
        reversed.reverse();
        let mut rotated = evaluations.clone();
        rotated.rotate_left(2);

        let expected = compute_averages(&evaluations);
        assert_eq!(compute_averages(&reversed), expected);
        assert_eq!(compute_averages(&rotated), expected);
    }

    #[test]
    fn test_overall_ignores_self_reported_overall() {
        // Category scores say 2.0-4.0, evaluators said 10.
        let evaluations = vec![
            create_test_evaluation("a", [2.0, 2.0, 2.0, 2.0], 10.0),
            create_test_evaluation("b", [4.0, 4.0, 4.0, 4.0], 10.0),
        ];
        let averages = compute_averages(&evaluations);

        let mean_of_categories = (averages.communication
            + averages.confidence
            + averages.reasoning
            + averages.engagement)
            / 4.0;
        assert_eq!(averages.overall, 3.0);
        assert_eq!(averages.overall, mean_of_categories);
        assert_ne!(averages.overall, 10.0);
    }

    #[test]
    fn test_communication_average_rounds_to_one_decimal() {
        let evaluations: Vec<_> = [8.5, 7.0, 9.0, 6.5, 8.0]
            .iter()
            .enumerate()
            .map(|(i, score)| create_test_evaluation(&i.to_string(), [*score, 5.0, 5.0, 5.0], 5.0))
            .collect();

        assert_eq!(compute_averages(&evaluations).communication, 7.8);
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(7.25), 7.3);
        assert_eq!(round_to_tenth(7.84), 7.8);
        assert_eq!(round_to_tenth(0.0), 0.0);
        assert_eq!(round_to_tenth(10.0), 10.0);
    }

    #[test]
    fn test_chart_series_fixed_order_and_colors() {
        let series = to_chart_series(&compute_averages(&sample_evaluations()));
        let again = to_chart_series(&compute_averages(&sample_evaluations()[..2]));

        assert_eq!(series.len(), 4);
        let labels: Vec<_> = series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Communication", "Confidence", "Reasoning", "Engagement"]);
        let colors: Vec<_> = series.iter().map(|s| s.color.as_str()).collect();
        assert_eq!(colors, vec!["#10B981", "#3B82F6", "#8B5CF6", "#F59E0B"]);

        for (a, b) in series.iter().zip(&again) {
            assert_eq!(a.category, b.category);
            assert_eq!(a.color, b.color);
        }

        let share_total: f64 = series.iter().map(|s| s.share).sum();
        assert!((share_total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_chart_series_empty_averages() {
        let series = to_chart_series(&AverageRatings::default());
        assert_eq!(series.len(), 4);
        assert!(series.iter().all(|s| s.value == 0.0 && s.share == 0.0));
    }

    #[test]
    fn test_rank_participants_with_ties() {
        let mut evaluations = vec![
            create_test_evaluation("1", [5.0, 5.0, 5.0, 5.0], 6.0),
            create_test_evaluation("2", [5.0, 5.0, 5.0, 5.0], 9.0),
            create_test_evaluation("3", [5.0, 5.0, 5.0, 5.0], 7.5),
            create_test_evaluation("4", [5.0, 5.0, 5.0, 5.0], 7.5),
        ];
        evaluations[2].participant_name = "Zoe".to_string();
        evaluations[3].participant_name = "Adam".to_string();

        let ranked = rank_participants(&evaluations);

        let order: Vec<_> = ranked.iter().map(|r| r.participant_id.as_str()).collect();
        assert_eq!(order, vec!["2", "4", "3", "1"]);
        let ranks: Vec<_> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 2, 4]);
        assert_eq!(ranked[0].category_mean, 5.0);
    }

    #[test]
    fn test_find_divergences() {
        let evaluations = vec![
            create_test_evaluation("a", [8.0, 8.0, 8.0, 8.0], 8.2),
            create_test_evaluation("b", [4.0, 4.0, 4.0, 4.0], 9.0),
            create_test_evaluation("c", [9.0, 9.0, 9.0, 9.0], 6.5),
        ];

        let divergences = find_divergences(&evaluations, 1.0);

        assert_eq!(divergences.len(), 2);
        assert_eq!(divergences[0].participant_id, "b");
        assert_eq!(divergences[0].difference, 5.0);
        assert_eq!(divergences[1].participant_id, "c");
        assert_eq!(divergences[1].difference, -2.5);

        assert!(find_divergences(&sample_evaluations(), 1.0).is_empty());
    }

    #[test]
    fn test_build_report() {
        let session = create_test_session(sample_evaluations());
        let report = build_report(session, 1.0, Utc::now());

        assert_eq!(report.metadata.evaluation_count, 5);
        assert_eq!(report.averages.overall, 7.7);
        assert_eq!(report.chart.len(), 4);
        assert_eq!(report.rankings.len(), 5);
        assert_eq!(report.rankings[0].participant_id, "2");
        assert!(report.divergences.is_empty());
        assert!(report.metadata.tool.starts_with("speakspace-feedback v"));
    }
}
