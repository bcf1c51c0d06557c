//! Report generation.
//!
//! This module renders a [`FeedbackReport`] as Markdown, JSON or CSV
//! and writes the result to a file or stdout.

use crate::config::ReportConfig;
use crate::models::{
    AverageRatings, ChartSlice, EvaluationRecord, FeedbackReport, RankedParticipant,
    RatingCategory, RatingDivergence, SessionFeedbackSummary,
};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use tracing::warn;

const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Format a timestamp with a strftime pattern.
///
/// Falls back to `YYYY-MM-DD HH:MM` when the pattern is invalid.
pub fn format_date(timestamp: &NaiveDateTime, pattern: &str) -> String {
    let mut formatted = String::new();

    if write!(formatted, "{}", timestamp.format(pattern)).is_err() {
        warn!("Invalid date format '{}', using default", pattern);
        return timestamp.format(FALLBACK_DATE_FORMAT).to_string();
    }

    formatted
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &FeedbackReport, config: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!(
        "# Session Feedback: {}\n\n",
        report.session.session_title
    ));

    output.push_str(&generate_details_section(report, config));
    output.push_str(&generate_table_of_contents(report, config));
    output.push_str(&generate_averages_section(&report.averages, &report.chart));
    output.push_str(&generate_rankings_section(&report.rankings));
    output.push_str(&generate_divergences_section(
        &report.divergences,
        report.metadata.divergence_threshold,
    ));

    if config.include_notes {
        output.push_str(&generate_notes_section(&report.session.evaluations, config));
    }

    if config.include_session_notes {
        output.push_str(&generate_session_notes_section(&report.session));
    }

    output.push_str(&generate_footer(&report.metadata.tool));

    output
}

/// Generate the session details section.
fn generate_details_section(report: &FeedbackReport, config: &ReportConfig) -> String {
    let session = &report.session;
    let mut section = String::new();

    section.push_str("## Session Details\n\n");
    section.push_str(&format!("- **Session ID:** {}\n", session.session_id));
    section.push_str(&format!("- **Type:** {}\n", session.session_type));
    section.push_str(&format!("- **Topic:** {}\n", session.session_topic));
    section.push_str(&format!(
        "- **Date:** {}\n",
        format_date(&session.date, &config.date_format)
    ));
    section.push_str(&format!("- **Duration:** {} minutes\n", session.duration));
    section.push_str(&format!("- **Moderator:** {}\n", session.moderator.name));
    section.push_str(&format!(
        "- **Participants:** {}\n",
        session.participant_count
    ));
    section.push_str(&format!(
        "- **Evaluations:** {}\n",
        report.metadata.evaluation_count
    ));
    section.push_str(&format!(
        "- **Report Generated:** {}\n",
        report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &FeedbackReport, config: &ReportConfig) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Session Details](#session-details)\n");
    toc.push_str("- [Average Ratings](#average-ratings)\n");
    toc.push_str("- [Participant Rankings](#participant-rankings)\n");

    if !report.divergences.is_empty() {
        toc.push_str("- [Rating Divergences](#rating-divergences)\n");
    }

    if config.include_notes && !report.session.evaluations.is_empty() {
        toc.push_str("- [Individual Feedback Notes](#individual-feedback-notes)\n");
    }

    if config.include_session_notes && !report.session.session_notes.is_empty() {
        toc.push_str("- [Session Notes](#session-notes)\n");
    }

    toc.push('\n');

    toc
}

/// Generate the average ratings section.
fn generate_averages_section(averages: &AverageRatings, chart: &[ChartSlice]) -> String {
    let mut section = String::new();

    section.push_str("## Average Ratings\n\n");

    if averages.is_empty() {
        section.push_str("No evaluations have been submitted for this session.\n\n");
        return section;
    }

    section.push_str(&format!(
        "**Overall Average:** {:.1}/10\n\n",
        averages.overall
    ));

    section.push_str("| Category | Average | Share | Color |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");

    for slice in chart {
        section.push_str(&format!(
            "| {} | {:.1}/10 | {:.1}% | `{}` |\n",
            slice.label,
            slice.value,
            slice.share * 100.0,
            slice.color
        ));
    }
    section.push('\n');

    section
}

/// Generate the participant rankings section.
fn generate_rankings_section(rankings: &[RankedParticipant]) -> String {
    if rankings.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Participant Rankings\n\n");
    section.push_str("| Rank | Participant | Overall | Category Mean |\n");
    section.push_str("|:---:|:---|:---:|:---:|\n");

    for ranked in rankings {
        section.push_str(&format!(
            "| {} | {} | {:.1} | {:.1} |\n",
            ranked.rank,
            escape_table_cell(&ranked.participant_name),
            ranked.overall,
            ranked.category_mean
        ));
    }
    section.push('\n');

    section
}

/// Generate the rating divergences section.
fn generate_divergences_section(divergences: &[RatingDivergence], threshold: f64) -> String {
    if divergences.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Rating Divergences\n\n");
    section.push_str(&format!(
        "These overall scores differ from the mean of the participant's category scores by more than {:.1} points:\n\n",
        threshold
    ));
    section.push_str("| Participant | Reported Overall | Category Mean | Difference |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");

    for divergence in divergences {
        section.push_str(&format!(
            "| {} | {:.1} | {:.1} | {:+.1} |\n",
            escape_table_cell(&divergence.participant_name),
            divergence.reported_overall,
            divergence.category_mean,
            divergence.difference
        ));
    }
    section.push('\n');

    section
}

/// Escape text placed inside a Markdown table cell.
fn escape_table_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Generate the individual feedback notes section.
fn generate_notes_section(evaluations: &[EvaluationRecord], config: &ReportConfig) -> String {
    if evaluations.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Individual Feedback Notes\n\n");

    for evaluation in evaluations {
        section.push_str(&generate_evaluation_block(evaluation, config));
    }

    section
}

/// Generate the feedback block for a single participant.
fn generate_evaluation_block(evaluation: &EvaluationRecord, config: &ReportConfig) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "### {} ({:.1}/10)\n\n",
        evaluation.participant_name, evaluation.ratings.overall
    ));
    block.push_str(&format!(
        "*Feedback submitted at {}*\n\n",
        format_date(&evaluation.submitted_at, &config.date_format)
    ));

    if evaluation.notes.trim().is_empty() {
        block.push_str("*No notes provided.*\n\n");
    } else {
        block.push_str(evaluation.notes.trim());
        block.push_str("\n\n");
    }

    let headers: Vec<String> = RatingCategory::ALL.iter().map(|c| c.to_string()).collect();
    let scores: Vec<String> = RatingCategory::ALL
        .iter()
        .map(|c| format!("{:.1}", evaluation.ratings.get(*c)))
        .collect();

    block.push_str(&format!("| {} |\n", headers.join(" | ")));
    block.push_str(&format!("|{}\n", ":---:|".repeat(headers.len())));
    block.push_str(&format!("| {} |\n\n", scores.join(" | ")));

    block.push_str("---\n\n");

    block
}

/// Generate the session notes section.
fn generate_session_notes_section(session: &SessionFeedbackSummary) -> String {
    if session.session_notes.trim().is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Session Notes\n\n");
    section.push_str(session.session_notes.trim());
    section.push_str("\n\n");

    section
}

/// Generate the report footer.
fn generate_footer(tool: &str) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!("*Report generated by {}*\n", tool));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &FeedbackReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate a CSV report: one row per evaluation, then the averages.
pub fn generate_csv_report(report: &FeedbackReport) -> String {
    let mut output = String::new();

    let mut header = vec!["participant_id", "participant_name"];
    header.extend(RatingCategory::ALL.iter().map(|c| c.key()));
    header.extend(["overall", "submitted_at", "notes"]);
    output.push_str(&header.join(","));
    output.push('\n');

    for evaluation in &report.session.evaluations {
        let mut row = vec![
            escape_csv_field(&evaluation.participant_id),
            escape_csv_field(&evaluation.participant_name),
        ];
        row.extend(
            RatingCategory::ALL
                .iter()
                .map(|c| format!("{:.1}", evaluation.ratings.get(*c))),
        );
        row.push(format!("{:.1}", evaluation.ratings.overall));
        row.push(evaluation.submitted_at.format(CSV_TIMESTAMP_FORMAT).to_string());
        row.push(escape_csv_field(&evaluation.notes));

        output.push_str(&row.join(","));
        output.push('\n');
    }

    let averages = &report.averages;
    let mut row = vec!["AVERAGE".to_string(), String::new()];
    row.extend(
        RatingCategory::ALL
            .iter()
            .map(|c| format!("{:.1}", averages.get(*c))),
    );
    row.push(format!("{:.1}", averages.overall));
    row.push(String::new());
    row.push(String::new());
    output.push_str(&row.join(","));
    output.push('\n');

    output
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
fn escape_csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write report content to a file, or to stdout when `output` is `-`.
pub fn write_output(content: &str, output: &Path) -> Result<()> {
    if output == Path::new("-") {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(content.as_bytes())
            .context("Failed to write report to stdout")?;
        return Ok(());
    }

    let mut file = std::fs::File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", output.display()))?;

    Ok(())
}
