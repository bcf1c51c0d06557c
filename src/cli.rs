//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::auth::Role;
use clap::Parser;
use std::path::PathBuf;

/// SpeakSpace Feedback - session feedback reports for evaluators
///
/// Load the evaluations submitted for a group-discussion session,
/// compute average ratings, and export a Markdown, JSON or CSV report.
///
/// Examples:
///   speakspace-feedback --session 3 --role evaluator --sample
///   speakspace-feedback --session 42 --role evaluator --data-dir ./feedback --format csv -o 42.csv
///   speakspace-feedback --list --data-dir ./feedback
///   speakspace-feedback --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Session identifier to report on
    #[arg(
        short,
        long,
        value_name = "ID",
        required_unless_present_any = ["init_config", "list"]
    )]
    pub session: Option<String>,

    /// Role of the current user
    ///
    /// Only evaluators may view session feedback.
    #[arg(short, long, value_name = "ROLE", env = "SPEAKSPACE_ROLE")]
    pub role: Option<RoleArg>,

    /// Directory containing one <session-id>.json file per session
    ///
    /// Default: from config or ./data
    #[arg(short, long, value_name = "DIR", env = "SPEAKSPACE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Use the built-in sample session instead of a data directory
    #[arg(long, conflicts_with = "data_dir")]
    pub sample: bool,

    /// Output file path for the report ("-" for stdout)
    ///
    /// Default: from config or feedback_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json, csv)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .speakspace.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Flag evaluations whose overall differs from their category mean by more than this
    #[arg(long, value_name = "POINTS")]
    pub divergence_threshold: Option<f64>,

    /// strftime pattern for dates in the report
    #[arg(long, value_name = "PATTERN")]
    pub date_format: Option<String>,

    /// Leave individual feedback notes out of the report
    #[arg(long)]
    pub no_notes: bool,

    /// List available sessions and exit
    #[arg(long)]
    pub list: bool,

    /// Generate a default .speakspace.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
    /// CSV, one row per evaluation
    Csv,
}

/// Role accepted by --role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RoleArg {
    Moderator,
    Participant,
    Evaluator,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Moderator => Role::Moderator,
            RoleArg::Participant => Role::Participant,
            RoleArg::Evaluator => Role::Evaluator,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The viewer's role, `None` when unauthenticated.
    pub fn viewer_role(&self) -> Option<Role> {
        self.role.map(Role::from)
    }

    /// Get the session id (should be validated first).
    pub fn session_id(&self) -> &str {
        self.session.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if !self.list && self.session_id().trim().is_empty() {
            return Err("Session id must not be empty".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(threshold) = self.divergence_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err("Divergence threshold must be a non-negative number".to_string());
            }
        }

        // Validate data directory if provided
        if let Some(ref data_dir) = self.data_dir {
            if !data_dir.exists() {
                return Err(format!(
                    "Data directory does not exist: {}",
                    data_dir.display()
                ));
            }
            if !data_dir.is_dir() {
                return Err(format!(
                    "Data path is not a directory: {}",
                    data_dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose` from the config file;
    /// --quiet still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            session: Some("3".to_string()),
            role: Some(RoleArg::Evaluator),
            data_dir: None,
            sample: true,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: false,
            divergence_threshold: None,
            date_format: None,
            no_notes: false,
            list: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "speakspace-feedback",
            "--session",
            "3",
            "--role",
            "evaluator",
            "--sample",
            "--format",
            "csv",
        ])
        .unwrap();

        assert_eq!(args.session_id(), "3");
        assert_eq!(args.viewer_role(), Some(Role::Evaluator));
        assert_eq!(args.format, OutputFormat::Csv);
        assert!(args.sample);
    }

    #[test]
    fn test_session_required_unless_list() {
        assert!(Args::try_parse_from(["speakspace-feedback", "--sample"]).is_err());
        assert!(Args::try_parse_from(["speakspace-feedback", "--list", "--sample"]).is_ok());
        assert!(Args::try_parse_from(["speakspace-feedback", "--init-config"]).is_ok());
    }

    #[test]
    fn test_sample_conflicts_with_data_dir() {
        let result = Args::try_parse_from([
            "speakspace-feedback",
            "-s",
            "3",
            "--sample",
            "--data-dir",
            ".",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_threshold() {
        let mut args = make_args();
        args.divergence_threshold = Some(-0.5);
        assert!(args.validate().is_err());

        args.divergence_threshold = Some(0.0);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_data_dir() {
        let mut args = make_args();
        args.sample = false;
        args.data_dir = Some(PathBuf::from("/definitely/not/a/real/dir"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_viewer_role_unauthenticated() {
        let mut args = make_args();
        args.role = None;
        assert_eq!(args.viewer_role(), None);

        args.role = Some(RoleArg::Moderator);
        assert_eq!(args.viewer_role(), Some(Role::Moderator));
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config_verbose() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
