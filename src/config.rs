//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.speakspace.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".speakspace.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Directory holding one `<session-id>.json` file per session.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            data_dir: default_data_dir(),
        }
    }
}

fn default_output() -> String {
    "feedback_report.md".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include each participant's feedback notes.
    #[serde(default = "default_true")]
    pub include_notes: bool,

    /// Include the moderator's session notes.
    #[serde(default = "default_true")]
    pub include_session_notes: bool,

    /// Flag records whose overall differs from their category mean by
    /// more than this many points.
    #[serde(default = "default_divergence_threshold")]
    pub divergence_threshold: f64,

    /// strftime pattern for session and submission timestamps.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_notes: true,
            include_session_notes: true,
            divergence_threshold: default_divergence_threshold(),
            date_format: default_date_format(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_divergence_threshold() -> f64 {
    1.0
}

fn default_date_format() -> String {
    "%a, %b %-d, %Y, %I:%M %p".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.speakspace.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = data_dir.display().to_string();
        }
        if let Some(threshold) = args.divergence_threshold {
            self.report.divergence_threshold = threshold;
        }
        if let Some(ref date_format) = args.date_format {
            self.report.date_format = date_format.clone();
        }

        // Flags always override
        if args.no_notes {
            self.report.include_notes = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values that CLI validation cannot see, such as those read
    /// from a config file.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.report.divergence_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            bail!(
                "Invalid report.divergence_threshold {}: must be a non-negative number",
                threshold
            );
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "feedback_report.md");
        assert_eq!(config.general.data_dir, "data");
        assert!(config.report.include_notes);
        assert_eq!(config.report.divergence_threshold, 1.0);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "session.json"
data_dir = "/srv/speakspace/feedback"

[report]
include_notes = false
divergence_threshold = 0.5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "session.json");
        assert_eq!(config.general.data_dir, "/srv/speakspace/feedback");
        assert!(!config.general.verbose);
        assert!(!config.report.include_notes);
        assert!(config.report.include_session_notes);
        assert_eq!(config.report.divergence_threshold, 0.5);
        assert_eq!(config.report.date_format, "%a, %b %-d, %Y, %I:%M %p");
    }

    #[test]
    fn test_load_from_dir() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[general]\nverbose = true\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert!(config.general.verbose);

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[general\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = make_args();
        config.merge_with_args(&args);
        assert_eq!(config.general.output, "feedback_report.md");
        assert!(config.report.include_notes);

        args.output = Some(PathBuf::from("out.csv"));
        args.data_dir = Some(PathBuf::from("sessions"));
        args.divergence_threshold = Some(2.0);
        args.no_notes = true;
        config.merge_with_args(&args);
        assert_eq!(config.general.output, "out.csv");
        assert_eq!(config.general.data_dir, "sessions");
        assert_eq!(config.report.divergence_threshold, 2.0);
        assert!(!config.report.include_notes);
    }

    #[test]
    fn test_validate_divergence_threshold() {
        assert!(Config::default().validate().is_ok());

        let config: Config = toml::from_str("[report]\ndivergence_threshold = 0.0\n").unwrap();
        assert!(config.validate().is_ok());

        let config: Config = toml::from_str("[report]\ndivergence_threshold = -1.0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("divergence_threshold"));

        let config: Config = toml::from_str("[report]\ndivergence_threshold = nan\n").unwrap();
        assert!(config.validate().is_err());

        let config: Config = toml::from_str("[report]\ndivergence_threshold = inf\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_verbose_raises_log_level() {
        let config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        let args = make_args();
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);
        assert_eq!(
            args.log_level(Config::default().general.verbose),
            tracing::Level::INFO
        );
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[report]"));
        assert!(toml_str.contains("divergence_threshold"));
    }
}
