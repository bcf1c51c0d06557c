//! SpeakSpace Feedback - session feedback reports for evaluators
//!
//! A CLI tool that loads the evaluations submitted for a group-discussion
//! session, computes average ratings and exports a scored summary.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, missing or malformed session data, write failure)
//!   2 - Access denied (viewer is not an evaluator)

mod analysis;
mod auth;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use error::FeedbackError;
use loader::{DirectorySource, FeedbackSource, SampleSource};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const EXIT_ACCESS_DENIED: i32 = 2;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so [general] verbose applies
    let (config, config_origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&args, &config);

    info!("SpeakSpace Feedback v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    info!("{}", config_origin);

    match run(args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Feedback export failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .speakspace.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the data directory, output and report sections.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run the feedback workflow. Returns the process exit code.
fn run(args: Args, config: Config) -> Result<i32> {
    let source = build_source(&args, &config);

    if args.list {
        return handle_list(source.as_ref());
    }

    // No session data is touched before the viewer is authorized.
    let session_id = args.session_id();
    if let Err(e) = auth::require_evaluator(args.viewer_role()) {
        warn!(
            "Denied feedback access for session {} (role: {})",
            session_id,
            args.viewer_role()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unauthenticated".to_string())
        );
        eprintln!("\n⛔ {}", e);
        eprintln!("   Log in as an evaluator and re-run with --role evaluator.");
        return Ok(EXIT_ACCESS_DENIED);
    }

    // Step 1: Load the session's feedback
    info!("Loading feedback for session {}", session_id);
    let session = source
        .load_session_feedback(session_id)
        .map_err(|e| match e {
            FeedbackError::SessionNotFound(_) => {
                anyhow::anyhow!("{}. Use --list to see available sessions.", e)
            }
            other => anyhow::Error::new(other),
        })
        .with_context(|| format!("Failed to load feedback for session {}", session_id))?;

    // Step 2: Aggregate
    let report = analysis::build_report(
        session,
        config.report.divergence_threshold,
        Utc::now(),
    );
    debug!("Averages: {:?}", report.averages);

    // Step 3: Render and export
    let output = match args.format {
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Csv => report::generate_csv_report(&report),
    };

    let output_path = PathBuf::from(&config.general.output);
    report::write_output(&output, &output_path)?;

    if output_path != Path::new("-") && !args.quiet {
        print_summary(&report, &output_path);
    }

    Ok(0)
}

/// Print a short console summary of the exported report.
fn print_summary(report: &models::FeedbackReport, output_path: &Path) {
    let averages = &report.averages;

    println!("\n📊 {}", report.session.session_title);
    println!("   Evaluations: {}", averages.evaluation_count);

    if averages.is_empty() {
        println!("   No evaluations submitted yet.");
    } else {
        println!("   Overall average: {:.1}/10", averages.overall);
        for slice in &report.chart {
            println!("   - {}: {:.1}/10", slice.label, slice.value);
        }
    }

    if !report.divergences.is_empty() {
        println!(
            "   ⚠️  {} evaluation(s) with an overall score far from their category scores",
            report.divergences.len()
        );
    }

    println!(
        "\n✅ Feedback exported to: {}",
        output_path.display()
    );
}

/// Handle --list: print the sessions available from the source.
fn handle_list(source: &dyn FeedbackSource) -> Result<i32> {
    let sessions = source.list_sessions().context("Failed to list sessions")?;

    if sessions.is_empty() {
        println!("No sessions found.");
    } else {
        println!("Available sessions ({}):", sessions.len());
        for session in &sessions {
            println!("  {}", session);
        }
    }

    Ok(0)
}

/// Pick the feedback source for this run.
fn build_source(args: &Args, config: &Config) -> Box<dyn FeedbackSource> {
    if args.sample {
        info!("Using built-in sample session");
        Box::new(SampleSource)
    } else {
        let source = DirectorySource::new(PathBuf::from(&config.general.data_dir));
        info!("Using data directory: {}", source.data_dir().display());
        Box::new(source)
    }
}

/// Load configuration from file or use defaults, merge CLI arguments and
/// validate the result.
///
/// Runs before logging is set up, so it returns a description of where the
/// configuration came from for the caller to log.
fn load_config(args: &Args) -> Result<(Config, String)> {
    let (mut config, origin) = if let Some(ref config_path) = args.config {
        // Try explicit config path
        let config = Config::load(config_path)?;
        (config, format!("Loaded config from: {}", config_path.display()))
    } else {
        // Try default location
        match Config::load_default() {
            Ok(Some(config)) => (
                config,
                format!("Loaded default config from {}", CONFIG_FILE_NAME),
            ),
            Ok(None) => (
                Config::default(),
                "No config file found, using defaults".to_string(),
            ),
            Err(e) => {
                eprintln!("⚠️  Failed to load config: {:#}", e);
                (
                    Config::default(),
                    format!("Ignoring unreadable {}, using defaults", CONFIG_FILE_NAME),
                )
            }
        }
    };

    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;

    Ok((config, origin))
}
