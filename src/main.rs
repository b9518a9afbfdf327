//! eks-tags CLI entrypoint.
//!
//! This is the main entrypoint for the eks-tags command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use eks_tag_sync::aws::AwsClients;
use eks_tag_sync::cli::{Cli, Commands, LogFormat, OutputFormatter};
use eks_tag_sync::config::{ConfigParser, ConfigValidator, TagSyncConfig, find_config_file};
use eks_tag_sync::error::Result;
use eks_tag_sync::reconciler::{TagReconciler, TagScope};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_format);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Validate { warnings } => cmd_validate(cli.config.as_ref(), warnings, &formatter),
        Commands::Plan => cmd_reconcile(cli.config.as_ref(), true, &formatter).await,
        Commands::Apply => cmd_reconcile(cli.config.as_ref(), false, &formatter).await,
    }
}

/// Validate configuration.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config_file = resolve_config_path(config_path)?;
    info!("Validating configuration: {}", config_file.display());

    let config = load_config(&config_file)?;
    let result = ConfigValidator::new().validate(&config)?;

    let output = formatter.format_validation(&config, &result, show_warnings);
    emit(&output)?;

    Ok(())
}

/// Plan or apply tag changes.
async fn cmd_reconcile(
    config_path: Option<&PathBuf>,
    dry_run: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config_file = resolve_config_path(config_path)?;
    let config = load_config(&config_file)?;

    let result = ConfigValidator::new().validate(&config)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }

    let clients = AwsClients::from_env(config.cluster.region.as_deref()).await;
    let scope = TagScope::from_config(&config);
    let reconciler =
        TagReconciler::new(&clients, &clients, &clients, &scope).with_dry_run(dry_run);

    let report = reconciler
        .reconcile(config.nodegroups.as_deref(), config.fargate_profiles.as_deref())
        .await?;

    let output = formatter.format_report(&report);
    emit(&output)?;

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}

/// Loads `.env` next to the configuration, then the configuration itself
/// with environment overrides applied.
fn load_config(config_file: &Path) -> Result<TagSyncConfig> {
    debug!("Loading configuration from: {}", config_file.display());

    let parser =
        ConfigParser::new().with_base_path(config_file.parent().unwrap_or_else(|| Path::new(".")));
    parser.load_dotenv()?;
    parser.load_with_env(config_file)
}

/// Writes command output to stdout.
fn emit(output: &str) -> Result<()> {
    writeln!(std::io::stdout().lock(), "{output}")?;
    Ok(())
}
