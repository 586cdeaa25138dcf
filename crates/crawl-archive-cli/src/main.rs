// crates/crawl-archive-cli/src/main.rs
// ============================================================================
// Module: Crawl Archive CLI Entry Point
// Description: Command dispatcher for archival runs and config validation.
// Purpose: Wire config, storage, cache, and event sinks into the orchestrator.
// Dependencies: clap, crawl-archive-config, crawl-archive-core, thiserror
// ============================================================================

//! ## Overview
//! `crawl-archive process` runs one archival pass over the configured data
//! directory and exits non-zero when any crawl failed. `crawl-archive config
//! validate` loads and validates the configuration without touching crawls.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use crawl_archive_config::CrawlArchiveConfig;
use crawl_archive_config::EventSinkKind;
use crawl_archive_config::LoggingConfig;
use crawl_archive_core::ArchiveEventSink;
use crawl_archive_core::ObjectStore;
use crawl_archive_core::Orchestrator;
use crawl_archive_core::RunReport;
use crawl_archive_core::StagedUploader;
use crawl_archive_core::runtime::CrawlDiscovery;
use crawl_archive_core::runtime::FileEventSink;
use crawl_archive_core::runtime::NoopEventSink;
use crawl_archive_core::runtime::RemoteArchiveIndex;
use crawl_archive_core::runtime::ScrapyLogDirectory;
use crawl_archive_core::runtime::StderrEventSink;
use crawl_archive_store_s3::S3ObjectStore;
use crawl_archive_store_sqlite::SqliteStateCache;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "crawl-archive", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Archive or reject every unclassified crawl once.
    Process(ProcessCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for an archival run.
#[derive(Args, Debug)]
struct ProcessCommand {
    /// Optional config file path (defaults to crawl-archive.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Report decisions without uploading, deleting, or updating the cache.
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration.
    Validate(ConfigValidateCommand),
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to crawl-archive.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("crawl-archive {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Process(command) => command_process(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Process Command
// ============================================================================

/// Executes the `process` command.
fn command_process(command: &ProcessCommand) -> CliResult<ExitCode> {
    let config = CrawlArchiveConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let orchestrator = build_orchestrator(&config)?;
    let report = orchestrator
        .process(command.dry_run)
        .map_err(|err| CliError::new(format!("archival run aborted: {err}")))?;
    report_run(&report)?;
    if report.has_failures() { Ok(ExitCode::FAILURE) } else { Ok(ExitCode::SUCCESS) }
}

/// Wires configured collaborators into an orchestrator.
fn build_orchestrator(config: &CrawlArchiveConfig) -> CliResult<Orchestrator> {
    let events = build_event_sink(&config.logging)?;
    let store: Arc<dyn ObjectStore> = Arc::new(
        S3ObjectStore::new(&config.storage)
            .map_err(|err| CliError::new(format!("failed to open object store: {err}")))?,
    );
    let cache = SqliteStateCache::new(&config.sqlite_config())
        .map_err(|err| CliError::new(format!("failed to open state cache: {err}")))?;
    let mut uploader = StagedUploader::new(Arc::clone(&store), Arc::clone(&events));
    if let Some(work_dir) = &config.paths.work_directory {
        uploader = uploader.with_work_dir(work_dir);
    }
    Ok(Orchestrator::new(
        CrawlDiscovery::new(&config.paths.data_directory),
        Box::new(cache),
        Box::new(RemoteArchiveIndex::new(store)),
        Box::new(
            ScrapyLogDirectory::new(&config.paths.logs_directory).with_events(Arc::clone(&events)),
        ),
        uploader,
        events,
    ))
}

/// Builds the configured event sink.
fn build_event_sink(config: &LoggingConfig) -> CliResult<Arc<dyn ArchiveEventSink>> {
    match (config.sink, &config.path) {
        (EventSinkKind::Stderr, _) => Ok(Arc::new(StderrEventSink)),
        (EventSinkKind::None, _) => Ok(Arc::new(NoopEventSink)),
        (EventSinkKind::File, Some(path)) => {
            let sink = FileEventSink::new(path).map_err(|err| {
                CliError::new(format!("failed to open event log {}: {err}", path.display()))
            })?;
            Ok(Arc::new(sink))
        }
        (EventSinkKind::File, None) => {
            Err(CliError::new("logging.sink = \"file\" requires path".to_string()))
        }
    }
}

/// Writes the run totals to stdout and each failure to stderr.
fn report_run(report: &RunReport) -> CliResult<()> {
    for failure in &report.failures {
        write_stderr_line(&format!("failed {}: {}", failure.crawl_id, failure.error))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    write_stdout_line(&report.summary()).map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = CrawlArchiveConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Prints the top-level help text.
fn show_help() -> CliResult<()> {
    let mut stdout = std::io::stdout();
    Cli::command()
        .write_help(&mut stdout)
        .and_then(|()| writeln!(&mut stdout))
        .map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
