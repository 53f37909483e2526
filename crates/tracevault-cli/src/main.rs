// crates/tracevault-cli/src/main.rs
// ============================================================================
// Module: Tracevault CLI Entry Point
// Description: Command dispatcher for trace store inspection and maintenance.
// Purpose: Provide operator tooling for version checks, migration stepping,
//          retention trimming, and store queries.
// Dependencies: clap, tracevault-core, tracevault-store-sqlite, serde_json,
//               time, toml.
// ============================================================================

//! ## Overview
//! The Tracevault CLI inspects and maintains trace store files. It reports
//! schema versions and compatibility, walks stores up or down one migration
//! step at a time, trims retained entries, and lists recorded groups and
//! traced applications. No command migrates implicitly; `upgrade` and
//! `downgrade` are the only operations that change a store's version.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracevault_core::Compatibility;
use tracevault_core::StoreError;
use tracevault_core::Timestamp;
use tracevault_core::TraceReader;
use tracevault_core::TracedApplicationInfo;
use tracevault_store_sqlite::MIN_SCHEMA_VERSION;
use tracevault_store_sqlite::Migrator;
use tracevault_store_sqlite::Store;
use tracevault_store_sqlite::StoreConfig;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a store configuration file.
const MAX_CONFIG_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "tracevault", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Optional store configuration file (TOML).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Report a store's schema version and compatibility.
    Check(CheckCommand),
    /// Summarize a store: version, entry count, traced applications.
    Info(InfoCommand),
    /// Upgrade a store one migration step at a time until compatible.
    Upgrade(UpgradeCommand),
    /// Downgrade a store one migration step at a time to a target version.
    Downgrade(DowngradeCommand),
    /// Trim a store down to its newest entries.
    Trim(TrimCommand),
    /// List distinct trace point group names.
    Groups(GroupsCommand),
    /// List traced application instances.
    Applications(ApplicationsCommand),
}

/// Arguments for `check`.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Path to the trace store file.
    #[arg(value_name = "STORE")]
    store: PathBuf,
}

/// Arguments for `info`.
#[derive(Args, Debug)]
struct InfoCommand {
    /// Path to the trace store file.
    #[arg(value_name = "STORE")]
    store: PathBuf,
    /// Output format for the summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Arguments for `upgrade`.
#[derive(Args, Debug)]
struct UpgradeCommand {
    /// Path to the trace store file.
    #[arg(value_name = "STORE")]
    store: PathBuf,
}

/// Arguments for `downgrade`.
#[derive(Args, Debug)]
struct DowngradeCommand {
    /// Path to the trace store file.
    #[arg(value_name = "STORE")]
    store: PathBuf,
    /// Target schema version to reach.
    #[arg(long, value_name = "VERSION")]
    to: i32,
}

/// Arguments for `trim`.
#[derive(Args, Debug)]
struct TrimCommand {
    /// Path to the trace store file.
    #[arg(value_name = "STORE")]
    store: PathBuf,
    /// Number of newest entries to keep.
    #[arg(long, value_name = "COUNT")]
    keep: u64,
}

/// Arguments for `groups`.
#[derive(Args, Debug)]
struct GroupsCommand {
    /// Path to the trace store file.
    #[arg(value_name = "STORE")]
    store: PathBuf,
}

/// Arguments for `applications`.
#[derive(Args, Debug)]
struct ApplicationsCommand {
    /// Path to the trace store file.
    #[arg(value_name = "STORE")]
    store: PathBuf,
}

/// Output formats for store summaries.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output on a single line.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for operator-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a rendered message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Maps store open failures into CLI errors.
fn open_failed(error: StoreError) -> CliError {
    CliError::new(format!("cannot open store: {error}"))
}

/// Maps store query failures into CLI errors.
fn query_failed(error: StoreError) -> CliError {
    CliError::new(format!("store query failed: {error}"))
}

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
        write_stdout_line(&format!("tracevault {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let config = load_store_config(cli.config.as_deref())?;
    match command {
        Commands::Check(command) => command_check(&command, config),
        Commands::Info(command) => command_info(&command, config),
        Commands::Upgrade(command) => command_upgrade(&command, config),
        Commands::Downgrade(command) => command_downgrade(&command, config),
        Commands::Trim(command) => command_trim(&command, config),
        Commands::Groups(command) => command_groups(&command, config),
        Commands::Applications(command) => command_applications(&command, config),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Store Commands
// ============================================================================

/// Executes the `check` command.
fn command_check(command: &CheckCommand, config: StoreConfig) -> CliResult<ExitCode> {
    let store = Store::open_any_version_with(&command.store, config).map_err(open_failed)?;
    let version = store.current_version().map_err(query_failed)?;
    let compatibility = store.check_compatibility().map_err(query_failed)?;

    write_stdout_line(&format!("store version: {version}"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line(&format!("status: {}", describe_compatibility(&compatibility)))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;

    if compatibility.is_compatible() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Executes the `info` command.
fn command_info(command: &InfoCommand, config: StoreConfig) -> CliResult<ExitCode> {
    let store = Store::open_any_version_with(&command.store, config).map_err(open_failed)?;
    let version = store.current_version().map_err(query_failed)?;
    let entry_count = store.entry_count().map_err(query_failed)?;
    let applications = store.traced_applications().map_err(query_failed)?;

    match command.format {
        OutputFormat::Text => {
            write_stdout_line(&format!("version: {version}"))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            write_stdout_line(&format!("entries: {entry_count}"))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            write_stdout_line("applications:")
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            for info in &applications {
                write_stdout_line(&format!("  {}", render_application(info)))
                    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            }
        }
        OutputFormat::Json => {
            let payload = json!({
                "version": version,
                "entry_count": entry_count,
                "applications": applications,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `upgrade` command.
fn command_upgrade(command: &UpgradeCommand, config: StoreConfig) -> CliResult<ExitCode> {
    let mut store = Store::open_any_version_with(&command.store, config).map_err(open_failed)?;
    let migrator = Migrator::new();
    loop {
        match store.check_compatibility().map_err(query_failed)? {
            Compatibility::Compatible => break,
            Compatibility::NeedsUpgrade {
                ..
            } => {
                let reached = migrator
                    .upgrade(&mut store)
                    .map_err(|err| CliError::new(format!("upgrade failed: {err}")))?;
                write_stdout_line(&format!("upgraded to version {reached}"))
                    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            }
            Compatibility::NeedsDowngrade {
                detail,
            }
            | Compatibility::Incompatible {
                detail,
            } => {
                return Err(CliError::new(format!("cannot upgrade: {detail}")));
            }
        }
    }
    let version = store.current_version().map_err(query_failed)?;
    write_stdout_line(&format!("store is at version {version} and compatible"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `downgrade` command.
fn command_downgrade(command: &DowngradeCommand, config: StoreConfig) -> CliResult<ExitCode> {
    let target = command.to;
    if target < MIN_SCHEMA_VERSION {
        return Err(CliError::new(format!(
            "downgrade target {target} is below the oldest known version {MIN_SCHEMA_VERSION}"
        )));
    }

    let mut store = Store::open_any_version_with(&command.store, config).map_err(open_failed)?;
    let current = store.current_version().map_err(query_failed)?;
    if target > current {
        return Err(CliError::new(format!(
            "store is at version {current}; downgrade target {target} must not be higher"
        )));
    }

    let migrator = Migrator::new();
    while store.current_version().map_err(query_failed)? > target {
        let reached = migrator
            .downgrade(&mut store)
            .map_err(|err| CliError::new(format!("downgrade failed: {err}")))?;
        write_stdout_line(&format!("downgraded to version {reached}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    write_stdout_line(&format!("store is at version {target}"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `trim` command.
fn command_trim(command: &TrimCommand, config: StoreConfig) -> CliResult<ExitCode> {
    let mut store = Store::open_with(&command.store, config).map_err(open_failed)?;
    let removed = store
        .trim_to(command.keep)
        .map_err(|err| CliError::new(format!("trim failed: {err}")))?;
    write_stdout_line(&format!("removed {removed} entries"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `groups` command.
fn command_groups(command: &GroupsCommand, config: StoreConfig) -> CliResult<ExitCode> {
    let store = Store::open_with(&command.store, config).map_err(open_failed)?;
    let groups = store.seen_group_ids().map_err(query_failed)?;
    for group in &groups {
        write_stdout_line(group).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `applications` command.
fn command_applications(command: &ApplicationsCommand, config: StoreConfig) -> CliResult<ExitCode> {
    let store = Store::open_with(&command.store, config).map_err(open_failed)?;
    let applications = store.traced_applications().map_err(query_failed)?;
    for info in &applications {
        write_stdout_line(&render_application(info))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Configuration Helpers
// ============================================================================

/// Loads the store configuration from an optional TOML file.
fn load_store_config(path: Option<&Path>) -> CliResult<StoreConfig> {
    let Some(path) = path else {
        return Ok(StoreConfig::default());
    };
    let bytes = read_file_with_limit(path, MAX_CONFIG_BYTES).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("cannot read config file {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "config file {} is too large ({size} bytes, limit {limit})",
            path.display()
        )),
    })?;
    let text = String::from_utf8(bytes).map_err(|err| {
        CliError::new(format!("config file {} is not UTF-8: {err}", path.display()))
    })?;
    toml::from_str(&text)
        .map_err(|err| CliError::new(format!("config file {} is invalid: {err}", path.display())))
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_file_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Rendering Helpers
// ============================================================================

/// Renders a compatibility classification as a status line.
fn describe_compatibility(compatibility: &Compatibility) -> String {
    match compatibility {
        Compatibility::Compatible => "compatible".to_string(),
        Compatibility::NeedsUpgrade {
            detail,
        } => format!("needs upgrade: {detail}"),
        Compatibility::NeedsDowngrade {
            detail,
        } => format!("needs downgrade: {detail}"),
        Compatibility::Incompatible {
            detail,
        } => format!("incompatible: {detail}"),
    }
}

/// Renders a unix-millisecond timestamp as RFC 3339 text.
fn render_timestamp(timestamp: Timestamp) -> String {
    let millis = timestamp.unix_millis();
    let nanos = i128::from(millis) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|moment| moment.format(&Rfc3339).ok())
        .unwrap_or_else(|| format!("{millis} ms"))
}

/// Renders one traced application instance as a single line.
fn render_application(info: &TracedApplicationInfo) -> String {
    let started = render_timestamp(info.start_time);
    match info.stop_time {
        Some(stop) => {
            format!(
                "{} (pid {}) started {started} stopped {}",
                info.name,
                info.pid,
                render_timestamp(stop)
            )
        }
        None => format!("{} (pid {}) started {started} running", info.name, info.pid),
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Writes a JSON value to stdout on a single line.
fn write_json_line(value: &Value) -> CliResult<()> {
    let rendered = serde_json::to_string(value)
        .map_err(|err| CliError::new(format!("cannot render JSON output: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Formats an output failure message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("cannot write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
