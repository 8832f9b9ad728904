//! CLI module for the dataprovider engine
//!
//! This module provides the command-line interface over JSON suite manifests.
//!
//! | Command            | Module        | Does                                      |
//! | ------------------ | ------------- | ----------------------------------------- |
//! | `check <manifest>` | `commands`    | validate every data-provider binding      |
//! | `list <manifest>`  | `commands`    | print the scheduled invocation names      |
//! | `run <manifest>`   | `test_runner` | dry-run every invocation, pytest-style    |
//!
//! ## Notes
//! - Arguments are parsed with clap derive.
//! - Commands hand back `CliResult<ExitCode>`; [`run`] is the single place that prints the error and exits.

// Command code reports errors, it never panics
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod test_runner;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use miette::{GraphicalReportHandler, GraphicalTheme};

// ============================================================================
// Errors and exit codes
// ============================================================================

/// Process exit status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// A command failure: the rendered text to print and the status to exit with.
#[derive(Debug)]
pub struct CliError {
    pub message: String,
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Exit with status 1.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Wrap an error that carries no diagnostic metadata.
    pub fn diagnostic_free(err: impl std::error::Error) -> Self {
        Self::failure(err.to_string())
    }

    /// Render a diagnostic through miette.
    pub fn diagnostic(diagnostic: impl miette::Diagnostic) -> Self {
        Self::failure(render_diagnostic(diagnostic))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub type CliResult<T> = Result<T, CliError>;

/// Wide enough that messages never wrap.
const RENDER_WIDTH: usize = 200;

/// Render any diagnostic (code, message and help) with miette's graphical handler, without colour.
pub fn render_diagnostic(diagnostic: impl miette::Diagnostic) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor()).with_width(RENDER_WIDTH);
    let mut out = String::new();
    match handler.render_report(&mut out, &diagnostic) {
        Ok(()) => out,
        Err(_) => diagnostic.to_string(),
    }
}

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Expand data-provider test suites and run their fixture lifecycles
#[derive(Parser, Debug)]
#[command(name = "dataprovider")]
#[command(version = VERSION)]
#[command(about = "Expand data-provider test suites and run their fixture lifecycles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate every data-provider binding in a manifest
    Check {
        /// Suite manifest (JSON)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
    },

    /// Print the scheduled invocations of a manifest
    List {
        /// Suite manifest (JSON)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
        /// Filter invocations by keyword
        #[arg(short = 'k', value_name = "EXPR")]
        filter: Option<String>,
    },

    /// Dry-run every invocation of a manifest (pytest-style)
    Run {
        /// Suite manifest (JSON)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
        /// Stop on first failure
        #[arg(short = 'x', long = "exitfirst")]
        stop_on_fail: bool,
        /// Filter invocations by keyword
        #[arg(short = 'k', value_name = "EXPR")]
        filter: Option<String>,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Parse the command line, dispatch, and exit with the command's status.
pub fn run() {
    let code = match execute(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            if !err.message.is_empty() {
                eprintln!("{}", err.message);
            }
            err.exit_code
        }
    };
    if code != ExitCode::SUCCESS {
        process::exit(code.0);
    }
}

fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Check { manifest } => commands::check_manifest(&manifest),
        Command::List { manifest, filter } => commands::list_manifest(&manifest, filter.as_deref()),
        Command::Run {
            manifest,
            verbose,
            stop_on_fail,
            filter,
        } => {
            let mut config = crate::runner::RunConfig::new()
                .with_verbose(verbose)
                .with_stop_on_fail(stop_on_fail);
            if let Some(keyword) = filter {
                config = config.with_filter(keyword);
            }
            test_runner::run_manifest(&manifest, config)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
