//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::Path;

use crate::errors::RunError;
use crate::host::KeywordFilter;
use crate::manifest::load_registry;
use crate::registry::SuiteRegistry;
use crate::runner::DataProviderRunner;

use super::{CliError, CliResult, ExitCode, render_diagnostic};

/// Load a manifest into an in-memory host, rendering load errors as diagnostics.
pub fn read_manifest(path: &Path) -> CliResult<SuiteRegistry> {
    load_registry(path).map_err(CliError::diagnostic)
}

// ============================================================================
// check
// ============================================================================

/// Validate every type of a manifest and try to expand the valid ones.
///
/// Prints one diagnostic per problem; fails if there is any.
pub fn check_manifest(path: &Path) -> CliResult<ExitCode> {
    let registry = read_manifest(path)?;
    let report = check_registry(&registry)?;
    for line in &report.lines {
        println!("{}", line);
    }
    for problem in &report.problems {
        eprintln!("{}", problem);
    }
    if report.problems.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Err(CliError::failure(format!("{} problem(s) found", report.problems.len())))
    }
}

/// Result of checking a host: one status line per type and every rendered problem.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub lines: Vec<String>,
    pub problems: Vec<String>,
}

/// Check every type of a host without printing.
pub fn check_registry(registry: &SuiteRegistry) -> CliResult<CheckReport> {
    let mut report = CheckReport::default();
    for test_type in registry.type_names() {
        let mut runner = DataProviderRunner::new(registry, test_type).map_err(CliError::diagnostic_free)?;
        let errors = runner.validate_configuration();
        if !errors.is_empty() {
            report.lines.push(format!("{}: {} configuration error(s)", test_type, errors.len()));
            report.problems.extend(errors.into_iter().map(render_diagnostic));
            continue;
        }
        match runner.compute_scheduled_invocations() {
            Ok(scheduled) => report.lines.push(format!("{}: ok, {} invocation(s)", test_type, scheduled.len())),
            Err(err) => {
                report.lines.push(format!("{}: expansion failed", test_type));
                report.problems.push(render_diagnostic(err));
            }
        }
    }
    Ok(report)
}

// ============================================================================
// list
// ============================================================================

/// Print the scheduled invocations of every type, one `Type::name` per line.
pub fn list_manifest(path: &Path, filter: Option<&str>) -> CliResult<ExitCode> {
    let registry = read_manifest(path)?;
    let names = scheduled_names(&registry, filter)?;
    if names.is_empty() {
        eprintln!("No tests collected");
        return Ok(ExitCode::SUCCESS);
    }
    for name in &names {
        println!("{}", name);
    }
    Ok(ExitCode::SUCCESS)
}

/// Scheduled `Type::name` entries for every type of a host, optionally narrowed by keyword.
///
/// Types with configuration errors are not listed; `check` reports them.
pub fn scheduled_names(registry: &SuiteRegistry, filter: Option<&str>) -> CliResult<Vec<String>> {
    let mut names = Vec::new();
    for test_type in registry.type_names() {
        let mut runner = DataProviderRunner::new(registry, test_type).map_err(CliError::diagnostic_free)?;
        if !runner.validate_configuration().is_empty() {
            tracing::warn!(test_type, "skipping type with configuration errors");
            continue;
        }
        if let Some(keyword) = filter {
            match runner.filter(&KeywordFilter(keyword.to_string())) {
                Ok(()) => {}
                Err(RunError::NoTestsRemain { .. }) => continue,
                Err(RunError::Expansion(err)) => return Err(CliError::diagnostic(err)),
                Err(err) => return Err(CliError::failure(err.to_string())),
            }
        }
        let scheduled = runner.compute_scheduled_invocations().map_err(CliError::diagnostic)?;
        names.extend(scheduled.iter().map(|invocation| invocation.description().qualified()));
    }
    Ok(names)
}
