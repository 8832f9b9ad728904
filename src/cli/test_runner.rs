//! Manifest dry runs (pytest-style)
//!
//! ## RunListener
//!
//! The runner reports through the [`RunListener`] trait, which separates reporting from execution. This module
//! provides the console implementation; other formats (JSON, TAP, recording in tests) implement the trait.

use std::path::Path;

use crate::errors::RunError;
use crate::expand::Invocation;
use crate::registry::SuiteRegistry;
use crate::runner::{DataProviderRunner, InvocationResult, RunConfig, RunListener, RunSummary};

use super::commands::read_manifest;
use super::{CliError, CliResult, ExitCode, render_diagnostic};

// ============================================================================
// Console Reporter
// ============================================================================

/// Default console reporter (pytest-style)
///
/// Accumulates the summaries of every runner it is handed so a whole manifest ends with one summary line.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
    pub totals: RunSummary,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            totals: RunSummary::default(),
        }
    }

    /// Print the closing summary line for everything reported so far.
    pub fn finish(&self) {
        if !self.verbose {
            eprintln!();
        }
        eprintln!();
        eprintln!("{}", summary_line(&self.totals));
    }
}

impl RunListener for ConsoleReporter {
    fn on_invocation_start(&mut self, invocation: &Invocation) {
        if self.verbose {
            eprint!("{} ... ", invocation.description().qualified());
        }
    }

    fn on_invocation_complete(&mut self, invocation: &Invocation, result: &InvocationResult) {
        let status = match result {
            InvocationResult::Passed(d) => {
                if self.verbose {
                    format!("\x1b[32mPASSED\x1b[0m ({:.0}ms)", d.as_millis())
                } else {
                    "\x1b[32m.\x1b[0m".to_string()
                }
            }
            InvocationResult::Failed(d, _) => {
                if self.verbose {
                    format!("\x1b[31mFAILED\x1b[0m ({:.0}ms)", d.as_millis())
                } else {
                    "\x1b[31mF\x1b[0m".to_string()
                }
            }
        };

        if self.verbose {
            eprintln!("{}", status);
        } else {
            eprint!("{}", status);
        }

        // Print failure details
        if let InvocationResult::Failed(_, failure) = result {
            eprintln!("\n\x1b[31m{}\x1b[0m", invocation.description().qualified());
            eprintln!("{}", failure);
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        self.totals.total += summary.total;
        self.totals.passed += summary.passed;
        self.totals.failed += summary.failed;
        self.totals.not_run += summary.not_run;
        self.totals.failures.extend(summary.failures.iter().cloned());
        self.totals.duration += summary.duration;
    }
}

/// `====== 3 passed, 1 failed in 0.01s ======`
pub fn summary_line(summary: &RunSummary) -> String {
    let mut parts = Vec::new();
    if summary.passed > 0 {
        parts.push(format!("\x1b[32m{} passed\x1b[0m", summary.passed));
    }
    if summary.failed > 0 {
        parts.push(format!("\x1b[31m{} failed\x1b[0m", summary.failed));
    }
    if summary.not_run > 0 {
        parts.push(format!("\x1b[33m{} not run\x1b[0m", summary.not_run));
    }
    if parts.is_empty() {
        parts.push("no tests ran".to_string());
    }
    format!(
        "====== {} in {:.2}s ======",
        parts.join(", "),
        summary.duration.as_secs_f64()
    )
}

// ============================================================================
// run
// ============================================================================

/// Run every type of a manifest and print a pytest-style report.
pub fn run_manifest(path: &Path, config: RunConfig) -> CliResult<ExitCode> {
    let registry = read_manifest(path)?;
    let mut reporter = ConsoleReporter::new(config.verbose);

    println!("\x1b[1m=================== test session starts ===================\x1b[0m");
    let ran = run_registry(&registry, &config, &mut reporter)?;
    if ran == 0 {
        eprintln!("No tests collected");
        return Ok(ExitCode::SUCCESS); // "no tests collected" is not a failure
    }
    reporter.finish();

    if reporter.totals.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Run every type of a host through one listener.
///
/// ## Returns
/// - The number of types that had invocations to run.
///
/// ## Errors
/// - Configuration errors of any type, rendered as diagnostics, before anything runs.
/// - The first expansion or host error.
pub fn run_registry(
    registry: &SuiteRegistry,
    config: &RunConfig,
    listener: &mut ConsoleReporter,
) -> CliResult<usize> {
    let mut problems = Vec::new();
    for test_type in registry.type_names() {
        let runner = DataProviderRunner::new(registry, test_type).map_err(CliError::diagnostic_free)?;
        problems.extend(runner.validate_configuration().into_iter().map(render_diagnostic));
    }
    if !problems.is_empty() {
        return Err(CliError::failure(problems.join("\n")));
    }

    let mut ran = 0;
    for test_type in registry.type_names() {
        let mut runner = DataProviderRunner::new(registry, test_type)
            .map_err(CliError::diagnostic_free)?
            .with_config(config.clone());
        match runner.run(&mut *listener) {
            Ok(summary) => {
                ran += 1;
                if config.stop_on_fail && !summary.is_success() {
                    break;
                }
            }
            Err(RunError::NoTestsRemain { .. }) => {
                tracing::debug!(test_type, "no invocations selected");
            }
            Err(RunError::Expansion(err)) => return Err(CliError::diagnostic(err)),
            Err(err) => return Err(CliError::failure(err.to_string())),
        }
    }
    Ok(ran)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;

    fn registry(json: &str) -> SuiteRegistry {
        Manifest::from_json(json).unwrap().into_registry().unwrap()
    }

    #[test]
    fn test_hook_failures_fail_the_run() {
        let registry = registry(
            r#"{"types": [{
                "name": "Db",
                "providers": [{"name": "conn", "kind": "field", "rows": [[1], [2]], "failing_hooks": ["after_all"]}],
                "tests": [{"name": "query", "uses": "conn"}]
            }]}"#,
        );
        let mut reporter = ConsoleReporter::new(false);
        let ran = run_registry(&registry, &RunConfig::default(), &mut reporter).unwrap();
        assert_eq!(ran, 1);
        assert_eq!(reporter.totals.passed, 1);
        assert_eq!(reporter.totals.failed, 1);
        assert_eq!(reporter.totals.failures[0].0, "query[2: 2]");
    }

    #[test]
    fn test_configuration_errors_block_the_run() {
        let registry = registry(
            r#"{"types": [{"name": "T", "tests": [{"name": "t", "uses": "missing"}]}]}"#,
        );
        let mut reporter = ConsoleReporter::new(false);
        let err = run_registry(&registry, &RunConfig::default(), &mut reporter).unwrap_err();
        assert!(err.message.contains("No such data provider: missing"));
        assert_eq!(reporter.totals.total, 0);
    }

    #[test]
    fn test_keyword_selecting_nothing_runs_nothing() {
        let registry = registry(r#"{"types": [{"name": "T", "tests": [{"name": "t"}]}]}"#);
        let mut reporter = ConsoleReporter::new(false);
        let config = RunConfig::new().with_filter("zzz");
        assert_eq!(run_registry(&registry, &config, &mut reporter).unwrap(), 0);
    }

    #[test]
    fn test_summary_line_lists_nonzero_counts() {
        let summary = RunSummary {
            passed: 3,
            failed: 1,
            ..RunSummary::default()
        };
        let line = summary_line(&summary);
        assert!(line.starts_with("====== "));
        assert!(line.contains("3 passed"));
        assert!(line.contains("1 failed"));
        assert!(!line.contains("not run"));
        assert!(line.ends_with("in 0.00s ======"));
    }
}
