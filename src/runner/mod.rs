//! Runner façade
//!
//! [`DataProviderRunner`] sequences everything for one test type:
//!
//! 1. discover the type's test definitions through the [`TestHost`];
//! 2. validate every data-provider binding, reporting all problems at once;
//! 3. explode the tests into the scheduled invocation list (computed once, then cached);
//! 4. optionally filter the list and rebuild the group counters from what survives;
//! 5. run each invocation, firing lifecycle hooks around exploded ones.
//!
//! ## Notes
//! - Configuration errors block the whole type before anything runs. Expansion errors block the run.
//!   Body and hook failures are reported per invocation and never affect siblings.
//! - Reporting goes through [`RunListener`]; the console rendering lives in the CLI.

pub mod config;

use std::time::{Duration, Instant};

pub use config::RunConfig;

use crate::errors::{ConfigurationError, ExpansionError, HostError, RunError, TestFailure};
use crate::expand::{Expander, Invocation};
use crate::host::{Filter, KeywordFilter, Statement, TestHost};
use crate::lifecycle::{LifecycleStatement, tear_down_open_groups};
use crate::model::TestDefinition;
use crate::source::validate::validate_bindings;
use crate::tracker::GroupTracker;

// ============================================================================
// Run Listener Trait
// ============================================================================

/// Outcome of one executed invocation.
#[derive(Debug)]
pub enum InvocationResult {
    Passed(Duration),
    Failed(Duration, TestFailure),
}

impl InvocationResult {
    pub fn is_passed(&self) -> bool {
        matches!(self, InvocationResult::Passed(_))
    }

    pub fn duration(&self) -> Duration {
        match self {
            InvocationResult::Passed(d) | InvocationResult::Failed(d, _) => *d,
        }
    }
}

/// Receives progress of a run.
///
/// Implement this trait to customize run output (console, JSON, recording in tests).
pub trait RunListener {
    /// Called once the scheduled list is known
    fn on_collection_complete(&mut self, _invocation_count: usize) {}

    /// Called before an invocation runs
    fn on_invocation_start(&mut self, invocation: &Invocation);

    /// Called when an invocation completes
    fn on_invocation_complete(&mut self, invocation: &Invocation, result: &InvocationResult);

    /// Called when all invocations have completed
    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// A listener that ignores everything.
#[derive(Debug, Default)]
pub struct SilentListener;

impl RunListener for SilentListener {
    fn on_invocation_start(&mut self, _invocation: &Invocation) {}

    fn on_invocation_complete(&mut self, _invocation: &Invocation, _result: &InvocationResult) {}

    fn on_run_complete(&mut self, _summary: &RunSummary) {}
}

/// Summary of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// `(display name, rendered failure)` per failed invocation, in run order
    pub failures: Vec<(String, String)>,
    /// Invocations never started because the run stopped at a failure
    pub not_run: usize,
    pub duration: Duration,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Validates, expands, filters and runs the tests of one type.
pub struct DataProviderRunner<H: TestHost> {
    host: H,
    test_type: String,
    config: RunConfig,
    tests: Vec<TestDefinition>,
    scheduled: Option<Vec<Invocation>>,
    tracker: GroupTracker,
}

impl<H: TestHost> DataProviderRunner<H> {
    /// Create a runner for one test type.
    ///
    /// ## Errors
    /// - [`HostError::UnknownTestType`] if the host does not know `test_type`.
    pub fn new(host: H, test_type: impl Into<String>) -> Result<Self, HostError> {
        let test_type = test_type.into();
        let tests = host.discover_candidate_tests(&test_type)?;
        Ok(Self {
            host,
            test_type,
            config: RunConfig::default(),
            tests,
            scheduled: None,
            tracker: GroupTracker::new(),
        })
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn test_type(&self) -> &str {
        &self.test_type
    }

    /// The discovered test definitions, in declaration order.
    pub fn tests(&self) -> &[TestDefinition] {
        &self.tests
    }

    pub fn tracker(&self) -> &GroupTracker {
        &self.tracker
    }

    /// Every malformed binding and test signature of the type, in declaration order.
    pub fn validate_configuration(&self) -> Vec<ConfigurationError> {
        validate_bindings(&self.host, &self.tests)
    }

    /// The scheduled invocation list.
    ///
    /// Computed on first call and cached: later calls return the same list without invoking any data provider
    /// again, until [`filter`](Self::filter) replaces it.
    #[tracing::instrument(skip_all, fields(test_type = %self.test_type))]
    pub fn compute_scheduled_invocations(&mut self) -> Result<&[Invocation], ExpansionError> {
        let scheduled = match self.scheduled.take() {
            Some(scheduled) => scheduled,
            None => {
                let scheduled = Expander::new(&self.host).explode_all(&self.tests)?;
                tracing::debug!(scheduled = scheduled.len(), "computed scheduled invocations");
                self.tracker.rebuild(&scheduled);
                scheduled
            }
        };
        Ok(self.scheduled.insert(scheduled).as_slice())
    }

    /// Keep only the invocations the filter selects, then rebuild the group counters from the survivors.
    ///
    /// ## Errors
    /// - [`RunError::Expansion`] if the list had to be computed and a provider failed.
    /// - [`RunError::NoTestsRemain`] if nothing survives; the scheduled list is left empty.
    #[tracing::instrument(skip_all, fields(test_type = %self.test_type, filter = %filter.describe()))]
    pub fn filter(&mut self, filter: &dyn Filter) -> Result<(), RunError> {
        let kept: Vec<Invocation> = self
            .compute_scheduled_invocations()?
            .iter()
            .filter(|invocation| filter.should_run(&invocation.description()))
            .cloned()
            .collect();
        self.tracker.rebuild(&kept);
        let remaining = kept.len();
        self.scheduled = Some(kept);
        if remaining == 0 {
            return Err(RunError::NoTestsRemain {
                filter: filter.describe(),
            });
        }
        tracing::debug!(remaining, "filtered scheduled invocations");
        Ok(())
    }

    /// Run every scheduled invocation.
    ///
    /// ## Returns
    /// - The run summary. Failing invocations do not make this an error.
    ///
    /// ## Errors
    /// - [`RunError::Initialization`] with every configuration error, before anything runs.
    /// - [`RunError::Expansion`] if a data provider fails.
    /// - [`RunError::NoTestsRemain`] if the configured keyword selects nothing.
    #[tracing::instrument(skip_all, fields(test_type = %self.test_type))]
    pub fn run(&mut self, listener: &mut dyn RunListener) -> Result<RunSummary, RunError> {
        let errors = self.validate_configuration();
        if !errors.is_empty() {
            return Err(RunError::Initialization {
                test_type: self.test_type.clone(),
                errors,
            });
        }

        if let Some(keyword) = self.config.filter.clone() {
            self.filter(&KeywordFilter(keyword))?;
        }

        let scheduled = self.compute_scheduled_invocations()?.to_vec();
        // A second run starts every group from the top.
        self.tracker.rebuild(&scheduled);
        listener.on_collection_complete(scheduled.len());

        let start_time = Instant::now();
        let mut summary = RunSummary {
            total: scheduled.len(),
            ..RunSummary::default()
        };

        for (i, invocation) in scheduled.iter().enumerate() {
            listener.on_invocation_start(invocation);
            let result = self.execute(invocation);
            listener.on_invocation_complete(invocation, &result);

            match result {
                InvocationResult::Passed(_) => summary.passed += 1,
                InvocationResult::Failed(_, failure) => {
                    summary.failed += 1;
                    summary
                        .failures
                        .push((invocation.display_name().to_string(), failure.to_string()));
                    if self.config.stop_on_fail {
                        summary.not_run = scheduled.len() - i - 1;
                        self.tear_down(&scheduled, &mut summary);
                        break;
                    }
                }
            }
        }

        summary.duration = start_time.elapsed();
        tracing::info!(
            passed = summary.passed,
            failed = summary.failed,
            not_run = summary.not_run,
            "run complete"
        );
        listener.on_run_complete(&summary);
        Ok(summary)
    }

    /// Host failures become the invocation's failure, so the rest of its group still runs and tears down.
    fn execute(&mut self, invocation: &Invocation) -> InvocationResult {
        let inner: Box<dyn Statement> = match self.wrap(invocation) {
            Ok(inner) => inner,
            Err(err) => {
                tracing::warn!(test = %invocation.test_id(), error = %err, "host could not wrap invocation");
                Box::new(move || -> Result<(), TestFailure> { Err(TestFailure::Failed(Box::new(err.clone()))) })
            }
        };

        let start = Instant::now();
        let outcome = match invocation {
            Invocation::Plain(_) => run_statement(inner),
            Invocation::Exploded(descriptor) => {
                LifecycleStatement::new(descriptor, inner, &mut self.tracker).evaluate()
            }
        };
        let duration = start.elapsed();

        match outcome {
            Ok(()) => InvocationResult::Passed(duration),
            Err(failure) => InvocationResult::Failed(duration, failure),
        }
    }

    fn wrap(&self, invocation: &Invocation) -> Result<Box<dyn Statement>, HostError> {
        let test = self
            .tests
            .iter()
            .find(|test| test.id == *invocation.test_id())
            .ok_or_else(|| HostError::MissingBody(invocation.test_id().clone()))?;
        self.host.wrap_invocation(test, invocation.row())
    }

    /// Close every group a stopped run left open, recording failing teardown hooks in the summary.
    fn tear_down(&mut self, scheduled: &[Invocation], summary: &mut RunSummary) {
        for failure in tear_down_open_groups(scheduled, &mut self.tracker) {
            let name = match &failure {
                TestFailure::Hook { provider, .. } => format!("{} (teardown)", provider),
                _ => "teardown".to_string(),
            };
            summary.failures.push((name, failure.to_string()));
        }
    }
}

fn run_statement(mut statement: Box<dyn Statement>) -> Result<(), TestFailure> {
    statement.evaluate()
}
