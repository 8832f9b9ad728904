//! Error taxonomy for validation, expansion, tracking and execution.
//!
//! - [`ConfigurationError`]: malformed data-provider bindings, collected in batch before anything runs.
//! - [`ExpansionError`]: a data provider could not produce rows; fatal for the run.
//! - [`TestFailure`]: per-invocation outcome of a body and its lifecycle hooks.
//! - [`TrackerError`], [`HostError`]: caller-contract violations. Inside a run they fail the affected invocation.
//! - [`RunError`]: what the runner façade hands back to its caller.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::model::TestId;
use crate::source::HookKind;

/// Error type for user-supplied providers, hooks and test bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// Configuration errors
// ============================================================================

/// One reason a data-provider declaration does not meet its capability contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    NotPublic,
    NotStatic,
    TakesParameters(usize),
    WrongReturnShape(String),
    WrongFieldType(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NotPublic => write!(f, "must be public"),
            Violation::NotStatic => write!(f, "must be static"),
            Violation::TakesParameters(n) => write!(f, "must take no parameters (takes {})", n),
            Violation::WrongReturnShape(shape) => write!(f, "must return rows of values (returns {})", shape),
            Violation::WrongFieldType(ty) => {
                write!(f, "must be declared as an extended data provider (declared as {})", ty)
            }
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// A malformed data-provider binding or test signature.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConfigurationError {
    #[error("No such data provider: {name} (used by `{test}`, looked up on `{location}`)")]
    #[diagnostic(
        code(dataprovider::config::no_such_provider),
        help("declare a data provider method or field with this name on the lookup type")
    )]
    NoSuchDataProvider {
        test: TestId,
        name: String,
        location: String,
    },

    #[error("The data provider method '{name}' is not valid: {}", join_violations(.violations))]
    #[diagnostic(
        code(dataprovider::config::invalid_method),
        help("a valid data provider method is public, static, takes no parameters and returns rows of values")
    )]
    InvalidProviderMethod {
        test: TestId,
        name: String,
        violations: Vec<Violation>,
    },

    #[error("The extended data provider '{name}' is not valid: {}", join_violations(.violations))]
    #[diagnostic(
        code(dataprovider::config::invalid_field),
        help("a valid extended data provider is a public, static field implementing the provider capability")
    )]
    InvalidExtendedProvider {
        test: TestId,
        name: String,
        violations: Vec<Violation>,
    },

    #[error("Method {test} should have no parameters (declares {parameter_count})")]
    #[diagnostic(
        code(dataprovider::config::test_signature),
        help("bind the test to a data provider or remove its parameters")
    )]
    InvalidTestSignature { test: TestId, parameter_count: usize },
}

impl ConfigurationError {
    /// The test whose binding is malformed.
    pub fn test(&self) -> &TestId {
        match self {
            ConfigurationError::NoSuchDataProvider { test, .. }
            | ConfigurationError::InvalidProviderMethod { test, .. }
            | ConfigurationError::InvalidExtendedProvider { test, .. }
            | ConfigurationError::InvalidTestSignature { test, .. } => test,
        }
    }
}

// ============================================================================
// Expansion errors
// ============================================================================

/// A data provider failed to produce usable rows. Never recovered from.
#[derive(Debug, Error, Diagnostic)]
pub enum ExpansionError {
    #[error("Exception while exploding test method `{test}` using data provider '{provider}': {source}")]
    #[diagnostic(code(dataprovider::expand::provider_failed))]
    ProviderFailed {
        test: TestId,
        provider: String,
        source: BoxError,
    },

    #[error("Data provider '{provider}' must not return null (used by `{test}`)")]
    #[diagnostic(code(dataprovider::expand::null_result))]
    NullResult { test: TestId, provider: String },

    #[error("Data provider '{provider}' must not return an empty set of rows (used by `{test}`)")]
    #[diagnostic(
        code(dataprovider::expand::no_rows),
        help("a data provider must produce at least one row")
    )]
    NoRows { test: TestId, provider: String },

    #[error("Data provider '{provider}' produced an empty parameter row at index {index} (used by `{test}`)")]
    #[diagnostic(code(dataprovider::expand::empty_row))]
    EmptyRow {
        test: TestId,
        provider: String,
        index: usize,
    },
}

impl ExpansionError {
    pub fn provider(&self) -> &str {
        match self {
            ExpansionError::ProviderFailed { provider, .. }
            | ExpansionError::NullResult { provider, .. }
            | ExpansionError::NoRows { provider, .. }
            | ExpansionError::EmptyRow { provider, .. } => provider,
        }
    }
}

// ============================================================================
// Invocation failures
// ============================================================================

/// Failure of one executed invocation.
#[derive(Debug, Error)]
pub enum TestFailure {
    /// The test body returned an error.
    #[error("{0}")]
    Failed(BoxError),

    /// The test body panicked.
    #[error("test panicked: {0}")]
    Panicked(String),

    #[error("{hook} hook of data provider '{provider}' failed: {source}")]
    Hook {
        hook: HookKind,
        provider: String,
        source: BoxError,
    },

    /// Several causes; body failure first, then hook failures in firing order.
    #[error("{}", render_causes(.0))]
    Multiple(Vec<TestFailure>),
}

impl TestFailure {
    pub fn failed(message: impl Into<String>) -> Self {
        TestFailure::Failed(message.into().into())
    }

    /// Flattened list of causes (a single failure is its own cause).
    pub fn causes(&self) -> Vec<&TestFailure> {
        match self {
            TestFailure::Multiple(causes) => causes.iter().flat_map(TestFailure::causes).collect(),
            other => vec![other],
        }
    }
}

fn render_causes(causes: &[TestFailure]) -> String {
    let mut out = format!("{} failure(s):", causes.len());
    for (i, cause) in causes.iter().enumerate() {
        out.push_str(&format!("\n  {}) {}", i + 1, cause));
    }
    out
}

// ============================================================================
// Contract violations
// ============================================================================

/// Misuse of the group tracker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("no scheduled invocations recorded for `{0}`")]
    UnknownGroup(TestId),

    #[error("group `{0}` was queried before its first invocation advanced")]
    NotAdvanced(TestId),

    #[error("group `{test}` advanced past its {scheduled} scheduled invocation(s)")]
    Overrun { test: TestId, scheduled: usize },
}

/// Failure reported by a [`TestHost`](crate::host::TestHost).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("unknown test type `{0}`")]
    UnknownTestType(String),

    #[error("no test body registered for `{0}`")]
    MissingBody(TestId),
}

// ============================================================================
// Runner errors
// ============================================================================

/// Errors surfaced by the runner façade before or between invocations.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{} configuration error(s) in `{test_type}`", .errors.len())]
    Initialization {
        test_type: String,
        errors: Vec<ConfigurationError>,
    },

    #[error(transparent)]
    Expansion(#[from] ExpansionError),

    #[error("No tests remain after applying filter: {filter}")]
    NoTestsRemain { filter: String },
}
