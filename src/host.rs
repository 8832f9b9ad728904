//! Host boundary interfaces
//!
//! This module defines the trait-based seams between the engine and the test runner that hosts it:
//! - Test discovery (which test definitions a type declares)
//! - Data-provider resolution (which provider declarations a type exposes, in declaration order)
//! - Invocation wrapping (turn a test plus an optional row into a runnable statement)
//! - Filtering (which scheduled invocations survive a selection request)
//!
//! The engine never discovers, reflects or calls test code itself. [`SuiteRegistry`](crate::registry::SuiteRegistry)
//! is the in-memory implementation used by Rust callers, the CLI and the tests.

use dataprovider_core::ParameterRow;

use crate::errors::{HostError, TestFailure};
use crate::model::TestDefinition;
use crate::source::DataSourceCandidate;

// ============================================================================
// Test Host Interface
// ============================================================================

/// The collaborator that owns test definitions and knows how to run them.
pub trait TestHost {
    /// Enumerate the test definitions of a type, in declaration order.
    fn discover_candidate_tests(&self, test_type: &str) -> Result<Vec<TestDefinition>, HostError>;

    /// Enumerate the data-provider declarations of a type, in declaration order.
    /// Unknown types have no declarations.
    fn resolve_data_sources(&self, location: &str) -> Vec<DataSourceCandidate>;

    /// Produce a runnable statement for one invocation. `row` is `None` for unparameterized tests.
    fn wrap_invocation(
        &self,
        test: &TestDefinition,
        row: Option<&ParameterRow>,
    ) -> Result<Box<dyn Statement>, HostError>;
}

impl<T: TestHost + ?Sized> TestHost for &T {
    fn discover_candidate_tests(&self, test_type: &str) -> Result<Vec<TestDefinition>, HostError> {
        (**self).discover_candidate_tests(test_type)
    }

    fn resolve_data_sources(&self, location: &str) -> Vec<DataSourceCandidate> {
        (**self).resolve_data_sources(location)
    }

    fn wrap_invocation(
        &self,
        test: &TestDefinition,
        row: Option<&ParameterRow>,
    ) -> Result<Box<dyn Statement>, HostError> {
        (**self).wrap_invocation(test, row)
    }
}

// ============================================================================
// Statement Interface
// ============================================================================

/// A runnable unit: one test body bound to its arguments, possibly wrapped by hooks.
pub trait Statement {
    fn evaluate(&mut self) -> Result<(), TestFailure>;
}

impl<F> Statement for F
where
    F: FnMut() -> Result<(), TestFailure>,
{
    fn evaluate(&mut self) -> Result<(), TestFailure> {
        self()
    }
}

// ============================================================================
// Filter Interface
// ============================================================================

/// What a filter sees of one scheduled invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub test_type: String,
    /// Base method name.
    pub method: String,
    /// `method` for plain tests, `method[index: params]` for exploded ones.
    pub display_name: String,
}

impl Description {
    /// `Type::display_name`
    pub fn qualified(&self) -> String {
        format!("{}::{}", self.test_type, self.display_name)
    }
}

/// Selects the invocations to keep.
pub trait Filter {
    fn should_run(&self, description: &Description) -> bool;

    /// Human-readable form for error messages.
    fn describe(&self) -> String {
        "custom filter".to_string()
    }
}

impl<F> Filter for F
where
    F: Fn(&Description) -> bool,
{
    fn should_run(&self, description: &Description) -> bool {
        self(description)
    }
}

/// Select a method by name.
///
/// A request for the base name selects every exploded invocation of that method; a request for a full display
/// name selects exactly that invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodFilter {
    pub test_type: Option<String>,
    pub name: String,
}

impl MethodFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            test_type: None,
            name: name.into(),
        }
    }

    pub fn in_type(mut self, test_type: impl Into<String>) -> Self {
        self.test_type = Some(test_type.into());
        self
    }
}

impl Filter for MethodFilter {
    fn should_run(&self, description: &Description) -> bool {
        if let Some(test_type) = &self.test_type {
            if *test_type != description.test_type {
                return false;
            }
        }
        self.name == description.method || self.name == description.display_name
    }

    fn describe(&self) -> String {
        match &self.test_type {
            Some(test_type) => format!("Method {}({})", self.name, test_type),
            None => format!("Method {}", self.name),
        }
    }
}

/// Select invocations whose display name contains a keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFilter(pub String);

impl Filter for KeywordFilter {
    fn should_run(&self, description: &Description) -> bool {
        description.display_name.contains(&self.0)
    }

    fn describe(&self) -> String {
        format!("keyword '{}'", self.0)
    }
}
