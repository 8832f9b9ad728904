//! In-memory test host.
//!
//! [`SuiteRegistry`] holds test types registered from Rust code (or loaded from a manifest) and implements
//! [`TestHost`] over them. Registration order is declaration order.
//!
//! ```rust
//! use dataprovider::registry::SuiteRegistry;
//! use dataprovider::runner::{DataProviderRunner, SilentListener};
//! use dataprovider::rows;
//!
//! let mut registry = SuiteRegistry::new();
//! registry
//!     .test_type("MathTest")
//!     .provider_fn("numbers", || Ok(Some(rows![[1, 1, 2], [2, 3, 5]])))
//!     .parameterized("adds", "numbers", |row| {
//!         let (a, b, sum) = (row[0].as_int(), row[1].as_int(), row[2].as_int());
//!         if a.zip(b).map(|(a, b)| a + b) != sum {
//!             return Err("wrong sum".into());
//!         }
//!         Ok(())
//!     });
//!
//! let mut runner = DataProviderRunner::new(&registry, "MathTest").unwrap();
//! let summary = runner.run(&mut SilentListener).unwrap();
//! assert_eq!(summary.passed, 2);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use dataprovider_core::ParameterRow;

use crate::errors::{BoxError, HostError, TestFailure};
use crate::host::{Statement, TestHost};
use crate::model::{TestDefinition, UseDataProvider};
use crate::source::{
    DataSourceCandidate, FieldSignature, MethodSignature, ProviderResult, SharedProvider,
};

/// A registered test body. Plain tests receive an empty row.
pub type TestBody = Rc<dyn Fn(&ParameterRow) -> Result<(), BoxError>>;

#[derive(Default)]
struct TypeEntry {
    tests: Vec<TestDefinition>,
    bodies: HashMap<String, TestBody>,
    sources: Vec<DataSourceCandidate>,
}

/// Test types, their data providers and their bodies.
#[derive(Default)]
pub struct SuiteRegistry {
    types: Vec<(String, TypeEntry)>,
}

impl std::fmt::Debug for SuiteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteRegistry")
            .field("types", &self.types.iter().map(|(name, _)| name).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SuiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or continue) registering a test type.
    pub fn test_type(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        let name = name.into();
        let position = match self.types.iter().position(|(existing, _)| *existing == name) {
            Some(position) => position,
            None => {
                self.types.push((name.clone(), TypeEntry::default()));
                self.types.len() - 1
            }
        };
        let (name, entry) = &mut self.types[position];
        TypeBuilder { name: name.as_str(), entry }
    }

    /// Registered type names, in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|(name, _)| name.as_str())
    }

    fn entry(&self, name: &str) -> Option<&TypeEntry> {
        self.types
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, entry)| entry)
    }
}

impl TestHost for SuiteRegistry {
    fn discover_candidate_tests(&self, test_type: &str) -> Result<Vec<TestDefinition>, HostError> {
        self.entry(test_type)
            .map(|entry| entry.tests.clone())
            .ok_or_else(|| HostError::UnknownTestType(test_type.to_string()))
    }

    fn resolve_data_sources(&self, location: &str) -> Vec<DataSourceCandidate> {
        self.entry(location).map(|entry| entry.sources.clone()).unwrap_or_default()
    }

    fn wrap_invocation(
        &self,
        test: &TestDefinition,
        row: Option<&ParameterRow>,
    ) -> Result<Box<dyn Statement>, HostError> {
        let entry = self
            .entry(&test.id.declaring_type)
            .ok_or_else(|| HostError::UnknownTestType(test.id.declaring_type.clone()))?;
        let body = entry
            .bodies
            .get(&test.id.method)
            .cloned()
            .ok_or_else(|| HostError::MissingBody(test.id.clone()))?;
        let row = row.cloned().unwrap_or_else(|| ParameterRow::new(Vec::new()));
        Ok(Box::new(move || run_body(&*body, &row)))
    }
}

/// Run a body, turning a panic into [`TestFailure::Panicked`].
fn run_body(body: &dyn Fn(&ParameterRow) -> Result<(), BoxError>, row: &ParameterRow) -> Result<(), TestFailure> {
    match panic::catch_unwind(AssertUnwindSafe(|| body(row))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(TestFailure::Failed(err)),
        Err(payload) => Err(TestFailure::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// Type builder
// ============================================================================

/// Registers the providers and tests of one type.
pub struct TypeBuilder<'r> {
    name: &'r str,
    entry: &'r mut TypeEntry,
}

impl TypeBuilder<'_> {
    /// Declare any data-provider candidate.
    pub fn candidate(&mut self, candidate: DataSourceCandidate) -> &mut Self {
        self.entry.sources.push(candidate);
        self
    }

    /// Declare a valid provider method.
    pub fn provider_fn(&mut self, name: &str, provider: impl Fn() -> ProviderResult + 'static) -> &mut Self {
        self.provider_method(name, MethodSignature::default(), provider)
    }

    /// Declare a provider method with explicit signature metadata.
    pub fn provider_method(
        &mut self,
        name: &str,
        signature: MethodSignature,
        provider: impl Fn() -> ProviderResult + 'static,
    ) -> &mut Self {
        self.candidate(DataSourceCandidate::method(name, signature, provider))
    }

    /// Declare a valid extended provider field.
    pub fn extended(&mut self, name: &str, provider: SharedProvider) -> &mut Self {
        self.provider_field(name, FieldSignature::extended(provider))
    }

    /// Declare a provider field with explicit signature metadata.
    pub fn provider_field(&mut self, name: &str, signature: FieldSignature) -> &mut Self {
        self.candidate(DataSourceCandidate::field(name, signature))
    }

    /// Register a test taking no parameters.
    pub fn plain(&mut self, method: &str, body: impl Fn() -> Result<(), BoxError> + 'static) -> &mut Self {
        let definition = TestDefinition::plain(self.name, method);
        self.test(definition, move |_| body())
    }

    /// Register a test taking one row from the named provider on this type.
    pub fn parameterized(
        &mut self,
        method: &str,
        provider: &str,
        body: impl Fn(&ParameterRow) -> Result<(), BoxError> + 'static,
    ) -> &mut Self {
        self.parameterized_with(method, UseDataProvider::new(provider), body)
    }

    /// Register a test taking one row from an explicitly located provider.
    pub fn parameterized_with(
        &mut self,
        method: &str,
        binding: UseDataProvider,
        body: impl Fn(&ParameterRow) -> Result<(), BoxError> + 'static,
    ) -> &mut Self {
        let definition = TestDefinition::parameterized(self.name, method, binding, 1);
        self.test(definition, body)
    }

    /// Register a test from a full definition.
    pub fn test(
        &mut self,
        definition: TestDefinition,
        body: impl Fn(&ParameterRow) -> Result<(), BoxError> + 'static,
    ) -> &mut Self {
        self.entry.bodies.insert(definition.id.method.clone(), Rc::new(body));
        self.entry.tests.push(definition);
        self
    }
}
