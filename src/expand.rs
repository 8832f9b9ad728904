//! Invocation expansion
//!
//! Turns test definitions into the ordered list of invocations the runner schedules:
//! - a test without a data-provider binding is scheduled once, as a plain invocation;
//! - a test bound to a valid provider is exploded into one [`InvocationDescriptor`] per row.
//!
//! ## Notes
//! - The provider is invoked exactly once per call to [`Expander::expand`]; nothing is cached here. Caching of
//!   the whole scheduled list is the runner's job.
//! - Indexes are 1-based and `group_size` is the true row count.
//! - A binding that does not resolve to a valid declaration is scheduled as a plain invocation; the
//!   validation pass reports it and blocks the run before anything executes.

use std::fmt;
use std::rc::Rc;

use dataprovider_core::{ParameterRow, display_name};

use crate::errors::ExpansionError;
use crate::host::{Description, TestHost};
use crate::model::{TestDefinition, TestId};
use crate::source::{DataSourceRef, SharedProvider, bind_candidate};

// ============================================================================
// Descriptors
// ============================================================================

/// One exploded invocation of a parameterized test.
#[derive(Clone)]
pub struct InvocationDescriptor {
    test: TestId,
    index: usize,
    group_size: usize,
    row: ParameterRow,
    name: String,
    provider_name: String,
    provider: Option<SharedProvider>,
}

impl InvocationDescriptor {
    pub fn test(&self) -> &TestId {
        &self.test
    }

    /// 1-based position within the group, in provider emission order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of rows the provider produced when the group was expanded.
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    pub fn row(&self) -> &ParameterRow {
        &self.row
    }

    /// `<method>[<index>: <formatted-row>]`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// The shared stateful provider, if the group came from one.
    pub fn provider(&self) -> Option<&SharedProvider> {
        self.provider.as_ref()
    }
}

impl PartialEq for InvocationDescriptor {
    fn eq(&self, other: &Self) -> bool {
        let same_provider = match (&self.provider, &other.provider) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.test == other.test
            && self.index == other.index
            && self.group_size == other.group_size
            && self.row == other.row
            && self.name == other.name
            && self.provider_name == other.provider_name
            && same_provider
    }
}

impl fmt::Debug for InvocationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationDescriptor")
            .field("test", &self.test)
            .field("index", &self.index)
            .field("group_size", &self.group_size)
            .field("name", &self.name)
            .field("provider", &self.provider_name)
            .field("stateful", &self.provider.is_some())
            .finish()
    }
}

/// One scheduled item.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// A test without a data provider; runs once.
    Plain(TestDefinition),
    Exploded(InvocationDescriptor),
}

impl Invocation {
    pub fn test_id(&self) -> &TestId {
        match self {
            Invocation::Plain(test) => &test.id,
            Invocation::Exploded(descriptor) => &descriptor.test,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Invocation::Plain(test) => test.name(),
            Invocation::Exploded(descriptor) => descriptor.name(),
        }
    }

    pub fn row(&self) -> Option<&ParameterRow> {
        match self {
            Invocation::Plain(_) => None,
            Invocation::Exploded(descriptor) => Some(descriptor.row()),
        }
    }

    pub fn description(&self) -> Description {
        let id = self.test_id();
        Description {
            test_type: id.declaring_type.clone(),
            method: id.method.clone(),
            display_name: self.display_name().to_string(),
        }
    }
}

// ============================================================================
// Expander
// ============================================================================

/// Explodes test definitions against the data providers a host exposes.
pub struct Expander<'h> {
    host: &'h dyn TestHost,
}

impl<'h> Expander<'h> {
    pub fn new(host: &'h dyn TestHost) -> Self {
        Self { host }
    }

    /// Resolve the valid data provider bound to a test.
    ///
    /// ## Returns
    /// - `None` when the test has no binding or no declaration of that name is valid.
    pub fn resolve(&self, test: &TestDefinition) -> Option<DataSourceRef> {
        let binding = test.data_provider.as_ref()?;
        let location = test.data_provider_location()?;
        let candidates = self.host.resolve_data_sources(location);
        bind_candidate(&candidates, &binding.name)
    }

    /// Explode one test against its data provider.
    ///
    /// ## Parameters
    /// - `test`: the test definition being expanded.
    /// - `source`: its bound data provider. Invoked exactly once.
    ///
    /// ## Returns
    /// - One descriptor per row, in emission order, indexes `1..=rows`.
    ///
    /// ## Errors
    /// - [`ExpansionError::ProviderFailed`] if the provider returns an error.
    /// - [`ExpansionError::NullResult`] if it returns no result at all.
    /// - [`ExpansionError::NoRows`] if it returns zero rows.
    /// - [`ExpansionError::EmptyRow`] if any row has no values.
    #[tracing::instrument(skip_all, fields(test = %test.id, provider = %source.name))]
    pub fn expand(
        &self,
        test: &TestDefinition,
        source: &DataSourceRef,
    ) -> Result<Vec<InvocationDescriptor>, ExpansionError> {
        let rows = source
            .provide()
            .map_err(|source_err| ExpansionError::ProviderFailed {
                test: test.id.clone(),
                provider: source.name.clone(),
                source: source_err,
            })?
            .ok_or_else(|| ExpansionError::NullResult {
                test: test.id.clone(),
                provider: source.name.clone(),
            })?;

        if rows.is_empty() {
            return Err(ExpansionError::NoRows {
                test: test.id.clone(),
                provider: source.name.clone(),
            });
        }

        let group_size = rows.len();
        let provider = source.stateful_provider().cloned();
        let mut descriptors = Vec::with_capacity(group_size);
        for (i, row) in rows.into_iter().enumerate() {
            let index = i + 1;
            if row.is_empty() {
                return Err(ExpansionError::EmptyRow {
                    test: test.id.clone(),
                    provider: source.name.clone(),
                    index,
                });
            }
            descriptors.push(InvocationDescriptor {
                test: test.id.clone(),
                index,
                group_size,
                name: display_name(test.name(), index, &row),
                row,
                provider_name: source.name.clone(),
                provider: provider.clone(),
            });
        }

        tracing::debug!(group_size, stateful = provider.is_some(), "expanded test");
        Ok(descriptors)
    }

    /// Expand every test, in order, into the scheduled invocation list.
    ///
    /// ## Errors
    /// - The first [`ExpansionError`]; later tests are not expanded.
    #[tracing::instrument(skip_all, fields(test_count = tests.len()))]
    pub fn explode_all(&self, tests: &[TestDefinition]) -> Result<Vec<Invocation>, ExpansionError> {
        let mut invocations = Vec::new();
        for test in tests {
            match self.resolve(test) {
                Some(source) => {
                    invocations.extend(self.expand(test, &source)?.into_iter().map(Invocation::Exploded));
                }
                None => {
                    if test.data_provider.is_some() {
                        tracing::warn!(test = %test.id, "data provider binding does not resolve; scheduling once");
                    }
                    invocations.push(Invocation::Plain(test.clone()));
                }
            }
        }
        Ok(invocations)
    }
}
