#![forbid(unsafe_code)]
//! Data-provider test expansion and fixture lifecycle engine
//!
//! Given a test definition bound to a data provider, this crate explodes it into one independently named
//! invocation per row, runs the invocations in a deterministic order, and fires the provider's group and
//! per-invocation hooks around them.
//!
//! The pure value model and display-name formatting live in `dataprovider_core` and are re-exported here.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Test bodies**: a body registered with [`SuiteRegistry`](registry::SuiteRegistry) may panic (assertions);
//!   the panic is caught and reported as a failure of that invocation only.

pub mod cli;
pub mod errors;
pub mod expand;
pub mod host;
pub mod lifecycle;
pub mod manifest;
pub mod model;
pub mod registry;
pub mod runner;
pub mod source;
pub mod tracker;

pub use dataprovider_core::{
    EMPTY_STRING_TOKEN, NULL_TOKEN, OpaqueValue, ParameterRow, PrimitiveArray, Value, display_name,
    format_parameters, rows,
};

pub use errors::{BoxError, ConfigurationError, ExpansionError, HostError, RunError, TestFailure, TrackerError};
pub use expand::{Expander, Invocation, InvocationDescriptor};
pub use host::{Description, Filter, KeywordFilter, MethodFilter, Statement, TestHost};
pub use model::{TestDefinition, TestId, UseDataProvider};
pub use registry::SuiteRegistry;
pub use runner::{DataProviderRunner, RunConfig, RunListener, RunSummary};
pub use source::{DataSourceRef, ExtendedDataProvider, HookKind, ProviderResult};
pub use tracker::{GroupPosition, GroupTracker};
