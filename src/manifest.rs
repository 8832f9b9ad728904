//! JSON suite manifests.
//!
//! A manifest describes test types, their data providers and their tests without any Rust code, so a suite's
//! expansion and lifecycle can be checked, listed and dry-run from the command line:
//!
//! ```json
//! {
//!   "types": [{
//!     "name": "MathTest",
//!     "providers": [{ "name": "numbers", "kind": "method", "rows": [[1, "One"], [2, "Two"]] }],
//!     "tests": [{ "name": "adds", "uses": "numbers", "parameters": 2 }]
//!   }]
//! }
//! ```
//!
//! ## Notes
//! - Every manifest test body passes. Failures come only from providers (`error`, `rows: null`) and from
//!   field hooks listed in `failing_hooks`.
//! - Signature fields (`public`, `static`, `parameters`, `returns`, `type`) default to a valid declaration, so a
//!   manifest can describe a malformed binding on purpose for `dataprovider check`.

use std::fs;
use std::path::Path;

use dataprovider_core::{ParameterRow, PrimitiveArray, Value};
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::errors::BoxError;
use crate::model::{TestDefinition, UseDataProvider};
use crate::registry::SuiteRegistry;
use crate::source::{
    ExtendedDataProvider, FieldSignature, FieldType, HookKind, MethodSignature, ProviderResult, ReturnShape,
    Visibility, shared,
};

/// Manifests larger than this are rejected before parsing (16 MB).
pub const MAX_MANIFEST_SIZE: u64 = 16 * 1024 * 1024;

/// Declared type name that marks a field as an extended data provider.
pub const EXTENDED_PROVIDER_TYPE: &str = "ExtendedDataProvider";

#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    #[error("cannot read manifest '{path}': {source}")]
    #[diagnostic(code(dataprovider::manifest::io))]
    Io { path: String, source: std::io::Error },

    #[error("manifest '{path}' is too large ({size} bytes, max {} bytes)", MAX_MANIFEST_SIZE)]
    #[diagnostic(code(dataprovider::manifest::too_large))]
    TooLarge { path: String, size: u64 },

    #[error("malformed manifest: {0}")]
    #[diagnostic(code(dataprovider::manifest::json))]
    Json(#[from] serde_json::Error),

    #[error("invalid manifest: {0}")]
    #[diagnostic(code(dataprovider::manifest::invalid))]
    Invalid(String),
}

// ============================================================================
// Manifest schema
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub types: Vec<TypeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeSpec {
    pub name: String,
    #[serde(default)]
    pub providers: Vec<ProviderSpec>,
    #[serde(default)]
    pub tests: Vec<TestSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Method,
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookSpec {
    BeforeAll,
    BeforeEach,
    AfterEach,
    AfterAll,
}

impl From<HookSpec> for HookKind {
    fn from(hook: HookSpec) -> Self {
        match hook {
            HookSpec::BeforeAll => HookKind::BeforeAll,
            HookSpec::BeforeEach => HookKind::BeforeEach,
            HookSpec::AfterEach => HookKind::AfterEach,
            HookSpec::AfterAll => HookKind::AfterAll,
        }
    }
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSpec {
    pub name: String,
    pub kind: ProviderKind,
    #[serde(default = "yes")]
    pub public: bool,
    #[serde(rename = "static", default = "yes")]
    pub is_static: bool,
    /// Parameters the provider method declares.
    #[serde(default)]
    pub parameters: usize,
    /// Return shape of a method; anything other than `rows` is invalid.
    #[serde(default)]
    pub returns: Option<String>,
    /// Declared type of a field.
    #[serde(rename = "type", default)]
    pub declared_type: Option<String>,
    /// `null` (or absent) makes the provider return no result.
    #[serde(default)]
    pub rows: Option<Vec<Vec<serde_json::Value>>>,
    /// Make the provider fail with this message.
    #[serde(default)]
    pub error: Option<String>,
    /// Hooks of a field provider that fail.
    #[serde(default)]
    pub failing_hooks: Vec<HookSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestSpec {
    pub name: String,
    /// Name of the bound data provider.
    #[serde(default)]
    pub uses: Option<String>,
    /// Type to look the provider up on, instead of the test's own type.
    #[serde(default)]
    pub location: Option<String>,
    /// Declared parameter count; defaults to 0 for plain tests and 1 for bound ones.
    #[serde(default)]
    pub parameters: Option<usize>,
}

// ============================================================================
// Loading
// ============================================================================

impl Manifest {
    pub fn from_json(source: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read and parse a manifest file.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let io_error = |source: std::io::Error| ManifestError::Io {
            path: path.display().to_string(),
            source,
        };
        let metadata = fs::metadata(path).map_err(io_error)?;
        if metadata.len() > MAX_MANIFEST_SIZE {
            return Err(ManifestError::TooLarge {
                path: path.display().to_string(),
                size: metadata.len(),
            });
        }
        let source = fs::read_to_string(path).map_err(io_error)?;
        Self::from_json(&source)
    }

    /// Build an in-memory host for the manifest. Every test body passes.
    pub fn into_registry(self) -> Result<SuiteRegistry, ManifestError> {
        let mut registry = SuiteRegistry::new();
        for type_spec in self.types {
            let mut builder = registry.test_type(type_spec.name.as_str());
            for provider in type_spec.providers {
                register_provider(&mut builder, provider)?;
            }
            for test in type_spec.tests {
                let definition = match &test.uses {
                    Some(provider) => {
                        let mut binding = UseDataProvider::new(provider);
                        if let Some(location) = &test.location {
                            binding = binding.with_location(location);
                        }
                        TestDefinition::parameterized(
                            type_spec.name.as_str(),
                            test.name.as_str(),
                            binding,
                            test.parameters.unwrap_or(1),
                        )
                    }
                    None => TestDefinition {
                        parameter_count: test.parameters.unwrap_or(0),
                        ..TestDefinition::plain(type_spec.name.as_str(), test.name.as_str())
                    },
                };
                builder.test(definition, |_| Ok(()));
            }
        }
        Ok(registry)
    }
}

/// Load a manifest file straight into a host.
pub fn load_registry(path: impl AsRef<Path>) -> Result<SuiteRegistry, ManifestError> {
    Manifest::load(path)?.into_registry()
}

fn register_provider(
    builder: &mut crate::registry::TypeBuilder<'_>,
    provider: ProviderSpec,
) -> Result<(), ManifestError> {
    let visibility = if provider.public { Visibility::Public } else { Visibility::Private };
    let rows = provider.rows.as_deref().map(convert_rows).transpose()?;

    match provider.kind {
        ProviderKind::Method => {
            let signature = MethodSignature {
                visibility,
                is_static: provider.is_static,
                parameter_count: provider.parameters,
                return_shape: match provider.returns.as_deref() {
                    None | Some("rows") => ReturnShape::Rows,
                    Some(other) => ReturnShape::Other(other.to_string()),
                },
            };
            let error = provider.error;
            builder.provider_method(&provider.name, signature, move || match &error {
                Some(message) => Err(message.clone().into()),
                None => Ok(rows.clone()),
            });
        }
        ProviderKind::Field => {
            let declared_type = match provider.declared_type.as_deref() {
                None | Some(EXTENDED_PROVIDER_TYPE) => FieldType::ExtendedDataProvider(shared(ManifestProvider {
                    name: provider.name.clone(),
                    rows,
                    error: provider.error,
                    failing_hooks: provider.failing_hooks.into_iter().map(HookKind::from).collect(),
                })),
                Some(other) => FieldType::Other(other.to_string()),
            };
            builder.provider_field(
                &provider.name,
                FieldSignature {
                    visibility,
                    is_static: provider.is_static,
                    declared_type,
                },
            );
        }
    }
    Ok(())
}

/// A stateful provider described by a manifest. Hooks only log, unless listed as failing.
struct ManifestProvider {
    name: String,
    rows: Option<Vec<ParameterRow>>,
    error: Option<String>,
    failing_hooks: Vec<HookKind>,
}

impl ManifestProvider {
    fn hook(&self, hook: HookKind) -> Result<(), BoxError> {
        tracing::debug!(provider = %self.name, %hook, "manifest provider hook");
        if self.failing_hooks.contains(&hook) {
            return Err(format!("{} failed as declared in the manifest", hook).into());
        }
        Ok(())
    }
}

impl ExtendedDataProvider for ManifestProvider {
    fn provide(&mut self) -> ProviderResult {
        match &self.error {
            Some(message) => Err(message.clone().into()),
            None => Ok(self.rows.clone()),
        }
    }

    fn before_all(&mut self) -> Result<(), BoxError> {
        self.hook(HookKind::BeforeAll)
    }

    fn before_each(&mut self) -> Result<(), BoxError> {
        self.hook(HookKind::BeforeEach)
    }

    fn after_each(&mut self) -> Result<(), BoxError> {
        self.hook(HookKind::AfterEach)
    }

    fn after_all(&mut self) -> Result<(), BoxError> {
        self.hook(HookKind::AfterAll)
    }
}

// ============================================================================
// JSON values
// ============================================================================

fn convert_rows(rows: &[Vec<serde_json::Value>]) -> Result<Vec<ParameterRow>, ManifestError> {
    rows.iter()
        .map(|row| row.iter().map(convert_value).collect::<Result<Vec<_>, _>>().map(ParameterRow::new))
        .collect()
}

/// Map one JSON value onto a parameter value.
///
/// ## Errors
/// - [`ManifestError::Invalid`] for objects, which have no parameter representation.
pub fn convert_value(value: &serde_json::Value) -> Result<Value, ManifestError> {
    use serde_json::Value as Json;

    Ok(match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::Str(s.clone()),
        Json::Array(items) => {
            let longs: Option<Vec<i64>> = items.iter().map(Json::as_i64).collect();
            match longs {
                Some(longs) if !longs.is_empty() => Value::Primitive(PrimitiveArray::Long(longs)),
                _ => Value::Array(items.iter().map(convert_value).collect::<Result<_, _>>()?),
            }
        }
        Json::Object(_) => {
            return Err(ManifestError::Invalid(format!(
                "objects cannot be used as parameter values: {}",
                value
            )));
        }
    })
}
