//! Data providers: the capability trait, references bound to tests, and the declarations a host exposes.
//!
//! A data provider comes in two forms:
//! - a **function form**: a zero-argument callable returning rows,
//! - a **stateful form**: a shared object implementing [`ExtendedDataProvider`], which produces rows and also
//!   receives the four lifecycle hooks around its group.
//!
//! Both are unified in [`DataSourceKind`]; the expander and lifecycle adapter only match on that enum.
//!
//! ## Notes
//! - The stateful form is a single instance shared by every invocation in its group
//!   (`Rc<RefCell<..>>`); hooks mutate it in execution order.
//! - Declarations carry the signature metadata the validator checks. A host reflecting over another runtime,
//!   or a manifest, can describe declarations that are not callable as a provider; the validator rejects them.

pub mod validate;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use dataprovider_core::ParameterRow;

use crate::errors::BoxError;

/// What a data provider returns: `Ok(None)` stands for an absent result.
pub type ProviderResult = Result<Option<Vec<ParameterRow>>, BoxError>;

/// A function-form data provider.
pub type ProviderFn = Rc<dyn Fn() -> ProviderResult>;

/// A stateful data provider shared by its whole group.
pub type SharedProvider = Rc<RefCell<dyn ExtendedDataProvider>>;

/// A data provider with group and per-invocation lifecycle hooks.
///
/// Only [`provide`](ExtendedDataProvider::provide) is mandatory. The hooks default to no-ops.
///
/// ```rust
/// use dataprovider::source::{ExtendedDataProvider, ProviderResult};
/// use dataprovider::rows;
///
/// struct Numbers {
///     opened: bool,
/// }
///
/// impl ExtendedDataProvider for Numbers {
///     fn provide(&mut self) -> ProviderResult {
///         Ok(Some(rows![[1, "One"], [2, "Two"]]))
///     }
///
///     fn before_all(&mut self) -> Result<(), dataprovider::BoxError> {
///         self.opened = true;
///         Ok(())
///     }
/// }
/// ```
pub trait ExtendedDataProvider {
    /// Produce the rows for the group. Called once per expansion.
    fn provide(&mut self) -> ProviderResult;

    /// Called once before the first scheduled invocation of the group.
    fn before_all(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called before each invocation.
    fn before_each(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called after each invocation, whatever its outcome.
    fn after_each(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called once after the last scheduled invocation of the group.
    fn after_all(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Share a provider so it can be declared as a field and attached to every descriptor of its group.
pub fn shared<P: ExtendedDataProvider + 'static>(provider: P) -> SharedProvider {
    Rc::new(RefCell::new(provider))
}

/// One of the four lifecycle hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    BeforeAll,
    BeforeEach,
    AfterEach,
    AfterAll,
}

impl HookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HookKind::BeforeAll => "before_all",
            HookKind::BeforeEach => "before_each",
            HookKind::AfterEach => "after_each",
            HookKind::AfterAll => "after_all",
        }
    }

    /// Dispatch this hook on a provider.
    pub fn invoke(self, provider: &mut dyn ExtendedDataProvider) -> Result<(), BoxError> {
        match self {
            HookKind::BeforeAll => provider.before_all(),
            HookKind::BeforeEach => provider.before_each(),
            HookKind::AfterEach => provider.after_each(),
            HookKind::AfterAll => provider.after_all(),
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// References bound to tests
// ============================================================================

/// The callable part of a resolved data provider.
#[derive(Clone)]
pub enum DataSourceKind {
    Function(ProviderFn),
    Stateful(SharedProvider),
}

impl fmt::Debug for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceKind::Function(_) => f.write_str("Function(..)"),
            DataSourceKind::Stateful(_) => f.write_str("Stateful(..)"),
        }
    }
}

/// A validated data provider bound to a test.
#[derive(Debug, Clone)]
pub struct DataSourceRef {
    pub name: String,
    pub kind: DataSourceKind,
}

impl DataSourceRef {
    pub fn function(name: impl Into<String>, provider: impl Fn() -> ProviderResult + 'static) -> Self {
        Self {
            name: name.into(),
            kind: DataSourceKind::Function(Rc::new(provider)),
        }
    }

    pub fn stateful(name: impl Into<String>, provider: SharedProvider) -> Self {
        Self {
            name: name.into(),
            kind: DataSourceKind::Stateful(provider),
        }
    }

    /// Invoke the provider once.
    pub fn provide(&self) -> ProviderResult {
        match &self.kind {
            DataSourceKind::Function(provider) => provider(),
            DataSourceKind::Stateful(provider) => match provider.try_borrow_mut() {
                Ok(mut provider) => provider.provide(),
                Err(_) => Err(format!("data provider '{}' is already borrowed", self.name).into()),
            },
        }
    }

    /// The shared provider, for the stateful form only.
    pub fn stateful_provider(&self) -> Option<&SharedProvider> {
        match &self.kind {
            DataSourceKind::Stateful(provider) => Some(provider),
            DataSourceKind::Function(_) => None,
        }
    }
}

// ============================================================================
// Declarations exposed by a host
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Declared return shape of a provider method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReturnShape {
    /// Rows of opaque values (two-dimensional).
    #[default]
    Rows,
    Other(String),
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnShape::Rows => f.write_str("rows"),
            ReturnShape::Other(name) => f.write_str(name),
        }
    }
}

/// Signature metadata of a provider method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub visibility: Visibility,
    pub is_static: bool,
    pub parameter_count: usize,
    pub return_shape: ReturnShape,
}

impl Default for MethodSignature {
    fn default() -> Self {
        Self {
            visibility: Visibility::Public,
            is_static: true,
            parameter_count: 0,
            return_shape: ReturnShape::Rows,
        }
    }
}

/// Declared type of a provider field.
#[derive(Clone)]
pub enum FieldType {
    ExtendedDataProvider(SharedProvider),
    Other(String),
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::ExtendedDataProvider(_) => f.write_str("ExtendedDataProvider(..)"),
            FieldType::Other(name) => write!(f, "Other({:?})", name),
        }
    }
}

/// Signature metadata of a provider field.
#[derive(Debug, Clone)]
pub struct FieldSignature {
    pub visibility: Visibility,
    pub is_static: bool,
    pub declared_type: FieldType,
}

impl FieldSignature {
    /// A public static field holding the given provider.
    pub fn extended(provider: SharedProvider) -> Self {
        Self {
            visibility: Visibility::Public,
            is_static: true,
            declared_type: FieldType::ExtendedDataProvider(provider),
        }
    }
}

/// How a candidate provider is declared on its owning type.
#[derive(Clone)]
pub enum Declaration {
    Method {
        signature: MethodSignature,
        provider: ProviderFn,
    },
    Field { signature: FieldSignature },
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::Method { signature, .. } => f.debug_struct("Method").field("signature", signature).finish(),
            Declaration::Field { signature } => f.debug_struct("Field").field("signature", signature).finish(),
        }
    }
}

/// A named data-provider declaration found on a type.
#[derive(Debug, Clone)]
pub struct DataSourceCandidate {
    pub name: String,
    pub declaration: Declaration,
}

impl DataSourceCandidate {
    pub fn method(
        name: impl Into<String>,
        signature: MethodSignature,
        provider: impl Fn() -> ProviderResult + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            declaration: Declaration::Method {
                signature,
                provider: Rc::new(provider),
            },
        }
    }

    pub fn field(name: impl Into<String>, signature: FieldSignature) -> Self {
        Self {
            name: name.into(),
            declaration: Declaration::Field { signature },
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self.declaration, Declaration::Method { .. })
    }

    /// Turn a valid declaration into a bound reference.
    ///
    /// ## Returns
    /// - `None` if the declaration fails its capability contract.
    pub fn to_ref(&self) -> Option<DataSourceRef> {
        match &self.declaration {
            Declaration::Method { signature, provider } if validate::is_valid_method(signature) => {
                Some(DataSourceRef {
                    name: self.name.clone(),
                    kind: DataSourceKind::Function(Rc::clone(provider)),
                })
            }
            Declaration::Field { signature } if validate::is_valid_field(signature) => match &signature.declared_type {
                FieldType::ExtendedDataProvider(provider) => Some(DataSourceRef::stateful(&self.name, Rc::clone(provider))),
                FieldType::Other(_) => None,
            },
            _ => None,
        }
    }
}

/// Methods before fields, declaration order within each.
fn lookup_order(candidates: &[DataSourceCandidate]) -> impl Iterator<Item = &DataSourceCandidate> {
    candidates
        .iter()
        .filter(|c| c.is_method())
        .chain(candidates.iter().filter(|c| !c.is_method()))
}

/// Find a candidate by name: methods before fields, declaration order within each.
pub fn find_candidate<'a>(candidates: &'a [DataSourceCandidate], name: &str) -> Option<&'a DataSourceCandidate> {
    lookup_order(candidates).find(|c| c.name == name)
}

/// Bind the first valid candidate of that name, in [`find_candidate`] order.
///
/// An invalid method does not hide a valid field of the same name.
pub fn bind_candidate(candidates: &[DataSourceCandidate], name: &str) -> Option<DataSourceRef> {
    lookup_order(candidates)
        .filter(|c| c.name == name)
        .find_map(DataSourceCandidate::to_ref)
}
