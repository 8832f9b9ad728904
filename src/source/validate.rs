//! Data-provider validation.
//!
//! Two independently checkable shapes:
//! - **method**: public, static, no parameters, returns rows of values;
//! - **field**: public, static, declared as an [`ExtendedDataProvider`](super::ExtendedDataProvider).
//!
//! Validation is a predicate over declarations. Nothing here returns early on the first problem or raises;
//! [`validate_bindings`] walks every test of a type and reports all malformed bindings in one batch.

use crate::errors::{ConfigurationError, Violation};
use crate::host::TestHost;
use crate::model::TestDefinition;

use super::{
    DataSourceCandidate, Declaration, FieldSignature, FieldType, MethodSignature, ReturnShape, Visibility,
    find_candidate,
};

/// Check whether a provider method meets its contract.
pub fn is_valid_method(signature: &MethodSignature) -> bool {
    method_violations(signature).is_empty()
}

/// Check whether a provider field meets its contract.
pub fn is_valid_field(signature: &FieldSignature) -> bool {
    field_violations(signature).is_empty()
}

/// List every way a provider method breaks its contract.
pub fn method_violations(signature: &MethodSignature) -> Vec<Violation> {
    let mut violations = Vec::new();
    if signature.visibility != Visibility::Public {
        violations.push(Violation::NotPublic);
    }
    if !signature.is_static {
        violations.push(Violation::NotStatic);
    }
    if signature.parameter_count != 0 {
        violations.push(Violation::TakesParameters(signature.parameter_count));
    }
    if let ReturnShape::Other(shape) = &signature.return_shape {
        violations.push(Violation::WrongReturnShape(shape.clone()));
    }
    violations
}

/// List every way a provider field breaks its contract.
pub fn field_violations(signature: &FieldSignature) -> Vec<Violation> {
    let mut violations = Vec::new();
    if let FieldType::Other(ty) = &signature.declared_type {
        violations.push(Violation::WrongFieldType(ty.clone()));
    }
    if signature.visibility != Visibility::Public {
        violations.push(Violation::NotPublic);
    }
    if !signature.is_static {
        violations.push(Violation::NotStatic);
    }
    violations
}

/// List every way a candidate declaration breaks the contract of its form.
pub fn check_candidate(candidate: &DataSourceCandidate) -> Vec<Violation> {
    match &candidate.declaration {
        Declaration::Method { signature, .. } => method_violations(signature),
        Declaration::Field { signature } => field_violations(signature),
    }
}

/// Validate one test's signature and data-provider binding.
///
/// ## Returns
/// - `None` when the test is well formed.
/// - The first configuration problem otherwise (a test has at most one binding, so at most one problem).
pub fn check_test(host: &dyn TestHost, test: &TestDefinition) -> Option<ConfigurationError> {
    let Some(binding) = &test.data_provider else {
        if test.parameter_count != 0 {
            return Some(ConfigurationError::InvalidTestSignature {
                test: test.id.clone(),
                parameter_count: test.parameter_count,
            });
        }
        return None;
    };

    let location = test.data_provider_location()?;
    let candidates = host.resolve_data_sources(location);
    let Some(candidate) = find_candidate(&candidates, &binding.name) else {
        return Some(ConfigurationError::NoSuchDataProvider {
            test: test.id.clone(),
            name: binding.name.clone(),
            location: location.to_string(),
        });
    };

    let violations = check_candidate(candidate);
    if violations.is_empty() {
        return None;
    }
    let (test, name) = (test.id.clone(), binding.name.clone());
    Some(if candidate.is_method() {
        ConfigurationError::InvalidProviderMethod { test, name, violations }
    } else {
        ConfigurationError::InvalidExtendedProvider { test, name, violations }
    })
}

/// Validate every test of a type, collecting all problems.
#[tracing::instrument(skip_all, fields(test_count = tests.len()))]
pub fn validate_bindings(host: &dyn TestHost, tests: &[TestDefinition]) -> Vec<ConfigurationError> {
    let errors: Vec<ConfigurationError> = tests.iter().filter_map(|test| check_test(host, test)).collect();
    if !errors.is_empty() {
        tracing::debug!(error_count = errors.len(), "data provider validation found problems");
    }
    errors
}
