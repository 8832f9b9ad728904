//! Test identities and definitions as handed over by the host.

use std::fmt;

/// Structured identity of a test definition: declaring type plus method name.
///
/// This is the key every group-level structure is indexed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestId {
    pub declaring_type: String,
    pub method: String,
}

impl TestId {
    pub fn new(declaring_type: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.method)
    }
}

/// Binding of a test to a named data provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseDataProvider {
    /// Name of the provider method or field.
    pub name: String,
    /// Candidate owning types. Empty means the test's own declaring type; otherwise only the first entry is
    /// searched.
    pub locations: Vec<String>,
}

impl UseDataProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locations: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.locations.push(location.into());
        self
    }
}

/// A discovered test method. Immutable; owned by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDefinition {
    pub id: TestId,
    pub data_provider: Option<UseDataProvider>,
    /// Number of parameters the test method declares.
    pub parameter_count: usize,
}

impl TestDefinition {
    /// A test that runs once without parameters.
    pub fn plain(declaring_type: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            id: TestId::new(declaring_type, method),
            data_provider: None,
            parameter_count: 0,
        }
    }

    /// A test bound to a data provider.
    pub fn parameterized(
        declaring_type: impl Into<String>,
        method: impl Into<String>,
        binding: UseDataProvider,
        parameter_count: usize,
    ) -> Self {
        Self {
            id: TestId::new(declaring_type, method),
            data_provider: Some(binding),
            parameter_count,
        }
    }

    pub fn name(&self) -> &str {
        &self.id.method
    }

    /// Resolve the type a data provider is looked up on.
    ///
    /// ## Returns
    /// - `None` for tests without a binding.
    /// - The first listed location when the binding names any, else the declaring type.
    pub fn data_provider_location(&self) -> Option<&str> {
        let binding = self.data_provider.as_ref()?;
        Some(
            binding
                .locations
                .first()
                .map(String::as_str)
                .unwrap_or(self.id.declaring_type.as_str()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_defaults_to_declaring_type() {
        let test = TestDefinition::parameterized("Suite", "t", UseDataProvider::new("rows"), 1);
        assert_eq!(test.data_provider_location(), Some("Suite"));
    }

    #[test]
    fn location_uses_first_listed_type() {
        let binding = UseDataProvider::new("rows").with_location("Shared").with_location("Other");
        let test = TestDefinition::parameterized("Suite", "t", binding, 1);
        assert_eq!(test.data_provider_location(), Some("Shared"));
    }

    #[test]
    fn plain_tests_have_no_location() {
        assert_eq!(TestDefinition::plain("Suite", "t").data_provider_location(), None);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(TestId::new("a.B", "c").to_string(), "a.B.c");
    }
}
