//! Run configuration for the runner façade.

/// Run configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Stop after the first failing invocation
    pub stop_on_fail: bool,
    /// Report one line per invocation instead of one character
    pub verbose: bool,
    /// Keyword every scheduled display name must contain
    pub filter: Option<String>,
}

impl RunConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the run stops at the first failure
    pub fn with_stop_on_fail(mut self, stop_on_fail: bool) -> Self {
        self.stop_on_fail = stop_on_fail;
        self
    }

    /// Set verbose reporting
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the keyword filter
    pub fn with_filter(mut self, keyword: impl Into<String>) -> Self {
        self.filter = Some(keyword.into());
        self
    }
}
