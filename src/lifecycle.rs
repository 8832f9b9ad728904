//! Lifecycle hooks around exploded invocations.
//!
//! [`LifecycleStatement`] wraps the host's statement for one exploded invocation:
//!
//! ```text
//! advance tracker
//! before_all      (first scheduled member only)
//! before_each
//! body
//! after_each      (always)
//! after_all       (last scheduled member only, always)
//! ```
//!
//! ## Notes
//! - Hook failures are collected and never stop later hooks. A failing `before_*` hook does not skip the body.
//! - The body's own failure is kept as-is and is never masked; see [`compose`].
//! - Function-form groups have no provider, so only the tracker advances.

use crate::errors::TestFailure;
use crate::expand::{Invocation, InvocationDescriptor};
use crate::host::Statement;
use crate::model::TestId;
use crate::source::{HookKind, SharedProvider};
use crate::tracker::GroupTracker;

/// One exploded invocation, with the hooks of its stateful provider fired around it.
pub struct LifecycleStatement<'t> {
    inner: Box<dyn Statement>,
    tracker: &'t mut GroupTracker,
    test: TestId,
    provider_name: String,
    provider: Option<SharedProvider>,
}

impl<'t> LifecycleStatement<'t> {
    pub fn new(descriptor: &InvocationDescriptor, inner: Box<dyn Statement>, tracker: &'t mut GroupTracker) -> Self {
        Self {
            inner,
            tracker,
            test: descriptor.test().clone(),
            provider_name: descriptor.provider_name().to_string(),
            provider: descriptor.provider().cloned(),
        }
    }

    fn fire(&self, hook: HookKind, failures: &mut Vec<TestFailure>) {
        if let Some(provider) = &self.provider {
            fire_hook(provider, &self.provider_name, &self.test, hook, failures);
        }
    }
}

fn fire_hook(provider: &SharedProvider, name: &str, test: &TestId, hook: HookKind, failures: &mut Vec<TestFailure>) {
    tracing::debug!(test = %test, provider = %name, %hook, "firing hook");
    let result = match provider.try_borrow_mut() {
        Ok(mut provider) => hook.invoke(&mut *provider),
        Err(_) => Err("data provider is already borrowed".into()),
    };
    if let Err(source) = result {
        failures.push(TestFailure::Hook {
            hook,
            provider: name.to_string(),
            source,
        });
    }
}

/// Fire `after_all` for every group that started but whose last scheduled member never ran, then close it.
///
/// Used when a run stops early, so every `before_all` that fired is matched by exactly one `after_all`.
///
/// ## Returns
/// - The failing teardown hooks, in scheduled order of their groups.
pub fn tear_down_open_groups(scheduled: &[Invocation], tracker: &mut GroupTracker) -> Vec<TestFailure> {
    let mut failures = Vec::new();
    for invocation in scheduled {
        let Invocation::Exploded(descriptor) = invocation else {
            continue;
        };
        if !tracker.close(descriptor.test()) {
            continue;
        }
        if let Some(provider) = descriptor.provider() {
            fire_hook(
                provider,
                descriptor.provider_name(),
                descriptor.test(),
                HookKind::AfterAll,
                &mut failures,
            );
        }
    }
    failures
}

impl Statement for LifecycleStatement<'_> {
    fn evaluate(&mut self) -> Result<(), TestFailure> {
        // Contract violations surface as a failure of this invocation.
        let position = self
            .tracker
            .advance(&self.test)
            .map_err(|err| TestFailure::Failed(Box::new(err)))?;

        let mut hook_failures = Vec::new();
        if position.is_first() {
            self.fire(HookKind::BeforeAll, &mut hook_failures);
        }
        self.fire(HookKind::BeforeEach, &mut hook_failures);

        let body = self.inner.evaluate();

        self.fire(HookKind::AfterEach, &mut hook_failures);
        if position.is_last() {
            self.fire(HookKind::AfterAll, &mut hook_failures);
        }

        compose(body, hook_failures)
    }
}

/// Combine a body outcome with the hook failures collected around it.
///
/// ## Returns
/// - The body outcome unchanged when no hook failed.
/// - Otherwise [`TestFailure::Multiple`]: the body failure (if any) first, then hook failures in firing order.
pub fn compose(body: Result<(), TestFailure>, hook_failures: Vec<TestFailure>) -> Result<(), TestFailure> {
    if hook_failures.is_empty() {
        return body;
    }
    let mut causes = Vec::with_capacity(hook_failures.len() + 1);
    if let Err(failure) = body {
        causes.push(failure);
    }
    causes.extend(hook_failures);
    Err(TestFailure::Multiple(causes))
}
