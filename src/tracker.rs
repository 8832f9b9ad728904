//! Group lifecycle tracking.
//!
//! Every exploded group shares one counter, keyed by its [`TestId`]. The counter records how many members of the
//! group are scheduled in the *current* run and how many of them have started, so "first" and "last" stay
//! correct when a filter drops members or a display name selects a single row.
//!
//! ## Notes
//! - Counters are rebuilt from the scheduled list, never from the raw expansion. `group_size` on a descriptor
//!   is the provider's count; the counter's `scheduled` is what will actually run.
//! - Plain invocations have no hooks and are not tracked.

use std::collections::HashMap;

use crate::errors::TrackerError;
use crate::expand::Invocation;
use crate::model::TestId;

/// Scheduled count and current position of one group. `position <= scheduled` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupCounter {
    pub position: usize,
    pub scheduled: usize,
}

impl GroupCounter {
    fn snapshot(self) -> GroupPosition {
        GroupPosition {
            index: self.position,
            scheduled: self.scheduled,
        }
    }
}

/// Where an invocation sits within its scheduled group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPosition {
    /// 1-based position among the scheduled members.
    pub index: usize,
    pub scheduled: usize,
}

impl GroupPosition {
    pub fn is_first(&self) -> bool {
        self.index == 1
    }

    pub fn is_last(&self) -> bool {
        self.scheduled == 1 || self.index == self.scheduled
    }
}

/// Per-identity counters for one run.
#[derive(Debug, Default)]
pub struct GroupTracker {
    groups: HashMap<TestId, GroupCounter>,
}

impl GroupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tracker for a scheduled list.
    pub fn from_scheduled(scheduled: &[Invocation]) -> Self {
        let mut tracker = Self::new();
        tracker.rebuild(scheduled);
        tracker
    }

    /// Recount the scheduled members of every group and reset all positions.
    #[tracing::instrument(skip_all, fields(scheduled = scheduled.len()))]
    pub fn rebuild(&mut self, scheduled: &[Invocation]) {
        self.groups.clear();
        for invocation in scheduled {
            if let Invocation::Exploded(descriptor) = invocation {
                self.groups.entry(descriptor.test().clone()).or_default().scheduled += 1;
            }
        }
        tracing::debug!(groups = self.groups.len(), "rebuilt group counters");
    }

    /// Record that the next member of a group is starting.
    ///
    /// ## Returns
    /// - A snapshot of the position just reached.
    ///
    /// ## Errors
    /// - [`TrackerError::UnknownGroup`] if nothing was scheduled for `id`.
    /// - [`TrackerError::Overrun`] if every scheduled member has already started.
    pub fn advance(&mut self, id: &TestId) -> Result<GroupPosition, TrackerError> {
        let counter = self
            .groups
            .get_mut(id)
            .ok_or_else(|| TrackerError::UnknownGroup(id.clone()))?;
        if counter.position >= counter.scheduled {
            return Err(TrackerError::Overrun {
                test: id.clone(),
                scheduled: counter.scheduled,
            });
        }
        counter.position += 1;
        tracing::trace!(test = %id, position = counter.position, scheduled = counter.scheduled, "advanced group");
        Ok(counter.snapshot())
    }

    /// Whether the current member is the first of its group.
    pub fn is_first(&self, id: &TestId) -> Result<bool, TrackerError> {
        self.current(id).map(|position| position.is_first())
    }

    /// Whether the current member is the last of its group.
    pub fn is_last(&self, id: &TestId) -> Result<bool, TrackerError> {
        self.current(id).map(|position| position.is_last())
    }

    /// Number of members started so far, if the group is scheduled.
    pub fn position(&self, id: &TestId) -> Option<usize> {
        self.groups.get(id).map(|counter| counter.position)
    }

    /// Scheduled member count, if the group is scheduled.
    pub fn scheduled(&self, id: &TestId) -> Option<usize> {
        self.groups.get(id).map(|counter| counter.scheduled)
    }

    /// Whether a group has started but its last scheduled member has not.
    pub fn is_open(&self, id: &TestId) -> bool {
        self.groups
            .get(id)
            .is_some_and(|counter| counter.position > 0 && counter.position < counter.scheduled)
    }

    /// Mark a started group as finished, so no later member counts as its first or last.
    ///
    /// ## Returns
    /// - `true` if the group was open.
    pub fn close(&mut self, id: &TestId) -> bool {
        match self.groups.get_mut(id) {
            Some(counter) if counter.position > 0 && counter.position < counter.scheduled => {
                counter.position = counter.scheduled;
                true
            }
            _ => false,
        }
    }

    fn current(&self, id: &TestId) -> Result<GroupPosition, TrackerError> {
        let counter = self.groups.get(id).ok_or_else(|| TrackerError::UnknownGroup(id.clone()))?;
        if counter.position == 0 {
            return Err(TrackerError::NotAdvanced(id.clone()));
        }
        Ok(counter.snapshot())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::expand::Expander;
    use crate::model::{TestDefinition, UseDataProvider};
    use crate::registry::SuiteRegistry;
    use crate::source::DataSourceRef;
    use dataprovider_core::{ParameterRow, Value};

    fn scheduled(method: &str, size: usize) -> Vec<Invocation> {
        let rows: Vec<ParameterRow> = (0..size).map(|i| ParameterRow::new(vec![Value::from(i as i64)])).collect();
        let source = DataSourceRef::function("rows", move || Ok(Some(rows.clone())));
        let test = TestDefinition::parameterized("Suite", method, UseDataProvider::new("rows"), 1);
        let registry = SuiteRegistry::new();
        Expander::new(&registry)
            .expand(&test, &source)
            .unwrap()
            .into_iter()
            .map(Invocation::Exploded)
            .collect()
    }

    #[test]
    fn first_and_last_of_five() {
        let id = TestId::new("Suite", "t");
        let mut tracker = GroupTracker::from_scheduled(&scheduled("t", 5));
        for call in 1..=5 {
            let position = tracker.advance(&id).unwrap();
            assert_eq!(position.index, call);
            assert_eq!(position.is_first(), call == 1);
            assert_eq!(position.is_last(), call == 5);
            assert_eq!(tracker.is_first(&id).unwrap(), call == 1);
            assert_eq!(tracker.is_last(&id).unwrap(), call == 5);
        }
    }

    #[test]
    fn rebuilt_to_single_member_is_first_and_last() {
        let id = TestId::new("Suite", "t");
        let invocations = scheduled("t", 5);
        let mut tracker = GroupTracker::from_scheduled(&invocations);
        tracker.advance(&id).unwrap();

        tracker.rebuild(&invocations[2..3]);
        assert_eq!(tracker.position(&id), Some(0));
        let position = tracker.advance(&id).unwrap();
        assert!(position.is_first());
        assert!(position.is_last());
    }

    #[test]
    fn closing_an_open_group_finishes_it() {
        let id = TestId::new("Suite", "t");
        let mut tracker = GroupTracker::from_scheduled(&scheduled("t", 3));
        assert!(!tracker.is_open(&id));
        assert!(!tracker.close(&id));

        tracker.advance(&id).unwrap();
        assert!(tracker.is_open(&id));
        assert!(tracker.close(&id));
        assert!(!tracker.is_open(&id));
        assert_eq!(tracker.position(&id), Some(3));
        assert!(tracker.advance(&id).is_err());
    }

    #[test]
    fn groups_are_independent() {
        let mut invocations = scheduled("a", 2);
        invocations.extend(scheduled("b", 3));
        let mut tracker = GroupTracker::from_scheduled(&invocations);
        let a = TestId::new("Suite", "a");
        let b = TestId::new("Suite", "b");

        tracker.advance(&a).unwrap();
        tracker.advance(&b).unwrap();
        assert!(tracker.advance(&a).unwrap().is_last());
        assert!(!tracker.is_last(&b).unwrap());
        assert_eq!(tracker.scheduled(&b), Some(3));
    }

    #[test]
    fn unknown_group_is_an_error() {
        let mut tracker = GroupTracker::new();
        let id = TestId::new("Suite", "missing");
        assert_eq!(tracker.advance(&id), Err(TrackerError::UnknownGroup(id.clone())));
        assert_eq!(tracker.is_first(&id), Err(TrackerError::UnknownGroup(id.clone())));
        assert_eq!(tracker.position(&id), None);
    }

    #[test]
    fn query_before_advance_is_an_error() {
        let id = TestId::new("Suite", "t");
        let tracker = GroupTracker::from_scheduled(&scheduled("t", 2));
        assert_eq!(tracker.is_last(&id), Err(TrackerError::NotAdvanced(id)));
    }

    #[test]
    fn advancing_past_schedule_is_an_error() {
        let id = TestId::new("Suite", "t");
        let mut tracker = GroupTracker::from_scheduled(&scheduled("t", 1));
        tracker.advance(&id).unwrap();
        assert_eq!(
            tracker.advance(&id),
            Err(TrackerError::Overrun {
                test: id.clone(),
                scheduled: 1
            })
        );
        assert_eq!(tracker.position(&id), Some(1));
    }

    #[test]
    fn plain_invocations_are_not_tracked() {
        let plain = vec![Invocation::Plain(TestDefinition::plain("Suite", "p"))];
        let tracker = GroupTracker::from_scheduled(&plain);
        assert_eq!(tracker.position(&TestId::new("Suite", "p")), None);
    }
}
