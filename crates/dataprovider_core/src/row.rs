//! Immutable parameter rows.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::format::format_parameters;
use crate::value::Value;

/// An ordered, fixed-length sequence of values bound to one invocation.
///
/// Rows are never mutated after creation; clones share storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRow(Arc<[Value]>);

impl ParameterRow {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values.into())
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl Deref for ParameterRow {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.0
    }
}

impl From<Vec<Value>> for ParameterRow {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<Value> for ParameterRow {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ParameterRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_parameters(&self.0))
    }
}

/// Build a `Vec<ParameterRow>` from bracketed rows of values convertible into [`Value`].
///
/// ```rust
/// use dataprovider_core::{Value, rows};
///
/// let rows = rows![[1, "One"], [2, "Two"]];
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1][1], Value::from("Two"));
/// ```
#[macro_export]
macro_rules! rows {
    ($([$($value:expr),* $(,)?]),* $(,)?) => {
        vec![$($crate::ParameterRow::new(vec![$($crate::Value::from($value)),*])),*]
    };
}
