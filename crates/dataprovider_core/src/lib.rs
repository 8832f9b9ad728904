//! Provide the pure value model and display-name formatting for the dataprovider engine.
//!
//! This crate is intentionally small and dependency-free. It contains the deterministic pieces that both the
//! expansion engine and host integrations need to agree on:
//! - the heterogeneous [`Value`] a data provider emits,
//! - the immutable [`ParameterRow`] bound to one exploded invocation,
//! - the formatter that turns a row into the `name[index: params]` display name.
//!
//! ## Notes
//!
//! - This is a “semantic core” crate: **no IO**, no global state, no engine-specific types.
//! - Formatting is total: every [`Value`] has a rendering, nothing here returns an error or panics.
//!
//! ## Examples
//! ```rust
//! use dataprovider_core::{display_name, rows};
//!
//! let rows = rows![[1, "One"], [2, "Two"]];
//! assert_eq!(display_name("testFoo", 2, &rows[0]), "testFoo[2: 1, One]");
//! ```

pub mod format;
pub mod row;
pub mod value;

pub use format::{EMPTY_STRING_TOKEN, NULL_TOKEN, display_name, format_parameters};
pub use row::ParameterRow;
pub use value::{OpaqueValue, PrimitiveArray, Value};
