//! Render parameter rows for invocation display names.
//!
//! ## Rules (applied per element, joined with `", "`)
//! - `Null` → `<null>`
//! - empty string → `<empty string>`
//! - primitive sequence → canonical sequence rendering, e.g. `[1, 2, 3]`
//! - nested value sequence → recursively formatted, wrapped in `[` `]`
//! - anything else → its `Display` rendering
//!
//! ## Notes
//! - Floats render with a fractional part (`1.0`, not `1`) both as scalars and inside primitive sequences.
//!   Non-finite floats render as `NaN`, `Infinity` and `-Infinity`. Very large or small magnitudes keep the
//!   shortest round-trip exponent form (`1e20`, `1e-7`).
//! - The display name of an exploded invocation is `<base>[<index>: <formatted-row>]`; the index prefix is
//!   what keeps names distinct when two rows format identically.

use std::fmt::Debug;

use crate::value::{PrimitiveArray, Value};

/// Token rendered for an absent value.
pub const NULL_TOKEN: &str = "<null>";
/// Token rendered for an empty string.
pub const EMPTY_STRING_TOKEN: &str = "<empty string>";

const SEPARATOR: &str = ", ";

/// Format a row of values as a comma-separated string.
///
/// ## Parameters
/// - `values`: the row to render.
///
/// ## Returns
/// - `String`: the rendered row; empty for an empty row.
///
/// ## Examples
/// ```rust
/// use dataprovider_core::{Value, format_parameters};
///
/// assert_eq!(format_parameters(&[Value::Null, Value::from("")]), "<null>, <empty string>");
/// assert_eq!(format_parameters(&[Value::from(vec![1, 2]), Value::from(vec!["a"])]), "[1, 2], [a]");
/// ```
pub fn format_parameters(values: &[Value]) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(SEPARATOR);
        }
        push_value(&mut out, value);
    }
    out
}

/// Build the display name of one exploded invocation.
///
/// ## Parameters
/// - `base`: the test method name.
/// - `index`: 1-based position of the row within its group.
/// - `values`: the bound row.
///
/// ## Returns
/// - `String`: `<base>[<index>: <formatted-row>]`.
pub fn display_name(base: &str, index: usize, values: &[Value]) -> String {
    format!("{}[{}: {}]", base, index, format_parameters(values))
}

/// Format a single value with the row rules.
pub(crate) fn format_value(value: &Value) -> String {
    let mut out = String::new();
    push_value(&mut out, value);
    out
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str(NULL_TOKEN),
        Value::Str(s) if s.is_empty() => out.push_str(EMPTY_STRING_TOKEN),
        Value::Str(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(&b.to_string()),
        Value::Char(c) => out.push(*c),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Float(n) => out.push_str(&debug_float(n)),
        Value::Primitive(array) => push_primitive(out, array),
        Value::Array(values) => {
            out.push('[');
            out.push_str(&format_parameters(values));
            out.push(']');
        }
        Value::Opaque(object) => out.push_str(&object.to_string()),
    }
}

fn push_primitive(out: &mut String, array: &PrimitiveArray) {
    match array {
        PrimitiveArray::Bool(v) => push_sequence(out, v, |b| b.to_string()),
        PrimitiveArray::Byte(v) => push_sequence(out, v, |n| n.to_string()),
        PrimitiveArray::Char(v) => push_sequence(out, v, |c| c.to_string()),
        PrimitiveArray::Short(v) => push_sequence(out, v, |n| n.to_string()),
        PrimitiveArray::Int(v) => push_sequence(out, v, |n| n.to_string()),
        PrimitiveArray::Long(v) => push_sequence(out, v, |n| n.to_string()),
        PrimitiveArray::Float(v) => push_sequence(out, v, debug_float),
        PrimitiveArray::Double(v) => push_sequence(out, v, debug_float),
    }
}

fn debug_float<T: Debug + Copy + Into<f64>>(n: &T) -> String {
    let wide: f64 = (*n).into();
    if wide.is_nan() {
        "NaN".to_string()
    } else if wide.is_infinite() {
        if wide < 0.0 { "-Infinity" } else { "Infinity" }.to_string()
    } else {
        format!("{:?}", n)
    }
}

fn push_sequence<T>(out: &mut String, items: &[T], render: impl Fn(&T) -> String) {
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(SEPARATOR);
        }
        out.push_str(&render(item));
    }
    out.push(']');
}
