//! Display-name formatting through the public API: token shape, collision handling and sequence rendering.

use std::collections::HashSet;

use dataprovider_core::{
    EMPTY_STRING_TOKEN, NULL_TOKEN, OpaqueValue, PrimitiveArray, Value, display_name, format_parameters, rows,
};

#[test]
fn special_tokens_are_bracketed_and_distinct() {
    assert_ne!(NULL_TOKEN, EMPTY_STRING_TOKEN);
    for token in [NULL_TOKEN, EMPTY_STRING_TOKEN] {
        assert!(token.starts_with('<') && token.ends_with('>'), "token not bracketed: {}", token);
    }
}

#[test]
fn colliding_rows_get_distinct_names() {
    let rows = rows![[1, "x"], [1, "x"], [1, "x"]];
    let mut seen = HashSet::new();
    for (i, row) in rows.iter().enumerate() {
        let name = display_name("dup", i + 1, row);
        assert!(seen.insert(name.clone()), "duplicate display name {}", name);
    }
}

#[test]
fn every_primitive_kind_renders_bracketed() {
    let arrays = [
        PrimitiveArray::Bool(vec![true, false]),
        PrimitiveArray::Byte(vec![-1, 2]),
        PrimitiveArray::Char(vec!['a', 'z']),
        PrimitiveArray::Short(vec![300]),
        PrimitiveArray::Int(vec![1, 2, 3]),
        PrimitiveArray::Long(vec![i64::MAX]),
        PrimitiveArray::Float(vec![1.5]),
        PrimitiveArray::Double(vec![2.0, -0.25]),
    ];
    let expected = [
        "[true, false]",
        "[-1, 2]",
        "[a, z]",
        "[300]",
        "[1, 2, 3]",
        "[9223372036854775807]",
        "[1.5]",
        "[2.0, -0.25]",
    ];

    for (array, want) in arrays.into_iter().zip(expected) {
        assert_eq!(format_parameters(&[Value::Primitive(array)]), want);
    }
}

#[test]
fn mixed_row_matches_documented_rendering() {
    let row = [
        Value::from(1),
        Value::Null,
        Value::from(""),
        Value::from(vec![1, 2]),
        Value::Array(vec![Value::from("a"), Value::Null]),
        Value::Opaque(OpaqueValue::new("custom")),
    ];
    assert_eq!(
        format_parameters(&row),
        "1, <null>, <empty string>, [1, 2], [a, <null>], custom"
    );
}
