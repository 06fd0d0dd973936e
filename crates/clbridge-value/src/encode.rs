//! Rendering of values as host-readable Lisp literal text.

use std::fmt::Write as _;

use crate::array::NdArray;
use crate::value::Value;

/// Host literal shared by the null value and boolean false. The
/// collision is deliberate: the host reader treats them identically,
/// so callers cannot distinguish "no value" from "false" after
/// encoding.
pub const NIL: &str = "NIL";

/// Render a value as host-readable literal text.
///
/// Total and pure: every value yields a non-empty literal, and values
/// the host cannot read fall back to [`NIL`] rather than erroring.
pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    encode_into(&mut out, value);
    out
}

fn encode_into(out: &mut String, value: &Value) {
    match value {
        Value::Null | Value::Bool(false) => out.push_str(NIL),
        Value::Bool(true) => out.push('T'),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => push_float(out, *f),
        Value::Complex { re, im } => {
            out.push_str("#C(");
            push_component(out, *re);
            out.push(' ');
            push_component(out, *im);
            out.push(')');
        }
        Value::Str(s) => push_quoted(out, s),
        Value::Symbol(name) => out.push_str(name),
        Value::List(items) => {
            out.push('#');
            push_seq(out, items);
        }
        Value::Tuple(items) => push_seq(out, items),
        Value::Mapping(entries) => push_table(out, entries),
        Value::Array(array) => push_array(out, array),
        Value::Opaque(opaque) => match opaque.render() {
            Some(literal) => out.push_str(&literal),
            None => out.push_str(NIL),
        },
    }
}

/// `{:?}` keeps a decimal point or exponent on every finite float
/// (`1.0`, `0.25`, `1e300`), so the host reader sees a float, not an
/// integer. Locale independent.
fn push_float(out: &mut String, f: f64) {
    let _ = write!(out, "{f:?}");
}

/// Complex components print as integers when they are integral, so a
/// Gaussian-integer-like value reads back as `#C(3 4)`.
fn push_component(out: &mut String, c: f64) {
    if c.is_finite() && c == c.trunc() && c.abs() < 9e15 {
        let _ = write!(out, "{}", c as i64);
    } else {
        push_float(out, c);
    }
}

fn push_quoted(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        if ch == '\\' || ch == '"' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
}

fn push_seq(out: &mut String, items: &[Value]) {
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        encode_into(out, item);
    }
    out.push(')');
}

/// A mapping is not a passive literal: it renders as a read-time
/// evaluated form that builds and fills a string-equality hash table.
fn push_table(out: &mut String, entries: &[(Value, Value)]) {
    out.push_str("#.(let ((table (make-hash-table :test 'equal)))");
    for (key, value) in entries {
        out.push_str(" (setf (gethash ");
        encode_into(out, key);
        out.push_str(" table) ");
        encode_into(out, value);
        out.push(')');
    }
    out.push_str(" table)");
}

fn push_array(out: &mut String, array: &NdArray) {
    let _ = write!(out, "#{}A", array.rank());
    push_axis(out, array.shape(), array.elements());
}

fn push_axis(out: &mut String, shape: &[usize], data: &[Value]) {
    out.push('(');
    if shape.len() == 1 {
        for (i, item) in data.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            encode_into(out, item);
        }
    } else if shape[1..].iter().product::<usize>() == 0 {
        // An inner axis is empty; emit the right number of empty rows.
        for i in 0..shape[0] {
            if i > 0 {
                out.push(' ');
            }
            push_axis(out, &shape[1..], &[]);
        }
    } else {
        let stride: usize = shape[1..].iter().product();
        for (i, chunk) in data.chunks(stride).enumerate() {
            if i > 0 {
                out.push(' ');
            }
            push_axis(out, &shape[1..], chunk);
        }
    }
    out.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Opaque, OpaqueValue};

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    #[test]
    fn booleans_and_null() {
        assert_eq!(encode(&Value::Bool(true)), "T");
        assert_eq!(encode(&Value::Bool(false)), "NIL");
        assert_eq!(encode(&Value::Null), "NIL");
    }

    #[test]
    fn integers() {
        assert_eq!(encode(&Value::Int(0)), "0");
        assert_eq!(encode(&Value::Int(-42)), "-42");
        assert_eq!(encode(&Value::Int(i64::MAX)), "9223372036854775807");
    }

    #[test]
    fn floats_keep_a_decimal_point() {
        assert_eq!(encode(&Value::Float(1.0)), "1.0");
        assert_eq!(encode(&Value::Float(0.25)), "0.25");
        assert_eq!(encode(&Value::Float(-3.5)), "-3.5");
    }

    #[test]
    fn complex_with_integral_components() {
        assert_eq!(encode(&Value::Complex { re: 3.0, im: 4.0 }), "#C(3 4)");
    }

    #[test]
    fn complex_with_fractional_components() {
        assert_eq!(
            encode(&Value::Complex { re: 1.5, im: -0.5 }),
            "#C(1.5 -0.5)"
        );
    }

    #[test]
    fn strings_escape_backslash_and_quote_only() {
        assert_eq!(encode(&Value::Str("a\"b".into())), "\"a\\\"b\"");
        assert_eq!(encode(&Value::Str("a\\b".into())), "\"a\\\\b\"");
        assert_eq!(encode(&Value::Str("tab\there".into())), "\"tab\there\"");
    }

    #[test]
    fn symbols_are_bare() {
        assert_eq!(encode(&Value::Symbol("my-symbol".into())), "my-symbol");
        assert_eq!(encode(&Value::Symbol(":keyword".into())), ":keyword");
    }

    #[test]
    fn list_encodes_as_vector_literal() {
        assert_eq!(encode(&Value::List(ints(&[1, 2]))), "#(1 2)");
        assert_eq!(encode(&Value::List(vec![])), "#()");
    }

    #[test]
    fn tuple_encodes_as_list_literal() {
        assert_eq!(encode(&Value::Tuple(ints(&[1, 2]))), "(1 2)");
        assert_eq!(encode(&Value::Tuple(vec![])), "()");
    }

    #[test]
    fn tuple_and_list_sigils_differ_for_equal_elements() {
        let elems = ints(&[7, 8, 9]);
        let list = encode(&Value::List(elems.clone()));
        let tuple = encode(&Value::Tuple(elems));
        assert_ne!(list, tuple);
        assert_eq!(list, format!("#{tuple}"));
    }

    #[test]
    fn nested_sequences() {
        let value = Value::Tuple(vec![
            Value::Int(1),
            Value::List(ints(&[2, 3])),
            Value::Str("x".into()),
        ]);
        assert_eq!(encode(&value), "(1 #(2 3) \"x\")");
    }

    #[test]
    fn mapping_builds_an_equal_hash_table() {
        let value = Value::Mapping(vec![
            (Value::Str("a".into()), Value::Int(1)),
            (Value::Int(2), Value::Str("b".into())),
        ]);
        assert_eq!(
            encode(&value),
            "#.(let ((table (make-hash-table :test 'equal))) \
             (setf (gethash \"a\" table) 1) \
             (setf (gethash 2 table) \"b\") table)"
        );
    }

    #[test]
    fn empty_mapping_still_yields_a_table() {
        assert_eq!(
            encode(&Value::Mapping(vec![])),
            "#.(let ((table (make-hash-table :test 'equal))) table)"
        );
    }

    #[test]
    fn rank_one_array_is_flat() {
        let array = NdArray::vector(ints(&[1, 2, 3]));
        assert_eq!(encode(&Value::Array(array)), "#1A(1 2 3)");
    }

    #[test]
    fn rank_two_array_recurses_along_axis_zero() {
        let array = NdArray::new(vec![2, 2], ints(&[1, 2, 3, 4])).unwrap();
        assert_eq!(encode(&Value::Array(array)), "#2A((1 2) (3 4))");
    }

    #[test]
    fn rank_three_array_nests_fully() {
        let array = NdArray::new(vec![2, 2, 2], ints(&[1, 2, 3, 4, 5, 6, 7, 8])).unwrap();
        assert_eq!(
            encode(&Value::Array(array)),
            "#3A(((1 2) (3 4)) ((5 6) (7 8)))"
        );
    }

    #[test]
    fn array_with_empty_inner_axis() {
        let array = NdArray::new(vec![2, 0], vec![]).unwrap();
        assert_eq!(encode(&Value::Array(array)), "#2A(() ())");
    }

    struct Unrenderable;

    impl OpaqueValue for Unrenderable {
        fn type_name(&self) -> &str {
            "unrenderable"
        }
    }

    struct Renderable;

    impl OpaqueValue for Renderable {
        fn type_name(&self) -> &str {
            "renderable"
        }

        fn render(&self) -> Option<String> {
            Some("#S(POINT :X 1)".to_string())
        }
    }

    #[test]
    fn opaque_falls_back_to_nil() {
        assert_eq!(encode(&Value::Opaque(Opaque::new(Unrenderable))), "NIL");
    }

    #[test]
    fn opaque_may_supply_its_own_literal() {
        assert_eq!(
            encode(&Value::Opaque(Opaque::new(Renderable))),
            "#S(POINT :X 1)"
        );
    }

    #[test]
    fn every_kind_encodes_non_empty() {
        let samples = vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(1),
            Value::Float(1.5),
            Value::Complex { re: 0.0, im: 0.0 },
            Value::Str(String::new()),
            Value::Symbol("s".into()),
            Value::List(vec![]),
            Value::Tuple(vec![]),
            Value::Mapping(vec![]),
            Value::Array(NdArray::vector(vec![])),
            Value::Opaque(Opaque::new(Unrenderable)),
        ];
        for value in samples {
            assert!(!encode(&value).is_empty(), "empty literal for {value:?}");
        }
    }
}
