use std::fmt;
use std::rc::Rc;

use crate::array::NdArray;

/// Prefix that turns a [`Value::Symbol`] into a keyword-argument name
/// inside call payloads.
pub const KEYWORD_MARKER: char = ':';

/// A runtime value crossing the host↔worker boundary.
///
/// The union is closed: anything outside it is wrapped as
/// [`Value::Opaque`] and encodes as the host nil literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex { re: f64, im: f64 },
    Str(String),
    /// A bare, unquoted name readable by the host.
    Symbol(String),
    /// Encodes as a host vector literal, `#(…)`.
    List(Vec<Value>),
    /// Encodes as a host list literal, `(…)`.
    Tuple(Vec<Value>),
    /// Ordered key/value pairs; keys compare by deep equality.
    Mapping(Vec<(Value, Value)>),
    Array(NdArray),
    Opaque(Opaque),
}

impl Value {
    /// Keyword name if this is a keyword-marked symbol.
    pub fn keyword_name(&self) -> Option<&str> {
        match self {
            Value::Symbol(name) => name.strip_prefix(KEYWORD_MARKER),
            _ => None,
        }
    }

    /// Symbol carrying the keyword marker for `name`.
    pub fn keyword(name: &str) -> Value {
        Value::Symbol(format!("{KEYWORD_MARKER}{name}"))
    }

    /// Human-readable kind tag, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Complex { .. } => "complex",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Mapping(_) => "mapping",
            Value::Array(_) => "array",
            Value::Opaque(_) => "opaque",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Externally defined value admitted into the closed union.
///
/// This is the extension point for types the worker does not model:
/// an implementation may supply its own host literal via [`render`],
/// or leave the default and encode as nil.
///
/// [`render`]: OpaqueValue::render
pub trait OpaqueValue {
    /// Type tag used in diagnostics.
    fn type_name(&self) -> &str;

    /// Optional host literal. `None` falls back to the nil literal.
    fn render(&self) -> Option<String> {
        None
    }
}

/// Shared handle to an externally defined value.
///
/// Equality is identity: two handles are equal only when they point at
/// the same underlying object.
#[derive(Clone)]
pub struct Opaque(Rc<dyn OpaqueValue>);

impl Opaque {
    pub fn new(inner: impl OpaqueValue + 'static) -> Self {
        Opaque(Rc::new(inner))
    }

    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    pub fn render(&self) -> Option<String> {
        self.0.render()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    impl OpaqueValue for Marker {
        fn type_name(&self) -> &str {
            "marker"
        }
    }

    #[test]
    fn keyword_round_trip() {
        let kw = Value::keyword("scale");
        assert_eq!(kw, Value::Symbol(":scale".to_string()));
        assert_eq!(kw.keyword_name(), Some("scale"));
    }

    #[test]
    fn plain_symbol_is_not_a_keyword() {
        assert_eq!(Value::Symbol("scale".to_string()).keyword_name(), None);
        assert_eq!(Value::Str(":scale".to_string()).keyword_name(), None);
    }

    #[test]
    fn deep_equality_on_sequences() {
        let a = Value::List(vec![Value::Int(1), Value::Str("x".into())]);
        let b = Value::List(vec![Value::Int(1), Value::Str("x".into())]);
        assert_eq!(a, b);
        assert_ne!(a, Value::Tuple(vec![Value::Int(1), Value::Str("x".into())]));
    }

    #[test]
    fn opaque_equality_is_identity() {
        let a = Opaque::new(Marker);
        let b = a.clone();
        let c = Opaque::new(Marker);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
