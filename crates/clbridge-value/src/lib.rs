//! Runtime values and their host-readable literal encoding.
//!
//! The worker exchanges exactly one data shape with its host: [`Value`],
//! a closed tagged union. [`encode`] renders any value as literal text
//! the host reader can consume; values outside the host-readable set
//! degrade to the nil literal instead of failing.

pub mod array;
pub mod encode;
pub mod value;

pub use array::{NdArray, ShapeError};
pub use encode::{encode, NIL};
pub use value::{Opaque, OpaqueValue, Value, KEYWORD_MARKER};
