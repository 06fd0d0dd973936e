//! Worker-side bridge serving a Lisp host over standard streams.
//!
//! The host launches the worker as a child process and drives it over
//! stdin/stdout with length-prefixed text frames. The worker evaluates
//! expressions against a persistent namespace, renders results as
//! host-readable literals, and may call back into the host
//! mid-evaluation.
//!
//! # Crate Structure
//!
//! - [`frame`] — Length-prefixed message framing over byte streams
//! - [`value`] — The exchanged value union and its host literal encoder
//! - [`session`] — Reentrant message dispatch and the engine seam
//! - [`expr`] — The built-in expression-language engine

/// Re-export framing types.
pub mod frame {
    pub use clbridge_frame::*;
}

/// Re-export value types.
pub mod value {
    pub use clbridge_value::*;
}

/// Re-export session types.
pub mod session {
    pub use clbridge_session::*;
}

/// Re-export the built-in engine.
pub mod expr {
    pub use clbridge_expr::*;
}
