use std::io::Write;

use clbridge_value::Value;

use crate::error::{EngineError, HostError};
use crate::namespace::Namespace;

/// Call arguments split into positionals and keywords, in order of
/// appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keywords: Vec<(String, Value)>,
}

impl CallArgs {
    /// Positional-only arguments.
    pub fn from_positional(positional: Vec<Value>) -> Self {
        Self {
            positional,
            keywords: Vec::new(),
        }
    }
}

/// Everything an engine may touch while running one command.
pub struct EvalContext<'a> {
    /// The persistent evaluation environment.
    pub ns: Namespace,
    /// Bridge for calling back into the host mid-evaluation.
    pub host: &'a mut dyn Host,
    /// Sink for incidental output; never the protocol stream.
    pub out: &'a mut dyn Write,
}

/// The worker-side face of a host callback.
pub trait Host {
    /// Invoke a host-side function and block for its result.
    ///
    /// Keyword arguments are appended after the positional arguments
    /// as keyword-marked symbol/value pairs. The round trip re-enters
    /// the message dispatcher, so the host may issue arbitrary further
    /// commands before answering with a return.
    fn invoke(
        &mut self,
        engine: &mut dyn Engine,
        ident: &str,
        positional: &[Value],
        keywords: &[(String, Value)],
    ) -> Result<Value, HostError>;
}

/// An opaque "eval this code fragment against a persistent namespace"
/// capability.
///
/// Implementations must propagate [`EngineError::Host`] untouched:
/// swallowing it would lose quit and transport unwinding. Everything
/// else an engine reports becomes an error response and the session
/// keeps serving.
pub trait Engine {
    /// Evaluate one value-bearing expression in the worker's own
    /// syntax.
    fn eval(&mut self, code: &str, ctx: &mut EvalContext<'_>) -> Result<Value, EngineError>;

    /// Execute statements for their effect on the namespace.
    fn exec(&mut self, code: &str, ctx: &mut EvalContext<'_>) -> Result<(), EngineError>;

    /// Call a named entry point with already-decoded arguments.
    fn call(
        &mut self,
        target: &str,
        args: CallArgs,
        ctx: &mut EvalContext<'_>,
    ) -> Result<Value, EngineError>;
}
