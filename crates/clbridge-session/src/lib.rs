//! Reentrant message dispatch for the worker side of the bridge.
//!
//! One [`Session`] serves one host over a duplex byte channel:
//! evaluate/execute/call/set requests flow in, marked responses flow
//! out, and code running in the worker may call back into the host
//! mid-command through the [`Host`] bridge, which re-enters the
//! dispatcher. Responses carry no correlation identifiers; a return
//! always answers the innermost pending callback, last-in-first-out.

pub mod capture;
pub mod command;
pub mod engine;
pub mod error;
pub mod namespace;
pub mod session;
pub mod store;

pub use capture::{CaptureScope, OutputCapture};
pub use engine::{CallArgs, Engine, EvalContext, Host};
pub use error::{EngineError, HostError, Result, SessionError};
pub use namespace::Namespace;
pub use session::{Session, SessionConfig, SessionExit, DEFAULT_MAX_DEPTH};
pub use store::{AsyncHandle, AsyncStore, DeferredResult, UnknownHandle};
