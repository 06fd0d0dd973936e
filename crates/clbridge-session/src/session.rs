use std::io::{Read, Write};

use tracing::{debug, trace, warn};

use clbridge_frame::{FrameConfig, MessageReader, MessageWriter};
use clbridge_value::{encode, Value};

use crate::capture::OutputCapture;
use crate::command;
use crate::engine::{Engine, EvalContext, Host};
use crate::error::{EngineError, HostError, SessionError};
use crate::namespace::Namespace;
use crate::store::AsyncStore;

/// Default callback nesting bound.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Tunables for one worker session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum callback nesting depth.
    pub max_depth: usize,
    /// Maximum framed payload size in bytes.
    pub max_payload_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_payload_size: clbridge_frame::DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionExit {
    /// The host sent `q`.
    Quit,
    /// The host sent a top-level `r` with no callback pending.
    Return(Value),
}

/// How one dispatch loop invocation ends.
enum LoopExit {
    Quit,
    Return(Value),
}

/// One worker session over a duplex byte channel.
///
/// Single-threaded and blocking. The only concurrency structure is the
/// dispatcher's own recursion while a host callback is pending: each
/// callback pushes one nested dispatch loop, and a return command pops
/// exactly the innermost one. No message carries a correlation
/// identifier; the protocol relies on this strict last-in-first-out
/// discipline.
pub struct Session<R, W> {
    reader: MessageReader<R>,
    writer: MessageWriter<W>,
    ns: Namespace,
    store: AsyncStore,
    capture: OutputCapture,
    depth: usize,
    config: SessionConfig,
}

impl<R: Read, W: Write> Session<R, W> {
    /// Create a session with default configuration.
    pub fn new(input: R, output: W) -> Self {
        Self::with_config(input, output, SessionConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(input: R, output: W, config: SessionConfig) -> Self {
        let frame_config = FrameConfig {
            max_payload_size: config.max_payload_size,
        };
        Self {
            reader: MessageReader::with_config(input, frame_config.clone()),
            writer: MessageWriter::with_config(output, frame_config),
            ns: Namespace::new(),
            store: AsyncStore::new(),
            capture: OutputCapture::new(),
            depth: 0,
            config,
        }
    }

    /// The session's evaluation environment.
    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    /// Serve commands until the host ends the session.
    ///
    /// Recoverable faults are answered with error responses and do not
    /// end the loop; only framing corruption returns `Err`.
    pub fn run(&mut self, engine: &mut dyn Engine) -> Result<SessionExit, SessionError> {
        match self.dispatch_loop(engine)? {
            LoopExit::Quit => Ok(SessionExit::Quit),
            LoopExit::Return(value) => {
                warn!("return received with no callback pending; ending session");
                Ok(SessionExit::Return(value))
            }
        }
    }

    /// One dispatch loop invocation: the outermost serve loop, or a
    /// nested one opened by a pending callback.
    fn dispatch_loop(&mut self, engine: &mut dyn Engine) -> Result<LoopExit, SessionError> {
        loop {
            let cmd = self.reader.read_byte()?;
            trace!(cmd = %char::from(cmd), depth = self.depth, "dispatch");
            if let Some(exit) = self.dispatch(engine, cmd)? {
                return Ok(exit);
            }
        }
    }

    fn dispatch(
        &mut self,
        engine: &mut dyn Engine,
        cmd: u8,
    ) -> Result<Option<LoopExit>, SessionError> {
        match cmd {
            command::EVAL => {
                let code = self.reader.read_message()?;
                let result = self.with_engine(engine, |engine, ctx| engine.eval(&code, ctx));
                self.complete(result)
            }
            command::EXEC => {
                let code = self.reader.read_message()?;
                let result = self
                    .with_engine(engine, |engine, ctx| engine.exec(&code, ctx))
                    .map(|()| Value::Null);
                self.complete(result)
            }
            command::QUIT => Ok(Some(LoopExit::Quit)),
            command::RETURN => match self.recv_value(engine)? {
                Ok(value) => Ok(Some(LoopExit::Return(value))),
                // The payload failed to decode; the callback that is
                // waiting for this return stays pending.
                Err(err) => self.complete(Err(err)),
            },
            command::CALL => {
                let result = match self.recv_value(engine)? {
                    Ok(payload) => self.run_call(engine, &payload),
                    Err(err) => Err(err),
                };
                self.complete(result)
            }
            command::CALL_DEFERRED => self.run_deferred(engine),
            command::RETRIEVE => {
                let result = match self.recv_value(engine)? {
                    Ok(payload) => self.retrieve(&payload),
                    Err(err) => Err(err),
                };
                self.complete(result)
            }
            command::SET => {
                let result = match self.recv_value(engine)? {
                    Ok(payload) => self.bind_all(&payload),
                    Err(err) => Err(err),
                };
                self.complete(result)
            }
            other => {
                self.send_error(&format!("unknown message type '{}'", char::from(other)))?;
                Ok(None)
            }
        }
    }

    /// Read a framed payload and decode it through the engine: payloads
    /// travel host→worker in the worker's own expression syntax.
    ///
    /// The outer `Result` is fatal framing failure; the inner one is a
    /// recoverable decode failure.
    fn recv_value(
        &mut self,
        engine: &mut dyn Engine,
    ) -> Result<Result<Value, EngineError>, SessionError> {
        let text = self.reader.read_message()?;
        Ok(self.with_engine(engine, |engine, ctx| engine.eval(&text, ctx)))
    }

    /// Run one engine operation with namespace, callback bridge, and a
    /// scoped output sink. The sink drains when the scope drops, on
    /// every exit path.
    fn with_engine<F, T>(&mut self, engine: &mut dyn Engine, op: F) -> Result<T, EngineError>
    where
        F: FnOnce(&mut dyn Engine, &mut EvalContext<'_>) -> Result<T, EngineError>,
    {
        let ns = self.ns.clone();
        let mut sink = self.capture.scope();
        let mut ctx = EvalContext {
            ns,
            host: self,
            out: &mut sink,
        };
        op(engine, &mut ctx)
    }

    fn run_call(
        &mut self,
        engine: &mut dyn Engine,
        payload: &Value,
    ) -> Result<Value, EngineError> {
        let (target, args) =
            command::parse_call(payload).map_err(|err| EngineError::failure(err.to_string()))?;
        self.with_engine(engine, |engine, ctx| engine.call(&target, args, ctx))
    }

    /// A deferred call: the handle goes out first, then the call runs
    /// to completion and its outcome (success or error alike) is
    /// parked in the store until retrieved.
    fn run_deferred(&mut self, engine: &mut dyn Engine) -> Result<Option<LoopExit>, SessionError> {
        let parsed = match self.recv_value(engine)? {
            Ok(payload) => {
                command::parse_call(&payload).map_err(|err| EngineError::failure(err.to_string()))
            }
            Err(err) => Err(err),
        };
        let (target, args) = match parsed {
            Ok(call) => call,
            Err(err) => return self.complete(Err(err)),
        };

        let handle = self.store.allocate();
        self.send_result(&Value::Int(handle.raw()))?;
        debug!(%handle, %target, "running deferred call");

        let outcome = self.with_engine(engine, |engine, ctx| engine.call(&target, args, ctx));
        match outcome {
            Ok(value) => {
                self.store.store(handle, Ok(value));
                Ok(None)
            }
            Err(EngineError::Failure(message)) => {
                self.store.store(handle, Err(message));
                Ok(None)
            }
            Err(EngineError::Host(err @ HostError::DepthExceeded { .. })) => {
                self.store.store(handle, Err(err.to_string()));
                Ok(None)
            }
            Err(EngineError::Host(HostError::Quit)) => Ok(Some(LoopExit::Quit)),
            Err(EngineError::Host(HostError::Frame(err))) => Err(SessionError::Frame(err)),
        }
    }

    fn retrieve(&mut self, payload: &Value) -> Result<Value, EngineError> {
        let handle =
            command::parse_handle(payload).map_err(|err| EngineError::failure(err.to_string()))?;
        match self.store.take(handle) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(EngineError::Failure(message)),
            Err(unknown) => Err(EngineError::failure(unknown.to_string())),
        }
    }

    fn bind_all(&mut self, payload: &Value) -> Result<Value, EngineError> {
        let bindings = command::parse_bindings(payload)
            .map_err(|err| EngineError::failure(err.to_string()))?;
        for (name, value) in bindings {
            self.ns.set(name, value);
        }
        Ok(Value::Bool(true))
    }

    /// Convert one command's outcome into exactly one marked response,
    /// or into loop unwinding when the engine surfaced a host fault.
    fn complete(
        &mut self,
        result: Result<Value, EngineError>,
    ) -> Result<Option<LoopExit>, SessionError> {
        match result {
            Ok(value) => {
                self.send_result(&value)?;
                Ok(None)
            }
            Err(EngineError::Failure(message)) => {
                self.send_error(&message)?;
                Ok(None)
            }
            Err(EngineError::Host(err @ HostError::DepthExceeded { .. })) => {
                self.send_error(&err.to_string())?;
                Ok(None)
            }
            Err(EngineError::Host(HostError::Quit)) => Ok(Some(LoopExit::Quit)),
            Err(EngineError::Host(HostError::Frame(err))) => Err(SessionError::Frame(err)),
        }
    }

    fn send_result(&mut self, value: &Value) -> Result<(), SessionError> {
        self.writer.send_marked(command::RESULT, &encode(value))?;
        Ok(())
    }

    fn send_error(&mut self, message: &str) -> Result<(), SessionError> {
        debug!(message, "command failed");
        self.writer
            .send_marked(command::ERROR, &encode(&Value::Str(message.to_string())))?;
        Ok(())
    }
}

impl<R: Read, W: Write> Host for Session<R, W> {
    fn invoke(
        &mut self,
        engine: &mut dyn Engine,
        ident: &str,
        positional: &[Value],
        keywords: &[(String, Value)],
    ) -> Result<Value, HostError> {
        if self.depth >= self.config.max_depth {
            return Err(HostError::DepthExceeded {
                max: self.config.max_depth,
            });
        }

        let mut combined = positional.to_vec();
        for (name, value) in keywords {
            combined.push(Value::keyword(name));
            combined.push(value.clone());
        }
        let request = Value::Tuple(vec![
            Value::Str(ident.to_string()),
            Value::Tuple(combined),
        ]);

        debug!(ident, depth = self.depth, "calling back into host");
        self.writer
            .send_marked(command::CALLBACK, &encode(&request))?;

        // Serve the host until this nesting level's return arrives.
        self.depth += 1;
        let exit = self.dispatch_loop(engine);
        self.depth -= 1;

        match exit {
            Ok(LoopExit::Return(value)) => Ok(value),
            Ok(LoopExit::Quit) => Err(HostError::Quit),
            Err(SessionError::Frame(err)) => Err(HostError::Frame(err)),
        }
    }
}
