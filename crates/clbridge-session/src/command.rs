//! Command bytes and payload shapes of the host→worker protocol.
//!
//! Payloads arrive as expressions in the worker's own syntax and are
//! decoded to [`Value`]s by the engine before landing here; these
//! helpers only decompose the already-decoded shapes.

use clbridge_value::Value;

use crate::engine::CallArgs;
use crate::store::AsyncHandle;

/// Evaluate an expression; respond with its value.
pub const EVAL: u8 = b'e';
/// Execute statements; respond with the null value.
pub const EXEC: u8 = b'x';
/// Terminate the worker without responding.
pub const QUIT: u8 = b'q';
/// Answer the innermost pending host callback.
pub const RETURN: u8 = b'r';
/// Call a named function; respond with its value.
pub const CALL: u8 = b'f';
/// Call a named function; respond with a handle and store the result.
pub const CALL_DEFERRED: u8 = b'a';
/// Claim a stored deferred result; the handle is consumed.
pub const RETRIEVE: u8 = b'R';
/// Bind variables; respond with true as acknowledgement.
pub const SET: u8 = b's';

/// Worker→host marker announcing a callback request.
pub const CALLBACK: u8 = b'c';
/// Response marker: success payload follows.
pub const RESULT: u8 = b'r';
/// Response marker: error text follows.
pub const ERROR: u8 = b'e';

/// A payload that decoded to a value of the wrong shape.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PayloadError {
    #[error("call payload must be a (name, arguments) pair, got {0}")]
    NotACallPair(&'static str),

    #[error("call arguments must be a sequence, got {0}")]
    ArgsNotASequence(&'static str),

    #[error("keyword :{0} is missing its value")]
    DanglingKeyword(String),

    #[error("retrieve payload must be an integer handle, got {0}")]
    NotAHandle(&'static str),

    #[error("set payload must be a sequence of (name, value) pairs, got {0}")]
    NotBindings(&'static str),
}

/// Split an `f`/`a` payload into its target name and arguments.
///
/// The argument sequence alternates positional values with
/// keyword-symbol/value pairs: a keyword-marked symbol binds the next
/// value to that parameter name.
pub fn parse_call(payload: &Value) -> Result<(String, CallArgs), PayloadError> {
    let pair = sequence(payload).ok_or(PayloadError::NotACallPair(payload.kind()))?;
    let (name, raw_args) = match pair {
        [Value::Str(name), raw_args] => (name.clone(), raw_args),
        _ => return Err(PayloadError::NotACallPair(payload.kind())),
    };

    let items = sequence(raw_args).ok_or(PayloadError::ArgsNotASequence(raw_args.kind()))?;
    let mut args = CallArgs::default();
    let mut iter = items.iter();
    while let Some(item) = iter.next() {
        if let Some(keyword) = item.keyword_name() {
            let value = iter
                .next()
                .ok_or_else(|| PayloadError::DanglingKeyword(keyword.to_string()))?;
            args.keywords.push((keyword.to_string(), value.clone()));
        } else {
            args.positional.push(item.clone());
        }
    }

    Ok((name, args))
}

/// Decode an `R` payload into the handle it names.
pub fn parse_handle(payload: &Value) -> Result<AsyncHandle, PayloadError> {
    match payload {
        Value::Int(raw) => Ok(AsyncHandle::from_raw(*raw)),
        other => Err(PayloadError::NotAHandle(other.kind())),
    }
}

/// Decode an `s` payload into its (name, value) bindings.
pub fn parse_bindings(payload: &Value) -> Result<Vec<(String, Value)>, PayloadError> {
    let entries = sequence(payload).ok_or(PayloadError::NotBindings(payload.kind()))?;
    let mut bindings = Vec::with_capacity(entries.len());
    for entry in entries {
        match sequence(entry) {
            Some([Value::Str(name), value]) => bindings.push((name.clone(), value.clone())),
            _ => return Err(PayloadError::NotBindings(entry.kind())),
        }
    }
    Ok(bindings)
}

fn sequence(value: &Value) -> Option<&[Value]> {
    match value {
        Value::List(items) | Value::Tuple(items) => Some(items),
        _ => None,
    }
}
