use std::collections::HashMap;
use std::fmt;

use clbridge_value::Value;

/// Opaque identifier for one deferred call. Monotonically assigned,
/// unique for the life of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AsyncHandle(i64);

impl AsyncHandle {
    pub fn from_raw(raw: i64) -> Self {
        AsyncHandle(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AsyncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The handle was never allocated or its result was already taken.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown async handle {0}")]
pub struct UnknownHandle(pub i64);

/// Outcome of a deferred call: the value, or the error text that will
/// be surfaced when the result is retrieved.
pub type DeferredResult = std::result::Result<Value, String>;

/// Holds results of deferred calls until claimed.
///
/// Deferred calls are not concurrent: the call has already run to
/// completion by the time its result is stored. The store only
/// decouples call-issue from result-retrieval so the host can
/// interleave other messages in between.
#[derive(Debug, Default)]
pub struct AsyncStore {
    next: i64,
    results: HashMap<i64, DeferredResult>,
}

impl AsyncStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh handle.
    pub fn allocate(&mut self) -> AsyncHandle {
        let handle = AsyncHandle(self.next);
        self.next += 1;
        handle
    }

    /// Record the outcome for a handle.
    pub fn store(&mut self, handle: AsyncHandle, result: DeferredResult) {
        self.results.insert(handle.0, result);
    }

    /// Claim a stored outcome, consuming the handle.
    pub fn take(&mut self, handle: AsyncHandle) -> Result<DeferredResult, UnknownHandle> {
        self.results
            .remove(&handle.0)
            .ok_or(UnknownHandle(handle.0))
    }

    /// Number of unclaimed results.
    pub fn pending(&self) -> usize {
        self.results.len()
    }
}
