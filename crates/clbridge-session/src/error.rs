use clbridge_frame::FrameError;

/// Fatal session failures.
///
/// Only framing-level corruption lands here; anything that goes wrong
/// inside a command is reported to the host as an `e`-marked response
/// and the session keeps serving.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Failures surfaced by the callback bridge.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The channel failed while the callback round trip was in flight.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The host sent `q` while a callback was pending.
    #[error("quit received during host callback")]
    Quit,

    /// Callback nesting exceeded the configured bound. Raised before
    /// the callback request is written, so it is recoverable.
    #[error("host callback depth exceeded (max {max})")]
    DepthExceeded { max: usize },
}

/// Failures surfaced by an evaluation engine.
///
/// `Failure` is recoverable and becomes an error response. `Host`
/// carries quit/transport unwinding and must be propagated untouched
/// by engine implementations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    Failure(String),

    #[error(transparent)]
    Host(#[from] HostError),
}

impl EngineError {
    /// Recoverable failure with the given description.
    pub fn failure(message: impl Into<String>) -> Self {
        EngineError::Failure(message.into())
    }
}
