/// Errors that can occur while framing or deframing messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The length line is missing, empty, or not ASCII decimal digits.
    #[error("invalid length line {0:?}")]
    InvalidLength(String),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The payload is not valid UTF-8 text.
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// An I/O error occurred while reading or writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel closed before a complete message arrived.
    #[error("channel closed (incomplete message)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
