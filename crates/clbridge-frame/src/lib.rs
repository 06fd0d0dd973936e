//! Length-line message framing for the worker↔host byte channel.
//!
//! Every message is framed as an ASCII decimal byte length, a newline,
//! and exactly that many raw payload bytes. There is no delimiter after
//! the payload. Command and response-marker bytes travel unframed,
//! immediately before the message they qualify.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_message, encode_message, FrameConfig, DEFAULT_MAX_PAYLOAD};
pub use error::{FrameError, Result};
pub use reader::MessageReader;
pub use writer::MessageWriter;
