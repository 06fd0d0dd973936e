use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::codec::{decode_message, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads command bytes and complete length-prefixed messages from any
/// `Read` stream.
///
/// Handles partial reads internally so callers always get complete
/// messages. Command and marker bytes share the buffer with framed
/// payloads, so interleaving the two never loses data.
pub struct MessageReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read a single unframed byte (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_byte(&mut self) -> Result<u8> {
        loop {
            if let Some(&byte) = self.buf.first() {
                self.buf.advance(1);
                return Ok(byte);
            }
            self.fill()?;
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached
    /// before the message completes.
    pub fn read_message(&mut self) -> Result<String> {
        loop {
            if let Some(message) = decode_message(&mut self.buf, self.config.max_payload_size)? {
                return Ok(message);
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = match self.inner.read(&mut chunk) {
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => return Ok(()),
            Err(err) => return Err(FrameError::Io(err)),
        };

        if read == 0 {
            return Err(FrameError::ConnectionClosed);
        }

        self.buf.extend_from_slice(&chunk[..read]);
        Ok(())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent message decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn wire(text: &str) -> Vec<u8> {
        format!("{}\n{}", text.len(), text).into_bytes()
    }

    #[test]
    fn read_single_message() {
        let mut reader = MessageReader::new(Cursor::new(wire("hello")));
        assert_eq!(reader.read_message().unwrap(), "hello");
    }

    #[test]
    fn read_multiple_messages() {
        let mut bytes = wire("one");
        bytes.extend(wire("two"));
        bytes.extend(wire("three"));

        let mut reader = MessageReader::new(Cursor::new(bytes));

        assert_eq!(reader.read_message().unwrap(), "one");
        assert_eq!(reader.read_message().unwrap(), "two");
        assert_eq!(reader.read_message().unwrap(), "three");
    }

    #[test]
    fn command_byte_then_message() {
        let mut bytes = vec![b'e'];
        bytes.extend(wire("1 + 2"));
        bytes.push(b'q');

        let mut reader = MessageReader::new(Cursor::new(bytes));

        assert_eq!(reader.read_byte().unwrap(), b'e');
        assert_eq!(reader.read_message().unwrap(), "1 + 2");
        assert_eq!(reader.read_byte().unwrap(), b'q');
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: wire("slow"),
            pos: 0,
        };
        let mut reader = MessageReader::new(byte_reader);

        assert_eq!(reader.read_message().unwrap(), "slow");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = MessageReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_byte().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_message() {
        let mut reader = MessageReader::new(Cursor::new(b"10\nonly-par".to_vec()));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn invalid_length_in_stream() {
        let mut reader = MessageReader::new(Cursor::new(b"abc\nxyz".to_vec()));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength(_)));
    }

    #[test]
    fn oversized_message_in_stream() {
        let cfg = FrameConfig {
            max_payload_size: 4,
        };
        let mut reader = MessageReader::with_config(Cursor::new(wire("oversized")), cfg);
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            state: 0,
            bytes: wire("ok"),
            pos: 0,
        };
        let mut framed = MessageReader::new(reader);

        assert_eq!(framed.read_message().unwrap(), "ok");
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = MessageReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        reader.set_max_payload_size(32);
        assert_eq!(reader.config().max_payload_size, 32);
        let _inner = reader.into_inner();
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}
