use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use tracing::debug;

/// Accumulates output produced by evaluated code so it can never
/// interleave with protocol frames on the real output stream.
#[derive(Debug, Clone, Default)]
pub struct OutputCapture {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl OutputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope for one evaluating command.
    ///
    /// The scope is the engine's output sink for the duration of the
    /// command. Dropping it drains everything written inside the
    /// scope, on every exit path including unwinding.
    pub fn scope(&self) -> CaptureScope {
        let start = self.buf.borrow().len();
        CaptureScope {
            capture: self.clone(),
            start,
        }
    }

    /// Bytes currently held.
    pub fn pending(&self) -> usize {
        self.buf.borrow().len()
    }
}

/// Drop guard scoping captured output to a single command.
///
/// Scopes nest: a callback served mid-command opens an inner scope,
/// and its drain leaves the outer scope's bytes untouched.
#[derive(Debug)]
pub struct CaptureScope {
    capture: OutputCapture,
    start: usize,
}

impl Write for CaptureScope {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.capture.buf.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for CaptureScope {
    fn drop(&mut self) {
        let mut buf = self.capture.buf.borrow_mut();
        if buf.len() > self.start {
            let drained = buf.split_off(self.start);
            debug!(
                bytes = drained.len(),
                output = %String::from_utf8_lossy(&drained),
                "discarding output captured during command"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_drains_on_drop() {
        let capture = OutputCapture::new();
        {
            let mut scope = capture.scope();
            scope.write_all(b"hello").unwrap();
            assert_eq!(capture.pending(), 5);
        }
        assert_eq!(capture.pending(), 0);
    }

    #[test]
    fn inner_scope_preserves_outer_bytes() {
        let capture = OutputCapture::new();
        let mut outer = capture.scope();
        outer.write_all(b"outer").unwrap();

        {
            let mut inner = capture.scope();
            inner.write_all(b"inner").unwrap();
            assert_eq!(capture.pending(), 10);
        }

        assert_eq!(capture.pending(), 5);
        drop(outer);
        assert_eq!(capture.pending(), 0);
    }

    #[test]
    fn empty_scope_is_a_no_op() {
        let capture = OutputCapture::new();
        drop(capture.scope());
        assert_eq!(capture.pending(), 0);
    }
}
