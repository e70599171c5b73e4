//! Session Streams
//!
//! Sessions hold their standard streams as shared handles so derived
//! sessions can reuse or replace them independently. Write failures never
//! abort evaluation: they are logged and dropped, like a shell writing to a
//! closed pipe.

use std::cell::RefCell;
use std::io::{self, BufRead, Cursor, Write};
use std::rc::Rc;

use tracing::warn;

pub type OutStream = Rc<RefCell<dyn Write>>;
pub type InStream = Rc<RefCell<dyn BufRead>>;

pub fn out_stream<W: Write + 'static>(writer: W) -> OutStream {
    Rc::new(RefCell::new(writer))
}

pub fn in_stream<R: BufRead + 'static>(reader: R) -> InStream {
    Rc::new(RefCell::new(reader))
}

/// Input that is always at end of file.
pub fn empty_input() -> InStream {
    in_stream(io::empty())
}

/// Input that reads back the given bytes.
pub fn input_from(bytes: Vec<u8>) -> InStream {
    in_stream(Cursor::new(bytes))
}

/// Output that discards everything.
pub fn sink() -> OutStream {
    out_stream(io::sink())
}

/// Write text to a stream, logging instead of failing.
pub fn write_str(stream: &OutStream, text: &str) {
    if text.is_empty() {
        return;
    }
    match stream.try_borrow_mut() {
        Ok(mut writer) => {
            if let Err(e) = writer.write_all(text.as_bytes()) {
                warn!(error = %e, "stream write failed");
            }
        }
        Err(_) => warn!("stream busy, output dropped"),
    }
}

/// In-memory output that can be read back while the session still holds a
/// handle to it. Used for `$(...)`, pipes and by hosts capturing output.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    inner: Rc<RefCell<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stream handle writing into this buffer.
    pub fn stream(&self) -> OutStream {
        out_stream(self.clone())
    }

    /// Captured text; invalid UTF-8 is replaced.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.borrow()).into_owned()
    }

    /// Take the captured bytes, leaving the buffer empty.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.inner.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_capture_buffer_shares_contents() {
        let buffer = CaptureBuffer::new();
        let stream = buffer.stream();
        write_str(&stream, "hello ");
        write_str(&stream, "world");
        assert_eq!(buffer.contents(), "hello world");
        assert_eq!(buffer.take(), b"hello world".to_vec());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_input_from_reads_back() {
        let input = input_from(b"a\nb\n".to_vec());
        let mut text = String::new();
        input.borrow_mut().read_to_string(&mut text).unwrap();
        assert_eq!(text, "a\nb\n");

        let mut line = String::new();
        assert_eq!(empty_input().borrow_mut().read_line(&mut line).unwrap(), 0);
    }

    #[test]
    fn test_write_to_sink_is_silent() {
        write_str(&sink(), "ignored");
    }
}
