//! Line framing over a raw byte stream
//!
//! Accumulates bytes from a connection until a newline and yields one
//! decoded line at a time. Partial reads are expected: an unterminated
//! remainder stays buffered across reads until its newline arrives.

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

/// Upper bound on buffered bytes for a single unterminated line
///
/// A peer that streams bytes without ever sending a newline gets its
/// connection dropped once the buffer crosses this bound.
pub const MAX_LINE_LEN: usize = 8192;

const READ_CHUNK: usize = 1024;

/// Newline-delimited reader over any byte stream
///
/// `next_line` yields complete lines with the `\n` (and a preceding
/// `\r`, if present) stripped, and returns `None` on end-of-stream, on
/// any read error, and when the line-length bound is exceeded. All three
/// signal the same thing to the caller: this connection is done.
pub struct LineFramer<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineFramer<R> {
    /// Wrap a readable stream
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Read the next complete line, or `None` when the stream is done
    ///
    /// An unterminated trailing fragment at end-of-stream is discarded.
    /// Invalid UTF-8 is replaced lossily rather than treated as an error.
    pub async fn next_line(&mut self) -> Option<String> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Some(String::from_utf8_lossy(&line).into_owned());
            }

            if self.buf.len() >= MAX_LINE_LEN {
                warn!(
                    "Dropping connection: {} bytes buffered without a newline",
                    self.buf.len()
                );
                return None;
            }

            let mut chunk = [0u8; READ_CHUNK];
            match self.reader.read(&mut chunk).await {
                // EOF - any unterminated remainder is dropped
                Ok(0) => return None,
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(e) => {
                    debug!("Read error, ending line stream: {}", e);
                    return None;
                }
            }
        }
    }
}
