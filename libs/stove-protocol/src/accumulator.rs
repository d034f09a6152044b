//! Response accumulator for partial socket reads.
//!
//! Bytes arrive in arbitrary chunks; the stove terminates every response with
//! `\n`. The accumulator keeps everything after the first complete line so a
//! second response delivered in the same read is not lost.

use bytes::{Buf, BytesMut};

use crate::constants::{FIELD_SEPARATOR, FRAME_END, RESPONSE_BUFFER_CAPACITY};

/// Buffer for accumulating incoming bytes and extracting response lines.
#[derive(Debug)]
pub struct ResponseAccumulator {
    buffer: BytesMut,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(RESPONSE_BUFFER_CAPACITY),
        }
    }

    /// Append a chunk read from the socket.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Take the first complete line, split into fields.
    ///
    /// Returns `None` until a `\n` has been buffered. A trailing `\r` is
    /// dropped; invalid UTF-8 is replaced rather than rejected.
    pub fn next_line(&mut self) -> Option<Vec<String>> {
        let end = self.buffer.iter().position(|&b| b == FRAME_END)?;
        let line = self.buffer.split_to(end);
        self.buffer.advance(1);

        let raw = String::from_utf8_lossy(&line);
        let text = raw.strip_suffix('\r').unwrap_or(&raw);
        Some(text.split(FIELD_SEPARATOR).map(str::to_string).collect())
    }

    /// Read-side buffer for socket reads.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for ResponseAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut acc = ResponseAccumulator::new();
        acc.push(b"DAT;1;2;3\n");
        assert_eq!(acc.next_line().unwrap(), vec!["DAT", "1", "2", "3"]);
        assert_eq!(acc.buffered_len(), 0);
        assert!(acc.next_line().is_none());
    }

    #[test]
    fn test_line_split_across_reads() {
        let mut acc = ResponseAccumulator::new();
        acc.push(b"INF;MAN");
        assert!(acc.next_line().is_none());
        acc.push(b"UFACTURER;1.");
        assert!(acc.next_line().is_none());
        acc.push(b"2\n");
        assert_eq!(acc.next_line().unwrap(), vec!["INF", "MANUFACTURER", "1.2"]);
    }

    #[test]
    fn test_two_lines_in_one_read_keeps_remainder() {
        let mut acc = ResponseAccumulator::new();
        acc.push(b"a;b\nc;d\ne");
        assert_eq!(acc.next_line().unwrap(), vec!["a", "b"]);
        assert_eq!(acc.buffered_len(), 5);
        assert_eq!(acc.next_line().unwrap(), vec!["c", "d"]);
        assert!(acc.next_line().is_none());
        assert_eq!(acc.buffered_len(), 1);
    }

    #[test]
    fn test_carriage_return_stripped() {
        let mut acc = ResponseAccumulator::new();
        acc.push(b"x;y\r\n");
        assert_eq!(acc.next_line().unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_empty_line_yields_single_empty_field() {
        let mut acc = ResponseAccumulator::new();
        acc.push(b"\n");
        assert_eq!(acc.next_line().unwrap(), vec![String::new()]);
    }

    #[test]
    fn test_trailing_separator_keeps_empty_field() {
        let mut acc = ResponseAccumulator::new();
        acc.push(b"1;2;\n");
        assert_eq!(acc.next_line().unwrap(), vec!["1", "2", ""]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut acc = ResponseAccumulator::new();
        acc.push(&[b'o', b'k', b';', 0xFF, b'\n']);
        let line = acc.next_line().unwrap();
        assert_eq!(line[0], "ok");
        assert_eq!(line[1], "\u{FFFD}");
    }

    #[test]
    fn test_buffered_len_tracks_remainder() {
        let mut acc = ResponseAccumulator::new();
        acc.push(b"one\ntwo");
        assert_eq!(acc.buffered_len(), 7);
        assert_eq!(acc.next_line().unwrap(), vec!["one"]);
        assert_eq!(acc.buffered_len(), 3);
    }
}
