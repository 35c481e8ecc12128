//! Line reassembly for the chat socket
//!
//! Chunks are buffered until one arrives that ends exactly on a line
//! boundary. At that point the whole buffer is joined, split on `\n` and
//! handed out, trailing empty segment included. A chunk ending mid-line
//! keeps accumulating, bounded by `max_bytes`.

use std::vec::IntoIter;

use crate::error::{Error, Result};

const LINE_SEPARATOR: u8 = b'\n';

/// Rolling buffer of raw chunks received since the last flush
#[derive(Debug, Clone)]
pub struct LineBuffer {
    chunks: Vec<Vec<u8>>,
    buffered: usize,
    max_bytes: usize,
}

impl LineBuffer {
    /// Create a buffer that holds at most `max_bytes` of unterminated data
    pub fn new(max_bytes: usize) -> Self {
        Self {
            chunks: Vec::new(),
            buffered: 0,
            max_bytes,
        }
    }

    /// Number of bytes waiting for a line boundary
    pub fn len(&self) -> usize {
        self.buffered
    }

    pub fn is_empty(&self) -> bool {
        self.buffered == 0
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.buffered = 0;
    }

    /// Feed one chunk from the transport.
    ///
    /// Yields nothing unless `chunk` ends on a line boundary. Exceeding the
    /// size bound drops everything buffered and returns a protocol error.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<IntoIter<String>> {
        if chunk.is_empty() {
            return Ok(Vec::new().into_iter());
        }

        self.chunks.push(chunk.to_vec());
        self.buffered += chunk.len();

        if chunk.last() != Some(&LINE_SEPARATOR) {
            if self.buffered > self.max_bytes {
                let dropped = self.buffered;
                self.clear();
                return Err(Error::Protocol(format!(
                    "Unterminated frame too large: {} bytes (max {})",
                    dropped, self.max_bytes
                )));
            }
            return Ok(Vec::new().into_iter());
        }

        let joined = self.chunks.concat();
        self.clear();

        let lines: Vec<String> = String::from_utf8_lossy(&joined)
            .split('\n')
            .map(str::to_string)
            .collect();
        Ok(lines.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(buffer: &mut LineBuffer, chunks: &[&str]) -> Vec<String> {
        chunks
            .iter()
            .flat_map(|chunk| buffer.feed(chunk.as_bytes()).unwrap())
            .collect()
    }

    #[test]
    fn test_single_flush() {
        let mut buffer = LineBuffer::new(1024);
        assert_eq!(feed_all(&mut buffer, &["A\nB", "\nC\n"]), vec!["A", "B", "C", ""]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_splits_are_equivalent() {
        // Every flush ends with one empty segment; the non-empty lines
        // come out identical regardless of how the stream was chunked.
        let splits: [&[&str]; 4] = [
            &["A\nB\nC\n"],
            &["A\n", "B\nC\n"],
            &["A\nB", "\nC\n"],
            &["A", "\n", "B\n", "C", "\n"],
        ];
        for chunks in splits {
            let mut buffer = LineBuffer::new(1024);
            let lines = feed_all(&mut buffer, chunks);
            let content: Vec<&str> = lines
                .iter()
                .map(String::as_str)
                .filter(|l| !l.is_empty())
                .collect();

            assert_eq!(content, vec!["A", "B", "C"], "{:?}", chunks);
            assert_eq!(lines.last().map(String::as_str), Some(""));
            assert!(buffer.is_empty());
        }
    }

    #[test]
    fn test_unaligned_chunk_yields_nothing() {
        let mut buffer = LineBuffer::new(1024);
        assert_eq!(buffer.feed(b"A\nB").unwrap().count(), 0);
        assert_eq!(buffer.len(), 3);

        let lines: Vec<String> = buffer.feed(b"\n").unwrap().collect();
        assert_eq!(lines, vec!["A", "B", ""]);
    }

    #[test]
    fn test_chunks_join_without_separator() {
        let mut buffer = LineBuffer::new(1024);
        assert_eq!(feed_all(&mut buffer, &["he", "llo", "\n"]), vec!["hello", ""]);
    }

    #[test]
    fn test_empty_chunk_is_not_a_boundary() {
        let mut buffer = LineBuffer::new(1024);
        assert_eq!(feed_all(&mut buffer, &["A", ""]), Vec::<String>::new());
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let text = "안녕\n".as_bytes();
        let mut buffer = LineBuffer::new(1024);

        assert_eq!(buffer.feed(&text[..2]).unwrap().count(), 0);
        let lines: Vec<String> = buffer.feed(&text[2..]).unwrap().collect();
        assert_eq!(lines, vec!["안녕", ""]);
    }

    #[test]
    fn test_overflow_clears_buffer() {
        let mut buffer = LineBuffer::new(4);
        assert_eq!(buffer.feed(b"abc").unwrap().count(), 0);

        let err = buffer.feed(b"de").unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(buffer.is_empty());

        // Usable again after overflow
        let lines: Vec<String> = buffer.feed(b"ok\n").unwrap().collect();
        assert_eq!(lines, vec!["ok", ""]);
    }
}
