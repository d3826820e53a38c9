//! Equality check between the buffer and the formatter's output.

use crate::counting::ByteCounts;
use std::io::{self, BufRead, BufReader, Read};

/// Whether `original` and `formatted` hold the same bytes.
///
/// Differing counts settle it without touching either stream. Equal counts
/// are necessary but not sufficient, so the streams are then compared in
/// full.
pub fn identical<A: Read, B: Read>(original: A, formatted: B, counts: ByteCounts) -> io::Result<bool> {
    if !counts.sizes_match() {
        log::debug!(
            "sizes differ ({} vs {} bytes), skipping comparison",
            counts.read,
            counts.written
        );
        return Ok(false);
    }
    same_contents(original, formatted)
}

/// Compare two streams chunk by chunk, stopping at the first difference.
///
/// Memory use is bounded by the two read buffers.
pub fn same_contents<A: Read, B: Read>(a: A, b: B) -> io::Result<bool> {
    let mut a = BufReader::new(a);
    let mut b = BufReader::new(b);
    loop {
        let n = {
            let left = a.fill_buf()?;
            let right = b.fill_buf()?;
            if left.is_empty() || right.is_empty() {
                return Ok(left.is_empty() && right.is_empty());
            }
            let n = left.len().min(right.len());
            if left[..n] != right[..n] {
                return Ok(false);
            }
            n
        };
        a.consume(n);
        b.consume(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most `step` bytes per read.
    struct Chunked<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Chunked<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.len().min(self.step).min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    struct Unreadable;

    impl Read for Unreadable {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("must not be read"))
        }
    }

    #[test]
    fn test_size_mismatch_short_circuits() {
        let counts = ByteCounts { read: 5, written: 4 };
        assert!(!identical(Unreadable, Unreadable, counts).unwrap());
    }

    #[test]
    fn test_equal_size_different_content() {
        let counts = ByteCounts { read: 3, written: 3 };
        assert!(!identical(&b"abc"[..], &b"abd"[..], counts).unwrap());
    }

    #[test]
    fn test_equal_content() {
        let counts = ByteCounts { read: 13, written: 13 };
        assert!(identical(&b"package main\n"[..], &b"package main\n"[..], counts).unwrap());
    }

    #[test]
    fn test_prefix_is_not_equal() {
        assert!(!same_contents(&b"abc"[..], &b"ab"[..]).unwrap());
        assert!(!same_contents(&b""[..], &b"a"[..]).unwrap());
        assert!(same_contents(&b""[..], &b""[..]).unwrap());
    }

    #[test]
    fn test_misaligned_chunks() {
        let text = b"a\nb\nc\nthe quick brown fox";
        let a = Chunked { data: text, step: 3 };
        let b = Chunked { data: text, step: 7 };
        assert!(same_contents(a, b).unwrap());

        let other = b"a\nb\nc\nthe quick brown fix";
        let a = Chunked { data: text, step: 5 };
        let b = Chunked { data: other, step: 2 };
        assert!(!same_contents(a, b).unwrap());
    }

    #[test]
    fn test_read_error_propagates() {
        let counts = ByteCounts { read: 1, written: 1 };
        assert!(identical(Unreadable, &b"a"[..], counts).is_err());
    }
}
