//! Reassembly of one logical text message from transport fragments.
//!
//! The transport may hand a message over in several pieces, each tagged with
//! the total message length and its byte offset. [`Reassembler`] collects
//! them into a single buffer sized for the declared length.
//!
//! Progress is a high-water mark: the furthest byte any accepted fragment
//! reached. The message is complete once that mark hits the declared
//! length, so fragments may overlap (last writer wins) or arrive out of
//! order as long as the final one is the tail. A tail that arrives early
//! completes the message with any gaps still zeroed; the dispatcher's JSON
//! parse is the backstop for such payloads.

use bytes::{Bytes, BytesMut};
use thiserror::Error;

/// Largest message the session will buffer by default.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReassemblyError {
    #[error("Message length must be non-zero")]
    EmptyMessage,

    #[error("Message of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },

    #[error("No message in progress")]
    NotStarted,

    #[error("Fragment declares length {declared}, message in progress is {expected}")]
    LengthMismatch { declared: usize, expected: usize },

    #[error("Empty fragment")]
    EmptyFragment,

    #[error("Fragment at offset {offset} with {len} bytes overruns {expected} byte message")]
    OutOfBounds {
        offset: usize,
        len: usize,
        expected: usize,
    },
}

/// Accumulates fragments of at most one message at a time.
#[derive(Debug)]
pub struct Reassembler {
    buffer: Option<BytesMut>,
    expected_len: usize,
    received_len: usize,
    max_len: usize,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_LEN)
    }
}

impl Reassembler {
    pub fn new(max_len: usize) -> Self {
        Self {
            buffer: None,
            expected_len: 0,
            received_len: 0,
            max_len,
        }
    }

    /// Start a new message of `expected_len` bytes, discarding any partial one.
    pub fn begin(&mut self, expected_len: usize) -> Result<(), ReassemblyError> {
        self.reset();
        if expected_len == 0 {
            return Err(ReassemblyError::EmptyMessage);
        }
        if expected_len > self.max_len {
            return Err(ReassemblyError::TooLarge {
                len: expected_len,
                max: self.max_len,
            });
        }
        self.buffer = Some(BytesMut::zeroed(expected_len));
        self.expected_len = expected_len;
        Ok(())
    }

    /// Copy `data` into the message at `offset`.
    ///
    /// `declared_len` is the total length the fragment claims for its
    /// message and must match the one in progress. On error nothing is
    /// copied and the high-water mark is unchanged.
    pub fn append(
        &mut self,
        offset: usize,
        data: &[u8],
        declared_len: usize,
    ) -> Result<(), ReassemblyError> {
        let expected = self.expected_len;
        let buffer = self.buffer.as_mut().ok_or(ReassemblyError::NotStarted)?;

        if declared_len != expected {
            return Err(ReassemblyError::LengthMismatch {
                declared: declared_len,
                expected,
            });
        }
        if data.is_empty() {
            return Err(ReassemblyError::EmptyFragment);
        }

        let out_of_bounds = || ReassemblyError::OutOfBounds {
            offset,
            len: data.len(),
            expected,
        };
        let end = offset.checked_add(data.len()).ok_or_else(out_of_bounds)?;
        let slot = buffer.get_mut(offset..end).ok_or_else(out_of_bounds)?;
        slot.copy_from_slice(data);

        self.received_len = self.received_len.max(end);
        Ok(())
    }

    /// `true` once the high-water mark reaches `expected_len`.
    pub fn is_complete(&self) -> bool {
        self.buffer.is_some() && self.received_len >= self.expected_len
    }

    /// Hand over the finished message and return to idle.
    ///
    /// Returns `None` (and keeps state) while the message is incomplete.
    pub fn take_complete(&mut self) -> Option<Bytes> {
        if !self.is_complete() {
            return None;
        }
        let payload = self.buffer.take().map(BytesMut::freeze);
        self.reset();
        payload
    }

    /// Drop any partial message.
    pub fn reset(&mut self) {
        self.buffer = None;
        self.expected_len = 0;
        self.received_len = 0;
    }

    pub fn is_active(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn expected_len(&self) -> usize {
        self.expected_len
    }

    pub fn received_len(&self) -> usize {
        self.received_len
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const MESSAGE: &[u8] = br#"{"action":"ping"}"#;

    #[test]
    fn single_fragment_completes() {
        let mut r = Reassembler::default();
        r.begin(MESSAGE.len()).unwrap();
        r.append(0, MESSAGE, MESSAGE.len()).unwrap();
        assert!(r.is_complete());
        assert_eq!(r.take_complete().unwrap(), MESSAGE);
        assert!(!r.is_active());
        assert_eq!(r.received_len(), 0);
    }

    #[test]
    fn every_two_way_split_in_order() {
        let len = MESSAGE.len();
        for split in 1..len {
            let (head, tail) = MESSAGE.split_at(split);
            let mut r = Reassembler::default();
            r.begin(len).unwrap();
            r.append(0, head, len).unwrap();
            assert!(!r.is_complete(), "split {split}");
            assert!(r.take_complete().is_none());
            assert_eq!(r.received_len(), split);
            r.append(split, tail, len).unwrap();
            assert_eq!(r.take_complete().unwrap(), MESSAGE, "split {split}");
        }
    }

    #[test]
    fn middle_fragments_may_arrive_in_any_order_before_the_tail() {
        let len = MESSAGE.len();
        let parts = [
            (0, &MESSAGE[..4]),
            (4, &MESSAGE[4..9]),
            (9, &MESSAGE[9..13]),
            (13, &MESSAGE[13..]),
        ];
        let orders = [
            [0, 1, 2, 3],
            [0, 2, 1, 3],
            [1, 0, 2, 3],
            [1, 2, 0, 3],
            [2, 0, 1, 3],
            [2, 1, 0, 3],
        ];
        for order in orders {
            let mut r = Reassembler::default();
            r.begin(len).unwrap();
            for idx in order {
                assert!(!r.is_complete(), "order {order:?}");
                let (offset, data) = parts[idx];
                r.append(offset, data, len).unwrap();
            }
            assert_eq!(r.take_complete().unwrap(), MESSAGE, "order {order:?}");
        }
    }

    #[test]
    fn early_tail_completes_with_gaps_zeroed() {
        let mut r = Reassembler::default();
        r.begin(6).unwrap();
        r.append(4, b"ef", 6).unwrap();
        assert!(r.is_complete());
        assert_eq!(r.take_complete().unwrap(), &b"\0\0\0\0ef"[..]);
    }

    #[test]
    fn out_of_bounds_fragments_are_rejected_without_side_effects() {
        let len = 8;
        for offset in 0..=len + 2 {
            for frag_len in 1..=len + 2 {
                let mut r = Reassembler::default();
                r.begin(len).unwrap();
                let data = vec![b'x'; frag_len];
                let result = r.append(offset, &data, len);
                if offset + frag_len <= len {
                    assert!(result.is_ok(), "offset {offset} len {frag_len}");
                    assert_eq!(r.received_len(), offset + frag_len);
                } else {
                    assert_eq!(
                        result,
                        Err(ReassemblyError::OutOfBounds {
                            offset,
                            len: frag_len,
                            expected: len,
                        })
                    );
                    assert_eq!(r.received_len(), 0);
                }
            }
        }
    }

    #[test]
    fn offset_overflow_is_out_of_bounds() {
        let mut r = Reassembler::default();
        r.begin(4).unwrap();
        assert!(matches!(
            r.append(usize::MAX, b"ab", 4),
            Err(ReassemblyError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn declared_length_must_match() {
        let mut r = Reassembler::default();
        r.begin(10).unwrap();
        assert_eq!(
            r.append(0, b"abc", 11),
            Err(ReassemblyError::LengthMismatch {
                declared: 11,
                expected: 10,
            })
        );
        assert_eq!(r.received_len(), 0);
    }

    #[test]
    fn append_without_begin_fails() {
        let mut r = Reassembler::default();
        assert_eq!(r.append(0, b"abc", 3), Err(ReassemblyError::NotStarted));
        assert!(!r.is_complete());
    }

    #[test]
    fn empty_fragment_and_message_are_rejected() {
        let mut r = Reassembler::default();
        assert_eq!(r.begin(0), Err(ReassemblyError::EmptyMessage));
        r.begin(3).unwrap();
        assert_eq!(r.append(0, b"", 3), Err(ReassemblyError::EmptyFragment));
    }

    #[test]
    fn oversized_message_is_refused() {
        let mut r = Reassembler::new(16);
        assert_eq!(
            r.begin(17),
            Err(ReassemblyError::TooLarge { len: 17, max: 16 })
        );
        assert!(!r.is_active());
        r.begin(16).unwrap();
        assert!(r.is_active());
    }

    #[test]
    fn overlapping_fragments_last_writer_wins() {
        let mut r = Reassembler::default();
        r.begin(4).unwrap();
        r.append(0, b"abc", 4).unwrap();
        r.append(0, b"ab", 4).unwrap();
        assert_eq!(r.received_len(), 3);
        assert!(!r.is_complete());
        r.append(1, b"XYZ", 4).unwrap();
        assert_eq!(r.take_complete().unwrap(), &b"aXYZ"[..]);
    }

    #[test]
    fn begin_discards_partial_message() {
        let mut r = Reassembler::default();
        r.begin(6).unwrap();
        r.append(0, b"abc", 6).unwrap();
        r.begin(3).unwrap();
        assert_eq!(r.received_len(), 0);
        r.append(0, b"xyz", 3).unwrap();
        assert_eq!(r.take_complete().unwrap(), &b"xyz"[..]);
    }
}
