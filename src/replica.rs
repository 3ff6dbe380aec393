//! The applier: turns decoded [`Frame`]s into mutations of a replica array.
//!
//! The applier is the only stateful actor in this crate. It holds an
//! ordered sequence of opaque values indexed from 0, and applies frames to
//! it one at a time, in production order. Holes created by out-of-range
//! writes are filled with the "absent" sentinel, represented here as
//! `None`.

use crate::{error::CodecError, frame::Frame};

/// One element of a [`Replica`]: `None` is the absent sentinel, `Some`
/// holds opaque payload bytes (including the zero-length payload, which is
/// distinct from absent).
pub type Slot = Option<Vec<u8>>;

/// An ordered, zero-indexed array of opaque values, mutated in place by
/// successive frames.
///
/// A `Replica` is plain owned data with no interior mutability, so it is
/// `Send`; callers that need single-writer/many-reader access across
/// threads wrap it in a `Mutex`/`RwLock` or publish immutable snapshots
/// themselves — the crate does not impose a concurrency strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replica {
    elements: Vec<Slot>,
}

impl Replica {
    /// Create an empty replica.
    #[must_use]
    pub const fn new() -> Self { Self { elements: Vec::new() } }

    /// Number of elements currently held, including absent slots.
    #[must_use]
    pub fn len(&self) -> usize { self.elements.len() }

    /// Whether the replica currently holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.elements.is_empty() }

    /// Borrow the element at `pos`, if any index that far has been
    /// allocated. An allocated-but-absent slot returns `Some(&None)`.
    #[must_use]
    pub fn get(&self, pos: usize) -> Option<&Slot> { self.elements.get(pos) }

    /// Borrow the full slot sequence.
    #[must_use]
    pub fn as_slots(&self) -> &[Slot] { &self.elements }

    /// Decode `frame_bytes` and apply the resulting frame to this replica.
    ///
    /// Decoding is pure; on a decode error, `self` is left exactly as it
    /// was. Applying a successfully-decoded frame cannot itself fail: the
    /// operations defined by the codec (padding, shifting, overwriting)
    /// always succeed for any well-formed frame and any prior replica
    /// state, which is how the applier achieves frame-level atomicity
    /// without any transaction machinery.
    ///
    /// # Errors
    /// Propagates any [`CodecError`] from [`Frame::decode`].
    pub fn apply(&mut self, frame_bytes: &[u8]) -> Result<(), CodecError> {
        let frame = Frame::decode(frame_bytes)?;
        self.apply_frame(&frame);
        Ok(())
    }

    /// Apply an already-decoded frame. Exposed for callers that decode
    /// once and want to inspect the frame (e.g. to dispatch on the
    /// partial flag) before applying it.
    pub fn apply_frame(&mut self, frame: &Frame) {
        match frame {
            Frame::Delete { pos } => self.delete_one(*pos),
            Frame::DeleteRange { start, end } => self.delete_range(*start, *end),
            Frame::Insert { pos, payload } | Frame::Update { pos, payload } => {
                self.write_one(*pos, payload.clone(), matches!(frame, Frame::Insert { .. }));
            }
            Frame::InsertRange {
                start, payloads, ..
            } => self.write_range(*start, payloads, true),
            Frame::UpdateRange {
                start, payloads, ..
            } => self.write_range(*start, payloads, false),
            Frame::PartialUpdate { pos, patch } => self.write_one(*pos, patch.clone(), false),
            Frame::PartialUpdateRange { patches, .. } => {
                for patch in patches {
                    self.write_one(patch.pos, patch.payload.clone(), false);
                }
            }
        }
    }

    fn pad_to(&mut self, len: usize) {
        if self.elements.len() < len {
            self.elements.resize(len, None);
        }
    }

    fn write_one(&mut self, pos: u32, payload: Vec<u8>, insert: bool) {
        let index = usize::try_from(pos).unwrap_or(usize::MAX);
        if insert {
            self.pad_to(index);
            self.elements.insert(index, Some(payload));
        } else {
            self.pad_to(index + 1);
            if let Some(slot) = self.elements.get_mut(index) {
                *slot = Some(payload);
            }
        }
    }

    fn write_range(&mut self, start: u32, payloads: &[Vec<u8>], insert: bool) {
        for (offset, payload) in payloads.iter().enumerate() {
            let target = u32::try_from(offset)
                .ok()
                .and_then(|offset| start.checked_add(offset))
                .unwrap_or(u32::MAX);
            self.write_one(target, payload.clone(), insert);
        }
    }

    fn delete_one(&mut self, pos: u32) {
        let index = usize::try_from(pos).unwrap_or(usize::MAX);
        if index < self.elements.len() {
            self.elements.remove(index);
        }
    }

    fn delete_range(&mut self, start: u32, end: u32) {
        let first = usize::try_from(start).unwrap_or(usize::MAX);
        if first >= self.elements.len() {
            return;
        }
        let last = usize::try_from(end)
            .unwrap_or(usize::MAX)
            .min(self.elements.len() - 1);
        self.elements.drain(first..=last);
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::frame::Patch;

    fn apply_ok(replica: &mut Replica, frame: &Frame) {
        let bytes = frame.encode().expect("scenario frame encodes");
        replica.apply(&bytes).expect("scenario frame applies");
    }

    #[test]
    fn s1_single_insert_into_empty_replica() {
        let mut replica = Replica::new();
        apply_ok(
            &mut replica,
            &Frame::Insert {
                pos: 0,
                payload: b"A".to_vec(),
            },
        );
        assert_eq!(replica.len(), 1);
        assert_eq!(replica.get(0), Some(&Some(b"A".to_vec())));
    }

    #[test]
    fn s2_single_update_past_end_pads_with_absent() {
        let mut replica = Replica::new();
        apply_ok(
            &mut replica,
            &Frame::Update {
                pos: 5,
                payload: b"123".to_vec(),
            },
        );
        assert_eq!(replica.len(), 6);
        for i in 0..5 {
            assert_eq!(replica.get(i), Some(&None));
        }
        assert_eq!(replica.get(5), Some(&Some(b"123".to_vec())));
    }

    #[test]
    fn s3_dense_range_insert() {
        let mut replica = Replica::new();
        apply_ok(
            &mut replica,
            &Frame::InsertRange {
                start: 10,
                end: 12,
                payloads: vec![b"A".to_vec(), b"B".to_vec(), b"C".to_vec()],
            },
        );
        assert_eq!(replica.len(), 13);
        for i in 0..10 {
            assert_eq!(replica.get(i), Some(&None));
        }
        assert_eq!(replica.get(10), Some(&Some(b"A".to_vec())));
        assert_eq!(replica.get(11), Some(&Some(b"B".to_vec())));
        assert_eq!(replica.get(12), Some(&Some(b"C".to_vec())));
    }

    #[test]
    fn s4_delete_middle_sequence() {
        let mut replica = Replica::new();
        apply_ok(
            &mut replica,
            &Frame::Insert {
                pos: 0,
                payload: b"1".to_vec(),
            },
        );
        apply_ok(
            &mut replica,
            &Frame::Insert {
                pos: 1,
                payload: b"2".to_vec(),
            },
        );
        apply_ok(
            &mut replica,
            &Frame::Insert {
                pos: 2,
                payload: b"3".to_vec(),
            },
        );
        apply_ok(&mut replica, &Frame::Delete { pos: 1 });
        assert_eq!(
            replica.as_slots(),
            &[Some(b"1".to_vec()), Some(b"3".to_vec())]
        );
    }

    #[test]
    fn s5_sparse_partial_update_leaves_gaps_absent() {
        let mut replica = Replica::new();
        apply_ok(
            &mut replica,
            &Frame::PartialUpdateRange {
                start: 10,
                end: 20,
                patches: vec![
                    Patch {
                        pos: 10,
                        payload: b"A".to_vec(),
                    },
                    Patch {
                        pos: 12,
                        payload: b"B".to_vec(),
                    },
                ],
            },
        );
        assert_eq!(replica.len(), 13);
        assert_eq!(replica.get(10), Some(&Some(b"A".to_vec())));
        assert_eq!(replica.get(12), Some(&Some(b"B".to_vec())));
        for i in [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 11] {
            assert_eq!(replica.get(i), Some(&None));
        }
    }

    #[rstest]
    fn range_delete_ignores_out_of_range_tail() {
        let mut replica = Replica::new();
        apply_ok(
            &mut replica,
            &Frame::InsertRange {
                start: 0,
                end: 2,
                payloads: vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()],
            },
        );
        apply_ok(&mut replica, &Frame::DeleteRange { start: 1, end: 100 });
        assert_eq!(replica.as_slots(), &[Some(b"1".to_vec())]);
    }

    #[test]
    fn single_delete_past_end_is_a_no_op() {
        let mut replica = Replica::new();
        apply_ok(
            &mut replica,
            &Frame::Insert {
                pos: 0,
                payload: b"only".to_vec(),
            },
        );
        let before = replica.clone();
        apply_ok(&mut replica, &Frame::Delete { pos: 50 });
        assert_eq!(replica, before);
    }

    #[test]
    fn failed_decode_leaves_replica_untouched() {
        let mut replica = Replica::new();
        apply_ok(
            &mut replica,
            &Frame::Insert {
                pos: 0,
                payload: b"keep".to_vec(),
            },
        );
        let before = replica.clone();
        let err = replica.apply(&[0b0000_0010]).expect_err("reserved opcode");
        assert!(matches!(err, CodecError::Malformed(_)));
        assert_eq!(replica, before);
    }

    #[test]
    fn insert_never_decreases_length_and_delete_never_increases_it() {
        let mut replica = Replica::new();
        apply_ok(
            &mut replica,
            &Frame::InsertRange {
                start: 0,
                end: 4,
                payloads: vec![
                    b"0".to_vec(),
                    b"1".to_vec(),
                    b"2".to_vec(),
                    b"3".to_vec(),
                    b"4".to_vec(),
                ],
            },
        );
        let before_len = replica.len();
        apply_ok(
            &mut replica,
            &Frame::Insert {
                pos: 2,
                payload: b"x".to_vec(),
            },
        );
        assert!(replica.len() >= before_len);

        let before_len = replica.len();
        apply_ok(&mut replica, &Frame::Delete { pos: 0 });
        assert_eq!(replica.len(), before_len - 1);
        assert!(replica.len() <= before_len);
    }
}
