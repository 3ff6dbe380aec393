//! Frame shapes, the encoder, and the decoder.
//!
//! A [`Frame`] is a closed sum type over the eight on-wire shapes listed in
//! the protocol notes: single and bulk forms of DELETE, INSERT, and the two
//! UPDATE variants (full replace and intra-element patch). Encoding and
//! decoding are each a single dispatch over this type, which is what makes
//! round-trip coverage exhaustive by construction.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    error::{CodecError, MalformedReason},
    header::{Header, OpKind},
    varint::{decode_fixed, encode_fixed, min_width},
};

/// A single `(position, payload)` patch inside a sparse partial-update
/// range frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// The array position this patch targets.
    pub pos: u32,
    /// The opaque patch bytes; never interpreted by the codec.
    pub payload: Vec<u8>,
}

/// One decoded (or to-be-encoded) array-mutation operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Remove the element at `pos`.
    Delete {
        /// Index of the element to remove.
        pos: u32,
    },
    /// Remove every element in `[start, end]`.
    DeleteRange {
        /// Inclusive range start.
        start: u32,
        /// Inclusive range end.
        end: u32,
    },
    /// Insert `payload` at `pos`, shifting later elements right.
    Insert {
        /// Target index.
        pos: u32,
        /// Opaque element bytes.
        payload: Vec<u8>,
    },
    /// Overwrite the element at `pos` with `payload`.
    Update {
        /// Target index.
        pos: u32,
        /// Opaque element bytes.
        payload: Vec<u8>,
    },
    /// Insert `payloads[i]` at `start + i` for each `i`, in ascending order.
    InsertRange {
        /// Inclusive range start.
        start: u32,
        /// Inclusive range end.
        end: u32,
        /// One payload per position in `start..=end`, in order.
        payloads: Vec<Vec<u8>>,
    },
    /// Overwrite each position in `start..=end` with the corresponding
    /// payload, in order.
    UpdateRange {
        /// Inclusive range start.
        start: u32,
        /// Inclusive range end.
        end: u32,
        /// One payload per position in `start..=end`, in order.
        payloads: Vec<Vec<u8>>,
    },
    /// Apply an intra-element patch at `pos`.
    ///
    /// The codec never interprets `patch`; it is stored as the element's
    /// new value verbatim, exactly like [`Frame::Update`]. The partial bit
    /// is preserved only as a marker for the caller.
    PartialUpdate {
        /// Target index.
        pos: u32,
        /// Opaque patch bytes.
        patch: Vec<u8>,
    },
    /// Apply a sparse set of intra-element patches, each within
    /// `[start, end]`.
    PartialUpdateRange {
        /// Inclusive declared range start.
        start: u32,
        /// Inclusive declared range end.
        end: u32,
        /// Patches in wire order; positions need not be contiguous or
        /// sorted, but each must lie within `[start, end]`.
        patches: Vec<Patch>,
    },
}

/// Convert a byte count to `u32`, reporting [`CodecError::OutOfRange`] if
/// it cannot fit (and therefore could never have a valid min-width either).
fn require_u32(value: usize) -> Result<u32, CodecError> {
    u32::try_from(value).map_err(|_| CodecError::OutOfRange {
        value: u64::try_from(value).unwrap_or(u64::MAX),
        limit: u64::from(crate::error::MAX_VALUE),
    })
}

fn check_range(start: u32, end: u32) -> Result<(), CodecError> {
    if end < start {
        return Err(CodecError::BadRange { start, end });
    }
    Ok(())
}

fn max_payload_len(payloads: &[Vec<u8>]) -> Result<u32, CodecError> {
    let mut max_len = 0u32;
    for payload in payloads {
        max_len = max_len.max(require_u32(payload.len())?);
    }
    Ok(max_len)
}

impl Frame {
    /// Serialise this frame into its wire bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::OutOfRange`] if a position or payload length
    /// exceeds the 24-bit limit, [`CodecError::BadRange`] if a bulk range
    /// has `end < start`, [`CodecError::ArityMismatch`] if a dense range's
    /// payload count does not equal `end - start + 1`, or
    /// [`CodecError::Malformed`] if a sparse patch lies outside its
    /// declared range.
    pub fn encode(&self) -> Result<Bytes, CodecError> {
        match self {
            Self::Delete { pos } => encode_single(OpKind::Delete, false, *pos, None),
            Self::DeleteRange { start, end } => encode_bare_range(OpKind::Delete, *start, *end),
            Self::Insert { pos, payload } => {
                encode_single(OpKind::Insert, false, *pos, Some(payload))
            }
            Self::Update { pos, payload } => {
                encode_single(OpKind::Update, false, *pos, Some(payload))
            }
            Self::InsertRange {
                start,
                end,
                payloads,
            } => encode_dense_range(OpKind::Insert, *start, *end, payloads),
            Self::UpdateRange {
                start,
                end,
                payloads,
            } => encode_dense_range(OpKind::Update, *start, *end, payloads),
            Self::PartialUpdate { pos, patch } => {
                encode_single(OpKind::Update, true, *pos, Some(patch))
            }
            Self::PartialUpdateRange {
                start,
                end,
                patches,
            } => encode_sparse_range(*start, *end, patches),
        }
    }

    /// Parse exactly one frame from `bytes`.
    ///
    /// The whole slice is consumed: any bytes left over after a
    /// fixed-shape frame is fully read are rejected with
    /// [`CodecError::Malformed`], since the codec assumes the transport
    /// hands it exactly one frame per call.
    ///
    /// # Errors
    /// Returns [`CodecError::Truncated`] on underrun and
    /// [`CodecError::Malformed`] or [`CodecError::BadRange`] on structural
    /// violations. Never mutates anything; a failed decode has no
    /// observable side effect.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut buf: &[u8] = bytes;
        let header_byte = take_byte(&mut buf)?;
        let header = Header::unpack(header_byte)?;

        let frame = match (header.op, header.bulk, header.partial) {
            (OpKind::Delete, false, false) => {
                let pos = decode_fixed(&mut buf, header.pos_width)?;
                Self::Delete { pos }
            }
            (OpKind::Delete, true, false) => {
                let (start, end) = decode_range_header(&mut buf, &header)?;
                Self::DeleteRange { start, end }
            }
            (OpKind::Insert, false, false) => {
                let (pos, payload) = decode_single_payload(&mut buf, &header)?;
                Self::Insert { pos, payload }
            }
            (OpKind::Update, false, false) => {
                let (pos, payload) = decode_single_payload(&mut buf, &header)?;
                Self::Update { pos, payload }
            }
            (OpKind::Insert, true, false) => {
                let (start, end, payloads) = decode_dense_range(&mut buf, &header)?;
                Self::InsertRange {
                    start,
                    end,
                    payloads,
                }
            }
            (OpKind::Update, true, false) => {
                let (start, end, payloads) = decode_dense_range(&mut buf, &header)?;
                Self::UpdateRange {
                    start,
                    end,
                    payloads,
                }
            }
            (OpKind::Update, false, true) => {
                let (pos, payload) = decode_single_payload(&mut buf, &header)?;
                Self::PartialUpdate { pos, patch: payload }
            }
            (OpKind::Update, true, true) => {
                let (start, end, patches) = decode_sparse_range(&mut buf, &header)?;
                Self::PartialUpdateRange {
                    start,
                    end,
                    patches,
                }
            }
            // Header::unpack already rejects DELETE+partial and
            // INSERT+partial, so these combinations cannot reach here.
            (OpKind::Delete, _, true) | (OpKind::Insert, _, true) => {
                return Err(CodecError::InternalInvariant(
                    "Header::unpack must reject DELETE/INSERT with partial set",
                ));
            }
        };

        if !buf.is_empty() {
            return Err(MalformedReason::TrailingBytes(buf.len()).into());
        }
        Ok(frame)
    }
}

fn take_byte(buf: &mut &[u8]) -> Result<u8, CodecError> {
    if buf.is_empty() {
        return Err(CodecError::Truncated {
            needed: 1,
            available: 0,
        });
    }
    Ok(buf.get_u8())
}

fn encode_single(
    op: OpKind,
    partial: bool,
    pos: u32,
    payload: Option<&[u8]>,
) -> Result<Bytes, CodecError> {
    let pos_width = min_width(pos)?;
    let len_width = match payload {
        Some(bytes) => min_width(require_u32(bytes.len())?)?,
        None => 0,
    };
    let header = Header {
        op,
        bulk: false,
        partial,
        pos_width,
        len_width,
    };
    let mut buf = BytesMut::with_capacity(
        1 + usize::from(pos_width) + usize::from(len_width) + payload.map_or(0, <[u8]>::len),
    );
    buf.put_u8(header.pack());
    encode_fixed(&mut buf, pos, pos_width)?;
    if let Some(bytes) = payload {
        let len = require_u32(bytes.len())?;
        encode_fixed(&mut buf, len, len_width)?;
        buf.extend_from_slice(bytes);
    }
    Ok(buf.freeze())
}

fn encode_bare_range(op: OpKind, start: u32, end: u32) -> Result<Bytes, CodecError> {
    check_range(start, end)?;
    let pos_width = min_width(end)?;
    let header = Header {
        op,
        bulk: true,
        partial: false,
        pos_width,
        len_width: 0,
    };
    let mut buf = BytesMut::with_capacity(1 + 2 * usize::from(pos_width));
    buf.put_u8(header.pack());
    encode_fixed(&mut buf, start, pos_width)?;
    encode_fixed(&mut buf, end, pos_width)?;
    Ok(buf.freeze())
}

fn encode_dense_range(
    op: OpKind,
    start: u32,
    end: u32,
    payloads: &[Vec<u8>],
) -> Result<Bytes, CodecError> {
    check_range(start, end)?;
    let expected = end - start + 1;
    let expected_usize = usize::try_from(expected)
        .map_err(|_| CodecError::InternalInvariant("range size must fit in usize"))?;
    if payloads.len() != expected_usize {
        return Err(CodecError::ArityMismatch {
            expected,
            actual: payloads.len(),
        });
    }
    let pos_width = min_width(end)?;
    let len_width = min_width(max_payload_len(payloads)?)?;
    let header = Header {
        op,
        bulk: true,
        partial: false,
        pos_width,
        len_width,
    };
    let mut buf = BytesMut::new();
    buf.put_u8(header.pack());
    encode_fixed(&mut buf, start, pos_width)?;
    encode_fixed(&mut buf, end, pos_width)?;
    for payload in payloads {
        let len = require_u32(payload.len())?;
        encode_fixed(&mut buf, len, len_width)?;
        buf.extend_from_slice(payload);
    }
    Ok(buf.freeze())
}

fn encode_sparse_range(start: u32, end: u32, patches: &[Patch]) -> Result<Bytes, CodecError> {
    check_range(start, end)?;
    for patch in patches {
        if patch.pos < start || patch.pos > end {
            return Err(MalformedReason::PatchOutOfRange {
                pos: patch.pos,
                start,
                end,
            }
            .into());
        }
    }
    let mut max_pos = end;
    let mut max_len = 0u32;
    for patch in patches {
        max_pos = max_pos.max(patch.pos);
        max_len = max_len.max(require_u32(patch.payload.len())?);
    }
    let pos_width = min_width(max_pos)?;
    let len_width = min_width(max_len)?;
    let header = Header {
        op: OpKind::Update,
        bulk: true,
        partial: true,
        pos_width,
        len_width,
    };
    let mut buf = BytesMut::new();
    buf.put_u8(header.pack());
    encode_fixed(&mut buf, start, pos_width)?;
    encode_fixed(&mut buf, end, pos_width)?;
    for patch in patches {
        encode_fixed(&mut buf, patch.pos, pos_width)?;
        let len = require_u32(patch.payload.len())?;
        encode_fixed(&mut buf, len, len_width)?;
        buf.extend_from_slice(&patch.payload);
    }
    Ok(buf.freeze())
}

fn decode_range_header(buf: &mut &[u8], header: &Header) -> Result<(u32, u32), CodecError> {
    let start = decode_fixed(buf, header.pos_width)?;
    let end = decode_fixed(buf, header.pos_width)?;
    check_range(start, end)?;
    Ok((start, end))
}

fn decode_payload(buf: &mut &[u8], header: &Header) -> Result<Vec<u8>, CodecError> {
    if header.len_width == 0 {
        return Err(MalformedReason::MissingLengthWidth.into());
    }
    let len = decode_fixed(buf, header.len_width)?;
    let len = usize::try_from(len)
        .map_err(|_| CodecError::InternalInvariant("payload length must fit in usize"))?;
    if buf.len() < len {
        return Err(CodecError::Truncated {
            needed: len,
            available: buf.len(),
        });
    }
    let (payload, rest) = buf.split_at(len);
    *buf = rest;
    Ok(payload.to_vec())
}

fn decode_single_payload(buf: &mut &[u8], header: &Header) -> Result<(u32, Vec<u8>), CodecError> {
    let pos = decode_fixed(buf, header.pos_width)?;
    let payload = decode_payload(buf, header)?;
    Ok((pos, payload))
}

fn decode_dense_range(
    buf: &mut &[u8],
    header: &Header,
) -> Result<(u32, u32, Vec<Vec<u8>>), CodecError> {
    let (start, end) = decode_range_header(buf, header)?;
    let count = usize::try_from(end - start)
        .map_err(|_| CodecError::InternalInvariant("range size must fit in usize"))?
        + 1;
    let mut payloads = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        payloads.push(decode_payload(buf, header)?);
    }
    Ok((start, end, payloads))
}

fn decode_sparse_range(
    buf: &mut &[u8],
    header: &Header,
) -> Result<(u32, u32, Vec<Patch>), CodecError> {
    let (start, end) = decode_range_header(buf, header)?;
    let mut patches = Vec::new();
    while !buf.is_empty() {
        let pos = decode_fixed(buf, header.pos_width)?;
        if pos < start || pos > end {
            return Err(MalformedReason::PatchOutOfRange { pos, start, end }.into());
        }
        let payload = decode_payload(buf, header)?;
        patches.push(Patch { pos, payload });
    }
    Ok((start, end, patches))
}
