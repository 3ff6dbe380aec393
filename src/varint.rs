//! Minimum-width unsigned integer encoding.
//!
//! Positions and payload lengths are carried on the wire in 0, 1, 2, or 3
//! raw big-endian bytes, as selected by a 2-bit width indicator in the
//! frame header (see [`crate::header`]). This module is the single place
//! that reads and writes those fixed-width integers.

#![expect(
    clippy::big_endian_bytes,
    reason = "wire format is explicitly big-endian"
)]

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{CodecError, MAX_VALUE};

/// Return the minimum width in `{1, 2, 3}` that can hold `value`.
///
/// # Errors
/// Returns [`CodecError::OutOfRange`] if `value` exceeds [`MAX_VALUE`].
pub fn min_width(value: u32) -> Result<u8, CodecError> {
    if value > MAX_VALUE {
        return Err(CodecError::OutOfRange {
            value: u64::from(value),
            limit: u64::from(MAX_VALUE),
        });
    }
    Ok(if value <= 0xFF {
        1
    } else if value <= 0xFFFF {
        2
    } else {
        3
    })
}

/// Write `value` into `buf` using exactly `width` big-endian bytes.
///
/// `width == 0` writes nothing (and is only legal for lengths, never for
/// positions).
///
/// # Errors
/// Returns [`CodecError::OutOfRange`] if `value` does not fit in `width`
/// bytes, or [`CodecError::InternalInvariant`] if `width > 3`.
pub fn encode_fixed(buf: &mut BytesMut, value: u32, width: u8) -> Result<(), CodecError> {
    match width {
        0 => Ok(()),
        1 => {
            let narrow = u8::try_from(value).map_err(|_| CodecError::OutOfRange {
                value: u64::from(value),
                limit: u64::from(u8::MAX),
            })?;
            buf.put_u8(narrow);
            Ok(())
        }
        2 => {
            let narrow = u16::try_from(value).map_err(|_| CodecError::OutOfRange {
                value: u64::from(value),
                limit: u64::from(u16::MAX),
            })?;
            buf.put_u16(narrow);
            Ok(())
        }
        3 => {
            if value > MAX_VALUE {
                return Err(CodecError::OutOfRange {
                    value: u64::from(value),
                    limit: u64::from(MAX_VALUE),
                });
            }
            let be = value.to_be_bytes();
            let Some(upper_three) = be.get(1..) else {
                return Err(CodecError::InternalInvariant(
                    "a u32's be_bytes always has 4 elements",
                ));
            };
            buf.extend_from_slice(upper_three);
            Ok(())
        }
        _ => Err(CodecError::InternalInvariant("width must be in 0..=3")),
    }
}

/// Read exactly `width` big-endian bytes from `buf` as an unsigned integer.
///
/// `width == 0` consumes nothing and returns `0`.
///
/// # Errors
/// Returns [`CodecError::Truncated`] if fewer than `width` bytes remain, or
/// [`CodecError::InternalInvariant`] if `width > 3`.
pub fn decode_fixed(buf: &mut &[u8], width: u8) -> Result<u32, CodecError> {
    let needed = usize::from(width);
    if width > 3 {
        return Err(CodecError::InternalInvariant("width must be in 0..=3"));
    }
    if buf.len() < needed {
        return Err(CodecError::Truncated {
            needed,
            available: buf.len(),
        });
    }
    let value = match width {
        0 => 0,
        1 => u32::from(buf.get_u8()),
        2 => u32::from(buf.get_u16()),
        _ => {
            let hi = u32::from(buf.get_u8());
            let mid = u32::from(buf.get_u8());
            let lo = u32::from(buf.get_u8());
            (hi << 16) | (mid << 8) | lo
        }
    };
    Ok(value)
}
