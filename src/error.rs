//! Error types for the array-mutation frame codec and applier.

use thiserror::Error;

/// Upper bound for positions and payload lengths: `2^24 - 1`.
pub const MAX_VALUE: u32 = 0x00FF_FFFF;

/// Errors surfaced at the codec boundary.
///
/// Every variant maps to one of the kinds in the frame codec's error
/// taxonomy. The codec never logs or retries; callers receive one of these
/// and the replica (if any) is left exactly as it was before the call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A position or payload length exceeds [`MAX_VALUE`] during encoding.
    #[error("value {value} exceeds the 24-bit limit of {limit}")]
    OutOfRange {
        /// The offending value.
        value: u64,
        /// The limit it exceeded.
        limit: u64,
    },
    /// A bulk frame's range has `end < start`.
    #[error("bulk range end {end} is before start {start}")]
    BadRange {
        /// Declared range start.
        start: u32,
        /// Declared range end.
        end: u32,
    },
    /// A dense bulk frame's payload count does not match `end - start + 1`.
    #[error("dense bulk frame expected {expected} payload(s) but got {actual}")]
    ArityMismatch {
        /// Required payload count, `end - start + 1`.
        expected: u32,
        /// Payload count actually supplied.
        actual: usize,
    },
    /// The decoder ran off the end of the input.
    #[error("frame truncated: needed {needed} byte(s), only {available} available")]
    Truncated {
        /// Bytes required to continue decoding.
        needed: usize,
        /// Bytes actually remaining in the input.
        available: usize,
    },
    /// The decoded header or body violates a structural invariant.
    #[error("malformed frame: {0}")]
    Malformed(#[from] MalformedReason),
    /// An assertion about the codec's own state failed.
    ///
    /// Reserved for conditions that should be unreachable; if a caller
    /// observes this, it indicates a bug in the codec itself.
    #[error("internal codec invariant violated: {0}")]
    InternalInvariant(&'static str),
}

/// Specific reason a frame was rejected as malformed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// The header carried the reserved operation codepoint `0b10`.
    #[error("reserved operation code 0b10")]
    ReservedOperation,
    /// A DELETE header had the partial flag set.
    #[error("DELETE frame must not set the partial flag")]
    DeletePartial,
    /// A DELETE header declared a non-zero data-length width.
    #[error("DELETE frame must declare a data-length width of 0")]
    DeleteHasLengthWidth,
    /// An INSERT header had the partial flag set; only UPDATE has a
    /// partial-patch variant.
    #[error("INSERT frame must not set the partial flag")]
    InsertPartial,
    /// The decoder consumed a structurally complete frame but bytes
    /// remained in the input.
    #[error("{0} trailing byte(s) after a complete frame")]
    TrailingBytes(usize),
    /// An INSERT/UPDATE header declared a data-length width of 0 while its
    /// shape requires payload length fields.
    #[error("frame expects a payload but declares a data-length width of 0")]
    MissingLengthWidth,
    /// The header declared a position width of 0.
    #[error("position width must not be 0")]
    ZeroPositionWidth,
    /// A sparse patch's position fell outside the frame's declared range.
    #[error("patch position {pos} lies outside declared range [{start}, {end}]")]
    PatchOutOfRange {
        /// The offending patch position.
        pos: u32,
        /// Declared range start (inclusive).
        start: u32,
        /// Declared range end (inclusive).
        end: u32,
    },
}
