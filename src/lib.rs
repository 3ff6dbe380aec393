//! A bit-packed binary codec for array-mutation operations, and a pure
//! applier that replays decoded operations against a replica array.
//!
//! The wire format is a single-byte header (operation kind, bulk/partial
//! flags, and position/length width indicators) followed by whatever
//! positions, lengths, and opaque payload bytes the operation needs. See
//! [`header`] for the header layout and [`frame`] for the eight concrete
//! frame shapes this crate can encode and decode.
//!
//! [`replica::Replica`] is the only stateful piece: it owns an ordered,
//! zero-indexed sequence of optional payloads and applies one decoded
//! [`frame::Frame`] at a time. Decoding is pure and always completes before
//! any mutation, so a frame that fails to decode leaves the replica
//! untouched.

#![cfg_attr(
    test,
    expect(clippy::big_endian_bytes, reason = "wire format is explicitly big-endian")
)]
#![cfg_attr(test, expect(clippy::unwrap_used, reason = "test code can panic"))]
#![cfg_attr(
    test,
    expect(clippy::indexing_slicing, reason = "test code with known bounds")
)]
#![cfg_attr(test, expect(clippy::shadow_reuse, reason = "test code shadowing"))]

pub mod error;
pub mod frame;
pub mod header;
pub mod replica;
pub mod varint;

pub use error::CodecError;
pub use frame::{Frame, Patch};
pub use header::{Header, OpKind};
pub use replica::{Replica, Slot};
