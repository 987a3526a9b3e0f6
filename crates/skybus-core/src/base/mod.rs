//! Byte- and bit-level building blocks: saturating slice views, bitfield
//! access in both byte orders, and the bit-serial append stream.

pub mod bitfield;

mod bitstream;
mod slice_ext;

pub use bitstream::{BitStream, HEADER_SIZE as BITSTREAM_HEADER_SIZE};
pub use slice_ext::{CopyFrom, SliceExt};
