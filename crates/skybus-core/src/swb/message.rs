//! Bus message type and the id abstraction shared with the protocol
//! dispatcher.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::buffer::ConstSharedBufferPtr;

/// Small unsigned integer identifying a message stream.
///
/// Implemented for `u8`/`u16`/`u32`/`u64`. The wire form is the big-endian
/// prefix of a packet, per the CCSDS convention of the surrounding system.
pub trait MessageId: Copy + Eq + Ord + Send + Sync + fmt::Debug + 'static {
    /// Mask with every bit set.
    const FULL_MASK: Self;

    /// Number of bytes the id occupies at the front of a packet.
    const WIRE_SIZE: usize;

    /// Bitwise AND with `mask`.
    fn masked(self, mask: Self) -> Self;

    /// Parse the id from the first [`WIRE_SIZE`](Self::WIRE_SIZE) bytes.
    /// Returns `None` on short input.
    fn from_wire(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_message_id {
    ($ty:ty, $size:expr, $read:expr) => {
        impl MessageId for $ty {
            const FULL_MASK: Self = <$ty>::MAX;
            const WIRE_SIZE: usize = $size;

            #[inline]
            fn masked(self, mask: Self) -> Self {
                self & mask
            }

            fn from_wire(bytes: &[u8]) -> Option<Self> {
                if bytes.len() < $size {
                    return None;
                }
                let read = $read;
                Some(read(bytes))
            }
        }
    };
}

impl_message_id!(u8, 1, |bytes: &[u8]| bytes[0]);
impl_message_id!(u16, 2, |bytes: &[u8]| BigEndian::read_u16(bytes));
impl_message_id!(u32, 4, |bytes: &[u8]| BigEndian::read_u32(bytes));
impl_message_id!(u64, 8, |bytes: &[u8]| BigEndian::read_u64(bytes));

/// One routable message: an id plus a shared payload buffer.
///
/// A message without a buffer is legal and denotes a zero-length signal;
/// [`payload`](BusMessage::payload) reads as empty then.
#[derive(Clone, Debug)]
pub struct BusMessage<I: MessageId> {
    pub id: I,
    pub buffer: Option<ConstSharedBufferPtr>,
}

impl<I: MessageId> BusMessage<I> {
    pub fn new(id: I, buffer: Option<ConstSharedBufferPtr>) -> Self {
        Self { id, buffer }
    }

    /// Signal message without payload.
    pub fn signal(id: I) -> Self {
        Self { id, buffer: None }
    }

    /// The payload bytes; empty for signal messages.
    pub fn payload(&self) -> &[u8] {
        self.buffer.as_ref().map_or(&[], |buffer| buffer.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SharedBufferPool;

    #[test]
    fn wire_parsing_is_big_endian() {
        assert_eq!(u8::from_wire(&[0xAB, 0xCD]), Some(0xAB));
        assert_eq!(u16::from_wire(&[0x12, 0x34, 0x56]), Some(0x1234));
        assert_eq!(u32::from_wire(&[0, 0, 0x10, 0x20]), Some(0x1020));
        assert_eq!(u16::from_wire(&[0x12]), None);
    }

    #[test]
    fn masking() {
        assert_eq!(0x1234u16.masked(0xFF00), 0x1200);
        assert_eq!(u16::FULL_MASK, 0xFFFF);
    }

    #[test]
    fn signal_messages_have_empty_payload() {
        let message: BusMessage<u16> = BusMessage::signal(7);
        assert!(message.buffer.is_none());
        assert_eq!(message.payload(), &[] as &[u8]);
    }

    #[test]
    fn cloning_a_message_shares_the_buffer() {
        let pool = SharedBufferPool::new(8, 1);
        let buffer = pool.allocate().unwrap();
        let message = BusMessage::new(1u16, Some(buffer.into()));

        let copy = message.clone();
        assert_eq!(copy.buffer.as_ref().unwrap().reference_count(), 2);
        drop(message);
        assert_eq!(copy.buffer.as_ref().unwrap().reference_count(), 1);
    }
}
