//! QUIC variable-length integers (RFC 9000, section 16). Used as the flow id
//! prefix so that the receiving side can tell flows sharing one connection apart.

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// A 62-bit integer encoded in 1, 2, 4 or 8 bytes. The two most significant
/// bits of the first byte hold log2 of the encoded length.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VarInt(u64);

impl VarInt {
    pub const MAX: u64 = (1 << 62) - 1;

    pub fn new(val: u64) -> Option<Self> {
        (val <= Self::MAX).then_some(VarInt(val))
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn encoded_len(self) -> usize {
        if self.0 < 0x40 {
            1
        } else if self.0 < 0x4000 {
            2
        } else if self.0 < 0x4000_0000 {
            4
        } else {
            8
        }
    }

    pub fn encode(self, buf: &mut impl BufMut) {
        match self.encoded_len() {
            1 => buf.put_u8(self.0 as u8),
            2 => buf.put_u16(0x4000 | self.0 as u16),
            4 => buf.put_u32(0x8000_0000 | self.0 as u32),
            _ => buf.put_u64(0xC000_0000_0000_0000 | self.0),
        }
    }

    pub fn to_bytes(self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Returns None if the buffer is too short. The buffer is not advanced in that case.
    pub fn decode(buf: &mut impl Buf) -> Option<Self> {
        let first = *buf.chunk().first()?;
        let len = 1usize << (first >> 6);
        if buf.remaining() < len {
            return None;
        }
        let val = match len {
            1 => u64::from(buf.get_u8() & 0x3F),
            2 => u64::from(buf.get_u16() & 0x3FFF),
            4 => u64::from(buf.get_u32() & 0x3FFF_FFFF),
            _ => buf.get_u64() & Self::MAX,
        };
        Some(VarInt(val))
    }
}

impl TryFrom<u64> for VarInt {
    type Error = crate::Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        VarInt::new(value).ok_or(crate::Error::FlowIdTooLarge(value))
    }
}

impl From<u32> for VarInt {
    fn from(value: u32) -> Self {
        VarInt(value.into())
    }
}

impl std::fmt::Debug for VarInt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for VarInt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
