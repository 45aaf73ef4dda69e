//! Seams to the RTP/RTCP packet codec. Packet formats are implemented
//! elsewhere; flows only need to serialize packets and read a few header
//! fields.

use bytes::BufMut;

use crate::error::MarshalError;

pub trait Marshal {
    fn marshal_size(&self) -> usize;

    /// Append the wire representation of the packet to `buf`.
    fn marshal_to(&self, buf: &mut dyn BufMut) -> Result<(), MarshalError>;
}

pub trait RtpHeader: Marshal + Send + Sync {
    fn ssrc(&self) -> u32;
    fn sequence_number(&self) -> u16;
    fn marker(&self) -> bool;
    fn payload_type(&self) -> u8;
}

pub trait RtcpPacket: Marshal + Send + Sync {}

impl<P: RtcpPacket + ?Sized> RtcpPacket for Box<P> {}

impl<P: Marshal + ?Sized> Marshal for Box<P> {
    fn marshal_size(&self) -> usize {
        (**self).marshal_size()
    }

    fn marshal_to(&self, buf: &mut dyn BufMut) -> Result<(), MarshalError> {
        (**self).marshal_to(buf)
    }
}
