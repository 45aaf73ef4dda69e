use bytes::BufMut;

use crate::{
    codec::{Marshal, RtcpPacket, RtpHeader},
    error::MarshalError,
};

// Fixed 12-byte RTP header without CSRCs or extensions.
#[derive(Debug, Clone, Default)]
pub struct TestRtpHeader {
    pub ssrc: u32,
    pub sequence_number: u16,
    pub marker: bool,
    pub payload_type: u8,
    pub timestamp: u32,
}

impl TestRtpHeader {
    pub fn new(ssrc: u32, sequence_number: u16) -> Self {
        Self {
            ssrc,
            sequence_number,
            payload_type: 96,
            ..Default::default()
        }
    }

    pub fn marked(mut self) -> Self {
        self.marker = true;
        self
    }
}

impl Marshal for TestRtpHeader {
    fn marshal_size(&self) -> usize {
        12
    }

    fn marshal_to(&self, buf: &mut dyn BufMut) -> Result<(), MarshalError> {
        buf.put_u8(0x80);
        buf.put_u8(((self.marker as u8) << 7) | (self.payload_type & 0x7F));
        buf.put_u16(self.sequence_number);
        buf.put_u32(self.timestamp);
        buf.put_u32(self.ssrc);
        Ok(())
    }
}

impl RtpHeader for TestRtpHeader {
    fn ssrc(&self) -> u32 {
        self.ssrc
    }

    fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    fn marker(&self) -> bool {
        self.marker
    }

    fn payload_type(&self) -> u8 {
        self.payload_type
    }
}

/// An already serialized RTCP packet.
#[derive(Debug, Clone)]
pub struct RawRtcp(pub Vec<u8>);

impl Marshal for RawRtcp {
    fn marshal_size(&self) -> usize {
        self.0.len()
    }

    fn marshal_to(&self, buf: &mut dyn BufMut) -> Result<(), MarshalError> {
        buf.put_slice(&self.0);
        Ok(())
    }
}

impl RtcpPacket for RawRtcp {}

#[derive(Debug, Clone)]
pub struct BrokenRtcp;

impl Marshal for BrokenRtcp {
    fn marshal_size(&self) -> usize {
        4
    }

    fn marshal_to(&self, _buf: &mut dyn BufMut) -> Result<(), MarshalError> {
        Err("invalid report count".into())
    }
}

impl RtcpPacket for BrokenRtcp {}
