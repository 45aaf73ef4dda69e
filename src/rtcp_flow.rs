use bytes::BytesMut;
use tracing::trace;

use crate::{Error, Result, codec::RtcpPacket, flow::Flow, metrics::METRICS, traits::Transport};

/// Carries RTCP. Writes are plain best-effort writes: RTCP is control traffic
/// and isn't tracked for congestion feedback itself.
#[derive(Debug, Default)]
pub struct RtcpFlow {
    flow: Flow,
}

impl RtcpFlow {
    pub fn new() -> Self {
        Self { flow: Flow::new() }
    }

    pub fn with_id(id: u64) -> Result<Self> {
        Ok(Self {
            flow: Flow::with_id(id)?,
        })
    }

    pub fn bind(&mut self, transport: impl Transport) {
        self.flow.bind(transport);
    }

    /// Serializes `pkts` back to back as one compound packet and writes it.
    pub fn write<P: RtcpPacket>(&self, pkts: &[P]) -> Result<usize> {
        let size = pkts.iter().map(|p| p.marshal_size()).sum();
        let mut buf = BytesMut::with_capacity(size);
        for p in pkts {
            p.marshal_to(&mut buf).map_err(Error::Marshal)?;
        }
        trace!(packets = pkts.len(), len = buf.len(), "writing rtcp");
        METRICS.rtcp_writes.increment(1);
        self.flow.write(&buf)
    }
}
