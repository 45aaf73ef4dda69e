use bytes::Bytes;
use rustc_hash::FxHashMap as HashMap;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::trace;

use crate::{Error, Result, varint::VarInt};

/// Split an identified flow's packet into its flow id and payload.
pub fn split_flow_id(mut packet: Bytes) -> Result<(u64, Bytes)> {
    let id = VarInt::decode(&mut packet).ok_or(Error::MalformedFlowId)?;
    Ok((id.value(), packet))
}

/// Receiving side of identified flows: strips the flow id from each incoming
/// packet and forwards the payload to whoever registered that id.
#[derive(Debug, Default)]
pub struct FlowDemuxer {
    flows: HashMap<u64, UnboundedSender<Bytes>>,
}

impl FlowDemuxer {
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces an earlier registration of the same id.
    pub fn register(&mut self, flow_id: u64) -> UnboundedReceiver<Bytes> {
        let (tx, rx) = unbounded_channel();
        self.flows.insert(flow_id, tx);
        rx
    }

    pub fn unregister(&mut self, flow_id: u64) -> bool {
        self.flows.remove(&flow_id).is_some()
    }

    /// Returns the id of the flow the packet was routed to. A receiver that was
    /// dropped is unregistered and reported as an unknown flow.
    pub fn dispatch(&mut self, packet: Bytes) -> Result<u64> {
        let (flow_id, payload) = split_flow_id(packet)?;
        let Some(tx) = self.flows.get(&flow_id) else {
            return Err(Error::UnknownFlow(flow_id));
        };
        let len = payload.len();
        if tx.send(payload).is_err() {
            trace!(flow_id, "receiver dropped, unregistering");
            self.flows.remove(&flow_id);
            return Err(Error::UnknownFlow(flow_id));
        }
        trace!(flow_id, len, "dispatched");
        Ok(flow_id)
    }
}
