use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::{
    Error, Result,
    metrics::METRICS,
    traits::{DeliveryNotifier, Transport},
    varint::VarInt,
};

/// A logical channel on a shared transport connection.
///
/// An identified flow prefixes every payload with its id encoded as a QUIC
/// varint, so the receiver can demultiplex flows sharing one connection.
pub struct Flow {
    transport: Option<Box<dyn Transport>>,
    id: Option<VarInt>,
    // Precomputed from id, empty for unidentified flows.
    encoded_id: Bytes,
}

impl Default for Flow {
    fn default() -> Self {
        Self::new()
    }
}

impl Flow {
    pub fn new() -> Self {
        Self {
            transport: None,
            id: None,
            encoded_id: Bytes::new(),
        }
    }

    pub fn with_id(id: u64) -> Result<Self> {
        let id = VarInt::try_from(id)?;
        Ok(Self {
            transport: None,
            id: Some(id),
            encoded_id: id.to_bytes(),
        })
    }

    pub fn id(&self) -> Option<u64> {
        self.id.map(VarInt::value)
    }

    pub fn is_bound(&self) -> bool {
        self.transport.is_some()
    }

    /// Replaces any previous binding. Packets already handed to the previous
    /// transport stay with it, including their pending delivery notifications.
    pub fn bind(&mut self, transport: impl Transport) {
        self.transport = Some(Box::new(transport));
    }

    fn frame(&self, payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.encoded_id.len() + payload.len());
        buf.put_slice(&self.encoded_id);
        buf.put_slice(payload);
        buf
    }

    fn transport(&self) -> Result<&dyn Transport> {
        self.transport.as_deref().ok_or(Error::NotBound)
    }

    /// Returns the number of bytes the transport accepted, including the id prefix.
    pub fn write(&self, payload: &[u8]) -> Result<usize> {
        let transport = self.transport()?;
        let buf = self.frame(payload);
        let res = transport.write(&buf);
        self.account(res, buf.len())
    }

    /// Like [`Flow::write`], and `notifier` is resolved once the transport
    /// knows whether the packet was delivered.
    ///
    /// Fails with [`Error::DeliveryNotificationUnsupported`] without writing
    /// anything if the transport can't report delivery.
    pub fn write_with_delivery(
        &self,
        payload: &[u8],
        notifier: DeliveryNotifier,
    ) -> Result<usize> {
        let transport = match self.transport() {
            Ok(t) => t,
            Err(e) => {
                notifier.disarm();
                return Err(e);
            }
        };
        let Some(transport) = transport.as_delivery_aware() else {
            notifier.disarm();
            return Err(Error::DeliveryNotificationUnsupported);
        };
        let buf = self.frame(payload);
        let res = transport
            .write_with_delivery(&buf, notifier)
            .map_err(|rejected| {
                // Not on the wire, so neither acked nor lost.
                rejected.notifier.disarm();
                rejected.error
            });
        self.account(res, buf.len())
    }

    fn account(&self, res: std::io::Result<usize>, len: usize) -> Result<usize> {
        match res {
            Ok(written) => {
                METRICS.send_count.increment(1);
                METRICS.sent_bytes.increment(written as u64);
                trace!(flow_id = ?self.id, len, written, "wrote packet");
                Ok(written)
            }
            Err(e) => {
                METRICS.send_errors.increment(1);
                Err(Error::Write(e))
            }
        }
    }
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("id", &self.id)
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}
