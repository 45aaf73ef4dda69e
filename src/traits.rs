use std::{sync::Arc, time::Instant};

/// An abstraction for the underlying transport a flow writes onto: a QUIC
/// datagram or stream handle, a TCP connection, or a connected UDP socket.
///
/// Writes must not block for long. Tests use mock transports.
pub trait Transport: Send + Sync + 'static {
    fn write(&self, buf: &[u8]) -> std::io::Result<usize>;

    /// Transports that can tell whether a write reached the peer return
    /// themselves here.
    fn as_delivery_aware(&self) -> Option<&dyn DeliveryAwareTransport> {
        None
    }
}

/// A transport that reports for every accepted write whether it was
/// acknowledged by the peer or declared lost.
pub trait DeliveryAwareTransport: Send + Sync {
    /// On success the transport takes ownership of the notifier and must
    /// eventually resolve it. A write it refuses (e.g. `WouldBlock`) returns the
    /// notifier unresolved inside [`WriteRejected`].
    fn write_with_delivery(
        &self,
        buf: &[u8],
        notifier: DeliveryNotifier,
    ) -> Result<usize, WriteRejected>;
}

/// A write the transport did not accept, with the notifier handed back.
#[derive(Debug)]
pub struct WriteRejected {
    pub error: std::io::Error,
    pub notifier: DeliveryNotifier,
}

impl WriteRejected {
    pub fn new(error: std::io::Error, notifier: DeliveryNotifier) -> Self {
        Self { error, notifier }
    }
}

impl<T: Transport> Transport for Arc<T> {
    fn write(&self, buf: &[u8]) -> std::io::Result<usize> {
        (**self).write(buf)
    }

    fn as_delivery_aware(&self) -> Option<&dyn DeliveryAwareTransport> {
        (**self).as_delivery_aware()
    }
}

impl Transport for tokio::net::UdpSocket {
    // The socket must be connected. try_send never blocks; a full socket buffer
    // surfaces as WouldBlock to the caller.
    fn write(&self, buf: &[u8]) -> std::io::Result<usize> {
        self.try_send(buf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Acked,
    Lost,
}

impl Delivery {
    pub fn is_acked(self) -> bool {
        matches!(self, Delivery::Acked)
    }
}

impl From<bool> for Delivery {
    fn from(acked: bool) -> Self {
        if acked { Delivery::Acked } else { Delivery::Lost }
    }
}

type DeliveryCallback = Box<dyn FnOnce(Delivery) + Send + 'static>;

/// One-shot completion handle attached to a single write.
///
/// It is resolved exactly once: either explicitly through [`DeliveryNotifier::notify`],
/// or as [`Delivery::Lost`] when dropped unresolved.
pub struct DeliveryNotifier {
    callback: Option<DeliveryCallback>,
}

impl DeliveryNotifier {
    pub fn new(callback: impl FnOnce(Delivery) + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    pub fn notify(mut self, delivery: Delivery) {
        if let Some(cb) = self.callback.take() {
            cb(delivery);
        }
    }

    /// Drop without resolving. Used when the write was rejected before the
    /// transport accepted the packet, so there is nothing to report.
    pub(crate) fn disarm(mut self) {
        self.callback = None;
    }
}

impl Drop for DeliveryNotifier {
    fn drop(&mut self) {
        if let Some(cb) = self.callback.take() {
            cb(Delivery::Lost);
        }
    }
}

impl std::fmt::Debug for DeliveryNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryNotifier")
            .field("armed", &self.callback.is_some())
            .finish()
    }
}

// A trait for mocking time in tests.
pub trait FlowEnvironment: Send + Sync + Unpin + 'static {
    fn now(&self) -> Instant;
    fn copy(&self) -> Self;
}

#[derive(Default, Clone, Copy, Debug)]
pub struct DefaultFlowEnvironment {}

impl FlowEnvironment for DefaultFlowEnvironment {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn copy(&self) -> Self {
        *self
    }
}
