use std::sync::Arc;

use parking_lot::Mutex;

use crate::traits::{Delivery, DeliveryAwareTransport, DeliveryNotifier, Transport, WriteRejected};

#[derive(Default)]
struct MockTransportInner {
    written: Vec<Vec<u8>>,
    fail_next: Option<std::io::ErrorKind>,
}

/// Records plain writes. Can't report delivery.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn take_written(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.inner.lock().written)
    }

    pub fn fail_next_write(&self, kind: std::io::ErrorKind) {
        self.inner.lock().fail_next = Some(kind);
    }
}

impl Transport for MockTransport {
    fn write(&self, buf: &[u8]) -> std::io::Result<usize> {
        let mut g = self.inner.lock();
        if let Some(kind) = g.fail_next.take() {
            return Err(kind.into());
        }
        g.written.push(buf.to_owned());
        Ok(buf.len())
    }
}

#[derive(Default)]
struct MockDeliveryTransportInner {
    written: Vec<Vec<u8>>,
    notifiers: Vec<Option<DeliveryNotifier>>,
    fail_next: Option<std::io::ErrorKind>,
}

/// Records writes and keeps their notifiers until the test resolves them,
/// simulating acks and losses arriving at arbitrary times.
#[derive(Clone, Default)]
pub struct MockDeliveryTransport {
    inner: Arc<Mutex<MockDeliveryTransportInner>>,
}

impl MockDeliveryTransport {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.inner.lock().written.clone()
    }

    /// The next delivery write is refused, as a full send buffer would.
    pub fn fail_next_write(&self, kind: std::io::ErrorKind) {
        self.inner.lock().fail_next = Some(kind);
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().notifiers.iter().flatten().count()
    }

    /// Resolve the notifier of the idx-th write. No-op if already resolved.
    pub fn resolve(&self, idx: usize, delivery: Delivery) {
        let n = self
            .inner
            .lock()
            .notifiers
            .get_mut(idx)
            .and_then(|n| n.take());
        if let Some(n) = n {
            n.notify(delivery);
        }
    }
}

impl Transport for MockDeliveryTransport {
    fn write(&self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().written.push(buf.to_owned());
        Ok(buf.len())
    }

    fn as_delivery_aware(&self) -> Option<&dyn DeliveryAwareTransport> {
        Some(self)
    }
}

impl DeliveryAwareTransport for MockDeliveryTransport {
    fn write_with_delivery(
        &self,
        buf: &[u8],
        notifier: DeliveryNotifier,
    ) -> Result<usize, WriteRejected> {
        let mut g = self.inner.lock();
        if let Some(kind) = g.fail_next.take() {
            return Err(WriteRejected::new(kind.into(), notifier));
        }
        g.written.push(buf.to_owned());
        g.notifiers.push(Some(notifier));
        Ok(buf.len())
    }
}
