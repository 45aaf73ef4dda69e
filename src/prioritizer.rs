use std::sync::atomic::{AtomicUsize, Ordering};

use crate::codec::RtpHeader;

/// Priority class of an outgoing RTP packet. Each class maps to one flow;
/// class 0 always exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Priority(pub i32);

impl Priority {
    pub const DEFAULT: Priority = Priority(0);
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Picks the priority class, and thus the flow, for an outgoing RTP packet.
///
/// Every priority returned must have a flow registered in the
/// [`RtpFlow`](crate::RtpFlow) using this prioritizer.
pub trait Prioritizer: Send + Sync {
    fn prioritize(&self, header: &dyn RtpHeader, payload: &[u8]) -> Priority;
}

impl<F> Prioritizer for F
where
    F: Fn(&dyn RtpHeader, &[u8]) -> Priority + Send + Sync,
{
    fn prioritize(&self, header: &dyn RtpHeader, payload: &[u8]) -> Priority {
        self(header, payload)
    }
}

/// Sends everything on the default flow.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPrioritizer;

impl Prioritizer for DefaultPrioritizer {
    fn prioritize(&self, _header: &dyn RtpHeader, _payload: &[u8]) -> Priority {
        Priority::DEFAULT
    }
}

/// Packets with the marker bit set (e.g. the last packet of a video frame)
/// go to `marked`, the rest to the default flow.
#[derive(Debug, Clone, Copy)]
pub struct MarkerPrioritizer {
    pub marked: Priority,
}

impl Prioritizer for MarkerPrioritizer {
    fn prioritize(&self, header: &dyn RtpHeader, _payload: &[u8]) -> Priority {
        if header.marker() {
            self.marked
        } else {
            Priority::DEFAULT
        }
    }
}

/// Spreads packets over the given priorities in turn.
#[derive(Debug)]
pub struct RoundRobinPrioritizer {
    priorities: Vec<Priority>,
    next: AtomicUsize,
}

impl RoundRobinPrioritizer {
    /// An empty list behaves like [`DefaultPrioritizer`].
    pub fn new(priorities: impl IntoIterator<Item = Priority>) -> Self {
        Self {
            priorities: priorities.into_iter().collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl Prioritizer for RoundRobinPrioritizer {
    fn prioritize(&self, _header: &dyn RtpHeader, _payload: &[u8]) -> Priority {
        if self.priorities.is_empty() {
            return Priority::DEFAULT;
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.priorities.len();
        self.priorities[idx]
    }
}
