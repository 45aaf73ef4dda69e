//! Locally synthesized congestion feedback, shaped after RFC 8888: per SSRC,
//! the run of reported sequence numbers with an arrival time for each.

use std::time::{Duration, Instant};

use crate::seq_nr::SeqNr;

/// Bookkeeping for a packet handed to a delivery-aware transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendRecord {
    pub sent_at: Instant,
    pub ssrc: u32,
    /// Marshalled RTP packet size (header and payload), without the flow id prefix.
    pub size: usize,
    pub sequence_number: SeqNr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketFeedback {
    pub sequence_number: SeqNr,
    pub size: usize,
    pub sent_at: Instant,
    pub acked_at: Instant,
    /// Estimated time the packet reached the receiver: the ack time minus half
    /// the RTT, never earlier than the send time.
    pub arrival: Instant,
}

impl PacketFeedback {
    pub fn one_way_delay(&self) -> Duration {
        self.arrival - self.sent_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFeedback {
    pub ssrc: u32,
    /// Sequence number of the earliest sent packet in `packets`.
    pub begin_sequence: SeqNr,
    /// Sorted by sequence number, wrap-aware.
    pub packets: Vec<PacketFeedback>,
    /// Packets the transport declared lost since the previous report.
    pub lost: u64,
}

impl StreamFeedback {
    pub fn sequence_numbers(&self) -> impl Iterator<Item = u16> + '_ {
        self.packets.iter().map(|p| p.sequence_number.0)
    }

    pub fn acked_bytes(&self) -> usize {
        self.packets.iter().map(|p| p.size).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackReport {
    /// SSRC the feedback is reported on behalf of.
    pub sender_ssrc: u32,
    pub generated_at: Instant,
    /// RTT used for the arrival estimates, if any was known.
    pub rtt: Option<Duration>,
    /// Sorted by SSRC.
    pub streams: Vec<StreamFeedback>,
}

impl FeedbackReport {
    pub fn stream(&self, ssrc: u32) -> Option<&StreamFeedback> {
        self.streams.iter().find(|s| s.ssrc == ssrc)
    }

    pub fn packet_count(&self) -> usize {
        self.streams.iter().map(|s| s.packets.len()).sum()
    }

    pub fn lost_count(&self) -> u64 {
        self.streams.iter().map(|s| s.lost).sum()
    }

    pub fn contains(&self, ssrc: u32, sequence_number: u16) -> bool {
        self.stream(ssrc)
            .is_some_and(|s| s.sequence_numbers().any(|seq| seq == sequence_number))
    }
}
