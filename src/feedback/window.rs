use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use rustc_hash::FxHashMap as HashMap;

use crate::{metrics::METRICS, seq_nr::SeqNr};

use super::report::{FeedbackReport, PacketFeedback, SendRecord, StreamFeedback};

#[derive(Debug, Clone, Copy)]
struct Acked {
    record: SendRecord,
    acked_at: Instant,
}

#[derive(Debug, Default)]
struct StreamWindow {
    acked: VecDeque<Acked>,
    lost: u64,
}

impl StreamWindow {
    fn is_empty(&self) -> bool {
        self.acked.is_empty() && self.lost == 0
    }
}

/// Acked packets not yet reported, per SSRC. Each SSRC keeps at most
/// `max_per_ssrc` packets; the oldest are evicted first.
#[derive(Debug)]
pub(crate) struct AckWindow {
    max_per_ssrc: usize,
    streams: HashMap<u32, StreamWindow>,
    pending_acked: usize,
}

impl AckWindow {
    pub fn new(max_per_ssrc: usize) -> Self {
        Self {
            max_per_ssrc,
            streams: Default::default(),
            pending_acked: 0,
        }
    }

    pub fn pending_acked(&self) -> usize {
        self.pending_acked
    }

    pub fn is_empty(&self) -> bool {
        self.streams.values().all(StreamWindow::is_empty)
    }

    /// Returns the evicted record if the SSRC's window was full.
    pub fn on_acked(&mut self, record: SendRecord, acked_at: Instant) -> Option<SendRecord> {
        let w = self.streams.entry(record.ssrc).or_default();
        let mut evicted = None;
        if w.acked.len() >= self.max_per_ssrc {
            evicted = w.acked.pop_front().map(|a| a.record);
            METRICS.evicted_records.increment(1);
        } else {
            self.pending_acked += 1;
        }
        w.acked.push_back(Acked { record, acked_at });
        evicted
    }

    pub fn on_lost(&mut self, ssrc: u32) {
        self.streams.entry(ssrc).or_default().lost += 1;
    }

    /// Drains everything pending into a report. None if nothing happened since
    /// the previous report.
    pub fn take_report(
        &mut self,
        sender_ssrc: u32,
        now: Instant,
        rtt: Option<Duration>,
    ) -> Option<FeedbackReport> {
        let mut streams: Vec<StreamFeedback> = self
            .streams
            .iter_mut()
            .filter(|(_, w)| !w.is_empty())
            .map(|(ssrc, w)| stream_feedback(*ssrc, w, rtt))
            .collect();
        self.pending_acked = 0;
        if streams.is_empty() {
            return None;
        }
        streams.sort_unstable_by_key(|s| s.ssrc);
        Some(FeedbackReport {
            sender_ssrc,
            generated_at: now,
            rtt,
            streams,
        })
    }
}

fn stream_feedback(ssrc: u32, w: &mut StreamWindow, rtt: Option<Duration>) -> StreamFeedback {
    let half_rtt = rtt.map(|rtt| rtt / 2).unwrap_or_default();

    let begin_sequence = w
        .acked
        .iter()
        .min_by_key(|a| a.record.sent_at)
        .map(|a| a.record.sequence_number)
        .unwrap_or_default();

    let mut packets: Vec<PacketFeedback> = w
        .acked
        .drain(..)
        .map(|a| {
            let arrival = a
                .acked_at
                .checked_sub(half_rtt)
                .unwrap_or(a.record.sent_at)
                .max(a.record.sent_at);
            PacketFeedback {
                sequence_number: a.record.sequence_number,
                size: a.record.size,
                sent_at: a.record.sent_at,
                acked_at: a.acked_at,
                arrival,
            }
        })
        .collect();

    // Offsets from the earliest sent packet give a total order even when the
    // window spans a sequence number wrap.
    packets.sort_by_key(|p| p.sequence_number.distance_from(begin_sequence));

    StreamFeedback {
        ssrc,
        begin_sequence,
        packets,
        lost: std::mem::take(&mut w.lost),
    }
}
