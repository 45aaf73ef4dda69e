use lazy_static::lazy_static;

#[cfg(feature = "export-metrics")]
use metrics::{Counter, Histogram, counter, histogram};

#[cfg(not(feature = "export-metrics"))]
use noop::{Counter, Histogram, counter, histogram};

pub struct Metrics {
    pub acked_packets: Counter,
    pub ack_delay: Histogram,
    pub evicted_records: Counter,
    pub feedback_reports: Counter,
    pub late_notifications: Counter,
    pub lost_packets: Counter,
    pub report_sink_errors: Counter,
    pub rtcp_writes: Counter,
    pub send_count: Counter,
    pub send_errors: Counter,
    pub sent_bytes: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            acked_packets: counter!("rtp_flows_acked_packets"),
            ack_delay: histogram!("rtp_flows_ack_delay"),
            evicted_records: counter!("rtp_flows_evicted_records"),
            feedback_reports: counter!("rtp_flows_feedback_reports"),
            late_notifications: counter!("rtp_flows_late_notifications"),
            lost_packets: counter!("rtp_flows_lost_packets"),
            report_sink_errors: counter!("rtp_flows_report_sink_errors"),
            rtcp_writes: counter!("rtp_flows_rtcp_writes"),
            send_count: counter!("rtp_flows_send_count"),
            send_errors: counter!("rtp_flows_send_errors"),
            sent_bytes: counter!("rtp_flows_sent_bytes"),
        }
    }
}

lazy_static! {
    pub static ref METRICS: Metrics = Metrics::new();
}

#[cfg(not(feature = "export-metrics"))]
mod noop {
    pub struct Counter;
    pub struct Histogram;

    impl Counter {
        #[inline(always)]
        pub fn increment(&self, _value: u64) {}
    }

    impl Histogram {
        #[inline(always)]
        pub fn record(&self, _value: f64) {}
    }

    macro_rules! counter {
        ($name:expr) => {
            noop::Counter
        };
    }

    macro_rules! histogram {
        ($name:expr) => {
            noop::Histogram
        };
    }

    pub(super) use {counter, histogram};
}
