//! Multiplexing of RTP and RTCP onto flows of a single transport connection
//! (QUIC datagrams or streams, TCP, UDP), with per-packet prioritization and
//! congestion feedback generated locally from transport acks.

#[macro_use]
mod macros;

pub mod codec;
mod config;
mod constants;
pub mod demux;
mod error;
pub mod feedback;
mod flow;
mod metrics;
mod prioritizer;
mod rtcp_flow;
mod rtp_flow;
mod rtte;
mod seq_nr;
#[cfg(test)]
mod test_util;
mod traits;
mod utils;
pub mod varint;

pub use config::{
    CongestionControlAlgorithm, FeedbackOpts, ParseSelectorError, RtcpFeedback, TransportMode,
};
pub use demux::FlowDemuxer;
pub use error::{Error, MarshalError, Result};
pub use feedback::{
    GeneratorState, LocalFeedback, MetricSource, MetricsUnavailable, NoTransportMetrics,
    ReportSink, TransportMetrics,
    report::{FeedbackReport, PacketFeedback, SendRecord, StreamFeedback},
};
pub use flow::Flow;
pub use prioritizer::{
    DefaultPrioritizer, MarkerPrioritizer, Prioritizer, Priority, RoundRobinPrioritizer,
};
pub use rtcp_flow::RtcpFlow;
pub use rtp_flow::RtpFlow;
pub use seq_nr::SeqNr;
pub use traits::{
    DefaultFlowEnvironment, Delivery, DeliveryAwareTransport, DeliveryNotifier, FlowEnvironment,
    Transport, WriteRejected,
};
