use std::{num::NonZeroUsize, str::FromStr, time::Duration};

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::constants::{
    DEFAULT_MAX_REPORT_BATCH, DEFAULT_MAX_WINDOW_PER_SSRC, DEFAULT_REPORT_INTERVAL,
};

#[derive(Debug, Default, Clone)]
pub struct FeedbackOpts {
    /// How often to emit a report when packets were acked or lost.
    pub report_interval: Option<Duration>,

    /// How many acked but unreported packets to keep per SSRC before evicting
    /// the oldest.
    pub max_window_per_ssrc: Option<usize>,

    /// Report early once this many acked packets are waiting.
    pub max_report_batch: Option<usize>,

    /// The parent span for the generator task. If not provided, will use
    /// root span.
    pub parent_span: Option<tracing::Id>,

    /// Cancelling this stops the generator, e.g. when the session ends.
    pub cancellation_token: CancellationToken,
}

impl FeedbackOpts {
    pub(crate) fn validate(&self) -> anyhow::Result<ValidatedFeedbackOpts> {
        let report_interval = self.report_interval.unwrap_or(DEFAULT_REPORT_INTERVAL);
        if report_interval.is_zero() {
            anyhow::bail!("invalid configuration: report_interval = 0");
        }

        let max_window_per_ssrc = NonZeroUsize::new(
            self.max_window_per_ssrc
                .unwrap_or(DEFAULT_MAX_WINDOW_PER_SSRC),
        )
        .context("invalid configuration: max_window_per_ssrc = 0")?;

        let max_report_batch =
            NonZeroUsize::new(self.max_report_batch.unwrap_or(DEFAULT_MAX_REPORT_BATCH))
                .context("invalid configuration: max_report_batch = 0")?;

        Ok(ValidatedFeedbackOpts {
            report_interval,
            max_window_per_ssrc,
            max_report_batch,
            parent_span: self.parent_span.clone(),
            cancellation_token: self.cancellation_token.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ValidatedFeedbackOpts {
    pub report_interval: Duration,
    pub max_window_per_ssrc: NonZeroUsize,
    pub max_report_batch: NonZeroUsize,
    pub parent_span: Option<tracing::Id>,
    pub cancellation_token: CancellationToken,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseSelectorError {
    kind: &'static str,
    value: String,
}

/// Implements FromStr, Display, and a lenient parse that falls back to the
/// default with a warning, the way command line flags are interpreted.
macro_rules! selector {
    ($name:ident, $kind:literal, $default:ident, { $($variant:ident => $canonical:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl FromStr for $name {
            type Err = ParseSelectorError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($canonical $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(ParseSelectorError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let s = match self {
                    $($name::$variant => $canonical,)+
                };
                f.write_str(s)
            }
        }

        impl $name {
            pub fn parse_or_default(s: &str) -> Self {
                s.parse().unwrap_or_else(|e| {
                    let default = $name::$default;
                    warn!("{e}, using default ({default})");
                    default
                })
            }
        }
    };
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CongestionControlAlgorithm {
    #[default]
    Reno,
    Cubic,
    Bbr,
    Scream,
    Gcc,
}

selector!(CongestionControlAlgorithm, "congestion control algorithm", Reno, {
    Reno => "reno",
    Cubic => "cubic",
    Bbr => "bbr",
    Scream => "scream",
    Gcc => "gcc",
});

impl CongestionControlAlgorithm {
    /// Whether the algorithm runs on top of RTP and consumes congestion
    /// feedback reports, as opposed to running inside the transport.
    pub fn consumes_rtp_feedback(self) -> bool {
        matches!(self, Self::Scream | Self::Gcc)
    }
}

/// Which QUIC primitive carries RTP.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportMode {
    #[default]
    Any,
    Datagram,
    Stream,
}

selector!(TransportMode, "transport mode", Any, {
    Any => "any",
    Datagram => "quic-dgram" | "datagram" | "dgram",
    Stream => "quic-stream" | "stream",
});

impl TransportMode {
    /// Datagrams are unreliable, so only they have per-packet ack/loss.
    pub fn is_unreliable(self) -> bool {
        matches!(self, Self::Datagram)
    }
}

/// RTCP congestion feedback format the receiver sends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RtcpFeedback {
    #[default]
    None,
    Rfc8888,
    Rfc8888Pion,
    Twcc,
}

selector!(RtcpFeedback, "RTCP congestion control feedback type", None, {
    None => "none",
    Rfc8888 => "rfc8888",
    Rfc8888Pion => "rfc8888-pion",
    Twcc => "twcc",
});
