use std::time::Duration;

use tracing::event;

use crate::constants::RTTE_TRACING_LOG_LEVEL;

/// Smoothed round-trip time derived from local send→ack intervals, used when
/// the transport doesn't expose its own estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RttEstimator {
    // Using u32 microseconds instead of Duration to save space (Duration is 16 bytes)
    srtt_us: u32,
    rttvar_us: u32,
    samples: u32,
}

impl RttEstimator {
    pub fn smoothed_rtt(&self) -> Option<Duration> {
        (self.samples > 0).then(|| Duration::from_micros(self.srtt_us.into()))
    }

    pub fn rttvar(&self) -> Duration {
        Duration::from_micros(self.rttvar_us.into())
    }

    pub fn on_sample(&mut self, sample: Duration) {
        let sample_us: u32 = sample.as_micros().try_into().unwrap_or(u32::MAX);
        if self.samples == 0 {
            // RFC 6298, 2.2
            self.srtt_us = sample_us;
            self.rttvar_us = sample_us / 2;
        } else {
            // RFC 6298, 2.3: beta = 1/4, alpha = 1/8
            let diff = self.srtt_us.abs_diff(sample_us);
            self.rttvar_us = ((u64::from(self.rttvar_us) * 3 + u64::from(diff)) / 4) as u32;
            self.srtt_us = ((u64::from(self.srtt_us) * 7 + u64::from(sample_us)) / 8) as u32;
        }
        self.samples = self.samples.saturating_add(1);

        event!(
            RTTE_TRACING_LOG_LEVEL,
            ?sample,
            srtt_us = self.srtt_us,
            rttvar_us = self.rttvar_us,
            "rtte: sample"
        );
    }
}
