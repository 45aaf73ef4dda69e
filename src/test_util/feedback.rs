use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::feedback::{
    MetricSource, MetricsUnavailable, ReportSink, TransportMetrics, report::FeedbackReport,
};

/// Metric source whose answer tests can change at any time.
#[derive(Clone)]
pub struct FakeMetricSource {
    current: Arc<Mutex<Result<TransportMetrics, MetricsUnavailable>>>,
}

impl FakeMetricSource {
    pub fn with_rtt(rtt: Duration) -> Self {
        Self {
            current: Arc::new(Mutex::new(Ok(TransportMetrics {
                smoothed_rtt: Some(rtt),
                loss_rate: None,
            }))),
        }
    }

    pub fn set_unavailable(&self) {
        *self.current.lock() = Err(MetricsUnavailable);
    }
}

impl MetricSource for FakeMetricSource {
    fn sample(&self) -> Result<TransportMetrics, MetricsUnavailable> {
        *self.current.lock()
    }
}

/// Fails the first `fail_first` deliveries, then collects reports.
#[derive(Clone, Default)]
pub struct FlakySink {
    pub fail_first: usize,
    pub attempts: Arc<Mutex<usize>>,
    pub delivered: Arc<Mutex<Vec<FeedbackReport>>>,
}

impl ReportSink for FlakySink {
    fn deliver(&mut self, report: FeedbackReport) -> anyhow::Result<()> {
        let mut attempts = self.attempts.lock();
        *attempts += 1;
        if *attempts <= self.fail_first {
            anyhow::bail!("congestion controller busy");
        }
        self.delivered.lock().push(report);
        Ok(())
    }
}
