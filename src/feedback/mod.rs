//! Congestion feedback generated locally from transport acks, instead of
//! waiting for the receiver's RTCP feedback to make a round trip.
//!
//! Every instrumented write carries a [`DeliveryNotifier`]. When the transport
//! resolves it, the notifier pushes a delivery event onto a queue read by a
//! dedicated generator task, which owns the rolling window of acked packets and
//! periodically hands a [`FeedbackReport`] to the [`ReportSink`].

pub mod report;
mod window;


use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender, unbounded_channel},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error_span, event, trace};

use crate::{
    config::ValidatedFeedbackOpts,
    constants::FEEDBACK_TRACING_LOG_LEVEL,
    metrics::METRICS,
    rtte::RttEstimator,
    seq_nr::SeqNr,
    traits::{Delivery, DeliveryNotifier, FlowEnvironment},
    utils::{FnDropGuard, spawn_print_error},
};

use report::{FeedbackReport, SendRecord};
use window::AckWindow;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransportMetrics {
    /// The transport's own smoothed RTT, e.g. from QUIC's loss recovery.
    pub smoothed_rtt: Option<Duration>,
    pub loss_rate: Option<f64>,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("metric source unavailable")]
pub struct MetricsUnavailable;

/// Transport measurements the generator uses when building a report.
pub trait MetricSource: Send + Sync + 'static {
    /// Returning [`MetricsUnavailable`] (e.g. the connection is gone) stops
    /// the generator.
    fn sample(&self) -> Result<TransportMetrics, MetricsUnavailable>;
}

impl<F> MetricSource for F
where
    F: Fn() -> Result<TransportMetrics, MetricsUnavailable> + Send + Sync + 'static,
{
    fn sample(&self) -> Result<TransportMetrics, MetricsUnavailable> {
        self()
    }
}

/// For transports without their own measurements. The generator then relies on
/// the RTT it derives from send→ack intervals.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransportMetrics;

impl MetricSource for NoTransportMetrics {
    fn sample(&self) -> Result<TransportMetrics, MetricsUnavailable> {
        Ok(TransportMetrics::default())
    }
}

/// Consumer of feedback reports, usually a congestion controller. Must not
/// block for long: it runs on the generator task.
pub trait ReportSink: Send + 'static {
    fn deliver(&mut self, report: FeedbackReport) -> anyhow::Result<()>;
}

impl<F> ReportSink for F
where
    F: FnMut(FeedbackReport) -> anyhow::Result<()> + Send + 'static,
{
    fn deliver(&mut self, report: FeedbackReport) -> anyhow::Result<()> {
        self(report)
    }
}

impl ReportSink for UnboundedSender<FeedbackReport> {
    fn deliver(&mut self, report: FeedbackReport) -> anyhow::Result<()> {
        self.send(report)
            .map_err(|_| anyhow::anyhow!("report receiver dropped"))
    }
}

impl ReportSink for mpsc::Sender<FeedbackReport> {
    fn deliver(&mut self, report: FeedbackReport) -> anyhow::Result<()> {
        self.try_send(report)
            .map_err(|e| anyhow::anyhow!("error queueing report: {e}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug)]
pub(crate) enum DeliveryEvent {
    Acked {
        record: SendRecord,
        acked_at: std::time::Instant,
    },
    Lost {
        ssrc: u32,
        sequence_number: SeqNr,
    },
}

/// Handle to a running local feedback generator. Dropping it stops the
/// generator.
pub struct LocalFeedback {
    events: UnboundedSender<DeliveryEvent>,
    cancel: CancellationToken,
    state: Arc<Mutex<GeneratorState>>,
    join: Option<JoinHandle<()>>,
}

impl LocalFeedback {
    pub(crate) fn start<M, S, E>(
        sender_ssrc: u32,
        metrics: M,
        sink: S,
        env: E,
        opts: ValidatedFeedbackOpts,
    ) -> Self
    where
        M: MetricSource,
        S: ReportSink,
        E: FlowEnvironment,
    {
        let (events, rx) = unbounded_channel();
        let cancel = opts.cancellation_token.child_token();
        let state = Arc::new(Mutex::new(GeneratorState::Idle));
        let span = error_span!(parent: opts.parent_span.clone(), "local_feedback", sender_ssrc);
        let generator = Generator {
            sender_ssrc,
            metrics,
            sink,
            env,
            rx,
            window: AckWindow::new(opts.max_window_per_ssrc.get()),
            rtte: RttEstimator::default(),
            cancel: cancel.clone(),
            state: state.clone(),
            opts,
        };
        let join = spawn_print_error(span, generator.run());
        Self {
            events,
            cancel,
            state,
            join: Some(join),
        }
    }

    pub fn state(&self) -> GeneratorState {
        *self.state.lock()
    }

    /// Stop generating reports. Idempotent. Notifications still in flight are
    /// discarded.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            debug!("stopping local feedback");
        }
        self.cancel.cancel();
    }

    pub fn is_stopping(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the generator task to exit. Call [`LocalFeedback::stop`] first,
    /// unless the generator stops on its own.
    pub async fn join(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }

    /// A notifier that reports the outcome of the write described by `record`.
    pub(crate) fn track<E: FlowEnvironment>(&self, record: SendRecord, env: E) -> DeliveryNotifier {
        let events = self.events.clone();
        DeliveryNotifier::new(move |delivery| {
            let event = match delivery {
                Delivery::Acked => DeliveryEvent::Acked {
                    record,
                    acked_at: env.now(),
                },
                Delivery::Lost => DeliveryEvent::Lost {
                    ssrc: record.ssrc,
                    sequence_number: record.sequence_number,
                },
            };
            if events.send(event).is_err() {
                METRICS.late_notifications.increment(1);
                trace!(seq_nr = ?record.sequence_number, ?delivery, "generator gone, dropping notification");
            }
        })
    }
}

impl Drop for LocalFeedback {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for LocalFeedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFeedback")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

struct Generator<M, S, E> {
    sender_ssrc: u32,
    metrics: M,
    sink: S,
    env: E,
    rx: UnboundedReceiver<DeliveryEvent>,
    window: AckWindow,
    rtte: RttEstimator,
    cancel: CancellationToken,
    state: Arc<Mutex<GeneratorState>>,
    opts: ValidatedFeedbackOpts,
}

impl<M: MetricSource, S: ReportSink, E: FlowEnvironment> Generator<M, S, E> {
    async fn run(mut self) -> anyhow::Result<()> {
        *self.state.lock() = GeneratorState::Running;
        let _stopped = FnDropGuard::new({
            let state = self.state.clone();
            move || *state.lock() = GeneratorState::Stopped
        });
        debug!(interval = ?self.opts.report_interval, "local feedback running");

        let mut tick = tokio::time::interval_at(
            tokio::time::Instant::now() + self.opts.report_interval,
            self.opts.report_interval,
        );
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    trace!("cancelled");
                    break;
                }
                _ = tick.tick() => self.report(),
                event = self.rx.recv() => {
                    let Some(event) = event else {
                        trace!("all senders dropped");
                        break;
                    };
                    self.on_event(event);
                    if self.window.pending_acked() >= self.opts.max_report_batch.get() {
                        self.report();
                    }
                }
            }
        }

        // Anything still queued is discarded; senders see a closed channel from now on.
        self.rx.close();
        Ok(())
    }

    fn on_event(&mut self, event: DeliveryEvent) {
        match event {
            DeliveryEvent::Acked { record, acked_at } => {
                let ack_delay = acked_at.saturating_duration_since(record.sent_at);
                METRICS.acked_packets.increment(1);
                METRICS.ack_delay.record(ack_delay.as_secs_f64());
                self.rtte.on_sample(ack_delay);
                event!(
                    FEEDBACK_TRACING_LOG_LEVEL,
                    ssrc = record.ssrc,
                    seq_nr = ?record.sequence_number,
                    ?ack_delay,
                    "acked"
                );
                if let Some(evicted) = self.window.on_acked(record, acked_at) {
                    warn_every_ms!(
                        1000,
                        ssrc = evicted.ssrc,
                        seq_nr = ?evicted.sequence_number,
                        "feedback window full, evicting unreported packets"
                    );
                }
            }
            DeliveryEvent::Lost {
                ssrc,
                sequence_number,
            } => {
                METRICS.lost_packets.increment(1);
                event!(FEEDBACK_TRACING_LOG_LEVEL, ssrc, seq_nr = ?sequence_number, "lost");
                self.window.on_lost(ssrc);
            }
        }
    }

    fn report(&mut self) {
        if self.window.is_empty() {
            return;
        }
        let metrics = match self.metrics.sample() {
            Ok(m) => m,
            Err(e) => {
                debug!("{e}, stopping local feedback");
                self.cancel.cancel();
                return;
            }
        };
        let rtt = metrics.smoothed_rtt.or(self.rtte.smoothed_rtt());
        let Some(report) = self
            .window
            .take_report(self.sender_ssrc, self.env.now(), rtt)
        else {
            return;
        };
        // Stopped while this report was being assembled.
        if self.cancel.is_cancelled() {
            return;
        }
        trace!(
            packets = report.packet_count(),
            lost = report.lost_count(),
            ?rtt,
            local_rttvar = ?self.rtte.rttvar(),
            "delivering feedback report"
        );
        METRICS.feedback_reports.increment(1);
        if let Err(e) = self.sink.deliver(report) {
            METRICS.report_sink_errors.increment(1);
            warn_every_ms!(1000, "error delivering feedback report: {e:#}");
        }
    }
}
