use anyhow::Context;
use bytes::BytesMut;
use rustc_hash::FxHashMap as HashMap;
use tracing::{debug, error, warn};

use crate::{
    Error, Result,
    codec::RtpHeader,
    config::FeedbackOpts,
    feedback::{LocalFeedback, MetricSource, ReportSink, report::SendRecord},
    flow::Flow,
    prioritizer::{DefaultPrioritizer, Prioritizer, Priority},
    traits::{DefaultFlowEnvironment, FlowEnvironment, Transport},
};


/// RTP flows of one session, one per priority class, plus the prioritizer that
/// routes each outgoing packet to one of them.
///
/// Priority 0 always exists and is the one [`RtpFlow::bind`] binds.
pub struct RtpFlow<E = DefaultFlowEnvironment> {
    flows: HashMap<Priority, Flow>,
    prioritizer: Box<dyn Prioritizer>,
    local_feedback: Option<LocalFeedback>,
    env: E,
}

impl RtpFlow {
    pub fn new() -> Self {
        Self::new_with_env(Flow::new(), DefaultFlowEnvironment::default())
    }

    pub fn with_id(id: u64) -> Result<Self> {
        Ok(Self::new_with_env(
            Flow::with_id(id)?,
            DefaultFlowEnvironment::default(),
        ))
    }
}

impl Default for RtpFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: FlowEnvironment> RtpFlow<E> {
    pub fn new_with_env(default_flow: Flow, env: E) -> Self {
        let mut flows = HashMap::default();
        flows.insert(Priority::DEFAULT, default_flow);
        Self {
            flows,
            prioritizer: Box::new(DefaultPrioritizer),
            local_feedback: None,
            env,
        }
    }

    pub fn bind(&mut self, transport: impl Transport) {
        self.flows
            .entry(Priority::DEFAULT)
            .or_default()
            .bind(transport);
    }

    /// Register a flow with the given id for packets the prioritizer assigns
    /// `priority` to. Must happen before such packets are written.
    pub fn add_prioritized_flow(
        &mut self,
        priority: impl Into<Priority>,
        flow_id: u64,
        transport: impl Transport,
    ) -> Result<()> {
        let priority = priority.into();
        let mut flow = Flow::with_id(flow_id)?;
        flow.bind(transport);
        if let Some(prev) = self.flows.insert(priority, flow) {
            warn!(%priority, ?prev, flow_id, "replaced flow");
        }
        Ok(())
    }

    /// Applies to packets written from now on.
    pub fn set_prioritizer(&mut self, prioritizer: impl Prioritizer + 'static) {
        self.prioritizer = Box::new(prioritizer);
    }

    pub fn priorities(&self) -> impl Iterator<Item = Priority> + '_ {
        self.flows.keys().copied()
    }

    /// Start generating congestion feedback from transport acks. From now on
    /// every write requests delivery notification, so all flows must be bound
    /// to delivery-aware transports.
    ///
    /// Must be called within a tokio runtime. Replaces a previously enabled
    /// generator.
    #[tracing::instrument(level = "debug", skip_all, fields(sender_ssrc = sender_ssrc))]
    pub fn enable_local_feedback(
        &mut self,
        sender_ssrc: u32,
        metrics: impl MetricSource,
        sink: impl ReportSink,
        opts: FeedbackOpts,
    ) -> anyhow::Result<()> {
        let opts = opts.validate().context("error validating feedback options")?;
        tokio::runtime::Handle::try_current()
            .context("local feedback generator needs a tokio runtime")?;
        if let Some(prev) = self.local_feedback.take() {
            debug!("replacing running local feedback generator");
            prev.stop();
        }
        self.local_feedback = Some(LocalFeedback::start(
            sender_ssrc,
            metrics,
            sink,
            self.env.copy(),
            opts,
        ));
        Ok(())
    }

    pub fn local_feedback(&self) -> Option<&LocalFeedback> {
        self.local_feedback.as_ref()
    }

    pub fn local_feedback_mut(&mut self) -> Option<&mut LocalFeedback> {
        self.local_feedback.as_mut()
    }

    /// Idempotent. Writes after this are no longer instrumented.
    pub fn stop_local_feedback(&self) {
        if let Some(lf) = self.local_feedback.as_ref() {
            lf.stop();
        }
    }

    /// Marshal and write one RTP packet on the flow the prioritizer picks.
    ///
    /// Returns [`Error::BugNoFlowForPriority`] if the prioritizer picked a
    /// priority with no registered flow. That is a setup mistake and the
    /// packet is not sent anywhere else.
    pub fn write(&self, header: &dyn RtpHeader, payload: &[u8]) -> Result<usize> {
        let mut buf = BytesMut::with_capacity(header.marshal_size() + payload.len());
        header.marshal_to(&mut buf).map_err(Error::Marshal)?;
        buf.extend_from_slice(payload);

        let priority = self.prioritizer.prioritize(header, payload);
        let Some(flow) = self.flows.get(&priority) else {
            error!(%priority, ssrc = header.ssrc(), "no flow registered for priority");
            return Err(Error::BugNoFlowForPriority { priority });
        };

        match self.local_feedback.as_ref() {
            Some(lf) if !lf.is_stopping() => {
                let record = SendRecord {
                    sent_at: self.env.now(),
                    ssrc: header.ssrc(),
                    size: buf.len(),
                    sequence_number: header.sequence_number().into(),
                };
                flow.write_with_delivery(&buf, lf.track(record, self.env.copy()))
            }
            _ => flow.write(&buf),
        }
    }
}

impl<E> std::fmt::Debug for RtpFlow<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtpFlow")
            .field("flows", &self.flows)
            .field("local_feedback", &self.local_feedback)
            .finish_non_exhaustive()
    }
}
