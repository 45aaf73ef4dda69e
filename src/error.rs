use crate::prioritizer::Priority;

pub type MarshalError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("transport does not support delivery notification")]
    DeliveryNotificationUnsupported,

    #[error("flow is not bound to a transport")]
    NotBound,

    #[error("flow id {0} does not fit into a 62-bit varint")]
    FlowIdTooLarge(u64),

    #[error("error writing to transport: {0}")]
    Write(#[source] std::io::Error),

    #[error("error marshalling packet: {0}")]
    Marshal(#[source] MarshalError),

    #[error("malformed flow id prefix")]
    MalformedFlowId,

    #[error("no handler registered for flow id {0}")]
    UnknownFlow(u64),

    #[error("bug: prioritizer returned priority {priority} but no flow is registered for it")]
    BugNoFlowForPriority { priority: Priority },
}

impl Error {
    /// True for errors caused by misconfiguration of the flows. These are not
    /// transient, and retrying the same call will fail the same way.
    pub fn is_bug(&self) -> bool {
        matches!(
            self,
            Error::BugNoFlowForPriority { .. }
                | Error::DeliveryNotificationUnsupported
                | Error::NotBound
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
