use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, trace};

/// Spawn a task inside the given span, logging how it finished.
pub(crate) fn spawn_print_error<F>(span: tracing::Span, fut: F) -> JoinHandle<()>
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    tokio::spawn(
        async move {
            match fut.await {
                Ok(()) => trace!("finished"),
                Err(e) => debug!("finished with error: {e:#}"),
            }
        }
        .instrument(span),
    )
}

pub struct FnDropGuard<F: FnOnce()> {
    f: Option<F>,
}

impl<F: FnOnce()> FnDropGuard<F> {
    pub fn new(f: F) -> Self {
        Self { f: Some(f) }
    }
}

impl<F: FnOnce()> Drop for FnDropGuard<F> {
    fn drop(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}
