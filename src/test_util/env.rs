use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::traits::FlowEnvironment;

#[derive(Clone)]
pub struct MockFlowEnvironment {
    now: Arc<Mutex<Instant>>,
}

impl MockFlowEnvironment {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn increment_now(&self, dur: Duration) {
        *self.now.lock() += dur;
    }
}

impl FlowEnvironment for MockFlowEnvironment {
    fn now(&self) -> Instant {
        *self.now.lock()
    }

    fn copy(&self) -> Self {
        self.clone()
    }
}
