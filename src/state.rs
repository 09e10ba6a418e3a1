use std::sync::Arc;
use tokio::sync::mpsc;

use crate::admission::AdmissionPipeline;
use crate::models::PersistJob;
use crate::rate_limit::SlidingWindowLimiter;
// app's shared state

pub struct AppState {
    pub pipeline: AdmissionPipeline,
    pub event_limiter: Arc<SlidingWindowLimiter>, // ip:site for analytics beacons
    pub persist_tx: mpsc::Sender<PersistJob>,
    pub trust_proxy: bool,
    pub ip_salt: String,
}

impl AppState {
    // Every limiter owned by this process
    pub fn limiters(&self) -> Vec<&Arc<SlidingWindowLimiter>> {
        let mut all: Vec<_> = self.pipeline.limiters().into_iter().collect();
        all.push(&self.event_limiter);
        all
    }

    pub fn tracked_keys(&self) -> usize {
        self.limiters().iter().map(|l| l.tracked_keys()).sum()
    }
}
