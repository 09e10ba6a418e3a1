use std::sync::Arc;
use tokio::sync::mpsc;

use crate::metrics::{PERSIST_FAILURES, QUEUE_DEPTH};
use crate::models::{PersistJob, Record};
use crate::store::LeadStore;

// Background worker -> writes queued records one by one
pub async fn persist_worker(mut rx: mpsc::Receiver<PersistJob>, store: Arc<dyn LeadStore>) {
    tracing::info!(backend = store.backend_name(), "persistence worker started");

    while let Some(job) = rx.recv().await {
        QUEUE_DEPTH.set(rx.len() as f64);

        let (kind, result) = match job.record {
            Record::Lead(lead) => ("lead", store.save_lead(lead).await),
            Record::Event(event) => ("event", store.save_event(event).await),
        };

        if let Err(e) = &result {
            PERSIST_FAILURES.inc();
            tracing::error!(kind, error = %e, "failed to persist record");
        }

        // Send outcome back to handler, if it waits for one
        if let Some(tx) = job.response_tx {
            let _ = tx.send(result);
        }
    }

    tracing::info!("persistence queue closed, worker exiting");
}
