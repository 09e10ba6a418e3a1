use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;

use crate::admission::Admission;
use crate::bot::{BotSignal, strip_bot_fields};
use crate::client_ip::client_ip;
use crate::error::GatewayError;
use crate::fingerprint::hash_ip;
use crate::metrics::{
    BOT_SUBMISSIONS, LEAD_SUBMISSIONS, LEADS_ADMITTED, RATE_LIMITED, REQUEST_LATENCY,
};
use crate::models::{LeadRecord, LeadResponse, LeadSubmission, PersistJob, Record};
use crate::rate_limit::now_ms;
use crate::state::AppState;
use crate::store::StoreError;

pub async fn lead_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<LeadSubmission>,
) -> Result<(StatusCode, Json<LeadResponse>), GatewayError> {
    LEAD_SUBMISSIONS.inc();
    let start_time = Instant::now();

    let now = now_ms();

    // bots get their fake success before any validation can answer differently
    if let Some(signal) = state.pipeline.screen(&payload.fields, now) {
        return Ok(drop_automated(payload.site_id.trim(), signal));
    }

    let site_id = payload.site_id.trim();
    if site_id.is_empty() {
        return Err(GatewayError::InvalidSubmission("site_id is required"));
    }
    if strip_bot_fields(&payload.fields).is_empty() {
        return Err(GatewayError::InvalidSubmission("no form fields submitted"));
    }

    let ip = client_ip(&headers, peer, state.trust_proxy);

    let fields = match state.pipeline.admit(&ip, site_id, &payload.fields, now) {
        Admission::FakeAccepted(signal) => return Ok(drop_automated(site_id, signal)),
        Admission::Rejected(scope) => {
            RATE_LIMITED.with_label_values(&[scope.as_str()]).inc();
            tracing::warn!(site_id, %ip, scope = scope.as_str(), "lead submission rate limited");
            return Err(GatewayError::RateLimited);
        }
        Admission::Admitted(fields) => fields,
    };

    let (response_tx, response_rx) = oneshot::channel();
    let job = PersistJob {
        record: Record::Lead(LeadRecord {
            site_id: site_id.to_string(),
            page_id: payload.page_id,
            data: fields,
            ip_hash: hash_ip(&ip, &state.ip_salt),
            created_at: chrono::Utc::now(),
        }),
        response_tx: Some(response_tx),
    };

    state
        .persist_tx
        .send(job)
        .await
        .map_err(|_| GatewayError::Queue)?;

    // wait for the worker to write it
    response_rx.await.map_err(|_| StoreError::Closed)??;

    LEADS_ADMITTED.inc();
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    tracing::info!(site_id, "lead stored");

    Ok(accepted())
}

fn drop_automated(site_id: &str, signal: BotSignal) -> (StatusCode, Json<LeadResponse>) {
    BOT_SUBMISSIONS.with_label_values(&[signal.as_str()]).inc();
    tracing::info!(site_id, signal = signal.as_str(), "dropping automated submission");
    accepted()
}

fn accepted() -> (StatusCode, Json<LeadResponse>) {
    (StatusCode::CREATED, Json(LeadResponse { success: true }))
}
