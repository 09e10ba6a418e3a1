use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::admission::ip_site_key;
use crate::client_ip::client_ip;
use crate::error::GatewayError;
use crate::metrics::{EVENTS_RECEIVED, RATE_LIMITED};
use crate::models::{EventRecord, EventSubmission, LeadResponse, PersistJob, Record};
use crate::state::AppState;

// Analytics beacon; queued without waiting for the write
pub async fn event_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<EventSubmission>,
) -> Result<(StatusCode, Json<LeadResponse>), GatewayError> {
    let site_id = payload.site_id.trim();
    if site_id.is_empty() {
        return Err(GatewayError::InvalidSubmission("site_id is required"));
    }

    let ip = client_ip(&headers, peer, state.trust_proxy);
    if !state.event_limiter.check(&ip_site_key(&ip, site_id)).allowed {
        RATE_LIMITED.with_label_values(&["event"]).inc();
        tracing::warn!(site_id, %ip, "analytics events rate limited");
        return Err(GatewayError::RateLimited);
    }

    let job = PersistJob {
        record: Record::Event(EventRecord {
            site_id: site_id.to_string(),
            page_id: payload.page_id,
            event_type: payload.event_type,
            metadata: payload.metadata,
            created_at: chrono::Utc::now(),
        }),
        response_tx: None,
    };
    state
        .persist_tx
        .send(job)
        .await
        .map_err(|_| GatewayError::Queue)?;

    EVENTS_RECEIVED.inc();
    Ok((StatusCode::ACCEPTED, Json(LeadResponse { success: true })))
}
