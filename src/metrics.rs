use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, register_counter, register_counter_vec,
    register_gauge, register_gauge_vec, register_histogram,
};


lazy_static! {
    pub static ref LEAD_SUBMISSIONS: Counter = register_counter!(
        "lead_gate_submissions_total",
        "Total lead submissions received"
    )
    .unwrap();
    pub static ref LEADS_ADMITTED: Counter = register_counter!(
        "lead_gate_leads_admitted_total",
        "Lead submissions passed to storage"
    )
    .unwrap();
    pub static ref BOT_SUBMISSIONS: CounterVec = register_counter_vec!(
        "lead_gate_bot_submissions_total",
        "Submissions silently dropped as automated",
        &["signal"]
    )
    .unwrap();
    pub static ref RATE_LIMITED: CounterVec = register_counter_vec!(
        "lead_gate_rate_limited_total",
        "Requests rejected by a rate limiter",
        &["scope"]
    )
    .unwrap();
    pub static ref EVENTS_RECEIVED: Counter =
        register_counter!("lead_gate_events_total", "Analytics events accepted").unwrap();
    pub static ref PERSIST_FAILURES: Counter = register_counter!(
        "lead_gate_persist_failures_total",
        "Records the backend refused"
    )
    .unwrap();
    pub static ref QUEUE_DEPTH: Gauge = register_gauge!(
        "lead_gate_queue_depth",
        "Records waiting for the persistence worker"
    )
    .unwrap();
    pub static ref TRACKED_KEYS: GaugeVec = register_gauge_vec!(
        "lead_gate_limiter_tracked_keys",
        "Keys currently held by each rate limiter",
        &["limiter"]
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "lead_gate_request_latency_seconds",
        "Lead submission latency in seconds"
    )
    .unwrap();
}
