use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, interval};
use tracing_subscriber::EnvFilter;

mod admission;
mod bot;
mod client_ip;
mod config;
mod error;
mod fingerprint;
mod handlers;
mod metrics;
mod models;
mod rate_limit;
mod state;
mod store;
mod worker;

use admission::AdmissionPipeline;
use bot::BotHeuristic;
use config::Args;
use handlers::{event_handler, health_handler, lead_handler, metrics_handler};
use models::PersistJob;
use rate_limit::{SlidingWindowLimiter, now_ms};
use state::AppState;
use store::{LeadStore, MemoryStore, RestStore};
use worker::persist_worker;

// this is main async function with tokio
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // parse cli arguments
    let args = Args::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    args.validate()?;

    let store: Arc<dyn LeadStore> = match (&args.backend_url, &args.backend_key) {
        (Some(url), Some(key)) => {
            Arc::new(RestStore::new(reqwest::Client::new(), url, key.clone()))
        }
        _ => Arc::new(MemoryStore::new()),
    };

    let ip_limiter = Arc::new(SlidingWindowLimiter::new(
        "ip",
        args.ip_limit,
        args.rate_window_ms(),
    ));
    let ip_site_limiter = Arc::new(SlidingWindowLimiter::new(
        "ip_site",
        args.ip_site_limit,
        args.rate_window_ms(),
    ));
    let event_limiter = Arc::new(SlidingWindowLimiter::new(
        "event",
        args.event_limit,
        args.event_window_ms(),
    ));
    for limiter in [&ip_limiter, &ip_site_limiter, &event_limiter] {
        tracing::info!(
            limiter = limiter.name(),
            max_requests = limiter.max_requests(),
            window_ms = limiter.window_ms(),
            "rate limit policy"
        );
    }
    let bot = BotHeuristic::new(i64::try_from(args.min_submit_ms).unwrap_or(i64::MAX));

    let (persist_tx, persist_rx) = mpsc::channel::<PersistJob>(args.queue_size);

    // creating shared state
    let state = Arc::new(AppState {
        pipeline: AdmissionPipeline::new(bot, ip_limiter, ip_site_limiter),
        event_limiter,
        persist_tx,
        trust_proxy: args.trust_proxy,
        ip_salt: args.ip_salt.clone(),
    });

    // spawn the background workers
    let backend = store.backend_name();
    tokio::spawn(persist_worker(persist_rx, store));
    tokio::spawn(sweeper(state.clone(), args.sweep_every()));

    //creating the router with routes
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/leads", post(lead_handler))
        .route("/api/events", post(event_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = args.port,
        backend,
        trust_proxy = args.trust_proxy,
        "lead-gate running"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

// Periodic sweep so idle processes release expired keys too
async fn sweeper(state: Arc<AppState>, every: Duration) {
    let mut interval = interval(every);

    loop {
        interval.tick().await;

        let now = now_ms();
        for limiter in state.limiters() {
            limiter.sweep(now);
            metrics::TRACKED_KEYS
                .with_label_values(&[limiter.name()])
                .set(limiter.tracked_keys() as f64);
        }
        tracing::debug!(tracked_keys = state.tracked_keys(), "limiter sweep complete");
    }
}
