mod events;
mod health;
mod leads;
mod metrics;

pub use events::event_handler;
pub use health::health_handler;
pub use leads::lead_handler;
pub use metrics::metrics_handler;
