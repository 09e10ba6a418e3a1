use prometheus::{Encoder, TextEncoder};

use crate::error::GatewayError;

pub async fn metrics_handler() -> Result<String, GatewayError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| GatewayError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| GatewayError::Metrics(e.to_string()))
}
