use clap::Parser;
use std::time::Duration;

use crate::bot::MIN_SUBMISSION_TIME_MS;
use crate::error::ConfigError;
use crate::rate_limit::{IP_MAX_REQUESTS, IP_SITE_MAX_REQUESTS, LEAD_WINDOW_MS};

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "lead-gate")]
#[command(about = "Abuse-protected lead and analytics intake for hosted landing pages")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "LEAD_GATE_PORT", default_value_t = 8080)]
    pub port: u16,

    // Max lead submissions per IP per window
    #[arg(long, env = "LEAD_GATE_IP_LIMIT", default_value_t = IP_MAX_REQUESTS)]
    pub ip_limit: usize,

    // Max lead submissions per IP per site per window
    #[arg(long, env = "LEAD_GATE_IP_SITE_LIMIT", default_value_t = IP_SITE_MAX_REQUESTS)]
    pub ip_site_limit: usize,

    // Lead rate limit window in seconds
    #[arg(long, env = "LEAD_GATE_RATE_WINDOW", default_value_t = (LEAD_WINDOW_MS / 1000) as u64)]
    pub rate_window: u64,

    // Forms submitted faster than this after rendering are treated as bots
    #[arg(long, env = "LEAD_GATE_MIN_SUBMIT_MS", default_value_t = MIN_SUBMISSION_TIME_MS as u64)]
    pub min_submit_ms: u64,

    // Max analytics events per IP per site per event window
    #[arg(long, env = "LEAD_GATE_EVENT_LIMIT", default_value_t = 120)]
    pub event_limit: usize,

    // Analytics event window in seconds
    #[arg(long, env = "LEAD_GATE_EVENT_WINDOW", default_value_t = 60)]
    pub event_window: u64,

    // How often idle limiter keys are swept
    #[arg(long, env = "LEAD_GATE_SWEEP_INTERVAL", default_value_t = 60)]
    pub sweep_interval: u64,

    // Take the client IP from X-Forwarded-For / X-Real-IP
    #[arg(long, env = "LEAD_GATE_TRUST_PROXY", default_value_t = false)]
    pub trust_proxy: bool,

    // Hosted database REST endpoint; leads stay in memory when unset
    #[arg(long, env = "LEAD_GATE_BACKEND_URL")]
    pub backend_url: Option<String>,

    #[arg(long, env = "LEAD_GATE_BACKEND_KEY", hide_env_values = true)]
    pub backend_key: Option<String>,

    // Salt for the IP hash stored with each lead
    #[arg(long, env = "LEAD_GATE_IP_SALT", default_value = "lead-gate", hide_env_values = true)]
    pub ip_salt: String,

    // Persistence queue capacity
    #[arg(long, env = "LEAD_GATE_QUEUE_SIZE", default_value_t = 100)]
    pub queue_size: usize,

    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("--ip-limit", self.ip_limit as u64),
            ("--ip-site-limit", self.ip_site_limit as u64),
            ("--rate-window", self.rate_window),
            ("--event-limit", self.event_limit as u64),
            ("--event-window", self.event_window),
            ("--sweep-interval", self.sweep_interval),
            ("--queue-size", self.queue_size as u64),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::NotPositive(*name));
        }

        if self.backend_url.is_some() && self.backend_key.is_none() {
            return Err(ConfigError::MissingBackendKey);
        }
        Ok(())
    }

    pub fn rate_window_ms(&self) -> i64 {
        secs_to_ms(self.rate_window)
    }

    pub fn event_window_ms(&self) -> i64 {
        secs_to_ms(self.event_window)
    }

    pub fn sweep_every(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("lead-gate").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_match_reference_policy() {
        let args = parse(&[]);
        assert_eq!(args.ip_limit, 10);
        assert_eq!(args.ip_site_limit, 5);
        assert_eq!(args.rate_window_ms(), 900_000);
        assert_eq!(args.min_submit_ms, 2000);
        assert!(!args.trust_proxy);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let args = parse(&["--ip-site-limit", "0"]);
        assert!(matches!(
            args.validate(),
            Err(ConfigError::NotPositive("--ip-site-limit"))
        ));
    }

    #[test]
    fn test_backend_needs_key() {
        let args = parse(&["--backend-url", "http://db.local"]);
        assert!(matches!(args.validate(), Err(ConfigError::MissingBackendKey)));

        let args = parse(&["--backend-url", "http://db.local", "--backend-key", "k"]);
        assert!(args.validate().is_ok());
    }
}
