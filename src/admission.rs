use std::sync::Arc;

use crate::bot::{BotHeuristic, BotSignal, FormFields, strip_bot_fields};
use crate::rate_limit::SlidingWindowLimiter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitScope {
    Ip,
    IpSite,
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Ip => "ip",
            RateLimitScope::IpSite => "ip_site",
        }
    }
}

/// Outcome of running one submission through the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    // Looks automated; answer with success and drop it
    FakeAccepted(BotSignal),
    Rejected(RateLimitScope),
    // Cleaned fields ready for persistence
    Admitted(FormFields),
}

pub fn ip_site_key(ip: &str, site_id: &str) -> String {
    format!("{}:{}", ip, site_id)
}

/// Bot check first, then the per-IP limiter, then the per-IP-per-site limiter.
///
/// The limiters are shared with every request handled by the process; the
/// pipeline only borrows them.
#[derive(Clone)]
pub struct AdmissionPipeline {
    bot: BotHeuristic,
    ip_limiter: Arc<SlidingWindowLimiter>,
    ip_site_limiter: Arc<SlidingWindowLimiter>,
}

impl AdmissionPipeline {
    pub fn new(
        bot: BotHeuristic,
        ip_limiter: Arc<SlidingWindowLimiter>,
        ip_site_limiter: Arc<SlidingWindowLimiter>,
    ) -> Self {
        Self {
            bot,
            ip_limiter,
            ip_site_limiter,
        }
    }

    // Bot verdict alone, without touching any limiter
    pub fn screen(&self, fields: &FormFields, now: i64) -> Option<BotSignal> {
        self.bot.detect(fields, now)
    }

    pub fn admit(&self, ip: &str, site_id: &str, fields: &FormFields, now: i64) -> Admission {
        if let Some(signal) = self.screen(fields, now) {
            return Admission::FakeAccepted(signal);
        }

        let cleaned = strip_bot_fields(fields);

        if !self.ip_limiter.check_at(ip, now).allowed {
            return Admission::Rejected(RateLimitScope::Ip);
        }

        if !self.ip_site_limiter.check_at(&ip_site_key(ip, site_id), now).allowed {
            return Admission::Rejected(RateLimitScope::IpSite);
        }

        Admission::Admitted(cleaned)
    }

    pub fn limiters(&self) -> [&Arc<SlidingWindowLimiter>; 2] {
        [&self.ip_limiter, &self.ip_site_limiter]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{FieldValue, HONEYPOT_FIELD, RENDERED_AT_FIELD};
    use crate::rate_limit::{IP_MAX_REQUESTS, IP_SITE_MAX_REQUESTS, LEAD_WINDOW_MS};

    fn pipeline() -> AdmissionPipeline {
        AdmissionPipeline::new(
            BotHeuristic::default(),
            Arc::new(SlidingWindowLimiter::new("ip", IP_MAX_REQUESTS, LEAD_WINDOW_MS)),
            Arc::new(SlidingWindowLimiter::new(
                "ip_site",
                IP_SITE_MAX_REQUESTS,
                LEAD_WINDOW_MS,
            )),
        )
    }

    fn lead(rendered_at: i64) -> FormFields {
        let mut f = FormFields::new();
        f.insert("email".into(), FieldValue::Text("a@b.com".into()));
        f.insert(HONEYPOT_FIELD.into(), FieldValue::Text(String::new()));
        f.insert(RENDERED_AT_FIELD.into(), FieldValue::Number(rendered_at as f64));
        f
    }

    #[test]
    fn test_admitted_fields_are_cleaned() {
        let gate = pipeline();
        match gate.admit("1.2.3.4", "site-a", &lead(0), 10_000) {
            Admission::Admitted(fields) => {
                assert_eq!(fields.len(), 1);
                assert!(fields.contains_key("email"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_sixth_submission_to_same_site_is_rejected() {
        let gate = pipeline();
        let start = 10_000;
        for i in 0..5 {
            let verdict = gate.admit("1.2.3.4", "site-a", &lead(0), start + i * 1000);
            assert!(matches!(verdict, Admission::Admitted(_)));
        }
        let sixth = gate.admit("1.2.3.4", "site-a", &lead(0), start + 5000);
        assert_eq!(sixth, Admission::Rejected(RateLimitScope::IpSite));

        // per-IP budget still has room for another site
        let other_site = gate.admit("1.2.3.4", "site-b", &lead(0), start + 6000);
        assert!(matches!(other_site, Admission::Admitted(_)));
    }

    #[test]
    fn test_ip_cap_spans_sites() {
        let gate = pipeline();
        let mut now = 10_000;
        for site in ["s1", "s2", "s3", "s4", "s5"] {
            for _ in 0..2 {
                assert!(matches!(
                    gate.admit("5.6.7.8", site, &lead(0), now),
                    Admission::Admitted(_)
                ));
                now += 100;
            }
        }
        assert_eq!(
            gate.admit("5.6.7.8", "s6", &lead(0), now),
            Admission::Rejected(RateLimitScope::Ip)
        );
        assert!(matches!(
            gate.admit("9.9.9.9", "s6", &lead(0), now),
            Admission::Admitted(_)
        ));
    }

    #[test]
    fn test_bots_are_fake_accepted_without_consuming_quota() {
        let gate = pipeline();
        let mut trap = lead(0);
        trap.insert(HONEYPOT_FIELD.into(), FieldValue::Text("http://spam".into()));

        for i in 0..20 {
            assert_eq!(
                gate.admit("1.2.3.4", "site-a", &trap, 10_000 + i),
                Admission::FakeAccepted(BotSignal::Honeypot)
            );
        }
        assert_eq!(
            gate.admit("1.2.3.4", "site-a", &lead(10_000), 10_500),
            Admission::FakeAccepted(BotSignal::TooFast)
        );
        for limiter in gate.limiters() {
            assert_eq!(limiter.tracked_keys(), 0);
        }
        assert!(matches!(
            gate.admit("1.2.3.4", "site-a", &lead(0), 20_000),
            Admission::Admitted(_)
        ));
    }

    #[test]
    fn test_quota_returns_after_window() {
        let gate = pipeline();
        for i in 0..5 {
            gate.admit("1.2.3.4", "site-a", &lead(0), 10_000 + i);
        }
        assert!(matches!(
            gate.admit("1.2.3.4", "site-a", &lead(0), 10_010),
            Admission::Rejected(_)
        ));
        assert!(matches!(
            gate.admit("1.2.3.4", "site-a", &lead(0), 10_001 + LEAD_WINDOW_MS),
            Admission::Admitted(_)
        ));
    }

    #[test]
    fn test_ip_site_key_format() {
        assert_eq!(ip_site_key("10.0.0.1", "abc"), "10.0.0.1:abc");
    }
}
