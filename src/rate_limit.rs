use dashmap::DashMap;

// Per-IP policy: 10 submissions per 15 minutes
pub const IP_MAX_REQUESTS: usize = 10;
// Per-IP-per-site policy: 5 submissions per 15 minutes
pub const IP_SITE_MAX_REQUESTS: usize = 5;
pub const LEAD_WINDOW_MS: i64 = 15 * 60 * 1000;

// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Verdict returned by [`SlidingWindowLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
}

/// Sliding window limiter - remembers the admitted timestamps of every key
/// and admits a request only while fewer than `max_requests` of them are
/// strictly newer than `now - window_ms`.
///
/// Rejected calls are not recorded. Keys whose timestamps have all expired
/// are swept after every check, so the map only holds keys that were seen
/// within the last window.
///
/// Degenerate policies are not rejected here: `max_requests == 0` admits
/// nothing, and `window_ms <= 0` expires every timestamp immediately so
/// everything is admitted.
pub struct SlidingWindowLimiter {
    name: &'static str,
    entries: DashMap<String, Vec<i64>>, // key -> admitted timestamps (ms), oldest first
    max_requests: usize,
    window_ms: i64,
}

impl SlidingWindowLimiter {
    pub fn new(name: &'static str, max_requests: usize, window_ms: i64) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            max_requests,
            window_ms,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    // Check against the wall clock
    pub fn check(&self, key: &str) -> RateLimitResult {
        self.check_at(key, now_ms())
    }

    pub fn check_at(&self, key: &str, now: i64) -> RateLimitResult {
        let cutoff = now.saturating_sub(self.window_ms);

        let allowed = {
            let mut entry = self.entries.entry(key.to_string()).or_default();
            let timestamps = entry.value_mut();

            // only timestamps strictly newer than the cutoff count
            timestamps.retain(|&t| t > cutoff);

            if timestamps.len() >= self.max_requests {
                false
            } else {
                timestamps.push(now);
                true
            }
            // shard guard dropped here, retain below needs every shard
        };

        if !allowed {
            tracing::debug!(limiter = self.name, key, "request over limit");
        }

        self.sweep(now);

        RateLimitResult { allowed }
    }

    /// Drop every key whose timestamps are all at or before `now - window_ms`.
    pub fn sweep(&self, now: i64) {
        let cutoff = now.saturating_sub(self.window_ms);
        self.entries
            .retain(|_, timestamps| timestamps.iter().any(|&t| t > cutoff));
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn is_tracked(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
