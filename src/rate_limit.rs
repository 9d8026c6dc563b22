//! Per-client rate limiting for contact submissions.
//!
//! One token bucket per client IP (governor keyed limiter). A submission
//! consumes one token; tokens come back one per refill interval up to the
//! configured capacity. A periodic sweep drops buckets that are full again,
//! so the table only holds recently active clients.

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::http::HeaderMap;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::config::RateLimitConfig;

pub struct ContactRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    config: RateLimitConfig,
}

impl ContactRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = NonZeroU32::new(config.capacity).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(config.refill_interval)
            .unwrap_or_else(|| Quota::per_minute(NonZeroU32::MIN))
            .allow_burst(capacity);

        tracing::info!(
            capacity = capacity.get(),
            refill_secs = config.refill_interval.as_secs(),
            "contact rate limiter configured"
        );

        Self {
            limiter: RateLimiter::keyed(quota),
            config,
        }
    }

    /// Take one token for `ip`. `false` means the bucket is empty.
    pub fn try_acquire(&self, ip: IpAddr) -> bool {
        match self.limiter.check_key(&ip) {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(client_ip = %ip, "contact rate limit exceeded");
                false
            }
        }
    }

    /// Forget clients whose bucket has refilled completely.
    pub fn sweep(&self) {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        tracing::debug!(
            before,
            after = self.limiter.len(),
            "rate limiter sweep finished"
        );
    }

    pub fn tracked_addresses(&self) -> usize {
        self.limiter.len()
    }

    /// Run [`sweep`](Self::sweep) on the configured interval for the life of the process.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        let period = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.sweep();
            }
        })
    }
}

/// Client address for rate limiting. With `trust_proxy`, the first valid
/// X-Forwarded-For entry wins over the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip;
        }
    }
    peer.ip()
}
