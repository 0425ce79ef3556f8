/*
 * This file is part of the Obvia ERP.
 *
 * Copyright (C) 2025 Kovács Dávid <kapcsolat@kovacsdavid.dev>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::common::error::{TenantError, TenantErrorKind};
use crate::common::extractors::client_ip::ClientIp;

struct Window {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window counter keyed by client IP. `requests_per_window` defaults to 100
/// per 15 minutes (§4.8); a tenant descriptor's `security.rateLimitRequests`
/// overrides the per-minute figure for that tenant's own requests when wired via
/// [`RateLimiter::with_limit`].
pub struct RateLimiter {
    requests_per_window: u32,
    window: Duration,
    windows: RwLock<HashMap<IpAddr, Window>>,
}

pub enum RateLimitDecision {
    Allowed { remaining: u32, reset_in: Duration },
    Exceeded { retry_after: Duration, reset_in: Duration },
}

impl RateLimiter {
    pub fn new(requests_per_window: u32, window: Duration) -> Self {
        Self {
            requests_per_window,
            window,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Default policy: 100 requests per 15 minutes.
    pub fn default_policy() -> Self {
        Self::new(100, Duration::from_secs(15 * 60))
    }

    /// Builds a tenant-scoped limiter from that tenant's own
    /// `security.rateLimitRequests`, applied over a one-minute window in place of
    /// the platform-wide 15-minute default.
    pub fn with_limit(requests_per_minute: u32) -> Self {
        Self::new(requests_per_minute, Duration::from_secs(60))
    }

    pub fn check(&self, ip: IpAddr) -> RateLimitDecision {
        let now = Instant::now();
        let mut windows = self.windows.write().expect("rate limiter map poisoned");
        let entry = windows.entry(ip).or_insert_with(|| Window {
            count: 0,
            reset_at: now + self.window,
        });

        if now >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + self.window;
        }

        let reset_in = entry.reset_at.saturating_duration_since(now);
        if entry.count >= self.requests_per_window {
            return RateLimitDecision::Exceeded {
                retry_after: reset_in,
                reset_in,
            };
        }

        entry.count += 1;
        RateLimitDecision::Allowed {
            remaining: self.requests_per_window - entry.count,
            reset_in,
        }
    }

    /// Drops windows that have already reset and were not touched since — called
    /// periodically so the map does not grow unbounded with one-shot clients.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.write().expect("rate limiter map poisoned");
        let before = windows.len();
        windows.retain(|_, w| now < w.reset_at);
        before - windows.len()
    }
}

/// Per-tenant limiters built lazily from each tenant's own `rateLimitRequests`,
/// keyed by tenant id so a busy tenant's own clients don't eat into the platform-wide
/// budget the global [`RateLimiter`] enforces.
pub struct TenantRateLimiters {
    limiters: RwLock<HashMap<String, Arc<RateLimiter>>>,
}

impl TenantRateLimiters {
    pub fn new() -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the tenant's limiter, building it from `requests_per_minute` on first use.
    /// A later call with a different `requests_per_minute` for the same tenant does not
    /// retroactively resize the cached limiter until it is evicted.
    pub fn get_or_create(&self, tenant_id: &str, requests_per_minute: u32) -> Arc<RateLimiter> {
        if let Some(limiter) = self.limiters.read().expect("tenant rate limiter map poisoned").get(tenant_id) {
            return limiter.clone();
        }
        let mut limiters = self.limiters.write().expect("tenant rate limiter map poisoned");
        limiters
            .entry(tenant_id.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::with_limit(requests_per_minute)))
            .clone()
    }
}

impl Default for TenantRateLimiters {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    ClientIp(ip): ClientIp,
    req: Request,
    next: Next,
) -> Response {
    match limiter.check(ip) {
        RateLimitDecision::Allowed { remaining, reset_in } => {
            let mut response = next.run(req).await;
            insert_rate_limit_headers(&mut response, limiter.requests_per_window, remaining, reset_in);
            response
        }
        RateLimitDecision::Exceeded { retry_after, reset_in } => {
            crate::security::audit::rate_limit(ip, true);
            let mut response = TenantError::new(
                TenantErrorKind::RateLimitExceeded,
                "rate limit exceeded, please retry later",
            )
            .into_response();
            insert_rate_limit_headers(&mut response, limiter.requests_per_window, 0, reset_in);
            if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().to_string()) {
                response.headers_mut().insert("retry-after", value);
            }
            response
        }
    }
}

fn insert_rate_limit_headers(
    response: &mut Response,
    limit: u32,
    remaining: u32,
    reset_in: Duration,
) {
    let headers = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&limit.to_string()) {
        headers.insert("x-ratelimit-limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", v);
    }
    if let Ok(v) = HeaderValue::from_str(&reset_in.as_secs().to_string()) {
        headers.insert("x-ratelimit-reset", v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(matches!(limiter.check(ip), RateLimitDecision::Allowed { .. }));
        assert!(matches!(limiter.check(ip), RateLimitDecision::Allowed { .. }));
        assert!(matches!(limiter.check(ip), RateLimitDecision::Exceeded { .. }));
    }

    #[test]
    fn tracks_ips_independently() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let a: IpAddr = "127.0.0.1".parse().unwrap();
        let b: IpAddr = "127.0.0.2".parse().unwrap();
        assert!(matches!(limiter.check(a), RateLimitDecision::Allowed { .. }));
        assert!(matches!(limiter.check(b), RateLimitDecision::Allowed { .. }));
        assert!(matches!(limiter.check(a), RateLimitDecision::Exceeded { .. }));
    }

    #[test]
    fn tenant_rate_limiters_reuses_the_same_limiter_for_a_tenant() {
        let limiters = TenantRateLimiters::new();
        let a = limiters.get_or_create("acme", 5);
        let b = limiters.get_or_create("acme", 5);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn with_limit_applies_a_one_minute_window() {
        let limiter = RateLimiter::with_limit(1);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(matches!(limiter.check(ip), RateLimitDecision::Allowed { .. }));
        match limiter.check(ip) {
            RateLimitDecision::Exceeded { reset_in, .. } => assert!(reset_in <= Duration::from_secs(60)),
            _ => panic!("expected the second request within the window to be exceeded"),
        }
    }

    #[test]
    fn resets_after_the_window_elapses() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(matches!(limiter.check(ip), RateLimitDecision::Allowed { .. }));
        std::thread::sleep(Duration::from_millis(20));
        assert!(matches!(limiter.check(ip), RateLimitDecision::Allowed { .. }));
    }
}
