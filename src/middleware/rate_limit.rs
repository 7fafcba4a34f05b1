//! In-memory sliding-window rate limiter for the chat endpoints.
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Client identity. `None` collects requests that arrive without a peer address.
pub type ClientKey = Option<IpAddr>;

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<ClientKey, VecDeque<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_secs: u64) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Admits the request when `client` has capacity left in the current window.
    pub async fn admit(&self, client: ClientKey) -> bool {
        self.admit_at(client, Instant::now()).await
    }

    async fn admit_at(&self, client: ClientKey, now: Instant) -> bool {
        let mut windows = self.windows.lock().await;
        let recent = windows.entry(client).or_default();
        expire(recent, now, self.window);

        if recent.len() >= self.max_requests {
            return false;
        }
        recent.push_back(now);
        true
    }

    /// Forgets clients whose window has emptied. Returns how many remain tracked.
    pub async fn cleanup(&self) -> usize {
        self.cleanup_at(Instant::now()).await
    }

    async fn cleanup_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().await;
        windows.retain(|_, recent| {
            expire(recent, now, self.window);
            !recent.is_empty()
        });
        tracing::debug!("Rate limiter tracks {} clients", windows.len());
        windows.len()
    }
}

/// Timestamps are pushed in order, so expired ones sit at the front.
fn expire(recent: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while recent
        .front()
        .is_some_and(|&seen| now.saturating_duration_since(seen) >= window)
    {
        recent.pop_front();
    }
}

pub async fn rate_limit_middleware(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = connect_info.map(|ConnectInfo(addr)| addr.ip());

    if !limiter.admit(client).await {
        match client {
            Some(ip) => tracing::warn!("Chat rate limit hit by {}", ip),
            None => tracing::warn!("Chat rate limit hit by a client without a peer address"),
        }
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests. Please try again later.",
        )
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip(last: u8) -> ClientKey {
        Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)))
    }

    #[tokio::test]
    async fn each_client_gets_its_own_window() {
        let limiter = RateLimiter::new(3, 60);

        for _ in 0..3 {
            assert!(limiter.admit(ip(1)).await);
        }
        assert!(!limiter.admit(ip(1)).await);

        assert!(limiter.admit(ip(2)).await);
        assert!(limiter.admit(None).await);
    }

    #[tokio::test]
    async fn capacity_returns_as_the_window_slides() {
        let limiter = RateLimiter::new(2, 10);
        let start = Instant::now();

        assert!(limiter.admit_at(ip(1), start).await);
        assert!(limiter.admit_at(ip(1), start + Duration::from_secs(4)).await);
        assert!(!limiter.admit_at(ip(1), start + Duration::from_secs(9)).await);

        // The first request has aged out; the second still counts.
        assert!(limiter.admit_at(ip(1), start + Duration::from_secs(10)).await);
        assert!(!limiter.admit_at(ip(1), start + Duration::from_secs(11)).await);
    }

    #[tokio::test]
    async fn cleanup_forgets_idle_clients() {
        let limiter = RateLimiter::new(5, 1);
        let start = Instant::now();

        limiter.admit_at(ip(1), start).await;
        limiter.admit_at(ip(2), start + Duration::from_millis(900)).await;

        assert_eq!(limiter.cleanup_at(start + Duration::from_millis(1_100)).await, 1);
        assert_eq!(limiter.cleanup_at(start + Duration::from_secs(2)).await, 0);
        assert!(limiter.windows.lock().await.is_empty());
    }
}
