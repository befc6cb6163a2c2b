//! Per-client request throttling for the FXQL endpoint.

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::AppState;
use crate::error::AppError;

pub type ClientRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Allows `max_requests` per client per `window`, refilling evenly.
pub fn client_rate_limiter(max_requests: u32, window: Duration) -> ClientRateLimiter {
    RateLimiter::keyed(quota_from_window(window, max_requests))
}

fn quota_from_window(window: Duration, max_requests: u32) -> Quota {
    let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

/// Drops clients whose bucket has fully refilled, so the key set only holds
/// recently active addresses.
pub fn prune_idle_clients(limiter: &ClientRateLimiter) {
    limiter.retain_recent();
    limiter.shrink_to_fit();
    debug!(clients = limiter.len(), "Pruned idle rate-limit clients");
}

/// Runs `prune_idle_clients` every `every` until the runtime shuts down.
pub fn spawn_pruner(limiter: Arc<ClientRateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            prune_idle_clients(&limiter);
        }
    })
}

/// Middleware rejecting clients that exhausted their budget.
///
/// Requests without connection info (e.g. in-process tests) share one
/// bucket keyed by the unspecified address.
pub async fn enforce(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if state.rate_limiter.check_key(&client).is_err() {
        warn!(client = %client, "Rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_allows_burst_then_rejects() {
        let limiter = client_rate_limiter(2, Duration::from_secs(60));
        let client = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        assert!(limiter.check_key(&client).is_ok());
        assert!(limiter.check_key(&client).is_ok());
        assert!(limiter.check_key(&client).is_err());
    }

    #[test]
    fn test_limiter_tracks_clients_independently() {
        let limiter = client_rate_limiter(1, Duration::from_secs(60));
        let first = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let second = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert!(limiter.check_key(&first).is_ok());
        assert!(limiter.check_key(&first).is_err());
        assert!(limiter.check_key(&second).is_ok());
    }

    #[test]
    fn test_prune_evicts_idle_clients() {
        let limiter = client_rate_limiter(1, Duration::from_millis(10));
        let idle = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        assert!(limiter.check_key(&idle).is_ok());
        assert_eq!(limiter.len(), 1);

        std::thread::sleep(Duration::from_millis(50));
        prune_idle_clients(&limiter);
        assert_eq!(limiter.len(), 0);
    }

    #[test]
    fn test_prune_keeps_throttled_clients() {
        let limiter = client_rate_limiter(1, Duration::from_secs(60));
        let busy = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert!(limiter.check_key(&busy).is_ok());
        prune_idle_clients(&limiter);
        assert_eq!(limiter.len(), 1);
        assert!(limiter.check_key(&busy).is_err());
    }

    #[tokio::test]
    async fn test_pruner_task_evicts_in_background() {
        let limiter = Arc::new(client_rate_limiter(1, Duration::from_millis(10)));
        assert!(limiter
            .check_key(&IpAddr::V4(Ipv4Addr::new(10, 0, 0, 3)))
            .is_ok());

        let handle = spawn_pruner(limiter.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(limiter.len(), 0);
    }
}
