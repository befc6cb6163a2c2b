pub mod fxql;
pub mod health;
pub mod rate_limit;

use crate::config::Config;
use crate::db::Repository;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use rate_limit::ClientRateLimiter;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub rate_limiter: Arc<ClientRateLimiter>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        let rate_limiter = Arc::new(rate_limit::client_rate_limiter(
            config.rate_limit_max,
            config.rate_limit_window,
        ));
        Self {
            repo,
            config,
            rate_limiter,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // The rate limit applies to the routes registered before `route_layer`.
    Router::new()
        .route("/fxql-statements", post(fxql::create_fxql_statements))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .layer(cors)
        .with_state(state)
}
