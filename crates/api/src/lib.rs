//! HTTP checkout server with observability.
//!
//! Exposes the place-order saga over REST, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{CheckoutOrchestrator, CheckoutServices, ConnectorPool};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: CheckoutOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: CheckoutOrchestrator) -> Arc<Self> {
        Arc::new(Self { orchestrator })
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/checkout/orders", post(routes::checkout::place_order))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds application state that talks to the configured backends over HTTP.
pub fn create_remote_state(config: &Config) -> Arc<AppState> {
    let pool = Arc::new(ConnectorPool::new(config.connector_config()));
    let services = CheckoutServices::remote(pool, &config.backends);
    AppState::new(CheckoutOrchestrator::new(services, config.checkout.clone()))
}
