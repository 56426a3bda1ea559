//! HTTP API server with observability for the order service.
//!
//! Provides REST endpoints for placing, querying, updating and cancelling
//! orders, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use fulfillment::{InventoryPort, OrderCoordinator};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderRepository;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R, I>(state: Arc<AppState<R, I>>, metrics_handle: PrometheusHandle) -> Router
where
    R: OrderRepository + 'static,
    I: InventoryPort + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    let orders = Router::new()
        .route(
            "/api/v1/orders",
            post(routes::orders::create::<R, I>).get(routes::orders::list::<R, I>),
        )
        .route("/api/v1/orders/{id}", get(routes::orders::get::<R, I>))
        .route(
            "/api/v1/orders/number/{order_number}",
            get(routes::orders::get_by_number::<R, I>),
        )
        .route(
            "/api/v1/orders/user/{user_id}",
            get(routes::orders::by_user::<R, I>),
        )
        .route(
            "/api/v1/orders/status/{status}",
            get(routes::orders::by_status::<R, I>),
        )
        .route(
            "/api/v1/orders/{id}/status",
            patch(routes::orders::update_status::<R, I>),
        )
        .route(
            "/api/v1/orders/{id}/cancel",
            post(routes::orders::cancel::<R, I>),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(routes::health::check))
        .merge(orders)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around a repository and an inventory.
///
/// Must be called within a tokio runtime: the stock-delta worker is spawned here.
pub fn create_state<R, I>(repository: R, inventory: I, queue_capacity: usize) -> Arc<AppState<R, I>>
where
    R: OrderRepository + 'static,
    I: InventoryPort + 'static,
{
    Arc::new(AppState {
        coordinator: OrderCoordinator::with_queue_capacity(repository, inventory, queue_capacity),
    })
}
