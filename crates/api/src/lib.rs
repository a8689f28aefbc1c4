//! HTTP API server for the storefront checkout system.
//!
//! Exposes REST endpoints for carts, checkout, order lifecycle, and
//! payment reconciliation, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use checkout::{
    CartService, CheckoutOrchestrator, GatewayConfig, InMemoryCustomerDirectory, OrderLifecycle,
    PaymentEngine, PaymentGateway,
};
use domain::{Money, Product};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore, InMemoryPaymentStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<G: PaymentGateway + 'static>(
    state: Arc<AppState<G>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/carts/{user_id}", get(routes::cart::get::<G>))
        .route("/carts/{user_id}", delete(routes::cart::clear::<G>))
        .route("/carts/{user_id}/lines", post(routes::cart::add_line::<G>))
        .route(
            "/carts/{user_id}/lines/{line_id}",
            put(routes::cart::update_line::<G>),
        )
        .route(
            "/carts/{user_id}/lines/{line_id}",
            delete(routes::cart::remove_line::<G>),
        )
        .route("/carts/{user_id}/checkout", post(routes::cart::checkout::<G>))
        .route("/orders", get(routes::orders::list::<G>))
        .route("/orders/{id}", get(routes::orders::get::<G>))
        .route("/orders/{id}/status", put(routes::orders::update_status::<G>))
        .route("/users/{user_id}/orders", get(routes::orders::list_for_user::<G>))
        .route(
            "/users/{user_id}/orders/{id}/cancel",
            post(routes::orders::cancel::<G>),
        )
        .route("/payments", post(routes::payments::initiate::<G>))
        .route("/payments/verify", get(routes::payments::verify::<G>))
        .route("/payments/{order_id}", get(routes::payments::get::<G>))
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

/// Creates application state over shared in-memory stores, seeded with a
/// small demo catalog.
pub fn create_default_state<G: PaymentGateway + 'static>(
    gateway: G,
    gateway_config: GatewayConfig,
) -> Arc<AppState<G>> {
    let carts = InMemoryCartStore::new();
    let catalog = InMemoryCatalog::new();
    let orders = InMemoryOrderStore::new();
    let payments = InMemoryPaymentStore::new();
    let customers = InMemoryCustomerDirectory::new();

    Arc::new(AppState {
        carts: CartService::new(carts.clone(), catalog.clone()),
        checkout: CheckoutOrchestrator::new(
            carts.clone(),
            catalog.clone(),
            orders.clone(),
            customers.clone(),
        ),
        lifecycle: OrderLifecycle::new(orders.clone(), catalog.clone()),
        payments: PaymentEngine::new(payments, orders, gateway, gateway_config),
        catalog,
        customers,
    })
}

/// Seeds the catalog with demo products for local runs.
pub async fn seed_demo_catalog(catalog: &InMemoryCatalog) {
    let products = [
        Product::new("SOCK-001", "Wool Socks", Money::from_cents(1000), 50)
            .with_images(vec!["wool.jpg".to_string()]),
        Product::new("SOCK-002", "Cotton Socks", Money::from_cents(250), 120)
            .with_images(vec!["cotton.jpg".to_string()]),
        Product::new("SOCK-003", "Running Socks", Money::from_cents(799), 30),
    ];
    for product in products {
        catalog.put(product).await;
    }
}
