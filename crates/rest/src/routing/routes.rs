//! Route configuration.

use axum::{
    Router, middleware,
    routing::get,
};

use crate::handlers;
use crate::middleware::tenant_gate;
use crate::state::AppState;

/// Creates all routes.
///
/// # Routes
///
/// ## Tenant routes (require `X-Tenant-Id`)
/// - `POST /products` - Create a product
/// - `GET /products` - List products
/// - `GET /products/{id}` - Read a product
///
/// ## Operational routes
/// - `GET /health` - Health check
/// - `GET /_readiness` - Per-tenant database readiness
pub fn create_routes(state: AppState) -> Router {
    let tenant_routes = Router::new()
        .route(
            "/products",
            get(handlers::list_products_handler).post(handlers::create_product_handler),
        )
        .route("/products/{id}", get(handlers::get_product_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), tenant_gate));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/_readiness", get(handlers::readiness_handler))
        .merge(tenant_routes)
        .with_state(state)
}
