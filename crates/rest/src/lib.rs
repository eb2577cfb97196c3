//! # tenantry-rest - Tenant-routed HTTP API
//!
//! This crate exposes the product API of a multi-tenant server. Each tenant
//! owns its own database; every request names its tenant in the
//! `X-Tenant-Id` header and is served from that tenant's database only.
//!
//! ## Request Flow
//!
//! 1. The tenant gate reads `X-Tenant-Id` and checks it against the
//!    [`TenantRegistry`](tenantry_persistence::tenant::TenantRegistry).
//! 2. Missing or unknown tenants are answered with `400` problem details and
//!    never reach a handler.
//! 3. Valid tenants are bound to the request's
//!    [`TenantContext`](tenantry_persistence::tenant::TenantContext) for the
//!    duration of the handler.
//! 4. Handlers use the
//!    [`ProductRepository`](tenantry_persistence::product::ProductRepository),
//!    which routes each call to the bound tenant's connection pool.
//! 5. The binding is released before the response is sent.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tenantry_rest::{create_app, AppState, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig {
//!         tenants: vec!["company-x".into(), "company-y".into()],
//!         ..Default::default()
//!     };
//!
//!     let state = AppState::initialize(config).await?;
//!     let app = create_app(state);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Operation | HTTP Method | URL Pattern | Tenant header |
//! |-----------|-------------|-------------|---------------|
//! | create product | POST | `/products` | required |
//! | list products | GET | `/products` | required |
//! | read product | GET | `/products/{id}` | required |
//! | health | GET | `/health` | no |
//! | readiness | GET | `/_readiness` | no |
//!
//! ## Error Handling
//!
//! Errors are returned as [RFC 9457](https://www.rfc-editor.org/rfc/rfc9457)
//! problem details (`application/problem+json`):
//!
//! | HTTP Status | Title | Cause |
//! |-------------|-------|-------|
//! | 400 | Missing database tenant | no `X-Tenant-Id` header |
//! | 400 | Unknown database tenant | header names no registered tenant |
//! | 400 | Bad Request | malformed or invalid body |
//! | 404 | Not Found | unknown product id |
//! | 500 | Internal Server Error | database or routing failure |
//!
//! ## Configuration
//!
//! The server is configured via command-line flags or environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `REST_SERVER_PORT` | 8080 | Server port |
//! | `REST_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `REST_LOG_LEVEL` | info | Log level (error, warn, info, debug, trace) |
//! | `REST_MAX_BODY_SIZE` | 1048576 | Max request body size (bytes) |
//! | `REST_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `REST_ENABLE_CORS` | true | Enable CORS |
//! | `REST_CORS_ORIGINS` | * | Allowed CORS origins |
//! | `REST_TENANTS` | | Comma separated tenant ids |
//! | `REST_TENANTS_LOCATION` | tenants | Directory of `<tenant>.toml` files |
//! | `REST_DATASOURCE_DRIVER` | | Driver for files that omit one |
//! | `REST_MAX_CONNECTIONS` | 10 | Pool size per tenant |
//!
//! ## Architecture
//!
//! - [`error`] - Error types and problem detail generation
//! - [`config`] - Server configuration
//! - [`state`] - Application state (registry, router, repositories)
//! - [`tenant`] - Tenant header resolution and rejections
//! - [`middleware`] - The tenant gate
//! - [`extractors`] - Axum extractors
//! - [`handlers`] - HTTP request handlers
//! - [`responses`] - Problem detail bodies
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod routing;
pub mod state;
pub mod tenant;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{RestError, RestResult};
pub use state::AppState;

use axum::{Router, extract::DefaultBodyLimit};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application for an initialized [`AppState`].
///
/// Layers are taken from the state's [`ServerConfig`].
///
/// # Example
///
/// ```rust,ignore
/// use tenantry_rest::{create_app, AppState, ServerConfig};
///
/// let state = AppState::initialize(ServerConfig::for_testing(&["company-x"])).await?;
/// let app = create_app(state);
/// ```
pub fn create_app(state: AppState) -> Router {
    let config = state.config().clone();

    info!(
        tenants = state.registry().len(),
        "Creating REST API server"
    );

    let router = routing::create_routes(state);

    // Build middleware stack
    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    let router = router.layer(DefaultBodyLimit::max(config.max_body_size));

    // Add CORS if enabled
    let router = if config.enable_cors {
        let cors = build_cors_layer(&config);
        router.layer(cors)
    } else {
        router
    };

    // Apply remaining middleware
    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG`, when set,
/// takes precedence over `level`.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tenantry_rest={level},tenantry_persistence={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
