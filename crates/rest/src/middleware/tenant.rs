//! The tenant gate.
//!
//! Every product route runs behind [`tenant_gate`]. It validates the
//! `X-Tenant-Id` header, binds the tenant for the duration of the handler and
//! releases the binding before the response leaves the middleware, whether
//! the handler returned normally, failed, or panicked.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tenantry_persistence::tenant::TenantContext;
use tracing::warn;

use crate::{error::RestError, state::AppState};

/// Middleware binding the request's tenant.
///
/// Rejected requests never reach the handler and never touch a database.
///
/// Use with [`axum::middleware::from_fn_with_state`].
pub async fn tenant_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    TenantContext::scope(async move {
        let tenant_id = match state.resolver().resolve(request.headers()) {
            Ok(tenant_id) => tenant_id,
            Err(rejection) => {
                warn!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    reason = %rejection,
                    "Rejected request without a valid tenant"
                );
                return rejection.into_response();
            }
        };

        let binding = match TenantContext::bind(tenant_id) {
            Ok(binding) => binding,
            Err(err) => return RestError::from(err).into_response(),
        };

        let response = next.run(request).await;
        drop(binding);
        response
    })
    .await
}
