//! Tenant resolution from request headers.

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName};
use tenantry_persistence::tenant::{TenantId, TenantRegistry};

use super::rejection::TenantRejection;

/// Header carrying the tenant hint.
pub static X_TENANT_ID: HeaderName = HeaderName::from_static("x-tenant-id");

/// Resolves the tenant hint of a request against the registry.
///
/// Resolution has exactly three outcomes:
///
/// 1. no `X-Tenant-Id` header: [`TenantRejection::Missing`]
/// 2. a value that is not a registered tenant: [`TenantRejection::Unknown`],
///    carrying the value as sent
/// 3. a registered tenant: its [`TenantId`]
///
/// Matching is exact and case-sensitive. An empty header value is an
/// unknown tenant, not a missing one, and so is a value that is not valid
/// UTF-8.
#[derive(Debug, Clone)]
pub struct TenantResolver {
    registry: Arc<TenantRegistry>,
}

impl TenantResolver {
    /// Creates a resolver over `registry`.
    pub fn new(registry: Arc<TenantRegistry>) -> Self {
        Self { registry }
    }

    /// The registry tenants are validated against.
    pub fn registry(&self) -> &TenantRegistry {
        &self.registry
    }

    /// Resolves the tenant from request headers.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<TenantId, TenantRejection> {
        let Some(value) = headers.get(&X_TENANT_ID) else {
            return Err(TenantRejection::Missing);
        };

        // A value that is not valid UTF-8 can never name a tenant. It is
        // echoed back byte-escaped rather than lossily decoded.
        let Ok(hint) = std::str::from_utf8(value.as_bytes()) else {
            return Err(TenantRejection::Unknown {
                tenant_id: value.as_bytes().escape_ascii().to_string(),
            });
        };

        match self.registry.get(hint) {
            Some(tenant_id) => Ok(tenant_id.clone()),
            None => Err(TenantRejection::Unknown {
                tenant_id: hint.to_string(),
            }),
        }
    }
}
