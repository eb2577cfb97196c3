//! Current tenant extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use tenantry_persistence::tenant::{TenantContext, TenantId};

use crate::error::RestError;

/// The tenant bound to the running request by the tenant gate.
///
/// Only meaningful behind the gate. A handler reached without a binding is a
/// routing defect, so extraction fails with an internal error instead of
/// guessing a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentTenant(pub TenantId);

impl CurrentTenant {
    /// Returns the tenant ID.
    pub fn tenant_id(&self) -> &TenantId {
        &self.0
    }
}

impl std::fmt::Display for CurrentTenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        TenantContext::current()
            .map(CurrentTenant)
            .ok_or_else(|| RestError::Internal {
                message: "handler reached without a tenant binding".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract() -> Result<CurrentTenant, RestError> {
        let (mut parts, _) = Request::new(()).into_parts();
        CurrentTenant::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extracts_bound_tenant() {
        let tenant = TenantContext::with_tenant(TenantId::new("company-x"), extract())
            .await
            .unwrap();
        assert_eq!(tenant.tenant_id().as_str(), "company-x");
        assert_eq!(tenant.to_string(), "company-x");
    }

    #[tokio::test]
    async fn test_fails_without_binding() {
        let result = TenantContext::scope(extract()).await;
        assert!(matches!(result, Err(RestError::Internal { .. })));
    }
}
