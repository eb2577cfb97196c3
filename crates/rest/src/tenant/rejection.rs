//! Responses for requests whose tenant cannot be resolved.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::responses::ProblemDetail;

/// Why the tenant gate refused a request. Both cases are client errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenantRejection {
    /// The request carried no `X-Tenant-Id` header.
    #[error("Header X-Tenant-Id was not present in the request")]
    Missing,

    /// The header value does not name a registered tenant.
    #[error("Value of header X-Tenant-Id does not match a known database tenant")]
    Unknown {
        /// The header value as sent.
        tenant_id: String,
    },
}

impl TenantRejection {
    /// Problem title for this rejection.
    pub fn title(&self) -> &'static str {
        match self {
            TenantRejection::Missing => "Missing database tenant",
            TenantRejection::Unknown { .. } => "Unknown database tenant",
        }
    }

    /// Builds the problem detail body.
    pub fn to_problem(&self) -> ProblemDetail {
        let problem = ProblemDetail::for_status(StatusCode::BAD_REQUEST)
            .with_title(self.title())
            .with_detail(self.to_string());

        match self {
            TenantRejection::Missing => problem,
            TenantRejection::Unknown { tenant_id } => {
                problem.with_mirrored_property("tenantId", tenant_id.as_str())
            }
        }
    }
}

impl IntoResponse for TenantRejection {
    fn into_response(self) -> Response {
        self.to_problem().into_response()
    }
}
