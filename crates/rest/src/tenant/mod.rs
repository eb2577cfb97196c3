//! Tenant resolution for inbound requests.
//!
//! The tenant of a request comes from exactly one place, the `X-Tenant-Id`
//! header, and must name a tenant of the registry. There is no default
//! tenant: a request without a valid hint is rejected.
//!
//! - [`TenantResolver`] - validates the header against the registry
//! - [`TenantRejection`] - the two client-facing failure responses

mod rejection;
mod resolver;

pub use rejection::TenantRejection;
pub use resolver::{TenantResolver, X_TENANT_ID};
