//! Tenant identity for the routing layer.
//!
//! # Core Types
//!
//! - [`TenantId`] - Opaque, case-sensitive tenant identifier
//! - [`TenantRegistry`] - The fixed set of tenants known at startup
//! - [`TenantContext`] - Request-scoped holder of the current tenant
//! - [`TenantBinding`] - Guard that releases the binding when dropped
//!
//! Only identifiers found in the registry are ever bound. The registry is
//! read-only after construction and the context slot belongs to exactly one
//! request, so neither needs a lock.

mod context;
mod id;
mod registry;

pub use context::{TenantBinding, TenantContext};
pub use id::TenantId;
pub use registry::TenantRegistry;
