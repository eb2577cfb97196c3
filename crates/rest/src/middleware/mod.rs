//! HTTP middleware for the REST API.
//!
//! - [`tenant`] - the tenant gate in front of every data route

pub mod tenant;

pub use tenant::tenant_gate;
