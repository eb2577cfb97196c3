//! Tenantry persistence layer
//!
//! This crate decides *which* database connection a data operation is allowed
//! to use. Every tenant owns an independent database; a request is resolved to
//! exactly one tenant and every query it issues goes to that tenant's pool.
//!
//! # Architecture
//!
//! - [`tenant`] - Tenant identifiers, the immutable [`TenantRegistry`](tenant::TenantRegistry)
//!   and the request-scoped [`TenantContext`](tenant::TenantContext)
//! - [`config`] - Per-tenant connection settings and their loader
//! - [`router`] - The [`ConnectionRouter`](router::ConnectionRouter) that maps the
//!   currently bound tenant to its [`ConnectionHandle`](router::ConnectionHandle)
//! - [`backends`] - Driver specific pools (SQLite, PostgreSQL)
//! - [`migration`] - Per-tenant schema migrations
//! - [`product`] - The product repository used by the REST layer
//! - [`error`] - Error types for all of the above
//!
//! # Driver Features
//!
//! - `sqlite` (default) - SQLite via r2d2 + rusqlite
//! - `postgres` - PostgreSQL via deadpool-postgres
//!
//! # Quick Start
//!
//! ```no_run
//! use std::collections::BTreeMap;
//!
//! use tenantry_persistence::config::ConnectionSettings;
//! use tenantry_persistence::router::ConnectionRouter;
//! use tenantry_persistence::tenant::{TenantContext, TenantId, TenantRegistry};
//!
//! # async fn run() -> Result<(), tenantry_persistence::error::StorageError> {
//! let registry = TenantRegistry::new(["company-x", "company-y"])?;
//!
//! let mut settings = BTreeMap::new();
//! for tenant in registry.iter() {
//!     settings.insert(
//!         tenant.clone(),
//!         ConnectionSettings::new(
//!             format!("sqlite://{}.db", tenant),
//!             "app",
//!             "secret",
//!             "sqlite",
//!         ),
//!     );
//! }
//!
//! let router = ConnectionRouter::build(&registry, settings, 10)?;
//!
//! TenantContext::scope(async {
//!     let _binding = TenantContext::bind(TenantId::new("company-x"))?;
//!     let connection = router.resolve_current()?;
//!     assert_eq!(connection.tenant_id().as_str(), "company-x");
//!     Ok::<_, tenantry_persistence::error::StorageError>(())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("at least one database driver feature must be enabled: `sqlite` or `postgres`");

pub mod backends;
pub mod config;
pub mod error;
pub mod migration;
pub mod product;
pub mod router;
pub mod tenant;

pub use error::{StorageError, StorageResult};
