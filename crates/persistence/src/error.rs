//! Error types for the persistence layer.
//!
//! Errors are split by when they can happen:
//!
//! - [`ConfigError`] - startup configuration problems. Always fatal; the process
//!   must not start with a partially configured tenant set.
//! - [`RoutingError`] - the tenant binding is missing or points nowhere when a
//!   data operation runs. Indicates a wiring defect, never a client mistake.
//! - [`BackendError`] - the database itself failed.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;

use crate::tenant::TenantId;

/// The primary error type for all persistence operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Startup configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Tenant routing errors
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// Driver-level errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors detected while building the registry, loading tenant settings or
/// constructing the connection router.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No tenants were configured.
    #[error("at least one tenant must be configured")]
    EmptyTenantList,

    /// A tenant identifier was empty or only whitespace.
    #[error("tenant identifiers must not be blank")]
    BlankTenantId,

    /// The same tenant identifier appears more than once.
    #[error("tenant '{tenant_id}' is configured more than once")]
    DuplicateTenant { tenant_id: TenantId },

    /// A required connection property is absent.
    #[error("property '{property}' is required for tenant '{tenant_id}'")]
    MissingProperty {
        tenant_id: TenantId,
        property: &'static str,
    },

    /// The tenant's settings file could not be read.
    #[error("cannot read settings for tenant '{tenant_id}' from {}", path.display())]
    UnreadableSource {
        tenant_id: TenantId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tenant's settings file is not valid TOML.
    #[error("malformed settings for tenant '{tenant_id}' in {}: {message}", path.display())]
    MalformedSource {
        tenant_id: TenantId,
        path: PathBuf,
        message: String,
    },

    /// The driver name does not match any known driver.
    #[error("unknown driver '{driver}' for tenant '{tenant_id}'")]
    UnknownDriver { tenant_id: TenantId, driver: String },

    /// The driver exists but was not compiled into this binary.
    #[error("driver '{driver}' for tenant '{tenant_id}' requires the '{feature}' feature")]
    DriverNotEnabled {
        tenant_id: TenantId,
        driver: &'static str,
        feature: &'static str,
    },

    /// The connection URL cannot be used with the selected driver.
    #[error("invalid connection url for tenant '{tenant_id}': {message}")]
    InvalidUrl { tenant_id: TenantId, message: String },

    /// A registered tenant has no connection settings.
    #[error("no connection settings for tenant '{tenant_id}'")]
    MissingConnection { tenant_id: TenantId },

    /// Connection settings were supplied for a tenant outside the registry.
    #[error("connection settings supplied for unregistered tenant '{tenant_id}'")]
    UnregisteredConnection { tenant_id: TenantId },
}

/// Errors raised when a data operation asks for the current connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// No tenant is bound to the current request.
    #[error("no tenant is bound to the current execution context")]
    NoTenantBound,

    /// The bound tenant has no connection in the routing table.
    #[error("tenant '{tenant_id}' has no routed connection")]
    UnroutableTenant { tenant_id: TenantId },

    /// A binding was attempted outside of a tenant scope.
    #[error("tenant context is not available outside of a tenant scope")]
    ContextUnavailable,
}

/// Errors raised by the database drivers.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Could not create or check out a pooled connection.
    #[error("connection failed to {backend_name} for tenant '{tenant_id}': {message}")]
    ConnectionFailed {
        backend_name: &'static str,
        tenant_id: TenantId,
        message: String,
    },

    /// A statement failed.
    #[error("query execution failed in {backend_name}: {message}")]
    Query {
        backend_name: &'static str,
        message: String,
    },

    /// A schema migration failed.
    #[error("migration {version} failed for tenant '{tenant_id}': {message}")]
    Migration {
        tenant_id: TenantId,
        version: i32,
        message: String,
    },
}

/// Result type alias for persistence operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Returns `true` for errors that can only come from startup configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, StorageError::Config(_))
    }

    /// Returns `true` when the error means no tenant was bound.
    pub fn is_unbound(&self) -> bool {
        matches!(self, StorageError::Routing(RoutingError::NoTenantBound))
    }
}
