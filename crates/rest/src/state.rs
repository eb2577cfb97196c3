//! Application state for the REST API.
//!
//! The state is built once at startup and shared, read-only, by every
//! request. Nothing in it is tenant-specific: the tenant of a request lives
//! in its [`TenantContext`](tenantry_persistence::tenant::TenantContext).

use std::sync::Arc;

use tenantry_persistence::{
    config::TenantSettingsLoader, migration, product::ProductRepository,
    router::ConnectionRouter, tenant::TenantRegistry, StorageResult,
};
use tracing::info;

use crate::{config::ServerConfig, tenant::TenantResolver};

/// Shared application state for the REST API.
///
/// # Example
///
/// ```rust,ignore
/// use tenantry_rest::{AppState, ServerConfig};
///
/// let config = ServerConfig::for_testing(&["company-x", "company-y"]);
/// let state = AppState::initialize(config).await?;
/// ```
#[derive(Clone)]
pub struct AppState {
    registry: Arc<TenantRegistry>,
    resolver: TenantResolver,
    router: ConnectionRouter,
    products: ProductRepository,
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Assembles state from already-built parts.
    pub fn new(registry: Arc<TenantRegistry>, router: ConnectionRouter, config: ServerConfig) -> Self {
        Self {
            resolver: TenantResolver::new(Arc::clone(&registry)),
            products: ProductRepository::new(router.clone()),
            registry,
            router,
            config: Arc::new(config),
        }
    }

    /// Builds the registry, loads every tenant's connection settings, opens
    /// the pools and migrates every tenant database.
    ///
    /// Any failure aborts startup; a partially initialized state is never
    /// returned.
    pub async fn initialize(config: ServerConfig) -> StorageResult<Self> {
        info!(tenants = config.tenants.len(), "Loading tenant configuration");

        let registry = TenantRegistry::new(config.tenant_names())?;
        let settings = TenantSettingsLoader::new(config.tenants_location.clone())
            .with_default_driver(config.datasource_driver.clone())
            .load(&registry)?;
        let router = ConnectionRouter::build(&registry, settings, config.max_connections)?;

        if let Err(err) = migration::migrate_all(&router).await {
            router.close();
            return Err(err);
        }

        Ok(Self::new(Arc::new(registry), router, config))
    }

    /// The registered tenants.
    pub fn registry(&self) -> &TenantRegistry {
        &self.registry
    }

    /// Header-to-tenant resolver used by the request gate.
    pub fn resolver(&self) -> &TenantResolver {
        &self.resolver
    }

    /// The connection router.
    pub fn router(&self) -> &ConnectionRouter {
        &self.router
    }

    /// Product persistence.
    pub fn products(&self) -> &ProductRepository {
        &self.products
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("router", &self.router)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_rejects_missing_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::for_testing(&["company-x"]);
        config.tenants_location = dir.path().to_path_buf();

        let err = AppState::initialize(config).await.unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_initialize_rejects_empty_tenant_list() {
        let config = ServerConfig::for_testing(&[]);
        let err = AppState::initialize(config).await.unwrap_err();
        assert!(err.is_config());
    }
}
