//! Tenant-keyed connection routing.
//!
//! [`ConnectionRouter`] owns one [`ConnectionHandle`] per registered tenant.
//! The table is built once by [`ConnectionRouter::build`] and never changes
//! afterwards, so any number of concurrent requests can read it without a
//! lock. Data operations obtain their connection exclusively through
//! [`ConnectionRouter::resolve_current`], which reads the tenant bound to the
//! running request.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

#[cfg(feature = "postgres")]
use crate::backends::postgres::{self, PostgresPool};
#[cfg(feature = "sqlite")]
use crate::backends::sqlite::{self, SqlitePool};
use crate::config::{ConnectionConfig, ConnectionSettings, Driver};
use crate::error::{BackendError, ConfigError, RoutingError, StorageResult};
use crate::migration::MigrationReport;
use crate::tenant::{TenantContext, TenantId, TenantRegistry};

/// The driver-specific pool behind a [`ConnectionHandle`].
#[derive(Debug, Clone)]
pub enum TenantPool {
    /// SQLite pool.
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
    /// PostgreSQL pool.
    #[cfg(feature = "postgres")]
    Postgres(PostgresPool),
}

impl TenantPool {
    fn open(config: &ConnectionConfig, max_connections: u32) -> Result<Self, BackendError> {
        match config.driver() {
            #[cfg(feature = "sqlite")]
            Driver::Sqlite => SqlitePool::open(config, max_connections).map(TenantPool::Sqlite),
            #[cfg(feature = "postgres")]
            Driver::Postgres => {
                PostgresPool::open(config, max_connections).map(TenantPool::Postgres)
            }
            #[allow(unreachable_patterns)]
            other => Err(BackendError::ConnectionFailed {
                backend_name: other.name(),
                tenant_id: config.tenant_id().clone(),
                message: format!("driver '{}' is not compiled in", other),
            }),
        }
    }
}

struct HandleInner {
    tenant_id: TenantId,
    driver: Driver,
    pool: TenantPool,
}

/// A reusable connection pool scoped to exactly one tenant.
///
/// Cloning is cheap; clones share the pool.
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<HandleInner>,
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("tenant_id", &self.inner.tenant_id)
            .field("driver", &self.inner.driver)
            .finish_non_exhaustive()
    }
}

impl ConnectionHandle {
    fn open(config: &ConnectionConfig, max_connections: u32) -> Result<Self, BackendError> {
        let pool = TenantPool::open(config, max_connections)?;
        Ok(Self {
            inner: Arc::new(HandleInner {
                tenant_id: config.tenant_id().clone(),
                driver: config.driver(),
                pool,
            }),
        })
    }

    /// The tenant owning this connection.
    pub fn tenant_id(&self) -> &TenantId {
        &self.inner.tenant_id
    }

    /// The driver serving this connection.
    pub fn driver(&self) -> Driver {
        self.inner.driver
    }

    /// The underlying pool.
    pub fn pool(&self) -> &TenantPool {
        &self.inner.pool
    }

    /// Returns `true` if both handles share the same pool.
    pub fn same_pool(&self, other: &ConnectionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Verifies that the database answers.
    pub async fn ping(&self) -> Result<(), BackendError> {
        match self.pool() {
            #[cfg(feature = "sqlite")]
            TenantPool::Sqlite(pool) => pool.ping(),
            #[cfg(feature = "postgres")]
            TenantPool::Postgres(pool) => pool.ping().await,
        }
    }

    /// Applies pending schema migrations to this tenant's database.
    pub async fn migrate(&self) -> Result<MigrationReport, BackendError> {
        let tenant_id = self.tenant_id();
        match self.pool() {
            #[cfg(feature = "sqlite")]
            TenantPool::Sqlite(pool) => {
                let mut conn = pool.get()?;
                sqlite::schema::migrate(&mut conn, tenant_id)
            }
            #[cfg(feature = "postgres")]
            TenantPool::Postgres(pool) => {
                let mut client = pool.get().await?;
                postgres::schema::migrate(&mut client, tenant_id).await
            }
        }
    }

    fn close(&self) {
        match self.pool() {
            // r2d2 has no explicit close; connections go with the last clone.
            #[cfg(feature = "sqlite")]
            TenantPool::Sqlite(_) => {}
            #[cfg(feature = "postgres")]
            TenantPool::Postgres(pool) => pool.close(),
        }
    }
}

/// Immutable map from tenant to connection handle.
#[derive(Clone)]
pub struct ConnectionRouter {
    connections: Arc<HashMap<TenantId, ConnectionHandle>>,
    order: Arc<[TenantId]>,
}

impl fmt::Debug for ConnectionRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRouter")
            .field("tenants", &self.order)
            .finish()
    }
}

impl ConnectionRouter {
    /// Builds the routing table for every tenant in `registry`.
    ///
    /// Every registered tenant must have settings, and no settings may name a
    /// tenant outside the registry. All settings are validated before the
    /// first pool is opened; on any error nothing is returned and every pool
    /// opened so far is dropped.
    pub fn build<I>(
        registry: &TenantRegistry,
        settings: I,
        max_connections: u32,
    ) -> StorageResult<Self>
    where
        I: IntoIterator<Item = (TenantId, ConnectionSettings)>,
    {
        let mut provided: BTreeMap<TenantId, ConnectionSettings> = settings.into_iter().collect();

        if let Some(stray) = provided.keys().find(|id| !registry.contains(id.as_str())) {
            return Err(ConfigError::UnregisteredConnection {
                tenant_id: stray.clone(),
            }
            .into());
        }

        let mut configs = Vec::with_capacity(registry.len());
        for tenant_id in registry.iter() {
            let raw = provided
                .remove(tenant_id)
                .ok_or_else(|| ConfigError::MissingConnection {
                    tenant_id: tenant_id.clone(),
                })?;
            configs.push(raw.validate(tenant_id)?);
        }

        let mut connections = HashMap::with_capacity(configs.len());
        for config in &configs {
            let handle = ConnectionHandle::open(config, max_connections)?;
            info!(
                tenant = %config.tenant_id(),
                driver = %config.driver(),
                max_connections,
                "Tenant connection pool ready"
            );
            connections.insert(config.tenant_id().clone(), handle);
        }

        let order: Arc<[TenantId]> = registry.iter().cloned().collect();
        info!(tenants = order.len(), "Connection router built");

        Ok(Self {
            connections: Arc::new(connections),
            order,
        })
    }

    /// Returns the connection for the tenant bound to the running request.
    ///
    /// # Errors
    ///
    /// [`RoutingError::NoTenantBound`] when nothing is bound. This is a wiring
    /// defect, so it is logged at error level; it never falls back to another
    /// tenant.
    pub fn resolve_current(&self) -> Result<ConnectionHandle, RoutingError> {
        let Some(tenant_id) = TenantContext::current() else {
            error!("Data operation attempted with no tenant bound to the request");
            return Err(RoutingError::NoTenantBound);
        };

        self.connections.get(&tenant_id).cloned().ok_or_else(|| {
            error!(tenant = %tenant_id, "Bound tenant has no routed connection");
            RoutingError::UnroutableTenant { tenant_id }
        })
    }

    /// Iterates over every tenant and its handle, in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&TenantId, &ConnectionHandle)> {
        self.order
            .iter()
            .filter_map(|id| self.connections.get(id).map(|handle| (id, handle)))
    }

    /// Tenants served by this router, in registry order.
    pub fn tenants(&self) -> &[TenantId] {
        &self.order
    }

    /// Number of routed tenants.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always `false` for a successfully built router.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Closes every pool. Called once at shutdown.
    pub fn close(&self) {
        for (tenant_id, handle) in self.iter() {
            handle.close();
            info!(tenant = %tenant_id, "Tenant connection pool closed");
        }
    }
}
