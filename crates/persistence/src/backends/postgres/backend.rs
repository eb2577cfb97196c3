//! Per-tenant PostgreSQL pool.

use std::fmt::Debug;

use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::error::BackendError;
use crate::tenant::TenantId;

const BACKEND_NAME: &str = "postgres";

/// deadpool pool bound to one tenant's PostgreSQL database.
#[derive(Clone)]
pub struct PostgresPool {
    pool: Pool,
    tenant_id: TenantId,
}

impl Debug for PostgresPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresPool")
            .field("tenant_id", &self.tenant_id)
            .field("max_size", &self.pool.status().max_size)
            .finish_non_exhaustive()
    }
}

impl PostgresPool {
    /// Creates the pool described by `config`. No connection is opened yet.
    pub fn open(config: &ConnectionConfig, max_connections: u32) -> Result<Self, BackendError> {
        let tenant_id = config.tenant_id().clone();
        let connection_failed = |message: String| BackendError::ConnectionFailed {
            backend_name: BACKEND_NAME,
            tenant_id: tenant_id.clone(),
            message,
        };

        let mut pg_config: tokio_postgres::Config = config
            .url()
            .parse()
            .map_err(|e: tokio_postgres::Error| connection_failed(e.to_string()))?;
        pg_config.user(config.username());
        pg_config.password(config.password());

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let pool = Pool::builder(manager)
            .max_size(max_connections.max(1) as usize)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| connection_failed(format!("failed to create pool: {}", e)))?;

        debug!(tenant = %tenant_id, "PostgreSQL pool created");
        Ok(Self { pool, tenant_id })
    }

    /// Checks out a client.
    pub async fn get(&self) -> Result<Object, BackendError> {
        self.pool
            .get()
            .await
            .map_err(|e| BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME,
                tenant_id: self.tenant_id.clone(),
                message: e.to_string(),
            })
    }

    /// Runs `SELECT 1` on a pooled client.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let client = self.get().await?;
        client
            .simple_query("SELECT 1")
            .await
            .map(|_| ())
            .map_err(|e| query_error(format!("health check failed: {}", e)))
    }

    /// Closes the pool. Checked out clients are dropped when returned.
    pub fn close(&self) {
        self.pool.close();
    }

    /// The tenant this pool belongs to.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

pub(crate) fn query_error(message: String) -> BackendError {
    BackendError::Query {
        backend_name: BACKEND_NAME,
        message,
    }
}
