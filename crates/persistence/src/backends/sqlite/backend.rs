//! Per-tenant SQLite pool.

use std::fmt::Debug;
use std::fs;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::debug;

use crate::config::{ConnectionConfig, SqliteTarget};
use crate::error::BackendError;
use crate::tenant::TenantId;

const BACKEND_NAME: &str = "sqlite";
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// r2d2 pool bound to one tenant's SQLite database.
#[derive(Clone)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    tenant_id: TenantId,
    target: SqliteTarget,
}

impl Debug for SqlitePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePool")
            .field("tenant_id", &self.tenant_id)
            .field("target", &self.target)
            .field("max_size", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}

impl SqlitePool {
    /// Opens the pool described by `config`.
    ///
    /// File databases get up to `max_connections` connections in WAL mode.
    /// In-memory databases get a single connection.
    pub fn open(config: &ConnectionConfig, max_connections: u32) -> Result<Self, BackendError> {
        let tenant_id = config.tenant_id().clone();
        let target = SqliteTarget::parse(config.url()).map_err(|message| {
            BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME,
                tenant_id: tenant_id.clone(),
                message,
            }
        })?;

        let builder = Pool::builder().connection_timeout(CONNECTION_TIMEOUT);
        let built = match &target {
            SqliteTarget::Memory => builder
                .max_size(1)
                .min_idle(Some(1))
                .idle_timeout(None)
                .max_lifetime(None)
                .build(SqliteConnectionManager::memory().with_init(|c| {
                    c.pragma_update(None, "foreign_keys", "ON")
                })),
            SqliteTarget::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| BackendError::ConnectionFailed {
                        backend_name: BACKEND_NAME,
                        tenant_id: tenant_id.clone(),
                        message: format!("cannot create {}: {}", parent.display(), e),
                    })?;
                }
                builder
                    .max_size(max_connections.max(1))
                    .min_idle(Some(1))
                    .build(SqliteConnectionManager::file(path).with_init(|c| {
                        c.busy_timeout(BUSY_TIMEOUT)?;
                        c.pragma_update(None, "foreign_keys", "ON")?;
                        c.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))
                    }))
            }
        };

        let pool = built.map_err(|e| BackendError::ConnectionFailed {
            backend_name: BACKEND_NAME,
            tenant_id: tenant_id.clone(),
            message: e.to_string(),
        })?;

        debug!(tenant = %tenant_id, target = ?target, "SQLite pool opened");
        Ok(Self {
            pool,
            tenant_id,
            target,
        })
    }

    /// Checks out a connection.
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>, BackendError> {
        self.pool.get().map_err(|e| BackendError::ConnectionFailed {
            backend_name: BACKEND_NAME,
            tenant_id: self.tenant_id.clone(),
            message: e.to_string(),
        })
    }

    /// Runs `SELECT 1` on a pooled connection.
    pub fn ping(&self) -> Result<(), BackendError> {
        let conn = self.get()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| query_error(format!("health check failed: {}", e)))
    }

    /// Whether this pool serves a private in-memory database.
    pub fn is_memory(&self) -> bool {
        self.target == SqliteTarget::Memory
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
