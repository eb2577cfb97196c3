//! Per-tenant schema migrations.
//!
//! Every tenant database carries its own `schema_version` table holding a
//! single row with the last applied version. Migrations are embedded in the
//! binary, one ordered list per driver, and are applied in version order.
//! Running them again against an up-to-date database applies nothing.

use tracing::info;

use crate::error::StorageResult;
use crate::router::ConnectionRouter;
use crate::tenant::TenantId;

/// One embedded schema migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Version reached once this migration has been applied. Starts at 1.
    pub version: i32,
    /// Short human readable description.
    pub description: &'static str,
    /// SQL batch executed for this migration.
    pub sql: &'static str,
}

/// Outcome of migrating a single tenant database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// The migrated tenant.
    pub tenant_id: TenantId,
    /// Number of migrations applied by this run.
    pub applied: usize,
    /// Schema version after the run.
    pub version: i32,
}

/// Returns the migrations that still have to run on a database at `current`.
pub fn pending(migrations: &'static [Migration], current: i32) -> impl Iterator<Item = &'static Migration> {
    migrations.iter().filter(move |m| m.version > current)
}

/// Latest version in a migration list, 0 when the list is empty.
pub fn latest_version(migrations: &[Migration]) -> i32 {
    migrations.iter().map(|m| m.version).max().unwrap_or(0)
}

/// Migrates every tenant database routed by `router`, in registry order.
///
/// Stops at the first failure; startup must not continue with a tenant
/// whose schema is behind.
pub async fn migrate_all(router: &ConnectionRouter) -> StorageResult<Vec<MigrationReport>> {
    info!(tenants = router.len(), "Initializing tenant databases");

    let mut reports = Vec::with_capacity(router.len());
    for (tenant_id, handle) in router.iter() {
        info!(tenant = %tenant_id, "Migrating tenant database");
        let report = handle.migrate().await?;
        info!(
            tenant = %tenant_id,
            migrations = report.applied,
            version = report.version,
            "Tenant database migrated"
        );
        reports.push(report);
    }

    Ok(reports)
}
