//! SQLite schema definitions and migrations.

use rusqlite::{Connection, OptionalExtension};

use crate::error::BackendError;
use crate::migration::{self, Migration, MigrationReport};
use crate::tenant::TenantId;

/// Embedded migrations, in version order.
pub static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "create product table",
    sql: "CREATE TABLE IF NOT EXISTS product (
              product_id INTEGER PRIMARY KEY AUTOINCREMENT,
              product_name TEXT NOT NULL
          );",
}];

/// Brings the tenant database up to the latest schema version.
pub fn migrate(conn: &mut Connection, tenant_id: &TenantId) -> Result<MigrationReport, BackendError> {
    let current = get_schema_version(conn, tenant_id)?;
    let mut applied = 0;
    let mut version = current;

    for step in migration::pending(MIGRATIONS, current) {
        let fail = |e: rusqlite::Error| BackendError::Migration {
            tenant_id: tenant_id.clone(),
            version: step.version,
            message: e.to_string(),
        };

        let tx = conn.transaction().map_err(fail)?;
        tx.execute_batch(step.sql).map_err(fail)?;
        set_schema_version(&tx, step.version).map_err(fail)?;
        tx.commit().map_err(fail)?;

        tracing::debug!(
            tenant = %tenant_id,
            version = step.version,
            description = step.description,
            "Applied migration"
        );
        applied += 1;
        version = step.version;
    }

    Ok(MigrationReport {
        tenant_id: tenant_id.clone(),
        applied,
        version,
    })
}

/// Get the current schema version, creating the tracking table if needed.
fn get_schema_version(conn: &Connection, tenant_id: &TenantId) -> Result<i32, BackendError> {
    let fail = |e: rusqlite::Error| BackendError::Migration {
        tenant_id: tenant_id.clone(),
        version: 0,
        message: format!("cannot read schema_version: {}", e),
    };

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(fail)?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(fail)?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> TenantId {
        TenantId::new("company-x")
    }

    #[test]
    fn test_fresh_database_is_migrated() {
        let mut conn = Connection::open_in_memory().unwrap();
        let report = migrate(&mut conn, &tenant()).unwrap();

        assert_eq!(report.applied, MIGRATIONS.len());
        assert_eq!(report.version, migration::latest_version(MIGRATIONS));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM product", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn, &tenant()).unwrap();
        let second = migrate(&mut conn, &tenant()).unwrap();

        assert_eq!(second.applied, 0);
        assert_eq!(second.version, migration::latest_version(MIGRATIONS));

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_ids_start_at_one() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn, &tenant()).unwrap();
        conn.execute("INSERT INTO product (product_name) VALUES ('A4 Paper')", [])
            .unwrap();
        assert_eq!(conn.last_insert_rowid(), 1);
    }
}
