//! PostgreSQL schema definitions and migrations.

use deadpool_postgres::Object;

use crate::error::BackendError;
use crate::migration::{self, Migration, MigrationReport};
use crate::tenant::TenantId;

/// Embedded migrations, in version order.
pub static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "create product table",
    sql: "CREATE SEQUENCE IF NOT EXISTS product_id_sequence START WITH 1 INCREMENT BY 1;
          CREATE TABLE IF NOT EXISTS product (
              product_id BIGINT PRIMARY KEY DEFAULT nextval('product_id_sequence'),
              product_name VARCHAR(255) NOT NULL
          );",
}];

/// Brings the tenant database up to the latest schema version.
pub async fn migrate(client: &mut Object, tenant_id: &TenantId) -> Result<MigrationReport, BackendError> {
    let current = get_schema_version(client, tenant_id).await?;
    let mut applied = 0;
    let mut version = current;

    for step in migration::pending(MIGRATIONS, current) {
        let fail = |e: tokio_postgres::Error| BackendError::Migration {
            tenant_id: tenant_id.clone(),
            version: step.version,
            message: e.to_string(),
        };

        let tx = client.transaction().await.map_err(fail)?;
        tx.batch_execute(step.sql).await.map_err(fail)?;
        tx.execute("DELETE FROM schema_version", &[]).await.map_err(fail)?;
        tx.execute(
            "INSERT INTO schema_version (version) VALUES ($1)",
            &[&step.version],
        )
        .await
        .map_err(fail)?;
        tx.commit().await.map_err(fail)?;

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
async fn get_schema_version(client: &Object, tenant_id: &TenantId) -> Result<i32, BackendError> {
    let fail = |e: tokio_postgres::Error| BackendError::Migration {
        tenant_id: tenant_id.clone(),
        version: 0,
        message: format!("cannot read schema_version: {}", e),
    };

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER NOT NULL
            )",
            &[],
        )
        .await
        .map_err(fail)?;

    let row = client
        .query_opt("SELECT version FROM schema_version LIMIT 1", &[])
        .await
        .map_err(fail)?;

    Ok(row.map(|r| r.get::<_, i32>(0)).unwrap_or(0))
}
