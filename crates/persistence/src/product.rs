//! Product repository.
//!
//! The repository never picks a database itself: every call asks the
//! [`ConnectionRouter`] for the connection of the tenant bound to the running
//! request.

use serde::{Deserialize, Serialize};

#[cfg(feature = "postgres")]
use crate::backends::postgres;
#[cfg(feature = "sqlite")]
use crate::backends::sqlite;
use crate::error::StorageResult;
use crate::router::{ConnectionRouter, TenantPool};

/// A stored product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Identifier generated by the tenant's database, starting at 1.
    pub id: i64,
    /// Product name.
    pub name: String,
}

/// Product persistence routed by the current tenant.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    router: ConnectionRouter,
}

impl ProductRepository {
    /// Creates a repository over `router`.
    pub fn new(router: ConnectionRouter) -> Self {
        Self { router }
    }

    /// Stores a new product and returns it with its generated id.
    pub async fn save(&self, name: &str) -> StorageResult<Product> {
        let handle = self.router.resolve_current()?;
        let product = match handle.pool() {
            #[cfg(feature = "sqlite")]
            TenantPool::Sqlite(pool) => sqlite::storage::insert_product(pool, name)?,
            #[cfg(feature = "postgres")]
            TenantPool::Postgres(pool) => postgres::storage::insert_product(pool, name).await?,
        };

        tracing::debug!(tenant = %handle.tenant_id(), id = product.id, "Product saved");
        Ok(product)
    }

    /// Lists every product of the current tenant, ordered by id.
    pub async fn find_all(&self) -> StorageResult<Vec<Product>> {
        let handle = self.router.resolve_current()?;
        let products = match handle.pool() {
            #[cfg(feature = "sqlite")]
            TenantPool::Sqlite(pool) => sqlite::storage::select_products(pool)?,
            #[cfg(feature = "postgres")]
            TenantPool::Postgres(pool) => postgres::storage::select_products(pool).await?,
        };
        Ok(products)
    }

    /// Looks up one product of the current tenant.
    pub async fn find_by_id(&self, id: i64) -> StorageResult<Option<Product>> {
        let handle = self.router.resolve_current()?;
        let product = match handle.pool() {
            #[cfg(feature = "sqlite")]
            TenantPool::Sqlite(pool) => sqlite::storage::select_product(pool, id)?,
            #[cfg(feature = "postgres")]
            TenantPool::Postgres(pool) => postgres::storage::select_product(pool, id).await?,
        };
        Ok(product)
    }

    /// Number of products of the current tenant.
    pub async fn count(&self) -> StorageResult<i64> {
        let handle = self.router.resolve_current()?;
        let count = match handle.pool() {
            #[cfg(feature = "sqlite")]
            TenantPool::Sqlite(pool) => sqlite::storage::count_products(pool)?,
            #[cfg(feature = "postgres")]
            TenantPool::Postgres(pool) => postgres::storage::count_products(pool).await?,
        };
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionSettings;
    use crate::migration::migrate_all;
    use crate::tenant::{TenantContext, TenantId, TenantRegistry};

    async fn repository() -> ProductRepository {
        let registry = TenantRegistry::new(["company-x", "company-y"]).unwrap();
        let settings = registry
            .iter()
            .map(|id| {
                (
                    id.clone(),
                    ConnectionSettings::new("sqlite::memory:", "app", "secret", "sqlite"),
                )
            })
            .collect::<Vec<_>>();
        let router = ConnectionRouter::build(&registry, settings, 5).unwrap();
        migrate_all(&router).await.unwrap();
        ProductRepository::new(router)
    }

    #[tokio::test]
    async fn test_save_and_find_within_tenant() {
        let repo = repository().await;

        TenantContext::with_tenant(TenantId::new("company-x"), async {
            let first = repo.save("A4 Paper").await.unwrap();
            let second = repo.save("Stapler").await.unwrap();
            assert_eq!(first.id, 1);
            assert_eq!(second.id, 2);

            let all = repo.find_all().await.unwrap();
            assert_eq!(all, vec![first.clone(), second]);
            assert_eq!(repo.find_by_id(1).await.unwrap(), Some(first));
            assert_eq!(repo.find_by_id(99).await.unwrap(), None);
            assert_eq!(repo.count().await.unwrap(), 2);
        })
        .await;
    }

    #[tokio::test]
    async fn test_tenants_do_not_share_rows() {
        let repo = repository().await;

        TenantContext::with_tenant(TenantId::new("company-x"), async {
            repo.save("A4 Paper").await.unwrap();
        })
        .await;

        TenantContext::with_tenant(TenantId::new("company-y"), async {
            assert_eq!(repo.count().await.unwrap(), 0);
            let own = repo.save("Pencil").await.unwrap();
            assert_eq!(own.id, 1);
            assert_eq!(repo.find_all().await.unwrap(), vec![own]);
        })
        .await;
    }

    #[tokio::test]
    async fn test_unbound_operation_fails() {
        let repo = repository().await;
        let err = repo.find_all().await.unwrap_err();
        assert!(err.is_unbound());
    }
}
