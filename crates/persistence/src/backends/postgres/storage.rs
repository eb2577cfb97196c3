//! Product queries for PostgreSQL.

use tokio_postgres::Row;

use super::PostgresPool;
use super::backend::query_error;
use crate::error::BackendError;
use crate::product::Product;

fn product_from_row(row: &Row) -> Product {
    Product {
        id: row.get(0),
        name: row.get(1),
    }
}

pub(crate) async fn insert_product(pool: &PostgresPool, name: &str) -> Result<Product, BackendError> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "INSERT INTO product (product_name) VALUES ($1) RETURNING product_id, product_name",
            &[&name],
        )
        .await
        .map_err(|e| query_error(format!("failed to insert product: {}", e)))?;

    Ok(product_from_row(&row))
}

pub(crate) async fn select_products(pool: &PostgresPool) -> Result<Vec<Product>, BackendError> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT product_id, product_name FROM product ORDER BY product_id",
            &[],
        )
        .await
        .map_err(|e| query_error(format!("failed to list products: {}", e)))?;

    Ok(rows.iter().map(product_from_row).collect())
}

pub(crate) async fn select_product(pool: &PostgresPool, id: i64) -> Result<Option<Product>, BackendError> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT product_id, product_name FROM product WHERE product_id = $1",
            &[&id],
        )
        .await
        .map_err(|e| query_error(format!("failed to read product {}: {}", id, e)))?;

    Ok(row.as_ref().map(product_from_row))
}

pub(crate) async fn count_products(pool: &PostgresPool) -> Result<i64, BackendError> {
    let client = pool.get().await?;
    let row = client
        .query_one("SELECT COUNT(*) FROM product", &[])
        .await
        .map_err(|e| query_error(format!("failed to count products: {}", e)))?;

    Ok(row.get(0))
}
