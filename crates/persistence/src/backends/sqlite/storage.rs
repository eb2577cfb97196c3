//! Product queries for SQLite.

use rusqlite::{OptionalExtension, params};

use super::SqlitePool;
use super::backend::query_error;
use crate::error::BackendError;
use crate::product::Product;

pub(crate) fn insert_product(pool: &SqlitePool, name: &str) -> Result<Product, BackendError> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO product (product_name) VALUES (?1)",
        params![name],
    )
    .map_err(|e| query_error(format!("failed to insert product: {}", e)))?;

    Ok(Product {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

pub(crate) fn select_products(pool: &SqlitePool) -> Result<Vec<Product>, BackendError> {
    let conn = pool.get()?;
    let mut stmt = conn
        .prepare("SELECT product_id, product_name FROM product ORDER BY product_id")
        .map_err(|e| query_error(format!("failed to prepare product query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Product {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .map_err(|e| query_error(format!("failed to list products: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| query_error(format!("failed to read product row: {}", e)))
}

pub(crate) fn select_product(pool: &SqlitePool, id: i64) -> Result<Option<Product>, BackendError> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT product_id, product_name FROM product WHERE product_id = ?1",
        params![id],
        |row| {
            Ok(Product {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()
    .map_err(|e| query_error(format!("failed to read product {}: {}", id, e)))
}

pub(crate) fn count_products(pool: &SqlitePool) -> Result<i64, BackendError> {
    let conn = pool.get()?;
    conn.query_row("SELECT COUNT(*) FROM product", [], |row| row.get(0))
        .map_err(|e| query_error(format!("failed to count products: {}", e)))
}
