//! SQLite driver.
//!
//! Each tenant gets its own r2d2 pool over its own database file, or over a
//! private in-memory database for `sqlite::memory:` URLs. An in-memory
//! database only lives as long as its connection, so those pools hold
//! exactly one connection that is never recycled.
//!
//! rusqlite calls are synchronous and run directly on the request task.
//! They are short, and keeping them on the task keeps the tenant binding
//! visible to them.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE product (
//!     product_id   INTEGER PRIMARY KEY AUTOINCREMENT,
//!     product_name TEXT NOT NULL
//! );
//! ```

mod backend;
pub(crate) mod schema;
pub(crate) mod storage;

pub use backend::SqlitePool;
pub use schema::MIGRATIONS;
