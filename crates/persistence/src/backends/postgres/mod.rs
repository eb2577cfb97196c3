//! PostgreSQL driver.
//!
//! Each tenant gets its own deadpool-postgres pool. The connection URL is
//! parsed by `tokio-postgres`; the configured username and password
//! override any credentials embedded in the URL. Connections are opened
//! lazily on first checkout.
//!
//! # Schema
//!
//! ```sql
//! CREATE SEQUENCE product_id_sequence START WITH 1 INCREMENT BY 1;
//! CREATE TABLE product (
//!     product_id   BIGINT PRIMARY KEY DEFAULT nextval('product_id_sequence'),
//!     product_name VARCHAR(255) NOT NULL
//! );
//! ```

mod backend;
pub(crate) mod schema;
pub(crate) mod storage;

pub use backend::PostgresPool;
pub use schema::MIGRATIONS;
