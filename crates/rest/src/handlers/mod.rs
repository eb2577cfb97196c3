//! HTTP request handlers.
//!
//! - [`products`] - create, list and read products of the current tenant
//! - [`health`] - liveness and readiness endpoints

pub mod health;
pub mod products;

pub use health::{health_handler, readiness_handler};
pub use products::{create_product_handler, get_product_handler, list_products_handler};
