//! Route configuration mapping HTTP paths to handlers.

pub mod routes;

pub use routes::create_routes;
