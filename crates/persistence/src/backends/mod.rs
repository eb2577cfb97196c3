//! Database driver implementations.
//!
//! Each driver is gated behind a feature flag and provides three pieces: a
//! per-tenant connection pool, the embedded schema migrations, and the
//! product queries.
//!
//! | Driver | Feature | Pool |
//! |--------|---------|------|
//! | SQLite | `sqlite` | r2d2 + rusqlite |
//! | PostgreSQL | `postgres` | deadpool-postgres |

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;
