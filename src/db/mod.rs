//! Storage layer
//!
//! Pool construction and the embedded schema migrations. Query code lives
//! in the repositories; nothing outside this module writes SQL.

pub mod connection;
pub mod repositories;

use sqlx::PgPool;

pub use connection::*;

/// Apply the embedded migrations, bringing the schema up to date at startup
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
