//! PostgreSQL persistence for ProjectHub.
//!
//! - [`models`]: row structs and input DTOs
//! - [`repositories`]: zero-sized repos taking `&PgPool`
//! - [`membership_store`]: the engine's store backed by these repos

pub mod membership_store;
pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;

pub use membership_store::PgMembershipStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
