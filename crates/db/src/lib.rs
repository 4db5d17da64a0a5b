//! sqlx/PostgreSQL persistence for the learning-path progression engine.
//!
//! Row models and DTOs live in [`models`]; stateless repository structs
//! with one method per query live in [`repositories`]. Migrations are at
//! `db/migrations/` in the workspace root.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}
