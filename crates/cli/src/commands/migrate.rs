//! Session storage setup.
//!
//! Both web apps keep nothing but sessions in `PostgreSQL`; all shop data
//! lives in the REST backend. The tables are created by the session store
//! itself, so setup is one idempotent call per app.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - storefront database (falls back to `DATABASE_URL`)
//! - `ADMIN_DATABASE_URL` - admin database (falls back to `DATABASE_URL`)
//!
//! # Tables
//!
//! - Storefront: `tower_sessions.session`
//! - Admin: `admin.session`

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

/// Errors while creating session storage.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid session table name: {0}")]
    InvalidName(String),
}

/// Resolve a database URL from `primary`, falling back to `DATABASE_URL`.
fn database_url(primary: &'static str) -> Result<SecretString, MigrationError> {
    dotenvy::dotenv().ok();
    std::env::var(primary)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar(primary))
}

async fn connect(primary: &'static str) -> Result<PgPool, MigrationError> {
    let url = database_url(primary)?;
    Ok(PgPool::connect(url.expose_secret()).await?)
}

/// Create the storefront session table.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the DDL fails.
pub async fn storefront() -> Result<(), MigrationError> {
    tracing::info!("Connecting to storefront database...");
    let pool = connect("STOREFRONT_DATABASE_URL").await?;

    tracing::info!("Creating storefront session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront session table ready");
    Ok(())
}

/// Create the admin session table in its own schema.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the DDL fails.
pub async fn admin() -> Result<(), MigrationError> {
    tracing::info!("Connecting to admin database...");
    let pool = connect("ADMIN_DATABASE_URL").await?;

    tracing::info!("Creating admin session table...");
    PostgresStore::new(pool)
        .with_schema_name("admin")
        .map_err(MigrationError::InvalidName)?
        .with_table_name("session")
        .map_err(MigrationError::InvalidName)?
        .migrate()
        .await?;

    tracing::info!("Admin session table ready");
    Ok(())
}
