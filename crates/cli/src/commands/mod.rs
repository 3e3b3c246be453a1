//! CLI subcommands.

pub mod carts;
pub mod migrate;

use secrecy::SecretString;

/// Errors shared by commands that connect to the storefront database.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The age cutoff falls outside the supported date range.
    #[error("--older-than-days {0} is out of range")]
    InvalidCutoff(u32),

    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Query failed.
    #[error("Repository error: {0}")]
    Repository(#[from] threadline_storefront::db::RepositoryError),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Storefront database URL, with the same `DATABASE_URL` fallback as the server.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}
