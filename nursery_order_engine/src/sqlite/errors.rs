use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteStoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Could not serialize order items: {0}")]
    ItemEncoding(#[from] serde_json::Error),
}
