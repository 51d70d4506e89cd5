use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("{kind} '{name}' already exists")]
    Duplicate { kind: &'static str, name: String },

    #[error("corrupt {field} in {kind} {id}: {message}")]
    Corrupt {
        kind: &'static str,
        id: i64,
        field: &'static str,
        message: String,
    },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to create directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
