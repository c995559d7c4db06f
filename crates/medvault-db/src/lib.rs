#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use medvault_core::admin::{AdminUser, NewAdmin};
use medvault_core::document::{Document, NewDocument};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable metadata for documents and admin accounts.
///
/// Implementations own their concurrency: ids stay unique under concurrent
/// inserts and each call is atomic for the single record it touches.
#[async_trait]
pub trait Database: Send + Sync {
    // -- Documents --

    /// Assign an id and upload timestamp, then persist.
    async fn insert_document(&self, input: &NewDocument) -> Result<Document, DbError>;
    async fn get_document(&self, id: &str) -> Result<Document, DbError>;
    /// All documents, newest first.
    async fn list_documents(&self) -> Result<Vec<Document>, DbError>;
    /// Remove a document and return the removed record.
    async fn delete_document(&self, id: &str) -> Result<Document, DbError>;

    // -- Admins --
    async fn get_admin_by_username(&self, username: &str) -> Result<Option<AdminUser>, DbError>;
    async fn insert_admin(&self, input: &NewAdmin) -> Result<AdminUser, DbError>;
}

/// Which metadata backend to open.
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    /// Postgres connection URL. Takes precedence over SQLite when set.
    pub database_url: Option<String>,
    /// SQLite file path. Defaults to `<data_dir>/medvault.db`.
    pub sqlite_path: Option<String>,
}

impl DbConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("MEDVAULT_DATABASE_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .ok()
                .filter(|s| !s.is_empty()),
            sqlite_path: std::env::var("MEDVAULT_SQLITE_PATH").ok(),
        }
    }
}

/// Open the backend selected by `config`.
pub async fn open_database(config: &DbConfig) -> Result<Arc<dyn Database>, DbError> {
    if let Some(url) = config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        {
            tracing::info!("using postgres metadata store");
            return Ok(Arc::new(PostgresDatabase::connect(url).await?));
        }
        #[cfg(not(feature = "postgres"))]
        {
            let _ = url;
            return Err(DbError::Internal(
                "database_url is set but the 'postgres' feature is not enabled".into(),
            ));
        }
    }

    #[cfg(feature = "sqlite")]
    {
        let db = SqliteDatabase::open(config)?;
        Ok(Arc::new(db))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Err(DbError::Internal(
            "no database_url given and the 'sqlite' feature is not enabled".into(),
        ))
    }
}

/// Base directory for local state: `MEDVAULT_DATA_DIR`, else
/// `$XDG_DATA_HOME/medvault`, else `~/.local/share/medvault`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MEDVAULT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("medvault")
}
