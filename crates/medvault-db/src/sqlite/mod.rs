pub(crate) mod migrations;
pub mod queries;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use medvault_core::admin::{AdminUser, NewAdmin};
use medvault_core::document::{Document, NewDocument};

use crate::{Database, DbConfig, DbError};

/// Extension trait that converts `rusqlite::Result<T>` into `Result<T, DbError>`.
///
/// Calling `.to_db()?` is the shortest way to surface rusqlite failures
/// inside the query modules.
pub(crate) trait SqliteResultExt<T> {
    fn to_db(self) -> Result<T, DbError>;
}

impl<T> SqliteResultExt<T> for rusqlite::Result<T> {
    fn to_db(self) -> Result<T, DbError> {
        self.map_err(map_sqlite_err)
    }
}

#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let path = config
            .sqlite_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| crate::data_dir().join("medvault.db"));
        std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))?;
        tracing::info!(path = %path.display(), "opening sqlite metadata store");
        Self::open_path(&path)
    }

    pub fn open_path(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path).to_db()?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )
        .to_db()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().to_db()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;").to_db()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Internal("lock poisoned".into()))?;
        f(&conn)
    }

    fn run_migrations(&self) -> Result<(), DbError> {
        self.with_conn(|conn| migrations::run(conn).to_db())
    }

    /// Run a synchronous query on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(SqliteDatabase) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(db))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
}

/// Map a `rusqlite::Error` into a `DbError`.
pub(crate) fn map_sqlite_err(e: rusqlite::Error) -> DbError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Conflict(e.to_string())
        }
        _ => DbError::Internal(e.to_string()),
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    // -- Documents --
    async fn insert_document(&self, input: &NewDocument) -> Result<Document, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.insert_document_sync(&input)).await
    }
    async fn get_document(&self, id: &str) -> Result<Document, DbError> {
        let id = id.to_string();
        self.blocking(move |db| db.get_document_sync(&id)).await
    }
    async fn list_documents(&self) -> Result<Vec<Document>, DbError> {
        self.blocking(|db| db.list_documents_sync()).await
    }
    async fn delete_document(&self, id: &str) -> Result<Document, DbError> {
        let id = id.to_string();
        self.blocking(move |db| db.delete_document_sync(&id)).await
    }

    // -- Admins --
    async fn get_admin_by_username(&self, username: &str) -> Result<Option<AdminUser>, DbError> {
        let username = username.to_string();
        self.blocking(move |db| db.get_admin_by_username_sync(&username))
            .await
    }
    async fn insert_admin(&self, input: &NewAdmin) -> Result<AdminUser, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.insert_admin_sync(&input)).await
    }
}
