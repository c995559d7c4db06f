pub(crate) mod migrations;
pub mod queries;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use medvault_core::admin::{AdminUser, NewAdmin};
use medvault_core::document::{Document, NewDocument};

use crate::{Database, DbError};

/// Map a sqlx::Error into a DbError.
pub(crate) fn pg_err(e: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return DbError::Conflict(db_err.message().to_string());
        }
    }
    DbError::Internal(e.to_string())
}

/// Create a DbError::NotFound with the given entity description.
pub(crate) fn pg_not_found(entity: &str) -> DbError {
    DbError::NotFound(entity.to_string())
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pub(crate) pool: PgPool,
}

impl PostgresDatabase {
    /// Connect to a Postgres database and run migrations.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(pg_err)?;

        let db = Self { pool };
        migrations::run(&db.pool).await?;
        Ok(db)
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    // -- Documents --
    async fn insert_document(&self, input: &NewDocument) -> Result<Document, DbError> {
        self.pg_insert_document(input).await
    }
    async fn get_document(&self, id: &str) -> Result<Document, DbError> {
        self.pg_get_document(id).await
    }
    async fn list_documents(&self) -> Result<Vec<Document>, DbError> {
        self.pg_list_documents().await
    }
    async fn delete_document(&self, id: &str) -> Result<Document, DbError> {
        self.pg_delete_document(id).await
    }

    // -- Admins --
    async fn get_admin_by_username(&self, username: &str) -> Result<Option<AdminUser>, DbError> {
        self.pg_get_admin_by_username(username).await
    }
    async fn insert_admin(&self, input: &NewAdmin) -> Result<AdminUser, DbError> {
        self.pg_insert_admin(input).await
    }
}
