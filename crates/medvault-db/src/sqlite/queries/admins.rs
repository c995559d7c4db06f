use chrono::Utc;
use rusqlite::{params, Row};

use medvault_core::admin::{AdminUser, NewAdmin};

use super::super::{SqliteDatabase, SqliteResultExt};
use crate::DbError;

fn row_to_admin(row: &Row) -> rusqlite::Result<AdminUser> {
    Ok(AdminUser {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        created_at: row.get("created_at")?,
    })
}

impl SqliteDatabase {
    pub fn get_admin_by_username_sync(&self, username: &str) -> Result<Option<AdminUser>, DbError> {
        self.with_conn(|conn| {
            let result = conn.query_row(
                "SELECT * FROM admin_users WHERE username = ?1",
                params![username],
                row_to_admin,
            );
            match result {
                Ok(admin) => Ok(Some(admin)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(DbError::Internal(e.to_string())),
            }
        })
    }

    pub fn insert_admin_sync(&self, input: &NewAdmin) -> Result<AdminUser, DbError> {
        self.with_conn(|conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = Utc::now();
            conn.execute(
                "INSERT INTO admin_users (id, username, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, input.username, input.email, input.password_hash, now],
            )
            .to_db()?;
            conn.query_row(
                "SELECT * FROM admin_users WHERE id = ?1",
                params![id],
                row_to_admin,
            )
            .to_db()
        })
    }
}
