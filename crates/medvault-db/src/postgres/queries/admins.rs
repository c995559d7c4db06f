use chrono::{DateTime, Utc};

use medvault_core::admin::{AdminUser, NewAdmin};

use super::super::{pg_err, PostgresDatabase};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<AdminRow> for AdminUser {
    fn from(r: AdminRow) -> Self {
        AdminUser {
            id: r.id,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            created_at: r.created_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_get_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminUser>, DbError> {
        let row = sqlx::query_as::<_, AdminRow>("SELECT * FROM admin_users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(row.map(Into::into))
    }

    pub(crate) async fn pg_insert_admin(&self, input: &NewAdmin) -> Result<AdminUser, DbError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let row = sqlx::query_as::<_, AdminRow>(
            "INSERT INTO admin_users (id, username, email, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(&id)
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }
}
