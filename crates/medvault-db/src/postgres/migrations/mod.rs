use sqlx::PgPool;

use crate::DbError;

/// Arbitrary but fixed key for the Postgres advisory lock that serialises
/// migration runs so concurrent connections don't race.
const MIGRATION_LOCK_KEY: i64 = 0x6D65_6476_6175_6C74; // "medvault" as hex

pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    // Session-level advisory lock: lock and unlock must use the same connection.
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    let result = run_inner(pool).await;

    // Always release the advisory lock, even on error.
    let _ = sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await;

    result
}

async fn run_inner(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::Internal(e.to_string()))?;

    let current: i32 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
        .fetch_one(pool)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    if current < 1 {
        sqlx::raw_sql(include_str!("sql/V1__documents.sql"))
            .execute(pool)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;
    }

    if current < 2 {
        sqlx::raw_sql(include_str!("sql/V2__admin_users.sql"))
            .execute(pool)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;
    }

    Ok(())
}
