use rusqlite::{params, Connection};

pub(crate) const LATEST_VERSION: i64 = 2;

pub fn run(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )?;

    let current_version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if current_version < 1 {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                 id           TEXT PRIMARY KEY,
                 filename     TEXT NOT NULL CHECK(length(filename) > 0),
                 patient_id   TEXT NOT NULL CHECK(length(patient_id) > 0),
                 blob_key     TEXT NOT NULL UNIQUE,
                 file_size    INTEGER NOT NULL CHECK(file_size >= 0),
                 uploaded_at  TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_documents_uploaded
                 ON documents(uploaded_at DESC);",
        )?;
        record_version(conn, 1)?;
    }

    if current_version < 2 {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS admin_users (
                 id            TEXT PRIMARY KEY,
                 username      TEXT NOT NULL UNIQUE,
                 email         TEXT NOT NULL,
                 password_hash TEXT NOT NULL,
                 created_at    TEXT NOT NULL
             );",
        )?;
        record_version(conn, 2)?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        params![version],
    )?;
    Ok(())
}
