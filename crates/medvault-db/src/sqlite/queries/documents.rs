use chrono::Utc;
use rusqlite::{params, Connection, Row};

use medvault_core::document::{Document, NewDocument};

use super::super::{SqliteDatabase, SqliteResultExt};
use crate::DbError;

fn row_to_document(row: &Row) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get("id")?,
        filename: row.get("filename")?,
        blob_key: row.get("blob_key")?,
        patient_id: row.get("patient_id")?,
        uploaded_at: row.get("uploaded_at")?,
        file_size: row.get("file_size")?,
    })
}

fn select_document(conn: &Connection, id: &str) -> Result<Document, DbError> {
    conn.query_row(
        "SELECT * FROM documents WHERE id = ?1",
        params![id],
        row_to_document,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("document {id}")),
        other => super::super::map_sqlite_err(other),
    })
}

impl SqliteDatabase {
    pub fn insert_document_sync(&self, input: &NewDocument) -> Result<Document, DbError> {
        self.with_conn(|conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = Utc::now();
            conn.execute(
                "INSERT INTO documents (id, filename, patient_id, blob_key, file_size, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    input.filename,
                    input.patient_id,
                    input.blob_key,
                    input.file_size,
                    now
                ],
            )
            .to_db()?;
            select_document(conn, &id)
        })
    }

    pub fn get_document_sync(&self, id: &str) -> Result<Document, DbError> {
        self.with_conn(|conn| select_document(conn, id))
    }

    pub fn list_documents_sync(&self) -> Result<Vec<Document>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM documents ORDER BY uploaded_at DESC, id DESC")
                .to_db()?;
            let documents = stmt
                .query_map([], row_to_document)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(documents)
        })
    }

    pub fn delete_document_sync(&self, id: &str) -> Result<Document, DbError> {
        self.with_conn(|conn| {
            let document = select_document(conn, id)?;
            conn.execute("DELETE FROM documents WHERE id = ?1", params![id])
                .to_db()?;
            Ok(document)
        })
    }
}
