use chrono::{DateTime, Utc};

use medvault_core::document::{Document, NewDocument};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    filename: String,
    patient_id: String,
    blob_key: String,
    file_size: i64,
    uploaded_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(r: DocumentRow) -> Self {
        Document {
            id: r.id,
            filename: r.filename,
            blob_key: r.blob_key,
            patient_id: r.patient_id,
            uploaded_at: r.uploaded_at,
            file_size: r.file_size,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_insert_document(
        &self,
        input: &NewDocument,
    ) -> Result<Document, DbError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let row = sqlx::query_as::<_, DocumentRow>(
            "INSERT INTO documents (id, filename, patient_id, blob_key, file_size, uploaded_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(&id)
        .bind(&input.filename)
        .bind(&input.patient_id)
        .bind(&input.blob_key)
        .bind(input.file_size)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_document(&self, id: &str) -> Result<Document, DbError> {
        let row = sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("document {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_documents(&self) -> Result<Vec<Document>, DbError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT * FROM documents ORDER BY uploaded_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// `DELETE ... RETURNING` keeps lookup and removal in one statement, so
    /// two racing deletes cannot both succeed.
    pub(crate) async fn pg_delete_document(&self, id: &str) -> Result<Document, DbError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "DELETE FROM documents WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?
        .ok_or_else(|| pg_not_found(&format!("document {id}")))?;

        Ok(row.into())
    }
}
