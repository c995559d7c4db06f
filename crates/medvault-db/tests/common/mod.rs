// Backend-agnostic integration tests for the Database trait.
//
// Each public async function accepts `&dyn Database` so that the same logic
// can be exercised against both the SQLite and Postgres backends.

use std::time::Duration;

use medvault_core::admin::NewAdmin;
use medvault_core::document::NewDocument;
use medvault_db::{Database, DbError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_document(filename: &str, patient_id: &str) -> NewDocument {
    NewDocument {
        filename: filename.to_string(),
        patient_id: patient_id.to_string(),
        blob_key: format!("documents/{}/{filename}", uuid_like(filename, patient_id)),
        file_size: 13,
    }
}

fn uuid_like(filename: &str, patient_id: &str) -> String {
    format!("{patient_id}-{filename}").replace('.', "-")
}

// ---------------------------------------------------------------------------
// Document tests
// ---------------------------------------------------------------------------

/// Insert, get, list, delete.
pub async fn test_document_crud(db: &dyn Database) {
    let doc = db
        .insert_document(&make_document("scan.pdf", "p1"))
        .await
        .unwrap();
    assert!(!doc.id.is_empty());
    assert_eq!(doc.filename, "scan.pdf");
    assert_eq!(doc.patient_id, "p1");
    assert_eq!(doc.blob_key, "documents/p1-scan-pdf/scan.pdf");
    assert_eq!(doc.file_size, 13);

    let fetched = db.get_document(&doc.id).await.unwrap();
    assert_eq!(fetched, doc);

    let list = db.list_documents().await.unwrap();
    assert_eq!(list.len(), 1);

    db.insert_document(&make_document("labs.pdf", "p2"))
        .await
        .unwrap();
    let list = db.list_documents().await.unwrap();
    assert_eq!(list.len(), 2);

    // delete returns the removed record
    let deleted = db.delete_document(&doc.id).await.unwrap();
    assert_eq!(deleted, doc);

    let list = db.list_documents().await.unwrap();
    assert_eq!(list.len(), 1);
    assert!(list.iter().all(|d| d.id != doc.id));

    assert!(matches!(
        db.get_document(&doc.id).await,
        Err(DbError::NotFound(_))
    ));
    // A second delete reports NotFound instead of succeeding silently.
    assert!(matches!(
        db.delete_document(&doc.id).await,
        Err(DbError::NotFound(_))
    ));
}

/// Deleting an unknown id leaves other records alone.
pub async fn test_delete_missing_document(db: &dyn Database) {
    let keep = db
        .insert_document(&make_document("keep.pdf", "p1"))
        .await
        .unwrap();

    assert!(matches!(
        db.delete_document("no-such-id").await,
        Err(DbError::NotFound(_))
    ));

    let list = db.list_documents().await.unwrap();
    assert_eq!(list, vec![keep]);
}

/// Newest uploads come first.
pub async fn test_list_newest_first(db: &dyn Database) {
    for name in ["first.pdf", "second.pdf", "third.pdf"] {
        db.insert_document(&make_document(name, "p1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(15)).await;
    }

    let list = db.list_documents().await.unwrap();
    let listed: Vec<&str> = list.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(listed, ["third.pdf", "second.pdf", "first.pdf"]);
    assert!(list
        .windows(2)
        .all(|w| w[0].uploaded_at >= w[1].uploaded_at));
}

/// Concurrent inserts both land with distinct ids.
pub async fn test_concurrent_inserts(db: &dyn Database) {
    let a = make_document("a.pdf", "p1");
    let b = make_document("b.pdf", "p2");
    let (ra, rb) = tokio::join!(db.insert_document(&a), db.insert_document(&b));
    let (ra, rb) = (ra.unwrap(), rb.unwrap());
    assert_ne!(ra.id, rb.id);
    assert_eq!(db.list_documents().await.unwrap().len(), 2);
}

/// Two records may not share a blob.
pub async fn test_blob_key_unique(db: &dyn Database) {
    let input = make_document("dup.pdf", "p1");
    db.insert_document(&input).await.unwrap();
    assert!(matches!(
        db.insert_document(&input).await,
        Err(DbError::Conflict(_))
    ));
}

// ---------------------------------------------------------------------------
// Admin tests
// ---------------------------------------------------------------------------

pub async fn test_admins(db: &dyn Database) {
    assert!(db.get_admin_by_username("root").await.unwrap().is_none());

    let admin = db
        .insert_admin(&NewAdmin {
            username: "root".into(),
            email: "root@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$MDA$MTE".into(),
        })
        .await
        .unwrap();
    assert_eq!(admin.username, "root");

    let found = db.get_admin_by_username("root").await.unwrap().unwrap();
    assert_eq!(found.id, admin.id);
    assert_eq!(found.password_hash, "$argon2id$v=19$m=19456,t=2,p=1$MDA$MTE");

    let dup = db
        .insert_admin(&NewAdmin {
            username: "root".into(),
            email: "other@example.com".into(),
            password_hash: "x".into(),
        })
        .await;
    assert!(matches!(dup, Err(DbError::Conflict(_))));
}
