//! One-shot creation of the operator account.
//!
//! Credentials are always passed in explicitly; nothing here reads the
//! environment. Running it again with the same username is a no-op.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use medvault_core::admin::{AdminCredentials, AdminUser, NewAdmin};
use medvault_db::{Database, DbError};
use tracing::info;

#[derive(Debug)]
pub enum BootstrapOutcome {
    Created(AdminUser),
    AlreadyExists,
}

/// Create the admin account unless one with this username already exists.
pub async fn ensure_admin(db: &dyn Database, creds: &AdminCredentials) -> Result<BootstrapOutcome> {
    if db.get_admin_by_username(&creds.username).await?.is_some() {
        info!(username = %creds.username, "admin already exists");
        return Ok(BootstrapOutcome::AlreadyExists);
    }

    let new = NewAdmin {
        username: creds.username.clone(),
        email: creds.email.clone(),
        password_hash: hash_password(&creds.password)?,
    };
    match db.insert_admin(&new).await {
        Ok(user) => {
            info!(username = %user.username, "admin created");
            Ok(BootstrapOutcome::Created(user))
        }
        // Another process created it between the lookup and the insert.
        Err(DbError::Conflict(_)) => Ok(BootstrapOutcome::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}

/// Argon2id with default parameters, as a PHC string (`$argon2id$...`).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("hash password: {e}"))
}

/// Errors only when `stored` is not a PHC string.
pub fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| anyhow!("invalid password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use medvault_db::SqliteDatabase;

    fn creds() -> AdminCredentials {
        AdminCredentials {
            username: "admin".into(),
            email: "admin@example.com".into(),
            password: "correct horse".into(),
        }
    }

    #[test]
    fn hash_roundtrip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("s3cret"));
        assert!(verify_password("s3cret", &hash).unwrap());
        assert!(!verify_password("S3cret", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same", &a).unwrap());
        assert!(verify_password("same", &b).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("x", "").is_err());
        assert!(verify_password("x", "sha256$aa$bb").is_err());
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let db = SqliteDatabase::open_in_memory().unwrap();

        let first = ensure_admin(&db, &creds()).await.unwrap();
        let user = match first {
            BootstrapOutcome::Created(user) => user,
            other => panic!("expected Created, got {other:?}"),
        };
        assert_eq!(user.username, "admin");
        assert_eq!(user.email, "admin@example.com");
        assert!(verify_password("correct horse", &user.password_hash).unwrap());

        let second = ensure_admin(&db, &creds()).await.unwrap();
        assert!(matches!(second, BootstrapOutcome::AlreadyExists));

        let stored = db.get_admin_by_username("admin").await.unwrap().unwrap();
        assert_eq!(stored.id, user.id);
    }

    #[tokio::test]
    async fn different_usernames_both_created() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        ensure_admin(&db, &creds()).await.unwrap();
        let other = AdminCredentials {
            username: "ops".into(),
            ..creds()
        };
        assert!(matches!(
            ensure_admin(&db, &other).await.unwrap(),
            BootstrapOutcome::Created(_)
        ));
    }
}
