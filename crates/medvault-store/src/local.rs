use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{ObjectStore, StoreConfig, StoreError};

pub struct LocalStore {
    base_dir: PathBuf,
}

impl LocalStore {
    pub fn new(config: &StoreConfig) -> Self {
        let base_dir = config
            .local_data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }
}

/// Same default data directory as `medvault_db::data_dir()`, without
/// depending on the db crate.
fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MEDVAULT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("medvault")
}

fn is_partial(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".partial")
}

/// Sibling path that a write lands on before being renamed into place.
fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let path = self.resolve(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Internal(format!("mkdir: {e}")))?;
        }
        // Readers never observe a half-written object.
        let tmp = partial_path(&path);
        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| StoreError::Internal(format!("write {}: {e}", tmp.display())))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::Internal(format!(
                "rename {}: {e}",
                path.display()
            )));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        let path = self.resolve(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(StoreError::Internal(format!(
                "read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.resolve(key);
        // Directories stay; a concurrent put may be writing into the same prefix.
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Internal(format!(
                "delete {}: {e}",
                path.display()
            ))),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.resolve(prefix);
        if !dir.exists() {
            return Ok(vec![]);
        }
        let mut keys = Vec::new();
        let mut stack = vec![dir];
        while let Some(current) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&current).await {
                Ok(e) => e,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(StoreError::Internal(format!(
                        "list {}: {e}",
                        current.display()
                    )))
                }
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StoreError::Internal(format!("read_dir entry: {e}")))?
            {
                let path = entry.path();
                let ft = entry
                    .file_type()
                    .await
                    .map_err(|e| StoreError::Internal(format!("file_type: {e}")))?;
                if ft.is_dir() {
                    stack.push(path);
                } else if is_partial(&entry.file_name().to_string_lossy()) {
                    continue;
                } else if let Ok(rel) = path.strip_prefix(&self.base_dir) {
                    keys.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.resolve(key);
        match tokio::fs::try_exists(&path).await {
            Ok(exists) => Ok(exists),
            Err(e) => Err(StoreError::Internal(format!(
                "exists {}: {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(dir: &std::path::Path) -> LocalStore {
        LocalStore::new(&StoreConfig::local(dir.to_string_lossy()))
    }

    #[tokio::test]
    async fn put_then_get_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        store
            .put("documents/abc/scan.pdf", Bytes::from("%PDF-1.4 body"))
            .await
            .unwrap();
        let data = store.get("documents/abc/scan.pdf").await.unwrap();
        assert_eq!(data.as_ref(), b"%PDF-1.4 body");
    }

    #[tokio::test]
    async fn put_leaves_no_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        store
            .put("documents/abc/scan.pdf", Bytes::from("data"))
            .await
            .unwrap();
        let dir = tmp.path().join("documents/abc");
        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["scan.pdf".to_string()]);
    }

    #[tokio::test]
    async fn get_missing_returns_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        let err = store.get("nonexistent/key").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn put_overwrites_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        store.put("key", Bytes::from("first")).await.unwrap();
        store.put("key", Bytes::from("second")).await.unwrap();

        let data = store.get("key").await.unwrap();
        assert_eq!(data.as_ref(), b"second");
    }

    #[tokio::test]
    async fn delete_removes_object_keeps_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        store.put("documents/b-1.pdf", Bytes::from("one")).await.unwrap();
        store.put("documents/b-2.pdf", Bytes::from("two")).await.unwrap();
        assert!(store.exists("documents/b-1.pdf").await.unwrap());

        store.delete("documents/b-1.pdf").await.unwrap();
        assert!(!store.exists("documents/b-1.pdf").await.unwrap());
        assert_eq!(
            store.list("documents").await.unwrap(),
            vec!["documents/b-2.pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn delete_missing_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        store.delete("nonexistent").await.unwrap();
    }

    #[tokio::test]
    async fn list_returns_keys_with_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        store
            .put("documents/a/one.pdf", Bytes::from("1"))
            .await
            .unwrap();
        store
            .put("documents/b/two.pdf", Bytes::from("2"))
            .await
            .unwrap();
        store
            .put("other/file.txt", Bytes::from("other"))
            .await
            .unwrap();

        let keys = store.list("documents").await.unwrap();
        assert_eq!(
            keys,
            vec![
                "documents/a/one.pdf".to_string(),
                "documents/b/two.pdf".to_string()
            ]
        );

        let keys = store.list("documents/a").await.unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[tokio::test]
    async fn list_skips_only_in_flight_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        store
            .put("documents/scan.partial", Bytes::from("kept"))
            .await
            .unwrap();
        std::fs::write(tmp.path().join("documents/.b-2.pdf.partial"), b"half").unwrap();

        let keys = store.list("documents").await.unwrap();
        assert_eq!(keys, vec!["documents/scan.partial".to_string()]);
    }

    #[tokio::test]
    async fn list_empty_prefix_returns_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        let keys = store.list("nonexistent").await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn exists_returns_correct_values() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        assert!(!store.exists("key").await.unwrap());
        store.put("key", Bytes::from("data")).await.unwrap();
        assert!(store.exists("key").await.unwrap());
    }

    #[tokio::test]
    async fn binary_content_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        let content: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        store
            .put("documents/bin/blob.pdf", Bytes::from(content.clone()))
            .await
            .unwrap();
        let data = store.get("documents/bin/blob.pdf").await.unwrap();
        assert_eq!(data.as_ref(), content.as_slice());
    }
}
