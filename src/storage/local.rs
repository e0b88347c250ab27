//! Local file system implementation of the storage abstraction

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::storage::FileStorage;

/// File store backed by a single local directory
///
/// Keys map 1:1 to file names under the base directory: a UUID in simple
/// form plus the original file extension.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    /// Create a store rooted at `base_path`, creating the directory if needed
    pub fn new(base_path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Create a store rooted at `UPLOAD_DIR` (default `uploads`)
    pub fn from_env() -> std::io::Result<Self> {
        let dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        Self::new(dir)
    }

    fn generate_key(file_name: &str) -> String {
        let stamp = Uuid::new_v4().simple().to_string();
        match Path::new(file_name).extension().and_then(|e| e.to_str()) {
            Some(ext) if !ext.is_empty() => format!("{stamp}.{ext}"),
            _ => stamp,
        }
    }

    /// Resolve a key to its path, rejecting anything that is not a bare
    /// file name
    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn put(&self, file_name: &str, bytes: &[u8]) -> StorageResult<String> {
        let key = Self::generate_key(file_name);
        let path = self.resolve(&key)?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::AlreadyExists => StorageError::KeyCollision { key: key.clone() },
                _ => StorageError::Io {
                    key: key.clone(),
                    source,
                },
            })?;

        file.write_all(bytes).await.map_err(|source| StorageError::Io {
            key: key.clone(),
            source,
        })?;
        file.flush().await.map_err(|source| StorageError::Io {
            key: key.clone(),
            source,
        })?;

        Ok(key)
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(key)?;

        tokio::fs::read(&path).await.map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => StorageError::KeyNotFound {
                key: key.to_string(),
            },
            _ => StorageError::Io {
                key: key.to_string(),
                source,
            },
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.resolve(key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => {
                warn!("failed to delete stored file for key {}: {}", key, source);
                Err(StorageError::Io {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage() -> (tempfile::TempDir, LocalFileStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path()).unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let (_dir, storage) = test_storage();

        let key = storage.put("lease.pdf", b"contract body").await.unwrap();
        assert!(key.ends_with(".pdf"));

        let bytes = storage.get(&key).await.unwrap();
        assert_eq!(bytes, b"contract body");
    }

    #[tokio::test]
    async fn test_keys_are_unique_per_put() {
        let (_dir, storage) = test_storage();

        let a = storage.put("a.txt", b"one").await.unwrap();
        let b = storage.put("a.txt", b"two").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(storage.get(&a).await.unwrap(), b"one");
        assert_eq!(storage.get(&b).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_get_missing_key_fails() {
        let (_dir, storage) = test_storage();

        let err = storage.get("0123456789abcdef.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::KeyNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, storage) = test_storage();

        let key = storage.put("notes.md", b"# notes").await.unwrap();
        storage.delete(&key).await.unwrap();
        storage.delete(&key).await.unwrap();

        let err = storage.get(&key).await.unwrap_err();
        assert!(matches!(err, StorageError::KeyNotFound { .. }));
    }

    #[tokio::test]
    async fn test_path_like_keys_rejected() {
        let (_dir, storage) = test_storage();

        for key in ["../escape", "a/b", "a\\b", ""] {
            let err = storage.get(key).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey { .. }), "key: {key}");
        }
    }

    #[tokio::test]
    async fn test_key_without_extension() {
        let (_dir, storage) = test_storage();

        let key = storage.put("README", b"hello").await.unwrap();
        assert!(!key.contains('.'));
        assert_eq!(storage.get(&key).await.unwrap(), b"hello");
    }
}
