//! Storage abstraction for opaque byte content
//!
//! The file store persists and retrieves bytes by key, independent of
//! backend. Keys are opaque, globally unique handles generated by `put`;
//! callers never see path structure.

use async_trait::async_trait;

use crate::error::StorageResult;

pub mod local;

pub use local::LocalFileStorage;

/// Capability interface for persisting and retrieving opaque byte content
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persist `bytes` under a freshly generated key and return it.
    ///
    /// `file_name` contributes only its extension to the key.
    async fn put(&self, file_name: &str, bytes: &[u8]) -> StorageResult<String>;

    /// Retrieve the content stored under `key`.
    ///
    /// Fails with `StorageError::KeyNotFound` if the key is absent.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Remove the content stored under `key`.
    ///
    /// Idempotent: deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;
}
