//! Object storage interface.
//!
//! The core only needs `upload(path, bytes) -> url` for death certificates,
//! permits and payment receipts. Production deployments plug in a bucket
//! provider; tests and local development use [`MemoryObjectStorage`].

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Uploads binary files and returns a stable public URL.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `path` and return the public URL.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::DomainError::Storage`] if the upload fails.
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String>;
}

/// In-memory object storage for tests and local development.
#[derive(Clone, Default)]
pub struct MemoryObjectStorage {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryObjectStorage {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored bytes for `path`, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.read().ok()?.get(path).cloned()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String> {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(path.to_string(), bytes);
        }
        Ok(format!("memory://{path}"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn upload_returns_stable_url_and_keeps_bytes() {
        let storage = MemoryObjectStorage::new();
        let url = storage
            .upload("receipts/abc.pdf", vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(url, "memory://receipts/abc.pdf");
        assert_eq!(storage.get("receipts/abc.pdf"), Some(vec![1, 2, 3]));
    }
}
