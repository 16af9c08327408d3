//! In-memory object store for development/testing.

use crate::app::ports::ObjectStore;
use crate::error::{AssetError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// Keeps objects in a map and records every mutating call, so tests
/// can assert effect ordering (copy-before-delete, compensation).
pub struct MemoryObjectStore {
    bucket: String,
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    operations: Arc<Mutex<Vec<String>>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Seeds an object without going through `put` (no operation log
    /// entry), for setting up historical store state.
    pub fn insert_raw(&self, key: &str, bytes: Vec<u8>, content_type: &str) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    fn log(&self, operation: String) {
        self.operations.lock().unwrap().push(operation);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        self.insert_raw(key, bytes, content_type);
        self.log(format!("put {}", key));
        debug!(key = %key, "object stored");
        Ok(self.public_url(key))
    }

    async fn sign_put(
        &self,
        key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> Result<String> {
        Ok(format!(
            "memory://sign/{}/{}?expires={}",
            self.bucket,
            key,
            expires_in.as_secs()
        ))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let removed = self.objects.lock().unwrap().remove(key).is_some();
        if !removed {
            return Err(AssetError::Store {
                message: format!("no such key: {}", key),
            });
        }
        self.log(format!("delete {}", key));
        Ok(())
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        let source = objects.get(from_key).cloned().ok_or_else(|| AssetError::Store {
            message: format!("no such key: {}", from_key),
        })?;
        objects.insert(to_key.to_string(), source);
        drop(objects);
        self.log(format!("copy {} -> {}", from_key, to_key));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{}/{}", self.bucket, key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        let prefix = format!("memory://{}/", self.bucket);
        url.strip_prefix(&prefix).map(|key| key.to_string())
    }
}
