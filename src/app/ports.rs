use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Object-store capability the lifecycle operations consume. Bucket and
/// endpoint are adapter configuration, not part of these calls.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads bytes under `key` with a world-readable policy and
    /// returns the public reference URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Returns a time-boxed, write-capable signed URL for `key`.
    /// No object is created until the caller uses it.
    async fn sign_put(&self, key: &str, content_type: &str, expires_in: Duration)
        -> Result<String>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Server-side copy; the source object is left in place.
    async fn copy(&self, from_key: &str, to_key: &str) -> Result<()>;

    /// Public reference URL for a key, without touching the store.
    fn public_url(&self, key: &str) -> String;

    /// Inverts `public_url`, tolerating historical URL layouts. None
    /// when the URL does not resolve to a key in this store.
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// One durable transaction against the relational store. Commit or
/// rollback consumes the transaction; dropping without either must
/// release it server-side.
#[async_trait]
pub trait RecordTransaction: Send {
    /// Reads a record's asset references, locking the row for the
    /// duration of the transaction. None when the identifier is
    /// unknown.
    async fn fetch_references(&mut self, identifier: &str) -> Result<Option<Vec<String>>>;

    /// Replaces the record's whole reference list.
    async fn store_references(&mut self, identifier: &str, references: &[String]) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn RecordTransaction>>;
}
