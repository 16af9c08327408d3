//! Supabase Storage adapter.
//!
//! Objects live in a single public-read bucket; all calls go through
//! the storage REST API with the service-role key. Config via env:
//! - SUPABASE_URL (e.g., https://xyzcompany.supabase.co) OR
//!   SUPABASE_PROJECT_REF (e.g., ihkgojiseqpwinwdowvm)
//! - SUPABASE_SERVICE_ROLE_KEY (service role key)
//! - SUPABASE_BUCKET (bucket name)
//! - SUPABASE_PREFIX (optional path prefix inside bucket)

use crate::app::ports::ObjectStore;
use crate::config::StoreConfig;
use crate::error::{AssetError, Result};
use crate::keys;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

pub struct SupabaseObjectStore {
    http: reqwest::Client,
    config: StoreConfig,
}

#[derive(Deserialize)]
struct SignUploadResponse {
    url: String,
}

impl SupabaseObjectStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(StoreConfig::from_env()?))
    }

    /// Bucket-relative path including the configured prefix.
    fn physical_key(&self, key: &str) -> String {
        if self.config.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.config.prefix.trim_end_matches('/'), key)
        }
    }

    fn strip_prefix<'a>(&self, physical: &'a str) -> &'a str {
        if self.config.prefix.is_empty() {
            return physical;
        }
        let prefix = format!("{}/", self.config.prefix.trim_end_matches('/'));
        physical.strip_prefix(prefix.as_str()).unwrap_or(physical)
    }

    fn object_endpoint(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base_url,
            self.config.bucket,
            self.physical_key(key)
        )
    }

    async fn fail_from(&self, operation: &str, resp: reqwest::Response) -> AssetError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        AssetError::Store {
            message: format!("{} failed: {} - {}", operation, status, body),
        }
    }
}

#[async_trait]
impl ObjectStore for SupabaseObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        // upsert=true keeps re-uploads of the same key idempotent.
        let resp = self
            .http
            .put(self.object_endpoint(key))
            .header("Authorization", format!("Bearer {}", self.config.service_key))
            .header("apikey", self.config.service_key.clone())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .query(&[("upsert", "true")])
            .body(bytes)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(self.fail_from("upload", resp).await);
        }
        debug!(key = %key, "object uploaded");
        Ok(self.public_url(key))
    }

    async fn sign_put(
        &self,
        key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let endpoint = format!(
            "{}/storage/v1/object/upload/sign/{}/{}",
            self.config.base_url,
            self.config.bucket,
            self.physical_key(key)
        );
        let resp = self
            .http
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", self.config.service_key))
            .header("apikey", self.config.service_key.clone())
            .json(&json!({ "expiresIn": expires_in.as_secs() }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(self.fail_from("sign", resp).await);
        }
        let signed: SignUploadResponse = resp.json().await?;
        if signed.url.starts_with("http") {
            Ok(signed.url)
        } else {
            Ok(format!("{}/storage/v1{}", self.config.base_url, signed.url))
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let resp = self
            .http
            .delete(self.object_endpoint(key))
            .header("Authorization", format!("Bearer {}", self.config.service_key))
            .header("apikey", self.config.service_key.clone())
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(self.fail_from("delete", resp).await);
        }
        debug!(key = %key, "object deleted");
        Ok(())
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> Result<()> {
        let endpoint = format!("{}/storage/v1/object/copy", self.config.base_url);
        let resp = self
            .http
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", self.config.service_key))
            .header("apikey", self.config.service_key.clone())
            .json(&json!({
                "bucketId": self.config.bucket,
                "sourceKey": self.physical_key(from_key),
                "destinationKey": self.physical_key(to_key),
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(self.fail_from("copy", resp).await);
        }
        debug!(from = %from_key, to = %to_key, "object copied");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base_url,
            self.config.bucket,
            self.physical_key(key)
        )
    }

    /// Inverts `public_url`, falling back through the layouts stored
    /// references have carried over time: authenticated object URLs
    /// and S3-style URLs whose whole path is the key.
    fn key_for_url(&self, url: &str) -> Option<String> {
        let url = keys::normalize_slashes(url);

        let public_marker = format!("/object/public/{}/", self.config.bucket);
        if let Some(pos) = url.find(&public_marker) {
            let physical = &url[pos + public_marker.len()..];
            return Some(self.strip_prefix(physical).to_string()).filter(|k| !k.is_empty());
        }

        let object_marker = format!("/object/{}/", self.config.bucket);
        if let Some(pos) = url.find(&object_marker) {
            let physical = &url[pos + object_marker.len()..];
            return Some(self.strip_prefix(physical).to_string()).filter(|k| !k.is_empty());
        }

        // Historical S3-style reference: everything after the host is
        // the key.
        let (_, rest) = url.split_once("://")?;
        let (_, path) = rest.split_once('/')?;
        Some(self.strip_prefix(path).to_string()).filter(|k| !k.is_empty())
    }
}
