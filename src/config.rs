use crate::constants;
use crate::error::{AssetError, Result};
use serde::Deserialize;
use std::env;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub uploads: UploadConfig,
}

/// Bounds enforced on the server-side upload path.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
    #[serde(default = "default_presign_ttl_secs")]
    pub presign_ttl_secs: u64,
}

fn default_max_files() -> usize {
    constants::MAX_UPLOAD_FILES
}

fn default_max_file_bytes() -> u64 {
    constants::MAX_FILE_BYTES
}

fn default_allowed_content_types() -> Vec<String> {
    constants::ALLOWED_CONTENT_TYPES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_presign_ttl_secs() -> u64 {
    constants::PRESIGN_TTL_SECS
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_file_bytes: default_max_file_bytes(),
            allowed_content_types: default_allowed_content_types(),
            presign_ttl_secs: default_presign_ttl_secs(),
        }
    }
}

impl UploadConfig {
    pub fn allows_content_type(&self, content_type: &str) -> bool {
        self.allowed_content_types.iter().any(|t| t == content_type)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        match fs::read_to_string(config_path) {
            Ok(config_content) => {
                let config: Config = toml::from_str(&config_content)?;
                Ok(config)
            }
            // Missing file is fine; every knob has a default.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(AssetError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path, e
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            uploads: UploadConfig::default(),
        }
    }
}

/// Connection settings for the object store, taken from the
/// environment. Either a full URL or a project ref works:
/// - SUPABASE_URL (e.g., https://xyzcompany.supabase.co) OR
///   SUPABASE_PROJECT_REF (e.g., ihkgojiseqpwinwdowvm)
/// - SUPABASE_SERVICE_ROLE_KEY (service role key)
/// - SUPABASE_BUCKET (bucket name)
/// - SUPABASE_PREFIX (optional path prefix inside bucket)
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub service_key: String,
    pub bucket: String,
    pub prefix: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let base_url = match env::var("SUPABASE_URL") {
            Ok(u) => u,
            Err(_) => {
                let project_ref = env::var("SUPABASE_PROJECT_REF")?;
                format!("https://{}.supabase.co", project_ref)
            }
        };
        let service_key = env::var("SUPABASE_SERVICE_ROLE_KEY")?;
        let bucket = env::var("SUPABASE_BUCKET")?;
        let prefix = env::var("SUPABASE_PREFIX").unwrap_or_else(|_| String::new());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
            prefix,
        })
    }
}
