use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("object store error: {message}")]
    Store { message: String },

    #[error("persistence error: {message}")]
    Persistence { message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, AssetError>;
