//! 错误类型定义

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MoneySyncSDKError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("IO error: {0}")]
    IO(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("KV store error: {0}")]
    KvStore(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Not initialized: {0}")]
    NotInitialized(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for MoneySyncSDKError {
    fn from(error: serde_json::Error) -> Self {
        MoneySyncSDKError::Json(error.to_string())
    }
}

impl From<std::io::Error> for MoneySyncSDKError {
    fn from(error: std::io::Error) -> Self {
        MoneySyncSDKError::IO(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MoneySyncSDKError>;
