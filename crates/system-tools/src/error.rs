//! Error Types for System Tools

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SystemToolError>;

#[derive(Error, Debug)]
pub enum SystemToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration missing: {0}")]
    MissingConfig(String),

    #[error("browser automation error: {0}")]
    WebDriver(String),
}
