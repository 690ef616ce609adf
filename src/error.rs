use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Library-surface errors. Process, task, install, and session outcomes are
/// not errors here; they flow through their own status enums
/// (`CommandStatus`, `TaskStatus`, `InstallOutcome`, `StartError`) so callers
/// can match on them without unwinding.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Result file not found: {0}")]
    ResultNotFound(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
