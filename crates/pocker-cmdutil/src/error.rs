//! Error types for service bootstrap.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CmdError {
    /// Settings file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid JSON or does not match the settings shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `--config` names a file that does not exist
    #[error("Settings file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Another `tracing` subscriber is already installed
    #[error("A global tracing subscriber is already installed")]
    SubscriberAlreadySet,

    #[error("Telemetry setup error: {0}")]
    Telemetry(String),
}

pub type Result<T> = std::result::Result<T, CmdError>;
