//! Error types for the folio page/content synchronization system.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result of the best-effort restore that follows a failed write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum RestoreOutcome {
    /// The prior bytes were written back
    Restored,
    /// Nothing existed before; the partial resource was removed
    Cleared,
    /// Putting the prior state back failed as well
    Failed(String),
}

impl RestoreOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, RestoreOutcome::Failed(_))
    }
}

impl fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreOutcome::Restored => write!(f, "restored"),
            RestoreOutcome::Cleared => write!(f, "cleared"),
            RestoreOutcome::Failed(reason) => write!(f, "restore failed: {}", reason),
        }
    }
}

/// A write that did not confirm success
///
/// Carries the payload that would have been written so the caller can decide
/// whether the pre-existing resource is still the current truth.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Write to {name} failed: {reason} ({restore})")]
pub struct WriteFailure {
    pub name: String,
    pub reason: String,
    pub attempted: Vec<u8>,
    pub restore: RestoreOutcome,
}

/// Durable resource store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    WriteFailure(#[from] WriteFailure),

    #[error("Invalid resource name: {0}")]
    InvalidName(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Identity token missing, malformed, badly signed or expired
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unauthorized: {0}")]
pub struct Unauthorized(pub String);

/// Resource access gateway errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Corrupt content in {resource}: {reason}")]
    CorruptContent { resource: String, reason: String },

    #[error(transparent)]
    WriteFailure(WriteFailure),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Transport failure: {0}")]
    TransportFailure(String),
}

impl From<Unauthorized> for GatewayError {
    fn from(err: Unauthorized) -> Self {
        GatewayError::Unauthorized(err.0)
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(name) => GatewayError::NotFound(name),
            StoreError::WriteFailure(failure) => GatewayError::WriteFailure(failure),
            StoreError::InvalidName(name) => GatewayError::InvalidRequest(format!(
                "invalid resource name: {}",
                name
            )),
            StoreError::IoError(e) => GatewayError::TransportFailure(format!("storage i/o: {}", e)),
        }
    }
}

/// Schema tree editor errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid schema document: {0}")]
    InvalidDocument(String),
}

/// Top-level errors for the CLI, configuration and logging surfaces
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Workflow {workflow} failed: {message}")]
    WorkflowFailed { workflow: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
