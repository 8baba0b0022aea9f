//! Configuration System
//!
//! Layered configuration built with the `config` crate. Lowest to highest:
//! built-in defaults, the global file, the workspace files, then `FOLIO__*`
//! environment variables. An explicit config file replaces the file layers.

use crate::error::ApiError;
use crate::gateway::StorageLayout;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolioConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the site's resources live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Source directory; relative paths resolve against the workspace
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    #[serde(default = "default_schema_resource")]
    pub schema_resource: String,

    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    #[serde(default = "default_media_dir")]
    pub media_dir: String,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("_source")
}

fn default_schema_resource() -> String {
    "web-schema.json".to_string()
}

fn default_content_dir() -> String {
    "data".to_string()
}

fn default_media_dir() -> String {
    "media".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            schema_resource: default_schema_resource(),
            content_dir: default_content_dir(),
            media_dir: default_media_dir(),
        }
    }
}

impl StorageConfig {
    pub fn resolve_root(&self, workspace_root: &Path) -> PathBuf {
        if self.root.is_absolute() {
            self.root.clone()
        } else {
            workspace_root.join(&self.root)
        }
    }

    pub fn media_root(&self, workspace_root: &Path) -> PathBuf {
        self.resolve_root(workspace_root).join(&self.media_dir)
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout {
            schema_resource: self.schema_resource.clone(),
            content_dir: self.content_dir.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.root.as_os_str().is_empty() {
            return Err("Storage root cannot be empty".to_string());
        }
        for (field, value) in [
            ("schema_resource", &self.schema_resource),
            ("content_dir", &self.content_dir),
            ("media_dir", &self.media_dir),
        ] {
            if value.is_empty() || value.split('/').any(|s| s.is_empty() || s == "..") {
                return Err(format!("{} '{}' is not a relative resource name", field, value));
            }
        }
        Ok(())
    }
}

/// Token signing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub secret: String,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

fn default_token_ttl() -> u64 {
    3600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.secret.is_empty() {
            return Err("Token secret is not set (auth.secret or FOLIO__AUTH__SECRET)".to_string());
        }
        if self.token_ttl_secs == 0 {
            return Err("Token lifetime must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Storage(String),
    Auth(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Auth(msg) => write!(f, "Auth: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl FolioConfig {
    /// Validate the entire configuration, collecting every error
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.storage.validate() {
            errors.push(ValidationError::Storage(e));
        }
        if let Err(e) = self.auth.validate() {
            errors.push(ValidationError::Auth(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`validate`](Self::validate) folded into a single error
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }
}
