//! Service configuration

use crate::core::service::ServiceError;
use crate::storage::CommitMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Longest prefix accepted for a new namespace (matches the package id limit)
pub const DEFAULT_MAX_PREFIX_LENGTH: usize = 128;

/// Main service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Maximum length of a new namespace prefix
    pub max_prefix_length: usize,

    /// Allow pushes when every matching namespace is shared
    pub allow_push_to_shared_namespaces: bool,

    /// Commit mode used by operations that persist on completion
    pub default_commit_mode: CommitMode,

    /// Snapshot file used by the admin tool
    pub store_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_prefix_length: DEFAULT_MAX_PREFIX_LENGTH,
            allow_push_to_shared_namespaces: false,
            default_commit_mode: CommitMode::Batch,
            store_path: None,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ServiceError> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(ServiceError::Io)?;
        let config: ServiceConfig = toml::from_str(&content).map_err(|e| {
            ServiceError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        if config.max_prefix_length == 0 {
            return Err(ServiceError::Config(
                "max_prefix_length must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ServiceConfig::load_from_file(&temp_dir.path().join("none.toml")).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("namespaces.toml");
        fs::write(
            &path,
            "allow_push_to_shared_namespaces = true\ndefault_commit_mode = \"transaction\"\n",
        )
        .unwrap();

        let config = ServiceConfig::load_from_file(&path).unwrap();
        assert!(config.allow_push_to_shared_namespaces);
        assert_eq!(config.default_commit_mode, CommitMode::Transaction);
        assert_eq!(config.max_prefix_length, DEFAULT_MAX_PREFIX_LENGTH);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        fs::write(&path, "max_prefix_length = \"long\"").unwrap();
        assert!(matches!(
            ServiceConfig::load_from_file(&path),
            Err(ServiceError::Config(_))
        ));

        fs::write(&path, "max_prefix_length = 0").unwrap();
        assert!(matches!(
            ServiceConfig::load_from_file(&path),
            Err(ServiceError::Config(_))
        ));
    }
}
