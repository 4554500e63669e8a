use crate::error::{ConsoleError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Sort key allocation policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Key given to the first item of an empty list
    pub head_key: f64,
    /// Smallest allowed distance between a new key and its neighbours
    pub min_gap: f64,
    /// Spacing between keys after a rebalance
    pub rebalance_step: f64,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            head_key: 1.0,
            min_gap: 1e-9,
            rebalance_step: 1.0,
        }
    }
}

/// Confirmation dialog settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Requests allowed to wait behind the open dialog
    pub max_pending: usize,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self { max_pending: 16 }
    }
}

/// Console configuration, read from `.chartq/config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
    pub ordering: OrderingConfig,
    pub dialog: DialogConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            log_filter: "chartq_core=info".to_string(),
            ordering: OrderingConfig::default(),
            dialog: DialogConfig::default(),
        }
    }
}

impl ConsoleConfig {
    pub const CONFIG_FILE: &'static str = "config.json";

    /// Location of the config file under a data directory
    pub fn path_in(data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join(Self::CONFIG_FILE)
    }

    /// Loads the config, falling back to defaults when the file is missing
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConsoleError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;

        Ok(config)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).await?;
        Ok(())
    }

    /// Rejects settings the allocator and dialog cannot work with
    pub fn validate(&self) -> Result<()> {
        let ordering = &self.ordering;

        if !ordering.head_key.is_finite() {
            return Err(ConsoleError::ConfigError(
                "ordering.head_key must be finite".to_string(),
            ));
        }
        if !ordering.min_gap.is_finite() || ordering.min_gap < 0.0 {
            return Err(ConsoleError::ConfigError(
                "ordering.min_gap must be a non-negative number".to_string(),
            ));
        }
        if !ordering.rebalance_step.is_finite() || ordering.rebalance_step <= 0.0 {
            return Err(ConsoleError::ConfigError(
                "ordering.rebalance_step must be positive".to_string(),
            ));
        }
        if self.dialog.max_pending == 0 {
            return Err(ConsoleError::ConfigError(
                "dialog.max_pending must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();

        let config = ConsoleConfig::load(ConsoleConfig::path_in(temp_dir.path()))
            .await
            .unwrap();

        assert_eq!(config, ConsoleConfig::default());
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConsoleConfig::path_in(temp_dir.path());
        fs::write(&path, r#"{ "ordering": { "min_gap": 0.001 } }"#)
            .await
            .unwrap();

        let config = ConsoleConfig::load(&path).await.unwrap();

        assert_eq!(config.ordering.min_gap, 0.001);
        assert_eq!(config.ordering.rebalance_step, 1.0);
        assert_eq!(config.dialog.max_pending, 16);
        assert_eq!(config.log_filter, "chartq_core=info");
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConsoleConfig::path_in(temp_dir.path());

        let mut config = ConsoleConfig::default();
        config.dialog.max_pending = 4;
        config.save(&path).await.unwrap();

        let loaded = ConsoleConfig::load(&path).await.unwrap();
        assert_eq!(loaded.dialog.max_pending, 4);
    }

    #[tokio::test]
    async fn test_invalid_values_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConsoleConfig::path_in(temp_dir.path());
        fs::write(&path, r#"{ "ordering": { "rebalance_step": 0 } }"#)
            .await
            .unwrap();

        let err = ConsoleConfig::load(&path).await.unwrap_err();
        assert!(matches!(err, ConsoleError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_malformed_json_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConsoleConfig::path_in(temp_dir.path());
        fs::write(&path, "{ not json").await.unwrap();

        let err = ConsoleConfig::load(&path).await.unwrap_err();
        assert!(matches!(err, ConsoleError::ConfigError(_)));
    }
}
