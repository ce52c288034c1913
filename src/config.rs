//! Operator configuration
//!
//! Values that used to be compiled in (Ceph image, host data path, monitor
//! count, conflict retry bounds) live here and can be overridden from a YAML
//! file. Missing keys take their defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Settings for native cluster creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterConfig {
    /// Ceph image for locally provisioned clusters
    pub default_image: String,
    /// Host path for monitor and OSD metadata
    pub data_dir_host_path: String,
    /// Number of monitors
    pub monitor_count: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            default_image: "ceph/ceph:v15.2.4".to_string(),
            data_dir_host_path: "/var/lib/rook".to_string(),
            monitor_count: 3,
        }
    }
}

/// Bounds for the pool update conflict retry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
    /// Jitter applied to each interval, 0.0 to 1.0
    pub randomization_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        // Same shape as the Kubernetes client's default conflict retry
        Self {
            max_attempts: 5,
            initial_interval_ms: 10,
            max_interval_ms: 10,
            multiplier: 1.0,
            randomization_factor: 0.1,
        }
    }
}

impl RetryConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorConfig {
    pub cluster: ClusterConfig,
    pub retry: RetryConfig,
}

impl OperatorConfig {
    /// Load and validate a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: OperatorConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cluster.default_image.trim().is_empty() {
            return Err(Error::Configuration("cluster.defaultImage must not be empty".into()));
        }
        if self.cluster.data_dir_host_path.trim().is_empty() {
            return Err(Error::Configuration(
                "cluster.dataDirHostPath must not be empty".into(),
            ));
        }
        if self.cluster.monitor_count == 0 {
            return Err(Error::Configuration("cluster.monitorCount must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Configuration("retry.maxAttempts must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.retry.randomization_factor) {
            return Err(Error::Configuration(format!(
                "retry.randomizationFactor must be within 0.0..=1.0, got {}",
                self.retry.randomization_factor
            )));
        }
        if self.retry.multiplier < 1.0 {
            return Err(Error::Configuration(format!(
                "retry.multiplier must be at least 1.0, got {}",
                self.retry.multiplier
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = OperatorConfig::default();
        assert_eq!(config.cluster.monitor_count, 3);
        assert_eq!(config.cluster.data_dir_host_path, "/var/lib/rook");
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = OperatorConfig::from_yaml(
            r#"
cluster:
  defaultImage: quay.io/ceph/ceph:v17.2.6
retry:
  maxAttempts: 8
"#,
        )
        .unwrap();
        assert_eq!(config.cluster.default_image, "quay.io/ceph/ceph:v17.2.6");
        assert_eq!(config.cluster.monitor_count, 3);
        assert_eq!(config.retry.max_attempts, 8);
        assert_eq!(config.retry.initial_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert_matches!(
            OperatorConfig::from_yaml("cluster:\n  monitorCount: 0\n"),
            Err(Error::Configuration(_))
        );
        assert_matches!(
            OperatorConfig::from_yaml("retry:\n  maxAttempts: 0\n"),
            Err(Error::Configuration(_))
        );
        assert_matches!(
            OperatorConfig::from_yaml("retry:\n  randomizationFactor: 1.5\n"),
            Err(Error::Configuration(_))
        );
        assert_matches!(
            OperatorConfig::from_yaml("cluster:\n  dataDirHostPath: ''\n"),
            Err(Error::Configuration(_))
        );
        assert_matches!(OperatorConfig::from_yaml("cluster: [1, 2]"), Err(Error::Yaml(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cluster:\n  dataDirHostPath: /srv/rook\n  monitorCount: 5").unwrap();

        let config = OperatorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cluster.data_dir_host_path, "/srv/rook");
        assert_eq!(config.cluster.monitor_count, 5);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = OperatorConfig::from_file(dir.path().join("absent.yaml"));
        assert_matches!(result, Err(Error::Io(_)));
    }
}
