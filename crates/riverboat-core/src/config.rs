//! Runtime configuration.
//!
//! Loaded from a TOML file (default `~/.riverboat/config.toml`). Every field
//! has a default, so a missing file or an empty table yields a working
//! configuration; only a file that exists but fails to parse is an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use riverboat_gen::GeneratorConfig;
use riverboat_security::ValidationLimits;
use riverboat_types::{Result, RiverboatError};

/// Durable-store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding all persisted records.
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: data_dir().join("storage"),
        }
    }
}

/// Pipeline execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Whole-pipeline deadline per request, in seconds.
    pub timeout_secs: u64,

    /// Whether completed packages are cached by request fingerprint.
    pub cache_enabled: bool,

    /// Cache entry lifetime in seconds.
    pub cache_ttl_secs: u64,

    /// Default record age used by retention purges, in days.
    pub retention_days: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            cache_enabled: true,
            cache_ttl_secs: 1800,
            retention_days: 30,
        }
    }
}

/// Workflow registry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Workflow definition file. When unset or missing, the built-in
    /// workflows are used.
    pub workflows_path: Option<PathBuf>,

    /// Workflow to activate at startup, overriding the definition file.
    pub active: Option<String>,
}

/// Top-level configuration for the pipeline and its collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverboatConfig {
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub generation: GeneratorConfig,
    pub limits: ValidationLimits,
    pub registry: RegistryConfig,
}

impl RiverboatConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults; an unreadable or unparsable file
    /// is an error.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file missing, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| RiverboatError::storage("config read", e))?;
        let config: Self = toml::from_str(&raw).map_err(|e| RiverboatError::ConfigInvalid {
            reason: format!("{}: {e}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// The default config file location, `~/.riverboat/config.toml`.
    pub fn default_path() -> PathBuf {
        data_dir().join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.timeout_secs == 0 {
            return Err(RiverboatError::ConfigInvalid {
                reason: "pipeline.timeout_secs must be greater than zero".into(),
            });
        }
        if self.pipeline.cache_enabled && self.pipeline.cache_ttl_secs == 0 {
            return Err(RiverboatError::ConfigInvalid {
                reason: "pipeline.cache_ttl_secs must be greater than zero when caching is enabled"
                    .into(),
            });
        }
        Ok(())
    }
}

/// Base directory for riverboat state, `~/.riverboat`.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".riverboat"))
        .unwrap_or_else(|| PathBuf::from(".riverboat"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = RiverboatConfig::default();
        assert_eq!(config.pipeline.timeout_secs, 300);
        assert_eq!(config.pipeline.cache_ttl_secs, 1800);
        assert!(config.pipeline.cache_enabled);
        assert_eq!(config.limits.max_attachments, 100);
        assert!(config.registry.workflows_path.is_none());
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RiverboatConfig::load(&dir.path().join("absent.toml"))
            .await
            .unwrap();
        assert_eq!(config.pipeline.timeout_secs, 300);
    }

    #[tokio::test]
    async fn partial_file_overrides_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let raw = r#"
[pipeline]
timeout_secs = 60

[generation]
model = "llama3"

[limits]
max_attachments = 5
"#;
        tokio::fs::write(&path, raw).await.unwrap();

        let config = RiverboatConfig::load(&path).await.unwrap();
        assert_eq!(config.pipeline.timeout_secs, 60);
        assert_eq!(config.pipeline.cache_ttl_secs, 1800);
        assert_eq!(config.generation.model, "llama3");
        assert_eq!(config.generation.base_url, "https://api.openai.com/v1");
        assert_eq!(config.limits.max_attachments, 5);
        assert_eq!(config.limits.max_file_bytes, 1024 * 1024);
    }

    #[tokio::test]
    async fn malformed_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "pipeline = [broken").await.unwrap();

        let err = RiverboatConfig::load(&path).await.unwrap_err();
        assert!(matches!(err, RiverboatError::ConfigInvalid { .. }));
    }

    #[tokio::test]
    async fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[pipeline]\ntimeout_secs = 0\n")
            .await
            .unwrap();

        let err = RiverboatConfig::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }
}
