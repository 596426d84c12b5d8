//! CLI command implementations for `riverboat`.
//!
//! Each subcommand is implemented in its own module:
//!
//! - [`process`] -- Run a task envelope file through the pipeline.
//! - [`records`] -- Durable-store listings, inspection, purge, and stats.
//! - [`status`] -- Configuration and storage diagnostics.
//! - [`workflows`] -- Workflow listing, activation, and reload.

pub mod process;
pub mod records;
pub mod status;
pub mod workflows;

use std::path::PathBuf;

use tracing::debug;

use riverboat_core::{Riverboat, RiverboatConfig};

/// Resolve the config file path from the override or the default location.
pub fn config_path(config_override: Option<&str>) -> PathBuf {
    config_override
        .map(PathBuf::from)
        .unwrap_or_else(RiverboatConfig::default_path)
}

/// Load configuration from the given path override or the default location.
///
/// An explicitly named file must exist; the default location may be absent,
/// in which case the built-in defaults apply.
pub async fn load_config(config_override: Option<&str>) -> anyhow::Result<RiverboatConfig> {
    let path = config_path(config_override);
    if config_override.is_some() && !path.exists() {
        anyhow::bail!("config file not found: {}", path.display());
    }
    debug!(path = %path.display(), "loading config");
    Ok(RiverboatConfig::load(&path).await?)
}

/// Build the pipeline from resolved configuration.
pub async fn build_pipeline(config_override: Option<&str>) -> anyhow::Result<Riverboat> {
    let config = load_config(config_override).await?;
    Ok(Riverboat::new(config).await?)
}

/// Format a timestamp for display.
pub fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Human-readable byte size.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    }
}
