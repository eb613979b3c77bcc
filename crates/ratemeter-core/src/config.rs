use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::estimator::MAX_WINDOW;

/// Errors raised while locating, reading or validating `config.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot resolve XDG directories: {0}")]
    Xdg(#[from] xdg::BaseDirectoriesError),
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialise default config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// When to draw the status line on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// Only when stderr is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

/// Global configuration loaded from `~/.config/ratemeter/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterConfig {
    /// Trailing throughput window in milliseconds (rounded down to 100 ms).
    pub window_ms: u64,
    /// Status line display mode.
    #[serde(default)]
    pub progress: ProgressMode,
    /// Largest single read/write handed to the wrapped stream (None = 1 MiB).
    #[serde(default)]
    pub chunk_limit_bytes: Option<usize>,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            window_ms: 5_000,
            progress: ProgressMode::Auto,
            chunk_limit_bytes: None,
        }
    }
}

impl MeterConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Reject values the estimator or the stream wrappers cannot honour.
    /// Short windows are fine; the estimator raises them to one bucket.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window() > MAX_WINDOW {
            return Err(ConfigError::Invalid {
                field: "window_ms",
                reason: format!("must be at most {}", MAX_WINDOW.as_millis()),
            });
        }
        if self.chunk_limit_bytes == Some(0) {
            return Err(ConfigError::Invalid {
                field: "chunk_limit_bytes",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ratemeter")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MeterConfig, ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MeterConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load and validate configuration from `path`.
pub fn load_from_path(path: &Path) -> Result<MeterConfig, ConfigError> {
    let data = fs::read_to_string(path)?;
    let cfg: MeterConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}
