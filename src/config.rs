//! Configuration module
//!
//! Handles loading and parsing of the mesh layer configuration from files and
//! environment variables.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/alexandria.toml";

/// Lowest accepted tick rate in milliseconds
pub const MIN_TICK_RATE_MS: u64 = 1;

/// Highest accepted tick rate in milliseconds
pub const MAX_TICK_RATE_MS: u64 = 1000;

/// Longest accepted team prefix
pub const MAX_TEAM_PREFIX_LEN: usize = 16;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlexandriaConfig {
    /// Path the configuration was loaded from
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Game tick rate in milliseconds (one visibility refresh per tick)
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,

    /// Log every packet the demo host would send
    #[serde(default)]
    pub debug: bool,

    /// Mesh settings
    #[serde(default)]
    pub mesh: MeshSettings,
}

/// Settings shared by every mesh of a registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSettings {
    /// Vertical distance between an interpolated mesh's transform and its
    /// body entity's feet
    #[serde(default = "default_interpolated_y_offset")]
    pub interpolated_y_offset: f64,

    /// Same as `interpolated_y_offset`, for meshes riding a carrier
    #[serde(default = "default_non_interpolated_y_offset")]
    pub non_interpolated_y_offset: f64,

    /// Prefix of the highlight team names, followed by the color name
    #[serde(default = "default_team_prefix")]
    pub team_prefix: String,
}

fn default_tick_rate() -> u64 {
    50 // 20 ticks per second
}

fn default_interpolated_y_offset() -> f64 {
    1.45
}

fn default_non_interpolated_y_offset() -> f64 {
    1.82
}

fn default_team_prefix() -> String {
    "alexandria_".to_string()
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            interpolated_y_offset: default_interpolated_y_offset(),
            non_interpolated_y_offset: default_non_interpolated_y_offset(),
            team_prefix: default_team_prefix(),
        }
    }
}

impl MeshSettings {
    /// Vertical offset for the given variant
    pub fn y_offset(&self, interpolated: bool) -> f64 {
        if interpolated {
            self.interpolated_y_offset
        } else {
            self.non_interpolated_y_offset
        }
    }
}

impl Default for AlexandriaConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            tick_rate_ms: default_tick_rate(),
            debug: false,
            mesh: MeshSettings::default(),
        }
    }
}

impl AlexandriaConfig {
    /// Load configuration from file and environment variables
    pub async fn load() -> Result<Self> {
        let config_path = env::var("ALEXANDRIA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: config_path.display().to_string(),
                    source,
                })?;
            Self::from_toml_str(&content, &config_path)?
        } else {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.config_path = config_path;
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML text, without env overrides
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("ALEXANDRIA_TICK_RATE_MS") {
            if let Ok(rate) = val.parse() {
                self.tick_rate_ms = rate;
            }
        }
        if let Ok(val) = env::var("ALEXANDRIA_DEBUG") {
            self.debug = val.to_lowercase() == "true" || val == "1";
        }
        if let Ok(val) = env::var("ALEXANDRIA_TEAM_PREFIX") {
            self.mesh.team_prefix = val;
        }
        if let Ok(val) = env::var("ALEXANDRIA_INTERPOLATED_Y_OFFSET") {
            if let Ok(offset) = val.parse() {
                self.mesh.interpolated_y_offset = offset;
            }
        }
        if let Ok(val) = env::var("ALEXANDRIA_NON_INTERPOLATED_Y_OFFSET") {
            if let Ok(offset) = val.parse() {
                self.mesh.non_interpolated_y_offset = offset;
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(MIN_TICK_RATE_MS..=MAX_TICK_RATE_MS).contains(&self.tick_rate_ms) {
            return Err(ConfigError::InvalidTickRate {
                min: MIN_TICK_RATE_MS,
                max: MAX_TICK_RATE_MS,
                actual: self.tick_rate_ms,
            }
            .into());
        }

        let prefix_len = self.mesh.team_prefix.chars().count();
        if prefix_len == 0 || prefix_len > MAX_TEAM_PREFIX_LEN {
            return Err(ConfigError::InvalidTeamPrefix {
                max: MAX_TEAM_PREFIX_LEN,
                actual: prefix_len,
            }
            .into());
        }

        if !self.mesh.interpolated_y_offset.is_finite() {
            return Err(ConfigError::InvalidOffset {
                field: "interpolated_y_offset",
            }
            .into());
        }
        if !self.mesh.non_interpolated_y_offset.is_finite() {
            return Err(ConfigError::InvalidOffset {
                field: "non_interpolated_y_offset",
            }
            .into());
        }

        Ok(())
    }

    /// Tick interval as a duration
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_rate_ms)
    }
}
