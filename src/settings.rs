//! Editor configuration.
//!
//! Priority: CLI overrides > `ERDEDIT__*` environment > config file > defaults.
//! Nested keys use `__` in the environment, e.g. `ERDEDIT__GATEWAY__BASE_URL`.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "./erdedit.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    MissingFile(String),
    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Canvas geometry used by the renderer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CanvasSettings {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    /// Where a table without a stored position is drawn.
    #[serde(default = "default_xy")]
    pub default_x: f64,
    #[serde(default = "default_xy")]
    pub default_y: f64,
    /// Fixed edge anchor, relative to a node's top-left corner.
    #[serde(default = "default_anchor_x")]
    pub anchor_x: f64,
    #[serde(default = "default_anchor_y")]
    pub anchor_y: f64,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            default_x: default_xy(),
            default_y: default_xy(),
            anchor_x: default_anchor_x(),
            anchor_y: default_anchor_y(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub canvas: CanvasSettings,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            gateway: GatewaySettings::default(),
            canvas: CanvasSettings::default(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_width() -> f64 {
    1200.0
}

fn default_height() -> f64 {
    600.0
}

fn default_xy() -> f64 {
    100.0
}

fn default_anchor_x() -> f64 {
    96.0
}

fn default_anchor_y() -> f64 {
    50.0
}

fn default_log_filter() -> String {
    "erdedit=info".to_string()
}

impl EditorConfig {
    /// Load from an explicit file, or `./erdedit.toml` when present, then
    /// layer the environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::MissingFile(path.display().to_string()));
                }
                builder = builder.add_source(File::from(path));
            }
            None => {
                if Path::new(DEFAULT_CONFIG_FILE).exists() {
                    builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("ERDEDIT")
                .prefix_separator("__")
                .separator("__"),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}
