//! Configuration file handling for veo-scene.
//!
//! Loads configuration from `<config dir>/veo-scene/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::veo::{PollPolicy, DEFAULT_MODEL, VEO_API_BASE_URL};

/// Configuration file structure for veo-scene.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_attempts: None,
            timeout_secs: None,
        }
    }
}

impl PollingConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.interval_secs),
            max_attempts: self.max_attempts,
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct SceneConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub reference_image: Option<PathBuf>,
    /// Overrides the MIME type guessed from the image extension.
    #[serde(default)]
    pub image_mime_type: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_base_url() -> String {
    VEO_API_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_interval_secs() -> u64 {
    10
}

fn default_output_path() -> PathBuf {
    PathBuf::from("scene.html")
}

/// Written by `config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# veo-scene configuration

[api]
# base_url = "https://generativelanguage.googleapis.com"
# model = "veo-2.0-generate-001"

[polling]
# Seconds between status checks
interval_secs = 10
# Give up after this many status checks (unset = never)
# max_attempts = 60
# Give up after this many seconds (unset = never)
# timeout_secs = 900

[scene]
# title = "Story Scene 1"
# prompt = "A tiger runs through the jungle"
# reference_image = "/path/to/reference.jpg"
# image_mime_type = "image/jpeg"

[output]
# path = "scene.html"
"#;

const CONFIG_DIR_NAME: &str = "veo-scene";
const CONFIG_FILE_NAME: &str = "config.toml";

impl Config {
    /// Read `path`, or the default location when `None`.
    ///
    /// A missing file yields `Config::default()`; any other read failure or
    /// malformed TOML is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map_or_else(default_path, Path::to_path_buf);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config file at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }
}

/// Why a config file could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// `<platform config dir>/veo-scene/config.toml`, relative to the working
/// directory when the platform has no config dir.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_default()
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}
