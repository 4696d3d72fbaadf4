//! Configuration system for evalboard.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! log-folder config file -> explicit file -> environment.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    pub ui: UiConfig,
    pub sampling: SamplingConfig,
    pub slicing: SlicingConfig,
}

/// UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Color theme name.
    pub theme: String,
    /// Number of display columns views are laid out across.
    pub columns: usize,
    /// Whether the control sidebar starts visible.
    pub show_sidebar: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            columns: 2,
            show_sidebar: true,
        }
    }
}

/// Down-sampling limits applied while aggregating files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Maximum number of files drawn into one line plot.
    pub max_files: usize,
    /// Maximum number of points per histogram series.
    pub max_points: usize,
    /// Number of bins used when drawing histograms.
    pub histogram_bins: usize,
    /// Fixed RNG seed for reproducible sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_files: 1000,
            max_points: 1000,
            histogram_bins: 20,
            seed: None,
        }
    }
}

/// How the slice engine treats a filter whose column is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingColumnPolicy {
    /// The filter cannot match; the view is empty.
    #[default]
    NoMatch,
    /// The filter is a configuration error.
    Strict,
}

/// Slice engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlicingConfig {
    pub missing_column: MissingColumnPolicy,
}

/// Location of the user-level config file, if the platform has one.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "evalboard", "evalboard")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Location of the config file stored alongside the logs.
pub fn folder_config_path(log_folder: &Path) -> PathBuf {
    log_folder.join(".evalboard").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `EVALBOARD_`)
/// 2. Explicit config file (`--config`)
/// 3. Log-folder config (`<log_folder>/.evalboard/config.toml`)
/// 4. User config (`~/.config/evalboard/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    log_folder: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<BoardConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(BoardConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(folder) = log_folder {
        let folder_config = folder_config_path(folder);
        if folder_config.exists() {
            figment = figment.merge(Toml::file(&folder_config));
        }
    }

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    // EVALBOARD_SAMPLING__MAX_FILES, EVALBOARD_UI__THEME, etc.
    figment = figment.merge(Env::prefixed("EVALBOARD_").split("__"));

    figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}
