//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/covtree/covtree.toml`
//! 3. Local config: `--config <file>`, or `./covtree.toml` if present
//! 4. Environment variables: `COVTREE_*` prefix (`COVTREE_TIMELINE__START` for nested keys)

use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{MetricView, MonthKey, WORLD};

/// File name of the local config, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "covtree.toml";

/// Months shown by `series` when no explicit range is given.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimelineConfig {
    /// First month (default: first month in the data)
    pub start: Option<MonthKey>,
    /// Last month (default: last month in the data)
    pub end: Option<MonthKey>,
}

/// Unified configuration for covtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// CSV produced by the ETL step
    pub data_file: Option<PathBuf>,
    /// Region queried when none is given (default: World)
    pub region: String,
    /// Metric view queried when none is given (default: cases)
    pub view: MetricView,
    /// Number of rows shown by `snapshot` (default: all)
    pub top: Option<usize>,
    /// Default month range for `series`
    pub timeline: TimelineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: None,
            region: WORLD.to_string(),
            view: MetricView::default(),
            top: None,
            timeline: TimelineConfig::default(),
        }
    }
}

/// Raw timeline for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawTimelineConfig {
    pub start: Option<MonthKey>,
    pub end: Option<MonthKey>,
}

/// Raw settings for intermediate parsing (every field optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub region: Option<String>,
    pub view: Option<MetricView>,
    pub top: Option<usize>,
    pub timeline: RawTimelineConfig,
}

/// Get the XDG config directory for covtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "covtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("covtree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> Result<T, ApplicationError>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ApplicationError::Config {
        message: format!("COVTREE_{}: {}", key.to_uppercase().replace('.', "__"), e),
    })
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay.data_file.clone().or_else(|| self.data_file.clone()),
            region: overlay.region.clone().unwrap_or_else(|| self.region.clone()),
            view: overlay.view.unwrap_or(self.view),
            top: overlay.top.or(self.top),
            timeline: TimelineConfig {
                start: overlay.timeline.start.or(self.timeline.start),
                end: overlay.timeline.end.or(self.timeline.end),
            },
        }
    }

    /// Expand `~`, `$VAR` and `${VAR}` in the data path.
    fn expand_paths(&mut self) {
        if let Some(path) = &self.data_file {
            let raw = path.to_string_lossy();
            let expanded = shellexpand::full(raw.as_ref())
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            self.data_file = Some(PathBuf::from(expanded));
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Explicit local config file; must exist when given.
    ///   Without it `./covtree.toml` is used if present.
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), local)
    }

    /// Load with an explicit global config path (no XDG lookup).
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                current = current.merge_with(&load_raw_settings(global_path)?);
            }
        }

        // 3. Local config
        match local {
            Some(path) if !path.exists() => {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            Some(path) => {
                debug!("local config: {}", path.display());
                current = current.merge_with(&load_raw_settings(path)?);
            }
            None => {
                let implicit = Path::new(LOCAL_CONFIG_FILE);
                if implicit.exists() {
                    debug!("local config: {}", implicit.display());
                    current = current.merge_with(&load_raw_settings(implicit)?);
                }
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply COVTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("COVTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("region") {
            settings.region = val;
        }
        if let Ok(val) = config.get_string("view") {
            settings.view = parse_env("view", &val)?;
        }
        if let Ok(val) = config.get_string("top") {
            settings.top = Some(parse_env("top", &val)?);
        }
        if let Ok(val) = config.get_string("timeline.start") {
            settings.timeline.start = Some(parse_env("timeline.start", &val)?);
        }
        if let Ok(val) = config.get_string("timeline.end") {
            settings.timeline.end = Some(parse_env("timeline.end", &val)?);
        }

        Ok(settings)
    }

    /// The data file, or an error telling the user how to set it.
    pub fn require_data_file(&self) -> ApplicationResult<&Path> {
        self.data_file.as_deref().ok_or(ApplicationError::NoDataFile)
    }

    /// Render as TOML, for `config show`.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}
