//! Resolving a [`ListConfig`] for the simulator.
//!
//! Sources, lowest to highest: built-in defaults, a TOML file, environment
//! variables, command line flags.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

use super::{ListConfig, NonDeterministicMode, TimingConfig, WindowCorrectionConfig};
use crate::model::{Dimension, Orientation};
use crate::viewability::EdgeThresholds;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "RECYCLIST_CONFIG";

/// Environment variable overriding the render-ahead distance.
pub const RENDER_AHEAD_ENV_VAR: &str = "RECYCLIST_RENDER_AHEAD";

/// Why a list configuration could not be loaded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configured location is unusable (e.g. an empty env var).
    #[error("unusable config location: {0}")]
    InvalidPath(String),

    /// The file exists but could not be read.
    #[error("cannot read list config {path}: {reason}")]
    ReadError {
        /// File that was read.
        path: PathBuf,
        /// I/O error message.
        reason: String,
    },

    /// The file is not valid TOML or has unknown keys.
    #[error("malformed list config {path}: {reason}")]
    ParseError {
        /// File that was parsed.
        path: PathBuf,
        /// Deserializer message.
        reason: String,
    },
}

/// On-disk form of [`ListConfig`]. Every key is optional; unknown keys are
/// rejected. Example `config.toml`:
///
/// ```toml
/// orientation = "vertical"
/// render_ahead_offset = 400.0
/// force_non_deterministic_rendering = true
/// preserve_visible_position = true
///
/// [edge_thresholds]
/// end_relative = 0.5
///
/// [timing]
/// refix_debounce_ms = 1000
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Scroll axis.
    #[serde(default)]
    pub orientation: Option<Orientation>,

    /// Look-ahead distance in pixels.
    #[serde(default)]
    pub render_ahead_offset: Option<f64>,

    /// Offset the list starts at.
    #[serde(default)]
    pub initial_offset: Option<f64>,

    /// Index the list starts at.
    #[serde(default)]
    pub initial_render_index: Option<usize>,

    /// Viewport assumed before the container reports one.
    #[serde(default)]
    pub layout_size: Option<Dimension>,

    /// Relayout on container resize after `layout_size` was given.
    #[serde(default)]
    pub can_change_size: Option<bool>,

    /// Unmount instead of recycling.
    #[serde(default)]
    pub disable_recycling: Option<bool>,

    /// Trust measured sizes over estimates.
    #[serde(default)]
    pub force_non_deterministic_rendering: Option<bool>,

    /// Where measured sizes come from.
    #[serde(default)]
    pub non_deterministic_mode: Option<NonDeterministicMode>,

    /// Keep the anchor item still across relayouts.
    #[serde(default)]
    pub preserve_visible_position: Option<bool>,

    /// Keep preserving the anchor near the start edge.
    #[serde(default)]
    pub start_edge_preserved: Option<bool>,

    /// Edge visibility distance in pixels.
    #[serde(default)]
    pub edge_visible_threshold: Option<f64>,

    /// Shift measured layouts across head inserts.
    #[serde(default)]
    pub shift_preserved_layouts: Option<bool>,

    /// Wait for a real size instead of failing on a zero viewport.
    #[serde(default)]
    pub suppress_bounded_size_exception: Option<bool>,

    /// Start/end reached thresholds.
    #[serde(default)]
    pub edge_thresholds: Option<EdgeThresholds>,

    /// Window correction section.
    #[serde(default)]
    pub window_correction: Option<WindowCorrectionConfig>,

    /// Timer cadence section.
    #[serde(default)]
    pub timing: Option<TimingConfig>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Everything the simulator needs after all sources were applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// List tunables.
    pub list: ListConfig,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            list: ListConfig::default(),
            log_file_path: default_log_path(),
        }
    }
}

/// `<state dir>/recyclist/recyclist.log`, or `recyclist.log` in the
/// working directory on platforms without a state dir.
pub fn default_log_path() -> PathBuf {
    dirs::state_dir()
        .map(|dir| dir.join("recyclist").join("recyclist.log"))
        .unwrap_or_else(|| PathBuf::from("recyclist.log"))
}

/// Read one config file. A missing file yields `Ok(None)`.
///
/// # Errors
///
/// [`ConfigError::ReadError`] or [`ConfigError::ParseError`] when the file
/// exists but is unusable.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(&path).map_err(|err| ConfigError::ReadError {
        path: path.clone(),
        reason: err.to_string(),
    })?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|err| ConfigError::ParseError {
            path,
            reason: err.to_string(),
        })
}

/// `<config dir>/recyclist/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("recyclist").join("config.toml"))
}

/// Find and read the config file: `config_path` (the `--config` flag) wins,
/// then `RECYCLIST_CONFIG`, then [`default_config_path`]. Only the first
/// location found is consulted.
///
/// # Errors
///
/// [`ConfigError::InvalidPath`] for an empty `RECYCLIST_CONFIG`, or the
/// errors of [`load_config_file`].
pub fn load_config_with_precedence(config_path: Option<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        if env_path.is_empty() {
            return Err(ConfigError::InvalidPath(format!("{CONFIG_ENV_VAR} is set but empty")));
        }
        return load_config_file(PathBuf::from(env_path));
    }

    match default_config_path() {
        Some(path) => load_config_file(path),
        None => Ok(None),
    }
}

/// Fill every field the file leaves out from [`ListConfig::default`].
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };
    let list = defaults.list;

    ResolvedConfig {
        list: ListConfig {
            orientation: config.orientation.unwrap_or(list.orientation),
            render_ahead_offset: config.render_ahead_offset.unwrap_or(list.render_ahead_offset),
            initial_offset: config.initial_offset.unwrap_or(list.initial_offset),
            initial_render_index: config.initial_render_index.or(list.initial_render_index),
            layout_size: config.layout_size.or(list.layout_size),
            can_change_size: config.can_change_size.unwrap_or(list.can_change_size),
            disable_recycling: config.disable_recycling.unwrap_or(list.disable_recycling),
            force_non_deterministic_rendering: config
                .force_non_deterministic_rendering
                .unwrap_or(list.force_non_deterministic_rendering),
            non_deterministic_mode: config.non_deterministic_mode.unwrap_or(list.non_deterministic_mode),
            preserve_visible_position: config
                .preserve_visible_position
                .unwrap_or(list.preserve_visible_position),
            start_edge_preserved: config.start_edge_preserved.unwrap_or(list.start_edge_preserved),
            edge_visible_threshold: config.edge_visible_threshold.unwrap_or(list.edge_visible_threshold),
            shift_preserved_layouts: config.shift_preserved_layouts.unwrap_or(list.shift_preserved_layouts),
            edge_thresholds: config.edge_thresholds.unwrap_or(list.edge_thresholds),
            window_correction: config.window_correction.unwrap_or(list.window_correction),
            suppress_bounded_size_exception: config
                .suppress_bounded_size_exception
                .unwrap_or(list.suppress_bounded_size_exception),
            timing: config.timing.unwrap_or(list.timing),
        },
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply `RECYCLIST_RENDER_AHEAD` (pixels). Unparseable values are logged
/// and ignored.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(raw) = std::env::var(RENDER_AHEAD_ENV_VAR) {
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => config.list.render_ahead_offset = value,
            _ => warn!(value = %raw, "ignoring invalid {RENDER_AHEAD_ENV_VAR}"),
        }
    }

    config
}

/// Apply command line flags. `None` means the flag was not given and the
/// value from lower sources stays.
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    render_ahead_override: Option<f64>,
    orientation_override: Option<Orientation>,
    non_deterministic_override: Option<bool>,
    preserve_position_override: Option<bool>,
) -> ResolvedConfig {
    if let Some(render_ahead) = render_ahead_override {
        config.list.render_ahead_offset = render_ahead;
    }

    if let Some(orientation) = orientation_override {
        config.list.orientation = orientation;
    }

    if let Some(non_deterministic) = non_deterministic_override {
        config.list.force_non_deterministic_rendering = non_deterministic;
    }

    if let Some(preserve) = preserve_position_override {
        config.list.preserve_visible_position = preserve;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
