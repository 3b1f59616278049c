//! Configuration module.
//!
//! [`ListConfig`] enumerates every tunable of a list. The [`loader`]
//! submodule resolves it from a TOML file, environment variables and CLI
//! flags for the simulator binary.

pub mod loader;

pub use loader::{ConfigError, ConfigFile, ResolvedConfig};

use serde::{Deserialize, Serialize};

use crate::model::{Dimension, Orientation, WindowCorrection};
use crate::schedule::Millis;
use crate::viewability::EdgeThresholds;

/// How measured sizes reach the layout manager when rendering is non deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonDeterministicMode {
    /// Each mounted item reports its own size.
    #[default]
    Normal,
    /// The content container reports sizes and offsets of all rendered items in one batch.
    AutoLayout,
}

/// Window correction and where it applies.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowCorrectionConfig {
    /// Correction between physical and logical offsets.
    pub value: WindowCorrection,
    /// Subtract the window shift from the initial offset.
    pub apply_to_initial_offset: bool,
    /// Subtract the window shift from scroll-to-index targets.
    pub apply_to_item_scroll: bool,
}

/// Timer cadence of the list, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Minimum interval between processed scroll samples.
    pub scroll_throttle_ms: Millis,
    /// Quiet period before a refix runs.
    pub refix_debounce_ms: Millis,
    /// Delay before a refix is flushed while an edge is visible.
    pub edge_flush_ms: Millis,
    /// How often an animated scroll-to checks whether it landed.
    pub hold_poll_ms: Millis,
    /// Delay between landing and releasing the held index.
    pub hold_release_ms: Millis,
    /// Debounce of render stack commits.
    pub render_commit_ms: Millis,
    /// Debounce of state refreshes (relayout requests).
    pub state_refresh_ms: Millis,
    /// Distance in pixels under which a scroll-to counts as landed.
    pub hold_tolerance_px: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            scroll_throttle_ms: 6,
            refix_debounce_ms: 1500,
            edge_flush_ms: 100,
            hold_poll_ms: 48,
            hold_release_ms: 150,
            render_commit_ms: 0,
            state_refresh_ms: 0,
            hold_tolerance_px: 1.0,
        }
    }
}

/// Every tunable of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListConfig {
    /// Scroll axis.
    pub orientation: Orientation,
    /// Look-ahead distance rendered beyond the viewport, in pixels.
    pub render_ahead_offset: f64,
    /// Offset the list starts at.
    pub initial_offset: f64,
    /// Index the list starts at; preferred over `initial_offset`.
    pub initial_render_index: Option<usize>,
    /// Viewport assumed before the container reports one.
    pub layout_size: Option<Dimension>,
    /// Relayout when the container reports a new size after `layout_size` was given.
    pub can_change_size: bool,
    /// Unmount disengaged items instead of recycling them.
    pub disable_recycling: bool,
    /// Trust measured sizes over estimates.
    pub force_non_deterministic_rendering: bool,
    /// Where measured sizes come from.
    pub non_deterministic_mode: NonDeterministicMode,
    /// Keep the anchor item still across relayouts.
    pub preserve_visible_position: bool,
    /// Keep preserving the anchor near the start edge instead of pinning index 0.
    pub start_edge_preserved: bool,
    /// Distance from an edge within which it counts as visible, in pixels.
    pub edge_visible_threshold: f64,
    /// Keep measured layouts across head inserts by shifting them.
    pub shift_preserved_layouts: bool,
    /// Start/end reached thresholds.
    pub edge_thresholds: EdgeThresholds,
    /// Window correction.
    pub window_correction: WindowCorrectionConfig,
    /// Wait for a real size instead of failing on a zero viewport.
    pub suppress_bounded_size_exception: bool,
    /// Timer cadence.
    pub timing: TimingConfig,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Vertical,
            render_ahead_offset: 250.0,
            initial_offset: 0.0,
            initial_render_index: None,
            layout_size: None,
            can_change_size: false,
            disable_recycling: false,
            force_non_deterministic_rendering: false,
            non_deterministic_mode: NonDeterministicMode::Normal,
            preserve_visible_position: false,
            start_edge_preserved: false,
            edge_visible_threshold: 20.0,
            shift_preserved_layouts: true,
            edge_thresholds: EdgeThresholds::default(),
            window_correction: WindowCorrectionConfig::default(),
            suppress_bounded_size_exception: false,
            timing: TimingConfig::default(),
        }
    }
}

impl ListConfig {
    /// True when sizes arrive in auto-layout batches.
    pub fn is_auto_layout(&self) -> bool {
        self.force_non_deterministic_rendering
            && self.non_deterministic_mode == NonDeterministicMode::AutoLayout
    }
}
