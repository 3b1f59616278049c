//! Visible and engaged window tracking.
//!
//! The tracker converts a scroll offset into two index sets: the items
//! intersecting the viewport (visible) and the items intersecting the
//! viewport widened by the render-ahead distance (engaged). Layouts are
//! borrowed for each call and never retained, so the layout manager stays
//! the single owner of geometry.
//!
//! Refits start from the previous first visible index and walk outward,
//! stopping as soon as they leave the located region. A fresh fit (first
//! frame, forced refresh) locates its starting point by binary search.

use tracing::trace;

use super::window::{IndexDiff, VisibilityWindow, WindowChange};
use crate::model::{Layout, Orientation, WindowCorrection};

/// Bias added to the window start when binary searching for the first
/// visible item, so an item ending exactly at the start is skipped.
const FIT_SEARCH_BIAS: f64 = 0.0001;

/// Bias used when looking for the first logically visible item.
const LOGICAL_SEARCH_BIAS: f64 = 0.001;

/// Tracks which indexes are visible and engaged for the current offset.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityTracker {
    orientation: Orientation,
    window_bound: f64,
    current_offset: f64,
    actual_offset: f64,
    max_offset: f64,
    render_ahead_offset: f64,
    visible_window: VisibilityWindow,
    engaged_window: VisibilityWindow,
    visible_indexes: Vec<usize>,
    engaged_indexes: Vec<usize>,
}

impl VisibilityTracker {
    /// Create a tracker starting at `initial_offset` (clamped at zero).
    pub fn new(orientation: Orientation, render_ahead_offset: f64, initial_offset: f64) -> Self {
        Self {
            orientation,
            window_bound: 0.0,
            current_offset: initial_offset.max(0.0),
            actual_offset: 0.0,
            max_offset: 0.0,
            render_ahead_offset: render_ahead_offset.max(0.0),
            visible_window: VisibilityWindow::default(),
            engaged_window: VisibilityWindow::default(),
            visible_indexes: Vec::new(),
            engaged_indexes: Vec::new(),
        }
    }

    /// Update viewport and content extents along the scroll axis.
    pub fn set_dimensions(&mut self, viewport_main: f64, content_main: f64) {
        self.window_bound = viewport_main;
        self.max_offset = content_main - viewport_main;
    }

    /// Switch the scroll axis. Takes effect at the next refit.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// First fit at the current offset.
    pub fn init(&mut self, correction: &WindowCorrection, layouts: &[Layout]) -> Option<WindowChange> {
        self.initial_fit(self.current_offset, correction, layouts)
    }

    /// Move to `offset`. Physical (`is_actual`) offsets are corrected and
    /// clamped into the logical range first. Returns what changed.
    pub fn update_offset(
        &mut self,
        offset: f64,
        is_actual: bool,
        correction: &WindowCorrection,
        layouts: &[Layout],
    ) -> Option<WindowChange> {
        let mut corrected = offset;
        if is_actual {
            self.actual_offset = offset;
            corrected = (offset + correction.start_total()).max(0.0).min(self.max_offset.max(0.0));
        }
        if self.current_offset == corrected {
            return None;
        }
        self.current_offset = corrected;
        self.update_tracking_windows(offset, correction);
        let start = self.visible_indexes.first().copied().unwrap_or(0);
        self.fit_and_update(start, layouts)
    }

    /// Refit at the current offset after layouts changed.
    ///
    /// Returns the change plus whether the host must scroll back because the
    /// content shrank under the offset.
    pub fn force_refresh(&mut self, layouts: &[Layout]) -> (bool, Option<WindowChange>) {
        let should_force_scroll =
            self.actual_offset >= 0.0 && self.current_offset >= self.max_offset - self.window_bound;
        let change = self.force_refresh_with_offset(self.current_offset, layouts);
        (should_force_scroll, change)
    }

    /// Refit from scratch at `offset`.
    pub fn force_refresh_with_offset(&mut self, offset: f64, layouts: &[Layout]) -> Option<WindowChange> {
        self.initial_fit(offset, &WindowCorrection::default(), layouts)
    }

    /// Change the render-ahead distance (clamped at zero) and refit.
    pub fn update_render_ahead_offset(&mut self, value: f64, layouts: &[Layout]) -> Option<WindowChange> {
        self.render_ahead_offset = value.max(0.0);
        self.force_refresh_with_offset(self.current_offset, layouts)
    }

    /// Move every tracked offset by `delta` after a refix.
    pub fn shift(&mut self, delta: f64) {
        self.current_offset += delta;
        self.max_offset += delta;
        self.actual_offset += delta;
        self.visible_window.shift(delta);
        self.engaged_window.shift(delta);
    }

    /// First index whose row intersects the visible window start.
    ///
    /// Walks back over items sharing the same main-axis position, so in a
    /// grid the first item of the row is returned.
    pub fn find_first_logically_visible_index(&self, layouts: &[Layout]) -> usize {
        let relevant = self.first_visible_by_search(layouts, LOGICAL_SEARCH_BIAS);
        let Some(anchor) = layouts.get(relevant) else {
            return relevant;
        };
        let main = self.orientation.main_pos(anchor);
        let mut result = relevant;
        for i in (0..relevant).rev() {
            if self.orientation.main_pos(&layouts[i]) != main {
                break;
            }
            result = i;
        }
        result
    }

    /// Logical offset of the last update.
    pub fn last_offset(&self) -> f64 {
        self.current_offset
    }

    /// Physical offset last reported by the scroll container.
    pub fn last_actual_offset(&self) -> f64 {
        self.actual_offset
    }

    /// Largest logical offset.
    pub fn max_offset(&self) -> f64 {
        self.max_offset
    }

    /// Current render-ahead distance.
    pub fn render_ahead_offset(&self) -> f64 {
        self.render_ahead_offset
    }

    /// Visible indexes, ascending.
    pub fn visible_indexes(&self) -> &[usize] {
        &self.visible_indexes
    }

    /// Engaged indexes, ascending.
    pub fn engaged_indexes(&self) -> &[usize] {
        &self.engaged_indexes
    }

    /// Current visible window.
    pub fn visible_window(&self) -> VisibilityWindow {
        self.visible_window
    }

    /// Current engaged window.
    pub fn engaged_window(&self) -> VisibilityWindow {
        self.engaged_window
    }

    fn initial_fit(
        &mut self,
        offset: f64,
        correction: &WindowCorrection,
        layouts: &[Layout],
    ) -> Option<WindowChange> {
        let offset = offset.max(0.0).min(self.max_offset.max(0.0));
        self.current_offset = offset;
        self.update_tracking_windows(offset, correction);
        let first = self.first_visible_by_search(layouts, FIT_SEARCH_BIAS);
        self.fit_and_update(first, layouts)
    }

    fn update_tracking_windows(&mut self, offset: f64, correction: &WindowCorrection) {
        let start = offset + correction.start_total();
        let end = offset + self.window_bound + correction.end_total();
        self.engaged_window = VisibilityWindow::new(
            (start - self.render_ahead_offset).max(0.0),
            end + self.render_ahead_offset,
        );
        self.visible_window = VisibilityWindow::new(start, end);
    }

    /// First index whose end lies past the window start plus `bias`.
    fn first_visible_by_search(&self, layouts: &[Layout], bias: f64) -> usize {
        let threshold = self.visible_window.start + bias;
        let found = layouts.partition_point(|l| self.orientation.main_bounds(l).1 < threshold);
        found.min(layouts.len().saturating_sub(1))
    }

    fn fit_and_update(&mut self, start: usize, layouts: &[Layout]) -> Option<WindowChange> {
        let mut visible = Vec::new();
        let mut engaged = Vec::new();
        self.fit_indexes(layouts, start, true, &mut visible, &mut engaged);
        self.fit_indexes(layouts, start + 1, false, &mut visible, &mut engaged);
        visible.sort_unstable();
        engaged.sort_unstable();

        let change = WindowChange {
            visible: IndexDiff::between(&self.visible_indexes, &visible),
            engaged: IndexDiff::between(&self.engaged_indexes, &engaged),
        };
        self.visible_indexes = visible;
        self.engaged_indexes = engaged;
        if change.is_empty() {
            return None;
        }
        trace!(
            visible = ?self.visible_indexes,
            engaged = ?self.engaged_indexes,
            "window changed"
        );
        Some(change)
    }

    fn fit_indexes(
        &self,
        layouts: &[Layout],
        start: usize,
        reverse: bool,
        visible: &mut Vec<usize>,
        engaged: &mut Vec<usize>,
    ) {
        if start >= layouts.len() {
            return;
        }
        let mut located = false;
        let mut check = |index: usize| -> bool {
            let (item_start, item_end) = self.orientation.main_bounds(&layouts[index]);
            let mut found = false;
            if self.visible_window.intersects(item_start, item_end) {
                visible.push(index);
                found = true;
            }
            if self.engaged_window.intersects(item_start, item_end) {
                engaged.push(index);
                found = true;
            }
            found
        };
        if reverse {
            for index in (0..=start).rev() {
                if check(index) {
                    located = true;
                } else if located {
                    break;
                }
            }
        } else {
            for index in start..layouts.len() {
                if check(index) {
                    located = true;
                } else if located {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
