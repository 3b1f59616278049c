//! Wrapping grid layout.
//!
//! Items are placed along the cross axis until the next one would overflow
//! the viewport's cross size, then a new row (column, when horizontal)
//! starts below the tallest item of the previous one. A single column list
//! is the degenerate case where every item fills the cross axis.
//!
//! # Complexity
//!
//! - `relayout_from_index`: O(n - start), O(n) when an anchor shift applies
//! - `offset_for_index`, `override_layout`: O(1)
//! - `shift_layouts`, `remove_layout`: O(n)

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::anchor::{choose_fix_index, AnchorWindow};
use super::refix::{realign, RefixOutcome, RefixRequest};
use super::{LayoutManager, RenderedLayout};
use crate::model::{Dimension, ItemType, Layout, LayoutTypeProvider, Orientation, Point, RecyclerError};

/// Slack allowed before an item is considered to overflow the cross axis.
const WRAP_TOLERANCE: f64 = 0.9;

/// Divergence (px) below which rendered geometry counts as consistent.
const CONSISTENCY_TOLERANCE: f64 = 1.0;

/// Wrapping grid implementation of [`LayoutManager`].
pub struct WrapGridLayoutManager {
    provider: Rc<dyn LayoutTypeProvider>,
    window: Dimension,
    orientation: Orientation,
    layouts: Vec<Layout>,
    total_main: f64,
    total_cross: f64,
    fix_index: Option<usize>,
    pending_fix_main: Option<f64>,
    holding_index: bool,
    pending_relayout: bool,
}

impl fmt::Debug for WrapGridLayoutManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapGridLayoutManager")
            .field("window", &self.window)
            .field("orientation", &self.orientation)
            .field("layouts", &self.layouts.len())
            .field("total_main", &self.total_main)
            .field("fix_index", &self.fix_index)
            .field("pending_fix_main", &self.pending_fix_main)
            .field("holding_index", &self.holding_index)
            .field("pending_relayout", &self.pending_relayout)
            .finish_non_exhaustive()
    }
}

impl WrapGridLayoutManager {
    /// Create an empty manager for a viewport.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::rc::Rc;
    /// use recyclist::layout::{LayoutManager, WrapGridLayoutManager};
    /// use recyclist::model::{Dimension, LayoutProvider, Orientation};
    ///
    /// let provider = Rc::new(LayoutProvider::uniform(Dimension::new(100.0, 50.0)));
    /// let mut manager =
    ///     WrapGridLayoutManager::new(provider, Dimension::new(300.0, 500.0), Orientation::Vertical);
    /// manager.relayout_from_index(0, 7).unwrap();
    ///
    /// // Three items per row, three rows.
    /// assert_eq!(manager.layouts()[3].y, 50.0);
    /// assert_eq!(manager.content_dimension(), Dimension::new(300.0, 150.0));
    /// ```
    pub fn new(provider: Rc<dyn LayoutTypeProvider>, window: Dimension, orientation: Orientation) -> Self {
        Self {
            provider,
            window,
            orientation,
            layouts: Vec::new(),
            total_main: 0.0,
            total_cross: 0.0,
            fix_index: None,
            pending_fix_main: None,
            holding_index: false,
            pending_relayout: false,
        }
    }

    /// Seed the manager with layouts from a predecessor or a restored cache.
    ///
    /// Measured sizes in the seed are trusted by the next relayout.
    pub fn with_cached_layouts(mut self, layouts: Vec<Layout>) -> Self {
        self.layouts = layouts;
        self
    }

    fn resolve_dimension(&self, index: usize) -> Result<(Dimension, ItemType, bool), RecyclerError> {
        let item_type = self
            .provider
            .type_for_index(index)
            .ok_or(RecyclerError::InvalidItemType { index })?;
        let (size, measured) = match self.layouts.get(index) {
            Some(old) if old.is_overridden && old.item_type == item_type => (old.size(), true),
            _ => (self.provider.estimate_for(item_type, index), false),
        };
        let o = self.orientation;
        let cross = o.cross(size).min(o.cross(self.window));
        Ok((o.dimension(o.main(size), cross), item_type, measured))
    }

    /// Start of the row holding `start - 1`; relayout must begin there.
    fn locate_first_neighbour_index(&self, start: usize) -> usize {
        if start == 0 {
            return 0;
        }
        (0..start)
            .rev()
            .find(|&i| {
                self.layouts
                    .get(i)
                    .is_some_and(|l| self.orientation.cross_pos(l) == 0.0)
            })
            .unwrap_or(0)
    }

    /// Target main offset for the fix index, when it must stay in place.
    fn anchor_target(&mut self, start: usize, item_count: usize) -> Option<(usize, f64)> {
        let pending = self.pending_fix_main.take();
        let fix = self.fix_index.filter(|&fix| fix < item_count && start <= fix)?;
        let target = pending.or_else(|| self.layouts.get(fix).map(|l| self.orientation.main_pos(l)))?;
        Some((fix, target))
    }

    fn shift_all(&mut self, delta: f64) {
        let o = self.orientation;
        for layout in &mut self.layouts {
            let moved = o.main_pos(layout) + delta;
            o.set_main_pos(layout, moved);
        }
        self.total_main += delta;
    }
}

impl LayoutManager for WrapGridLayoutManager {
    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn window_size(&self) -> Dimension {
        self.window
    }

    fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    fn take_layouts(&mut self) -> Vec<Layout> {
        self.total_main = 0.0;
        std::mem::take(&mut self.layouts)
    }

    fn content_dimension(&self) -> Dimension {
        self.orientation.dimension(self.total_main, self.total_cross)
    }

    fn offset_for_index(&self, index: usize) -> Result<Point, RecyclerError> {
        self.layouts
            .get(index)
            .map(Layout::origin)
            .ok_or(RecyclerError::LayoutUnavailable {
                index,
                laid_out: self.layouts.len(),
            })
    }

    fn relayout_from_index(&mut self, start: usize, item_count: usize) -> Result<(), RecyclerError> {
        self.pending_relayout = false;

        let mut start = start;
        if self.pending_fix_main.is_some() {
            if let Some(fix) = self.fix_index {
                start = start.min(fix);
            }
        }
        let old_count = self.layouts.len();
        let start = self.locate_first_neighbour_index(start.min(old_count).min(item_count));
        let anchor = self.anchor_target(start, item_count);

        let o = self.orientation;
        let window_cross = o.cross(self.window);
        let (mut main, mut cross) = match self.layouts.get(start) {
            Some(entry) => (o.main_pos(entry), o.cross_pos(entry)),
            None => (0.0, 0.0),
        };
        self.total_main = main;
        let mut max_bound: f64 = 0.0;

        for index in start..item_count {
            let (size, item_type, measured) = self.resolve_dimension(index)?;
            let (item_main, item_cross) = (o.main(size), o.cross(size));

            if cross + item_cross > window_cross + WRAP_TOLERANCE {
                main += max_bound;
                self.total_main += max_bound;
                cross = 0.0;
                max_bound = 0.0;
            }
            max_bound = max_bound.max(item_main);

            let mut layout = Layout::new(o.point(main, cross), size, item_type);
            layout.is_overridden = measured;
            match self.layouts.get_mut(index) {
                Some(slot) => *slot = layout,
                None => self.layouts.push(layout),
            }
            cross += item_cross;
        }

        self.layouts.truncate(item_count);
        self.total_cross = window_cross;
        self.total_main += max_bound;

        if let Some((fix, target)) = anchor {
            if let Some(entry) = self.layouts.get(fix) {
                let delta = target - o.main_pos(entry);
                if delta != 0.0 {
                    self.shift_all(delta);
                }
                debug!(fix, target, delta, "anchored relayout");
            }
        }

        debug!(
            start,
            item_count,
            old_count,
            content_main = self.total_main,
            "relayout complete"
        );
        Ok(())
    }

    fn override_layout(&mut self, index: usize, size: Dimension) -> bool {
        let Some(layout) = self.layouts.get_mut(index) else {
            return false;
        };
        let changed = layout.size() != size;
        layout.is_overridden = true;
        layout.width = size.width;
        layout.height = size.height;
        if changed {
            self.pending_relayout = true;
        }
        changed
    }

    fn override_layouts(&mut self, rendered: &[RenderedLayout], offsets_stale: bool) -> Option<usize> {
        let o = self.orientation;
        let mut inconsistent = None;
        for item in rendered {
            let Some(layout) = self.layouts.get_mut(item.index) else {
                continue;
            };
            if inconsistent.is_none() {
                if (item.size - o.main_size(layout)).abs() > CONSISTENCY_TOLERANCE {
                    inconsistent = Some(item.index.saturating_sub(1));
                } else if (item.offset - o.main_pos(layout)).abs() > CONSISTENCY_TOLERANCE {
                    inconsistent = Some(item.index);
                }
            }
            o.set_main_size(layout, item.size);
            if !offsets_stale {
                layout.is_overridden = true;
                o.set_main_pos(layout, item.offset);
            }
        }
        if inconsistent.is_some() {
            self.pending_relayout = true;
        }
        inconsistent
    }

    fn preserve_indexes(&mut self, visible: &[usize], engaged: &[usize]) {
        if self.holding_index {
            return;
        }
        let Some(window) = AnchorWindow::from_indexes(visible, engaged) else {
            return;
        };
        if let Some(index) = choose_fix_index(self.fix_index, &self.layouts, &window) {
            if self.fix_index != Some(index) {
                debug!(from = ?self.fix_index, to = index, "fix index moved");
            }
            self.fix_index = Some(index);
        }
    }

    fn hold_preserved_index(&mut self, index: usize) {
        self.fix_index = Some(index);
        self.holding_index = true;
    }

    fn unhold_preserved_index(&mut self) {
        self.holding_index = false;
    }

    fn is_holding_index(&self) -> bool {
        self.holding_index
    }

    fn preserved_index(&self) -> Option<usize> {
        self.fix_index
    }

    fn shift_preserved_index(&mut self, index: usize, shifted: usize) {
        self.pending_fix_main = self.layouts.get(index).map(|l| self.orientation.main_pos(l));
        self.fix_index = Some(shifted);
    }

    fn shift_layouts(&mut self, offset: isize) {
        self.pending_relayout = true;
        let count = offset.unsigned_abs();
        if offset > 0 {
            let mut shifted: Vec<Layout> = std::iter::repeat_with(Layout::placeholder).take(count).collect();
            shifted.append(&mut self.layouts);
            self.layouts = shifted;
        } else if offset < 0 {
            self.layouts.drain(..count.min(self.layouts.len()));
        }
    }

    fn remove_layout(&mut self, index: usize) {
        if index >= self.layouts.len() {
            return;
        }
        self.layouts.remove(index);
        if index == 0 {
            if let Some(head) = self.layouts.first_mut() {
                head.x = 0.0;
                head.y = 0.0;
            }
        }
        self.pending_relayout = true;
    }

    fn has_pending_relayout(&self) -> bool {
        self.pending_relayout
    }

    fn refix(&mut self, request: RefixRequest) -> RefixOutcome {
        if self.pending_relayout {
            debug!("refix deferred behind pending relayout");
            return RefixOutcome::Deferred;
        }
        let outcome = realign(&mut self.layouts, &mut self.total_main, self.orientation, &request);
        debug!(?outcome, "refix");
        outcome
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
