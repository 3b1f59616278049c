//! Layout computation.
//!
//! A [`LayoutManager`] owns one [`Layout`] per data index and keeps it in
//! sync with item counts, estimates and measurements. It also owns the
//! anchor (the "fix index") that keeps visible content still across
//! relayouts, and the refix operation that removes the drift anchoring
//! leaves behind.
//!
//! [`WrapGridLayoutManager`] is the only implementation: items flow along
//! the cross axis and wrap into a new row (or column) when the viewport's
//! cross size is exhausted.

pub mod anchor;
pub mod manager;
pub mod refix;

pub use anchor::AnchorWindow;
pub use manager::WrapGridLayoutManager;
pub use refix::{RefixOutcome, RefixRequest};

use crate::model::{Dimension, Layout, Orientation, Point, RecyclerError};

/// Main-axis geometry of one item as the renderer actually placed it.
///
/// Batches of these come from auto-layout passes, in index order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedLayout {
    /// Data index.
    pub index: usize,
    /// Rendered main-axis offset.
    pub offset: f64,
    /// Rendered main-axis size.
    pub size: f64,
}

/// Incremental layout of a list.
///
/// Object safe; the orchestrator holds a `Box<dyn LayoutManager>` and swaps
/// it when the layout provider or orientation changes.
pub trait LayoutManager {
    /// Scroll orientation this manager lays out for.
    fn orientation(&self) -> Orientation;

    /// Viewport the manager wraps against.
    fn window_size(&self) -> Dimension;

    /// One entry per laid out index.
    fn layouts(&self) -> &[Layout];

    /// Move the layouts out, leaving the manager empty (used to seed a successor).
    fn take_layouts(&mut self) -> Vec<Layout>;

    /// Bounding box of all content.
    fn content_dimension(&self) -> Dimension;

    /// Origin of `index`.
    ///
    /// # Errors
    ///
    /// [`RecyclerError::LayoutUnavailable`] when `index` has not been laid out.
    fn offset_for_index(&self, index: usize) -> Result<Point, RecyclerError>;

    /// Recompute geometry from `start` up to `item_count`.
    ///
    /// # Errors
    ///
    /// [`RecyclerError::InvalidItemType`] when the type provider returns no type.
    fn relayout_from_index(&mut self, start: usize, item_count: usize) -> Result<(), RecyclerError>;

    /// Record a measured size. Returns true when it differs from the cached one.
    fn override_layout(&mut self, index: usize, size: Dimension) -> bool;

    /// Apply a batch of rendered geometry; returns where relayout must begin.
    fn override_layouts(&mut self, rendered: &[RenderedLayout], offsets_stale: bool) -> Option<usize>;

    /// Re-evaluate the fix index against the current windows. No-op while holding.
    fn preserve_indexes(&mut self, visible: &[usize], engaged: &[usize]);

    /// Pin the fix index to `index` until [`LayoutManager::unhold_preserved_index`].
    fn hold_preserved_index(&mut self, index: usize);

    /// Release a held fix index.
    fn unhold_preserved_index(&mut self);

    /// True while a fix index is held.
    fn is_holding_index(&self) -> bool;

    /// Current fix index.
    fn preserved_index(&self) -> Option<usize>;

    /// Move the fix index to `shifted`, remembering `index`'s current offset
    /// as the target for the next relayout. Call before shifting layouts.
    fn shift_preserved_index(&mut self, index: usize, shifted: usize);

    /// Insert (`offset > 0`) placeholder entries at the head or drop
    /// (`offset < 0`) head entries.
    fn shift_layouts(&mut self, offset: isize);

    /// Remove one entry.
    fn remove_layout(&mut self, index: usize);

    /// True when a measurement or shift has not yet been relaid out.
    fn has_pending_relayout(&self) -> bool;

    /// Realign the head of the list to offset zero.
    fn refix(&mut self, request: RefixRequest) -> RefixOutcome;
}
