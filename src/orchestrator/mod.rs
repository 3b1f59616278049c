//! Orchestration: the list view state machine and its seams.
//!
//! [`RecyclerListView`] owns every component (layout manager, visibility
//! tracker, render window, timers) and is driven from outside by host
//! events and [`RecyclerListView::advance`]. The host side is abstracted
//! by [`ListHost`]; consumers observe the list through [`ListEvent`]s.

pub mod auto_layout;
pub mod context;
pub mod host;
pub mod list_view;
pub mod listeners;
pub mod refix_loop;

pub use context::{ContextStore, InMemoryContextStore};
pub use host::{HostCall, ListHost, RecordingHost};
pub use list_view::{RecyclerListView, RecyclerListViewBuilder};
pub use listeners::{ListEvent, ListenerId, ListenerRegistry};

use serde::Serialize;

use crate::model::{Dimension, ItemType, Layout, Point};
use crate::render::SlotKey;

/// Lifecycle of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPhase {
    /// No viewport yet.
    Uninitialized,
    /// Viewport known, geometry being built (stays here if that failed).
    Initializing,
    /// Tracking scroll normally.
    Steady,
    /// An initial offset or an animated scroll-to has not landed yet.
    PendingScroll,
}

/// Touch phases reported by the scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollGesture {
    /// The user put a finger down and started dragging.
    BeginDrag,
    /// The user lifted the finger.
    EndDrag,
    /// Momentum scrolling started after a fling.
    MomentumBegin,
    /// Momentum scrolling came to rest.
    MomentumEnd,
}

/// One scroll event from the container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollSample {
    /// Physical scroll offset.
    pub offset: Point,
    /// Content size as measured by the container, when reported.
    pub content_size: Option<Dimension>,
    /// Viewport size as measured by the container, when reported.
    pub viewport_size: Option<Dimension>,
}

impl ScrollSample {
    /// Sample carrying only an offset.
    pub fn at(offset: Point) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    /// Attach the container's measurements.
    pub fn with_sizes(mut self, content_size: Dimension, viewport_size: Dimension) -> Self {
        self.content_size = Some(content_size);
        self.viewport_size = Some(viewport_size);
        self
    }
}

/// What the item renderer needs to draw one slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemProps {
    /// Slot showing the item.
    pub slot_key: SlotKey,
    /// Data index.
    pub index: usize,
    /// Item type.
    pub item_type: ItemType,
    /// Computed rectangle.
    pub layout: Layout,
}
