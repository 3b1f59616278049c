//! The seam between the list and whatever actually draws it.
//!
//! The list computes; the host scrolls, sizes the content container and
//! mounts slots. [`RecordingHost`] implements the trait by recording every
//! call, which is what tests and the simulator binary drive.

use serde::Serialize;

use crate::model::{Dimension, Point};
use crate::render::{RenderStackEntry, SlotKey};

/// Commands the list issues to its scroll container.
pub trait ListHost {
    /// Scroll the container to `offset`.
    fn scroll_to(&mut self, offset: Point, animated: bool);

    /// Size the content container.
    fn set_content_extent(&mut self, extent: Dimension);

    /// Grow the content container to `extent` along the scroll axis and
    /// report the measured extent back through
    /// [`crate::orchestrator::RecyclerListView::on_content_measured`].
    fn request_content_measure(&mut self, extent: f64);

    /// Mount the render stack. Slots keep their identity by key.
    fn commit_render_stack(&mut self, stack: &[RenderStackEntry]);

    /// Move one mounted slot without re-rendering it.
    fn reposition_slot(&mut self, key: &SlotKey, origin: Point);

    /// Tag subsequent auto-layout batches with `id`.
    fn set_auto_layout_id(&mut self, id: u32);
}

/// One recorded host command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HostCall {
    /// [`ListHost::scroll_to`].
    ScrollTo {
        /// Target offset.
        offset: Point,
        /// Animated scroll.
        animated: bool,
    },
    /// [`ListHost::set_content_extent`].
    SetContentExtent {
        /// New content size.
        extent: Dimension,
    },
    /// [`ListHost::request_content_measure`].
    RequestContentMeasure {
        /// Requested main-axis extent.
        extent: f64,
    },
    /// [`ListHost::commit_render_stack`].
    CommitRenderStack {
        /// Committed stack.
        stack: Vec<RenderStackEntry>,
    },
    /// [`ListHost::reposition_slot`].
    RepositionSlot {
        /// Slot moved.
        key: SlotKey,
        /// New origin.
        origin: Point,
    },
    /// [`ListHost::set_auto_layout_id`].
    SetAutoLayoutId {
        /// New id.
        id: u32,
    },
}

/// Host that records every command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingHost {
    calls: Vec<HostCall>,
}

impl RecordingHost {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Drain the recording.
    pub fn take_calls(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.calls)
    }

    /// Most recent scroll command.
    pub fn last_scroll(&self) -> Option<(Point, bool)> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::ScrollTo { offset, animated } => Some((*offset, *animated)),
            _ => None,
        })
    }

    /// Most recently committed render stack.
    pub fn last_commit(&self) -> Option<&[RenderStackEntry]> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::CommitRenderStack { stack } => Some(stack.as_slice()),
            _ => None,
        })
    }

    /// Most recent content extent.
    pub fn last_content_extent(&self) -> Option<Dimension> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::SetContentExtent { extent } => Some(*extent),
            _ => None,
        })
    }
}

impl ListHost for RecordingHost {
    fn scroll_to(&mut self, offset: Point, animated: bool) {
        self.calls.push(HostCall::ScrollTo { offset, animated });
    }

    fn set_content_extent(&mut self, extent: Dimension) {
        self.calls.push(HostCall::SetContentExtent { extent });
    }

    fn request_content_measure(&mut self, extent: f64) {
        self.calls.push(HostCall::RequestContentMeasure { extent });
    }

    fn commit_render_stack(&mut self, stack: &[RenderStackEntry]) {
        self.calls.push(HostCall::CommitRenderStack { stack: stack.to_vec() });
    }

    fn reposition_slot(&mut self, key: &SlotKey, origin: Point) {
        self.calls.push(HostCall::RepositionSlot {
            key: key.clone(),
            origin,
        });
    }

    fn set_auto_layout_id(&mut self, id: u32) {
        self.calls.push(HostCall::SetAutoLayoutId { id });
    }
}
