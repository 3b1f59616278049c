//! Refix: move accumulated estimate drift out of the layout coordinates.
//!
//! Anchoring keeps visible items still while sizes above them change, which
//! lets the head of the list drift away from offset zero (negative when
//! measured items turn out smaller than estimated, positive when larger).
//! A refix shifts every layout so index 0 starts at the origin again. The
//! caller compensates by scrolling by the same delta, so nothing moves on
//! screen.

use serde::Serialize;

use crate::model::{Layout, Orientation};

/// Inputs of one refix attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefixRequest {
    /// Number of items in the data provider.
    pub item_count: usize,
    /// Current physical scroll offset.
    pub scroll_offset: f64,
    /// Scrollable extent the container last reported.
    pub scroll_extent: f64,
}

/// Result of one refix attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefixOutcome {
    /// A relayout is pending; retry after it ran.
    Deferred,
    /// The container is too short to scroll to the corrected offset. The host
    /// must grow it to `extent`, measure it, and retry.
    GrowContainer {
        /// Required content extent along the scroll axis.
        extent: f64,
    },
    /// Nothing drifted.
    Settled {
        /// Content extent along the scroll axis.
        content_extent: f64,
    },
    /// Every layout moved by `delta`.
    Applied {
        /// Shift applied to layouts; the scroll offset must move by the same amount.
        delta: f64,
        /// Content extent after the shift.
        content_extent: f64,
    },
}

impl RefixOutcome {
    /// True when the loop must run again later.
    pub fn needs_retry(&self) -> bool {
        matches!(self, RefixOutcome::Deferred | RefixOutcome::GrowContainer { .. })
    }
}

/// Shift `layouts` so the head sits at zero, adjusting `content_main` alike.
pub(crate) fn realign(
    layouts: &mut [Layout],
    content_main: &mut f64,
    orientation: Orientation,
    request: &RefixRequest,
) -> RefixOutcome {
    let Some(head) = layouts.first() else {
        return RefixOutcome::Settled {
            content_extent: *content_main,
        };
    };
    let delta = -orientation.main_pos(head);

    if request.scroll_extent < request.scroll_offset.min(*content_main) + delta {
        return RefixOutcome::GrowContainer {
            extent: *content_main + delta,
        };
    }

    if delta == 0.0 {
        return RefixOutcome::Settled {
            content_extent: *content_main,
        };
    }

    let count = request.item_count.min(layouts.len());
    for layout in &mut layouts[..count] {
        let moved = orientation.main_pos(layout) + delta;
        orientation.set_main_pos(layout, moved);
    }
    *content_main += delta;

    RefixOutcome::Applied {
        delta,
        content_extent: *content_main,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dimension, ItemType, Point};

    fn column(start: f64, count: usize) -> Vec<Layout> {
        (0..count)
            .map(|i| {
                Layout::new(
                    Point::new(0.0, start + i as f64 * 50.0),
                    Dimension::new(100.0, 50.0),
                    ItemType::default(),
                )
            })
            .collect()
    }

    fn request(offset: f64, extent: f64) -> RefixRequest {
        RefixRequest {
            item_count: 10,
            scroll_offset: offset,
            scroll_extent: extent,
        }
    }

    #[test]
    fn aligned_head_is_settled() {
        let mut layouts = column(0.0, 10);
        let mut total = 500.0;
        let outcome = realign(&mut layouts, &mut total, Orientation::Vertical, &request(100.0, 500.0));
        assert_eq!(outcome, RefixOutcome::Settled { content_extent: 500.0 });
    }

    #[test]
    fn positive_drift_shifts_everything_up() {
        let mut layouts = column(40.0, 10);
        let mut total = 540.0;
        let outcome = realign(&mut layouts, &mut total, Orientation::Vertical, &request(200.0, 540.0));
        assert_eq!(
            outcome,
            RefixOutcome::Applied {
                delta: -40.0,
                content_extent: 500.0
            }
        );
        assert_eq!(layouts[0].y, 0.0);
        assert_eq!(layouts[9].y, 450.0);
    }

    #[test]
    fn negative_drift_needs_taller_container_first() {
        let mut layouts = column(-30.0, 10);
        let mut total = 470.0;
        let outcome = realign(&mut layouts, &mut total, Orientation::Vertical, &request(460.0, 470.0));
        assert_eq!(outcome, RefixOutcome::GrowContainer { extent: 500.0 });
        assert!(outcome.needs_retry());
        assert_eq!(layouts[0].y, -30.0);
    }

    #[test]
    fn empty_layouts_are_settled() {
        let mut total = 0.0;
        let outcome = realign(&mut [], &mut total, Orientation::Horizontal, &request(0.0, 0.0));
        assert_eq!(outcome, RefixOutcome::Settled { content_extent: 0.0 });
    }
}
