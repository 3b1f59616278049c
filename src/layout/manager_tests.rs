//! Tests for WrapGridLayoutManager.

use std::cell::Cell;

use proptest::prelude::*;

use super::*;
use crate::model::LayoutProvider;

// ===== Test Helpers =====

fn uniform(window: Dimension, item: Dimension, orientation: Orientation) -> WrapGridLayoutManager {
    WrapGridLayoutManager::new(Rc::new(LayoutProvider::uniform(item)), window, orientation)
}

/// 100x50 items in a 100x500 viewport: one item per row.
fn column(count: usize) -> WrapGridLayoutManager {
    let mut manager = uniform(
        Dimension::new(100.0, 500.0),
        Dimension::new(100.0, 50.0),
        Orientation::Vertical,
    );
    manager.relayout_from_index(0, count).expect("relayout");
    manager
}

fn main_positions(manager: &WrapGridLayoutManager) -> Vec<f64> {
    manager.layouts().iter().map(|l| l.y).collect()
}

// ===== Relayout =====

mod relayout {
    use super::*;

    #[test]
    fn single_column_offsets_are_contiguous() {
        let manager = column(10);
        assert_eq!(manager.layouts().len(), 10);
        for (i, layout) in manager.layouts().iter().enumerate() {
            assert_eq!(layout.y, i as f64 * 50.0);
            assert_eq!(layout.x, 0.0);
            assert!(!layout.is_overridden);
        }
        assert_eq!(manager.content_dimension(), Dimension::new(100.0, 500.0));
    }

    #[test]
    fn relayout_twice_changes_nothing() {
        let mut manager = column(10);
        let before = manager.layouts().to_vec();
        manager.relayout_from_index(0, 10).unwrap();
        assert_eq!(manager.layouts(), before.as_slice());
        assert_eq!(manager.content_dimension().height, 500.0);
    }

    #[test]
    fn grid_wraps_when_cross_axis_is_full() {
        let mut manager = uniform(
            Dimension::new(300.0, 500.0),
            Dimension::new(100.0, 50.0),
            Orientation::Vertical,
        );
        manager.relayout_from_index(0, 7).unwrap();
        let origins: Vec<(f64, f64)> = manager.layouts().iter().map(|l| (l.x, l.y)).collect();
        assert_eq!(
            origins,
            vec![
                (0.0, 0.0),
                (100.0, 0.0),
                (200.0, 0.0),
                (0.0, 50.0),
                (100.0, 50.0),
                (200.0, 50.0),
                (0.0, 100.0),
            ]
        );
        assert_eq!(manager.content_dimension(), Dimension::new(300.0, 150.0));
    }

    #[test]
    fn wrap_tolerates_sub_pixel_overflow() {
        let mut fits = uniform(
            Dimension::new(301.0, 500.0),
            Dimension::new(100.5, 50.0),
            Orientation::Vertical,
        );
        fits.relayout_from_index(0, 3).unwrap();
        assert_eq!(fits.layouts()[2].y, 0.0);

        let mut wraps = uniform(
            Dimension::new(300.0, 500.0),
            Dimension::new(100.5, 50.0),
            Orientation::Vertical,
        );
        wraps.relayout_from_index(0, 3).unwrap();
        assert_eq!(wraps.layouts()[2].y, 50.0);
        assert_eq!(wraps.layouts()[2].x, 0.0);
    }

    #[test]
    fn cross_size_is_clamped_to_viewport() {
        let mut manager = uniform(
            Dimension::new(300.0, 500.0),
            Dimension::new(450.0, 50.0),
            Orientation::Vertical,
        );
        manager.relayout_from_index(0, 2).unwrap();
        assert_eq!(manager.layouts()[0].width, 300.0);
        assert_eq!(manager.layouts()[1].y, 50.0);
    }

    #[test]
    fn horizontal_lists_flow_along_x() {
        let mut manager = uniform(
            Dimension::new(500.0, 100.0),
            Dimension::new(50.0, 100.0),
            Orientation::Horizontal,
        );
        manager.relayout_from_index(0, 10).unwrap();
        assert_eq!(manager.layouts()[9].x, 450.0);
        assert_eq!(manager.layouts()[9].y, 0.0);
        assert_eq!(manager.content_dimension(), Dimension::new(500.0, 100.0));
    }

    #[test]
    fn shrinking_truncates_stale_entries() {
        let mut manager = column(10);
        manager.relayout_from_index(0, 4).unwrap();
        assert_eq!(manager.layouts().len(), 4);
        assert_eq!(manager.content_dimension().height, 200.0);
    }

    #[test]
    fn appending_extends_from_cached_tail() {
        let mut manager = column(10);
        manager.relayout_from_index(10, 15).unwrap();
        assert_eq!(manager.layouts().len(), 15);
        assert_eq!(manager.layouts()[14].y, 700.0);
        assert_eq!(manager.content_dimension().height, 750.0);
    }

    #[test]
    fn relayout_restarts_at_row_start() {
        let mut manager = uniform(
            Dimension::new(300.0, 500.0),
            Dimension::new(100.0, 50.0),
            Orientation::Vertical,
        );
        manager.relayout_from_index(0, 9).unwrap();
        assert!(manager.override_layout(4, Dimension::new(100.0, 80.0)));
        manager.relayout_from_index(4, 9).unwrap();

        assert_eq!(manager.layouts()[3].y, 50.0);
        assert_eq!(manager.layouts()[4].height, 80.0);
        assert_eq!(manager.layouts()[6].y, 130.0);
        assert_eq!(manager.content_dimension().height, 180.0);
    }

    #[test]
    fn unresolvable_type_is_an_error() {
        let provider = LayoutProvider::new(
            |i| (i != 5).then(ItemType::default),
            |_, _| Dimension::new(100.0, 50.0),
        );
        let mut manager = WrapGridLayoutManager::new(
            Rc::new(provider),
            Dimension::new(100.0, 500.0),
            Orientation::Vertical,
        );
        let err = manager.relayout_from_index(0, 10).unwrap_err();
        assert_eq!(err, RecyclerError::InvalidItemType { index: 5 });
    }

    #[test]
    fn offset_past_laid_out_range_is_unavailable() {
        let manager = column(10);
        assert_eq!(manager.offset_for_index(3), Ok(Point::new(0.0, 150.0)));
        assert_eq!(
            manager.offset_for_index(10),
            Err(RecyclerError::LayoutUnavailable {
                index: 10,
                laid_out: 10
            })
        );
    }
}

// ===== Measurements =====

mod overrides {
    use super::*;

    #[test]
    fn measured_size_is_trusted_by_relayout() {
        let mut manager = column(10);
        assert!(manager.override_layout(3, Dimension::new(100.0, 80.0)));
        assert!(manager.has_pending_relayout());

        manager.relayout_from_index(3, 10).unwrap();
        assert!(!manager.has_pending_relayout());
        assert_eq!(manager.layouts()[3].height, 80.0);
        assert!(manager.layouts()[3].is_overridden);
        assert_eq!(manager.layouts()[4].y, 230.0);
        assert_eq!(manager.content_dimension().height, 530.0);
    }

    #[test]
    fn identical_measurement_reports_no_change() {
        let mut manager = column(10);
        assert!(!manager.override_layout(3, Dimension::new(100.0, 50.0)));
        assert!(!manager.has_pending_relayout());
        assert!(manager.layouts()[3].is_overridden);
    }

    #[test]
    fn measurement_past_range_is_ignored() {
        let mut manager = column(10);
        assert!(!manager.override_layout(10, Dimension::new(100.0, 80.0)));
    }

    #[test]
    fn type_change_discards_measurement() {
        let current = Rc::new(Cell::new(1u32));
        let type_source = Rc::clone(&current);
        let provider = LayoutProvider::new(
            move |_| Some(ItemType::new(type_source.get())),
            |_, _| Dimension::new(100.0, 50.0),
        );
        let mut manager = WrapGridLayoutManager::new(
            Rc::new(provider),
            Dimension::new(100.0, 500.0),
            Orientation::Vertical,
        );
        manager.relayout_from_index(0, 5).unwrap();
        manager.override_layout(2, Dimension::new(100.0, 90.0));
        manager.relayout_from_index(0, 5).unwrap();
        assert_eq!(manager.layouts()[2].height, 90.0);

        current.set(2);
        manager.relayout_from_index(0, 5).unwrap();
        assert_eq!(manager.layouts()[2].height, 50.0);
        assert!(!manager.layouts()[2].is_overridden);
        assert_eq!(manager.layouts()[2].item_type, ItemType::new(2));
    }

    #[test]
    fn batch_reports_size_divergence_one_before() {
        let mut manager = column(10);
        let rendered = [
            RenderedLayout { index: 2, offset: 100.0, size: 50.0 },
            RenderedLayout { index: 3, offset: 150.0, size: 80.0 },
            RenderedLayout { index: 4, offset: 260.0, size: 50.0 },
        ];
        assert_eq!(manager.override_layouts(&rendered, false), Some(2));
        assert!(manager.has_pending_relayout());
        assert_eq!(manager.layouts()[3].height, 80.0);
        assert!(manager.layouts()[3].is_overridden);
        assert_eq!(manager.layouts()[4].y, 260.0);
    }

    #[test]
    fn batch_reports_offset_divergence_at_index() {
        let mut manager = column(10);
        let rendered = [RenderedLayout { index: 4, offset: 210.0, size: 50.0 }];
        assert_eq!(manager.override_layouts(&rendered, false), Some(4));
    }

    #[test]
    fn batch_within_tolerance_is_consistent() {
        let mut manager = column(10);
        let rendered = [RenderedLayout { index: 4, offset: 200.5, size: 50.5 }];
        assert_eq!(manager.override_layouts(&rendered, false), None);
        assert!(!manager.has_pending_relayout());
        assert_eq!(manager.layouts()[4].y, 200.5);
    }

    #[test]
    fn stale_batch_applies_sizes_only() {
        let mut manager = column(10);
        let rendered = [RenderedLayout { index: 0, offset: 40.0, size: 70.0 }];
        assert_eq!(manager.override_layouts(&rendered, true), Some(0));
        let head = &manager.layouts()[0];
        assert_eq!(head.height, 70.0);
        assert_eq!(head.y, 0.0);
        assert!(!head.is_overridden);
    }
}

// ===== Anchoring =====

mod anchoring {
    use super::*;

    #[test]
    fn fix_index_keeps_its_offset_when_items_above_grow() {
        let mut manager = column(20);
        manager.hold_preserved_index(10);
        manager.override_layout(2, Dimension::new(100.0, 80.0));
        manager.relayout_from_index(2, 20).unwrap();

        assert_eq!(manager.layouts()[10].y, 500.0);
        assert_eq!(manager.layouts()[0].y, -30.0);
        assert_eq!(manager.layouts()[3].y, 150.0);
        assert_eq!(manager.content_dimension().height, 1000.0);
    }

    #[test]
    fn refix_realigns_head_after_anchored_relayout() {
        let mut manager = column(20);
        manager.hold_preserved_index(10);
        manager.override_layout(2, Dimension::new(100.0, 80.0));
        manager.relayout_from_index(2, 20).unwrap();

        let outcome = manager.refix(RefixRequest {
            item_count: 20,
            scroll_offset: 400.0,
            scroll_extent: 1000.0,
        });
        assert_eq!(
            outcome,
            RefixOutcome::Applied {
                delta: 30.0,
                content_extent: 1030.0
            }
        );
        assert_eq!(manager.layouts()[0].y, 0.0);
        assert_eq!(manager.layouts()[10].y, 530.0);
    }

    #[test]
    fn refix_waits_for_pending_relayout() {
        let mut manager = column(10);
        manager.override_layout(2, Dimension::new(100.0, 80.0));
        let outcome = manager.refix(RefixRequest {
            item_count: 10,
            scroll_offset: 0.0,
            scroll_extent: 500.0,
        });
        assert_eq!(outcome, RefixOutcome::Deferred);
    }

    #[test]
    fn head_insert_keeps_anchor_in_place() {
        let mut manager = column(10);
        manager.hold_preserved_index(3);
        manager.shift_preserved_index(3, 8);
        manager.shift_layouts(5);
        assert!(manager.has_pending_relayout());
        assert_eq!(manager.layouts().len(), 15);

        manager.relayout_from_index(0, 15).unwrap();
        assert_eq!(manager.preserved_index(), Some(8));
        assert_eq!(manager.layouts()[8].y, 150.0);
        assert_eq!(manager.layouts()[5].y, 0.0);
        assert_eq!(manager.layouts()[0].y, -250.0);
        assert_eq!(manager.content_dimension().height, 500.0);
    }

    #[test]
    fn head_insert_carries_measured_head_to_its_new_index() {
        let mut manager = column(10);
        assert!(manager.override_layout(0, Dimension::new(100.0, 80.0)));
        manager.relayout_from_index(0, 10).unwrap();
        manager.hold_preserved_index(0);

        manager.shift_preserved_index(0, 5);
        manager.shift_layouts(5);

        let moved = &manager.layouts()[5];
        assert!(moved.is_overridden);
        assert_eq!(moved.height, 80.0);
        for placeholder in &manager.layouts()[..5] {
            assert!(!placeholder.is_overridden);
            assert_eq!(placeholder.height, 0.0);
        }

        manager.relayout_from_index(0, 15).unwrap();
        let layouts = manager.layouts();
        assert!(layouts[5].is_overridden);
        assert_eq!((layouts[5].y, layouts[5].height), (0.0, 80.0));
        assert_eq!(layouts[6].y, 80.0);
        assert_eq!((layouts[0].y, layouts[0].height), (-250.0, 50.0));
        assert!(!layouts[0].is_overridden);
        assert_eq!(manager.content_dimension().height, 530.0);
    }

    #[test]
    fn pending_fix_pulls_relayout_start_back() {
        let mut manager = column(10);
        manager.hold_preserved_index(2);
        manager.shift_preserved_index(2, 2);
        manager.override_layout(1, Dimension::new(100.0, 80.0));
        // Start past the fix: the fix still keeps its offset.
        manager.relayout_from_index(6, 10).unwrap();
        assert_eq!(manager.layouts()[2].y, 100.0);
        assert_eq!(manager.layouts()[1].y, 20.0);
    }

    #[test]
    fn negative_shift_drops_head_entries() {
        let mut manager = column(10);
        manager.shift_layouts(-3);
        assert_eq!(manager.layouts().len(), 7);
        assert!(manager.has_pending_relayout());
        manager.shift_layouts(-30);
        assert!(manager.layouts().is_empty());
    }

    #[test]
    fn removing_head_moves_new_head_to_origin() {
        let mut manager = column(10);
        manager.remove_layout(0);
        assert_eq!(manager.layouts().len(), 9);
        assert_eq!(manager.layouts()[0].origin(), Point::new(0.0, 0.0));
        assert!(manager.has_pending_relayout());
        manager.remove_layout(100);
        assert_eq!(manager.layouts().len(), 9);
    }

    #[test]
    fn preserve_is_ignored_while_holding() {
        let mut manager = column(20);
        manager.hold_preserved_index(3);
        manager.preserve_indexes(&[10, 11], &[9, 10, 11, 12]);
        assert_eq!(manager.preserved_index(), Some(3));
        assert!(manager.is_holding_index());

        manager.unhold_preserved_index();
        manager.preserve_indexes(&[10, 11], &[9, 10, 11, 12]);
        assert_eq!(manager.preserved_index(), Some(10));
    }

    #[test]
    fn preserve_prefers_measured_neighbour() {
        let mut manager = column(20);
        manager.override_layout(12, Dimension::new(100.0, 50.0));
        manager.preserve_indexes(&[10, 11, 12, 13], &[8, 9, 10, 11, 12, 13, 14, 15]);
        assert_eq!(manager.preserved_index(), Some(12));
    }

    #[test]
    fn seeded_manager_trusts_predecessor_measurements() {
        let mut first = column(5);
        first.override_layout(1, Dimension::new(100.0, 120.0));
        let seed = first.take_layouts();
        assert!(first.layouts().is_empty());

        let mut second = uniform(
            Dimension::new(100.0, 500.0),
            Dimension::new(100.0, 50.0),
            Orientation::Vertical,
        )
        .with_cached_layouts(seed);
        second.relayout_from_index(0, 5).unwrap();
        assert_eq!(second.layouts()[1].height, 120.0);
        assert_eq!(second.layouts()[2].y, 170.0);
    }
}

// ===== Properties =====

fn sized_manager(widths: Vec<f64>, heights: Vec<f64>, window: Dimension) -> WrapGridLayoutManager {
    let provider = LayoutProvider::new(
        |_| Some(ItemType::default()),
        move |_, i| Dimension::new(widths[i], heights[i]),
    );
    WrapGridLayoutManager::new(Rc::new(provider), window, Orientation::Vertical)
}

proptest! {
    #[test]
    fn column_layout_is_gapless(heights in prop::collection::vec(1.0f64..200.0, 1..80)) {
        let count = heights.len();
        let widths = vec![100.0; count];
        let mut manager = sized_manager(widths, heights.clone(), Dimension::new(100.0, 600.0));
        manager.relayout_from_index(0, count).unwrap();

        let positions = main_positions(&manager);
        prop_assert_eq!(positions[0], 0.0);
        for i in 1..count {
            prop_assert!((positions[i] - (positions[i - 1] + heights[i - 1])).abs() < 1e-6);
        }
        let total: f64 = heights.iter().sum();
        prop_assert!((manager.content_dimension().height - total).abs() < 1e-6);
    }

    #[test]
    fn grid_rows_never_overflow_cross_axis(
        widths in prop::collection::vec(10.0f64..400.0, 1..60),
        window_width in 100.0f64..400.0,
    ) {
        let count = widths.len();
        let heights = vec![40.0; count];
        let mut manager = sized_manager(widths, heights, Dimension::new(window_width, 600.0));
        manager.relayout_from_index(0, count).unwrap();

        let layouts = manager.layouts();
        for (i, layout) in layouts.iter().enumerate() {
            prop_assert!(layout.x + layout.width <= window_width + 0.9 + 1e-9);
            if i > 0 {
                let prev = &layouts[i - 1];
                prop_assert!(layout.y >= prev.y);
            }
        }
    }

    #[test]
    fn relayout_from_any_index_matches_full_relayout(
        heights in prop::collection::vec(1.0f64..120.0, 2..50),
        start_seed in 0usize..1000,
    ) {
        let count = heights.len();
        let widths = vec![100.0; count];
        let mut manager = sized_manager(widths, heights, Dimension::new(300.0, 600.0));
        manager.relayout_from_index(0, count).unwrap();
        let full = manager.layouts().to_vec();

        manager.relayout_from_index(start_seed % count, count).unwrap();
        prop_assert_eq!(manager.layouts(), full.as_slice());
    }
}
