//! Property-based tests for windowing and anchoring invariants.
//!
//! Tests validate:
//! 1. Visible indexes are exactly the items intersecting the viewport
//! 2. Visible ⊆ engaged, and every engaged index has a mounted slot
//! 3. Measuring an item never moves the anchored item

use recyclist::config::ListConfig;
use recyclist::model::{Dimension, ItemType, LayoutProvider, Point, VecDataProvider};
use recyclist::orchestrator::{RecordingHost, RecyclerListView, RecyclerListViewBuilder, ScrollSample};
use proptest::prelude::*;

type List = RecyclerListView<VecDataProvider<u32>, RecordingHost>;

fn list_with_heights(heights: Vec<f64>, viewport_height: f64, config: ListConfig) -> List {
    let count = heights.len() as u32;
    let data = VecDataProvider::new(|a: &u32, b: &u32| a != b)
        .with_stable_ids(|_, value| value.to_string())
        .clone_with_rows((0..count).collect());
    let provider = LayoutProvider::new(
        |_| Some(ItemType::default()),
        move |_, index| Dimension::new(100.0, heights[index]),
    );
    let mut list = RecyclerListViewBuilder::new()
        .data_provider(data)
        .layout_provider(provider)
        .config(config)
        .build(RecordingHost::new(), 0)
        .unwrap();
    list.on_size_changed(Dimension::new(100.0, viewport_height), 0).unwrap();
    list
}

fn heights() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((10u32..200).prop_map(f64::from), 1..150)
}

// ===== Property 1 & 2: Window contents =====

proptest! {
    #[test]
    fn visible_indexes_are_exactly_the_intersecting_items(
        heights in heights(),
        viewport in (100u32..900).prop_map(f64::from),
        offset in (0u32..20_000).prop_map(f64::from),
    ) {
        let mut list = list_with_heights(heights, viewport, ListConfig::default());
        list.on_scroll(ScrollSample::at(Point::new(0.0, offset)), 10).unwrap();
        list.advance_until_idle(10).unwrap();

        let content = list.content_extent().height;
        let start = offset.min((content - viewport).max(0.0));
        let end = start + viewport;

        let expected: Vec<usize> = (0..list.data().rows().len())
            .filter(|&index| {
                let layout = list.get_layout(index).unwrap();
                layout.y < end && layout.y + layout.height > start
            })
            .collect();
        prop_assert_eq!(list.visible_indexes(), expected.as_slice());
    }

    #[test]
    fn engaged_indexes_cover_visible_and_are_mounted(
        heights in heights(),
        offset in (0u32..20_000).prop_map(f64::from),
        render_ahead in (0u32..1000).prop_map(f64::from),
    ) {
        let config = ListConfig { render_ahead_offset: render_ahead, ..ListConfig::default() };
        let mut list = list_with_heights(heights, 500.0, config);
        list.on_scroll(ScrollSample::at(Point::new(0.0, offset)), 10).unwrap();
        list.advance_until_idle(10).unwrap();

        for index in list.visible_indexes() {
            prop_assert!(list.engaged_indexes().contains(index), "visible {} not engaged", index);
        }
        let mounted: Vec<usize> = list.render_stack().iter().filter_map(|entry| entry.data_index).collect();
        for index in list.engaged_indexes() {
            prop_assert!(mounted.contains(index), "engaged {} has no slot", index);
        }
    }
}

// ===== Property 3: Anchoring =====

proptest! {
    #[test]
    fn measuring_an_engaged_item_keeps_the_anchor_still(
        index in 15usize..35,
        measured in (10u32..200).prop_map(f64::from),
    ) {
        let config = ListConfig {
            force_non_deterministic_rendering: true,
            preserve_visible_position: true,
            ..ListConfig::default()
        };
        let mut list = list_with_heights(vec![50.0; 100], 500.0, config);
        list.advance_until_idle(0).unwrap();
        list.on_scroll(ScrollSample::at(Point::new(0.0, 1000.0)), 10).unwrap();
        prop_assert_eq!(list.preserved_index(), Some(20));

        list.on_item_size_changed(index, Dimension::new(100.0, measured), 20);
        list.advance_until_idle(20).unwrap();

        prop_assert_eq!(list.get_layout(20).map(|l| l.y), Some(1000.0));
        prop_assert_eq!(list.visible_indexes().first(), Some(&20));
    }
}
