//! The list view: wiring between host events, geometry and the render window.
//!
//! # Event flow
//!
//! ```text
//! host event ─► handler ─► (layout manager / tracker / coordinator)
//!                  │
//!                  └─► schedules timers ─► advance(now) ─► host commands
//! ```
//!
//! Handlers never wait. Anything that the list would otherwise do "later"
//! (trailing scroll sample, relayout after a measurement, render commit,
//! refix, hold release) is a timer polled by [`RecyclerListView::advance`]
//! in a fixed order:
//!
//! 1. trailing scroll sample
//! 2. state refresh (relayout requested by measurements)
//! 3. pending initial scroll
//! 4. render commit
//! 5. refix and edge flush
//! 6. hold poll, then hold release

use std::fmt;
use std::rc::Rc;

use tracing::{debug, info, trace, warn};

use super::auto_layout::{AutoLayoutIds, BatchValidity};
use super::context::{self, ContextStore, RestoredContext};
use super::host::ListHost;
use super::listeners::{ListEvent, ListenerId, ListenerRegistry};
use super::refix_loop::{RefixGate, RefixLoop, RefixTick};
use super::{ItemProps, ListPhase, ScrollGesture, ScrollSample};
use crate::config::ListConfig;
use crate::layout::{LayoutManager, RefixOutcome, RefixRequest, RenderedLayout, WrapGridLayoutManager};
use crate::model::{
    DataProvider, Dimension, Layout, LayoutTypeProvider, Orientation, Point, RecyclerError, WindowCorrection,
};
use crate::render::{RenderStackEntry, RenderWindowCoordinator};
use crate::schedule::{Debouncer, IntervalTimer, Millis, Throttler};
use crate::viewability::{Edge, EdgeReachedDetector, VisibilityTracker, WindowChange};

/// Upper bound on passes of [`RecyclerListView::advance_until_idle`].
const MAX_SETTLE_PASSES: usize = 32;

fn layouts_of(manager: &Option<Box<dyn LayoutManager>>) -> &[Layout] {
    match manager {
        Some(manager) => manager.layouts(),
        None => &[],
    }
}

/// Builder for [`RecyclerListView`].
///
/// # Examples
///
/// ```
/// use recyclist::model::{Dimension, LayoutProvider, VecDataProvider};
/// use recyclist::orchestrator::{RecordingHost, RecyclerListViewBuilder};
///
/// let data = VecDataProvider::new(|a: &u32, b: &u32| a != b).clone_with_rows((0..100).collect());
/// let mut list = RecyclerListViewBuilder::new()
///     .data_provider(data)
///     .layout_provider(LayoutProvider::uniform(Dimension::new(100.0, 50.0)))
///     .build(RecordingHost::new(), 0)
///     .unwrap();
///
/// list.on_size_changed(Dimension::new(100.0, 500.0), 0).unwrap();
/// assert_eq!(list.visible_indexes(), (0..10).collect::<Vec<_>>().as_slice());
/// ```
pub struct RecyclerListViewBuilder<D> {
    data: Option<D>,
    layout_provider: Option<Rc<dyn LayoutTypeProvider>>,
    config: ListConfig,
    listeners: ListenerRegistry,
    context_key: Option<String>,
}

impl<D: DataProvider> Default for RecyclerListViewBuilder<D> {
    fn default() -> Self {
        Self {
            data: None,
            layout_provider: None,
            config: ListConfig::default(),
            listeners: ListenerRegistry::new(),
            context_key: None,
        }
    }
}

impl<D: DataProvider> RecyclerListViewBuilder<D> {
    /// Start with the default configuration and no providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Item data.
    pub fn data_provider(mut self, data: D) -> Self {
        self.data = Some(data);
        self
    }

    /// Item types and size estimates.
    pub fn layout_provider(self, provider: impl LayoutTypeProvider + 'static) -> Self {
        self.shared_layout_provider(Rc::new(provider))
    }

    /// Item types and size estimates, shared with other lists.
    pub fn shared_layout_provider(mut self, provider: Rc<dyn LayoutTypeProvider>) -> Self {
        self.layout_provider = Some(provider);
        self
    }

    /// Tunables.
    pub fn config(mut self, config: ListConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a listener before the list exists, so it sees construction events.
    pub fn listener(mut self, listener: impl FnMut(&ListEvent) + 'static) -> Self {
        self.listeners.add(listener);
        self
    }

    /// Identity under which the list saves and restores its context.
    pub fn context_key(mut self, key: impl Into<String>) -> Self {
        self.context_key = Some(key.into());
        self
    }

    /// Removed: visibility arrives as [`ListEvent::VisibilityChanged`].
    ///
    /// # Errors
    ///
    /// Always [`RecyclerError::DeprecatedApiUsage`].
    #[deprecated(note = "register a listener and match ListEvent::VisibilityChanged")]
    pub fn on_visible_indexes_changed(
        self,
        _callback: impl FnMut(&[usize], &[usize], &[usize]) + 'static,
    ) -> Result<Self, RecyclerError> {
        Err(RecyclerError::DeprecatedApiUsage {
            api: "on_visible_indexes_changed",
            replacement: "add_listener",
        })
    }

    /// Build the list. With a fixed `layout_size` it initializes immediately;
    /// otherwise it waits for [`RecyclerListView::on_size_changed`].
    ///
    /// # Errors
    ///
    /// [`RecyclerError::MissingDependency`] without a provider, or any
    /// error of the initial relayout.
    pub fn build<H: ListHost>(self, host: H, now: Millis) -> Result<RecyclerListView<D, H>, RecyclerError> {
        self.build_inner(host, None, now)
    }

    /// Build the list, resuming from the context saved under the context key.
    ///
    /// # Errors
    ///
    /// Same as [`RecyclerListViewBuilder::build`].
    pub fn build_with_context<H: ListHost>(
        self,
        host: H,
        store: &mut dyn ContextStore,
        now: Millis,
    ) -> Result<RecyclerListView<D, H>, RecyclerError> {
        self.build_inner(host, Some(store), now)
    }

    fn build_inner<H: ListHost>(
        self,
        host: H,
        store: Option<&mut dyn ContextStore>,
        now: Millis,
    ) -> Result<RecyclerListView<D, H>, RecyclerError> {
        let data = self.data.ok_or(RecyclerError::MissingDependency("data provider"))?;
        let layout_provider = self
            .layout_provider
            .ok_or(RecyclerError::MissingDependency("layout provider"))?;

        let restored = match (store, self.context_key.as_deref()) {
            (Some(store), Some(key)) => context::restore(store, key, self.config.force_non_deterministic_rendering),
            _ => RestoredContext::default(),
        };

        let mut list = RecyclerListView::new(data, layout_provider, self.config, host, self.listeners);
        list.context_key = self.context_key;
        list.cached_layouts = restored.layouts;
        if let Some(offset) = restored.offset {
            list.initial_offset = offset;
            list.listeners.emit(&ListEvent::Recreated { last_offset: offset });
        }

        if let Some(size) = list.config.layout_size {
            list.viewport = size;
            list.init_trackers(now)?;
            list.process_edge_reached();
        }

        info!(
            items = list.data.size(),
            orientation = ?list.config.orientation,
            restored = restored.offset.is_some(),
            "list built"
        );
        Ok(list)
    }
}

/// A virtualized list.
///
/// Generic over the data provider and the host. All geometry lives in the
/// layout manager; everything else borrows it per call.
pub struct RecyclerListView<D: DataProvider, H: ListHost> {
    config: ListConfig,
    data: D,
    layout_provider: Rc<dyn LayoutTypeProvider>,
    host: H,
    listeners: ListenerRegistry,
    viewport: Dimension,
    initializing: bool,
    layout_manager: Option<Box<dyn LayoutManager>>,
    tracker: Option<VisibilityTracker>,
    tracker_running: bool,
    coordinator: RenderWindowCoordinator,
    edge_detector: EdgeReachedDetector,
    scroll_offset: f64,
    scroll_extent: f64,
    user_dragging: bool,
    momentum_scrolling: bool,
    edge_visible: bool,
    pending_auto_layout: bool,
    auto_layout: AutoLayoutIds,
    hold_stable_id: Option<String>,
    hold_target: f64,
    relayout_request: Option<usize>,
    pending_scroll: Option<Point>,
    pending_render: bool,
    initial_offset: f64,
    cached_layouts: Option<Vec<Layout>>,
    context_key: Option<String>,
    scroll_throttle: Throttler<ScrollSample>,
    state_refresh: Debouncer,
    initial_scroll: Debouncer,
    render_commit: Debouncer,
    refix: RefixLoop,
    hold_poll: IntervalTimer,
    hold_release: Debouncer,
}

impl<D: DataProvider, H: ListHost> fmt::Debug for RecyclerListView<D, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecyclerListView")
            .field("phase", &self.phase())
            .field("items", &self.data.size())
            .field("viewport", &self.viewport)
            .field("scroll_offset", &self.scroll_offset)
            .field("visible", &self.visible_indexes())
            .field("engaged", &self.engaged_indexes())
            .finish_non_exhaustive()
    }
}

impl<D: DataProvider, H: ListHost> RecyclerListView<D, H> {
    fn new(
        data: D,
        layout_provider: Rc<dyn LayoutTypeProvider>,
        config: ListConfig,
        host: H,
        listeners: ListenerRegistry,
    ) -> Self {
        let timing = config.timing;
        Self {
            initial_offset: config.initial_offset,
            coordinator: RenderWindowCoordinator::new(!config.disable_recycling),
            edge_detector: EdgeReachedDetector::new(config.edge_thresholds),
            scroll_throttle: Throttler::new(timing.scroll_throttle_ms),
            state_refresh: Debouncer::new(timing.state_refresh_ms),
            initial_scroll: Debouncer::new(0),
            render_commit: Debouncer::new(timing.render_commit_ms),
            refix: RefixLoop::new(timing.refix_debounce_ms, timing.edge_flush_ms),
            hold_poll: IntervalTimer::new(timing.hold_poll_ms),
            hold_release: Debouncer::new(timing.hold_release_ms),
            config,
            data,
            layout_provider,
            host,
            listeners,
            viewport: Dimension::default(),
            initializing: false,
            layout_manager: None,
            tracker: None,
            tracker_running: false,
            scroll_offset: 0.0,
            scroll_extent: 0.0,
            user_dragging: false,
            momentum_scrolling: false,
            edge_visible: true,
            pending_auto_layout: false,
            auto_layout: AutoLayoutIds::default(),
            hold_stable_id: None,
            hold_target: 0.0,
            relayout_request: None,
            pending_scroll: None,
            pending_render: false,
            cached_layouts: None,
            context_key: None,
        }
    }

    // ===== Host events =====

    /// The scroll container was (re)measured.
    ///
    /// The first non-empty size initializes the list. Later a cross-axis
    /// change rebuilds the layout (items re-wrap); anything else refreshes
    /// visibility.
    ///
    /// # Errors
    ///
    /// [`RecyclerError::UnboundedSize`] for a zero-sized viewport unless
    /// suppressed, or errors of the relayout.
    pub fn on_size_changed(&mut self, size: Dimension, now: Millis) -> Result<(), RecyclerError> {
        if size.is_empty() {
            if self.config.suppress_bounded_size_exception {
                debug!(?size, "ignoring zero-sized viewport");
                return Ok(());
            }
            return Err(RecyclerError::UnboundedSize {
                width: size.width,
                height: size.height,
            });
        }
        if self.config.layout_size.is_some() && !self.config.can_change_size {
            return Ok(());
        }

        let previous = std::mem::replace(&mut self.viewport, size);
        if self.tracker.is_none() {
            self.init_trackers(now)?;
            self.process_edge_reached();
            return Ok(());
        }

        let o = self.config.orientation;
        if o.cross(previous) != o.cross(size) {
            debug!(?previous, ?size, "cross axis resized; full relayout");
            self.force_full_render(now)
        } else {
            self.refresh_viewability(now)
        }
    }

    /// A scroll event. Processed at most once per throttle interval; the
    /// latest sample inside an interval runs when it elapses.
    ///
    /// # Errors
    ///
    /// [`RecyclerError::InvalidItemType`] when a newly engaged index has no type.
    pub fn on_scroll(&mut self, sample: ScrollSample, now: Millis) -> Result<(), RecyclerError> {
        match self.scroll_throttle.try_run(sample, now) {
            Some(sample) => self.process_scroll(sample, now),
            None => Ok(()),
        }
    }

    /// Drag and momentum phases. A drag cancels any programmatic hold.
    pub fn on_scroll_gesture(&mut self, gesture: ScrollGesture) {
        match gesture {
            ScrollGesture::BeginDrag => {
                self.user_dragging = true;
                if self.hold_poll.is_running() || self.hold_release.is_pending() {
                    debug!("drag began; releasing held index");
                    self.release_hold();
                }
            }
            ScrollGesture::EndDrag => self.user_dragging = false,
            ScrollGesture::MomentumBegin => self.momentum_scrolling = true,
            ScrollGesture::MomentumEnd => self.momentum_scrolling = false,
        }
    }

    /// A mounted item measured itself (non deterministic rendering).
    pub fn on_item_size_changed(&mut self, index: usize, size: Dimension, now: Millis) {
        self.listeners.emit(&ListEvent::ItemLaidOut { index });
        if !self.config.force_non_deterministic_rendering || self.config.is_auto_layout() {
            return;
        }
        let Some(manager) = self.layout_manager.as_deref_mut() else {
            return;
        };
        if manager.override_layout(index, size) {
            self.request_relayout_from(index, now);
        }
    }

    /// A batch of rendered geometry from the content container (auto-layout).
    pub fn on_auto_layout(&mut self, id: u32, rendered: &[RenderedLayout], now: Millis) {
        if !self.config.is_auto_layout() {
            return;
        }
        let validity = self.auto_layout.classify(id);
        if validity == BatchValidity::Invalid {
            debug!(id, current = self.auto_layout.current(), "dropping auto-layout batch from before the data change");
            return;
        }
        let Some(manager) = self.layout_manager.as_deref_mut() else {
            return;
        };
        let stale = validity == BatchValidity::Stale;
        let changed = manager.override_layouts(rendered, stale);
        if !stale {
            self.pending_auto_layout = false;
        }
        trace!(id, stale, items = rendered.len(), ?changed, "auto-layout batch");
        if let Some(index) = changed {
            self.request_relayout_from(index, now);
        }
    }

    /// The content container finished growing after
    /// [`ListHost::request_content_measure`].
    pub fn on_content_measured(&mut self, extent: f64, now: Millis) {
        self.scroll_extent = extent;
        self.refix.retrigger(now, self.edge_visible);
    }

    /// Replace the data.
    ///
    /// With stable ids and change handling, mounted slots follow their items
    /// and the anchor follows its item to the new index. Layout is redone
    /// from the provider's first changed index.
    ///
    /// # Errors
    ///
    /// Errors of the relayout or of re-keying the render stack.
    pub fn set_data_provider(&mut self, data: D, now: Millis) -> Result<(), RecyclerError> {
        let old_size = self.data.size();
        if data.has_stable_ids() {
            if data.requires_data_change_handling() {
                self.handle_data_set_change(&data)?;
                let id = self.auto_layout.rebase();
                if self.config.is_auto_layout() {
                    self.host.set_auto_layout_id(id);
                }
            } else if self.coordinator.optimize_for_animations() {
                warn!("layout animation prepared but the new data provider does not require data change handling");
            }
        }
        self.data = data;

        let size = self.data.size();
        if size > old_size {
            self.edge_detector.reset();
        }
        self.coordinator.release_out_of_range(size);
        let first = self.data.first_index_to_process();
        if let Some(manager) = self.layout_manager.as_deref_mut() {
            manager.relayout_from_index(first, size)?;
            if self.config.is_auto_layout() {
                self.pending_auto_layout = true;
            }
            self.refresh(now)?;
            self.refix.queue(now);
        }
        debug!(old_size, size, first, "data provider changed");
        self.render_commit.schedule(now);
        Ok(())
    }

    /// Replace the layout type provider; geometry is rebuilt.
    ///
    /// # Errors
    ///
    /// Errors of the relayout.
    pub fn set_layout_provider(
        &mut self,
        provider: Rc<dyn LayoutTypeProvider>,
        now: Millis,
    ) -> Result<(), RecyclerError> {
        let first_visible = self.find_approx_first_visible_index();
        self.layout_provider = provider;
        self.rebuild_layout(true, first_visible, now)
    }

    /// Switch the scroll axis; geometry is rebuilt from estimates.
    ///
    /// # Errors
    ///
    /// Errors of the relayout.
    pub fn set_orientation(&mut self, orientation: Orientation, now: Millis) -> Result<(), RecyclerError> {
        if orientation == self.config.orientation {
            return Ok(());
        }
        let first_visible = self.find_approx_first_visible_index();
        self.config.orientation = orientation;
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.set_orientation(orientation);
        }
        self.rebuild_layout(false, first_visible, now)
    }

    /// Fire due timers. Call with the host clock whenever
    /// [`RecyclerListView::next_deadline`] has passed.
    ///
    /// # Errors
    ///
    /// Errors of relayouts or render window updates run by the timers.
    pub fn advance(&mut self, now: Millis) -> Result<(), RecyclerError> {
        if let Some(sample) = self.scroll_throttle.poll(now) {
            self.process_scroll(sample, now)?;
        }
        if self.state_refresh.poll(now) {
            self.apply_relayout_request(now)?;
        }
        if self.initial_scroll.poll(now) {
            self.process_pending_scroll(now);
        }
        if self.render_commit.poll(now) {
            self.commit_render();
        }
        match self.refix.poll(now, &self.refix_gate()) {
            RefixTick::Run => self.run_refix(now),
            RefixTick::Suppressed => trace!("refix suppressed; re-queued"),
            RefixTick::Idle => {}
        }
        if self.hold_poll.poll(now) {
            self.check_hold_landed(now);
        }
        if self.hold_release.poll(now) {
            self.release_hold();
        }
        Ok(())
    }

    /// Call [`RecyclerListView::advance`] until nothing more is due at `now`.
    ///
    /// # Errors
    ///
    /// Same as [`RecyclerListView::advance`].
    pub fn advance_until_idle(&mut self, now: Millis) -> Result<(), RecyclerError> {
        for _ in 0..MAX_SETTLE_PASSES {
            match self.next_deadline() {
                Some(deadline) if deadline <= now => self.advance(now)?,
                _ => return Ok(()),
            }
        }
        warn!(now, "timers still due after {MAX_SETTLE_PASSES} passes");
        Ok(())
    }

    /// Earliest time at which [`RecyclerListView::advance`] has work.
    pub fn next_deadline(&self) -> Option<Millis> {
        [
            self.scroll_throttle.deadline(),
            self.state_refresh.deadline(),
            self.initial_scroll.deadline(),
            self.render_commit.deadline(),
            self.refix.next_deadline(),
            self.hold_poll.next_tick(),
            self.hold_release.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    // ===== Programmatic scrolling =====

    /// Scroll so `index` starts at the top (or left) edge.
    ///
    /// With `preserve_visible_position`, the index is held as the anchor
    /// until the scroll lands, so relayouts cannot move the target.
    ///
    /// # Errors
    ///
    /// [`RecyclerError::LayoutUnavailable`] when `index` has no geometry.
    pub fn scroll_to_index(&mut self, index: usize, animate: bool, now: Millis) -> Result<(), RecyclerError> {
        let Some(manager) = self.layout_manager.as_deref() else {
            warn!(index, "scroll_to_index before the list has geometry; ignored");
            return Ok(());
        };
        let offset = manager.offset_for_index(index)?;
        let correct = self.config.window_correction.apply_to_item_scroll;
        self.scroll_to_offset_with(offset, animate, correct, Some(index), now);
        Ok(())
    }

    /// Scroll to a physical offset. The cross-axis coordinate is ignored.
    pub fn scroll_to_offset(&mut self, x: f64, y: f64, animate: bool, now: Millis) {
        self.scroll_to_offset_with(Point::new(x, y), animate, false, None, now);
    }

    /// Scroll to the start.
    pub fn scroll_to_top(&mut self, animate: bool, now: Millis) {
        self.scroll_to_offset(0.0, 0.0, animate, now);
    }

    /// Scroll to the last item.
    ///
    /// # Errors
    ///
    /// Same as [`RecyclerListView::scroll_to_index`].
    pub fn scroll_to_end(&mut self, animate: bool, now: Millis) -> Result<(), RecyclerError> {
        match self.data.size().checked_sub(1) {
            Some(last) => self.scroll_to_index(last, animate, now),
            None => Ok(()),
        }
    }

    /// Scroll to the first item equal to `item`. Unknown items are ignored.
    ///
    /// # Errors
    ///
    /// Same as [`RecyclerListView::scroll_to_index`].
    pub fn scroll_to_item(&mut self, item: &D::Item, animate: bool, now: Millis) -> Result<(), RecyclerError>
    where
        D::Item: PartialEq,
    {
        let found = (0..self.data.size()).find(|&index| self.data.data_at(index) == Some(item));
        match found {
            Some(index) => self.scroll_to_index(index, animate, now),
            None => {
                debug!("scroll_to_item: item not in data provider");
                Ok(())
            }
        }
    }

    /// Scroll the least distance that makes `index` fully visible.
    ///
    /// # Errors
    ///
    /// Same as [`RecyclerListView::scroll_to_index`].
    pub fn bring_to_focus(&mut self, index: usize, animate: bool, now: Millis) -> Result<(), RecyclerError> {
        let Some(layout) = self.get_layout(index).cloned() else {
            warn!(index, "bring_to_focus without geometry for the index; ignored");
            return Ok(());
        };
        let o = self.config.orientation;
        let viewport_main = o.main(self.viewport);
        let current = self.current_scroll_offset() + self.config.window_correction.value.window_shift;
        let item_start = o.main_pos(&layout);
        let item_size = o.main_size(&layout);
        let screen_end = current + viewport_main;

        if item_size > viewport_main || item_start < current || item_start > screen_end {
            return self.scroll_to_index(index, animate, now);
        }
        let item_end = item_start + item_size;
        if item_end > screen_end {
            let target = o.point_at(current + item_end - screen_end);
            self.scroll_to_offset_with(target, animate, true, Some(index), now);
        }
        Ok(())
    }

    // ===== Queries =====

    /// Lifecycle phase.
    pub fn phase(&self) -> ListPhase {
        match &self.tracker {
            None if self.initializing => ListPhase::Initializing,
            None => ListPhase::Uninitialized,
            Some(_) if self.pending_scroll.is_some() || !self.tracker_running || self.hold_poll.is_running() => {
                ListPhase::PendingScroll
            }
            Some(_) => ListPhase::Steady,
        }
    }

    /// Computed rectangle of `index`.
    pub fn get_layout(&self, index: usize) -> Option<&Layout> {
        layouts_of(&self.layout_manager).get(index)
    }

    /// Size of the content container.
    pub fn content_extent(&self) -> Dimension {
        self.layout_manager
            .as_deref()
            .map(|manager| manager.content_dimension())
            .unwrap_or_default()
    }

    /// Physical offset last reported by the container.
    pub fn current_scroll_offset(&self) -> f64 {
        self.tracker.as_ref().map_or(0.0, VisibilityTracker::last_actual_offset)
    }

    /// First item of the row at the top of the viewport.
    pub fn find_approx_first_visible_index(&self) -> usize {
        self.tracker.as_ref().map_or(0, |tracker| {
            tracker.find_first_logically_visible_index(layouts_of(&self.layout_manager))
        })
    }

    /// Change the render-ahead distance. Returns false before initialization.
    ///
    /// # Errors
    ///
    /// Errors of the render window update.
    pub fn update_render_ahead_offset(&mut self, value: f64, now: Millis) -> Result<bool, RecyclerError> {
        let layouts = layouts_of(&self.layout_manager);
        let Some(tracker) = self.tracker.as_mut() else {
            return Ok(false);
        };
        let change = tracker.update_render_ahead_offset(value, layouts);
        self.apply_window_change(change, now)?;
        Ok(true)
    }

    /// Current render-ahead distance.
    pub fn current_render_ahead_offset(&self) -> f64 {
        self.tracker
            .as_ref()
            .map_or(self.config.render_ahead_offset, VisibilityTracker::render_ahead_offset)
    }

    /// Viewport size.
    pub fn rendered_size(&self) -> Dimension {
        self.viewport
    }

    /// What the renderer needs to draw `index`, when it is mounted.
    pub fn item_props(&self, index: usize) -> Option<ItemProps> {
        let slot_key = self.coordinator.key_for_index(index)?.clone();
        let layout = self.get_layout(index)?.clone();
        Some(ItemProps {
            slot_key,
            index,
            item_type: layout.item_type,
            layout,
        })
    }

    /// Keep slot identity through the next data change so layout
    /// animations stay attached to their items. Reset after the next commit.
    pub fn prepare_for_layout_animation_render(&mut self) {
        self.coordinator.set_optimize_for_animations(true);
    }

    /// Change the window correction applied to physical offsets.
    pub fn set_window_correction(&mut self, correction: WindowCorrection) {
        self.config.window_correction.value = correction;
    }

    /// Register a listener.
    pub fn add_listener(&mut self, listener: impl FnMut(&ListEvent) + 'static) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregister a listener. Returns whether it was registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Visible indexes, ascending.
    pub fn visible_indexes(&self) -> &[usize] {
        self.tracker.as_ref().map_or(&[], VisibilityTracker::visible_indexes)
    }

    /// Engaged indexes, ascending.
    pub fn engaged_indexes(&self) -> &[usize] {
        self.tracker.as_ref().map_or(&[], VisibilityTracker::engaged_indexes)
    }

    /// Current render stack.
    pub fn render_stack(&self) -> Vec<RenderStackEntry> {
        self.coordinator.entries()
    }

    /// Anchor index, chosen or held.
    pub fn preserved_index(&self) -> Option<usize> {
        self.layout_manager.as_deref().and_then(|manager| manager.preserved_index())
    }

    /// True while a programmatic scroll holds the anchor.
    pub fn is_holding_index(&self) -> bool {
        self.layout_manager
            .as_deref()
            .is_some_and(|manager| manager.is_holding_index())
    }

    /// Id the host tags auto-layout batches with.
    pub fn auto_layout_id(&self) -> u32 {
        self.auto_layout.current()
    }

    /// Configuration in effect.
    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    /// Data provider in effect.
    pub fn data(&self) -> &D {
        &self.data
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Tear the list down, saving its context under the context key.
    /// Returns the host.
    pub fn unmount(mut self, store: &mut dyn ContextStore) -> H {
        self.cancel_timers();
        if let Some(key) = self.context_key.as_deref() {
            let layouts = self
                .config
                .force_non_deterministic_rendering
                .then(|| layouts_of(&self.layout_manager));
            let offset = self.current_scroll_offset();
            context::persist(store, key, offset, layouts);
            debug!(key, offset, "context saved");
        }
        self.host
    }

    // ===== Internals =====

    fn init_trackers(&mut self, now: Millis) -> Result<(), RecyclerError> {
        self.initializing = true;
        let o = self.config.orientation;

        let cached = self.cached_layouts.take();
        self.install_layout_manager(cached)?;
        let Some(manager) = self.layout_manager.as_deref() else {
            return Ok(());
        };
        let offset = match self.config.initial_render_index.filter(|&index| index > 0) {
            Some(index) => o.main_of_point(manager.offset_for_index(index)?),
            None => self.initial_offset,
        };
        let content = manager.content_dimension();
        self.initial_offset = offset;

        let (viewport_main, content_main) = (o.main(self.viewport), o.main(content));
        let mut tracker = VisibilityTracker::new(o, self.config.render_ahead_offset, offset);
        tracker.set_dimensions(viewport_main, content_main);
        self.tracker = Some(tracker);
        self.tracker_running = false;
        self.pending_auto_layout = self.config.is_auto_layout();
        self.host.set_content_extent(content);

        if offset > 0.0 && content_main > viewport_main {
            debug!(offset, "deferring tracker start until the initial scroll lands");
            self.pending_scroll = Some(o.point_at(offset));
            self.initial_scroll.schedule(now);
        } else {
            self.start_tracker(now)?;
        }
        self.initializing = false;
        debug!(viewport = ?self.viewport, items = self.data.size(), "list initialized");
        Ok(())
    }

    /// Replace the layout manager and lay out every item.
    fn install_layout_manager(&mut self, seed: Option<Vec<Layout>>) -> Result<(), RecyclerError> {
        let mut manager =
            WrapGridLayoutManager::new(Rc::clone(&self.layout_provider), self.viewport, self.config.orientation);
        if let Some(seed) = seed {
            manager = manager.with_cached_layouts(seed);
        }
        manager.relayout_from_index(0, self.data.size())?;
        self.layout_manager = Some(Box::new(manager));
        Ok(())
    }

    fn start_tracker(&mut self, now: Millis) -> Result<(), RecyclerError> {
        let correction = self.config.window_correction.value;
        let layouts = layouts_of(&self.layout_manager);
        let Some(tracker) = self.tracker.as_mut() else {
            return Ok(());
        };
        self.tracker_running = true;
        let change = tracker.init(&correction, layouts);
        self.apply_window_change(change, now)
    }

    fn process_scroll(&mut self, sample: ScrollSample, now: Millis) -> Result<(), RecyclerError> {
        let o = self.config.orientation;
        let offset = o.main_of_point(sample.offset);
        let correction = self.config.window_correction.value;

        let mut changes = Vec::with_capacity(2);
        let layouts = layouts_of(&self.layout_manager);
        if let Some(tracker) = self.tracker.as_mut() {
            if !self.tracker_running {
                self.tracker_running = true;
                changes.push(tracker.init(&correction, layouts));
            }
            changes.push(tracker.update_offset(offset, true, &correction, layouts));
        }
        for change in changes {
            self.apply_window_change(change, now)?;
        }
        self.process_edge_reached();
        self.scroll_offset = offset;

        let layouts = layouts_of(&self.layout_manager);
        if let (Some(first), Some(last), Some(content), Some(viewport)) =
            (layouts.first(), layouts.last(), sample.content_size, sample.viewport_size)
        {
            self.scroll_extent = o.main(content);
            let threshold = self.config.edge_visible_threshold;
            let start_edge = o.main_pos(first).max(0.0) + threshold;
            let last_end = o.main_pos(last) + o.main_size(last);
            let end_edge = last_end.min(self.scroll_extent) - o.main(viewport) - threshold;
            self.edge_visible = offset < start_edge || offset > end_edge;
            if self.edge_visible {
                self.refix.schedule_flush(now);
            }
        }
        self.refix.queue(now);
        Ok(())
    }

    fn apply_window_change(&mut self, change: Option<WindowChange>, now: Millis) -> Result<(), RecyclerError> {
        let Some(change) = change else {
            return Ok(());
        };
        if let Some(visible) = change.visible {
            trace!(now = ?visible.now, not_now = ?visible.not_now, "visible set changed");
            self.listeners.emit(&ListEvent::VisibilityChanged {
                all: visible.all,
                now: visible.now,
                not_now: visible.not_now,
            });
        }
        if let Some(engaged) = change.engaged {
            if self
                .coordinator
                .on_engaged_changed(&engaged, &self.data, self.layout_provider.as_ref())?
            {
                self.render_commit.schedule(now);
            }
        }
        self.preserve_anchor();
        Ok(())
    }

    /// Let the layout manager re-pick its anchor for the current windows.
    fn preserve_anchor(&mut self) {
        if !self.config.preserve_visible_position {
            return;
        }
        let (Some(manager), Some(tracker)) = (self.layout_manager.as_deref_mut(), self.tracker.as_ref()) else {
            return;
        };
        let visible = tracker.visible_indexes();
        let near_start = visible.first() == Some(&0) && tracker.last_offset() < self.config.edge_visible_threshold;
        if near_start && !self.config.start_edge_preserved {
            manager.preserve_indexes(&[0], &[0]);
        } else {
            manager.preserve_indexes(visible, tracker.engaged_indexes());
        }
    }

    fn process_edge_reached(&mut self) {
        let (Some(tracker), Some(manager)) = (self.tracker.as_ref(), self.layout_manager.as_deref()) else {
            return;
        };
        let o = self.config.orientation;
        let viewport_main = o.main(self.viewport);
        if viewport_main <= 0.0 {
            return;
        }
        let offset = tracker.last_offset();
        let content_main = o.main(manager.content_dimension());
        for edge in self.edge_detector.check(offset, viewport_main, content_main) {
            debug!(?edge, offset, "edge reached");
            let event = match edge {
                Edge::Start => ListEvent::StartReached,
                Edge::End => ListEvent::EndReached,
            };
            self.listeners.emit(&event);
        }
    }

    fn request_relayout_from(&mut self, index: usize, now: Millis) {
        self.relayout_request = Some(self.relayout_request.map_or(index, |pending| pending.min(index)));
        self.state_refresh.schedule(now);
    }

    fn apply_relayout_request(&mut self, now: Millis) -> Result<(), RecyclerError> {
        if let Some(index) = self.relayout_request.take() {
            let size = self.data.size();
            if let Some(manager) = self.layout_manager.as_deref_mut() {
                manager.relayout_from_index(index.min(size.saturating_sub(1)), size)?;
                debug!(index, "relayout after measurement");
                self.refresh(now)?;
                self.refix.queue(now);
            }
        }
        self.render_commit.schedule(now);
        Ok(())
    }

    fn refresh_viewability(&mut self, now: Millis) -> Result<(), RecyclerError> {
        self.refresh(now)?;
        self.state_refresh.schedule(now);
        Ok(())
    }

    /// Refit the tracker after geometry changed. Scrolls back when the
    /// content shrank under the current offset.
    fn refresh(&mut self, now: Millis) -> Result<(), RecyclerError> {
        let o = self.config.orientation;
        let viewport_main = o.main(self.viewport);
        let content_main = o.main(self.content_extent());
        let layouts = layouts_of(&self.layout_manager);
        let Some(tracker) = self.tracker.as_mut() else {
            return Ok(());
        };
        tracker.set_dimensions(viewport_main, content_main);
        let (should_force_scroll, change) = tracker.force_refresh(layouts);
        if should_force_scroll {
            self.pending_scroll = Some(o.point_at(tracker.last_actual_offset()));
            self.initial_scroll.schedule(now);
        }
        self.apply_window_change(change, now)
    }

    /// Refit at the first visible item's new position and scroll there.
    fn refresh_with_anchor(&mut self, first_visible: usize, now: Millis) -> Result<(), RecyclerError> {
        let o = self.config.orientation;
        let size = self.data.size();
        let mut offset = 0.0;
        if let (Some(manager), Some(last)) = (self.layout_manager.as_deref(), size.checked_sub(1)) {
            let point = manager.offset_for_index(first_visible.min(last))?;
            offset = o.main_of_point(point);
            self.pending_scroll = Some(point);
            self.initial_scroll.schedule(now);
        }
        let viewport_main = o.main(self.viewport);
        let content_main = o.main(self.content_extent());
        let layouts = layouts_of(&self.layout_manager);
        let Some(tracker) = self.tracker.as_mut() else {
            return Ok(());
        };
        tracker.set_dimensions(viewport_main, content_main);
        let change = tracker.force_refresh_with_offset(offset, layouts);
        self.apply_window_change(change, now)
    }

    fn force_full_render(&mut self, now: Millis) -> Result<(), RecyclerError> {
        let seed = self.layout_manager.as_deref_mut().map(|manager| manager.take_layouts());
        self.install_layout_manager(seed)?;
        self.refresh_viewability(now)?;
        self.refix.queue(now);
        Ok(())
    }

    fn rebuild_layout(&mut self, keep_layouts: bool, first_visible: usize, now: Millis) -> Result<(), RecyclerError> {
        if self.tracker.is_none() {
            return Ok(());
        }
        let seed = if keep_layouts {
            self.layout_manager.as_deref_mut().map(|manager| manager.take_layouts())
        } else {
            None
        };
        self.install_layout_manager(seed)?;
        if self.layout_provider.should_refresh_with_anchoring() {
            self.refresh_with_anchor(first_visible, now)?;
        } else {
            self.refresh(now)?;
        }
        debug!(first_visible, keep_layouts, "layout manager rebuilt");
        self.refresh_viewability(now)
    }

    /// Move the anchor to its item's new index and re-key mounted slots.
    fn handle_data_set_change(&mut self, new_data: &D) -> Result<(), RecyclerError> {
        if let Some(manager) = self.layout_manager.as_deref_mut() {
            let old_fix = manager.preserved_index();
            let anchor_id = self.hold_stable_id.clone().or_else(|| {
                old_fix
                    .filter(|&index| index < self.data.size())
                    .map(|index| self.data.stable_id(index))
            });
            if let (Some(old_index), Some(anchor_id)) = (old_fix, anchor_id) {
                let new_index = (0..new_data.size()).find(|&index| new_data.stable_id(index) == anchor_id);
                if let Some(new_index) = new_index.filter(|&index| index != old_index) {
                    manager.shift_preserved_index(old_index, new_index);
                    if self.config.shift_preserved_layouts {
                        manager.shift_layouts(new_index as isize - old_index as isize);
                    }
                    debug!(old_index, new_index, "anchor followed its item");
                }
            }
        }
        self.coordinator
            .handle_data_set_change(new_data, self.layout_provider.as_ref())
    }

    fn process_pending_scroll(&mut self, now: Millis) {
        let Some(target) = self.pending_scroll.take() else {
            return;
        };
        let correct = self.config.window_correction.apply_to_initial_offset;
        self.scroll_to_offset_with(target, false, correct, None, now);
        if std::mem::take(&mut self.pending_render) {
            self.commit_render();
        }
    }

    fn commit_render(&mut self) {
        if self.pending_scroll.is_some() {
            self.pending_render = true;
            return;
        }
        self.coordinator.take_dirty();
        let stack = self.coordinator.entries();
        let content = self.content_extent();
        self.host.set_content_extent(content);
        self.host.commit_render_stack(&stack);
        trace!(slots = stack.len(), "render stack committed");
        self.coordinator.set_optimize_for_animations(false);
        self.process_edge_reached();
    }

    fn refix_gate(&self) -> RefixGate {
        RefixGate {
            pending_auto_layout: self.pending_auto_layout,
            holding_index: self.is_holding_index(),
            user_dragging: self.user_dragging,
            momentum_scrolling: self.momentum_scrolling,
            edge_visible: self.edge_visible,
        }
    }

    fn run_refix(&mut self, now: Millis) {
        if self.scroll_extent <= 0.0 {
            trace!("refix skipped: container extent unknown");
            return;
        }
        let Some(manager) = self.layout_manager.as_deref_mut() else {
            return;
        };
        let outcome = manager.refix(RefixRequest {
            item_count: self.data.size(),
            scroll_offset: self.scroll_offset,
            scroll_extent: self.scroll_extent,
        });
        let content = manager.content_dimension();

        match outcome {
            RefixOutcome::Deferred => self.refix.retrigger(now, self.edge_visible),
            RefixOutcome::GrowContainer { extent } => self.host.request_content_measure(extent),
            RefixOutcome::Settled { .. } => self.host.set_content_extent(content),
            RefixOutcome::Applied { delta, .. } => {
                self.host.set_content_extent(content);
                self.reposition_mounted_slots();
                if self.config.is_auto_layout() {
                    self.pending_auto_layout = true;
                    let id = self.auto_layout.bump();
                    self.host.set_auto_layout_id(id);
                }
                let target = self.scroll_offset + delta;
                self.host.scroll_to(self.config.orientation.point_at(target), false);
                self.scroll_offset = target;
                self.scroll_throttle.cancel();
                if let Some(tracker) = self.tracker.as_mut() {
                    tracker.shift(delta);
                }
                debug!(delta, target, "refix applied");
            }
        }
    }

    fn reposition_mounted_slots(&mut self) {
        let layouts = layouts_of(&self.layout_manager);
        for (key, slot) in self.coordinator.render_stack() {
            if let Some(layout) = slot.data_index.and_then(|index| layouts.get(index)) {
                self.host.reposition_slot(key, layout.origin());
            }
        }
    }

    fn scroll_to_offset_with(
        &mut self,
        offset: Point,
        animate: bool,
        use_window_correction: bool,
        relative_index: Option<usize>,
        now: Millis,
    ) {
        let o = self.config.orientation;
        let mut main = o.main_of_point(offset);
        if use_window_correction {
            main -= self.config.window_correction.value.window_shift;
        }
        if let Some(index) = relative_index {
            if self.config.preserve_visible_position {
                self.hold_index(index, main, animate, now);
            }
        }
        let target = o.point_at(main);
        debug!(?target, animate, "scroll to offset");
        self.host.scroll_to(target, animate);
    }

    fn hold_index(&mut self, index: usize, target_main: f64, animate: bool, now: Millis) {
        let Some(manager) = self.layout_manager.as_deref_mut() else {
            return;
        };
        manager.hold_preserved_index(index);
        self.hold_stable_id = (index < self.data.size()).then(|| self.data.stable_id(index));
        if self.config.is_auto_layout() {
            let id = self.auto_layout.bump();
            self.host.set_auto_layout_id(id);
        }
        self.hold_release.cancel();
        if animate {
            self.hold_target = target_main;
            self.hold_poll.start(now);
        } else {
            self.hold_poll.stop();
            self.hold_release.schedule(now);
        }
        debug!(index, animate, "holding index");
    }

    fn check_hold_landed(&mut self, now: Millis) {
        let landed = (self.scroll_offset - self.hold_target).abs() < self.config.timing.hold_tolerance_px;
        let visible = self
            .preserved_index()
            .is_some_and(|index| self.visible_indexes().contains(&index));
        if landed && visible {
            self.hold_poll.stop();
            self.hold_release.schedule(now);
            trace!(target = self.hold_target, "scroll-to landed");
        }
    }

    fn release_hold(&mut self) {
        self.hold_poll.stop();
        self.hold_release.cancel();
        self.hold_stable_id = None;
        if let Some(manager) = self.layout_manager.as_deref_mut() {
            manager.unhold_preserved_index();
        }
        debug!("released held index");
    }

    fn cancel_timers(&mut self) {
        self.scroll_throttle.cancel();
        self.state_refresh.cancel();
        self.initial_scroll.cancel();
        self.render_commit.cancel();
        self.refix.cancel();
        self.hold_poll.stop();
        self.hold_release.cancel();
    }
}

#[cfg(test)]
#[path = "list_view_tests.rs"]
mod tests;
