#![forbid(unsafe_code)]

//! The per-instance grid controller.
//!
//! [`VirtualGrid`] owns everything one rendered grid needs: the raw items,
//! the active [`FilterCriteria`], the order-change detector, the cached
//! layout, the viewport window, the slot recycler and the resize
//! coordinator. Hosts never drive those stages directly; they report what
//! happened (`set_items`, `set_criteria`, `scroll_to`, `observe_resize`)
//! and the grid queues it.
//!
//! # Flushing
//!
//! Queued events are coalesced (latest wins per kind) and applied by
//! [`VirtualGrid::flush`], which runs the stages in a fixed order:
//!
//! ```text
//! filter/sort → order change → layout → window → recycler → notifications
//! ```
//!
//! With a [`FrameScheduler`] attached the grid asks for one frame per burst
//! and the host calls [`VirtualGrid::on_frame`]; without one the host calls
//! `flush` itself after each burst.
//!
//! Notification hooks may queue more events through a [`GridHandle`]. Those
//! are picked up by another pass of the same flush, up to
//! [`GridConfig::max_flush_passes`]; anything left after that is deferred to
//! the next frame.
//!
//! # Failure Modes
//!
//! - No container at mount: [`RenderState::Degraded`], an `error!` log, and
//!   every later flush is a no-op.
//! - After [`VirtualGrid::teardown`] (or drop) all events are ignored and no
//!   stage runs again.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use shelf_core::criteria::FilterCriteria;
use shelf_core::event::GridEvent;
use shelf_core::event_coalescer::{EventCoalescer, PendingBurst};
use shelf_core::geometry::{Size, ViewportState};
use shelf_core::item::{CatalogItem, ItemKey};
use shelf_core::order_change::{OrderChange, OrderChangeDetector};
use shelf_core::pipeline::{available_brands, filter_sort_indices};
use shelf_layout::{GridLayout, ViewportWindow, VisibleRange, window_capacity};
use shelf_widgets::recycler::{ElementRecycler, SlotId, SlotPatch};

use crate::config::GridConfig;
use crate::host::{FrameScheduler, ScrollContainer};
use crate::resize_coordinator::{ResizeAction, ResizeCoordinator};

/// Lifecycle state of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Created, not yet mounted.
    Unmounted,
    /// Mounted without a container; renders nothing.
    Degraded,
    /// Mounted, but the filtered sequence is empty.
    Empty,
    /// Mounted with at least one item to show.
    Ready,
    /// Torn down; ignores everything.
    TornDown,
}

impl RenderState {
    /// Short label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unmounted => "unmounted",
            Self::Degraded => "degraded",
            Self::Empty => "empty",
            Self::Ready => "ready",
            Self::TornDown => "torn_down",
        }
    }

    /// Whether flushes run in this state.
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Empty | Self::Ready)
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The items currently bound, as reported to [`GridHooks::on_visible_items`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisibleItems {
    /// Filtered index range.
    pub range: VisibleRange,
    /// Keys of every visible item, in display order.
    pub keys: Vec<ItemKey>,
    /// Keys that were not visible in the previous notification.
    pub entered: Vec<ItemKey>,
}

type OnContentHeight = Box<dyn FnMut(f64)>;
type OnVisibleItems = Box<dyn FnMut(&VisibleItems)>;

/// Notification callbacks.
#[derive(Default)]
pub struct GridHooks {
    on_content_height: Option<OnContentHeight>,
    on_visible_items: Option<OnVisibleItems>,
}

impl fmt::Debug for GridHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridHooks")
            .field("on_content_height", &self.on_content_height.is_some())
            .field("on_visible_items", &self.on_visible_items.is_some())
            .finish()
    }
}

impl GridHooks {
    /// Create an empty hooks instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the total content height whenever it changes.
    #[must_use]
    pub fn on_content_height<F>(mut self, callback: F) -> Self
    where
        F: FnMut(f64) + 'static,
    {
        self.on_content_height = Some(Box::new(callback));
        self
    }

    /// Called whenever the set or order of visible items changes.
    #[must_use]
    pub fn on_visible_items<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&VisibleItems) + 'static,
    {
        self.on_visible_items = Some(Box::new(callback));
        self
    }

    fn fire_content_height(&mut self, height: f64) {
        if let Some(ref mut cb) = self.on_content_height {
            cb(height);
        }
    }

    fn fire_visible_items(&mut self, items: &VisibleItems) {
        if let Some(ref mut cb) = self.on_visible_items {
            cb(items);
        }
    }
}

/// What one flush changed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlushReport {
    /// Pipeline passes run.
    pub passes: u32,
    /// Slot changes for the host to paint, in order.
    pub patches: Vec<SlotPatch>,
    /// Whether the criteria signature changed (full recycler reset).
    pub order_changed: bool,
    /// Whether positions were recomputed with a different result.
    pub relayout: bool,
    /// Whether the visible keys changed. Patches are index-based, so new
    /// items at the same indices show up only here.
    pub visible_changed: bool,
    /// Whether events were left queued because the pass limit was hit.
    pub deferred: bool,
    /// Visible range after the flush.
    pub range: VisibleRange,
    /// Content height after the flush.
    pub content_height: f64,
}

impl FlushReport {
    /// Whether the flush changed nothing the host can see.
    pub fn is_noop(&self) -> bool {
        self.patches.is_empty() && !self.relayout && !self.order_changed && !self.visible_changed
    }
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridStats {
    /// Flushes that ran at least one pass.
    pub flushes: u64,
    /// Pipeline passes across all flushes.
    pub passes: u64,
    /// Passes whose layout differed from the previous one.
    pub relayouts: u64,
    /// Full recycler resets caused by order changes.
    pub order_resets: u64,
    /// Flushes that hit the pass limit.
    pub deferred_flushes: u64,
    /// Events queued.
    pub events_pushed: u64,
    /// Events absorbed by a later event of the same kind.
    pub events_coalesced: u64,
    /// Resizes applied after debouncing.
    pub resizes_applied: u64,
    /// Slots in the pool.
    pub pool_size: usize,
    /// Slots currently bound.
    pub bound_slots: usize,
}

struct Shared<P> {
    queue: RefCell<EventCoalescer<P>>,
    scheduler: RefCell<Option<Box<dyn FrameScheduler>>>,
    in_flush: Cell<bool>,
    frame_requested: Cell<bool>,
    closed: Cell<bool>,
}

impl<P> Shared<P> {
    fn new() -> Self {
        Self {
            queue: RefCell::new(EventCoalescer::new()),
            scheduler: RefCell::new(None),
            in_flush: Cell::new(false),
            frame_requested: Cell::new(false),
            closed: Cell::new(false),
        }
    }

    fn enqueue(&self, event: GridEvent<P>) {
        if self.closed.get() {
            tracing::trace!(kind = event.kind(), "event ignored after teardown");
            return;
        }
        self.queue.borrow_mut().push(event);
        self.schedule();
    }

    /// Request a frame unless a flush is running or one is already requested.
    fn schedule(&self) {
        if self.closed.get() || self.in_flush.get() || self.frame_requested.get() {
            return;
        }
        if let Some(scheduler) = self.scheduler.borrow_mut().as_mut() {
            self.frame_requested.set(true);
            scheduler.request_frame();
        }
    }

    fn take_burst(&self) -> PendingBurst<P> {
        self.queue.borrow_mut().flush()
    }

    fn has_pending(&self) -> bool {
        self.queue.borrow().has_pending()
    }
}

/// Cloneable handle for queueing events from outside the grid's borrow,
/// typically from inside a notification hook.
pub struct GridHandle<P> {
    shared: Rc<Shared<P>>,
}

impl<P> Clone for GridHandle<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<P> fmt::Debug for GridHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridHandle")
            .field("closed", &self.shared.closed.get())
            .finish()
    }
}

impl<P> GridHandle<P> {
    /// Queue an event.
    pub fn push(&self, event: GridEvent<P>) {
        self.shared.enqueue(event);
    }

    /// Queue an absolute scroll.
    pub fn scroll_to(&self, top: f64) {
        self.push(GridEvent::ScrollTo(top));
    }

    /// Queue new criteria.
    pub fn set_criteria(&self, criteria: FilterCriteria) {
        self.push(GridEvent::SetCriteria(criteria));
    }

    /// Whether the grid has been torn down.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.get()
    }
}

/// One virtualized grid bound to a host scroll container.
pub struct VirtualGrid<P, C: ScrollContainer> {
    config: GridConfig,
    state: RenderState,
    container: Option<C>,
    shared: Rc<Shared<P>>,
    hooks: GridHooks,

    items: Vec<CatalogItem<P>>,
    criteria: FilterCriteria,
    filtered: Vec<usize>,
    brands: Vec<String>,
    detector: OrderChangeDetector,

    viewport: ViewportState,
    layout: Option<GridLayout>,
    window: ViewportWindow,
    recycler: ElementRecycler,
    resize: ResizeCoordinator,

    notified_height: Option<f64>,
    notified_visible: Option<VisibleItems>,
    stats: GridStats,
}

impl<P, C: ScrollContainer> fmt::Debug for VirtualGrid<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualGrid")
            .field("state", &self.state)
            .field("items", &self.items.len())
            .field("filtered", &self.filtered.len())
            .field("criteria", &self.criteria)
            .field("viewport", &self.viewport)
            .field("range", &self.window.current())
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl<P, C: ScrollContainer> VirtualGrid<P, C> {
    /// Create an unmounted grid.
    pub fn new(config: GridConfig) -> Self {
        Self {
            window: ViewportWindow::new(config.buffer_rows),
            recycler: ElementRecycler::new(config.pool_size),
            resize: ResizeCoordinator::new(config.resize, Size::ZERO),
            config,
            state: RenderState::Unmounted,
            container: None,
            shared: Rc::new(Shared::new()),
            hooks: GridHooks::default(),
            items: Vec::new(),
            criteria: FilterCriteria::default(),
            filtered: Vec::new(),
            brands: Vec::new(),
            detector: OrderChangeDetector::new(),
            viewport: ViewportState::default(),
            layout: None,
            notified_height: None,
            notified_visible: None,
            stats: GridStats::default(),
        }
    }

    /// Install notification hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: GridHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Install a frame scheduler; queued events then request a frame
    /// instead of waiting for an explicit flush.
    #[must_use]
    pub fn with_frame_scheduler<S>(self, scheduler: S) -> Self
    where
        S: FrameScheduler + 'static,
    {
        *self.shared.scheduler.borrow_mut() = Some(Box::new(scheduler));
        self
    }

    /// Bind to `container` and run the first flush.
    ///
    /// With `None` the grid degrades: it logs an error and never renders.
    pub fn mount(&mut self, container: Option<C>) -> FlushReport {
        if self.state != RenderState::Unmounted {
            tracing::warn!(state = %self.state, "mount ignored");
            return self.idle_report();
        }

        let Some(mut container) = container else {
            tracing::error!("no scroll container at mount; grid degraded");
            self.state = RenderState::Degraded;
            return self.idle_report();
        };

        let size = container.size().rounded();
        self.viewport = ViewportState::new(container.scroll_top(), size.width, size.height);
        self.resize.record_applied(size);
        self.resize.attach(&mut container);
        self.container = Some(container);

        let columns = shelf_layout::column_count(size.width, &self.config.layout);
        let capacity = self.reserve_window(size.height, columns);
        tracing::debug!(
            width = size.width,
            height = size.height,
            pool_size = self.recycler.capacity(),
            window_capacity = capacity,
            "grid mounted"
        );

        // Provisional until the first pass classifies the items.
        self.state = RenderState::Empty;
        self.flush()
    }

    /// Stop rendering for good.
    ///
    /// Cancels any pending resize, disconnects the resize observer, drops
    /// queued events and destroys the slot pool. Returns the slots the host
    /// must remove. Calling it twice is harmless.
    pub fn teardown(&mut self) -> Vec<SlotId> {
        if self.state == RenderState::TornDown {
            return Vec::new();
        }
        if let Some(mut container) = self.container.take() {
            self.resize.detach(&mut container);
        } else {
            self.resize.cancel();
        }
        self.shared.closed.set(true);
        self.shared.queue.borrow_mut().clear();
        self.shared.scheduler.borrow_mut().take();
        let destroyed = self.recycler.clear();
        tracing::debug!(previous = %self.state, slots = destroyed.len(), "grid torn down");
        self.state = RenderState::TornDown;
        destroyed
    }

    // --- Host events ---

    /// Replace the raw item sequence.
    pub fn set_items(&mut self, items: Vec<CatalogItem<P>>) {
        self.shared.enqueue(GridEvent::ReplaceItems(items));
    }

    /// Replace the filter/sort criteria.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.shared.enqueue(GridEvent::SetCriteria(criteria));
    }

    /// Scroll to an absolute offset.
    pub fn scroll_to(&mut self, top: f64) {
        self.shared.enqueue(GridEvent::ScrollTo(top));
    }

    /// Scroll by a relative amount.
    pub fn scroll_by(&mut self, delta: f64) {
        self.shared.enqueue(GridEvent::ScrollBy(delta));
    }

    /// Re-read the container's scroll offset after a host scroll event.
    pub fn on_scroll(&mut self) {
        if let Some(top) = self.container.as_ref().map(ScrollContainer::scroll_top) {
            self.scroll_to(top);
        }
    }

    /// Scroll so the row holding filtered index `index` is at the top.
    ///
    /// Uses the layout from the last flush. Returns the queued offset, or
    /// `None` before the first flush.
    pub fn scroll_to_index(&mut self, index: usize) -> Option<f64> {
        let top = self
            .layout
            .as_ref()?
            .scroll_offset_for(index, self.viewport.height);
        self.scroll_to(top);
        Some(top)
    }

    /// Report a container size from the resize observer.
    pub fn observe_resize(&mut self, size: Size) -> ResizeAction {
        self.observe_resize_at(size, Instant::now())
    }

    /// Report a container size at a specific time.
    pub fn observe_resize_at(&mut self, size: Size, now: Instant) -> ResizeAction {
        if !self.state.is_live() {
            return ResizeAction::None;
        }
        let action = self.resize.observe_at(size, now);
        self.forward_resize(action);
        action
    }

    /// Advance the resize debounce timer.
    pub fn tick(&mut self) -> ResizeAction {
        self.tick_at(Instant::now())
    }

    /// Advance the resize debounce timer at a specific time.
    pub fn tick_at(&mut self, now: Instant) -> ResizeAction {
        if !self.state.is_live() {
            return ResizeAction::None;
        }
        let action = self.resize.tick_at(now);
        self.forward_resize(action);
        action
    }

    /// Time left before a pending resize applies.
    pub fn time_until_resize(&self, now: Instant) -> Option<Duration> {
        self.resize.time_until_apply(now)
    }

    fn forward_resize(&mut self, action: ResizeAction) {
        if let ResizeAction::Apply { size, .. } = action {
            self.stats.resizes_applied += 1;
            self.shared.enqueue(GridEvent::Resize(size));
        }
    }

    // --- Flushing ---

    /// Host paint callback after a requested frame.
    pub fn on_frame(&mut self) -> FlushReport {
        self.flush()
    }

    /// Apply everything queued.
    pub fn flush(&mut self) -> FlushReport {
        if !self.state.is_live() {
            if self.shared.has_pending() {
                tracing::trace!(state = %self.state, "flush skipped");
            }
            return self.idle_report();
        }

        let limit = self.config.flush_pass_limit();
        let mut report = self.idle_report();
        self.shared.frame_requested.set(false);
        self.shared.in_flush.set(true);
        loop {
            if report.passes >= limit {
                if self.shared.has_pending() {
                    tracing::warn!(passes = report.passes, "flush pass limit reached; deferring");
                    self.stats.deferred_flushes += 1;
                    report.deferred = true;
                }
                break;
            }
            let burst = self.shared.take_burst();
            if burst.is_empty() && self.layout.is_some() {
                break;
            }
            report.passes += 1;
            self.run_pass(burst, &mut report);
        }
        self.shared.in_flush.set(false);

        if report.passes > 0 {
            self.stats.flushes += 1;
            self.stats.passes += u64::from(report.passes);
        }
        if report.deferred {
            self.shared.schedule();
        }
        report
    }

    fn run_pass(&mut self, burst: PendingBurst<P>, report: &mut FlushReport) {
        let _span = tracing::debug_span!(
            "grid_flush",
            pass = report.passes,
            events = burst.events,
        )
        .entered();

        let first_pass = self.layout.is_none();
        let pipeline_dirty = burst.touches_pipeline() || first_pass;
        let scroll = burst.scroll_top(self.viewport.scroll_top);
        if let Some(items) = burst.items {
            self.items = items;
            self.brands = available_brands(&self.items);
        }
        if let Some(criteria) = burst.criteria {
            self.criteria = criteria;
        }
        let resized = burst.viewport.is_some();
        if let Some(size) = burst.viewport {
            self.viewport.set_size(size.rounded());
        }
        if let Some(top) = scroll {
            self.viewport.scroll_top = top;
        }

        // Filter/sort and order detection.
        let order = if pipeline_dirty {
            let order = self.detector.observe(&self.criteria);
            self.filtered = filter_sort_indices(&self.items, &self.criteria);
            order
        } else {
            OrderChange::Unchanged
        };

        // Layout.
        let layout = GridLayout::for_width(self.filtered.len(), self.viewport.width, self.config.layout);
        let relayout = self.layout != Some(layout);
        if relayout {
            tracing::debug!(
                items = layout.item_count(),
                columns = layout.columns(),
                content_height = layout.content_height(),
                "relayout"
            );
            self.layout = Some(layout);
            self.stats.relayouts += 1;
        }
        let max_scroll = (layout.content_height() - self.viewport.height).max(0.0);
        self.viewport.scroll_top = if self.viewport.scroll_top.is_finite() {
            self.viewport.scroll_top.clamp(0.0, max_scroll)
        } else {
            0.0
        };

        // Window and recycler.
        if resized {
            self.reserve_window(self.viewport.height, layout.columns());
        }
        if order.is_changed() {
            self.window.reset();
            self.stats.order_resets += 1;
        }
        let range_changed = self.window.update(&self.viewport, &layout).is_some();
        if order.is_changed() || relayout || range_changed {
            let patches = self
                .recycler
                .apply(self.window.current(), layout.positions(), order.is_changed());
            report.patches.extend(patches);
        }

        let next_state = if self.filtered.is_empty() {
            RenderState::Empty
        } else {
            RenderState::Ready
        };
        if next_state != self.state {
            tracing::debug!(from = %self.state, to = %next_state, "render state changed");
            self.state = next_state;
        }

        report.order_changed |= order.is_changed();
        report.relayout |= relayout;
        report.range = self.window.current();
        report.content_height = layout.content_height();

        report.visible_changed |= self.notify(layout.content_height());
    }

    /// Size the pool for the largest window a viewport of `height` can show.
    fn reserve_window(&mut self, height: f64, columns: usize) -> usize {
        let capacity = window_capacity(height, columns, &self.config.layout, self.config.buffer_rows);
        self.recycler.reserve(capacity.max(self.config.pool_size));
        capacity
    }

    /// Fire hooks for whatever changed. Returns whether the visible keys did.
    fn notify(&mut self, content_height: f64) -> bool {
        if self.notified_height != Some(content_height) {
            self.notified_height = Some(content_height);
            self.hooks.fire_content_height(content_height);
        }

        let range = self.window.current();
        let keys: Vec<ItemKey> = range
            .iter()
            .filter_map(|idx| self.filtered.get(idx))
            .filter_map(|&src| self.items.get(src))
            .map(|item| item.key.clone())
            .collect();
        let unchanged = self
            .notified_visible
            .as_ref()
            .is_some_and(|prev| prev.range == range && prev.keys == keys);
        if unchanged {
            return false;
        }

        let entered = match self.notified_visible.as_ref() {
            Some(prev) => {
                let seen: HashSet<&ItemKey> = prev.keys.iter().collect();
                keys.iter().filter(|k| !seen.contains(k)).cloned().collect()
            }
            None => keys.clone(),
        };
        let visible = VisibleItems {
            range,
            keys,
            entered,
        };
        self.hooks.fire_visible_items(&visible);
        self.notified_visible = Some(visible);
        true
    }

    fn idle_report(&self) -> FlushReport {
        FlushReport {
            range: self.window.current(),
            content_height: self.content_height(),
            ..FlushReport::default()
        }
    }

    // --- Accessors ---

    /// Lifecycle state.
    #[inline]
    pub fn render_state(&self) -> RenderState {
        self.state
    }

    /// Visible filtered-index range.
    #[inline]
    pub fn visible_range(&self) -> VisibleRange {
        self.window.current()
    }

    /// Total content height.
    pub fn content_height(&self) -> f64 {
        self.layout.as_ref().map_or(0.0, GridLayout::content_height)
    }

    /// Current column count (1 before the first flush).
    pub fn columns(&self) -> usize {
        self.layout.as_ref().map_or(1, GridLayout::columns)
    }

    /// Current layout, if any flush has run.
    #[inline]
    pub fn layout(&self) -> Option<&GridLayout> {
        self.layout.as_ref()
    }

    /// Number of items passing the criteria.
    #[inline]
    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    /// Distinct trimmed brands across the unfiltered items.
    #[inline]
    pub fn available_brands(&self) -> &[String] {
        &self.brands
    }

    /// Item at a filtered index.
    pub fn item_at(&self, filtered_index: usize) -> Option<&CatalogItem<P>> {
        self.filtered
            .get(filtered_index)
            .and_then(|&src| self.items.get(src))
    }

    /// Raw items as last applied.
    #[inline]
    pub fn items(&self) -> &[CatalogItem<P>] {
        &self.items
    }

    /// Active criteria as last applied.
    #[inline]
    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Viewport as last applied.
    #[inline]
    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    /// Last visible-items notification.
    #[inline]
    pub fn visible_items(&self) -> Option<&VisibleItems> {
        self.notified_visible.as_ref()
    }

    /// Slot pool.
    #[inline]
    pub fn recycler(&self) -> &ElementRecycler {
        &self.recycler
    }

    /// Host container, while mounted.
    #[inline]
    pub fn container(&self) -> Option<&C> {
        self.container.as_ref()
    }

    /// Configuration.
    #[inline]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Handle for queueing events from hooks.
    pub fn handle(&self) -> GridHandle<P> {
        GridHandle {
            shared: Rc::clone(&self.shared),
        }
    }

    /// Whether events are waiting for a flush.
    pub fn has_pending(&self) -> bool {
        self.shared.has_pending()
    }

    /// Whether a debounced resize is waiting.
    pub fn has_pending_resize(&self) -> bool {
        self.resize.has_pending()
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> GridStats {
        let queue = self.shared.queue.borrow();
        let recycler = self.recycler.stats();
        GridStats {
            events_pushed: queue.pushed_count(),
            events_coalesced: queue.coalesced_count(),
            pool_size: recycler.pool_size,
            bound_slots: recycler.bound,
            ..self.stats
        }
    }
}

impl<P, C: ScrollContainer> Drop for VirtualGrid<P, C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ObserverId;
    use shelf_core::criteria::{OrganicFilter, SortKey};
    use shelf_layout::LayoutConfig;
    use std::time::Duration;

    struct FixedContainer {
        size: Size,
        connected: Rc<Cell<i32>>,
    }

    impl ScrollContainer for FixedContainer {
        fn size(&self) -> Size {
            self.size
        }

        fn scroll_top(&self) -> f64 {
            0.0
        }

        fn connect_resize_observer(&mut self) -> ObserverId {
            self.connected.set(self.connected.get() + 1);
            ObserverId(1)
        }

        fn disconnect_resize_observer(&mut self, _id: ObserverId) {
            self.connected.set(self.connected.get() - 1);
        }
    }

    fn container(width: f64, height: f64) -> (FixedContainer, Rc<Cell<i32>>) {
        let connected = Rc::new(Cell::new(0));
        (
            FixedContainer {
                size: Size::new(width, height),
                connected: Rc::clone(&connected),
            },
            connected,
        )
    }

    fn items(n: usize) -> Vec<CatalogItem<()>> {
        (0..n)
            .map(|i| {
                CatalogItem::keyed(format!("p{i}"))
                    .with_price(i as f64)
                    .with_organic(i % 3 == 0)
            })
            .collect()
    }

    fn grid() -> VirtualGrid<(), FixedContainer> {
        VirtualGrid::new(GridConfig::default().with_buffer_rows(0))
    }

    #[test]
    fn mount_without_items_is_empty() {
        let (c, connected) = container(1000.0, 900.0);
        let mut g = grid();
        let report = g.mount(Some(c));
        assert_eq!(g.render_state(), RenderState::Empty);
        assert!(report.patches.is_empty());
        assert_eq!(g.content_height(), 0.0);
        assert!(g.visible_range().is_empty());
        assert_eq!(connected.get(), 1);
    }

    #[test]
    fn mount_with_items_shows_first_rows() {
        let (c, _) = container(1000.0, 900.0);
        let mut g = grid();
        g.set_items(items(20));
        let report = g.mount(Some(c));
        assert_eq!(g.render_state(), RenderState::Ready);
        assert_eq!(g.columns(), 4);
        assert_eq!(g.visible_range(), VisibleRange::inclusive(0, 7));
        assert_eq!(report.patches.len(), 8);
        assert_eq!(report.content_height, 2250.0);
        assert!(report.order_changed);
    }

    #[test]
    fn degraded_without_container() {
        let mut g = grid();
        g.set_items(items(20));
        g.mount(None);
        assert_eq!(g.render_state(), RenderState::Degraded);
        assert!(g.flush().patches.is_empty());
        assert_eq!(g.stats().flushes, 0);
    }

    #[test]
    fn flush_with_nothing_queued_is_noop() {
        let (c, _) = container(1000.0, 900.0);
        let mut g = grid();
        g.set_items(items(20));
        g.mount(Some(c));
        let report = g.flush();
        assert_eq!(report.passes, 0);
        assert!(report.is_noop());
    }

    #[test]
    fn criteria_change_resets_recycler() {
        let (c, _) = container(1000.0, 900.0);
        let mut g = grid();
        g.set_items(items(20));
        g.mount(Some(c));

        g.set_criteria(FilterCriteria::new().with_sort(SortKey::PriceDescending));
        let report = g.flush();
        assert!(report.order_changed);
        assert_eq!(g.item_at(0).map(|i| i.key.as_str()), Some("p19"));
        // One reset at mount, one for the new sort.
        assert_eq!(g.recycler().stats().resets, 2);

        // Same criteria again: no reset.
        g.set_criteria(FilterCriteria::new().with_sort(SortKey::PriceDescending));
        let report = g.flush();
        assert!(!report.order_changed);
        assert!(report.patches.is_empty());
    }

    #[test]
    fn replacing_items_keeps_bindings() {
        let (c, _) = container(1000.0, 900.0);
        let mut g = grid();
        g.set_items(items(20));
        g.mount(Some(c));
        g.set_items(items(20));
        let report = g.flush();
        assert!(!report.order_changed);
        assert!(report.patches.is_empty());
        assert!(!report.visible_changed);
        assert!(report.is_noop());
    }

    #[test]
    fn filter_to_empty() {
        let (c, _) = container(1000.0, 900.0);
        let mut g = grid();
        g.set_items(vec![CatalogItem::keyed("a").with_organic(false)]);
        g.mount(Some(c));
        g.set_criteria(FilterCriteria::new().with_organic(OrganicFilter::Organic));
        g.flush();
        assert_eq!(g.render_state(), RenderState::Empty);
        assert_eq!(g.content_height(), 0.0);
        assert_eq!(g.recycler().live_slots(), 0);
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let (c, _) = container(1000.0, 900.0);
        let mut g = grid();
        g.set_items(items(20));
        g.mount(Some(c));
        g.scroll_to(1.0e6);
        g.flush();
        assert_eq!(g.viewport().scroll_top, 1350.0);
        g.scroll_by(-5000.0);
        g.flush();
        assert_eq!(g.viewport().scroll_top, 0.0);
    }

    #[test]
    fn scroll_to_index_targets_row() {
        let (c, _) = container(1000.0, 900.0);
        let mut g = grid();
        g.set_items(items(40));
        g.mount(Some(c));
        assert_eq!(g.scroll_to_index(9), Some(900.0));
        g.flush();
        assert_eq!(g.visible_range(), VisibleRange::inclusive(8, 15));
    }

    #[test]
    fn resize_relayouts_after_debounce() {
        let (c, _) = container(1000.0, 900.0);
        let mut g = grid();
        g.set_items(items(20));
        g.mount(Some(c));

        let t0 = Instant::now();
        g.observe_resize_at(Size::new(500.0, 900.0), t0);
        assert!(g.flush().is_noop());
        assert!(matches!(g.tick_at(t0 + Duration::from_millis(50)), ResizeAction::Apply { .. }));
        let report = g.flush();
        assert!(report.relayout);
        assert_eq!(g.columns(), 2);
        assert_eq!(g.content_height(), 4500.0);
        assert_eq!(g.visible_range(), VisibleRange::inclusive(0, 3));
    }

    #[test]
    fn teardown_disconnects_and_ignores_events() {
        let (c, connected) = container(1000.0, 900.0);
        let mut g = grid();
        g.set_items(items(20));
        g.mount(Some(c));
        let destroyed = g.teardown();
        assert_eq!(destroyed.len(), shelf_widgets::DEFAULT_POOL_SIZE);
        assert_eq!(connected.get(), 0);
        assert_eq!(g.render_state(), RenderState::TornDown);

        g.set_items(items(5));
        assert!(!g.has_pending());
        assert!(g.flush().patches.is_empty());
        assert!(g.teardown().is_empty());
    }

    #[test]
    fn drop_runs_teardown() {
        let (c, connected) = container(1000.0, 900.0);
        {
            let mut g = grid();
            g.mount(Some(c));
            assert_eq!(connected.get(), 1);
        }
        assert_eq!(connected.get(), 0);
    }

    #[test]
    fn second_mount_is_ignored() {
        let (a, _) = container(1000.0, 900.0);
        let (b, b_connected) = container(500.0, 900.0);
        let mut g = grid();
        g.mount(Some(a));
        g.mount(Some(b));
        assert_eq!(b_connected.get(), 0);
        assert_eq!(g.container().map(|c| c.size.width), Some(1000.0));
    }

    #[test]
    fn config_layout_is_used() {
        let (c, _) = container(1000.0, 900.0);
        let mut g: VirtualGrid<(), FixedContainer> = VirtualGrid::new(
            GridConfig::default().with_layout(LayoutConfig::new(100.0, 100.0, 0.0)),
        );
        g.set_items(items(50));
        g.mount(Some(c));
        assert_eq!(g.columns(), 10);
        assert_eq!(g.content_height(), 500.0);
    }
}
