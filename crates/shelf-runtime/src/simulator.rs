#![forbid(unsafe_code)]

//! Deterministic headless host for testing.
//!
//! [`HeadlessHost`] drives a [`VirtualGrid`] without any real UI: the scroll
//! container is an in-memory [`HeadlessContainer`], frames are requested
//! into [`ManualFrames`], and every [`SlotPatch`] is applied to a
//! [`HeadlessSurface`] that checks it against its own view of the slots.
//!
//! # Example
//!
//! ```
//! use shelf_core::geometry::Size;
//! use shelf_core::item::CatalogItem;
//! use shelf_runtime::config::GridConfig;
//! use shelf_runtime::simulator::HeadlessHost;
//!
//! let mut host = HeadlessHost::new(GridConfig::default(), Size::new(1000.0, 900.0));
//! host.grid_mut().set_items((0..20u64).map(|i| CatalogItem::new(i, ())).collect());
//! host.mount().unwrap();
//!
//! assert_eq!(host.grid().columns(), 4);
//! assert_eq!(host.surface().visible_indices().len(), host.grid().visible_range().len());
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use shelf_core::geometry::{Point, Size};
use shelf_widgets::recycler::{SlotId, SlotPatch};

use crate::config::GridConfig;
use crate::grid::{FlushReport, GridHooks, VirtualGrid};
use crate::host::{FrameScheduler, ObserverId, ScrollContainer};
use crate::resize_coordinator::ResizeAction;

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ContainerState {
    size: Size,
    scroll_top: f64,
    observers: Vec<ObserverId>,
    next_observer: u64,
    connects: u64,
    disconnects: u64,
}

/// In-memory scroll container. Clones share state, so a test can keep one
/// handle while the grid owns another.
#[derive(Debug, Clone, Default)]
pub struct HeadlessContainer {
    state: Rc<RefCell<ContainerState>>,
}

impl HeadlessContainer {
    /// Create a container of the given size, scrolled to the top.
    pub fn new(size: Size) -> Self {
        let container = Self::default();
        container.state.borrow_mut().size = size;
        container
    }

    /// Change the client size. Observers are not notified; the host does that.
    pub fn set_size(&self, size: Size) {
        self.state.borrow_mut().size = size;
    }

    /// Change the scroll offset.
    pub fn set_scroll_top(&self, top: f64) {
        self.state.borrow_mut().scroll_top = top;
    }

    /// Whether any resize observer is connected.
    pub fn is_observed(&self) -> bool {
        !self.state.borrow().observers.is_empty()
    }

    /// Observer connections made so far.
    pub fn connect_count(&self) -> u64 {
        self.state.borrow().connects
    }

    /// Observer disconnections made so far.
    pub fn disconnect_count(&self) -> u64 {
        self.state.borrow().disconnects
    }
}

impl ScrollContainer for HeadlessContainer {
    fn size(&self) -> Size {
        self.state.borrow().size
    }

    fn scroll_top(&self) -> f64 {
        self.state.borrow().scroll_top
    }

    fn connect_resize_observer(&mut self) -> ObserverId {
        let mut state = self.state.borrow_mut();
        state.next_observer += 1;
        state.connects += 1;
        let id = ObserverId(state.next_observer);
        state.observers.push(id);
        id
    }

    fn disconnect_resize_observer(&mut self, id: ObserverId) {
        let mut state = self.state.borrow_mut();
        let before = state.observers.len();
        state.observers.retain(|o| *o != id);
        if state.observers.len() < before {
            state.disconnects += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Frame scheduler that only counts requests.
#[derive(Debug, Clone, Default)]
pub struct ManualFrames {
    requested: Rc<Cell<u32>>,
    total: Rc<Cell<u64>>,
}

impl ManualFrames {
    /// Create a scheduler with nothing requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a frame is outstanding.
    pub fn is_requested(&self) -> bool {
        self.requested.get() > 0
    }

    /// Consume the outstanding request, if any.
    pub fn take(&self) -> bool {
        self.requested.replace(0) > 0
    }

    /// Requests made since creation.
    pub fn total_requests(&self) -> u64 {
        self.total.get()
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) {
        self.requested.set(self.requested.get() + 1);
        self.total.set(self.total.get() + 1);
    }
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// A patch the surface could not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// `Show` on a slot that is already showing something.
    AlreadyShown { slot: SlotId, showing: usize },
    /// `Move` or `Hide` on a slot that is not showing `index`.
    NotShown { slot: SlotId, index: usize },
    /// Two visible slots claim the same index.
    DuplicateIndex { index: usize },
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyShown { slot, showing } => {
                write!(f, "{slot} is already showing index {showing}")
            }
            Self::NotShown { slot, index } => write!(f, "{slot} is not showing index {index}"),
            Self::DuplicateIndex { index } => write!(f, "index {index} shown by two slots"),
        }
    }
}

impl std::error::Error for PatchError {}

/// One host element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Element {
    /// Index shown, when visible.
    pub index: Option<usize>,
    /// Last position.
    pub position: Point,
    /// Times the element was shown.
    pub shows: u32,
}

/// Host-side element table built only from patches.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    elements: BTreeMap<SlotId, Element>,
    created: usize,
    destroyed: usize,
}

impl HeadlessSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply patches in order, stopping at the first inconsistent one.
    pub fn apply(&mut self, patches: &[SlotPatch]) -> Result<(), PatchError> {
        for patch in patches {
            self.apply_one(patch)?;
        }
        Ok(())
    }

    fn apply_one(&mut self, patch: &SlotPatch) -> Result<(), PatchError> {
        match *patch {
            SlotPatch::Show {
                slot,
                index,
                position,
            } => {
                if self.elements.values().any(|e| e.index == Some(index)) {
                    return Err(PatchError::DuplicateIndex { index });
                }
                let created = &mut self.created;
                let element = self.elements.entry(slot).or_insert_with(|| {
                    *created += 1;
                    Element::default()
                });
                if let Some(showing) = element.index {
                    return Err(PatchError::AlreadyShown { slot, showing });
                }
                element.index = Some(index);
                element.position = position;
                element.shows += 1;
            }
            SlotPatch::Move {
                slot,
                index,
                position,
            } => {
                let element = self.shown_mut(slot, index)?;
                element.position = position;
            }
            SlotPatch::Hide { slot, index } => {
                let element = self.shown_mut(slot, index)?;
                element.index = None;
            }
        }
        Ok(())
    }

    fn shown_mut(&mut self, slot: SlotId, index: usize) -> Result<&mut Element, PatchError> {
        self.elements
            .get_mut(&slot)
            .filter(|e| e.index == Some(index))
            .ok_or(PatchError::NotShown { slot, index })
    }

    /// Remove elements for destroyed slots.
    pub fn destroy(&mut self, slots: &[SlotId]) {
        for slot in slots {
            if self.elements.remove(slot).is_some() {
                self.destroyed += 1;
            }
        }
    }

    /// Visible indices in ascending order.
    pub fn visible_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.elements.values().filter_map(|e| e.index).collect();
        indices.sort_unstable();
        indices
    }

    /// Element for a slot.
    pub fn element(&self, slot: SlotId) -> Option<&Element> {
        self.elements.get(&slot)
    }

    /// Position of the element showing `index`.
    pub fn position_of(&self, index: usize) -> Option<Point> {
        self.elements
            .values()
            .find(|e| e.index == Some(index))
            .map(|e| e.position)
    }

    /// Elements currently alive.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Elements ever created.
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Elements destroyed.
    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// A grid wired to a headless container, frame scheduler and surface.
pub struct HeadlessHost<P> {
    grid: VirtualGrid<P, HeadlessContainer>,
    container: HeadlessContainer,
    frames: ManualFrames,
    surface: HeadlessSurface,
    reports: Vec<FlushReport>,
}

impl<P> HeadlessHost<P> {
    /// Create a host with an unmounted grid.
    pub fn new(config: GridConfig, size: Size) -> Self {
        let frames = ManualFrames::new();
        Self {
            grid: VirtualGrid::new(config).with_frame_scheduler(frames.clone()),
            container: HeadlessContainer::new(size),
            frames,
            surface: HeadlessSurface::new(),
            reports: Vec::new(),
        }
    }

    /// Install notification hooks. Call before [`mount`](Self::mount).
    #[must_use]
    pub fn with_hooks(mut self, hooks: GridHooks) -> Self {
        self.grid = self.grid.with_hooks(hooks);
        self
    }

    /// Mount the grid on the headless container and paint the first flush.
    pub fn mount(&mut self) -> Result<(), PatchError> {
        // Mount flushes everything queued so far.
        self.frames.take();
        let report = self.grid.mount(Some(self.container.clone()));
        self.paint(report)
    }

    /// Run one frame if the grid asked for one.
    pub fn run_frame(&mut self) -> Result<Option<&FlushReport>, PatchError> {
        if !self.frames.take() {
            return Ok(None);
        }
        let report = self.grid.on_frame();
        self.paint(report)?;
        Ok(self.reports.last())
    }

    /// Run frames until the grid stops asking, up to `max` frames.
    pub fn settle(&mut self, max: usize) -> Result<usize, PatchError> {
        let mut frames = 0;
        while frames < max && self.run_frame()?.is_some() {
            frames += 1;
        }
        Ok(frames)
    }

    /// Scroll the container and report it.
    pub fn scroll_to(&mut self, top: f64) {
        self.container.set_scroll_top(top);
        self.grid.on_scroll();
    }

    /// Resize the container and report it to the grid's observer.
    pub fn resize_at(&mut self, size: Size, now: Instant) -> ResizeAction {
        self.container.set_size(size);
        if self.container.is_observed() {
            self.grid.observe_resize_at(size, now)
        } else {
            ResizeAction::None
        }
    }

    /// Advance the debounce clock.
    pub fn advance_to(&mut self, now: Instant) -> ResizeAction {
        self.grid.tick_at(now)
    }

    /// Tear the grid down and destroy its elements.
    pub fn teardown(&mut self) {
        let destroyed = self.grid.teardown();
        self.surface.destroy(&destroyed);
    }

    fn paint(&mut self, report: FlushReport) -> Result<(), PatchError> {
        self.surface.apply(&report.patches)?;
        self.reports.push(report);
        Ok(())
    }

    /// The grid.
    pub fn grid(&self) -> &VirtualGrid<P, HeadlessContainer> {
        &self.grid
    }

    /// The grid, mutably, for queueing events.
    pub fn grid_mut(&mut self) -> &mut VirtualGrid<P, HeadlessContainer> {
        &mut self.grid
    }

    /// Test-side handle to the container.
    pub fn container(&self) -> &HeadlessContainer {
        &self.container
    }

    /// Frame scheduler.
    pub fn frames(&self) -> &ManualFrames {
        &self.frames
    }

    /// Painted surface.
    pub fn surface(&self) -> &HeadlessSurface {
        &self.surface
    }

    /// Reports of every painted flush, oldest first.
    pub fn reports(&self) -> &[FlushReport] {
        &self.reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_layout::LayoutConfig;
    use std::time::Duration;

    #[test]
    fn container_tracks_observers() {
        let mut c = HeadlessContainer::new(Size::new(10.0, 10.0));
        let handle = c.clone();
        let id = c.connect_resize_observer();
        assert!(handle.is_observed());
        c.disconnect_resize_observer(id);
        c.disconnect_resize_observer(id);
        assert!(!handle.is_observed());
        assert_eq!(handle.disconnect_count(), 1);
    }

    #[test]
    fn surface_rejects_inconsistent_patches() {
        let mut s = HeadlessSurface::new();
        let slot = shelf_widgets::recycler::ElementRecycler::new(1)
            .apply(
                shelf_layout::VisibleRange::inclusive(0, 0),
                shelf_layout::GridLayout::compute(1, 1, LayoutConfig::default()).positions(),
                false,
            )[0]
            .slot();
        s.apply(&[SlotPatch::Show {
            slot,
            index: 0,
            position: Point::ORIGIN,
        }])
        .unwrap();
        let err = s
            .apply(&[SlotPatch::Hide { slot, index: 3 }])
            .unwrap_err();
        assert_eq!(err, PatchError::NotShown { slot, index: 3 });
        assert!(err.to_string().contains("not showing index 3"));
    }

    #[test]
    fn frames_requested_once_per_burst() {
        let mut host: HeadlessHost<()> =
            HeadlessHost::new(GridConfig::default(), Size::new(1000.0, 900.0));
        host.mount().unwrap();
        assert!(!host.frames().is_requested());

        host.scroll_to(10.0);
        host.scroll_to(20.0);
        host.grid_mut().scroll_by(5.0);
        assert_eq!(host.frames().total_requests(), 1);
        assert_eq!(host.settle(8).unwrap(), 1);
    }

    #[test]
    fn debounced_resize_paints_new_columns() {
        let mut host = HeadlessHost::new(GridConfig::default(), Size::new(1000.0, 900.0));
        host.grid_mut()
            .set_items((0..20u64).map(|i| shelf_core::item::CatalogItem::new(i, ())).collect());
        host.mount().unwrap();
        assert_eq!(host.surface().position_of(5), Some(Point::new(245.0, 450.0)));

        let t0 = Instant::now();
        host.resize_at(Size::new(500.0, 900.0), t0);
        assert_eq!(host.settle(4).unwrap(), 0);
        host.advance_to(t0 + Duration::from_millis(50));
        assert_eq!(host.settle(4).unwrap(), 1);
        assert_eq!(host.grid().columns(), 2);
        assert_eq!(host.surface().position_of(5), Some(Point::new(245.0, 900.0)));
    }
}
