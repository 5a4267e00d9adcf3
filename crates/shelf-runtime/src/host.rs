#![forbid(unsafe_code)]

//! Host-side collaborators a grid talks to.
//!
//! The grid never owns the scrollable element or the paint loop. Instead the
//! host hands it a [`ScrollContainer`] (dimensions, scroll offset, resize
//! observation) and, optionally, a [`FrameScheduler`] that turns "something
//! changed" into a single later call to `VirtualGrid::on_frame`.

use shelf_core::geometry::Size;

/// Handle to a connected resize observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// The scrollable element a grid renders into.
///
/// Size changes are reported back to the grid through
/// `VirtualGrid::observe_resize`; connecting only tells the host to start
/// delivering them.
pub trait ScrollContainer {
    /// Current client size.
    fn size(&self) -> Size;

    /// Current vertical scroll offset.
    fn scroll_top(&self) -> f64;

    /// Start observing size changes.
    fn connect_resize_observer(&mut self) -> ObserverId;

    /// Stop observing size changes. Unknown ids are ignored.
    fn disconnect_resize_observer(&mut self, id: ObserverId);
}

/// Requests a paint opportunity from the host.
pub trait FrameScheduler {
    /// Ask for one `on_frame` call. Repeated requests before that call may
    /// be merged by the host.
    fn request_frame(&mut self);
}

impl<F: FnMut()> FrameScheduler for F {
    fn request_frame(&mut self) {
        self()
    }
}
