#![forbid(unsafe_code)]

//! Debounced container-resize handling.
//!
//! Dragging a window edge produces a size report per animation frame.
//! Relaying out a grid for each would waste most of that work, so the
//! coordinator keeps only the latest size and applies it once the container
//! has been quiet for [`ResizeConfig::quiet_period_ms`].
//!
//! - **Latest wins**: each observation replaces the pending size and
//!   restarts the quiet period.
//! - **Optional deadline**: with [`ResizeConfig::max_wait_ms`] set, a burst
//!   longer than the deadline is applied anyway.
//! - **Pixel-stable**: sizes are snapped to whole pixels before comparison,
//!   so sub-pixel jitter never schedules work.
//!
//! Time is passed in explicitly through the `*_at` methods; the plain
//! variants read [`Instant::now`].
//!
//! # Usage
//!
//! ```
//! use std::time::{Duration, Instant};
//! use shelf_core::geometry::Size;
//! use shelf_runtime::resize_coordinator::{ResizeAction, ResizeConfig, ResizeCoordinator};
//!
//! let mut coordinator = ResizeCoordinator::new(ResizeConfig::default(), Size::new(1000.0, 800.0));
//! coordinator.attach_detached();
//!
//! let t0 = Instant::now();
//! assert_eq!(coordinator.observe_at(Size::new(700.0, 800.0), t0), ResizeAction::Pending);
//! assert_eq!(coordinator.observe_at(Size::new(500.0, 800.0), t0 + Duration::from_millis(20)), ResizeAction::Pending);
//!
//! // Not quiet long enough yet.
//! assert_eq!(coordinator.tick_at(t0 + Duration::from_millis(60)), ResizeAction::Pending);
//!
//! match coordinator.tick_at(t0 + Duration::from_millis(70)) {
//!     ResizeAction::Apply { size, coalesced, .. } => {
//!         assert_eq!(size, Size::new(500.0, 800.0));
//!         assert_eq!(coalesced, 2);
//!     }
//!     other => panic!("expected apply, got {other:?}"),
//! }
//! ```
//!
//! # Failure Modes
//!
//! After [`ResizeCoordinator::detach`] every observation and tick returns
//! [`ResizeAction::None`], so a resize that was in flight when the grid went
//! away can never reach the layout stage.

use std::time::{Duration, Instant};

use shelf_core::geometry::Size;

use crate::host::{ObserverId, ScrollContainer};

/// Default quiet period before a pending resize is applied.
pub const DEFAULT_QUIET_PERIOD_MS: u64 = 50;

/// Configuration for resize debouncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ResizeConfig {
    /// Time without further observations before applying (ms).
    pub quiet_period_ms: u64,
    /// Apply a continuous burst after this long even if it never quiets (ms).
    pub max_wait_ms: Option<u64>,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: DEFAULT_QUIET_PERIOD_MS,
            max_wait_ms: None,
        }
    }
}

impl ResizeConfig {
    /// Set the quiet period.
    #[must_use]
    pub fn with_quiet_period_ms(mut self, ms: u64) -> Self {
        self.quiet_period_ms = ms;
        self
    }

    /// Set or clear the burst deadline.
    #[must_use]
    pub fn with_max_wait_ms(mut self, ms: Option<u64>) -> Self {
        self.max_wait_ms = ms;
        self
    }

    fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }
}

/// What the caller should do after an observation or tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeAction {
    /// Nothing to do.
    None,
    /// A resize is waiting for the quiet period.
    Pending,
    /// Relayout at `size` now.
    Apply {
        /// Settled container size, snapped to whole pixels.
        size: Size,
        /// Observations folded into this apply.
        coalesced: u64,
        /// Time from the first observation of the burst to the apply.
        waited: Duration,
        /// Whether the burst deadline forced the apply.
        forced: bool,
    },
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeStats {
    /// Observations accepted while attached.
    pub observed: u64,
    /// Resizes applied.
    pub applied: u64,
    /// Pending resizes dropped by `cancel` or `detach`.
    pub cancelled: u64,
    /// Whether a resize is pending.
    pub has_pending: bool,
    /// Last applied size.
    pub last_applied: Size,
}

/// Debounces size reports from one scroll container.
#[derive(Debug, Clone)]
pub struct ResizeCoordinator {
    config: ResizeConfig,
    attached: bool,
    observer: Option<ObserverId>,
    pending: Option<Size>,
    last_applied: Size,
    window_start: Option<Instant>,
    last_event: Option<Instant>,
    events_in_window: u64,
    observed: u64,
    applied: u64,
    cancelled: u64,
}

impl ResizeCoordinator {
    /// Create a detached coordinator that considers `initial` already applied.
    pub fn new(config: ResizeConfig, initial: Size) -> Self {
        Self {
            config,
            attached: false,
            observer: None,
            pending: None,
            last_applied: initial.rounded(),
            window_start: None,
            last_event: None,
            events_in_window: 0,
            observed: 0,
            applied: 0,
            cancelled: 0,
        }
    }

    /// Start observing `container`.
    ///
    /// Re-attaching first disconnects the previous observer.
    pub fn attach<C: ScrollContainer + ?Sized>(&mut self, container: &mut C) {
        if let Some(previous) = self.observer.take() {
            container.disconnect_resize_observer(previous);
        }
        self.observer = Some(container.connect_resize_observer());
        self.attached = true;
        tracing::debug!(observer = ?self.observer, "resize observer connected");
    }

    /// Accept observations without a host observer, for callers that feed
    /// sizes in by hand.
    pub fn attach_detached(&mut self) {
        self.attached = true;
    }

    /// Stop observing: cancel anything pending and disconnect the observer.
    pub fn detach<C: ScrollContainer + ?Sized>(&mut self, container: &mut C) {
        self.cancel();
        if let Some(id) = self.observer.take() {
            container.disconnect_resize_observer(id);
            tracing::debug!(observer = ?id, "resize observer disconnected");
        }
        self.attached = false;
    }

    /// Whether observations are accepted.
    #[inline]
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Connected observer, if any.
    #[inline]
    pub const fn observer(&self) -> Option<ObserverId> {
        self.observer
    }

    /// Record a size report.
    pub fn observe(&mut self, size: Size) -> ResizeAction {
        self.observe_at(size, Instant::now())
    }

    /// Record a size report at a specific time.
    pub fn observe_at(&mut self, size: Size, now: Instant) -> ResizeAction {
        if !self.attached {
            tracing::trace!(?size, "resize ignored while detached");
            return ResizeAction::None;
        }
        let size = size.rounded();
        self.observed += 1;

        if self.pending.is_none() && size == self.last_applied {
            return ResizeAction::None;
        }

        self.pending = Some(size);
        self.events_in_window += 1;
        let start = *self.window_start.get_or_insert(now);
        self.last_event = Some(now);

        if let Some(max_wait) = self.config.max_wait()
            && now.saturating_duration_since(start) >= max_wait
        {
            return self.apply_pending(now, true);
        }
        ResizeAction::Pending
    }

    /// Advance the quiet-period timer.
    pub fn tick(&mut self) -> ResizeAction {
        self.tick_at(Instant::now())
    }

    /// Advance the quiet-period timer at a specific time.
    pub fn tick_at(&mut self, now: Instant) -> ResizeAction {
        if !self.attached || self.pending.is_none() {
            return ResizeAction::None;
        }

        if let Some(max_wait) = self.config.max_wait()
            && let Some(start) = self.window_start
            && now.saturating_duration_since(start) >= max_wait
        {
            return self.apply_pending(now, true);
        }

        match self.last_event {
            Some(last) if now.saturating_duration_since(last) >= self.config.quiet_period() => {
                self.apply_pending(now, false)
            }
            _ => ResizeAction::Pending,
        }
    }

    fn apply_pending(&mut self, now: Instant, forced: bool) -> ResizeAction {
        let Some(size) = self.pending.take() else {
            return ResizeAction::None;
        };
        let coalesced = std::mem::take(&mut self.events_in_window);
        let waited = self
            .window_start
            .take()
            .map_or(Duration::ZERO, |start| now.saturating_duration_since(start));
        self.last_event = None;

        if size == self.last_applied {
            tracing::debug!(?size, coalesced, "resize burst settled at applied size");
            return ResizeAction::None;
        }

        self.last_applied = size;
        self.applied += 1;
        tracing::debug!(
            width = size.width,
            height = size.height,
            coalesced,
            waited_ms = waited.as_millis() as u64,
            forced,
            "resize applied"
        );
        ResizeAction::Apply {
            size,
            coalesced,
            waited,
            forced,
        }
    }

    /// Time left before the pending resize would apply.
    pub fn time_until_apply(&self, now: Instant) -> Option<Duration> {
        self.pending?;
        let last = self.last_event?;
        let mut remaining = self
            .config
            .quiet_period()
            .saturating_sub(now.saturating_duration_since(last));
        if let Some(max_wait) = self.config.max_wait()
            && let Some(start) = self.window_start
        {
            remaining = remaining.min(max_wait.saturating_sub(now.saturating_duration_since(start)));
        }
        Some(remaining)
    }

    /// Drop any pending resize.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            self.cancelled += 1;
            tracing::debug!("pending resize cancelled");
        }
        self.window_start = None;
        self.last_event = None;
        self.events_in_window = 0;
    }

    /// Whether a resize is waiting.
    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Last applied size.
    #[inline]
    pub const fn last_applied(&self) -> Size {
        self.last_applied
    }

    /// Record a size applied outside the debounce path (e.g. at mount).
    pub fn record_applied(&mut self, size: Size) {
        self.last_applied = size.rounded();
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> ResizeStats {
        ResizeStats {
            observed: self.observed,
            applied: self.applied,
            cancelled: self.cancelled,
            has_pending: self.pending.is_some(),
            last_applied: self.last_applied,
        }
    }
}
