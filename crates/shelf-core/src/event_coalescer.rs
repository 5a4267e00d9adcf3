#![forbid(unsafe_code)]

//! Burst coalescing for grid events.
//!
//! A single host tick can produce several state changes: new items arrive,
//! the user flips a filter, and the container reports a new size. Replaying
//! each of them through the pipeline would lay the grid out several times
//! in a row. [`EventCoalescer`] folds them into one [`PendingBurst`] instead:
//!
//! - **Items, criteria, resize**: latest wins.
//! - **Scroll**: absolute offsets replace each other; relative deltas
//!   accumulate on top of whatever is pending.
//!
//! The runtime drains the coalescer once per flush and applies the burst in
//! fixed order.
//!
//! # Usage
//!
//! ```
//! use shelf_core::event::GridEvent;
//! use shelf_core::event_coalescer::EventCoalescer;
//! use shelf_core::geometry::Size;
//!
//! let mut coalescer: EventCoalescer<()> = EventCoalescer::new();
//! coalescer.push(GridEvent::Resize(Size::new(1000.0, 800.0)));
//! coalescer.push(GridEvent::ScrollTo(100.0));
//! coalescer.push(GridEvent::ScrollBy(50.0));
//! coalescer.push(GridEvent::Resize(Size::new(500.0, 800.0)));
//!
//! let burst = coalescer.flush();
//! assert_eq!(burst.viewport, Some(Size::new(500.0, 800.0)));
//! assert_eq!(burst.scroll_top(0.0), Some(150.0));
//! assert_eq!(burst.events, 4);
//! ```

use crate::criteria::FilterCriteria;
use crate::event::GridEvent;
use crate::geometry::Size;
use crate::item::CatalogItem;

/// Pending scroll, either absolute or relative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingScroll {
    /// Scroll to this offset.
    To(f64),
    /// Scroll by this delta from the current offset.
    By(f64),
}

/// Everything that changed during one burst.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingBurst<P> {
    /// Replacement item sequence.
    pub items: Option<Vec<CatalogItem<P>>>,
    /// Replacement criteria.
    pub criteria: Option<FilterCriteria>,
    /// Scroll change.
    pub scroll: Option<PendingScroll>,
    /// Settled container size.
    pub viewport: Option<Size>,
    /// Number of raw events folded into this burst.
    pub events: u32,
}

impl<P> Default for PendingBurst<P> {
    fn default() -> Self {
        Self {
            items: None,
            criteria: None,
            scroll: None,
            viewport: None,
            events: 0,
        }
    }
}

impl<P> PendingBurst<P> {
    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_none()
            && self.criteria.is_none()
            && self.scroll.is_none()
            && self.viewport.is_none()
    }

    /// Whether the burst touches the pipeline inputs (items or criteria).
    #[must_use]
    pub fn touches_pipeline(&self) -> bool {
        self.items.is_some() || self.criteria.is_some()
    }

    /// Resolve the pending scroll against the current offset.
    #[must_use]
    pub fn scroll_top(&self, current: f64) -> Option<f64> {
        self.scroll.map(|scroll| match scroll {
            PendingScroll::To(top) => top,
            PendingScroll::By(delta) => current + delta,
        })
    }
}

/// Folds host events into a single pending burst.
///
/// Not thread-safe; owned by one grid and driven from the UI thread.
#[derive(Debug, Clone)]
pub struct EventCoalescer<P> {
    pending: PendingBurst<P>,
    /// Total events ever pushed.
    pushed: u64,
    /// Events absorbed into an earlier event of the same kind.
    coalesced: u64,
}

impl<P> Default for EventCoalescer<P> {
    fn default() -> Self {
        Self {
            pending: PendingBurst::default(),
            pushed: 0,
            coalesced: 0,
        }
    }
}

impl<P> EventCoalescer<P> {
    /// Create an empty coalescer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event.
    pub fn push(&mut self, event: GridEvent<P>) {
        tracing::trace!(kind = event.kind(), "grid event queued");
        self.pushed += 1;
        self.pending.events = self.pending.events.saturating_add(1);

        let replaced = match event {
            GridEvent::ReplaceItems(items) => self.pending.items.replace(items).is_some(),
            GridEvent::SetCriteria(criteria) => self.pending.criteria.replace(criteria).is_some(),
            GridEvent::Resize(size) => self.pending.viewport.replace(size).is_some(),
            GridEvent::ScrollTo(top) => self.pending.scroll.replace(PendingScroll::To(top)).is_some(),
            GridEvent::ScrollBy(delta) => {
                let merged = match self.pending.scroll {
                    Some(PendingScroll::To(top)) => PendingScroll::To(top + delta),
                    Some(PendingScroll::By(prev)) => PendingScroll::By(prev + delta),
                    None => PendingScroll::By(delta),
                };
                self.pending.scroll.replace(merged).is_some()
            }
        };
        if replaced {
            self.coalesced += 1;
        }
    }

    /// Take the pending burst, leaving the coalescer empty.
    #[must_use]
    pub fn flush(&mut self) -> PendingBurst<P> {
        std::mem::take(&mut self.pending)
    }

    /// Whether anything is queued.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drop everything queued without applying it.
    pub fn clear(&mut self) {
        self.pending = PendingBurst::default();
    }

    /// Events pushed since creation.
    #[must_use]
    pub fn pushed_count(&self) -> u64 {
        self.pushed
    }

    /// Events that were absorbed by a later event of the same kind.
    #[must_use]
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }
}
