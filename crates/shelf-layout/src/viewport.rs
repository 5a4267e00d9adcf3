#![forbid(unsafe_code)]

//! Visible index range for a scroll position.
//!
//! Given a rounded viewport and a [`GridLayout`], [`compute_visible_range`]
//! returns the inclusive span of item indices whose rows intersect the
//! viewport, widened by a number of buffer rows on each side so that items
//! are bound slightly before they scroll into view.
//!
//! # Invariants
//!
//! - The range is a subset of `[0, item_count - 1]` and empty iff
//!   `item_count == 0`.
//! - Scroll offset and height are snapped to whole pixels first, so two
//!   viewports that differ only by sub-pixel jitter produce the same range.
//! - Ranges always start on a row boundary.
//!
//! # Failure Modes
//!
//! Negative, NaN or infinite scroll offsets are treated as 0. A scroll
//! offset past the end of the content pins the range to the last row.

use std::ops::Range;

use shelf_core::geometry::ViewportState;

use crate::{GridLayout, LayoutConfig};

/// Inclusive span of visible item indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VisibleRange {
    bounds: Option<(usize, usize)>,
}

impl VisibleRange {
    /// No visible items.
    pub const EMPTY: Self = Self { bounds: None };

    /// Range `[first, last]`; empty when `first > last`.
    #[inline]
    pub const fn inclusive(first: usize, last: usize) -> Self {
        if first > last {
            Self::EMPTY
        } else {
            Self {
                bounds: Some((first, last)),
            }
        }
    }

    /// First visible index.
    #[inline]
    pub fn first(&self) -> Option<usize> {
        self.bounds.map(|(first, _)| first)
    }

    /// Last visible index.
    #[inline]
    pub fn last(&self) -> Option<usize> {
        self.bounds.map(|(_, last)| last)
    }

    /// Whether no index is visible.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// Number of visible indices.
    #[inline]
    pub fn len(&self) -> usize {
        self.bounds.map_or(0, |(first, last)| last - first + 1)
    }

    /// Whether `index` lies in the range.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.bounds
            .is_some_and(|(first, last)| (first..=last).contains(&index))
    }

    /// Half-open equivalent, `0..0` when empty.
    #[inline]
    pub fn as_range(&self) -> Range<usize> {
        self.bounds.map_or(0..0, |(first, last)| first..last + 1)
    }

    /// Iterate visible indices in ascending order.
    #[inline]
    pub fn iter(&self) -> Range<usize> {
        self.as_range()
    }
}

impl std::fmt::Display for VisibleRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.bounds {
            Some((first, last)) => write!(f, "[{first}, {last}]"),
            None => f.write_str("[]"),
        }
    }
}

/// Compute the visible range for `viewport` over `layout`.
pub fn compute_visible_range(
    viewport: &ViewportState,
    layout: &GridLayout,
    buffer_rows: usize,
) -> VisibleRange {
    let count = layout.item_count();
    if count == 0 {
        return VisibleRange::EMPTY;
    }

    let vp = viewport.rounded();
    let stride = layout.config().row_stride();
    let columns = layout.columns();
    let last_row = layout.rows() - 1;

    let first_visible = (vp.scroll_top / stride).floor() as usize;
    let last_visible = if vp.height >= 1.0 {
        (((vp.scroll_top + vp.height - 1.0) / stride).floor() as usize).max(first_visible)
    } else {
        first_visible
    };

    let first_row = first_visible.saturating_sub(buffer_rows).min(last_row);
    let end_row = last_visible.saturating_add(buffer_rows).min(last_row);

    let first = first_row * columns;
    let last = end_row
        .saturating_add(1)
        .saturating_mul(columns)
        .saturating_sub(1)
        .min(count - 1);
    VisibleRange::inclusive(first, last)
}

/// Upper bound on the number of indices a window can hold for a viewport of
/// `viewport_height` pixels.
///
/// Used to size a slot pool so a steady-state scroll never has to grow it.
pub fn window_capacity(
    viewport_height: f64,
    columns: usize,
    config: &LayoutConfig,
    buffer_rows: usize,
) -> usize {
    let height = shelf_core::geometry::snap_px(viewport_height);
    let rows = (height / config.row_stride()).ceil() as usize;
    // A partially scrolled viewport straddles one extra row.
    let rows = rows
        .saturating_add(1)
        .saturating_add(buffer_rows.saturating_mul(2));
    rows.saturating_mul(columns.max(1))
}

/// Stateful window that reports only real changes.
#[derive(Debug, Clone, Default)]
pub struct ViewportWindow {
    buffer_rows: usize,
    current: Option<VisibleRange>,
}

impl ViewportWindow {
    /// Create a window with `buffer_rows` extra rows on each side.
    pub const fn new(buffer_rows: usize) -> Self {
        Self {
            buffer_rows,
            current: None,
        }
    }

    /// Buffer rows on each side of the viewport.
    #[inline]
    pub const fn buffer_rows(&self) -> usize {
        self.buffer_rows
    }

    /// Recompute the range. Returns `None` when it equals the previous one.
    ///
    /// The first update after construction or [`reset`](Self::reset) always
    /// returns `Some`, even for an empty range.
    pub fn update(
        &mut self,
        viewport: &ViewportState,
        layout: &GridLayout,
    ) -> Option<VisibleRange> {
        let range = compute_visible_range(viewport, layout, self.buffer_rows);
        if self.current == Some(range) {
            return None;
        }
        self.current = Some(range);
        Some(range)
    }

    /// Last reported range; empty before the first update.
    #[inline]
    pub fn current(&self) -> VisibleRange {
        self.current.unwrap_or(VisibleRange::EMPTY)
    }

    /// Forget the last range so the next update always reports.
    pub fn reset(&mut self) {
        self.current = None;
    }
}
