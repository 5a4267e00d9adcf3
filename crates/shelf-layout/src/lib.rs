#![forbid(unsafe_code)]

//! Fixed-cell grid layout and viewport windowing.
//!
//! This crate holds the two pure geometric stages of a shelf grid:
//!
//! - [`GridLayout`] / [`PositionMap`] - index → pixel position under a column
//!   count derived from the container width
//! - [`viewport`] - which indices are (nearly) on screen for a scroll offset
//!
//! Everything here is deterministic: identical inputs give identical,
//! `PartialEq`-comparable outputs, so callers can skip downstream work when
//! a recomputation produced nothing new.
//!
//! # Layout rules
//!
//! ```text
//! columns = max(1, floor(container_width / (item_width + gap)))
//! row     = index / columns
//! col     = index % columns
//! x       = col * (item_width + gap)
//! y       = row * (item_height + gap)
//! height  = ceil(count / columns) * (item_height + gap) - gap   (0 when empty)
//! ```
//!
//! # Example
//!
//! ```
//! use shelf_layout::{GridLayout, LayoutConfig};
//!
//! let config = LayoutConfig::new(245.0, 450.0, 0.0);
//! let layout = GridLayout::for_width(20, 1000.0, config);
//! assert_eq!(layout.columns(), 4);
//! let p = layout.position(5).unwrap();
//! assert_eq!((p.x, p.y), (245.0, 450.0));
//! ```

pub mod viewport;

pub use shelf_core::geometry::{Point, Size, ViewportState};
pub use viewport::{ViewportWindow, VisibleRange, compute_visible_range, window_capacity};

/// Smallest item width or height accepted, in pixels.
pub const MIN_ITEM_EXTENT: f64 = 1.0;

/// Cell geometry shared by every item in a grid.
///
/// Immutable once built. Invalid dimensions are clamped on construction:
/// width and height to [`MIN_ITEM_EXTENT`], gap to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "RawLayoutConfig")
)]
pub struct LayoutConfig {
    item_width: f64,
    item_height: f64,
    gap: f64,
}

/// Unvalidated wire form of [`LayoutConfig`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawLayoutConfig {
    item_width: f64,
    item_height: f64,
    #[serde(default)]
    gap: f64,
}

#[cfg(feature = "serde")]
impl From<RawLayoutConfig> for LayoutConfig {
    fn from(raw: RawLayoutConfig) -> Self {
        Self::new(raw.item_width, raw.item_height, raw.gap)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            item_width: 245.0,
            item_height: 450.0,
            gap: 0.0,
        }
    }
}

impl LayoutConfig {
    /// Build a config, clamping invalid values and logging a warning.
    pub fn new(item_width: f64, item_height: f64, gap: f64) -> Self {
        Self {
            item_width: clamp_extent("item_width", item_width),
            item_height: clamp_extent("item_height", item_height),
            gap: clamp_gap(gap),
        }
    }

    /// Item width in pixels.
    #[inline]
    pub const fn item_width(&self) -> f64 {
        self.item_width
    }

    /// Item height in pixels.
    #[inline]
    pub const fn item_height(&self) -> f64 {
        self.item_height
    }

    /// Gap between neighbouring items in pixels.
    #[inline]
    pub const fn gap(&self) -> f64 {
        self.gap
    }

    /// Horizontal distance between the left edges of adjacent columns.
    #[inline]
    pub fn column_stride(&self) -> f64 {
        self.item_width + self.gap
    }

    /// Vertical distance between the top edges of adjacent rows.
    #[inline]
    pub fn row_stride(&self) -> f64 {
        self.item_height + self.gap
    }
}

fn clamp_extent(name: &'static str, value: f64) -> f64 {
    if value.is_finite() && value >= MIN_ITEM_EXTENT {
        return value;
    }
    tracing::warn!(
        field = name,
        value,
        clamped = MIN_ITEM_EXTENT,
        "invalid item extent, clamping"
    );
    MIN_ITEM_EXTENT
}

fn clamp_gap(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        return value;
    }
    tracing::warn!(value, "invalid item gap, clamping to 0");
    0.0
}

/// Number of columns that fit in `container_width`. Always at least 1.
pub fn column_count(container_width: f64, config: &LayoutConfig) -> usize {
    if !container_width.is_finite() || container_width <= 0.0 {
        return 1;
    }
    let fit = (container_width / config.column_stride()).floor();
    if fit >= usize::MAX as f64 {
        usize::MAX
    } else {
        (fit as usize).max(1)
    }
}

/// Number of rows needed for `item_count` items.
#[inline]
pub fn row_count(item_count: usize, columns: usize) -> usize {
    item_count.div_ceil(columns.max(1))
}

/// Pixel position of `index` in a grid with `columns` columns.
#[inline]
pub fn position(index: usize, columns: usize, config: &LayoutConfig) -> Point {
    let columns = columns.max(1);
    let row = index / columns;
    let col = index % columns;
    Point::new(
        col as f64 * config.column_stride(),
        row as f64 * config.row_stride(),
    )
}

/// Total content height; zero for an empty grid.
pub fn content_height(item_count: usize, columns: usize, config: &LayoutConfig) -> f64 {
    let rows = row_count(item_count, columns);
    if rows == 0 {
        return 0.0;
    }
    rows as f64 * config.row_stride() - config.gap
}

/// Index → position mapping for a fixed item count and column count.
///
/// Positions are computed on demand, so the map costs the same for ten items
/// as for a hundred thousand. Two maps compare equal exactly when every
/// position they yield is equal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionMap {
    len: usize,
    columns: usize,
    config: LayoutConfig,
}

impl PositionMap {
    /// Build a map for `len` items.
    pub fn new(len: usize, columns: usize, config: LayoutConfig) -> Self {
        Self {
            len,
            columns: columns.max(1),
            config,
        }
    }

    /// Position of `index`, or `None` past the end.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Point> {
        (index < self.len).then(|| position(index, self.columns, &self.config))
    }

    /// Number of mapped items.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the map is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Column count the map was built for.
    #[inline]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Iterate `(index, position)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Point)> + '_ {
        (0..self.len).map(|idx| (idx, position(idx, self.columns, &self.config)))
    }
}

/// Result of one layout pass: positions plus content extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    positions: PositionMap,
    content_height: f64,
}

impl GridLayout {
    /// Lay out `item_count` items in `columns` columns.
    pub fn compute(item_count: usize, columns: usize, config: LayoutConfig) -> Self {
        let positions = PositionMap::new(item_count, columns, config);
        Self {
            content_height: content_height(item_count, positions.columns(), &config),
            positions,
        }
    }

    /// Lay out `item_count` items in a container `container_width` pixels wide.
    pub fn for_width(item_count: usize, container_width: f64, config: LayoutConfig) -> Self {
        Self::compute(item_count, column_count(container_width, &config), config)
    }

    /// Column count.
    #[inline]
    pub const fn columns(&self) -> usize {
        self.positions.columns
    }

    /// Number of laid-out items.
    #[inline]
    pub const fn item_count(&self) -> usize {
        self.positions.len
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        row_count(self.positions.len, self.positions.columns)
    }

    /// Cell geometry.
    #[inline]
    pub const fn config(&self) -> &LayoutConfig {
        &self.positions.config
    }

    /// Total content height.
    #[inline]
    pub const fn content_height(&self) -> f64 {
        self.content_height
    }

    /// Position map.
    #[inline]
    pub const fn positions(&self) -> &PositionMap {
        &self.positions
    }

    /// Position of `index`, or `None` past the end.
    #[inline]
    pub fn position(&self, index: usize) -> Option<Point> {
        self.positions.get(index)
    }

    /// Scroll offset that puts the row containing `index` at the top.
    ///
    /// Clamped to the last reachable offset for a viewport of
    /// `viewport_height`.
    pub fn scroll_offset_for(&self, index: usize, viewport_height: f64) -> f64 {
        if self.positions.is_empty() {
            return 0.0;
        }
        let index = index.min(self.positions.len - 1);
        let top = position(index, self.columns(), self.config()).y;
        let max = (self.content_height - viewport_height.max(0.0)).max(0.0);
        top.min(max)
    }
}
