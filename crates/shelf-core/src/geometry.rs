#![forbid(unsafe_code)]

//! Geometric primitives in CSS pixels.
//!
//! Hosts report fractional values (scroll offsets and container sizes read
//! from a layout engine), so everything here is `f64`. Consumers that need
//! jitter-free comparisons use the `rounded()` helpers, which snap to whole
//! pixels.

/// A position in grid content coordinates (origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Horizontal offset in pixels.
    pub x: f64,
    /// Vertical offset in pixels.
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Size {
    /// Zero-sized.
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Snap both dimensions to whole, non-negative pixels.
    ///
    /// Non-finite values become zero.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            width: snap_px(self.width),
            height: snap_px(self.height),
        }
    }

    /// Check if either dimension is zero after rounding.
    #[inline]
    pub fn is_empty(&self) -> bool {
        let r = self.rounded();
        r.width == 0.0 || r.height == 0.0
    }
}

/// Scroll position plus container dimensions, as observed from the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportState {
    /// Vertical scroll offset of the container.
    pub scroll_top: f64,
    /// Container width.
    pub width: f64,
    /// Container height.
    pub height: f64,
}

impl ViewportState {
    /// Create a viewport state.
    #[inline]
    pub const fn new(scroll_top: f64, width: f64, height: f64) -> Self {
        Self {
            scroll_top,
            width,
            height,
        }
    }

    /// Container size.
    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Replace the container size, keeping the scroll offset.
    #[inline]
    pub fn set_size(&mut self, size: Size) {
        self.width = size.width;
        self.height = size.height;
    }

    /// Snap the scroll offset and dimensions to whole, non-negative pixels.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            scroll_top: snap_px(self.scroll_top),
            width: snap_px(self.width),
            height: snap_px(self.height),
        }
    }
}

/// Round to the nearest whole pixel, mapping negatives and non-finite input to 0.
#[inline]
pub fn snap_px(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value.round()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_px_rounds_and_clamps() {
        assert_eq!(snap_px(10.4), 10.0);
        assert_eq!(snap_px(10.6), 11.0);
        assert_eq!(snap_px(-3.0), 0.0);
        assert_eq!(snap_px(f64::NAN), 0.0);
        assert_eq!(snap_px(f64::INFINITY), 0.0);
    }

    #[test]
    fn subpixel_jitter_rounds_to_same_viewport() {
        let a = ViewportState::new(900.2, 1000.0, 800.0).rounded();
        let b = ViewportState::new(899.9, 1000.3, 799.8).rounded();
        assert_eq!(a, b);
    }

    #[test]
    fn size_is_empty() {
        assert!(Size::ZERO.is_empty());
        assert!(Size::new(100.0, 0.2).is_empty());
        assert!(!Size::new(100.0, 1.0).is_empty());
    }

    #[test]
    fn set_size_keeps_scroll() {
        let mut vp = ViewportState::new(120.0, 10.0, 10.0);
        vp.set_size(Size::new(500.0, 300.0));
        assert_eq!(vp, ViewportState::new(120.0, 500.0, 300.0));
    }
}
