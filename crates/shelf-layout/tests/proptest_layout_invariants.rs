//! Property-based invariant tests for grid layout and windowing.
//!
//! 1. Column count is always at least 1.
//! 2. Content height follows `ceil(n / cols) * stride - gap`, 0 when empty.
//! 3. `y` is non-decreasing in index; `x` is below `cols * stride`.
//! 4. Layout is idempotent.
//! 5. Visible range is inside `[0, n - 1]` and empty iff `n == 0`.
//! 6. Visible range starts on a row boundary and covers the viewport.
//! 7. Sub-pixel jitter does not move the range.

use proptest::prelude::*;
use shelf_layout::{
    GridLayout, LayoutConfig, ViewportState, column_count, compute_visible_range, content_height,
    position,
};

// ── Helpers ─────────────────────────────────────────────────────────────

fn config_strategy() -> impl Strategy<Value = LayoutConfig> {
    (1u32..400, 1u32..600, 0u32..40)
        .prop_map(|(w, h, gap)| LayoutConfig::new(f64::from(w), f64::from(h), f64::from(gap)))
}

fn viewport_strategy() -> impl Strategy<Value = ViewportState> {
    (0.0f64..50_000.0, 1.0f64..3000.0, 0.0f64..2000.0)
        .prop_map(|(top, width, height)| ViewportState::new(top, width, height))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Column count ≥ 1
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn column_count_at_least_one(width in proptest::num::f64::ANY, config in config_strategy()) {
        prop_assert!(column_count(width, &config) >= 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Total-height law
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn total_height_law(n in 0usize..5000, cols in 1usize..20, config in config_strategy()) {
        let height = content_height(n, cols, &config);
        if n == 0 {
            prop_assert_eq!(height, 0.0);
        } else {
            let rows = n.div_ceil(cols) as f64;
            let expected = rows * (config.item_height() + config.gap()) - config.gap();
            prop_assert!((height - expected).abs() < 1e-6);
            // The last item's bottom edge is the content bottom.
            let last = position(n - 1, cols, &config);
            prop_assert!((last.y + config.item_height() - height).abs() < 1e-6);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Monotone y, bounded x
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn y_monotone_in_index(n in 1usize..400, width in 1.0f64..4000.0, config in config_strategy()) {
        let layout = GridLayout::for_width(n, width, config);
        let cols = layout.columns() as f64;
        let mut prev_y = f64::NEG_INFINITY;
        for (_, p) in layout.positions().iter() {
            prop_assert!(p.y >= prev_y);
            prop_assert!(p.x >= 0.0 && p.x < cols * config.column_stride());
            prev_y = p.y;
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn layout_idempotent(n in 0usize..2000, width in 0.0f64..4000.0, config in config_strategy()) {
        prop_assert_eq!(
            GridLayout::for_width(n, width, config),
            GridLayout::for_width(n, width, config)
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5–6. Visible range bounds and coverage
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn visible_range_bounded(
        n in 0usize..3000,
        vp in viewport_strategy(),
        buffer in 0usize..4,
        config in config_strategy(),
    ) {
        let layout = GridLayout::for_width(n, vp.width, config);
        let range = compute_visible_range(&vp, &layout, buffer);
        prop_assert_eq!(range.is_empty(), n == 0);
        if let (Some(first), Some(last)) = (range.first(), range.last()) {
            prop_assert!(first <= last);
            prop_assert!(last < n);
            prop_assert_eq!(first % layout.columns(), 0);
        }
    }

    #[test]
    fn visible_range_covers_viewport(
        n in 1usize..3000,
        vp in viewport_strategy(),
        config in config_strategy(),
    ) {
        let layout = GridLayout::for_width(n, vp.width, config);
        let range = compute_visible_range(&vp, &layout, 0);
        let rounded = vp.rounded();
        let bottom = rounded.scroll_top + rounded.height;
        // Every item whose cell overlaps the viewport is in range.
        for (idx, p) in layout.positions().iter() {
            let overlaps = p.y < bottom && p.y + config.row_stride() > rounded.scroll_top;
            if overlaps {
                prop_assert!(range.contains(idx), "index {} overlaps but not in {}", idx, range);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Sub-pixel jitter
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn subpixel_jitter_stable(
        n in 0usize..3000,
        top in 0u32..40_000,
        height in 1u32..2000,
        jitter in -0.49f64..0.49,
        config in config_strategy(),
    ) {
        let layout = GridLayout::for_width(n, 1280.0, config);
        let exact = ViewportState::new(f64::from(top), 1280.0, f64::from(height));
        let jittered = ViewportState::new(f64::from(top) + jitter, 1280.0, f64::from(height) - jitter);
        prop_assert_eq!(
            compute_visible_range(&exact, &layout, 1),
            compute_visible_range(&jittered, &layout, 1)
        );
    }
}
