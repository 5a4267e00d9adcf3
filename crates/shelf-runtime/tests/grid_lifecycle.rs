#![forbid(unsafe_code)]

//! End-to-end grid lifecycle through the headless host.
//!
//!   cargo test -p shelf-runtime --test grid_lifecycle

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use shelf_core::criteria::{FilterCriteria, OrganicFilter, SortKey};
use shelf_core::geometry::{Point, Size};
use shelf_core::item::{CatalogItem, ItemKey};
use shelf_layout::VisibleRange;
use shelf_runtime::config::GridConfig;
use shelf_runtime::grid::{GridHooks, RenderState, VirtualGrid, VisibleItems};
use shelf_runtime::resize_coordinator::ResizeAction;
use shelf_runtime::simulator::{HeadlessContainer, HeadlessHost};

// ============================================================================
// Helpers
// ============================================================================

fn catalog(n: u64) -> Vec<CatalogItem<u64>> {
    (0..n)
        .map(|i| {
            CatalogItem::new(i, i)
                .with_price((i % 7) as f64)
                .with_organic(i % 2 == 0)
                .with_brand(if i % 3 == 0 { "Acme" } else { "Birch" })
        })
        .collect()
}

fn host(n: u64) -> HeadlessHost<u64> {
    let mut host = HeadlessHost::new(GridConfig::default(), Size::new(1000.0, 900.0));
    host.grid_mut().set_items(catalog(n));
    host
}

fn keys(range: std::ops::Range<u64>) -> Vec<ItemKey> {
    range.map(ItemKey::from).collect()
}

fn assert_surface_matches_grid(host: &HeadlessHost<u64>) {
    let expected: Vec<usize> = host.grid().visible_range().iter().collect();
    assert_eq!(host.surface().visible_indices(), expected);
    if let Some(layout) = host.grid().layout() {
        for idx in expected {
            assert_eq!(host.surface().position_of(idx), layout.position(idx));
        }
    }
}

// ============================================================================
// Mount
// ============================================================================

#[test]
fn mount_renders_buffered_window() {
    let mut host = host(20);
    host.mount().unwrap();

    assert_eq!(host.grid().render_state(), RenderState::Ready);
    assert_eq!(host.grid().columns(), 4);
    // Rows 0..=1 visible plus one buffer row below.
    assert_eq!(host.grid().visible_range(), VisibleRange::inclusive(0, 11));
    assert_eq!(host.surface().position_of(5), Some(Point::new(245.0, 450.0)));
    assert_surface_matches_grid(&host);
    assert!(!host.frames().is_requested());
}

#[test]
fn degraded_mount_never_renders() {
    let mut grid: VirtualGrid<u64, HeadlessContainer> = VirtualGrid::new(GridConfig::default());
    grid.set_items(catalog(20));
    let report = grid.mount(None);

    assert_eq!(grid.render_state(), RenderState::Degraded);
    assert!(report.patches.is_empty());
    assert!(grid.flush().patches.is_empty());
    assert_eq!(
        grid.observe_resize_at(Size::new(500.0, 900.0), Instant::now()),
        ResizeAction::None
    );
    assert!(grid.visible_range().is_empty());
}

#[test]
fn empty_catalog_mounts_empty() {
    let mut host = host(0);
    host.mount().unwrap();
    assert_eq!(host.grid().render_state(), RenderState::Empty);
    assert_eq!(host.grid().content_height(), 0.0);
    assert!(host.surface().visible_indices().is_empty());
}

// ============================================================================
// Scrolling
// ============================================================================

#[test]
fn scrolling_rebinds_and_keeps_surface_consistent() {
    let mut host = host(200);
    host.mount().unwrap();

    for top in [450.0, 2000.0, 9000.0, 100.0, 0.0, 22_000.0] {
        host.scroll_to(top);
        host.settle(4).unwrap();
        assert_surface_matches_grid(&host);
    }
    // 50 rows of 450 px, 900 px viewport.
    assert_eq!(host.grid().viewport().scroll_top, 21_600.0);
    assert_eq!(host.grid().visible_range().last(), Some(199));
}

#[test]
fn large_viewport_pool_covers_window_without_growth() {
    let mut host = HeadlessHost::new(GridConfig::default(), Size::new(1920.0, 1080.0));
    host.grid_mut().set_items(catalog(1_000));
    host.mount().unwrap();

    // 7 columns, 4 visible rows at most, plus one buffer row each side.
    assert_eq!(host.grid().columns(), 7);
    assert_eq!(host.grid().stats().pool_size, 42);
    assert_eq!(host.grid().recycler().stats().grown, 0);

    for step in 0..50 {
        host.scroll_to(f64::from(step) * 333.0);
        host.settle(2).unwrap();
    }
    assert_eq!(host.grid().recycler().stats().grown, 0);
    assert_surface_matches_grid(&host);
}

#[test]
fn applied_resize_reserves_for_new_window() {
    let mut host = host(1_000);
    host.mount().unwrap();
    assert_eq!(host.grid().stats().pool_size, shelf_widgets::DEFAULT_POOL_SIZE);

    let t0 = Instant::now();
    host.resize_at(Size::new(2500.0, 2000.0), t0);
    host.advance_to(t0 + Duration::from_millis(50));
    host.settle(4).unwrap();

    // 10 columns, ceil(2000 / 450) + 1 rows, plus one buffer row each side.
    assert_eq!(host.grid().columns(), 10);
    assert_eq!(host.grid().stats().pool_size, 80);
    assert_eq!(host.grid().recycler().stats().grown, 0);
    assert_surface_matches_grid(&host);
}

#[test]
fn pool_stays_bounded_while_scrolling() {
    let mut host = host(2_000);
    host.mount().unwrap();
    for step in 0..200 {
        host.scroll_to(f64::from(step) * 400.0);
        host.settle(2).unwrap();
    }
    let stats = host.grid().stats();
    assert_eq!(stats.pool_size, shelf_widgets::DEFAULT_POOL_SIZE);
    assert!(host.surface().created_count() <= stats.pool_size);
}

// ============================================================================
// Filtering and ordering
// ============================================================================

#[test]
fn filter_change_resets_and_rebinds() {
    let mut host = host(40);
    host.mount().unwrap();

    host.grid_mut()
        .set_criteria(FilterCriteria::new().with_organic(OrganicFilter::Organic));
    host.settle(4).unwrap();

    let report = host.reports().last().unwrap();
    assert!(report.order_changed);
    assert_eq!(host.grid().filtered_len(), 20);
    assert_eq!(host.grid().item_at(1).map(|i| i.payload), Some(2));
    assert_surface_matches_grid(&host);
}

#[test]
fn sort_change_reorders_visible_items() {
    let mut host = host(12);
    host.mount().unwrap();

    host.grid_mut()
        .set_criteria(FilterCriteria::new().with_sort(SortKey::PriceDescending));
    host.settle(4).unwrap();

    let prices: Vec<f64> = (0..host.grid().filtered_len())
        .filter_map(|i| host.grid().item_at(i))
        .map(CatalogItem::sort_price)
        .collect();
    assert!(prices.windows(2).all(|w| w[0] >= w[1]));
    assert_surface_matches_grid(&host);
}

#[test]
fn replacing_items_under_same_criteria_reports_new_keys() {
    let mut host = host(20);
    host.mount().unwrap();

    let replacement: Vec<CatalogItem<u64>> =
        (100..120u64).map(|i| CatalogItem::new(i, i)).collect();
    host.grid_mut().set_items(replacement);
    assert_eq!(host.settle(4).unwrap(), 1);

    let report = host.reports().last().unwrap();
    // Same indices, same positions: nothing for the recycler to do.
    assert!(report.patches.is_empty());
    assert!(!report.order_changed);
    assert!(report.visible_changed);
    assert!(!report.is_noop());

    let visible = host.grid().visible_items().unwrap();
    assert_eq!(visible.keys, keys(100..112));
    assert_eq!(visible.entered, keys(100..112));
    assert_eq!(host.grid().item_at(0).map(|i| i.key.clone()), Some(ItemKey::from(100u64)));
}

#[test]
fn brand_filter_and_available_brands() {
    let mut host = host(30);
    host.mount().unwrap();
    assert_eq!(host.grid().available_brands(), ["Acme", "Birch"]);

    host.grid_mut()
        .set_criteria(FilterCriteria::new().with_brands(["Acme"]));
    host.settle(4).unwrap();
    assert_eq!(host.grid().filtered_len(), 10);
    // Brands always come from the unfiltered catalog.
    assert_eq!(host.grid().available_brands(), ["Acme", "Birch"]);
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn resize_to_half_width_halves_columns() {
    let mut host = host(20);
    host.mount().unwrap();
    let before = host.grid().visible_range().len();

    let t0 = Instant::now();
    assert_eq!(
        host.resize_at(Size::new(500.0, 900.0), t0),
        ResizeAction::Pending
    );
    assert!(host.grid().has_pending_resize());
    assert_eq!(host.settle(4).unwrap(), 0);
    assert_eq!(host.grid().columns(), 4);

    assert!(matches!(
        host.advance_to(t0 + Duration::from_millis(50)),
        ResizeAction::Apply { .. }
    ));
    host.settle(4).unwrap();

    assert_eq!(host.grid().columns(), 2);
    assert_eq!(host.grid().content_height(), 4500.0);
    // Same pixel height, half the columns: three rows of two.
    assert_eq!(host.grid().visible_range(), VisibleRange::inclusive(0, 5));
    assert!(host.grid().visible_range().len() < before);
    assert_surface_matches_grid(&host);
}

#[test]
fn resize_burst_applies_once() {
    let mut host = host(20);
    host.mount().unwrap();

    let t0 = Instant::now();
    for step in 0..5u32 {
        let width = 1000.0 - f64::from(step + 1) * 100.0;
        host.resize_at(
            Size::new(width, 900.0),
            t0 + Duration::from_millis(u64::from(step) * 20),
        );
    }
    assert_eq!(host.advance_to(t0 + Duration::from_millis(100)), ResizeAction::Pending);
    assert!(matches!(
        host.advance_to(t0 + Duration::from_millis(130)),
        ResizeAction::Apply { coalesced: 5, .. }
    ));
    host.settle(4).unwrap();
    assert_eq!(host.grid().viewport().width, 500.0);
    assert_eq!(host.grid().stats().resizes_applied, 1);
}

#[test]
fn teardown_mid_debounce_stops_all_activity() {
    let mut host = host(20);
    host.mount().unwrap();
    let painted = host.reports().len();

    let t0 = Instant::now();
    host.resize_at(Size::new(500.0, 900.0), t0);
    host.teardown();

    assert!(!host.container().is_observed());
    assert_eq!(host.container().disconnect_count(), 1);
    assert_eq!(
        host.advance_to(t0 + Duration::from_millis(200)),
        ResizeAction::None
    );
    host.scroll_to(900.0);
    assert_eq!(host.settle(4).unwrap(), 0);
    assert_eq!(host.reports().len(), painted);
    assert_eq!(host.surface().element_count(), 0);
    assert_eq!(host.grid().columns(), 4);
    assert_eq!(host.grid().render_state(), RenderState::TornDown);
}

// ============================================================================
// Hooks
// ============================================================================

#[test]
fn hooks_report_height_and_entering_items() {
    let heights = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::new(RefCell::new(Vec::<VisibleItems>::new()));
    let hooks = GridHooks::new()
        .on_content_height({
            let heights = Rc::clone(&heights);
            move |h| heights.borrow_mut().push(h)
        })
        .on_visible_items({
            let seen = Rc::clone(&seen);
            move |v| seen.borrow_mut().push(v.clone())
        });

    let mut host = host(20).with_hooks(hooks);
    host.mount().unwrap();
    assert_eq!(*heights.borrow(), [2250.0]);
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(seen.borrow()[0].entered, keys(0..12));

    host.scroll_to(450.0);
    host.settle(4).unwrap();
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(seen.borrow()[1].keys, keys(0..16));
    assert_eq!(seen.borrow()[1].entered, keys(12..16));

    // Same rows with the buffer applied: nothing to report.
    host.scroll_to(449.0);
    host.settle(4).unwrap();
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(heights.borrow().len(), 1);
}

#[test]
fn hook_events_run_in_the_same_flush() {
    let calls = Rc::new(Cell::new(0u32));
    let host = host(40);
    let handle = host.grid().handle();
    let hooks = GridHooks::new().on_visible_items({
        let calls = Rc::clone(&calls);
        move |_| {
            if calls.get() == 0 {
                handle.scroll_to(1800.0);
            }
            calls.set(calls.get() + 1);
        }
    });
    let mut host = host.with_hooks(hooks);
    host.mount().unwrap();

    let report = host.reports().last().unwrap();
    assert_eq!(report.passes, 2);
    assert!(!report.deferred);
    assert_eq!(calls.get(), 2);
    assert_eq!(host.grid().viewport().scroll_top, 1800.0);
    assert!(!host.frames().is_requested());
    assert_surface_matches_grid(&host);
}

#[test]
fn hook_feedback_is_deferred_past_pass_limit() {
    let calls = Rc::new(Cell::new(0u32));
    let host: HeadlessHost<u64> = {
        let mut host = HeadlessHost::new(
            GridConfig::default().with_max_flush_passes(2),
            Size::new(1000.0, 900.0),
        );
        host.grid_mut().set_items(catalog(40));
        host
    };
    let handle = host.grid().handle();
    let hooks = GridHooks::new().on_visible_items({
        let calls = Rc::clone(&calls);
        move |_| {
            let n = calls.get();
            if n < 3 {
                handle.scroll_to(if n % 2 == 0 { 1800.0 } else { 0.0 });
            }
            calls.set(n + 1);
        }
    });
    let mut host = host.with_hooks(hooks);
    host.mount().unwrap();

    let report = host.reports().last().unwrap();
    assert_eq!(report.passes, 2);
    assert!(report.deferred);
    assert!(host.grid().has_pending());
    assert!(host.frames().is_requested());

    assert_eq!(host.settle(8).unwrap(), 1);
    assert!(!host.grid().has_pending());
    assert_eq!(host.grid().viewport().scroll_top, 1800.0);
    assert_eq!(host.grid().stats().deferred_flushes, 1);
    assert_surface_matches_grid(&host);
}

#[test]
fn handle_is_closed_after_teardown() {
    let mut host = host(5);
    let handle = host.grid().handle();
    host.mount().unwrap();
    assert!(!handle.is_closed());
    host.teardown();
    assert!(handle.is_closed());
    handle.scroll_to(100.0);
    assert!(!host.grid().has_pending());
}
