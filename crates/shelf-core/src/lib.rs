#![forbid(unsafe_code)]

//! Core: catalog items, filter criteria, the filter/sort pipeline, and the
//! event types a grid host feeds into the runtime.

pub mod criteria;
pub mod event;
pub mod event_coalescer;
pub mod geometry;
pub mod item;
pub mod logging;
pub mod order_change;
pub mod pipeline;

pub use criteria::{CriteriaSignature, FilterCriteria, OrganicFilter, ParseCriteriaError, SortKey};
pub use event::GridEvent;
pub use event_coalescer::{EventCoalescer, PendingBurst, PendingScroll};
pub use geometry::{Point, Size, ViewportState};
pub use item::{CatalogItem, ItemKey};
pub use order_change::{OrderChange, OrderChangeDetector};
pub use pipeline::{available_brands, filter_sort, filter_sort_indices, matches};
