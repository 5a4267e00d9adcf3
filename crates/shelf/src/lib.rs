#![forbid(unsafe_code)]

//! Shelf public facade crate.
//!
//! Re-exports the types a host needs to mount a virtualized product grid and
//! offers a small prelude. The component crates stay reachable as modules
//! ([`core`], [`layout`], [`widgets`], [`runtime`]) for anything the prelude
//! leaves out.
//!
//! # Example
//!
//! ```
//! use shelf::prelude::*;
//!
//! let criteria = shelf::parse_criteria("price-descending", "organic", ["  Acme "]).unwrap();
//! let mut host = HeadlessHost::new(GridConfig::default(), Size::new(1000.0, 900.0));
//! host.grid_mut().set_items(vec![
//!     CatalogItem::new(1u64, ()).with_brand("Acme").with_organic(true).with_price(3.0),
//!     CatalogItem::new(2u64, ()).with_brand("Acme").with_organic(true).with_price(9.0),
//!     CatalogItem::new(3u64, ()).with_brand("Birch").with_organic(true),
//! ]);
//! host.grid_mut().set_criteria(criteria);
//! host.mount()?;
//!
//! assert_eq!(host.grid().filtered_len(), 2);
//! assert_eq!(host.grid().item_at(0).map(|i| i.key.as_str()), Some("2"));
//! # Ok::<(), shelf::Error>(())
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use shelf_core::criteria::{FilterCriteria, OrganicFilter, ParseCriteriaError, SortKey};
pub use shelf_core::geometry::{Point, Size, ViewportState};
pub use shelf_core::item::{CatalogItem, ItemKey};
pub use shelf_core::logging::LoggingInitError;

// --- Layout re-exports -----------------------------------------------------

pub use shelf_layout::{GridLayout, LayoutConfig, ViewportWindow, VisibleRange};

// --- Widget re-exports -----------------------------------------------------

pub use shelf_widgets::{ElementRecycler, SlotId, SlotPatch};

// --- Runtime re-exports ----------------------------------------------------

pub use shelf_runtime::{
    FlushReport, FrameScheduler, GridConfig, GridHandle, GridHooks, HeadlessHost, ObserverId,
    PatchError, RenderState, ResizeAction, ResizeConfig, ScrollContainer, VirtualGrid,
    VisibleItems,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for shelf hosts.
#[derive(Debug)]
pub enum Error {
    /// A sort key or organic filter name was not recognized.
    Criteria(ParseCriteriaError),
    /// The log subscriber could not be installed.
    Logging(LoggingInitError),
    /// A host surface rejected a slot patch.
    Surface(PatchError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Criteria(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Surface(err) => write!(f, "surface out of sync: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Criteria(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Surface(err) => Some(err),
        }
    }
}

impl From<ParseCriteriaError> for Error {
    fn from(err: ParseCriteriaError) -> Self {
        Self::Criteria(err)
    }
}

impl From<LoggingInitError> for Error {
    fn from(err: LoggingInitError) -> Self {
        Self::Logging(err)
    }
}

impl From<PatchError> for Error {
    fn from(err: PatchError) -> Self {
        Self::Surface(err)
    }
}

/// Standard result type for shelf APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Build criteria from the wire names a host UI control reports.
///
/// Unlike [`SortKey::parse_lossy`], unknown names are errors. Brands are
/// trimmed and blank ones dropped.
pub fn parse_criteria<I, S>(sort: &str, organic: &str, brands: I) -> Result<FilterCriteria>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let criteria = FilterCriteria::new()
        .with_sort(sort.parse()?)
        .with_organic(organic.parse()?)
        .with_brands(brands);
    tracing::debug!(
        sort = %criteria.sort,
        organic = %criteria.organic,
        brands = criteria.brands().len(),
        "criteria parsed"
    );
    Ok(criteria)
}

/// Install the JSON log subscriber (see [`shelf_core::logging`]).
#[cfg(feature = "tracing-json")]
pub fn init_logging() -> Result<()> {
    shelf_core::logging::init_json_subscriber().map_err(Error::from)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CatalogItem, Error, FilterCriteria, GridConfig, GridHooks, HeadlessHost, ItemKey,
        LayoutConfig, OrganicFilter, Point, RenderState, Result, ScrollContainer, Size, SortKey,
        VirtualGrid, VisibleRange,
    };

    pub use crate::{core, layout, runtime, widgets};
}

pub use shelf_core as core;
pub use shelf_layout as layout;
pub use shelf_runtime as runtime;
pub use shelf_widgets as widgets;
