#![forbid(unsafe_code)]

//! Host events that drive a grid.

use crate::criteria::FilterCriteria;
use crate::geometry::Size;
use crate::item::CatalogItem;

/// A discrete change reported by the host.
///
/// Events are queued and coalesced; the runtime applies a whole burst in one
/// pass rather than once per event.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent<P> {
    /// The data layer delivered a new item sequence.
    ReplaceItems(Vec<CatalogItem<P>>),
    /// The user changed sort or filter controls.
    SetCriteria(FilterCriteria),
    /// The container scrolled to an absolute offset.
    ScrollTo(f64),
    /// The container scrolled by a relative amount.
    ScrollBy(f64),
    /// The container settled at a new size (already debounced).
    Resize(Size),
}

impl<P> GridEvent<P> {
    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ReplaceItems(_) => "replace_items",
            Self::SetCriteria(_) => "set_criteria",
            Self::ScrollTo(_) => "scroll_to",
            Self::ScrollBy(_) => "scroll_by",
            Self::Resize(_) => "resize",
        }
    }
}
