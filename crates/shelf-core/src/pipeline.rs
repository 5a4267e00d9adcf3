#![forbid(unsafe_code)]

//! The filter/sort pipeline.
//!
//! Pure functions from `(items, criteria)` to an ordered selection. Nothing
//! here mutates its input or keeps state between calls, so the runtime can
//! re-run it freely whenever items or criteria change.
//!
//! # Rules
//!
//! - **Brand**: keep items whose trimmed brand is in the selected set. An
//!   empty set keeps everything; items without a brand never match a
//!   non-empty set.
//! - **Organic**: see [`OrganicFilter::admits`](crate::OrganicFilter::admits).
//! - **Sort**: price sorts are stable and treat a missing price as zero;
//!   [`SortKey::Default`] keeps input order.

use std::collections::BTreeSet;

use crate::criteria::{FilterCriteria, SortKey};
use crate::item::CatalogItem;

/// Whether `item` passes the brand and organic filters.
pub fn matches<P>(item: &CatalogItem<P>, criteria: &FilterCriteria) -> bool {
    if !criteria.organic.admits(item.organic) {
        return false;
    }
    if criteria.brands().is_empty() {
        return true;
    }
    item.trimmed_brand()
        .is_some_and(|brand| criteria.brands().contains(brand))
}

/// Filter and sort, returning indices into `items` in display order.
pub fn filter_sort_indices<P>(items: &[CatalogItem<P>], criteria: &FilterCriteria) -> Vec<usize> {
    let mut selected: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| matches(item, criteria))
        .map(|(idx, _)| idx)
        .collect();

    // `sort_by` is stable: equal prices keep their input order.
    match criteria.sort {
        SortKey::Default => {}
        SortKey::PriceAscending => selected.sort_by(|&a, &b| {
            items[a].sort_price().total_cmp(&items[b].sort_price())
        }),
        SortKey::PriceDescending => selected.sort_by(|&a, &b| {
            items[b].sort_price().total_cmp(&items[a].sort_price())
        }),
    }

    selected
}

/// Filter and sort, returning borrowed items in display order.
pub fn filter_sort<'a, P>(
    items: &'a [CatalogItem<P>],
    criteria: &FilterCriteria,
) -> Vec<&'a CatalogItem<P>> {
    filter_sort_indices(items, criteria)
        .into_iter()
        .map(|idx| &items[idx])
        .collect()
}

/// Sorted, de-duplicated, trimmed brands across the unfiltered items.
///
/// This feeds the brand picker, so it deliberately ignores the current
/// criteria.
pub fn available_brands<P>(items: &[CatalogItem<P>]) -> Vec<String> {
    items
        .iter()
        .filter_map(CatalogItem::trimmed_brand)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}
