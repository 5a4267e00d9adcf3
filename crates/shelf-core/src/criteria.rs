#![forbid(unsafe_code)]

//! Filter and sort criteria supplied by host UI controls.
//!
//! A [`FilterCriteria`] value is owned by each grid instance. Its
//! [`CriteriaSignature`] is what the order-change detector compares: it
//! changes exactly when the membership or order of the filtered sequence
//! could change.
//!
//! Wire names are kebab-case (`price-ascending`, `non-organic`) both for
//! [`FromStr`] and, with the `serde` feature, for serialization.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Ordering applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum SortKey {
    /// Keep pipeline input order.
    #[default]
    Default,
    /// Cheapest first.
    PriceAscending,
    /// Most expensive first.
    PriceDescending,
}

impl SortKey {
    /// All variants, in UI order.
    pub const ALL: [Self; 3] = [Self::Default, Self::PriceAscending, Self::PriceDescending];

    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PriceAscending => "price-ascending",
            Self::PriceDescending => "price-descending",
        }
    }

    /// Parse a wire name, falling back to [`SortKey::Default`] on unknown input.
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or_else(|err: ParseCriteriaError| {
            tracing::warn!(%err, "unknown sort key, using default order");
            Self::Default
        })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseCriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s.trim())
            .ok_or_else(|| ParseCriteriaError::new("sort key", s))
    }
}

/// Organic tri-state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum OrganicFilter {
    /// No filtering.
    #[default]
    All,
    /// Only items explicitly flagged organic.
    Organic,
    /// Items flagged non-organic or with no flag at all.
    NonOrganic,
}

impl OrganicFilter {
    /// All variants, in UI order.
    pub const ALL: [Self; 3] = [Self::All, Self::Organic, Self::NonOrganic];

    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Organic => "organic",
            Self::NonOrganic => "non-organic",
        }
    }

    /// Whether an item with the given flag passes this filter.
    #[inline]
    pub const fn admits(self, organic: Option<bool>) -> bool {
        match self {
            Self::All => true,
            Self::Organic => matches!(organic, Some(true)),
            Self::NonOrganic => !matches!(organic, Some(true)),
        }
    }

    /// Parse a wire name, falling back to [`OrganicFilter::All`] on unknown input.
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or_else(|err: ParseCriteriaError| {
            tracing::warn!(%err, "unknown organic filter, showing all items");
            Self::All
        })
    }
}

impl fmt::Display for OrganicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrganicFilter {
    type Err = ParseCriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == s.trim())
            .ok_or_else(|| ParseCriteriaError::new("organic filter", s))
    }
}

/// Error returned when a criteria wire name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCriteriaError {
    kind: &'static str,
    value: String,
}

impl ParseCriteriaError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }

    /// Which criterion failed to parse (`"sort key"` or `"organic filter"`).
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The rejected input.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ParseCriteriaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseCriteriaError {}

/// Sort key, selected brands, and organic state for one grid instance.
///
/// An empty brand set means "no brand filter".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "RawFilterCriteria")
)]
pub struct FilterCriteria {
    /// Ordering.
    pub sort: SortKey,
    /// Selected brands, trimmed and non-blank.
    brands: BTreeSet<String>,
    /// Organic filter.
    pub organic: OrganicFilter,
}

/// Unnormalized wire form of [`FilterCriteria`].
#[cfg(feature = "serde")]
#[derive(Default, serde::Deserialize)]
#[serde(default)]
struct RawFilterCriteria {
    sort: SortKey,
    brands: Vec<String>,
    organic: OrganicFilter,
}

#[cfg(feature = "serde")]
impl From<RawFilterCriteria> for FilterCriteria {
    fn from(raw: RawFilterCriteria) -> Self {
        Self::new()
            .with_sort(raw.sort)
            .with_organic(raw.organic)
            .with_brands(raw.brands)
    }
}

impl FilterCriteria {
    /// Criteria that keep every item in input order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sort key.
    #[must_use]
    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Replace the selected brand set. Blank entries are dropped.
    #[must_use]
    pub fn with_brands<I, S>(mut self, brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.brands.clear();
        for brand in brands {
            self.select_brand(brand.as_ref());
        }
        self
    }

    /// Set the organic filter.
    #[must_use]
    pub fn with_organic(mut self, organic: OrganicFilter) -> Self {
        self.organic = organic;
        self
    }

    /// Add a brand to the selection. Returns `false` if it was already selected
    /// or is blank.
    pub fn select_brand(&mut self, brand: &str) -> bool {
        let brand = brand.trim();
        if brand.is_empty() {
            return false;
        }
        self.brands.insert(brand.to_owned())
    }

    /// Remove a brand from the selection.
    pub fn deselect_brand(&mut self, brand: &str) -> bool {
        self.brands.remove(brand.trim())
    }

    /// Toggle a brand, returning whether it is now selected.
    pub fn toggle_brand(&mut self, brand: &str) -> bool {
        if self.deselect_brand(brand) {
            false
        } else {
            self.select_brand(brand)
        }
    }

    /// Selected brands, trimmed. Membership is what matters, not insertion order.
    #[inline]
    pub fn brands(&self) -> &BTreeSet<String> {
        &self.brands
    }

    /// Whether any filter narrows the sequence.
    pub fn is_filtering(&self) -> bool {
        !self.brands.is_empty() || self.organic != OrganicFilter::All
    }

    /// Snapshot the parts that decide order and membership.
    #[must_use]
    pub fn signature(&self) -> CriteriaSignature {
        CriteriaSignature {
            sort: self.sort,
            organic: self.organic,
            brands: self.brands.clone(),
        }
    }
}

/// Comparable summary of the criteria that affect order or membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CriteriaSignature {
    sort: SortKey,
    organic: OrganicFilter,
    brands: BTreeSet<String>,
}

impl CriteriaSignature {
    /// Sort key component.
    pub fn sort(&self) -> SortKey {
        self.sort
    }

    /// Organic component.
    pub fn organic(&self) -> OrganicFilter {
        self.organic
    }

    /// Brand-set component.
    pub fn brands(&self) -> &BTreeSet<String> {
        &self.brands
    }
}
