#![forbid(unsafe_code)]

//! Catalog items as consumed by the grid.
//!
//! Only the fields the filter/sort pipeline reads are typed. Everything else
//! the host wants to render (names, images, categories) travels in the opaque
//! `payload`.

use std::fmt;

/// Stable identity of a catalog item.
///
/// Keys survive re-filtering and re-sorting, which is what lets the host keep
/// per-item state (loaded images, selection) attached to the right product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ItemKey(String);

impl ItemKey {
    /// Create a key from anything string-like.
    #[inline]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ItemKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for ItemKey {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// A catalog record with the fields the pipeline interprets.
///
/// `P` is the host payload. The core never looks inside it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogItem<P = ()> {
    /// Stable identity.
    pub key: ItemKey,
    /// Brand as supplied upstream (may carry stray whitespace).
    pub brand: Option<String>,
    /// Unit price. Missing prices sort as zero.
    pub price: Option<f64>,
    /// Explicit organic flag. `None` means unknown.
    pub organic: Option<bool>,
    /// Host data carried through untouched.
    pub payload: P,
}

impl<P> CatalogItem<P> {
    /// Create an item with no brand, price, or organic flag.
    pub fn new(key: impl Into<ItemKey>, payload: P) -> Self {
        Self {
            key: key.into(),
            brand: None,
            price: None,
            organic: None,
            payload,
        }
    }

    /// Set the brand.
    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Set the price.
    #[must_use]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the organic flag.
    #[must_use]
    pub fn with_organic(mut self, organic: bool) -> Self {
        self.organic = Some(organic);
        self
    }

    /// Brand with surrounding whitespace removed; `None` when missing or blank.
    pub fn trimmed_brand(&self) -> Option<&str> {
        self.brand
            .as_deref()
            .map(str::trim)
            .filter(|brand| !brand.is_empty())
    }

    /// Price used for ordering.
    ///
    /// Missing and NaN prices count as zero, and `-0.0` is folded into `0.0`
    /// so that a total order over the result agrees with numeric equality.
    pub fn sort_price(&self) -> f64 {
        match self.price {
            Some(price) if price.is_nan() => 0.0,
            Some(price) if price == 0.0 => 0.0,
            Some(price) => price,
            None => 0.0,
        }
    }

    /// Whether the item is explicitly flagged organic.
    #[inline]
    pub fn is_organic(&self) -> bool {
        self.organic == Some(true)
    }
}

impl CatalogItem<()> {
    /// Create a payload-less item. Handy for tests and benchmarks.
    pub fn keyed(key: impl Into<ItemKey>) -> Self {
        Self::new(key, ())
    }
}
