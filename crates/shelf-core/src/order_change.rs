#![forbid(unsafe_code)]

//! Detects when filtered output can no longer be patched incrementally.
//!
//! The recycler keeps an index → slot binding across passes. That binding is
//! only meaningful while the order and membership of the filtered sequence
//! are stable. Whenever the criteria signature moves, the binding must be
//! thrown away, even if the filtered count happens to be unchanged.
//!
//! Item replacement alone never counts as an order change. Upstream refreshes
//! with identical criteria are patched in place.

use crate::criteria::{CriteriaSignature, FilterCriteria};

/// Outcome of observing a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderChange {
    /// Same criteria as last time: positions may be refreshed in place.
    Unchanged,
    /// Criteria moved (or first run): force a full recycler reset.
    Changed,
}

impl OrderChange {
    /// Whether a full reset is required.
    #[inline]
    pub const fn is_changed(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Tracks the last criteria signature seen by a grid instance.
#[derive(Debug, Clone, Default)]
pub struct OrderChangeDetector {
    previous: Option<CriteriaSignature>,
    changes: u64,
}

impl OrderChangeDetector {
    /// Create a detector with no history. The first observation reports
    /// [`OrderChange::Changed`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `criteria` against the stored signature, replacing it on change.
    pub fn observe(&mut self, criteria: &FilterCriteria) -> OrderChange {
        let signature = criteria.signature();
        if self.previous.as_ref() == Some(&signature) {
            return OrderChange::Unchanged;
        }

        tracing::debug!(
            sort = %signature.sort(),
            organic = %signature.organic(),
            brands = signature.brands().len(),
            "criteria signature changed"
        );
        self.previous = Some(signature);
        self.changes += 1;
        OrderChange::Changed
    }

    /// Forget the stored signature.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Signature from the last observation.
    pub fn previous(&self) -> Option<&CriteriaSignature> {
        self.previous.as_ref()
    }

    /// Number of `Changed` results reported so far.
    pub fn change_count(&self) -> u64 {
        self.changes
    }
}
