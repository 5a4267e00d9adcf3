#![forbid(unsafe_code)]

//! Slot recycling for virtualized grids.
//!
//! A grid with a hundred thousand items shows perhaps a few dozen at a time.
//! [`ElementRecycler`] keeps a pool of [`RecyclerSlot`]s (one per host
//! element) and rebinds them to whichever indices the current
//! [`VisibleRange`] covers. The host never creates or destroys elements
//! while scrolling; it only applies the [`SlotPatch`]es returned by
//! [`ElementRecycler::apply`].
//!
//! # Slot states
//!
//! Every slot is in exactly one of three states:
//!
//! - **bound**: showing an index
//! - **parked**: hidden, remembering the index it last showed
//! - **fresh**: hidden, no memory (never used, or cleared by a reset)
//!
//! An entering index first reclaims the slot parked at that same index, so
//! scrolling back and forth rebinds elements to the content they already
//! hold. Otherwise it takes a fresh slot, then the parked slot farthest
//! from it, and only then grows the pool.
//!
//! # Invariants
//!
//! - After `apply`, the bound indices are exactly `range ∩ [0, len)`.
//! - No two slots are bound to the same index.
//! - The pool never shrinks before [`ElementRecycler::clear`].
//! - Applying identical inputs twice yields no patches the second time.
//!
//! # Example
//!
//! ```
//! use shelf_layout::{GridLayout, LayoutConfig, VisibleRange};
//! use shelf_widgets::recycler::{ElementRecycler, SlotPatch};
//!
//! let layout = GridLayout::compute(20, 4, LayoutConfig::new(245.0, 450.0, 0.0));
//! let mut recycler = ElementRecycler::new(8);
//!
//! let patches = recycler.apply(VisibleRange::inclusive(0, 7), layout.positions(), false);
//! assert_eq!(patches.len(), 8);
//! assert!(patches.iter().all(|p| matches!(p, SlotPatch::Show { .. })));
//!
//! // Same inputs: nothing to do.
//! assert!(recycler.apply(VisibleRange::inclusive(0, 7), layout.positions(), false).is_empty());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use shelf_core::geometry::Point;
use shelf_layout::{PositionMap, VisibleRange};

/// Pool size used when the caller has no better estimate.
pub const DEFAULT_POOL_SIZE: usize = 24;

/// Handle to one slot in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    /// Position of the slot in the pool.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// One placeholder element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RecyclerSlot {
    bound: Option<usize>,
    last_index: Option<usize>,
    position: Point,
}

impl RecyclerSlot {
    /// Index currently shown, if any.
    #[inline]
    pub const fn bound_index(&self) -> Option<usize> {
        self.bound
    }

    /// Index shown before the slot was hidden.
    #[inline]
    pub const fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    /// Whether the slot is showing an item.
    #[inline]
    pub const fn is_visible(&self) -> bool {
        self.bound.is_some()
    }

    /// Last position assigned to the slot.
    #[inline]
    pub const fn position(&self) -> Point {
        self.position
    }
}

/// A single host-visible change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotPatch {
    /// Bind `slot` to `index`, make it visible and place it at `position`.
    Show {
        slot: SlotId,
        index: usize,
        position: Point,
    },
    /// `slot` keeps showing `index` but moves to `position`.
    Move {
        slot: SlotId,
        index: usize,
        position: Point,
    },
    /// `slot` stops showing `index` and becomes invisible.
    Hide { slot: SlotId, index: usize },
}

impl SlotPatch {
    /// Slot the patch targets.
    pub const fn slot(&self) -> SlotId {
        match *self {
            Self::Show { slot, .. } | Self::Move { slot, .. } | Self::Hide { slot, .. } => slot,
        }
    }

    /// Item index the patch concerns.
    pub const fn index(&self) -> usize {
        match *self {
            Self::Show { index, .. } | Self::Move { index, .. } | Self::Hide { index, .. } => index,
        }
    }

    /// Short label for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Show { .. } => "show",
            Self::Move { .. } => "move",
            Self::Hide { .. } => "hide",
        }
    }
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecyclerStats {
    /// Slots in the pool.
    pub pool_size: usize,
    /// Slots currently bound.
    pub bound: usize,
    /// Slots created beyond the initial capacity.
    pub grown: u64,
    /// Full resets performed.
    pub resets: u64,
    /// Entering indices that reclaimed their own parked slot.
    pub reclaimed: u64,
    /// `Show` patches emitted.
    pub shows: u64,
    /// `Move` patches emitted.
    pub moves: u64,
    /// `Hide` patches emitted.
    pub hides: u64,
}

/// Binds a bounded pool of slots to the visible index range.
#[derive(Debug, Clone)]
pub struct ElementRecycler {
    slots: Vec<RecyclerSlot>,
    by_index: HashMap<usize, SlotId>,
    /// Unbound slots without memory, popped from the back.
    fresh: Vec<SlotId>,
    /// Unbound slots keyed by the index they last showed.
    parked: BTreeMap<usize, SlotId>,
    initial_capacity: usize,
    last_range: VisibleRange,
    last_positions: Option<PositionMap>,
    stats: RecyclerStats,
}

impl Default for ElementRecycler {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl ElementRecycler {
    /// Create a pool with `capacity` fresh slots.
    pub fn new(capacity: usize) -> Self {
        let mut recycler = Self {
            slots: Vec::with_capacity(capacity),
            by_index: HashMap::with_capacity(capacity),
            fresh: Vec::with_capacity(capacity),
            parked: BTreeMap::new(),
            initial_capacity: capacity,
            last_range: VisibleRange::EMPTY,
            last_positions: None,
            stats: RecyclerStats::default(),
        };
        recycler.fill_fresh(capacity);
        recycler
    }

    fn fill_fresh(&mut self, capacity: usize) {
        self.slots = vec![RecyclerSlot::default(); capacity];
        // Lowest id on top so slots are handed out in ascending order.
        self.fresh = (0..capacity).rev().map(SlotId).collect();
    }

    /// Bring the pool in line with `range` over `positions`.
    ///
    /// With `reset` set, every binding and every parked memory is dropped
    /// first, so the whole range is shown from scratch.
    pub fn apply(
        &mut self,
        range: VisibleRange,
        positions: &PositionMap,
        reset: bool,
    ) -> Vec<SlotPatch> {
        if !reset && range == self.last_range && self.last_positions.as_ref() == Some(positions) {
            return Vec::new();
        }

        let mut patches = Vec::new();
        if reset {
            self.release_all(&mut patches);
        }

        let wanted = range.first().unwrap_or(0)..range.as_range().end.min(positions.len());

        // Exiting indices.
        let mut exiting: Vec<usize> = self
            .by_index
            .keys()
            .copied()
            .filter(|idx| !wanted.contains(idx))
            .collect();
        exiting.sort_unstable();
        for index in exiting {
            if let Some(slot) = self.by_index.remove(&index) {
                self.park(slot, index);
                patches.push(SlotPatch::Hide { slot, index });
            }
        }

        // Staying indices: refresh positions that moved.
        for index in wanted.clone() {
            let (Some(&slot), Some(position)) = (self.by_index.get(&index), positions.get(index))
            else {
                continue;
            };
            let entry = &mut self.slots[slot.0];
            if entry.position != position {
                entry.position = position;
                patches.push(SlotPatch::Move {
                    slot,
                    index,
                    position,
                });
            }
        }

        // Entering indices: own parked slot first.
        let entering: Vec<usize> = wanted
            .filter(|idx| !self.by_index.contains_key(idx))
            .collect();
        let mut unplaced = Vec::with_capacity(entering.len());
        for index in entering {
            if let Some(slot) = self.parked.remove(&index) {
                self.stats.reclaimed += 1;
                self.bind(slot, index, positions, &mut patches);
            } else {
                unplaced.push(index);
            }
        }

        let mut grown = 0usize;
        for index in unplaced {
            let slot = match self.take_unbound(index) {
                Some(slot) => slot,
                None => {
                    grown += 1;
                    self.grow()
                }
            };
            self.bind(slot, index, positions, &mut patches);
        }
        if grown > 0 {
            self.stats.grown += grown as u64;
            tracing::debug!(
                grown,
                pool_size = self.slots.len(),
                initial = self.initial_capacity,
                "recycler pool grown"
            );
        }

        for patch in &patches {
            tracing::trace!(kind = patch.kind(), slot = %patch.slot(), index = patch.index(), "slot patch");
            match patch {
                SlotPatch::Show { .. } => self.stats.shows += 1,
                SlotPatch::Move { .. } => self.stats.moves += 1,
                SlotPatch::Hide { .. } => self.stats.hides += 1,
            }
        }

        self.last_range = range;
        self.last_positions = Some(*positions);
        patches
    }

    fn release_all(&mut self, patches: &mut Vec<SlotPatch>) {
        let mut bound: Vec<(SlotId, usize)> =
            self.by_index.drain().map(|(index, slot)| (slot, index)).collect();
        bound.sort_unstable();
        for &(slot, index) in &bound {
            patches.push(SlotPatch::Hide { slot, index });
        }
        for slot in &mut self.slots {
            slot.bound = None;
            slot.last_index = None;
        }
        self.parked.clear();
        self.fresh = (0..self.slots.len()).rev().map(SlotId).collect();
        self.stats.resets += 1;
        tracing::debug!(released = bound.len(), pool_size = self.slots.len(), "recycler reset");
    }

    fn park(&mut self, slot: SlotId, index: usize) {
        let entry = &mut self.slots[slot.0];
        entry.bound = None;
        entry.last_index = Some(index);
        if let Some(displaced) = self.parked.insert(index, slot) {
            self.slots[displaced.0].last_index = None;
            self.fresh.push(displaced);
        }
    }

    /// A fresh slot, else the parked slot farthest from `index`.
    fn take_unbound(&mut self, index: usize) -> Option<SlotId> {
        if let Some(slot) = self.fresh.pop() {
            return Some(slot);
        }
        let lowest = self.parked.first_key_value().map(|(&k, _)| k)?;
        let highest = self.parked.last_key_value().map(|(&k, _)| k)?;
        let evicted = if index.abs_diff(lowest) >= index.abs_diff(highest) {
            self.parked.pop_first()
        } else {
            self.parked.pop_last()
        };
        evicted.map(|(_, slot)| slot)
    }

    /// Make sure the pool holds at least `capacity` slots, adding fresh ones
    /// if needed. Returns the number of slots added.
    pub fn reserve(&mut self, capacity: usize) -> usize {
        let current = self.slots.len();
        if capacity <= current {
            return 0;
        }
        self.slots.resize(capacity, RecyclerSlot::default());
        // New ids go under the existing fresh ones to keep ascending hand-out.
        self.fresh.splice(0..0, (current..capacity).rev().map(SlotId));
        let added = capacity - current;
        tracing::debug!(added, pool_size = capacity, "recycler pool reserved");
        added
    }

    fn grow(&mut self) -> SlotId {
        let slot = SlotId(self.slots.len());
        self.slots.push(RecyclerSlot::default());
        slot
    }

    fn bind(
        &mut self,
        slot: SlotId,
        index: usize,
        positions: &PositionMap,
        patches: &mut Vec<SlotPatch>,
    ) {
        let position = positions.get(index).unwrap_or_default();
        let entry = &mut self.slots[slot.0];
        entry.bound = Some(index);
        entry.last_index = None;
        entry.position = position;
        self.by_index.insert(index, slot);
        patches.push(SlotPatch::Show {
            slot,
            index,
            position,
        });
    }

    /// Destroy every slot, returning the ids the host must drop.
    ///
    /// The recycler is left empty with its initial capacity restored, ready
    /// for a new mount.
    pub fn clear(&mut self) -> Vec<SlotId> {
        let destroyed: Vec<SlotId> = (0..self.slots.len()).map(SlotId).collect();
        self.by_index.clear();
        self.parked.clear();
        self.fill_fresh(self.initial_capacity);
        self.last_range = VisibleRange::EMPTY;
        self.last_positions = None;
        destroyed
    }

    /// Bound indices in ascending order.
    pub fn visible_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.by_index.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Slot currently showing `index`.
    #[inline]
    pub fn slot_for(&self, index: usize) -> Option<SlotId> {
        self.by_index.get(&index).copied()
    }

    /// Slot state by id.
    #[inline]
    pub fn slot(&self, id: SlotId) -> Option<&RecyclerSlot> {
        self.slots.get(id.0)
    }

    /// Slots in the pool.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots currently bound.
    #[inline]
    pub fn live_slots(&self) -> usize {
        self.by_index.len()
    }

    /// Range applied last.
    #[inline]
    pub const fn last_range(&self) -> VisibleRange {
        self.last_range
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> RecyclerStats {
        RecyclerStats {
            pool_size: self.slots.len(),
            bound: self.by_index.len(),
            ..self.stats
        }
    }
}
