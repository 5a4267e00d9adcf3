#![forbid(unsafe_code)]

//! Render-element management for shelf grids.

pub mod recycler;

pub use recycler::{
    DEFAULT_POOL_SIZE, ElementRecycler, RecyclerSlot, RecyclerStats, SlotId, SlotPatch,
};
