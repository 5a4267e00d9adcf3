#![forbid(unsafe_code)]

//! Runtime for shelf grids: the per-instance controller, debounced resize
//! handling, host bindings, and a headless host for tests.

pub mod config;
pub mod grid;
pub mod host;
pub mod resize_coordinator;
pub mod simulator;

pub use config::GridConfig;
pub use grid::{
    FlushReport, GridHandle, GridHooks, GridStats, RenderState, VirtualGrid, VisibleItems,
};
pub use host::{FrameScheduler, ObserverId, ScrollContainer};
pub use resize_coordinator::{ResizeAction, ResizeConfig, ResizeCoordinator, ResizeStats};
pub use simulator::{HeadlessContainer, HeadlessHost, HeadlessSurface, ManualFrames, PatchError};
