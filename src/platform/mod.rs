//! Platform abstraction layer
//!
//! The simulation never schedules itself. The host display subsystem
//! (`requestAnimationFrame` on web, a manual driver in headless runs)
//! hands out per-frame callbacks through [`FrameScheduler`].

pub mod frame;

pub use frame::{FrameHandle, FrameLoop, FrameScheduler, ManualScheduler};
