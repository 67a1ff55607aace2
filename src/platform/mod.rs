//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame scheduling (requestAnimationFrame on web, manual elsewhere)

pub mod scheduler;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use scheduler::{FrameCallback, FrameScheduler, LoopHandle, ManualScheduler, start_loop};
#[cfg(target_arch = "wasm32")]
pub use web::AnimationFrameScheduler;
