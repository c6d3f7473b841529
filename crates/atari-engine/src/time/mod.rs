//! Frame timing.
//!
//! One `FrameClock` per render loop; call `tick()` once per presented frame to
//! obtain the elapsed time used to scale movement.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
