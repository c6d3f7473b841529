//! Contract between the runtime (platform loop) and the application.
//!
//! The runtime owns the window, GPU context and input state; the application
//! owns its GPU resources and simulation state and sees them through
//! `FrameCtx` once per tick.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
