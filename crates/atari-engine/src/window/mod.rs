//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, wires them to the GPU layer and
//! drives the frame-loop state machine.

mod runtime;
mod state;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
pub use state::{ExitStatus, LoopEvent, LoopState};
