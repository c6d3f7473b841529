//! Atari engine crate.
//!
//! Platform + GPU runtime pieces for small instanced 2D renderers: window and
//! frame loop, keyboard input, frame timing, and a render layer built from a
//! disk-loaded shader program, shape buffers and per-instance offset buffers.

pub mod coords;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod paint;
pub mod render;
pub mod time;
pub mod window;
