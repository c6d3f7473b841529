//! Coordinate types shared by the renderer and the game layer.
//!
//! Canonical CPU space is window pixel space:
//! - framebuffer (physical) pixels
//! - origin bottom-left
//! - +X right, +Y up
//!
//! The vertex shader maps this space to NDC with an orthographic projection.

mod vec2;
mod viewport;

pub use vec2::Vec2;
pub use viewport::Viewport;
