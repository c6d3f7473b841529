//! Game constants and startup configuration.

use std::path::PathBuf;

use atari_engine::paint::Color;
use atari_engine::window::RuntimeConfig;

pub const PADDLE_WIDTH: f32 = 15.0;
pub const PADDLE_HEIGHT: f32 = 100.0;
pub const BALL_DIAMETER: f32 = 16.0;

/// Paddle center distance from its side of the window.
pub const PADDLE_INSET: f32 = 35.0;

/// Vertical paddle speed in pixels per second.
pub const PADDLE_SPEED: f32 = 200.0;

/// Triangles in the ball's circle fan.
pub const BALL_TRIANGLES: u32 = 20;

/// Paddle centers stay within `[BOUND, height - BOUND]`.
pub const PADDLE_BOUND: f32 = PADDLE_HEIGHT / 2.0 + BALL_DIAMETER / 2.0;

/// What happens to paddle and ball offsets when the window is resized.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ResizePolicy {
    /// Offsets are untouched; objects may end up off screen after a shrink.
    #[default]
    LeaveAsIs,
    /// Paddles are reclamped into their vertical bounds, the right paddle
    /// follows the right edge and the ball is kept inside the window.
    Clamp,
}

#[derive(Debug, Clone)]
pub struct PongConfig {
    pub runtime: RuntimeConfig,

    /// Shader sources, relative to the working directory.
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,

    pub resize_policy: ResizePolicy,
    pub clear_color: Color,
}

impl Default for PongConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            vertex_shader: PathBuf::from("shaders/main.vs.wgsl"),
            fragment_shader: PathBuf::from("shaders/main.fs.wgsl"),
            resize_policy: ResizePolicy::default(),
            clear_color: Color::from_srgb_u8(0x1a, 0x1a, 0x1a, 0xff),
        }
    }
}
