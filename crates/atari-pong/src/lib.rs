//! Pong scene and frame loop on top of `atari-engine`.
//!
//! Two paddles and a ball drawn as instanced shapes; the paddles move with
//! W/S and the arrow keys. No ball physics, scoring or collisions.

pub mod config;
pub mod game;
pub mod scene;

pub use config::{PongConfig, ResizePolicy};
pub use game::PongGame;
