//! Color types used for clearing and shading.

pub mod color;

pub use color::Color;
