//! GPU rendering subsystem.
//!
//! - `shader`: WGSL stage compilation and program linking
//! - `geometry`: static shape buffers + per-instance offset/size buffers
//! - `projection`: the orthographic window-space projection
//!
//! Convention: CPU geometry is in framebuffer pixels with a bottom-left origin;
//! the vertex shader maps it to NDC through the projection uniform.

mod ctx;
pub mod geometry;
pub mod projection;
pub mod shader;

#[cfg(test)]
pub(crate) mod testing;

pub use ctx::RenderCtx;
pub use geometry::{InstanceBuffer, InstancedMesh, Shape, ShapeGeometry};
pub use projection::Projection;
pub use shader::{CompiledShader, ShaderError, ShaderProgram, ShaderStage};
