use bytemuck::{Pod, Zeroable};

/// Column-major 4x4 orthographic projection, laid out as the vertex shader's
/// `mat4x4<f32>` uniform.
///
/// X and Y use the classic diagonal scale + translation form. Depth maps
/// `[near, far]` onto wgpu's `[0, 1]` clip range (not GL's `[-1, 1]`), so
/// geometry at `z = 0` with `near = 0` lands on the near plane instead of
/// being clipped.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Projection {
    pub columns: [[f32; 4]; 4],
}

impl Projection {
    pub const IDENTITY: Projection = Projection {
        columns: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let rl = right - left;
        let tb = top - bottom;
        let fnr = far - near;

        Self {
            columns: [
                [2.0 / rl, 0.0, 0.0, 0.0],
                [0.0, 2.0 / tb, 0.0, 0.0],
                [0.0, 0.0, -1.0 / fnr, 0.0],
                [-(right + left) / rl, -(top + bottom) / tb, -near / fnr, 1.0],
            ],
        }
    }

    /// Window-space projection: origin bottom-left, one unit per pixel.
    pub fn window(width: f32, height: f32) -> Self {
        Self::orthographic(0.0, width, 0.0, height, 0.0, 1.0)
    }

    /// Applies the matrix to `(x, y, 0, 1)` and returns the NDC x/y.
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let c = &self.columns;
        let w = c[0][3] * x + c[1][3] * y + c[3][3];
        (
            (c[0][0] * x + c[1][0] * y + c[3][0]) / w,
            (c[0][1] * x + c[1][1] * y + c[3][1]) / w,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.columns.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::IDENTITY
    }
}
