//! GPU geometry: static shape buffers plus per-instance offset/size buffers.
//!
//! Vertex input layout shared with the shader program:
//!
//!  slot  location  step       data
//!  0     0         vertex     shape position   vec2<f32>
//!  1     1         instance   offset (pixels)  vec2<f32>
//!  2     2         instance   size (pixels)    vec2<f32>

use std::f32::consts::TAU;

use wgpu::util::DeviceExt;

use crate::coords::Vec2;

pub const POSITION_LOCATION: u32 = 0;
pub const OFFSET_LOCATION: u32 = 1;
pub const SIZE_LOCATION: u32 = 2;

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![POSITION_LOCATION => Float32x2];
const OFFSET_ATTRS: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![OFFSET_LOCATION => Float32x2];
const SIZE_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![SIZE_LOCATION => Float32x2];

const VEC2_STRIDE: wgpu::BufferAddress = std::mem::size_of::<Vec2>() as wgpu::BufferAddress;

/// Vertex buffer layouts in slot order, for pipeline creation.
pub fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 3] {
    [
        wgpu::VertexBufferLayout {
            array_stride: VEC2_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRS,
        },
        wgpu::VertexBufferLayout {
            array_stride: VEC2_STRIDE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &OFFSET_ATTRS,
        },
        wgpu::VertexBufferLayout {
            array_stride: VEC2_STRIDE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &SIZE_ATTRS,
        },
    ]
}

// ── CPU geometry ──────────────────────────────────────────────────────────

/// Immutable vertex positions + triangle-list indices for one shape.
///
/// Positions are in unit space and scaled by the per-instance size in the
/// vertex shader.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeGeometry {
    pub vertices: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl ShapeGeometry {
    /// Unit quad centred on the origin, two triangles.
    pub fn quad() -> Self {
        Self {
            vertices: vec![
                Vec2::new(0.5, 0.5),
                Vec2::new(-0.5, 0.5),
                Vec2::new(-0.5, -0.5),
                Vec2::new(0.5, -0.5),
            ],
            indices: vec![
                0, 1, 2, // top left
                2, 3, 0, // bottom right
            ],
        }
    }

    /// Triangle-fan approximation of a circle, expressed as a triangle list.
    ///
    /// Vertex 0 is the center, vertices `1..=triangles` lie on the perimeter at
    /// angle `2πk / triangles`. Triangle `k` is `(0, k, k + 1)`; the last one
    /// wraps back to vertex 1 to close the fan.
    ///
    /// Returns `None` for fewer than three triangles.
    pub fn circle_fan(triangles: u32, radius: f32) -> Option<Self> {
        if triangles < 3 {
            return None;
        }

        let step = TAU / triangles as f32;
        let mut vertices = Vec::with_capacity(triangles as usize + 1);
        vertices.push(Vec2::zero());
        vertices.extend((0..triangles).map(|k| {
            let theta = step * k as f32;
            Vec2::new(radius * theta.cos(), radius * theta.sin())
        }));

        let mut indices = Vec::with_capacity(triangles as usize * 3);
        for k in 1..=triangles {
            let next = if k == triangles { 1 } else { k + 1 };
            indices.extend_from_slice(&[0, k, next]);
        }

        Some(Self { vertices, indices })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

// ── GPU buffers ───────────────────────────────────────────────────────────

/// Static position + index buffers for a shape.
pub struct Shape {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl Shape {
    pub fn create(device: &wgpu::Device, label: &str, geometry: &ShapeGeometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(format!("{label} vbo").as_str()),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(format!("{label} ibo").as_str()),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// Per-instance buffer of 2-float records.
///
/// Capacity is fixed at creation; `update` writes in place and never reallocates.
pub struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: u32,
}

impl InstanceBuffer {
    /// Dynamic buffer for per-instance offsets, rewritten whenever they change.
    pub fn offsets(device: &wgpu::Device, label: &str, initial: &[Vec2]) -> Self {
        Self::create(
            device,
            label,
            initial,
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        )
    }

    /// Static buffer for per-instance sizes.
    pub fn sizes(device: &wgpu::Device, label: &str, sizes: &[Vec2]) -> Self {
        Self::create(device, label, sizes, wgpu::BufferUsages::VERTEX)
    }

    fn create(
        device: &wgpu::Device,
        label: &str,
        records: &[Vec2],
        usage: wgpu::BufferUsages,
    ) -> Self {
        // wgpu rejects zero-sized vertex buffer bindings; keep one dummy record.
        let padding = [Vec2::zero()];
        let contents: &[Vec2] = if records.is_empty() { &padding } else { records };

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(contents),
            usage,
        });

        Self {
            buffer,
            capacity: records.len() as u32,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Whether `update` can write to this buffer (created by [`InstanceBuffer::offsets`]).
    pub fn is_dynamic(&self) -> bool {
        self.buffer.usage().contains(wgpu::BufferUsages::COPY_DST)
    }

    /// Overwrites the buffer contents from the start.
    ///
    /// Records beyond capacity are dropped. Static buffers are left untouched.
    pub fn update(&self, queue: &wgpu::Queue, records: &[Vec2]) {
        if !self.is_dynamic() {
            log::warn!("instance buffer is static; ignoring update of {} records", records.len());
            return;
        }
        let n = clamp_instances(records.len(), self.capacity);
        if n < records.len() {
            log::warn!(
                "instance update of {} records exceeds capacity {}; truncating",
                records.len(),
                self.capacity
            );
        }
        if n == 0 {
            return;
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&records[..n]));
    }
}

fn clamp_instances(requested: usize, capacity: u32) -> usize {
    requested.min(capacity as usize)
}

/// A shape plus its instance offset and size buffers.
pub struct InstancedMesh {
    shape: Shape,
    offsets: InstanceBuffer,
    sizes: InstanceBuffer,
}

impl InstancedMesh {
    pub fn create(
        device: &wgpu::Device,
        label: &str,
        geometry: &ShapeGeometry,
        offsets: &[Vec2],
        sizes: &[Vec2],
    ) -> Self {
        if offsets.len() != sizes.len() {
            log::warn!(
                "{label}: {} offsets but {} sizes; drawing the smaller count",
                offsets.len(),
                sizes.len()
            );
        }

        Self {
            shape: Shape::create(device, label, geometry),
            offsets: InstanceBuffer::offsets(device, &format!("{label} offsets"), offsets),
            sizes: InstanceBuffer::sizes(device, &format!("{label} sizes"), sizes),
        }
    }

    /// Number of instances both instance buffers can supply.
    pub fn instance_capacity(&self) -> u32 {
        self.offsets.capacity().min(self.sizes.capacity())
    }

    pub fn update_offsets(&self, queue: &wgpu::Queue, offsets: &[Vec2]) {
        self.offsets.update(queue, offsets);
    }

    /// Issues an instanced indexed draw of the first `instance_count` instances.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instance_count: u32) {
        let instances = instance_count.min(self.instance_capacity());
        if instances == 0 || self.shape.index_count == 0 {
            return;
        }

        pass.set_vertex_buffer(0, self.shape.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.offsets.buffer.slice(..));
        pass.set_vertex_buffer(2, self.sizes.buffer.slice(..));
        pass.set_index_buffer(self.shape.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.shape.index_count, 0, 0..instances);
    }
}
