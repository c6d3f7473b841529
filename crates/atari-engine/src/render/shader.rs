//! Shader loading, compilation and program linking.
//!
//! Shader sources are WGSL text files read at runtime. "Compile" parses and
//! validates one stage with naga (the compiler wgpu itself uses), "link"
//! checks the two stages against each other and against the fixed vertex
//! layout + projection binding, then builds the render pipeline.
//!
//! Failures never abort: [`ShaderProgram::build`] logs the diagnostic and
//! returns the invalid program, which draws nothing.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Handle, Module, Type, TypeInner};

use super::geometry::{self, OFFSET_LOCATION, POSITION_LOCATION, SIZE_LOCATION};
use super::projection::Projection;

/// Bind group / binding of the projection uniform.
pub const PROJECTION_GROUP: u32 = 0;
pub const PROJECTION_BINDING: u32 = 0;

const PROJECTION_SIZE: u64 = std::mem::size_of::<Projection>() as u64;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShaderError {
    Compile {
        stage: ShaderStage,
        label: String,
        diagnostic: String,
    },
    Link {
        diagnostic: String,
    },
}

impl ShaderError {
    /// Diagnostic text produced by the compiler or the link checks.
    pub fn diagnostic(&self) -> &str {
        match self {
            ShaderError::Compile { diagnostic, .. } | ShaderError::Link { diagnostic } => diagnostic,
        }
    }

    fn link(diagnostic: impl Into<String>) -> Self {
        ShaderError::Link {
            diagnostic: diagnostic.into(),
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compile {
                stage,
                label,
                diagnostic,
            } => write!(f, "error in {stage} shader compilation ({label}): {diagnostic}"),
            ShaderError::Link { diagnostic } => write!(f, "error in shader linking: {diagnostic}"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// One validated shader stage.
#[derive(Debug)]
pub struct CompiledShader {
    label: String,
    stage: ShaderStage,
    source: String,
    module: Module,
    entry_point: String,
}

impl CompiledShader {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Name of the entry point used for this stage (the first one declared).
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn entry(&self) -> Option<&naga::EntryPoint> {
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.name == self.entry_point)
    }
}

/// Reads shader source as UTF-8 text.
///
/// An unreadable file is logged and yields an empty string, which then fails
/// compilation with its own diagnostic.
pub fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            log::error!("could not open {}: {e}", path.display());
            String::new()
        }
    }
}

/// Parses and validates `source` as the given stage.
///
/// The module must declare at least one entry point for `stage`.
pub fn compile(label: &str, source: &str, stage: ShaderStage) -> Result<CompiledShader, ShaderError> {
    let fail = |diagnostic: String| ShaderError::Compile {
        stage,
        label: label.to_string(),
        diagnostic,
    };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| fail(e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| fail(e.emit_to_string(source)))?;

    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage.to_naga())
        .map(|ep| ep.name.clone())
        .ok_or_else(|| fail(format!("no @{stage} entry point declared")))?;

    log::debug!("compiled {stage} shader {label} (entry point `{entry_point}`)");

    Ok(CompiledShader {
        label: label.to_string(),
        stage,
        source: source.to_string(),
        module,
        entry_point,
    })
}

/// Reads and compiles a shader file.
pub fn compile_file(path: &Path, stage: ShaderStage) -> Result<CompiledShader, ShaderError> {
    let source = read_source(path);
    compile(&path.display().to_string(), &source, stage)
}

// ── link checks ───────────────────────────────────────────────────────────

/// Checks that two compiled stages form a program the fixed pipeline layout
/// can run: vertex inputs match the instanced vertex layout, fragment inputs
/// are produced by the vertex stage, the fragment writes color target 0 and
/// the only resource is the projection uniform, visible to the vertex stage.
pub fn check_link(vertex: &CompiledShader, fragment: &CompiledShader) -> Result<(), ShaderError> {
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err(ShaderError::link(format!(
            "expected vertex + fragment stages, got {} + {}",
            vertex.stage, fragment.stage
        )));
    }

    let (Some(vs), Some(fs)) = (vertex.entry(), fragment.entry()) else {
        return Err(ShaderError::link("entry point missing from compiled module"));
    };

    let vec2f = TypeInner::Vector {
        size: naga::VectorSize::Bi,
        scalar: naga::Scalar::F32,
    };
    for (location, inner) in entry_inputs(&vertex.module, vs) {
        if ![POSITION_LOCATION, OFFSET_LOCATION, SIZE_LOCATION].contains(&location) {
            return Err(ShaderError::link(format!(
                "vertex input @location({location}) is not provided by the vertex layout"
            )));
        }
        if inner != vec2f {
            return Err(ShaderError::link(format!(
                "vertex input @location({location}) must be vec2<f32>"
            )));
        }
    }

    let varyings = entry_outputs(&vertex.module, vs);
    for (location, inner) in entry_inputs(&fragment.module, fs) {
        match varyings.iter().find(|(l, _)| *l == location) {
            None => {
                return Err(ShaderError::link(format!(
                    "fragment input @location({location}) is not written by the vertex stage"
                )));
            }
            Some((_, out)) if *out != inner => {
                return Err(ShaderError::link(format!(
                    "type mismatch between stages at @location({location})"
                )));
            }
            Some(_) => {}
        }
    }

    if !entry_outputs(&fragment.module, fs).iter().any(|(l, _)| *l == 0) {
        return Err(ShaderError::link("fragment stage does not write @location(0)"));
    }

    check_bindings(vertex)?;
    check_bindings(fragment)?;
    Ok(())
}

fn check_bindings(shader: &CompiledShader) -> Result<(), ShaderError> {
    let module = &shader.module;
    for (_, var) in module.global_variables.iter() {
        let Some(rb) = &var.binding else { continue };

        if shader.stage == ShaderStage::Fragment {
            return Err(ShaderError::link(format!(
                "{}: fragment stage declares @group({}) @binding({}), only the vertex stage sees resources",
                shader.label, rb.group, rb.binding
            )));
        }
        if (rb.group, rb.binding) != (PROJECTION_GROUP, PROJECTION_BINDING) {
            return Err(ShaderError::link(format!(
                "{}: unexpected resource at @group({}) @binding({})",
                shader.label, rb.group, rb.binding
            )));
        }
        if var.space != AddressSpace::Uniform {
            return Err(ShaderError::link(format!(
                "{}: projection binding must be a uniform",
                shader.label
            )));
        }
        let size = module.types[var.ty].inner.size(module.to_ctx()) as u64;
        if size > PROJECTION_SIZE {
            return Err(ShaderError::link(format!(
                "{}: projection uniform is {size} bytes, at most {PROJECTION_SIZE} are bound",
                shader.label
            )));
        }
    }
    Ok(())
}

fn entry_inputs(module: &Module, ep: &naga::EntryPoint) -> Vec<(u32, TypeInner)> {
    let mut out = Vec::new();
    for arg in &ep.function.arguments {
        collect_locations(module, arg.ty, arg.binding.as_ref(), &mut out);
    }
    out
}

fn entry_outputs(module: &Module, ep: &naga::EntryPoint) -> Vec<(u32, TypeInner)> {
    let mut out = Vec::new();
    if let Some(result) = &ep.function.result {
        collect_locations(module, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<(u32, TypeInner)>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.push((*location, module.types[ty].inner.clone()));
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_locations(module, m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

// ── program ───────────────────────────────────────────────────────────────

struct LinkedProgram {
    pipeline: wgpu::RenderPipeline,
    projection_ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// A linked render pipeline plus its projection uniform, or the invalid
/// sentinel left behind by a failed build.
pub struct ShaderProgram {
    linked: Option<LinkedProgram>,
}

impl ShaderProgram {
    pub const fn invalid() -> Self {
        Self { linked: None }
    }

    pub fn is_valid(&self) -> bool {
        self.linked.is_some()
    }

    /// Compiles both stage files and links them.
    ///
    /// Every failure is logged with its diagnostic; the result is then the
    /// invalid program.
    pub fn build(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        vertex_path: &Path,
        fragment_path: &Path,
    ) -> Self {
        let vertex = compile_file(vertex_path, ShaderStage::Vertex);
        let fragment = compile_file(fragment_path, ShaderStage::Fragment);

        let linked = match (vertex, fragment) {
            (Ok(vs), Ok(fs)) => Self::link(device, format, &vs, &fs),
            (vs, fs) => {
                for err in [vs.err(), fs.err()].into_iter().flatten() {
                    log::error!("{err}");
                }
                return Self::invalid();
            }
        };

        linked.unwrap_or_else(|err| {
            log::error!("{err}");
            Self::invalid()
        })
    }

    /// Links two compiled stages into a render pipeline targeting `format`.
    pub fn link(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        vertex: &CompiledShader,
        fragment: &CompiledShader,
    ) -> Result<Self, ShaderError> {
        check_link(vertex, fragment)?;

        // Anything naga cannot see (target format vs. output type, interpolation)
        // surfaces here instead of in the uncaptured error handler.
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(vertex.label.as_str()),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&vertex.source)),
        });
        let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(fragment.label.as_str()),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&fragment.source)),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("atari projection bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: PROJECTION_BINDING,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("atari pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let buffers = geometry::vertex_layouts();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("atari pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vs_module,
                entry_point: Some(vertex.entry_point.as_str()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fs_module,
                entry_point: Some(fragment.entry_point.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let projection_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atari projection ubo"),
            size: PROJECTION_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("atari projection bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: PROJECTION_BINDING,
                resource: projection_ubo.as_entire_binding(),
            }],
        });

        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(ShaderError::link(format!(
                "{} + {}: {err}",
                vertex.label, fragment.label
            )));
        }

        log::debug!(
            "linked program {} + {}",
            vertex.label,
            fragment.label
        );

        Ok(Self {
            linked: Some(LinkedProgram {
                pipeline,
                projection_ubo,
                bind_group,
            }),
        })
    }

    /// Uploads `projection` to the program's uniform. No-op when invalid.
    pub fn set_projection(&self, queue: &wgpu::Queue, projection: &Projection) {
        let Some(linked) = &self.linked else { return };
        queue.write_buffer(&linked.projection_ubo, 0, bytemuck::bytes_of(projection));
    }

    /// Computes an orthographic projection and uploads it.
    ///
    /// Needed once at startup and again after every resize.
    #[allow(clippy::too_many_arguments)]
    pub fn set_orthographic_projection(
        &self,
        queue: &wgpu::Queue,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) {
        let projection = Projection::orthographic(left, right, bottom, top, near, far);
        if !projection.is_finite() {
            log::warn!("skipping degenerate projection ({left}..{right}, {bottom}..{top})");
            return;
        }
        self.set_projection(queue, &projection);
    }

    /// Binds the pipeline and projection. Returns `false` for the invalid
    /// program, in which case the caller should skip its draws.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some(linked) = &self.linked else { return false };
        pass.set_pipeline(&linked.pipeline);
        pass.set_bind_group(PROJECTION_GROUP, &linked.bind_group, &[]);
        true
    }
}

impl Default for ShaderProgram {
    fn default() -> Self {
        Self::invalid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::noop_device;

    const VS: &str = r#"
struct Projection { matrix: mat4x4<f32> }
@group(0) @binding(0) var<uniform> projection: Projection;

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) local: vec2<f32>,
}

@vertex
fn vs_main(
    @location(0) pos: vec2<f32>,
    @location(1) offset: vec2<f32>,
    @location(2) size: vec2<f32>,
) -> VertexOut {
    var out: VertexOut;
    out.clip = projection.matrix * vec4<f32>(pos * size + offset, 0.0, 1.0);
    out.local = pos;
    return out;
}
"#;

    const FS: &str = r#"
@fragment
fn fs_main(@location(0) local: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

    fn vs() -> CompiledShader {
        compile("test.vs", VS, ShaderStage::Vertex).expect("vertex shader compiles")
    }

    fn fs(src: &str) -> CompiledShader {
        compile("test.fs", src, ShaderStage::Fragment).expect("fragment shader compiles")
    }

    #[test]
    fn valid_stages_compile_and_link() {
        let vs = vs();
        assert_eq!(vs.entry_point(), "vs_main");
        let fs = fs(FS);
        assert_eq!(fs.entry_point(), "fs_main");
        assert_eq!(check_link(&vs, &fs), Ok(()));
    }

    #[test]
    fn syntax_error_reports_diagnostic() {
        let err = compile("bad.vs", "@vertex fn vs_main( -> {", ShaderStage::Vertex).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: ShaderStage::Vertex, .. }));
        assert!(!err.diagnostic().is_empty());
        assert!(err.to_string().contains("bad.vs"));
    }

    #[test]
    fn validation_error_reports_diagnostic() {
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        let err = compile("bad.fs", src, ShaderStage::Fragment).unwrap_err();
        assert!(!err.diagnostic().is_empty());
    }

    #[test]
    fn empty_source_fails_compilation() {
        let err = compile("missing.vs", "", ShaderStage::Vertex).unwrap_err();
        assert!(err.diagnostic().contains("entry point"));
    }

    #[test]
    fn unreadable_file_fails_compilation() {
        let path = Path::new("definitely/not/here.wgsl");
        assert_eq!(read_source(path), "");
        assert!(compile_file(path, ShaderStage::Fragment).is_err());
    }

    #[test]
    fn wrong_stage_is_a_compile_error() {
        let err = compile("frag-as-vert", FS, ShaderStage::Vertex).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { .. }));
    }

    #[test]
    fn unmatched_varying_fails_link() {
        let src = r#"
@fragment
fn fs_main(@location(3) v: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(v, 0.0, 1.0);
}
"#;
        let err = check_link(&vs(), &fs(src)).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
        assert!(err.diagnostic().contains("@location(3)"));
    }

    #[test]
    fn mismatched_varying_type_fails_link() {
        let src = r#"
@fragment
fn fs_main(@location(0) v: vec4<f32>) -> @location(0) vec4<f32> {
    return v;
}
"#;
        assert!(check_link(&vs(), &fs(src)).is_err());
    }

    #[test]
    fn extra_resource_binding_fails_link() {
        let src = r#"
@group(0) @binding(1) var<uniform> tint: vec4<f32>;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return tint;
}
"#;
        let err = check_link(&vs(), &fs(src)).unwrap_err();
        assert!(err.diagnostic().contains("@binding(1)"));
    }

    #[test]
    fn vertex_input_outside_layout_fails_link() {
        let src = r#"
@vertex
fn vs_main(@location(5) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(pos, 0.0, 1.0);
}
"#;
        let vs = compile("odd.vs", src, ShaderStage::Vertex).unwrap();
        let plain = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        assert!(check_link(&vs, &fs(plain)).is_err());
    }

    #[test]
    fn fragment_resource_binding_fails_link() {
        let src = r#"
struct Projection { matrix: mat4x4<f32> }
@group(0) @binding(0) var<uniform> projection: Projection;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return projection.matrix[0];
}
"#;
        let err = check_link(&vs(), &fs(src)).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
        assert!(err.diagnostic().contains("fragment stage"));
    }

    #[test]
    fn invalid_program_is_a_sentinel() {
        let program = ShaderProgram::invalid();
        assert!(!program.is_valid());
        assert!(!ShaderProgram::default().is_valid());
    }

    const TARGET: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    #[test]
    fn build_with_unreadable_paths_yields_invalid_program() {
        let (device, _queue) = noop_device();
        let program = ShaderProgram::build(
            &device,
            TARGET,
            Path::new("definitely/not/here.vs.wgsl"),
            Path::new("definitely/not/here.fs.wgsl"),
        );
        assert!(!program.is_valid());
    }

    #[test]
    fn build_with_syntax_error_yields_invalid_program() {
        let (device, _queue) = noop_device();
        let dir = tempfile::tempdir().unwrap();
        let vs_path = dir.path().join("main.vs.wgsl");
        let fs_path = dir.path().join("main.fs.wgsl");
        std::fs::write(&vs_path, VS).unwrap();
        std::fs::write(&fs_path, "@fragment fn fs_main( -> {").unwrap();

        let program = ShaderProgram::build(&device, TARGET, &vs_path, &fs_path);
        assert!(!program.is_valid());
    }

    #[test]
    fn build_with_valid_sources_yields_valid_program() {
        let (device, _queue) = noop_device();
        let dir = tempfile::tempdir().unwrap();
        let vs_path = dir.path().join("main.vs.wgsl");
        let fs_path = dir.path().join("main.fs.wgsl");
        std::fs::write(&vs_path, VS).unwrap();
        std::fs::write(&fs_path, FS).unwrap();

        let program = ShaderProgram::build(&device, TARGET, &vs_path, &fs_path);
        assert!(program.is_valid());
    }

    #[test]
    fn link_rejects_fragment_reading_projection() {
        let (device, _queue) = noop_device();
        let src = r#"
struct Projection { matrix: mat4x4<f32> }
@group(0) @binding(0) var<uniform> projection: Projection;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return projection.matrix[0];
}
"#;
        let result = ShaderProgram::link(&device, TARGET, &vs(), &fs(src));
        assert!(matches!(result, Err(ShaderError::Link { .. })));
    }

    #[test]
    fn pipeline_validation_error_becomes_link_error() {
        let (device, _queue) = noop_device();
        // Integer output into a float color target: valid WGSL, invalid pipeline.
        let src = r#"
@fragment
fn fs_main() -> @location(0) vec4<u32> {
    return vec4<u32>(1u);
}
"#;
        let fs = fs(src);
        assert_eq!(check_link(&vs(), &fs), Ok(()));
        let result = ShaderProgram::link(&device, TARGET, &vs(), &fs);
        assert!(matches!(result, Err(ShaderError::Link { .. })));
    }

    #[test]
    fn repo_shaders_compile_and_link() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../shaders");
        let vs = compile_file(&root.join("main.vs.wgsl"), ShaderStage::Vertex).unwrap();
        let fs = compile_file(&root.join("main.fs.wgsl"), ShaderStage::Fragment).unwrap();
        assert_eq!(check_link(&vs, &fs), Ok(()));
    }
}
