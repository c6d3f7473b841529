//! Frame loop: input step, offset upload and draw calls.

use atari_engine::coords::Viewport;
use atari_engine::core::{App, AppControl, FrameCtx};
use atari_engine::input::Key;
use atari_engine::render::{InstancedMesh, RenderCtx, ShaderProgram, ShapeGeometry};

use crate::config::{BALL_TRIANGLES, PongConfig};
use crate::scene::{PaddleInput, Scene};

/// GPU resources owned for the lifetime of the running loop.
struct GpuResources {
    program: ShaderProgram,
    paddles: InstancedMesh,
    ball: InstancedMesh,
}

pub struct PongGame {
    config: PongConfig,
    scene: Scene,
    viewport: Viewport,
    gpu: Option<GpuResources>,

    /// Offsets changed since the last upload.
    dirty: bool,
}

impl PongGame {
    pub fn new(config: PongConfig) -> Self {
        let size = config.runtime.initial_size;
        let (w, h) = (size.width as f32, size.height as f32);
        Self {
            config,
            scene: Scene::new(w, h),
            viewport: Viewport::new(w, h),
            gpu: None,
            dirty: false,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    fn handle_resize(&mut self, width: u32, height: u32, queue: &wgpu::Queue) {
        self.viewport = Viewport::new(width as f32, height as f32);
        log::debug!("framebuffer resized to {width}x{height}");

        if !self.viewport.is_valid() {
            return;
        }

        if let Some(gpu) = &self.gpu {
            gpu.program.set_orthographic_projection(
                queue,
                0.0,
                self.viewport.width,
                0.0,
                self.viewport.height,
                0.0,
                1.0,
            );
        }

        let policy = self.config.resize_policy;
        if self.scene.on_resize(self.viewport.width, self.viewport.height, policy) {
            self.dirty = true;
        }
    }

    /// Writes changed offsets to the instance buffers. The flag is cleared
    /// only once the write is queued, independent of whether a frame gets
    /// drawn this tick.
    fn upload_offsets(&mut self, queue: &wgpu::Queue) -> bool {
        let Some(gpu) = &self.gpu else { return false };
        if !self.dirty {
            return false;
        }
        gpu.paddles.update_offsets(queue, &self.scene.paddle_offsets());
        gpu.ball.update_offsets(queue, &[self.scene.ball_offset()]);
        self.dirty = false;
        true
    }
}

impl App for PongGame {
    fn init(&mut self, ctx: &RenderCtx<'_>) {
        // The framebuffer may differ from the requested logical size (HiDPI).
        self.viewport = ctx.viewport;
        self.scene = Scene::new(ctx.viewport.width, ctx.viewport.height);

        let program = ShaderProgram::build(
            ctx.device,
            ctx.surface_format,
            &self.config.vertex_shader,
            &self.config.fragment_shader,
        );
        if !program.is_valid() {
            log::warn!("shader program invalid; frames will only be cleared");
        }
        program.set_orthographic_projection(
            ctx.queue,
            0.0,
            ctx.viewport.width,
            0.0,
            ctx.viewport.height,
            0.0,
            1.0,
        );

        let paddles = InstancedMesh::create(
            ctx.device,
            "paddles",
            &ShapeGeometry::quad(),
            &self.scene.paddle_offsets(),
            &Scene::paddle_sizes(),
        );

        let ball_shape = ShapeGeometry::circle_fan(BALL_TRIANGLES, 0.5).unwrap_or_else(|| {
            log::warn!("ball needs at least 3 triangles, got {BALL_TRIANGLES}; drawing a quad");
            ShapeGeometry::quad()
        });
        let ball = InstancedMesh::create(
            ctx.device,
            "ball",
            &ball_shape,
            &[self.scene.ball_offset()],
            &[Scene::ball_size()],
        );

        self.gpu = Some(GpuResources {
            program,
            paddles,
            ball,
        });
        self.dirty = false;
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input.key_down(Key::Escape) {
            log::info!("escape pressed, closing");
            ctx.close();
            return AppControl::Exit;
        }

        if let Some((width, height)) = ctx.input_frame.resized {
            self.handle_resize(width, height, ctx.gpu.queue());
        }

        let input = PaddleInput::from_keys(ctx.input);
        if self.scene.update(&input, ctx.time.dt, self.viewport.height) {
            self.dirty = true;
        }

        self.upload_offsets(ctx.gpu.queue());

        let Some(gpu) = &self.gpu else {
            return AppControl::Continue;
        };

        ctx.render(self.config.clear_color, |_, pass| {
            if gpu.program.bind(pass) {
                gpu.paddles.draw(pass, 2);
                gpu.ball.draw(pass, 1);
            }
        })
    }

    fn on_exit(&mut self) {
        if self.gpu.take().is_some() {
            log::debug!("released shader program and geometry buffers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atari_engine::input::{InputEvent, InputFrame, InputState, KeyState};

    #[test]
    fn new_game_lays_out_scene_from_initial_size() {
        let game = PongGame::new(PongConfig::default());
        let ball = game.scene().ball_offset();
        assert_eq!((ball.x, ball.y), (400.0, 300.0));
        assert!(game.gpu.is_none());
    }

    fn noop_device() -> (wgpu::Device, wgpu::Queue) {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::NOOP,
            backend_options: wgpu::BackendOptions {
                noop: wgpu::NoopBackendOptions { enable: true },
                ..Default::default()
            },
            ..Default::default()
        });
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
            .expect("noop adapter");
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).expect("noop device")
    }

    #[test]
    fn moved_offsets_wait_for_gpu_resources() {
        let (device, queue) = noop_device();
        let mut game = PongGame::new(PongConfig::default());

        game.dirty = true;
        assert!(!game.upload_offsets(&queue));
        assert!(game.dirty);

        let ctx = RenderCtx::new(
            &device,
            &queue,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            Viewport::new(800.0, 600.0),
        );
        game.init(&ctx);
        game.dirty = true;
        assert!(game.upload_offsets(&queue));
        assert!(!game.dirty);
        assert!(!game.upload_offsets(&queue));
    }

    #[test]
    fn held_key_marks_offsets_dirty_until_uploaded() {
        let (device, queue) = noop_device();
        let mut game = PongGame::new(PongConfig::default());
        let ctx = RenderCtx::new(
            &device,
            &queue,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            Viewport::new(800.0, 600.0),
        );
        game.init(&ctx);

        let mut keys = InputState::default();
        keys.apply_event(
            &mut InputFrame::default(),
            InputEvent::Key {
                key: Key::W,
                state: KeyState::Pressed,
                repeat: false,
            },
        );
        if game.scene.update(&PaddleInput::from_keys(&keys), 0.016, 600.0) {
            game.dirty = true;
        }
        // A frame skipped by the surface does not consume the pending upload.
        assert!(game.dirty);
        assert!(game.upload_offsets(&queue));
    }
}
