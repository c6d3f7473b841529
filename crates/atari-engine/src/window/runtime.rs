use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coords::Viewport;
use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::winit::translate_window_event;
use crate::input::{InputEvent, InputFrame, InputState};
use crate::render::RenderCtx;
use crate::time::FrameClock;

use super::state::{ExitStatus, LoopEvent, LoopState};

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Pong Game".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
            resizable: true,
        }
    }
}

/// Requests the app can make of the runtime during a tick.
///
/// Applied after the callback returns.
#[derive(Debug, Default)]
pub struct RuntimeCtx {
    exit_requested: bool,
}

impl RuntimeCtx {
    /// Sets the close flag.
    pub fn exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs the frame loop until the window closes.
    ///
    /// Returns `ExitStatus::EnvironmentFailure` when the window or GPU context
    /// could not be created; everything acquired so far is released first.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<ExitStatus>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        log::debug!("frame loop finished in state {:?}", state.loop_state);
        Ok(state.status)
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    input_frame: InputFrame,
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    loop_state: LoopState,
    status: ExitStatus,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            loop_state: LoopState::Uninitialized,
            status: ExitStatus::Normal,
        }
    }

    fn advance(&mut self, event: LoopEvent) {
        let next = self.loop_state.next(event);
        if next != self.loop_state {
            log::debug!("frame loop: {:?} -> {:?}", self.loop_state, next);
        }
        self.loop_state = next;
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("could not create window")?;

        let gpu_init = self.gpu_init.clone();

        WindowEntryTryBuilder {
            input_state: InputState {
                focused: true,
                ..Default::default()
            },
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, gpu_init)).context("could not initialize GPU")
            },
        }
        .try_build()
    }

    /// Running -> Terminated: the app releases its resources, then the GPU
    /// context and window are dropped.
    fn terminate(&mut self, event_loop: &ActiveEventLoop) {
        self.release();
        self.advance(LoopEvent::CloseRequested);
        event_loop.exit();
    }

    fn release(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.app.on_exit();
            drop(entry);
        }
    }

    fn run_frame(&mut self, window_id: WindowId) -> bool {
        let Some(entry) = self.entry.as_mut() else {
            return false;
        };
        let app = &mut self.app;

        let mut runtime_ctx = RuntimeCtx::default();
        let mut control = AppControl::Continue;

        entry.with_mut(|fields| {
            let time = fields.clock.tick();

            // Scope so `ctx` is dropped before the frame deltas are cleared.
            {
                let mut ctx = FrameCtx {
                    window: WindowCtx {
                        id: window_id,
                        window: fields.window,
                    },
                    gpu: fields.gpu,
                    input: fields.input_state,
                    input_frame: fields.input_frame,
                    time,
                    runtime: &mut runtime_ctx,
                };

                control = app.on_frame(&mut ctx);
            }

            fields.input_frame.clear();
        });

        control == AppControl::Exit || runtime_ctx.exit_requested()
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.loop_state != LoopState::Uninitialized {
            return;
        }

        match self.create_window_entry(event_loop) {
            Ok(entry) => {
                self.entry = Some(entry);
                self.advance(LoopEvent::EnvironmentReady);
            }
            Err(e) => {
                log::error!("{e:#}");
                self.status = ExitStatus::EnvironmentFailure;
                self.advance(LoopEvent::EnvironmentFailed);
                event_loop.exit();
                return;
            }
        }

        let app = &mut self.app;
        if let Some(entry) = self.entry.as_mut() {
            entry.with_mut(|fields| {
                let size = fields.gpu.size();
                let rctx = RenderCtx::new(
                    fields.gpu.device(),
                    fields.gpu.queue(),
                    fields.gpu.surface_format(),
                    Viewport::new(size.width as f32, size.height as f32),
                );
                app.init(&rctx);

                // GPU setup can take a while; don't count it as the first frame's dt.
                fields.clock.reset();
                fields.window.request_redraw();
            });
        }
        self.advance(LoopEvent::ResourcesCreated);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.loop_state == LoopState::Terminated {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; FIFO presentation paces the loop.
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if !self.loop_state.is_running() {
            return;
        }

        if let WindowEvent::CloseRequested = event {
            log::info!("window close requested");
            self.terminate(event_loop);
            return;
        }

        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        if let Some(ev) = translate_window_event(&event) {
            entry.with_mut(|fields| fields.input_state.apply_event(fields.input_frame, ev));
        }

        match event {
            WindowEvent::Resized(new_size) => {
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_mut(|fields| {
                    fields.gpu.resize(new_size);
                    fields.input_state.apply_event(
                        fields.input_frame,
                        InputEvent::Resized {
                            width: new_size.width,
                            height: new_size.height,
                        },
                    );
                });
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => {
                if self.run_frame(window_id) {
                    self.terminate(event_loop);
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.release();
        self.advance(LoopEvent::CloseRequested);
    }
}
