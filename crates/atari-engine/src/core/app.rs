use crate::render::RenderCtx;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the game layer.
pub trait App {
    /// Called once the window and GPU exist: create shaders and buffers here.
    ///
    /// The loop enters `Running` when this returns.
    fn init(&mut self, ctx: &RenderCtx<'_>);

    /// Called once per tick while running.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once on the way to `Terminated`, before the GPU context is
    /// dropped. Release GPU resources here.
    fn on_exit(&mut self) {}
}
