use winit::event::WindowEvent;

use crate::render::RenderCtx;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the binary.
pub trait App {
    /// Called once, after the window and GPU exist and before the first frame.
    ///
    /// An error here aborts the runtime with an init failure.
    fn on_start(&mut self, ctx: &RenderCtx<'_>) -> anyhow::Result<()>;

    /// Called for window events, after input state has been updated.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once when the window is closing, while the GPU is still alive.
    ///
    /// Apps release their GPU resources here.
    fn on_exit(&mut self) {}
}
