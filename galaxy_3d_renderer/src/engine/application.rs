/// Application hooks called by the engine loop

use winit::dpi::PhysicalSize;

use crate::engine::frame_data::FrameData;
use crate::engine::input::InputState;
use crate::error::Galaxy3dResult;
use crate::renderer::frontend::RendererFrontend;

/// Game/application driven by `Engine`
///
/// Per rendered frame the hooks run in this order:
///
/// ```text
/// update -> (renderer.begin) -> prepare_frame -> render_frame -> (renderer.end, present)
/// ```
///
/// An error returned by any hook stops the engine loop.
pub trait Application {
    /// Called once after the renderer is initialized
    fn boot(&mut self, renderer: &mut RendererFrontend) -> Galaxy3dResult<()>;

    /// Simulation step. `input` still holds the previous frame's final state
    /// as "previous" and this frame's events as "current".
    fn update(
        &mut self,
        renderer: &mut RendererFrontend,
        input: &InputState,
        frame_data: &mut FrameData,
    ) -> Galaxy3dResult<()>;

    /// Build the render packets for this frame
    fn prepare_frame(&mut self, renderer: &mut RendererFrontend, frame_data: &mut FrameData) -> Galaxy3dResult<()>;

    /// Issue the frame's rendering scopes and draws
    fn render_frame(&mut self, renderer: &mut RendererFrontend, frame_data: &mut FrameData) -> Galaxy3dResult<()>;

    /// The framebuffer changed size, or the renderer skipped a frame
    /// because its surfaces are out of date
    fn on_resize(&mut self, _renderer: &mut RendererFrontend, _size: PhysicalSize<u32>) {}

    /// Called once before the renderer shuts down
    fn shutdown(&mut self, _renderer: &mut RendererFrontend) {}
}
