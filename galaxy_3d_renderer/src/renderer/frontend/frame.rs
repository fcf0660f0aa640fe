/// Per-frame command sequencing
///
/// ```text
/// frame_prepare -> begin -> [begin_rendering .. end_rendering]* -> end -> present
/// ```
///
/// Out-of-order calls are logged as warnings and still forwarded; the
/// backend decides whether they are fatal.

use glam::Vec4;

use super::{RendererFrontend, SOURCE};
use crate::engine::frame_data::FrameData;
use crate::error::Galaxy3dResult;
use crate::renderer::handle::TextureHandle;
use crate::renderer::state::{FrameStage, FrameStatus, Rect2D};

impl RendererFrontend {
    fn expect_stage(&self, expected: FrameStage, operation: &str) {
        if self.stage != expected {
            crate::engine_warn!(SOURCE,
                "{} called in stage {:?} (expected {:?})", operation, self.stage, expected);
        }
    }

    /// Wait for a frame-in-flight slot and acquire every window's surface
    ///
    /// On `Ready` the frame number advances and is written to
    /// `frame_data.renderer_frame_number`. On `Skip` nothing advances and the
    /// rest of the frame must not be issued. Errors are not recoverable.
    pub fn frame_prepare(&mut self, frame_data: &mut FrameData) -> Galaxy3dResult<FrameStatus> {
        if self.stage != FrameStage::Idle && self.stage != FrameStage::Prepared {
            crate::engine_warn!(SOURCE, "frame_prepare called in stage {:?}", self.stage);
        }

        let next = self.frame_number.wrapping_add(1);
        if self.backend.frame_prepare(next)? == FrameStatus::Skip {
            crate::engine_debug!(SOURCE, "Frame {} skipped by backend", next);
            return Ok(FrameStatus::Skip);
        }

        let window_ids: Vec<_> = self.windows.iter().map(|w| w.id).collect();
        for id in window_ids {
            if self.backend.frame_prepare_window_surface(id, next)? == FrameStatus::Skip {
                crate::engine_debug!(SOURCE, "Frame {} skipped, window {} surface not ready", next, id.0);
                return Ok(FrameStatus::Skip);
            }
        }

        self.frame_number = next;
        frame_data.renderer_frame_number = next;
        self.draw_calls = 0;
        self.triangles = 0;
        self.stage = FrameStage::Prepared;
        Ok(FrameStatus::Ready)
    }

    /// Start recording the frame
    ///
    /// Deferred renderbuffer deletions are processed first, before any
    /// allocation this frame can make.
    pub fn begin(&mut self, _frame_data: &FrameData) -> Galaxy3dResult<()> {
        self.expect_stage(FrameStage::Prepared, "begin");

        let released = self.renderbuffers_process_deletions();
        if released > 0 {
            crate::engine_trace!(SOURCE, "Frame {}: {} deferred range(s) released", self.frame_number, released);
        }

        self.backend.frame_commands_begin(self.frame_number)?;
        self.stage = FrameStage::Recording;
        Ok(())
    }

    /// Begin a rendering scope on the given colour and depth textures
    pub fn begin_rendering(
        &mut self,
        _frame_data: &FrameData,
        render_area: Vec4,
        colour_targets: &[TextureHandle],
        depth_stencil_target: Option<TextureHandle>,
    ) -> Galaxy3dResult<()> {
        self.expect_stage(FrameStage::Recording, "begin_rendering");

        let colour = colour_targets.iter()
            .map(|&handle| self.texture_backend(handle))
            .collect::<Galaxy3dResult<Vec<_>>>()?;
        let depth = depth_stencil_target.map(|handle| self.texture_backend(handle)).transpose()?;

        let area = Rect2D::new(
            render_area.x as i32,
            render_area.y as i32,
            render_area.z.max(0.0) as u32,
            render_area.w.max(0.0) as u32,
        );
        self.backend.begin_rendering(self.frame_number, area, &colour, depth)
    }

    pub fn end_rendering(&mut self, _frame_data: &FrameData) -> Galaxy3dResult<()> {
        self.expect_stage(FrameStage::Recording, "end_rendering");
        self.backend.end_rendering(self.frame_number)
    }

    /// Stop recording and submit the frame
    pub fn end(&mut self, _frame_data: &FrameData) -> Galaxy3dResult<()> {
        self.expect_stage(FrameStage::Recording, "end");
        self.backend.frame_commands_end(self.frame_number)?;
        self.backend.frame_submit(self.frame_number)?;
        self.stage = FrameStage::Submitted;
        Ok(())
    }

    /// Present the frame on every window
    pub fn present(&mut self, _frame_data: &FrameData) -> Galaxy3dResult<()> {
        self.expect_stage(FrameStage::Submitted, "present");
        self.stage = FrameStage::Idle;

        let window_ids: Vec<_> = self.windows.iter().map(|w| w.id).collect();
        for id in window_ids {
            self.backend.frame_present(id, self.frame_number)?;
        }
        Ok(())
    }
}
