/// Dynamic pipeline state forwarded to the backend

use glam::Vec4;

use super::RendererFrontend;
use crate::renderer::state::{CullMode, Rect2D, StencilOpState, Viewport, Winding};

impl RendererFrontend {
    /// Set the viewport from a (x, y, width, height) rectangle
    pub fn viewport_set(&mut self, rect: Vec4) {
        self.viewport = Viewport::from_rect(rect);
        self.backend.viewport_set(self.viewport);
    }

    /// Re-apply the last viewport set
    pub fn viewport_reset(&mut self) {
        self.backend.viewport_set(self.viewport);
    }

    pub fn active_viewport(&self) -> Viewport {
        self.viewport
    }

    /// Set the scissor from a (x, y, width, height) rectangle
    pub fn scissor_set(&mut self, rect: Vec4) {
        self.scissor = Rect2D::new(rect.x as i32, rect.y as i32, rect.z.max(0.0) as u32, rect.w.max(0.0) as u32);
        self.backend.scissor_set(self.scissor);
    }

    /// Re-apply the last scissor set
    pub fn scissor_reset(&mut self) {
        self.backend.scissor_set(self.scissor);
    }

    pub fn active_scissor(&self) -> Rect2D {
        self.scissor
    }

    pub fn winding_set(&mut self, winding: Winding) {
        self.winding = winding;
        self.backend.winding_set(winding);
    }

    pub fn winding(&self) -> Winding {
        self.winding
    }

    pub fn cull_mode_set(&mut self, cull_mode: CullMode) {
        self.backend.cull_mode_set(cull_mode);
    }

    pub fn stencil_test_enable(&mut self, enabled: bool) {
        self.backend.stencil_test_enable(enabled);
    }

    pub fn stencil_op_set(&mut self, ops: StencilOpState) {
        self.backend.stencil_op_set(ops);
    }

    pub fn stencil_reference_set(&mut self, reference: u32) {
        self.backend.stencil_reference_set(reference);
    }

    pub fn stencil_compare_mask_set(&mut self, mask: u32) {
        self.backend.stencil_compare_mask_set(mask);
    }

    pub fn stencil_write_mask_set(&mut self, mask: u32) {
        self.backend.stencil_write_mask_set(mask);
    }

    pub fn depth_test_enable(&mut self, enabled: bool) {
        self.backend.depth_test_enable(enabled);
    }

    pub fn depth_write_enable(&mut self, enabled: bool) {
        self.backend.depth_write_enable(enabled);
    }

    pub fn clear_colour_set(&mut self, colour: Vec4) {
        self.backend.clear_colour_set(colour);
    }

    pub fn clear_depth_set(&mut self, depth: f32) {
        self.backend.clear_depth_set(depth.clamp(0.0, 1.0));
    }

    pub fn clear_stencil_set(&mut self, stencil: u32) {
        self.backend.clear_stencil_set(stencil);
    }
}
