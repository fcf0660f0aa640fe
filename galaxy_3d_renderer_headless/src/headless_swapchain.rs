/// Swapchain - virtual presentation surface of a headless window
///
/// Cycles through one image per frame in flight. A zero-sized window has no
/// presentable image until it is resized, so acquisition answers `Skip`.

use winit::dpi::PhysicalSize;

use galaxy_3d_renderer::galaxy3d::Galaxy3dResult;
use galaxy_3d_renderer::galaxy3d::render::{FrameStatus, WindowId};
use galaxy_3d_renderer::engine_bail;

use crate::SOURCE;

/// Headless swapchain
#[derive(Debug)]
pub(crate) struct Swapchain {
    window: WindowId,
    pub(crate) size: PhysicalSize<u32>,
    image_count: u32,
    /// Image acquired for the frame being recorded
    acquired: Option<u32>,
    next_image: u32,
    pub(crate) presented: u64,
}

impl Swapchain {
    pub(crate) fn new(window: WindowId, size: PhysicalSize<u32>, image_count: u32) -> Self {
        Self {
            window,
            size,
            image_count: image_count.max(1),
            acquired: None,
            next_image: 0,
            presented: 0,
        }
    }

    /// Acquire the next image (idempotent until it is presented)
    pub(crate) fn acquire_next_image(&mut self) -> FrameStatus {
        if self.size.width == 0 || self.size.height == 0 {
            return FrameStatus::Skip;
        }
        if self.acquired.is_none() {
            self.acquired = Some(self.next_image);
        }
        FrameStatus::Ready
    }

    pub(crate) fn present(&mut self) -> Galaxy3dResult<u32> {
        let Some(image) = self.acquired.take() else {
            engine_bail!(SOURCE, "Window {} presented without an acquired image", self.window.0);
        };
        self.next_image = (image + 1) % self.image_count;
        self.presented += 1;
        Ok(image)
    }

    /// Recreate for a new size; any acquired image is dropped
    pub(crate) fn recreate(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
        self.acquired = None;
        self.next_image = 0;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "headless_swapchain_tests.rs"]
mod tests;
