/// Window lifecycle and per-window render targets

use winit::dpi::PhysicalSize;

use super::{RenderWindow, RendererFrontend, SOURCE};
use crate::error::Galaxy3dResult;
use crate::renderer::backend::WindowId;
use crate::renderer::handle::TextureHandle;
use crate::renderer::texture::{TextureFlags, TextureType};

impl RendererFrontend {
    /// Set up backend state and render targets for a new window
    pub fn on_window_created(&mut self, id: WindowId, size: PhysicalSize<u32>) -> Galaxy3dResult<()> {
        if self.window(id).is_some() {
            crate::engine_bail_arg!(SOURCE, "Window {} already exists", id.0);
        }

        // A window created minimized still gets 1x1 targets
        let (width, height) = (size.width.max(1), size.height.max(1));

        self.backend.window_create(id, size)?;

        let colour_target = self.texture_resources_acquire(
            &format!("__window_{}_colour__", id.0),
            TextureType::Type2D, width, height, 4, 1, 1,
            TextureFlags::IS_WRITEABLE | TextureFlags::RENDER_TARGET,
        );
        let mut colour_target = match colour_target {
            Ok(handle) => handle,
            Err(error) => {
                self.backend.window_destroy(id);
                return Err(error);
            }
        };

        let depth_target = self.texture_resources_acquire(
            &format!("__window_{}_depth__", id.0),
            TextureType::Type2D, width, height, 4, 1, 1,
            TextureFlags::IS_WRITEABLE | TextureFlags::DEPTH | TextureFlags::STENCIL,
        );
        let depth_target = match depth_target {
            Ok(handle) => handle,
            Err(error) => {
                self.texture_resources_release(&mut colour_target);
                self.backend.window_destroy(id);
                return Err(error);
            }
        };

        self.windows.push(RenderWindow { id, size, colour_target, depth_target });
        crate::engine_info!(SOURCE, "Window {} attached ({}x{})", id.0, size.width, size.height);
        Ok(())
    }

    /// Release a window's render targets and backend state
    pub fn on_window_destroyed(&mut self, id: WindowId) -> Galaxy3dResult<()> {
        let Some(position) = self.windows.iter().position(|w| w.id == id) else {
            crate::engine_bail_arg!(SOURCE, "Window {} does not exist", id.0);
        };

        let mut window = self.windows.remove(position);
        self.texture_resources_release(&mut window.colour_target);
        self.texture_resources_release(&mut window.depth_target);
        self.backend.window_destroy(id);
        crate::engine_info!(SOURCE, "Window {} detached", id.0);
        Ok(())
    }

    /// Resize a window's render targets
    ///
    /// A 0x0 (minimized) size is ignored. If the depth target cannot follow,
    /// the colour target is put back to its previous size so both targets
    /// and `size` keep matching.
    pub fn on_window_resized(&mut self, id: WindowId, size: PhysicalSize<u32>) -> Galaxy3dResult<()> {
        let Some(window) = self.window(id) else {
            crate::engine_bail_arg!(SOURCE, "Window {} does not exist", id.0);
        };
        if size.width == 0 || size.height == 0 {
            crate::engine_debug!(SOURCE, "Window {} minimized, resize ignored", id.0);
            return Ok(());
        }

        let (colour, depth) = (window.colour_target, window.depth_target);
        let previous = self.texture_info(colour).map(|desc| (desc.width, desc.height))?;
        self.backend.window_resized(id, size);
        self.texture_resize(colour, size.width, size.height)?;
        if let Err(error) = self.texture_resize(depth, size.width, size.height) {
            if let Err(restore) = self.texture_resize(colour, previous.0, previous.1) {
                crate::engine_error!(SOURCE,
                    "Window {} colour target could not be restored to {}x{}: {}",
                    id.0, previous.0, previous.1, restore);
            }
            return Err(error);
        }

        if let Some(window) = self.windows.iter_mut().find(|w| w.id == id) {
            window.size = size;
        }
        crate::engine_debug!(SOURCE, "Window {} resized to {}x{}", id.0, size.width, size.height);
        Ok(())
    }

    pub fn window(&self, id: WindowId) -> Option<&RenderWindow> {
        self.windows.iter().find(|w| w.id == id)
    }

    /// Every attached window, in creation order
    pub fn windows(&self) -> &[RenderWindow] {
        &self.windows
    }

    pub fn window_colour_target(&self, id: WindowId) -> TextureHandle {
        self.window(id).map_or(TextureHandle::INVALID, |w| w.colour_target)
    }

    pub fn window_depth_target(&self, id: WindowId) -> TextureHandle {
        self.window(id).map_or(TextureHandle::INVALID, |w| w.depth_target)
    }
}
