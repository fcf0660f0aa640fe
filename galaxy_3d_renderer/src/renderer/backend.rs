/// RendererBackend trait - the contract every rendering backend honors
///
/// The frontend owns a `Box<dyn RendererBackend>` and drives it through a
/// fixed per-frame sequence:
///
/// ```text
/// frame_prepare -> frame_prepare_window_surface (per window)
///   -> frame_commands_begin -> begin_rendering / draws / end_rendering
///   -> frame_commands_end -> frame_submit -> frame_present (per window)
/// ```
///
/// Backends refer to their objects through opaque `BackendResource` ids.
/// The frontend never interprets them.

use std::collections::HashMap;
use std::fmt;
use glam::Vec4;
use winit::dpi::PhysicalSize;

use crate::error::{Galaxy3dError, Galaxy3dResult};
use crate::renderer::config::{BackendConfig, RendererFlags};
use crate::renderer::renderbuffer::RenderbufferType;
use crate::renderer::sampler::SamplerDesc;
use crate::renderer::shader::{ShaderConfig, ShaderUpdateFrequency};
use crate::renderer::state::{CullMode, FrameStatus, Rect2D, StencilOpState, Viewport, Winding};
use crate::renderer::texture::TextureDesc;

// ============================================================================
// Common types
// ============================================================================

/// Opaque id of an object living inside a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendResource(pub u64);

impl fmt::Display for BackendResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Platform window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

// ============================================================================
// RendererBackend trait
// ============================================================================

/// Rendering backend interface
///
/// Implemented by backend plugins (e.g. the headless CPU backend).
/// `Send` so the whole frontend can live on a dedicated render thread.
pub trait RendererBackend: Send {
    // ===== LIFECYCLE =====

    /// Initialize the backend (device, queues, frame-in-flight resources)
    fn initialize(&mut self, config: &BackendConfig) -> Galaxy3dResult<()>;

    /// Release every backend object
    fn shutdown(&mut self);

    /// Block until the device has finished all submitted work
    ///
    /// Expensive. Only used at shutdown and before destructive reloads.
    fn wait_for_idle(&mut self) -> Galaxy3dResult<()>;

    // ===== WINDOWS =====

    /// Create the backend state (surface, swapchain) of a window
    fn window_create(&mut self, window: WindowId, size: PhysicalSize<u32>) -> Galaxy3dResult<()>;

    fn window_destroy(&mut self, window: WindowId);

    /// Notify the backend that a window changed size (non-zero)
    fn window_resized(&mut self, window: WindowId, size: PhysicalSize<u32>);

    // ===== FRAME SEQUENCING =====

    /// Wait for the frame-in-flight slot and reset its resources
    ///
    /// Returns `FrameStatus::Skip` when the frame cannot be rendered right now
    /// (swapchain being recreated); the caller must not issue the rest of the frame.
    fn frame_prepare(&mut self, frame_number: u16) -> Galaxy3dResult<FrameStatus>;

    /// Acquire the next presentable surface of a window
    fn frame_prepare_window_surface(&mut self, window: WindowId, frame_number: u16) -> Galaxy3dResult<FrameStatus>;

    /// Start recording the frame's commands
    fn frame_commands_begin(&mut self, frame_number: u16) -> Galaxy3dResult<()>;

    /// Stop recording the frame's commands
    fn frame_commands_end(&mut self, frame_number: u16) -> Galaxy3dResult<()>;

    /// Submit the recorded commands
    fn frame_submit(&mut self, frame_number: u16) -> Galaxy3dResult<()>;

    /// Present the frame on a window
    fn frame_present(&mut self, window: WindowId, frame_number: u16) -> Galaxy3dResult<()>;

    /// Begin a rendering scope on the given attachments
    fn begin_rendering(
        &mut self,
        frame_number: u16,
        render_area: Rect2D,
        colour_targets: &[BackendResource],
        depth_stencil_target: Option<BackendResource>,
    ) -> Galaxy3dResult<()>;

    fn end_rendering(&mut self, frame_number: u16) -> Galaxy3dResult<()>;

    // ===== DYNAMIC STATE =====

    fn viewport_set(&mut self, viewport: Viewport);
    fn scissor_set(&mut self, scissor: Rect2D);
    fn winding_set(&mut self, winding: Winding);
    fn cull_mode_set(&mut self, cull_mode: CullMode);
    fn stencil_test_enable(&mut self, enabled: bool);
    fn stencil_op_set(&mut self, ops: StencilOpState);
    fn stencil_reference_set(&mut self, reference: u32);
    fn stencil_compare_mask_set(&mut self, mask: u32);
    fn stencil_write_mask_set(&mut self, mask: u32);
    fn depth_test_enable(&mut self, enabled: bool);
    fn depth_write_enable(&mut self, enabled: bool);
    fn clear_colour_set(&mut self, colour: Vec4);
    fn clear_depth_set(&mut self, depth: f32);
    fn clear_stencil_set(&mut self, stencil: u32);

    /// Clear a colour texture with the current clear colour
    fn clear_colour(&mut self, texture: BackendResource) -> Galaxy3dResult<()>;

    /// Clear a depth-stencil texture with the current clear depth/stencil values
    fn clear_depth_stencil(&mut self, texture: BackendResource) -> Galaxy3dResult<()>;

    // ===== TEXTURES =====

    /// Create a texture, optionally uploading its initial contents
    fn texture_create(&mut self, name: &str, desc: &TextureDesc, data: Option<&[u8]>) -> Galaxy3dResult<BackendResource>;

    fn texture_destroy(&mut self, texture: BackendResource);

    /// Recreate a texture at a new size (contents are not preserved)
    fn texture_resize(&mut self, texture: BackendResource, width: u32, height: u32) -> Galaxy3dResult<()>;

    /// Write bytes into a texture
    ///
    /// When `include_in_frame_workload` is false the upload is submitted and
    /// waited on immediately instead of being recorded in the current frame.
    fn texture_write_data(
        &mut self,
        texture: BackendResource,
        offset: u64,
        data: &[u8],
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()>;

    /// Synchronously read bytes back from a texture
    fn texture_read_data(&mut self, texture: BackendResource, offset: u64, size: u64) -> Galaxy3dResult<Vec<u8>>;

    /// Synchronously read one pixel (RGBA, missing channels are 0)
    fn texture_read_pixel(&mut self, texture: BackendResource, x: u32, y: u32) -> Galaxy3dResult<[u8; 4]>;

    // ===== SAMPLERS =====

    fn sampler_create(&mut self, name: &str, desc: &SamplerDesc) -> Galaxy3dResult<BackendResource>;
    fn sampler_destroy(&mut self, sampler: BackendResource);

    /// Recreate a sampler with new parameters, keeping its id
    fn sampler_refresh(&mut self, sampler: BackendResource, desc: &SamplerDesc) -> Galaxy3dResult<()>;

    // ===== SHADERS =====

    fn shader_create(&mut self, config: &ShaderConfig) -> Galaxy3dResult<BackendResource>;
    fn shader_destroy(&mut self, shader: BackendResource);

    /// Rebuild a shader's pipelines from (possibly updated) stage code
    fn shader_reload(&mut self, shader: BackendResource, config: &ShaderConfig) -> Galaxy3dResult<()>;

    /// Bind the shader's pipeline for subsequent draws
    fn shader_use(&mut self, shader: BackendResource) -> Galaxy3dResult<()>;

    /// Allocate a per-group or per-draw resource set, returning its id
    fn shader_resources_acquire(&mut self, shader: BackendResource, frequency: ShaderUpdateFrequency) -> Galaxy3dResult<u32>;

    fn shader_resources_release(&mut self, shader: BackendResource, frequency: ShaderUpdateFrequency, id: u32);

    /// Select which resource set uniform writes at `frequency` go to
    fn shader_bind(&mut self, shader: BackendResource, frequency: ShaderUpdateFrequency, id: u32) -> Galaxy3dResult<()>;

    /// Stage a uniform value in the currently bound set
    fn shader_uniform_set(
        &mut self,
        shader: BackendResource,
        frequency: ShaderUpdateFrequency,
        uniform_index: u16,
        data: &[u8],
    ) -> Galaxy3dResult<()>;

    /// Upload and bind the staged uniforms of `frequency`
    fn shader_apply(&mut self, shader: BackendResource, frequency: ShaderUpdateFrequency) -> Galaxy3dResult<()>;

    // ===== RENDERBUFFERS =====

    fn renderbuffer_create(&mut self, name: &str, buffer_type: RenderbufferType, size: u64) -> Galaxy3dResult<BackendResource>;
    fn renderbuffer_destroy(&mut self, buffer: BackendResource);
    fn renderbuffer_bind(&mut self, buffer: BackendResource, offset: u64) -> Galaxy3dResult<()>;
    fn renderbuffer_unbind(&mut self, buffer: BackendResource) -> Galaxy3dResult<()>;
    fn renderbuffer_map_memory(&mut self, buffer: BackendResource, offset: u64, size: u64) -> Galaxy3dResult<()>;
    fn renderbuffer_unmap_memory(&mut self, buffer: BackendResource, offset: u64, size: u64);
    fn renderbuffer_flush(&mut self, buffer: BackendResource, offset: u64, size: u64) -> Galaxy3dResult<()>;

    /// Synchronously read bytes back (may stall the pipeline)
    fn renderbuffer_read(&mut self, buffer: BackendResource, offset: u64, size: u64) -> Galaxy3dResult<Vec<u8>>;

    /// Grow a buffer, preserving its first `old_size` bytes
    fn renderbuffer_resize(&mut self, buffer: BackendResource, old_size: u64, new_size: u64) -> Galaxy3dResult<()>;

    fn renderbuffer_load_range(
        &mut self,
        buffer: BackendResource,
        offset: u64,
        data: &[u8],
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()>;

    #[allow(clippy::too_many_arguments)]
    fn renderbuffer_copy_range(
        &mut self,
        source: BackendResource,
        source_offset: u64,
        dest: BackendResource,
        dest_offset: u64,
        size: u64,
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()>;

    /// Draw `element_count` vertices (vertex buffer) or indices (index buffer)
    /// starting at byte `offset`
    fn renderbuffer_draw(
        &mut self,
        buffer: BackendResource,
        offset: u64,
        element_count: u32,
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()>;

    // ===== CAPABILITIES =====

    fn is_multithreaded(&self) -> bool;
    fn flag_enabled_get(&self, flag: RendererFlags) -> bool;
    fn flag_enabled_set(&mut self, flag: RendererFlags, enabled: bool);

    /// Maximum sampler anisotropy (0 when unsupported)
    fn max_anisotropy_get(&self) -> f32;
}

// ============================================================================
// Plugin system for registering renderer backends
// ============================================================================

/// Backend plugin factory function type
pub type BackendFactory = Box<dyn Fn() -> Galaxy3dResult<Box<dyn RendererBackend>> + Send + Sync>;

/// Plugin registry for renderer backends
pub struct BackendPluginRegistry {
    plugins: HashMap<String, BackendFactory>,
}

impl BackendPluginRegistry {
    /// Create an empty plugin registry
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Register a plugin
    ///
    /// # Arguments
    ///
    /// * `name` - Plugin name (e.g., "headless")
    /// * `factory` - Factory function creating an uninitialized backend
    pub fn register_plugin<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Galaxy3dResult<Box<dyn RendererBackend>> + Send + Sync + 'static,
    {
        if self.plugins.insert(name.to_string(), Box::new(factory)).is_some() {
            crate::engine_warn!("galaxy3d::BackendPluginRegistry", "Plugin '{}' replaced", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Names of all registered plugins, sorted
    pub fn plugin_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.keys().cloned().collect();
        names.sort();
        names
    }

    /// Create a backend using a registered plugin
    pub fn create_backend(&self, plugin_name: &str) -> Galaxy3dResult<Box<dyn RendererBackend>> {
        let factory = self.plugins
            .get(plugin_name)
            .ok_or_else(|| Galaxy3dError::InitializationFailed(format!("Plugin '{}' not found", plugin_name)))?;
        factory()
    }
}

impl Default for BackendPluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
