//! Renderer frontend
//!
//! `RendererFrontend` is the backend-agnostic face of the renderer. It owns
//! the backend, every renderbuffer, the texture/sampler/shader handle tables,
//! the generic samplers, the default textures and the per-window render
//! targets, and it sequences each frame:
//!
//! ```text
//! frame_prepare -> begin -> [begin_rendering .. draws .. end_rendering]* -> end -> present
//! ```
//!
//! Operations are split by concern across the submodules; they all extend
//! the same `RendererFrontend` type.

mod frame;
mod geometry;
mod pipeline_state;
mod renderbuffers;
mod samplers;
mod shaders;
mod textures;
mod windows;

use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use winit::dpi::PhysicalSize;

use crate::engine::event::{KvarChanged, KvarValue};
use crate::error::{Galaxy3dError, Galaxy3dResult};
use crate::renderer::backend::{BackendPluginRegistry, BackendResource, RendererBackend, WindowId};
use crate::renderer::config::{RendererConfig, RendererConfigFlags, RendererFlags, KVAR_USE_PCF};
use crate::renderer::handle::{HandleTable, SamplerHandle, ShaderHandle, TextureHandle};
use crate::renderer::renderbuffer::{Renderbuffer, RenderbufferHandle};
use crate::renderer::sampler::{GenericSampler, SamplerDesc};
use crate::renderer::shader::ShaderConfig;
use crate::renderer::state::{FrameStage, Rect2D, Viewport, Winding};
use crate::renderer::texture::{DefaultTexture, TextureDesc};

const SOURCE: &str = "galaxy3d::RendererFrontend";

// ===== INTERNAL RECORDS =====

#[derive(Debug)]
struct TextureRecord {
    desc: TextureDesc,
    backend: BackendResource,
}

#[derive(Debug)]
struct SamplerRecord {
    desc: SamplerDesc,
    backend: BackendResource,
}

#[derive(Debug)]
struct ShaderRecord {
    config: ShaderConfig,
    backend: BackendResource,
    /// Resource set currently bound, per update frequency
    bound: [Option<u32>; 3],
    groups: FxHashSet<u32>,
    draws: FxHashSet<u32>,
}

/// Render targets of one platform window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWindow {
    pub id: WindowId,
    pub size: PhysicalSize<u32>,
    /// Colour attachment (`IS_WRITEABLE | RENDER_TARGET`)
    pub colour_target: TextureHandle,
    /// Depth-stencil attachment (`IS_WRITEABLE | DEPTH | STENCIL`)
    pub depth_target: TextureHandle,
}

/// Renderer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Frame number of the frame being recorded
    pub frame_number: u16,
    /// Number of draw calls this frame
    pub draw_calls: u32,
    /// Number of triangles drawn this frame
    pub triangles: u32,
    pub renderbuffer_count: usize,
    pub texture_count: usize,
    pub sampler_count: usize,
    pub shader_count: usize,
    /// Renderbuffer ranges waiting in deletion queues
    pub pending_deletions: usize,
}

// ===== RENDERER FRONTEND =====

/// Backend-agnostic renderer
///
/// Single-threaded: every operation takes `&mut self`. The frontend may be
/// moved to a dedicated render thread but is never shared.
pub struct RendererFrontend {
    backend: Box<dyn RendererBackend>,
    config: RendererConfig,
    frame_number: u16,
    stage: FrameStage,
    viewport: Viewport,
    scissor: Rect2D,
    winding: Winding,
    renderbuffers: SlotMap<RenderbufferHandle, Renderbuffer>,
    vertex_buffer: RenderbufferHandle,
    index_buffer: RenderbufferHandle,
    material_storage: RenderbufferHandle,
    textures: HandleTable<TextureHandle, TextureRecord>,
    samplers: HandleTable<SamplerHandle, SamplerRecord>,
    shaders: HandleTable<ShaderHandle, ShaderRecord>,
    generic_samplers: [SamplerHandle; GenericSampler::COUNT],
    default_textures: [TextureHandle; DefaultTexture::COUNT],
    windows: Vec<RenderWindow>,
    draw_calls: u32,
    triangles: u32,
    shut_down: bool,
}

impl RendererFrontend {
    /// Load the configured backend plugin and build every startup resource
    ///
    /// Startup order: backend `initialize`, runtime flags, the 16 generic
    /// samplers, the global vertex/index/material buffers, the default
    /// textures. Any failure is fatal and returned as
    /// `Galaxy3dError::InitializationFailed`; whatever was created is released.
    pub fn new(config: RendererConfig, registry: &BackendPluginRegistry) -> Galaxy3dResult<Self> {
        crate::engine_info!(SOURCE, "Initializing renderer with backend '{}'", config.backend_plugin);

        let mut backend = registry.create_backend(&config.backend_plugin)
            .map_err(|error| init_failed("backend plugin", error))?;
        backend.initialize(&config.backend_config())
            .map_err(|error| init_failed("backend initialize", error))?;

        let mut renderer = Self {
            backend,
            config,
            frame_number: 0,
            stage: FrameStage::Idle,
            viewport: Viewport::default(),
            scissor: Rect2D::default(),
            winding: Winding::default(),
            renderbuffers: SlotMap::with_key(),
            vertex_buffer: RenderbufferHandle::default(),
            index_buffer: RenderbufferHandle::default(),
            material_storage: RenderbufferHandle::default(),
            textures: HandleTable::new(),
            samplers: HandleTable::new(),
            shaders: HandleTable::new(),
            generic_samplers: [SamplerHandle::INVALID; GenericSampler::COUNT],
            default_textures: [TextureHandle::INVALID; DefaultTexture::COUNT],
            windows: Vec::new(),
            draw_calls: 0,
            triangles: 0,
            shut_down: false,
        };

        let flags = renderer.config.flags;
        renderer.backend.flag_enabled_set(RendererFlags::VSYNC, flags.contains(RendererConfigFlags::VSYNC_ENABLED));
        renderer.backend.flag_enabled_set(RendererFlags::POWER_SAVING, flags.contains(RendererConfigFlags::POWER_SAVING));
        renderer.backend.flag_enabled_set(RendererFlags::USE_PCF, flags.contains(RendererConfigFlags::USE_PCF));

        renderer.create_generic_samplers()
            .map_err(|error| init_failed("generic samplers", error))?;
        renderer.create_global_buffers()
            .map_err(|error| init_failed("global buffers", error))?;
        renderer.create_default_textures()
            .map_err(|error| init_failed("default textures", error))?;

        crate::engine_info!(SOURCE, "Renderer initialized");
        Ok(renderer)
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Frame number of the last `Ready` frame (wraps at u16::MAX)
    pub fn frame_number(&self) -> u16 {
        self.frame_number
    }

    /// Current position in the per-frame sequence
    pub fn frame_stage(&self) -> FrameStage {
        self.stage
    }

    pub fn stats(&self) -> RendererStats {
        RendererStats {
            frame_number: self.frame_number,
            draw_calls: self.draw_calls,
            triangles: self.triangles,
            renderbuffer_count: self.renderbuffers.len(),
            texture_count: self.textures.len(),
            sampler_count: self.samplers.len(),
            shader_count: self.shaders.len(),
            pending_deletions: self.renderbuffers.values()
                .map(|rb| rb.deletion_queue().pending_count())
                .sum(),
        }
    }

    // ===== CAPABILITIES =====

    pub fn is_multithreaded(&self) -> bool {
        self.backend.is_multithreaded()
    }

    pub fn flag_enabled_get(&self, flag: RendererFlags) -> bool {
        self.backend.flag_enabled_get(flag)
    }

    pub fn flag_enabled_set(&mut self, flag: RendererFlags, enabled: bool) {
        self.backend.flag_enabled_set(flag, enabled);
    }

    pub fn max_anisotropy_get(&self) -> f32 {
        self.backend.max_anisotropy_get()
    }

    /// React to a console variable change
    ///
    /// Returns whether the variable is one the renderer listens to.
    pub fn on_kvar_changed(&mut self, event: &KvarChanged) -> bool {
        if event.name != KVAR_USE_PCF {
            return false;
        }

        let enabled = match &event.value {
            KvarValue::Int(value) => *value != 0,
            KvarValue::Float(value) => *value != 0.0,
            KvarValue::String(value) => matches!(value.as_str(), "1" | "true" | "on"),
        };
        crate::engine_debug!(SOURCE, "use_pcf set to {}", enabled);
        self.backend.flag_enabled_set(RendererFlags::USE_PCF, enabled);
        true
    }

    /// Block until the backend is idle
    pub fn wait_for_idle(&mut self) -> Galaxy3dResult<()> {
        self.backend.wait_for_idle()
    }

    // ===== SHUTDOWN =====

    /// Release every resource and shut the backend down
    ///
    /// Idempotent; also run on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        crate::engine_info!(SOURCE, "Shutting down renderer");

        if let Err(error) = self.backend.wait_for_idle() {
            crate::engine_warn!(SOURCE, "wait_for_idle failed during shutdown: {}", error);
        }

        let window_ids: Vec<WindowId> = self.windows.iter().map(|w| w.id).collect();
        for id in window_ids {
            if let Err(error) = self.on_window_destroyed(id) {
                crate::engine_warn!(SOURCE, "Window {} cleanup failed: {}", id.0, error);
            }
        }

        for mut handle in self.shaders.handles() {
            self.shader_destroy(&mut handle);
        }
        for mut handle in self.samplers.handles() {
            self.sampler_release(&mut handle);
        }
        self.generic_samplers = [SamplerHandle::INVALID; GenericSampler::COUNT];
        for mut handle in self.textures.handles() {
            self.texture_resources_release(&mut handle);
        }
        self.default_textures = [TextureHandle::INVALID; DefaultTexture::COUNT];

        for (_, renderbuffer) in self.renderbuffers.drain() {
            self.backend.renderbuffer_destroy(renderbuffer.backend_resource());
        }
        self.vertex_buffer = RenderbufferHandle::default();
        self.index_buffer = RenderbufferHandle::default();
        self.material_storage = RenderbufferHandle::default();

        self.backend.shutdown();
    }
}

impl Drop for RendererFrontend {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn init_failed(step: &str, error: Galaxy3dError) -> Galaxy3dError {
    let error = match error {
        Galaxy3dError::InitializationFailed(message) => Galaxy3dError::InitializationFailed(message),
        other => Galaxy3dError::InitializationFailed(format!("{}: {}", step, other)),
    };
    crate::engine_error!(SOURCE, "Renderer initialization failed ({}): {}", step, error);
    error
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "frontend_tests.rs"]
mod tests;
