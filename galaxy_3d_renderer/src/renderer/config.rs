/// Renderer configuration and frontend-wide constants

use bitflags::bitflags;
use crate::renderer::geometry::Vertex3d;

// ===== CONSTANTS =====

/// Maximum number of frames the GPU may be working on while the CPU records
/// the next one. Freed renderbuffer ranges wait this many frames before reuse.
pub const MAX_FRAMES_IN_FLIGHT: u8 = 3;

/// Vertex capacity of the global vertex buffer
pub const GLOBAL_VERTEX_COUNT: u64 = 20_971_520;

/// Index capacity of the global index buffer (u32 indices)
pub const GLOBAL_INDEX_COUNT: u64 = 100 * 1024 * 1024;

/// Size of the global vertex buffer in bytes
pub const GLOBAL_VERTEX_BUFFER_SIZE: u64 = GLOBAL_VERTEX_COUNT * std::mem::size_of::<Vertex3d>() as u64;

/// Size of the global index buffer in bytes
pub const GLOBAL_INDEX_BUFFER_SIZE: u64 = GLOBAL_INDEX_COUNT * std::mem::size_of::<u32>() as u64;

/// Size of the global material storage buffer in bytes (256 MiB)
pub const GLOBAL_MATERIAL_STORAGE_SIZE: u64 = 256 * 1024 * 1024;

/// Name of the console variable toggling percentage-closer filtering
pub const KVAR_USE_PCF: &str = "use_pcf";

// ===== FLAGS =====

bitflags! {
    /// Startup options of the renderer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RendererConfigFlags: u32 {
        /// Synchronize presentation with the display refresh
        const VSYNC_ENABLED = 1 << 0;
        /// Prefer power saving over latency (FIFO presentation, lower clocks)
        const POWER_SAVING = 1 << 1;
        /// Enable backend validation/debug layers
        const ENABLE_VALIDATION = 1 << 2;
        /// Start with percentage-closer filtering enabled for shadows
        const USE_PCF = 1 << 3;
    }
}

bitflags! {
    /// Runtime flags a backend reports and accepts through
    /// `flag_enabled_get` / `flag_enabled_set`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RendererFlags: u32 {
        const VSYNC = 1 << 0;
        const POWER_SAVING = 1 << 1;
        const USE_PCF = 1 << 2;
    }
}

// ===== RENDERER CONFIG =====

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Application name (forwarded to the backend for debug labels)
    pub application_name: String,
    /// Name of the backend plugin to load from the registry (e.g. "vulkan", "headless")
    pub backend_plugin: String,
    /// Startup options
    pub flags: RendererConfigFlags,
    /// Size of the global vertex buffer in bytes
    pub vertex_buffer_size: u64,
    /// Size of the global index buffer in bytes
    pub index_buffer_size: u64,
    /// Size of the global material storage buffer in bytes
    pub material_storage_size: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        let mut flags = RendererConfigFlags::VSYNC_ENABLED | RendererConfigFlags::USE_PCF;
        if cfg!(debug_assertions) {
            flags |= RendererConfigFlags::ENABLE_VALIDATION;
        }
        Self {
            application_name: "Galaxy3D Application".to_string(),
            backend_plugin: "vulkan".to_string(),
            flags,
            vertex_buffer_size: GLOBAL_VERTEX_BUFFER_SIZE,
            index_buffer_size: GLOBAL_INDEX_BUFFER_SIZE,
            material_storage_size: GLOBAL_MATERIAL_STORAGE_SIZE,
        }
    }
}

impl RendererConfig {
    /// The subset of the configuration a backend receives at `initialize`
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            application_name: self.application_name.clone(),
            flags: self.flags,
            max_frames_in_flight: MAX_FRAMES_IN_FLIGHT,
        }
    }
}

/// Configuration handed to `RendererBackend::initialize`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub application_name: String,
    pub flags: RendererConfigFlags,
    pub max_frames_in_flight: u8,
}
