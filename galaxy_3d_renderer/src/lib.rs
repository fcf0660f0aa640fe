/*!
# Galaxy 3D Renderer

Backend-agnostic renderer frontend and frame loop for the Galaxy 3D engine.

The frontend owns every GPU-side resource through handles and forwards the
actual work to a `RendererBackend` loaded by name from a
`BackendPluginRegistry` (Vulkan, headless, ...).

## Architecture

- **RendererFrontend**: renderbuffers, textures, samplers, shaders, windows and frame sequencing
- **Renderbuffer**: GPU buffer with freelist/linear range tracking and deferred range deletion
- **HandleTable**: named handle tables for textures, samplers and shaders
- **RendererBackend**: the contract a backend plugin implements
- **Engine**: the per-tick loop over a `Platform` and an `Application`
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod renderer;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Galaxy3dError, Galaxy3dResult};

    // Engine loop, its collaborators and the global logger
    pub use crate::engine::{Engine, EngineConfig};
    pub use crate::engine::application::Application;
    pub use crate::engine::event::{KvarChanged, KvarValue, PlatformEvent};
    pub use crate::engine::frame_data::{FrameAllocator, FrameData};
    pub use crate::engine::input::InputState;
    pub use crate::engine::metrics::FrameMetrics;
    pub use crate::engine::platform::Platform;

    // Renderer frontend
    pub use crate::renderer::RendererFrontend;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Render sub-module with all rendering types
    pub mod render {
        pub use crate::renderer::*;
    }
}

// Re-export math and windowing types at crate root
pub use glam;
pub use winit;
