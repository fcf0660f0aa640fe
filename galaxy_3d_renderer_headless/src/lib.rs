/*!
# Galaxy 3D Renderer - Headless Backend

CPU-memory implementation of the Galaxy 3D `RendererBackend` contract.

Every renderbuffer and texture is backed by real bytes, so uploads, copies,
clears and read-backs behave like they would on a GPU and can be checked by
tools and integration tests. Windows get a virtual swapchain; nothing is
displayed.

The backend is registered as a plugin under the name `"headless"`:

```
use galaxy_3d_renderer::galaxy3d::render::{BackendPluginRegistry, RendererConfig};
use galaxy_3d_renderer::galaxy3d::RendererFrontend;

let mut registry = BackendPluginRegistry::new();
let counters = galaxy_3d_renderer_headless::register(&mut registry);

let config = RendererConfig {
    backend_plugin: galaxy_3d_renderer_headless::PLUGIN_NAME.to_string(),
    vertex_buffer_size: 1 << 20,
    index_buffer_size: 1 << 20,
    material_storage_size: 1 << 20,
    ..Default::default()
};
let renderer = RendererFrontend::new(config, &registry).unwrap();
assert_eq!(counters.snapshot().textures_created, 8);
# drop(renderer);
```

With the `headless-trace` feature every backend call is logged at TRACE
severity through the engine logger.
*/

// Headless implementation modules
mod headless;
mod headless_buffer;
mod headless_shader;
mod headless_swapchain;
mod headless_texture;
mod stats;

use std::sync::Arc;

use galaxy_3d_renderer::galaxy3d::render::{BackendPluginRegistry, RendererBackend};

pub use headless::HeadlessBackend;
pub use stats::{print_stats_report, HeadlessCounters, HeadlessStats};

/// Plugin name the backend registers under
pub const PLUGIN_NAME: &str = "headless";

/// Log source of every message emitted by this crate
pub(crate) const SOURCE: &str = "galaxy3d::headless";

/// Trace one backend call (compiled out without `headless-trace`)
macro_rules! headless_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "headless-trace")]
        galaxy_3d_renderer::engine_trace!(crate::SOURCE, $($arg)*);
    };
}
pub(crate) use headless_trace;

/// Register the headless backend with a plugin registry
///
/// Every backend the registry creates reports into the returned counters.
pub fn register(registry: &mut BackendPluginRegistry) -> Arc<HeadlessCounters> {
    let counters = Arc::new(HeadlessCounters::new());
    let shared = Arc::clone(&counters);
    registry.register_plugin(PLUGIN_NAME, move || {
        Ok(Box::new(HeadlessBackend::with_counters(Arc::clone(&shared))) as Box<dyn RendererBackend>)
    });
    counters
}
