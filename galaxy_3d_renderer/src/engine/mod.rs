/// Galaxy3D Engine - frame loop and global logger
///
/// `Engine` owns the renderer frontend, the platform layer and the
/// application, and drives them once per tick. It also hosts the global
/// logger used by the `engine_*!` macros.

pub mod application;
pub mod event;
pub mod frame_data;
pub mod input;
pub mod metrics;
pub mod platform;

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;

use rustc_hash::FxHashMap;
use winit::dpi::PhysicalSize;

use crate::engine::application::Application;
use crate::engine::event::PlatformEvent;
use crate::engine::frame_data::FrameData;
use crate::engine::input::InputState;
use crate::engine::metrics::FrameMetrics;
use crate::engine::platform::Platform;
use crate::error::{Galaxy3dError, Galaxy3dResult};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::renderer::backend::{BackendPluginRegistry, WindowId};
use crate::renderer::config::RendererConfig;
use crate::renderer::frontend::RendererFrontend;
use crate::renderer::state::FrameStatus;

const SOURCE: &str = "galaxy3d::Engine";

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn global_logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())))
}

// ===== CONFIG =====

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub renderer: RendererConfig,
    /// Frames to wait after the last resize event before the renderer
    /// recreates its window targets
    pub resize_debounce_frames: u16,
    /// Frame duration targeted by `run` when `limit_frame_rate` is set (seconds)
    pub target_frame_time: f64,
    pub limit_frame_rate: bool,
    /// Capacity of the per-frame arena in bytes
    pub frame_allocator_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            renderer: RendererConfig::default(),
            resize_debounce_frames: 30,
            target_frame_time: 1.0 / 60.0,
            limit_frame_rate: false,
            frame_allocator_size: 64 * 1024 * 1024,
        }
    }
}

// ===== ENGINE =====

/// Engine frame loop
///
/// Each `tick` runs:
///
/// ```text
/// pump messages -> [suspended? stop here] -> delta time -> reset frame arena
///   -> metrics -> [resize debounce] -> frame_prepare -> app.update -> begin
///   -> app.prepare_frame -> app.render_frame -> end -> present -> input update
/// ```
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_renderer::galaxy3d::{Engine, EngineConfig};
/// # fn demo(
/// #     registry: &galaxy_3d_renderer::galaxy3d::render::BackendPluginRegistry,
/// #     platform: Box<dyn galaxy_3d_renderer::galaxy3d::Platform>,
/// #     app: Box<dyn galaxy_3d_renderer::galaxy3d::Application>,
/// # ) -> galaxy_3d_renderer::galaxy3d::Galaxy3dResult<()> {
/// let mut engine = Engine::new(EngineConfig::default(), registry, platform, app)?;
/// engine.run()?;
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    config: EngineConfig,
    renderer: RendererFrontend,
    platform: Box<dyn Platform>,
    app: Box<dyn Application>,
    input: InputState,
    frame_data: FrameData,
    metrics: FrameMetrics,
    running: bool,
    suspended: bool,
    /// Resize events waiting for the debounce to elapse
    pending_resizes: FxHashMap<WindowId, PhysicalSize<u32>>,
    frames_since_resize: u16,
    framebuffer_size: PhysicalSize<u32>,
    start_time: f64,
    last_time: f64,
    frame_start: f64,
    /// Error that stopped the loop, reported by `run`
    stop_error: Option<Galaxy3dError>,
    shut_down: bool,
}

impl Engine {
    /// Helper to log errors before returning them (internal use)
    fn log_and_return_error(error: Galaxy3dError) -> Galaxy3dError {
        match &error {
            Galaxy3dError::InitializationFailed(msg) => {
                crate::engine_error!(SOURCE, "Initialization failed: {}", msg);
            }
            Galaxy3dError::BackendError(msg) => {
                crate::engine_error!(SOURCE, "Backend error: {}", msg);
            }
            _ => {
                crate::engine_error!(SOURCE, "Engine error: {}", error);
            }
        }
        error
    }

    /// Create the renderer through `registry` and boot the application
    ///
    /// # Errors
    ///
    /// Fails if the renderer cannot be initialized or `app.boot` fails; the
    /// renderer is shut down again in the latter case.
    pub fn new(
        config: EngineConfig,
        registry: &BackendPluginRegistry,
        platform: Box<dyn Platform>,
        mut app: Box<dyn Application>,
    ) -> Galaxy3dResult<Self> {
        let mut renderer = RendererFrontend::new(config.renderer.clone(), registry)
            .map_err(Self::log_and_return_error)?;

        if let Err(e) = app.boot(&mut renderer) {
            renderer.shutdown();
            return Err(Self::log_and_return_error(Galaxy3dError::InitializationFailed(
                format!("Application boot failed: {}", e)
            )));
        }

        let now = platform.absolute_time();
        crate::engine_info!(SOURCE, "Engine started (backend '{}')", config.renderer.backend_plugin);

        Ok(Self {
            frame_data: FrameData::new(config.frame_allocator_size),
            config,
            renderer,
            platform,
            app,
            input: InputState::new(),
            metrics: FrameMetrics::new(),
            running: true,
            suspended: false,
            pending_resizes: FxHashMap::default(),
            frames_since_resize: 0,
            framebuffer_size: PhysicalSize::new(0, 0),
            start_time: now,
            last_time: now,
            frame_start: now,
            stop_error: None,
            shut_down: false,
        })
    }

    // ===== LOOP =====

    /// Run ticks until the loop stops, then shut down
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the loop, if any.
    pub fn run(&mut self) -> Galaxy3dResult<()> {
        crate::engine_info!(SOURCE, "Engine loop started");
        while self.tick() {
            if self.config.limit_frame_rate && !self.suspended {
                let elapsed = self.platform.absolute_time() - self.frame_start;
                let remaining = self.config.target_frame_time - elapsed;
                if remaining > 0.0 {
                    self.platform.sleep(remaining);
                }
            }
        }
        self.shutdown();

        match self.stop_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// One loop iteration
    ///
    /// Returns whether the loop should continue. Skipped frames (suspended,
    /// resize debounce, renderer skip) return true.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        if !self.platform.pump_messages() {
            crate::engine_info!(SOURCE, "Platform requested shutdown");
            self.running = false;
            return false;
        }
        for event in self.platform.drain_events() {
            self.handle_event(event);
        }
        if !self.running {
            return false;
        }
        if self.suspended {
            return true;
        }

        let now = self.platform.absolute_time();
        self.frame_start = now;
        self.frame_data.delta_time = now - self.last_time;
        self.frame_data.total_time = now - self.start_time;
        self.last_time = now;

        self.frame_data.allocator.reset();
        self.metrics.update(self.frame_data.delta_time);

        if !self.pending_resizes.is_empty() {
            self.frames_since_resize = self.frames_since_resize.saturating_add(1);
            if self.frames_since_resize < self.config.resize_debounce_frames {
                return true;
            }
            if let Err(e) = self.commit_resizes() {
                return self.stop(e);
            }
        }

        match self.renderer.frame_prepare(&mut self.frame_data) {
            Ok(FrameStatus::Ready) => {}
            Ok(FrameStatus::Skip) => {
                self.app.on_resize(&mut self.renderer, self.framebuffer_size);
                return true;
            }
            Err(e) => return self.stop(e),
        }

        if let Err(e) = self.run_frame() {
            return self.stop(e);
        }

        self.frame_data.frame_number += 1;
        self.input.update();
        true
    }

    fn run_frame(&mut self) -> Galaxy3dResult<()> {
        self.app.update(&mut self.renderer, &self.input, &mut self.frame_data)?;
        self.renderer.begin(&self.frame_data)?;
        self.app.prepare_frame(&mut self.renderer, &mut self.frame_data)?;
        self.app.render_frame(&mut self.renderer, &mut self.frame_data)?;
        self.renderer.end(&self.frame_data)?;
        self.renderer.present(&self.frame_data)
    }

    fn stop(&mut self, error: Galaxy3dError) -> bool {
        crate::engine_error!(SOURCE, "Engine loop stopped: {}", error);
        self.stop_error = Some(error);
        self.running = false;
        false
    }

    fn handle_event(&mut self, event: PlatformEvent) {
        match event {
            PlatformEvent::WindowCreated { window, size } => {
                if let Err(e) = self.renderer.on_window_created(window, size) {
                    self.stop(e);
                    return;
                }
                self.framebuffer_size = size;
            }
            PlatformEvent::WindowDestroyed { window } => {
                self.pending_resizes.remove(&window);
                if let Err(e) = self.renderer.on_window_destroyed(window) {
                    crate::engine_warn!(SOURCE, "Window {} destroy failed: {}", window.0, e);
                }
            }
            PlatformEvent::WindowResized { window, size } => {
                crate::engine_trace!(SOURCE, "Window {} resized to {}x{}", window.0, size.width, size.height);
                self.framebuffer_size = size;
                self.suspended = size.width == 0 || size.height == 0;
                self.pending_resizes.insert(window, size);
                self.frames_since_resize = 0;
            }
            PlatformEvent::Suspended => {
                crate::engine_info!(SOURCE, "Suspended");
                self.suspended = true;
            }
            PlatformEvent::Resumed => {
                crate::engine_info!(SOURCE, "Resumed");
                self.suspended = false;
            }
            PlatformEvent::Quit => {
                crate::engine_info!(SOURCE, "Quit requested");
                self.running = false;
            }
            PlatformEvent::KvarChanged(kvar) => {
                self.renderer.on_kvar_changed(&kvar);
            }
            PlatformEvent::Key { key, pressed } => self.input.process_key(key, pressed),
            PlatformEvent::MouseButton { button, pressed } => self.input.process_button(button, pressed),
            PlatformEvent::MouseMoved { x, y } => self.input.process_mouse_move(x, y),
        }
    }

    fn commit_resizes(&mut self) -> Galaxy3dResult<()> {
        let mut resizes: Vec<_> = self.pending_resizes.drain().collect();
        resizes.sort_by_key(|(window, _)| window.0);
        self.frames_since_resize = 0;

        for (window, size) in resizes {
            crate::engine_debug!(SOURCE, "Committing resize of window {} to {}x{}", window.0, size.width, size.height);
            self.renderer.on_window_resized(window, size)?;
        }
        self.app.on_resize(&mut self.renderer, self.framebuffer_size);
        Ok(())
    }

    /// Stop the loop at the end of the current tick
    pub fn request_stop(&mut self) {
        self.running = false;
    }

    /// Shut down the application and the renderer (idempotent)
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.running = false;
        self.app.shutdown(&mut self.renderer);
        self.renderer.shutdown();
        crate::engine_info!(SOURCE, "Engine shut down after {} frames", self.frame_data.frame_number);
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn renderer(&self) -> &RendererFrontend {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut RendererFrontend {
        &mut self.renderer
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn frame_data(&self) -> &FrameData {
        &self.frame_data
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// A resize is waiting for the debounce to elapse
    pub fn is_resizing(&self) -> bool {
        !self.pending_resizes.is_empty()
    }

    // ===== LOGGING =====

    /// Set a custom logger (replaces DefaultLogger)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use galaxy_3d_renderer::galaxy3d::Engine;
    /// use galaxy_3d_renderer::galaxy3d::log::{Logger, LogEntry};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = global_logger().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = global_logger().write() {
            *lock = Box::new(DefaultLogger::new());
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = global_logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = global_logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
