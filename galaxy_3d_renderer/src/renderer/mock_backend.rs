/// Mock backend for unit tests (no GPU required)
///
/// Records every call as a string in a shared log and lets tests inject
/// failures after the backend has been handed to a `RendererFrontend`.
/// Clones share their call log and failure switches.

use std::sync::{Arc, Mutex};
use glam::Vec4;
use winit::dpi::PhysicalSize;

use crate::engine_bail;
use crate::error::Galaxy3dResult;
use crate::renderer::backend::{BackendPluginRegistry, BackendResource, RendererBackend, WindowId};
use crate::renderer::config::{BackendConfig, RendererFlags};
use crate::renderer::renderbuffer::RenderbufferType;
use crate::renderer::sampler::SamplerDesc;
use crate::renderer::shader::{ShaderConfig, ShaderUpdateFrequency};
use crate::renderer::state::{CullMode, FrameStatus, Rect2D, StencilOpState, Viewport, Winding};
use crate::renderer::texture::TextureDesc;

/// Plugin name the mock registers under
pub const MOCK_PLUGIN: &str = "mock";

/// Failure switches, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MockFailures {
    pub initialize: bool,
    pub texture_create: bool,
    pub texture_resize: bool,
    /// Only the n-th recorded `texture_resize` call fails (1-based)
    pub texture_resize_nth: Option<usize>,
    pub sampler_create: bool,
    pub shader_create: bool,
    pub renderbuffer_create: bool,
    pub renderbuffer_resize: bool,
    pub renderbuffer_load: bool,
    /// `frame_prepare` answers `Skip`
    pub frame_prepare_skip: bool,
    /// `frame_prepare` answers an error
    pub frame_prepare_error: bool,
    /// `frame_prepare_window_surface` answers `Skip`
    pub window_surface_skip: bool,
    pub present: bool,
}

/// Mock backend that tracks calls without a GPU
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Every call, in order
    pub calls: Arc<Mutex<Vec<String>>>,
    pub failures: Arc<Mutex<MockFailures>>,
    next_id: Arc<Mutex<u64>>,
    flags: Arc<Mutex<RendererFlags>>,
    /// Value returned by `max_anisotropy_get`
    pub max_anisotropy: Arc<Mutex<f32>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(MockFailures::default())),
            next_id: Arc::new(Mutex::new(1)),
            flags: Arc::new(Mutex::new(RendererFlags::empty())),
            max_anisotropy: Arc::new(Mutex::new(16.0)),
        }
    }

    /// A registry holding this mock (and its shared state) under `MOCK_PLUGIN`
    pub fn registry(&self) -> BackendPluginRegistry {
        let mut registry = BackendPluginRegistry::new();
        let mock = self.clone();
        registry.register_plugin(MOCK_PLUGIN, move || Ok(Box::new(mock.clone()) as Box<dyn RendererBackend>));
        registry
    }

    /// Snapshot of the call log
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Return and clear the call log
    pub fn take_calls(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// Number of logged calls starting with `prefix`
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|call| call.starts_with(prefix)).count()
    }

    /// Change the failure switches
    pub fn fail<F: FnOnce(&mut MockFailures)>(&self, f: F) {
        f(&mut self.failures.lock().unwrap());
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn failures(&self) -> MockFailures {
        self.failures.lock().unwrap().clone()
    }

    fn new_resource(&self) -> BackendResource {
        let mut next = self.next_id.lock().unwrap();
        let id = *next;
        *next += 1;
        BackendResource(id)
    }
}

impl RendererBackend for MockBackend {
    // ===== LIFECYCLE =====

    fn initialize(&mut self, config: &BackendConfig) -> Galaxy3dResult<()> {
        self.record(format!("initialize({})", config.application_name));
        if self.failures().initialize {
            engine_bail!("galaxy3d::mock", "initialize: injected failure");
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.record("shutdown".to_string());
    }

    fn wait_for_idle(&mut self) -> Galaxy3dResult<()> {
        self.record("wait_for_idle".to_string());
        Ok(())
    }

    // ===== WINDOWS =====

    fn window_create(&mut self, window: WindowId, size: PhysicalSize<u32>) -> Galaxy3dResult<()> {
        self.record(format!("window_create({}, {}x{})", window.0, size.width, size.height));
        Ok(())
    }

    fn window_destroy(&mut self, window: WindowId) {
        self.record(format!("window_destroy({})", window.0));
    }

    fn window_resized(&mut self, window: WindowId, size: PhysicalSize<u32>) {
        self.record(format!("window_resized({}, {}x{})", window.0, size.width, size.height));
    }

    // ===== FRAME SEQUENCING =====

    fn frame_prepare(&mut self, frame_number: u16) -> Galaxy3dResult<FrameStatus> {
        self.record(format!("frame_prepare({})", frame_number));
        let failures = self.failures();
        if failures.frame_prepare_error {
            engine_bail!("galaxy3d::mock", "frame_prepare: injected failure");
        }
        if failures.frame_prepare_skip {
            return Ok(FrameStatus::Skip);
        }
        Ok(FrameStatus::Ready)
    }

    fn frame_prepare_window_surface(&mut self, window: WindowId, frame_number: u16) -> Galaxy3dResult<FrameStatus> {
        self.record(format!("frame_prepare_window_surface({}, {})", window.0, frame_number));
        if self.failures().window_surface_skip {
            return Ok(FrameStatus::Skip);
        }
        Ok(FrameStatus::Ready)
    }

    fn frame_commands_begin(&mut self, frame_number: u16) -> Galaxy3dResult<()> {
        self.record(format!("frame_commands_begin({})", frame_number));
        Ok(())
    }

    fn frame_commands_end(&mut self, frame_number: u16) -> Galaxy3dResult<()> {
        self.record(format!("frame_commands_end({})", frame_number));
        Ok(())
    }

    fn frame_submit(&mut self, frame_number: u16) -> Galaxy3dResult<()> {
        self.record(format!("frame_submit({})", frame_number));
        Ok(())
    }

    fn frame_present(&mut self, window: WindowId, frame_number: u16) -> Galaxy3dResult<()> {
        self.record(format!("frame_present({}, {})", window.0, frame_number));
        if self.failures().present {
            engine_bail!("galaxy3d::mock", "frame_present: injected failure");
        }
        Ok(())
    }

    fn begin_rendering(
        &mut self,
        frame_number: u16,
        render_area: Rect2D,
        colour_targets: &[BackendResource],
        depth_stencil_target: Option<BackendResource>,
    ) -> Galaxy3dResult<()> {
        self.record(format!(
            "begin_rendering({}, {}x{}, {} colour, depth={})",
            frame_number, render_area.width, render_area.height,
            colour_targets.len(), depth_stencil_target.is_some()
        ));
        Ok(())
    }

    fn end_rendering(&mut self, frame_number: u16) -> Galaxy3dResult<()> {
        self.record(format!("end_rendering({})", frame_number));
        Ok(())
    }

    // ===== DYNAMIC STATE =====

    fn viewport_set(&mut self, viewport: Viewport) {
        self.record(format!("viewport_set({}x{})", viewport.width, viewport.height));
    }

    fn scissor_set(&mut self, scissor: Rect2D) {
        self.record(format!("scissor_set({}x{})", scissor.width, scissor.height));
    }

    fn winding_set(&mut self, winding: Winding) {
        self.record(format!("winding_set({:?})", winding));
    }

    fn cull_mode_set(&mut self, cull_mode: CullMode) {
        self.record(format!("cull_mode_set({:?})", cull_mode));
    }

    fn stencil_test_enable(&mut self, enabled: bool) {
        self.record(format!("stencil_test_enable({})", enabled));
    }

    fn stencil_op_set(&mut self, ops: StencilOpState) {
        self.record(format!("stencil_op_set({:?})", ops.compare_op));
    }

    fn stencil_reference_set(&mut self, reference: u32) {
        self.record(format!("stencil_reference_set({})", reference));
    }

    fn stencil_compare_mask_set(&mut self, mask: u32) {
        self.record(format!("stencil_compare_mask_set({})", mask));
    }

    fn stencil_write_mask_set(&mut self, mask: u32) {
        self.record(format!("stencil_write_mask_set({})", mask));
    }

    fn depth_test_enable(&mut self, enabled: bool) {
        self.record(format!("depth_test_enable({})", enabled));
    }

    fn depth_write_enable(&mut self, enabled: bool) {
        self.record(format!("depth_write_enable({})", enabled));
    }

    fn clear_colour_set(&mut self, colour: Vec4) {
        self.record(format!("clear_colour_set({:?})", colour.to_array()));
    }

    fn clear_depth_set(&mut self, depth: f32) {
        self.record(format!("clear_depth_set({})", depth));
    }

    fn clear_stencil_set(&mut self, stencil: u32) {
        self.record(format!("clear_stencil_set({})", stencil));
    }

    fn clear_colour(&mut self, texture: BackendResource) -> Galaxy3dResult<()> {
        self.record(format!("clear_colour({})", texture));
        Ok(())
    }

    fn clear_depth_stencil(&mut self, texture: BackendResource) -> Galaxy3dResult<()> {
        self.record(format!("clear_depth_stencil({})", texture));
        Ok(())
    }

    // ===== TEXTURES =====

    fn texture_create(&mut self, name: &str, desc: &TextureDesc, data: Option<&[u8]>) -> Galaxy3dResult<BackendResource> {
        self.record(format!(
            "texture_create({}, {}x{}, data={})",
            name, desc.width, desc.height, data.is_some()
        ));
        if self.failures().texture_create {
            engine_bail!("galaxy3d::mock", "texture_create: injected failure");
        }
        Ok(self.new_resource())
    }

    fn texture_destroy(&mut self, texture: BackendResource) {
        self.record(format!("texture_destroy({})", texture));
    }

    fn texture_resize(&mut self, texture: BackendResource, width: u32, height: u32) -> Galaxy3dResult<()> {
        self.record(format!("texture_resize({}, {}x{})", texture, width, height));
        let failures = self.failures();
        if failures.texture_resize || failures.texture_resize_nth == Some(self.count_calls("texture_resize(")) {
            engine_bail!("galaxy3d::mock", "texture_resize: injected failure");
        }
        Ok(())
    }

    fn texture_write_data(
        &mut self,
        texture: BackendResource,
        offset: u64,
        data: &[u8],
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()> {
        self.record(format!(
            "texture_write_data({}, {}, {}, frame={})",
            texture, offset, data.len(), include_in_frame_workload
        ));
        Ok(())
    }

    fn texture_read_data(&mut self, texture: BackendResource, offset: u64, size: u64) -> Galaxy3dResult<Vec<u8>> {
        self.record(format!("texture_read_data({}, {}, {})", texture, offset, size));
        Ok(vec![0; size as usize])
    }

    fn texture_read_pixel(&mut self, texture: BackendResource, x: u32, y: u32) -> Galaxy3dResult<[u8; 4]> {
        self.record(format!("texture_read_pixel({}, {}, {})", texture, x, y));
        Ok([0; 4])
    }

    // ===== SAMPLERS =====

    fn sampler_create(&mut self, name: &str, desc: &SamplerDesc) -> Galaxy3dResult<BackendResource> {
        self.record(format!("sampler_create({}, aniso={})", name, desc.anisotropy));
        if self.failures().sampler_create {
            engine_bail!("galaxy3d::mock", "sampler_create: injected failure");
        }
        Ok(self.new_resource())
    }

    fn sampler_destroy(&mut self, sampler: BackendResource) {
        self.record(format!("sampler_destroy({})", sampler));
    }

    fn sampler_refresh(&mut self, sampler: BackendResource, desc: &SamplerDesc) -> Galaxy3dResult<()> {
        self.record(format!("sampler_refresh({}, aniso={})", sampler, desc.anisotropy));
        Ok(())
    }

    // ===== SHADERS =====

    fn shader_create(&mut self, config: &ShaderConfig) -> Galaxy3dResult<BackendResource> {
        self.record(format!("shader_create({})", config.name));
        if self.failures().shader_create {
            engine_bail!("galaxy3d::mock", "shader_create: injected failure");
        }
        Ok(self.new_resource())
    }

    fn shader_destroy(&mut self, shader: BackendResource) {
        self.record(format!("shader_destroy({})", shader));
    }

    fn shader_reload(&mut self, shader: BackendResource, config: &ShaderConfig) -> Galaxy3dResult<()> {
        self.record(format!("shader_reload({}, {})", shader, config.name));
        Ok(())
    }

    fn shader_use(&mut self, shader: BackendResource) -> Galaxy3dResult<()> {
        self.record(format!("shader_use({})", shader));
        Ok(())
    }

    fn shader_resources_acquire(&mut self, shader: BackendResource, frequency: ShaderUpdateFrequency) -> Galaxy3dResult<u32> {
        self.record(format!("shader_resources_acquire({}, {:?})", shader, frequency));
        Ok(self.new_resource().0 as u32)
    }

    fn shader_resources_release(&mut self, shader: BackendResource, frequency: ShaderUpdateFrequency, id: u32) {
        self.record(format!("shader_resources_release({}, {:?}, {})", shader, frequency, id));
    }

    fn shader_bind(&mut self, shader: BackendResource, frequency: ShaderUpdateFrequency, id: u32) -> Galaxy3dResult<()> {
        self.record(format!("shader_bind({}, {:?}, {})", shader, frequency, id));
        Ok(())
    }

    fn shader_uniform_set(
        &mut self,
        shader: BackendResource,
        frequency: ShaderUpdateFrequency,
        uniform_index: u16,
        data: &[u8],
    ) -> Galaxy3dResult<()> {
        self.record(format!(
            "shader_uniform_set({}, {:?}, {}, {})",
            shader, frequency, uniform_index, data.len()
        ));
        Ok(())
    }

    fn shader_apply(&mut self, shader: BackendResource, frequency: ShaderUpdateFrequency) -> Galaxy3dResult<()> {
        self.record(format!("shader_apply({}, {:?})", shader, frequency));
        Ok(())
    }

    // ===== RENDERBUFFERS =====

    fn renderbuffer_create(&mut self, name: &str, buffer_type: RenderbufferType, size: u64) -> Galaxy3dResult<BackendResource> {
        self.record(format!("renderbuffer_create({}, {:?}, {})", name, buffer_type, size));
        if self.failures().renderbuffer_create {
            engine_bail!("galaxy3d::mock", "renderbuffer_create: injected failure");
        }
        Ok(self.new_resource())
    }

    fn renderbuffer_destroy(&mut self, buffer: BackendResource) {
        self.record(format!("renderbuffer_destroy({})", buffer));
    }

    fn renderbuffer_bind(&mut self, buffer: BackendResource, offset: u64) -> Galaxy3dResult<()> {
        self.record(format!("renderbuffer_bind({}, {})", buffer, offset));
        Ok(())
    }

    fn renderbuffer_unbind(&mut self, buffer: BackendResource) -> Galaxy3dResult<()> {
        self.record(format!("renderbuffer_unbind({})", buffer));
        Ok(())
    }

    fn renderbuffer_map_memory(&mut self, buffer: BackendResource, offset: u64, size: u64) -> Galaxy3dResult<()> {
        self.record(format!("renderbuffer_map_memory({}, {}, {})", buffer, offset, size));
        Ok(())
    }

    fn renderbuffer_unmap_memory(&mut self, buffer: BackendResource, offset: u64, size: u64) {
        self.record(format!("renderbuffer_unmap_memory({}, {}, {})", buffer, offset, size));
    }

    fn renderbuffer_flush(&mut self, buffer: BackendResource, offset: u64, size: u64) -> Galaxy3dResult<()> {
        self.record(format!("renderbuffer_flush({}, {}, {})", buffer, offset, size));
        Ok(())
    }

    fn renderbuffer_read(&mut self, buffer: BackendResource, offset: u64, size: u64) -> Galaxy3dResult<Vec<u8>> {
        self.record(format!("renderbuffer_read({}, {}, {})", buffer, offset, size));
        Ok(vec![0; size as usize])
    }

    fn renderbuffer_resize(&mut self, buffer: BackendResource, old_size: u64, new_size: u64) -> Galaxy3dResult<()> {
        self.record(format!("renderbuffer_resize({}, {}, {})", buffer, old_size, new_size));
        if self.failures().renderbuffer_resize {
            engine_bail!("galaxy3d::mock", "renderbuffer_resize: injected failure");
        }
        Ok(())
    }

    fn renderbuffer_load_range(
        &mut self,
        buffer: BackendResource,
        offset: u64,
        data: &[u8],
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()> {
        self.record(format!(
            "renderbuffer_load_range({}, {}, {}, frame={})",
            buffer, offset, data.len(), include_in_frame_workload
        ));
        if self.failures().renderbuffer_load {
            engine_bail!("galaxy3d::mock", "renderbuffer_load_range: injected failure");
        }
        Ok(())
    }

    fn renderbuffer_copy_range(
        &mut self,
        source: BackendResource,
        source_offset: u64,
        dest: BackendResource,
        dest_offset: u64,
        size: u64,
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()> {
        self.record(format!(
            "renderbuffer_copy_range({}, {}, {}, {}, {}, frame={})",
            source, source_offset, dest, dest_offset, size, include_in_frame_workload
        ));
        Ok(())
    }

    fn renderbuffer_draw(
        &mut self,
        buffer: BackendResource,
        offset: u64,
        element_count: u32,
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()> {
        self.record(format!(
            "renderbuffer_draw({}, {}, {}, frame={})",
            buffer, offset, element_count, include_in_frame_workload
        ));
        Ok(())
    }

    // ===== CAPABILITIES =====

    fn is_multithreaded(&self) -> bool {
        false
    }

    fn flag_enabled_get(&self, flag: RendererFlags) -> bool {
        self.flags.lock().unwrap().contains(flag)
    }

    fn flag_enabled_set(&mut self, flag: RendererFlags, enabled: bool) {
        self.record(format!("flag_enabled_set({:?}, {})", flag, enabled));
        self.flags.lock().unwrap().set(flag, enabled);
    }

    fn max_anisotropy_get(&self) -> f32 {
        *self.max_anisotropy.lock().unwrap()
    }
}
