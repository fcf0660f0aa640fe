/// HeadlessBackend - CPU implementation of the RendererBackend trait
///
/// Objects live in id-keyed maps. Frame sequencing is enforced: a call made
/// in the wrong phase is a `BackendError`, the way a GPU API would reject it.
/// A resized window makes the next `frame_prepare` answer `Skip` while its
/// swapchain is recreated.

use std::sync::Arc;

use glam::Vec4;
use rustc_hash::FxHashMap;
use winit::dpi::PhysicalSize;

use galaxy_3d_renderer::galaxy3d::Galaxy3dResult;
use galaxy_3d_renderer::galaxy3d::render::{
    BackendConfig, BackendResource, CullMode, FrameStatus, Rect2D, RendererBackend, RendererConfigFlags,
    RendererFlags, RenderbufferType, SamplerDesc, ShaderConfig, ShaderUpdateFrequency, StencilOpState,
    TextureDesc, Viewport, WindowId, Winding,
};
use galaxy_3d_renderer::{engine_bail, engine_bail_arg, engine_bail_resource, engine_debug, engine_info, engine_warn};

use crate::headless_buffer::Buffer;
use crate::headless_shader::Shader;
use crate::headless_swapchain::Swapchain;
use crate::headless_texture::{colour_to_rgba8, Texture};
use crate::stats::HeadlessCounters;
use crate::{headless_trace, SOURCE};

/// Anisotropy reported by `max_anisotropy_get`
const MAX_ANISOTROPY: f32 = 16.0;

/// Size in bytes of one index element
const INDEX_SIZE: u64 = 4;

/// Where the backend is in the frame sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramePhase {
    Idle,
    Prepared,
    Recording,
    /// Inside `begin_rendering` / `end_rendering`
    Rendering,
    /// Commands ended, not yet submitted
    Ended,
    Submitted,
}

/// Dynamic pipeline state last set through the backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicState {
    pub viewport: Viewport,
    pub scissor: Rect2D,
    pub winding: Winding,
    pub cull_mode: CullMode,
    pub stencil_test: bool,
    pub stencil_ops: StencilOpState,
    pub stencil_reference: u32,
    pub stencil_compare_mask: u32,
    pub stencil_write_mask: u32,
    pub depth_test: bool,
    pub depth_write: bool,
    pub clear_colour: Vec4,
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

impl Default for DynamicState {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            scissor: Rect2D::default(),
            winding: Winding::CounterClockwise,
            cull_mode: CullMode::Back,
            stencil_test: false,
            stencil_ops: StencilOpState::default(),
            stencil_reference: 0,
            stencil_compare_mask: 0xFF,
            stencil_write_mask: 0xFF,
            depth_test: true,
            depth_write: true,
            clear_colour: Vec4::new(0.0, 0.0, 0.0, 1.0),
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }
}

/// Headless renderer backend
pub struct HeadlessBackend {
    counters: Arc<HeadlessCounters>,
    config: Option<BackendConfig>,
    next_id: u64,
    buffers: FxHashMap<BackendResource, Buffer>,
    textures: FxHashMap<BackendResource, Texture>,
    samplers: FxHashMap<BackendResource, (String, SamplerDesc)>,
    shaders: FxHashMap<BackendResource, Shader>,
    swapchains: FxHashMap<WindowId, Swapchain>,
    /// A window was resized; the next `frame_prepare` skips
    swapchain_dirty: bool,
    phase: FramePhase,
    frame_number: u16,
    state: DynamicState,
    bound_vertex_buffer: Option<(BackendResource, u64)>,
    active_shader: Option<BackendResource>,
    flags: RendererFlags,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::with_counters(Arc::new(HeadlessCounters::new()))
    }

    /// Backend reporting into shared counters
    pub fn with_counters(counters: Arc<HeadlessCounters>) -> Self {
        Self {
            counters,
            config: None,
            next_id: 1,
            buffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            samplers: FxHashMap::default(),
            shaders: FxHashMap::default(),
            swapchains: FxHashMap::default(),
            swapchain_dirty: false,
            phase: FramePhase::Idle,
            frame_number: 0,
            state: DynamicState::default(),
            bound_vertex_buffer: None,
            active_shader: None,
            flags: RendererFlags::empty(),
        }
    }

    pub fn counters(&self) -> &Arc<HeadlessCounters> {
        &self.counters
    }

    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    /// Frame number of the last prepared frame
    pub fn frame_number(&self) -> u16 {
        self.frame_number
    }

    pub fn dynamic_state(&self) -> &DynamicState {
        &self.state
    }

    /// Number of images presented on a window
    pub fn presented_count(&self, window: WindowId) -> Option<u64> {
        self.swapchains.get(&window).map(|swapchain| swapchain.presented)
    }

    /// Last value `shader_apply` published for a uniform
    pub fn applied_uniform(
        &self,
        shader: BackendResource,
        frequency: ShaderUpdateFrequency,
        set: u32,
        uniform_index: u16,
    ) -> Option<&[u8]> {
        self.shaders.get(&shader)?.applied_uniform(frequency, set, uniform_index)
    }

    /// Number of live objects (buffers, textures, samplers, shaders)
    pub fn live_object_count(&self) -> usize {
        self.buffers.len() + self.textures.len() + self.samplers.len() + self.shaders.len()
    }

    // ===== INTERNAL HELPERS =====

    fn new_resource(&mut self) -> BackendResource {
        let id = BackendResource(self.next_id);
        self.next_id += 1;
        id
    }

    fn expect_phase(&self, allowed: &[FramePhase], operation: &str) -> Galaxy3dResult<()> {
        if !allowed.contains(&self.phase) {
            engine_bail!(SOURCE, "{} called in phase {:?} (expected one of {:?})", operation, self.phase, allowed);
        }
        Ok(())
    }

    fn expect_frame(&self, frame_number: u16, operation: &str) -> Galaxy3dResult<()> {
        if frame_number != self.frame_number {
            engine_bail!(SOURCE, "{} for frame {} while frame {} is prepared", operation, frame_number, self.frame_number);
        }
        Ok(())
    }

    fn is_recording(&self) -> bool {
        matches!(self.phase, FramePhase::Recording | FramePhase::Rendering)
    }

    fn buffer(&self, id: BackendResource) -> Galaxy3dResult<&Buffer> {
        match self.buffers.get(&id) {
            Some(buffer) => Ok(buffer),
            None => {
                engine_bail_resource!(SOURCE, "Buffer {} does not exist", id);
            }
        }
    }

    fn buffer_mut(&mut self, id: BackendResource) -> Galaxy3dResult<&mut Buffer> {
        match self.buffers.get_mut(&id) {
            Some(buffer) => Ok(buffer),
            None => {
                engine_bail_resource!(SOURCE, "Buffer {} does not exist", id);
            }
        }
    }

    fn texture(&self, id: BackendResource) -> Galaxy3dResult<&Texture> {
        match self.textures.get(&id) {
            Some(texture) => Ok(texture),
            None => {
                engine_bail_resource!(SOURCE, "Texture {} does not exist", id);
            }
        }
    }

    fn texture_mut(&mut self, id: BackendResource) -> Galaxy3dResult<&mut Texture> {
        match self.textures.get_mut(&id) {
            Some(texture) => Ok(texture),
            None => {
                engine_bail_resource!(SOURCE, "Texture {} does not exist", id);
            }
        }
    }

    fn shader_mut(&mut self, id: BackendResource) -> Galaxy3dResult<&mut Shader> {
        match self.shaders.get_mut(&id) {
            Some(shader) => Ok(shader),
            None => {
                engine_bail_resource!(SOURCE, "Shader {} does not exist", id);
            }
        }
    }

    fn swapchain_mut(&mut self, window: WindowId) -> Galaxy3dResult<&mut Swapchain> {
        match self.swapchains.get_mut(&window) {
            Some(swapchain) => Ok(swapchain),
            None => {
                engine_bail_resource!(SOURCE, "Window {} has no swapchain", window.0);
            }
        }
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererBackend for HeadlessBackend {
    // ===== LIFECYCLE =====

    fn initialize(&mut self, config: &BackendConfig) -> Galaxy3dResult<()> {
        if self.config.is_some() {
            engine_bail!(SOURCE, "Headless backend initialized twice");
        }
        headless_trace!("initialize({})", config.application_name);

        self.flags.set(RendererFlags::VSYNC, config.flags.contains(RendererConfigFlags::VSYNC_ENABLED));
        self.flags.set(RendererFlags::POWER_SAVING, config.flags.contains(RendererConfigFlags::POWER_SAVING));
        self.flags.set(RendererFlags::USE_PCF, config.flags.contains(RendererConfigFlags::USE_PCF));
        self.config = Some(config.clone());

        engine_info!(SOURCE, "Headless backend initialized for '{}' ({} frames in flight)",
            config.application_name, config.max_frames_in_flight);
        Ok(())
    }

    fn shutdown(&mut self) {
        headless_trace!("shutdown");
        let leaked = self.live_object_count();
        if leaked > 0 {
            engine_warn!(SOURCE, "{} object(s) still alive at shutdown, releasing them", leaked);
        }

        self.buffers.clear();
        self.textures.clear();
        self.samplers.clear();
        self.shaders.clear();
        self.swapchains.clear();
        self.bound_vertex_buffer = None;
        self.active_shader = None;
        self.phase = FramePhase::Idle;
        self.config = None;
        engine_info!(SOURCE, "Headless backend shut down");
    }

    fn wait_for_idle(&mut self) -> Galaxy3dResult<()> {
        headless_trace!("wait_for_idle");
        Ok(())
    }

    // ===== WINDOWS =====

    fn window_create(&mut self, window: WindowId, size: PhysicalSize<u32>) -> Galaxy3dResult<()> {
        headless_trace!("window_create({}, {}x{})", window.0, size.width, size.height);
        if self.swapchains.contains_key(&window) {
            engine_bail!(SOURCE, "Window {} already has a swapchain", window.0);
        }
        let image_count = self.config.as_ref().map_or(1, |config| config.max_frames_in_flight as u32);
        self.swapchains.insert(window, Swapchain::new(window, size, image_count));
        Ok(())
    }

    fn window_destroy(&mut self, window: WindowId) {
        headless_trace!("window_destroy({})", window.0);
        if self.swapchains.remove(&window).is_none() {
            engine_warn!(SOURCE, "Destroy of window {} which has no swapchain", window.0);
        }
    }

    fn window_resized(&mut self, window: WindowId, size: PhysicalSize<u32>) {
        headless_trace!("window_resized({}, {}x{})", window.0, size.width, size.height);
        match self.swapchains.get_mut(&window) {
            Some(swapchain) => {
                swapchain.recreate(size);
                self.swapchain_dirty = true;
            }
            None => engine_warn!(SOURCE, "Resize of window {} which has no swapchain", window.0),
        }
    }

    // ===== FRAME SEQUENCING =====

    fn frame_prepare(&mut self, frame_number: u16) -> Galaxy3dResult<FrameStatus> {
        headless_trace!("frame_prepare({})", frame_number);
        if self.config.is_none() {
            engine_bail!(SOURCE, "frame_prepare before initialize");
        }
        self.expect_phase(
            &[FramePhase::Idle, FramePhase::Prepared, FramePhase::Submitted],
            "frame_prepare",
        )?;

        if self.swapchain_dirty {
            self.swapchain_dirty = false;
            self.phase = FramePhase::Idle;
            self.counters.frame_skipped();
            engine_debug!(SOURCE, "Frame {} skipped, swapchains recreated", frame_number);
            return Ok(FrameStatus::Skip);
        }

        self.frame_number = frame_number;
        self.phase = FramePhase::Prepared;
        Ok(FrameStatus::Ready)
    }

    fn frame_prepare_window_surface(&mut self, window: WindowId, frame_number: u16) -> Galaxy3dResult<FrameStatus> {
        headless_trace!("frame_prepare_window_surface({}, {})", window.0, frame_number);
        self.expect_phase(&[FramePhase::Prepared], "frame_prepare_window_surface")?;
        self.expect_frame(frame_number, "frame_prepare_window_surface")?;

        let status = self.swapchain_mut(window)?.acquire_next_image();
        if status == FrameStatus::Skip {
            self.counters.frame_skipped();
        }
        Ok(status)
    }

    fn frame_commands_begin(&mut self, frame_number: u16) -> Galaxy3dResult<()> {
        headless_trace!("frame_commands_begin({})", frame_number);
        self.expect_phase(&[FramePhase::Prepared], "frame_commands_begin")?;
        self.expect_frame(frame_number, "frame_commands_begin")?;
        self.phase = FramePhase::Recording;
        Ok(())
    }

    fn frame_commands_end(&mut self, frame_number: u16) -> Galaxy3dResult<()> {
        headless_trace!("frame_commands_end({})", frame_number);
        self.expect_phase(&[FramePhase::Recording], "frame_commands_end")?;
        self.expect_frame(frame_number, "frame_commands_end")?;
        self.phase = FramePhase::Ended;
        Ok(())
    }

    fn frame_submit(&mut self, frame_number: u16) -> Galaxy3dResult<()> {
        headless_trace!("frame_submit({})", frame_number);
        self.expect_phase(&[FramePhase::Ended], "frame_submit")?;
        self.expect_frame(frame_number, "frame_submit")?;
        self.phase = FramePhase::Submitted;
        self.counters.frame_submitted();
        Ok(())
    }

    fn frame_present(&mut self, window: WindowId, frame_number: u16) -> Galaxy3dResult<()> {
        headless_trace!("frame_present({}, {})", window.0, frame_number);
        self.expect_phase(&[FramePhase::Submitted], "frame_present")?;
        self.expect_frame(frame_number, "frame_present")?;
        self.swapchain_mut(window)?.present()?;
        self.counters.frame_presented();
        Ok(())
    }

    fn begin_rendering(
        &mut self,
        frame_number: u16,
        render_area: Rect2D,
        colour_targets: &[BackendResource],
        depth_stencil_target: Option<BackendResource>,
    ) -> Galaxy3dResult<()> {
        headless_trace!("begin_rendering({}, {}x{}, {} colour)",
            frame_number, render_area.width, render_area.height, colour_targets.len());
        self.expect_phase(&[FramePhase::Recording], "begin_rendering")?;
        self.expect_frame(frame_number, "begin_rendering")?;

        for &target in colour_targets {
            if self.texture(target)?.desc.is_depth() {
                engine_bail_arg!(SOURCE, "Texture {} is a depth texture, used as colour target", target);
            }
        }
        if let Some(target) = depth_stencil_target {
            if !self.texture(target)?.desc.is_depth() {
                engine_bail_arg!(SOURCE, "Texture {} is not a depth texture, used as depth target", target);
            }
        }

        self.phase = FramePhase::Rendering;
        Ok(())
    }

    fn end_rendering(&mut self, frame_number: u16) -> Galaxy3dResult<()> {
        headless_trace!("end_rendering({})", frame_number);
        self.expect_phase(&[FramePhase::Rendering], "end_rendering")?;
        self.expect_frame(frame_number, "end_rendering")?;
        self.phase = FramePhase::Recording;
        Ok(())
    }

    // ===== DYNAMIC STATE =====

    fn viewport_set(&mut self, viewport: Viewport) {
        self.state.viewport = viewport;
    }

    fn scissor_set(&mut self, scissor: Rect2D) {
        self.state.scissor = scissor;
    }

    fn winding_set(&mut self, winding: Winding) {
        headless_trace!("winding_set({:?})", winding);
        self.state.winding = winding;
    }

    fn cull_mode_set(&mut self, cull_mode: CullMode) {
        self.state.cull_mode = cull_mode;
    }

    fn stencil_test_enable(&mut self, enabled: bool) {
        self.state.stencil_test = enabled;
    }

    fn stencil_op_set(&mut self, ops: StencilOpState) {
        self.state.stencil_ops = ops;
    }

    fn stencil_reference_set(&mut self, reference: u32) {
        self.state.stencil_reference = reference;
    }

    fn stencil_compare_mask_set(&mut self, mask: u32) {
        self.state.stencil_compare_mask = mask;
    }

    fn stencil_write_mask_set(&mut self, mask: u32) {
        self.state.stencil_write_mask = mask;
    }

    fn depth_test_enable(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
    }

    fn depth_write_enable(&mut self, enabled: bool) {
        self.state.depth_write = enabled;
    }

    fn clear_colour_set(&mut self, colour: Vec4) {
        self.state.clear_colour = colour;
    }

    fn clear_depth_set(&mut self, depth: f32) {
        self.state.clear_depth = depth;
    }

    fn clear_stencil_set(&mut self, stencil: u32) {
        self.state.clear_stencil = stencil;
    }

    fn clear_colour(&mut self, texture: BackendResource) -> Galaxy3dResult<()> {
        headless_trace!("clear_colour({})", texture);
        let pixel = colour_to_rgba8(self.state.clear_colour.to_array());
        let texture = self.texture_mut(texture)?;
        if texture.desc.is_depth() {
            engine_bail_arg!(SOURCE, "clear_colour on depth texture '{}'", texture.name);
        }
        texture.fill(pixel);
        Ok(())
    }

    /// Depth is stored quantized in channel 0, stencil in channel 1
    fn clear_depth_stencil(&mut self, texture: BackendResource) -> Galaxy3dResult<()> {
        headless_trace!("clear_depth_stencil({})", texture);
        let depth = (self.state.clear_depth.clamp(0.0, 1.0) * 255.0).round() as u8;
        let stencil = (self.state.clear_stencil & 0xFF) as u8;
        let texture = self.texture_mut(texture)?;
        if !texture.desc.is_depth() {
            engine_bail_arg!(SOURCE, "clear_depth_stencil on colour texture '{}'", texture.name);
        }
        texture.fill([depth, stencil, 0, 0]);
        Ok(())
    }

    // ===== TEXTURES =====

    fn texture_create(&mut self, name: &str, desc: &TextureDesc, data: Option<&[u8]>) -> Galaxy3dResult<BackendResource> {
        headless_trace!("texture_create({}, {}x{})", name, desc.width, desc.height);
        let texture = Texture::new(name, desc, data)?;
        if let Some(bytes) = data {
            self.counters.upload(bytes.len(), true);
        }

        let id = self.new_resource();
        self.textures.insert(id, texture);
        self.counters.texture_created();
        Ok(id)
    }

    fn texture_destroy(&mut self, texture: BackendResource) {
        headless_trace!("texture_destroy({})", texture);
        if self.textures.remove(&texture).is_none() {
            engine_warn!(SOURCE, "Destroy of texture {} which does not exist", texture);
        }
    }

    fn texture_resize(&mut self, texture: BackendResource, width: u32, height: u32) -> Galaxy3dResult<()> {
        headless_trace!("texture_resize({}, {}x{})", texture, width, height);
        if width == 0 || height == 0 {
            engine_bail_arg!(SOURCE, "Texture {} cannot be resized to {}x{}", texture, width, height);
        }
        self.texture_mut(texture)?.resize(width, height);
        Ok(())
    }

    fn texture_write_data(
        &mut self,
        texture: BackendResource,
        offset: u64,
        data: &[u8],
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()> {
        headless_trace!("texture_write_data({}, {}, {})", texture, offset, data.len());
        self.texture_mut(texture)?.write(offset, data)?;
        self.counters.upload(data.len(), !include_in_frame_workload);
        Ok(())
    }

    fn texture_read_data(&mut self, texture: BackendResource, offset: u64, size: u64) -> Galaxy3dResult<Vec<u8>> {
        headless_trace!("texture_read_data({}, {}, {})", texture, offset, size);
        self.texture(texture)?.read(offset, size)
    }

    fn texture_read_pixel(&mut self, texture: BackendResource, x: u32, y: u32) -> Galaxy3dResult<[u8; 4]> {
        headless_trace!("texture_read_pixel({}, {}, {})", texture, x, y);
        self.texture(texture)?.read_pixel(x, y)
    }

    // ===== SAMPLERS =====

    fn sampler_create(&mut self, name: &str, desc: &SamplerDesc) -> Galaxy3dResult<BackendResource> {
        headless_trace!("sampler_create({})", name);
        if desc.anisotropy > MAX_ANISOTROPY {
            engine_bail_arg!(SOURCE,
                "Sampler '{}' anisotropy {} exceeds the maximum {}", name, desc.anisotropy, MAX_ANISOTROPY);
        }
        let id = self.new_resource();
        self.samplers.insert(id, (name.to_string(), *desc));
        Ok(id)
    }

    fn sampler_destroy(&mut self, sampler: BackendResource) {
        headless_trace!("sampler_destroy({})", sampler);
        if self.samplers.remove(&sampler).is_none() {
            engine_warn!(SOURCE, "Destroy of sampler {} which does not exist", sampler);
        }
    }

    fn sampler_refresh(&mut self, sampler: BackendResource, desc: &SamplerDesc) -> Galaxy3dResult<()> {
        headless_trace!("sampler_refresh({})", sampler);
        if desc.anisotropy > MAX_ANISOTROPY {
            engine_bail_arg!(SOURCE, "Sampler {} anisotropy {} exceeds the maximum", sampler, desc.anisotropy);
        }
        match self.samplers.get_mut(&sampler) {
            Some(entry) => {
                entry.1 = *desc;
                Ok(())
            }
            None => {
                engine_bail_resource!(SOURCE, "Sampler {} does not exist", sampler);
            }
        }
    }

    // ===== SHADERS =====

    fn shader_create(&mut self, config: &ShaderConfig) -> Galaxy3dResult<BackendResource> {
        headless_trace!("shader_create({})", config.name);
        config.validate()?;
        let id = self.new_resource();
        self.shaders.insert(id, Shader::new(config));
        engine_debug!(SOURCE, "Shader '{}' created with {} stage(s)", config.name, config.stages.len());
        Ok(id)
    }

    fn shader_destroy(&mut self, shader: BackendResource) {
        headless_trace!("shader_destroy({})", shader);
        if self.shaders.remove(&shader).is_none() {
            engine_warn!(SOURCE, "Destroy of shader {} which does not exist", shader);
        }
        if self.active_shader == Some(shader) {
            self.active_shader = None;
        }
    }

    fn shader_reload(&mut self, shader: BackendResource, config: &ShaderConfig) -> Galaxy3dResult<()> {
        headless_trace!("shader_reload({}, {})", shader, config.name);
        config.validate()?;
        let record = self.shader_mut(shader)?;
        if record.config.uniforms != config.uniforms {
            engine_bail_arg!(SOURCE, "Reload of shader '{}' changes its uniforms", record.config.name);
        }
        record.config = config.clone();
        Ok(())
    }

    fn shader_use(&mut self, shader: BackendResource) -> Galaxy3dResult<()> {
        headless_trace!("shader_use({})", shader);
        self.shader_mut(shader)?;
        self.active_shader = Some(shader);
        Ok(())
    }

    fn shader_resources_acquire(&mut self, shader: BackendResource, frequency: ShaderUpdateFrequency) -> Galaxy3dResult<u32> {
        headless_trace!("shader_resources_acquire({}, {:?})", shader, frequency);
        self.shader_mut(shader)?.acquire(frequency)
    }

    fn shader_resources_release(&mut self, shader: BackendResource, frequency: ShaderUpdateFrequency, id: u32) {
        headless_trace!("shader_resources_release({}, {:?}, {})", shader, frequency, id);
        match self.shaders.get_mut(&shader) {
            Some(record) => record.release(frequency, id),
            None => engine_warn!(SOURCE, "Release of resource set {} on shader {} which does not exist", id, shader),
        }
    }

    fn shader_bind(&mut self, shader: BackendResource, frequency: ShaderUpdateFrequency, id: u32) -> Galaxy3dResult<()> {
        headless_trace!("shader_bind({}, {:?}, {})", shader, frequency, id);
        self.shader_mut(shader)?.bind(frequency, id)
    }

    fn shader_uniform_set(
        &mut self,
        shader: BackendResource,
        frequency: ShaderUpdateFrequency,
        uniform_index: u16,
        data: &[u8],
    ) -> Galaxy3dResult<()> {
        headless_trace!("shader_uniform_set({}, {:?}, {}, {})", shader, frequency, uniform_index, data.len());
        self.shader_mut(shader)?.uniform_set(frequency, uniform_index, data)
    }

    fn shader_apply(&mut self, shader: BackendResource, frequency: ShaderUpdateFrequency) -> Galaxy3dResult<()> {
        headless_trace!("shader_apply({}, {:?})", shader, frequency);
        let applied = self.shader_mut(shader)?.apply(frequency);
        if applied > 0 {
            headless_trace!("{} uniform(s) applied", applied);
        }
        Ok(())
    }

    // ===== RENDERBUFFERS =====

    fn renderbuffer_create(&mut self, name: &str, buffer_type: RenderbufferType, size: u64) -> Galaxy3dResult<BackendResource> {
        headless_trace!("renderbuffer_create({}, {:?}, {})", name, buffer_type, size);
        if size == 0 {
            engine_bail_arg!(SOURCE, "Buffer '{}' must have a non-zero size", name);
        }
        let id = self.new_resource();
        self.buffers.insert(id, Buffer::new(name, buffer_type, size));
        self.counters.renderbuffer_created();
        Ok(id)
    }

    fn renderbuffer_destroy(&mut self, buffer: BackendResource) {
        headless_trace!("renderbuffer_destroy({})", buffer);
        if self.buffers.remove(&buffer).is_none() {
            engine_warn!(SOURCE, "Destroy of buffer {} which does not exist", buffer);
        }
        if self.bound_vertex_buffer.is_some_and(|(bound, _)| bound == buffer) {
            self.bound_vertex_buffer = None;
        }
    }

    fn renderbuffer_bind(&mut self, buffer: BackendResource, offset: u64) -> Galaxy3dResult<()> {
        headless_trace!("renderbuffer_bind({}, {})", buffer, offset);
        let record = self.buffer(buffer)?;
        record.range(offset, 0)?;
        if record.buffer_type == RenderbufferType::Vertex {
            self.bound_vertex_buffer = Some((buffer, offset));
        }
        Ok(())
    }

    fn renderbuffer_unbind(&mut self, buffer: BackendResource) -> Galaxy3dResult<()> {
        headless_trace!("renderbuffer_unbind({})", buffer);
        self.buffer(buffer)?;
        if self.bound_vertex_buffer.is_some_and(|(bound, _)| bound == buffer) {
            self.bound_vertex_buffer = None;
        }
        Ok(())
    }

    fn renderbuffer_map_memory(&mut self, buffer: BackendResource, offset: u64, size: u64) -> Galaxy3dResult<()> {
        headless_trace!("renderbuffer_map_memory({}, {}, {})", buffer, offset, size);
        self.buffer_mut(buffer)?.map(offset, size)
    }

    fn renderbuffer_unmap_memory(&mut self, buffer: BackendResource, offset: u64, size: u64) {
        headless_trace!("renderbuffer_unmap_memory({}, {}, {})", buffer, offset, size);
        match self.buffers.get_mut(&buffer) {
            Some(record) if record.mapped == Some((offset, size)) => record.mapped = None,
            Some(record) => engine_warn!(SOURCE,
                "Unmap of [{}, +{}) on buffer '{}' which maps {:?}", offset, size, record.name, record.mapped),
            None => engine_warn!(SOURCE, "Unmap on buffer {} which does not exist", buffer),
        }
    }

    fn renderbuffer_flush(&mut self, buffer: BackendResource, offset: u64, size: u64) -> Galaxy3dResult<()> {
        headless_trace!("renderbuffer_flush({}, {}, {})", buffer, offset, size);
        let record = self.buffer(buffer)?;
        if !record.is_mapped(offset, size) {
            engine_bail!(SOURCE, "Flush of [{}, +{}) on buffer '{}' which is not mapped", offset, size, record.name);
        }
        Ok(())
    }

    fn renderbuffer_read(&mut self, buffer: BackendResource, offset: u64, size: u64) -> Galaxy3dResult<Vec<u8>> {
        headless_trace!("renderbuffer_read({}, {}, {})", buffer, offset, size);
        self.buffer(buffer)?.read(offset, size)
    }

    fn renderbuffer_resize(&mut self, buffer: BackendResource, old_size: u64, new_size: u64) -> Galaxy3dResult<()> {
        headless_trace!("renderbuffer_resize({}, {}, {})", buffer, old_size, new_size);
        self.buffer_mut(buffer)?.resize(old_size, new_size)
    }

    fn renderbuffer_load_range(
        &mut self,
        buffer: BackendResource,
        offset: u64,
        data: &[u8],
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()> {
        headless_trace!("renderbuffer_load_range({}, {}, {})", buffer, offset, data.len());
        self.buffer_mut(buffer)?.write(offset, data)?;
        self.counters.upload(data.len(), !include_in_frame_workload);
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
        headless_trace!("renderbuffer_copy_range({}, {}, {}, {}, {})", source, source_offset, dest, dest_offset, size);
        let bytes = self.buffer(source)?.read(source_offset, size)?;
        self.buffer_mut(dest)?.write(dest_offset, &bytes)?;
        self.counters.upload(bytes.len(), !include_in_frame_workload);
        Ok(())
    }

    fn renderbuffer_draw(
        &mut self,
        buffer: BackendResource,
        offset: u64,
        element_count: u32,
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()> {
        headless_trace!("renderbuffer_draw({}, {}, {})", buffer, offset, element_count);
        if include_in_frame_workload && !self.is_recording() {
            engine_bail!(SOURCE, "Draw recorded in phase {:?}, outside of a frame", self.phase);
        }

        let record = self.buffer(buffer)?;
        match record.buffer_type {
            RenderbufferType::Index => {
                if self.bound_vertex_buffer.is_none() {
                    engine_bail!(SOURCE, "Indexed draw from '{}' with no vertex buffer bound", record.name);
                }
                record.range(offset, element_count as u64 * INDEX_SIZE)?;
            }
            RenderbufferType::Vertex => {
                record.range(offset, 0)?;
            }
            other => {
                engine_bail_arg!(SOURCE, "Draw from buffer '{}' of type {:?}", record.name, other);
            }
        }

        self.counters.draw(element_count);
        Ok(())
    }

    // ===== CAPABILITIES =====

    fn is_multithreaded(&self) -> bool {
        false
    }

    fn flag_enabled_get(&self, flag: RendererFlags) -> bool {
        self.flags.contains(flag)
    }

    fn flag_enabled_set(&mut self, flag: RendererFlags, enabled: bool) {
        headless_trace!("flag_enabled_set({:?}, {})", flag, enabled);
        self.flags.set(flag, enabled);
    }

    fn max_anisotropy_get(&self) -> f32 {
        MAX_ANISOTROPY
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "headless_tests.rs"]
mod tests;
