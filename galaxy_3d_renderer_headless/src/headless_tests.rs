/// Unit tests for HeadlessBackend
///
/// The backend is driven directly through the RendererBackend trait,
/// without a frontend.

use super::*;
use galaxy_3d_renderer::galaxy3d::Galaxy3dError;
use galaxy_3d_renderer::galaxy3d::render::{
    ShaderStage, TextureFlags, TextureFilter, TextureRepeat, TextureType, MAX_FRAMES_IN_FLIGHT,
};
use serial_test::serial;

// ============================================================================
// Helpers
// ============================================================================

const WINDOW: WindowId = WindowId(1);

fn backend_config() -> BackendConfig {
    BackendConfig {
        application_name: "headless-tests".to_string(),
        flags: RendererConfigFlags::VSYNC_ENABLED,
        max_frames_in_flight: MAX_FRAMES_IN_FLIGHT,
    }
}

fn initialized() -> HeadlessBackend {
    let mut backend = HeadlessBackend::new();
    backend.initialize(&backend_config()).unwrap();
    backend
}

fn with_window(width: u32, height: u32) -> HeadlessBackend {
    let mut backend = initialized();
    backend.window_create(WINDOW, PhysicalSize::new(width, height)).unwrap();
    backend
}

fn colour_desc(width: u32, height: u32) -> TextureDesc {
    TextureDesc {
        texture_type: TextureType::Type2D,
        width,
        height,
        channels: 4,
        mip_levels: 1,
        array_size: 1,
        flags: TextureFlags::IS_WRITEABLE | TextureFlags::RENDER_TARGET,
    }
}

fn depth_desc(width: u32, height: u32) -> TextureDesc {
    TextureDesc {
        flags: TextureFlags::IS_WRITEABLE | TextureFlags::DEPTH | TextureFlags::STENCIL,
        ..colour_desc(width, height)
    }
}

/// Prepare, record and submit frame `frame`, then present it on WINDOW
fn run_frame(backend: &mut HeadlessBackend, frame: u16) {
    assert_eq!(backend.frame_prepare(frame).unwrap(), FrameStatus::Ready);
    assert_eq!(backend.frame_prepare_window_surface(WINDOW, frame).unwrap(), FrameStatus::Ready);
    backend.frame_commands_begin(frame).unwrap();
    backend.frame_commands_end(frame).unwrap();
    backend.frame_submit(frame).unwrap();
    backend.frame_present(WINDOW, frame).unwrap();
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
#[serial]
fn test_initialize_maps_config_flags() {
    let backend = initialized();

    assert!(backend.is_initialized());
    assert!(backend.flag_enabled_get(RendererFlags::VSYNC));
    assert!(!backend.flag_enabled_get(RendererFlags::USE_PCF));
    assert_eq!(backend.max_anisotropy_get(), 16.0);
    assert!(!backend.is_multithreaded());
}

#[test]
#[serial]
fn test_initialize_twice_fails() {
    let mut backend = initialized();
    assert!(matches!(backend.initialize(&backend_config()), Err(Galaxy3dError::BackendError(_))));
}

#[test]
#[serial]
fn test_shutdown_releases_everything() {
    let mut backend = with_window(4, 4);
    backend.renderbuffer_create("vb", RenderbufferType::Vertex, 64).unwrap();
    backend.texture_create("tex", &colour_desc(2, 2), None).unwrap();
    assert_eq!(backend.live_object_count(), 2);

    backend.shutdown();
    assert!(!backend.is_initialized());
    assert_eq!(backend.live_object_count(), 0);
    assert_eq!(backend.presented_count(WINDOW), None);
}

// ============================================================================
// Frame sequencing
// ============================================================================

#[test]
#[serial]
fn test_full_frame_is_counted() {
    let mut backend = with_window(8, 8);
    run_frame(&mut backend, 1);
    run_frame(&mut backend, 2);

    let stats = backend.counters().snapshot();
    assert_eq!(stats.frames_submitted, 2);
    assert_eq!(stats.frames_presented, 2);
    assert_eq!(backend.presented_count(WINDOW), Some(2));
    assert_eq!(backend.frame_number(), 2);
}

#[test]
#[serial]
fn test_out_of_order_calls_rejected() {
    let mut backend = with_window(8, 8);

    assert!(backend.frame_commands_begin(1).is_err());
    assert!(backend.frame_submit(1).is_err());
    assert!(backend.frame_present(WINDOW, 1).is_err());

    backend.frame_prepare(1).unwrap();
    // Wrong frame number
    assert!(backend.frame_commands_begin(2).is_err());
    backend.frame_commands_begin(1).unwrap();
    // Submit before commands end
    assert!(backend.frame_submit(1).is_err());
    // Prepare while recording
    assert!(backend.frame_prepare(2).is_err());
}

#[test]
#[serial]
fn test_frame_prepare_requires_initialize() {
    let mut backend = HeadlessBackend::new();
    assert!(backend.frame_prepare(1).is_err());
}

#[test]
#[serial]
fn test_resize_skips_next_frame() {
    let mut backend = with_window(8, 8);
    run_frame(&mut backend, 1);

    backend.window_resized(WINDOW, PhysicalSize::new(16, 16));
    assert_eq!(backend.frame_prepare(2).unwrap(), FrameStatus::Skip);
    assert_eq!(backend.counters().snapshot().frames_skipped, 1);

    // The retry with the same frame number goes through
    run_frame(&mut backend, 2);
}

#[test]
#[serial]
fn test_zero_size_window_surface_skips() {
    let mut backend = with_window(0, 0);

    assert_eq!(backend.frame_prepare(1).unwrap(), FrameStatus::Ready);
    assert_eq!(backend.frame_prepare_window_surface(WINDOW, 1).unwrap(), FrameStatus::Skip);
    assert_eq!(backend.counters().snapshot().frames_skipped, 1);
}

#[test]
#[serial]
fn test_window_lifecycle() {
    let mut backend = with_window(8, 8);
    assert!(backend.window_create(WINDOW, PhysicalSize::new(8, 8)).is_err());

    backend.window_destroy(WINDOW);
    backend.frame_prepare(1).unwrap();
    assert!(matches!(
        backend.frame_prepare_window_surface(WINDOW, 1),
        Err(Galaxy3dError::InvalidResource(_))
    ));
}

#[test]
#[serial]
fn test_begin_rendering_checks_target_kinds() {
    let mut backend = with_window(8, 8);
    let colour = backend.texture_create("colour", &colour_desc(8, 8), None).unwrap();
    let depth = backend.texture_create("depth", &depth_desc(8, 8), None).unwrap();
    let area = Rect2D::new(0, 0, 8, 8);

    backend.frame_prepare(1).unwrap();
    backend.frame_commands_begin(1).unwrap();

    assert!(matches!(backend.begin_rendering(1, area, &[depth], None), Err(Galaxy3dError::InvalidArgument(_))));
    assert!(matches!(backend.begin_rendering(1, area, &[colour], Some(colour)), Err(Galaxy3dError::InvalidArgument(_))));

    backend.begin_rendering(1, area, &[colour], Some(depth)).unwrap();
    // Commands cannot end inside a rendering scope
    assert!(backend.frame_commands_end(1).is_err());
    backend.end_rendering(1).unwrap();
    backend.frame_commands_end(1).unwrap();
}

// ============================================================================
// Renderbuffers
// ============================================================================

#[test]
#[serial]
fn test_load_copy_read() {
    let mut backend = initialized();
    let staging = backend.renderbuffer_create("staging", RenderbufferType::Staging, 16).unwrap();
    let storage = backend.renderbuffer_create("storage", RenderbufferType::Storage, 16).unwrap();

    backend.renderbuffer_load_range(staging, 0, &[1, 2, 3, 4, 5, 6, 7, 8], false).unwrap();
    backend.renderbuffer_copy_range(staging, 2, storage, 8, 4, false).unwrap();

    assert_eq!(backend.renderbuffer_read(storage, 6, 8).unwrap(), vec![0, 0, 3, 4, 5, 6, 0, 0]);

    let stats = backend.counters().snapshot();
    assert_eq!(stats.bytes_uploaded, 12);
    assert_eq!(stats.immediate_uploads, 2);
    assert_eq!(stats.renderbuffers_created, 2);
}

#[test]
#[serial]
fn test_unknown_buffer_is_invalid_resource() {
    let mut backend = initialized();
    let bogus = BackendResource(999);

    assert!(matches!(backend.renderbuffer_read(bogus, 0, 1), Err(Galaxy3dError::InvalidResource(_))));
    assert!(matches!(backend.renderbuffer_bind(bogus, 0), Err(Galaxy3dError::InvalidResource(_))));
}

#[test]
#[serial]
fn test_resize_preserves_contents() {
    let mut backend = initialized();
    let buffer = backend.renderbuffer_create("grow", RenderbufferType::Storage, 4).unwrap();
    backend.renderbuffer_load_range(buffer, 0, &[7; 4], false).unwrap();

    backend.renderbuffer_resize(buffer, 4, 12).unwrap();
    assert_eq!(backend.renderbuffer_read(buffer, 0, 12).unwrap(), [vec![7; 4], vec![0; 8]].concat());
    assert!(backend.renderbuffer_resize(buffer, 4, 16).is_err());
}

#[test]
#[serial]
fn test_flush_requires_mapping() {
    let mut backend = initialized();
    let buffer = backend.renderbuffer_create("mapped", RenderbufferType::Staging, 64).unwrap();

    assert!(backend.renderbuffer_flush(buffer, 0, 16).is_err());
    backend.renderbuffer_map_memory(buffer, 0, 32).unwrap();
    backend.renderbuffer_flush(buffer, 8, 16).unwrap();
    backend.renderbuffer_unmap_memory(buffer, 0, 32);
    assert!(backend.renderbuffer_flush(buffer, 8, 16).is_err());
}

#[test]
#[serial]
fn test_indexed_draw_needs_bound_vertex_buffer() {
    let mut backend = with_window(8, 8);
    let vertices = backend.renderbuffer_create("vb", RenderbufferType::Vertex, 256).unwrap();
    let indices = backend.renderbuffer_create("ib", RenderbufferType::Index, 24).unwrap();

    backend.frame_prepare(1).unwrap();
    backend.frame_commands_begin(1).unwrap();

    assert!(backend.renderbuffer_draw(indices, 0, 3, true).is_err());
    backend.renderbuffer_bind(vertices, 0).unwrap();
    backend.renderbuffer_draw(indices, 0, 6, true).unwrap();
    // 7 indices do not fit in 24 bytes
    assert!(matches!(backend.renderbuffer_draw(indices, 0, 7, true), Err(Galaxy3dError::InvalidArgument(_))));

    let stats = backend.counters().snapshot();
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.elements_drawn, 6);
}

#[test]
#[serial]
fn test_draw_outside_frame_rejected() {
    let mut backend = with_window(8, 8);
    let vertices = backend.renderbuffer_create("vb", RenderbufferType::Vertex, 256).unwrap();
    let uniforms = backend.renderbuffer_create("ub", RenderbufferType::Uniform, 256).unwrap();

    assert!(backend.renderbuffer_draw(vertices, 0, 3, true).is_err());
    // Out of the frame workload the draw is executed immediately
    backend.renderbuffer_draw(vertices, 0, 3, false).unwrap();
    assert!(matches!(backend.renderbuffer_draw(uniforms, 0, 3, false), Err(Galaxy3dError::InvalidArgument(_))));
}

// ============================================================================
// Textures
// ============================================================================

#[test]
#[serial]
fn test_texture_write_and_read_pixel() {
    let mut backend = initialized();
    let texture = backend.texture_create("tex", &colour_desc(2, 2), None).unwrap();

    backend.texture_write_data(texture, 12, &[10, 20, 30, 40], false).unwrap();
    assert_eq!(backend.texture_read_pixel(texture, 1, 1).unwrap(), [10, 20, 30, 40]);
    assert_eq!(backend.texture_read_data(texture, 0, 4).unwrap(), vec![0; 4]);
    assert!(backend.texture_write_data(texture, 14, &[0; 4], false).is_err());
}

#[test]
#[serial]
fn test_clears_follow_dynamic_state() {
    let mut backend = initialized();
    let colour = backend.texture_create("colour", &colour_desc(2, 2), None).unwrap();
    let depth = backend.texture_create("depth", &depth_desc(2, 2), None).unwrap();

    backend.clear_colour_set(Vec4::new(1.0, 0.0, 0.5, 1.0));
    backend.clear_colour(colour).unwrap();
    assert_eq!(backend.texture_read_pixel(colour, 1, 0).unwrap(), [255, 0, 128, 255]);

    backend.clear_depth_set(1.0);
    backend.clear_stencil_set(0x1_07);
    backend.clear_depth_stencil(depth).unwrap();
    assert_eq!(backend.texture_read_pixel(depth, 0, 1).unwrap(), [255, 7, 0, 0]);

    assert!(backend.clear_colour(depth).is_err());
    assert!(backend.clear_depth_stencil(colour).is_err());
}

#[test]
#[serial]
fn test_texture_resize_resets_contents() {
    let mut backend = initialized();
    let texture = backend.texture_create("tex", &colour_desc(2, 2), Some(&[9; 16])).unwrap();

    backend.texture_resize(texture, 4, 4).unwrap();
    assert_eq!(backend.texture_read_data(texture, 0, 64).unwrap(), vec![0; 64]);
    assert!(backend.texture_resize(texture, 0, 4).is_err());
    assert_eq!(backend.counters().snapshot().textures_created, 1);
}

// ============================================================================
// Samplers and shaders
// ============================================================================

#[test]
#[serial]
fn test_sampler_anisotropy_limit() {
    let mut backend = initialized();
    let desc = SamplerDesc::uniform(TextureFilter::Linear, TextureRepeat::Repeat, 16.0);
    let sampler = backend.sampler_create("ok", &desc).unwrap();

    let too_much = SamplerDesc::uniform(TextureFilter::Linear, TextureRepeat::Repeat, 32.0);
    assert!(backend.sampler_create("bad", &too_much).is_err());
    assert!(backend.sampler_refresh(sampler, &too_much).is_err());
    assert!(matches!(backend.sampler_refresh(BackendResource(999), &desc), Err(Galaxy3dError::InvalidResource(_))));
}

#[test]
#[serial]
fn test_shader_uniforms_applied_per_set() {
    let mut backend = initialized();
    let config = ShaderConfig::new("unlit")
        .with_stage(ShaderStage::Vertex, vec![0x03, 0x02, 0x23, 0x07])
        .with_stage(ShaderStage::Fragment, vec![0x03, 0x02, 0x23, 0x07])
        .with_uniform("projection", ShaderUpdateFrequency::PerFrame, 8)
        .with_uniform("diffuse", ShaderUpdateFrequency::PerGroup, 4);
    let shader = backend.shader_create(&config).unwrap();
    backend.shader_use(shader).unwrap();

    backend.shader_uniform_set(shader, ShaderUpdateFrequency::PerFrame, 0, &[1; 8]).unwrap();
    backend.shader_apply(shader, ShaderUpdateFrequency::PerFrame).unwrap();
    assert_eq!(backend.applied_uniform(shader, ShaderUpdateFrequency::PerFrame, 0, 0), Some(&[1u8; 8][..]));

    let group = backend.shader_resources_acquire(shader, ShaderUpdateFrequency::PerGroup).unwrap();
    backend.shader_bind(shader, ShaderUpdateFrequency::PerGroup, group).unwrap();
    backend.shader_uniform_set(shader, ShaderUpdateFrequency::PerGroup, 1, &[5; 4]).unwrap();
    backend.shader_apply(shader, ShaderUpdateFrequency::PerGroup).unwrap();
    assert_eq!(backend.applied_uniform(shader, ShaderUpdateFrequency::PerGroup, group, 1), Some(&[5u8; 4][..]));

    backend.shader_resources_release(shader, ShaderUpdateFrequency::PerGroup, group);
    assert!(backend.shader_bind(shader, ShaderUpdateFrequency::PerGroup, group).is_err());
}

#[test]
#[serial]
fn test_shader_reload_keeps_uniform_layout() {
    let mut backend = initialized();
    let config = ShaderConfig::new("lit")
        .with_stage(ShaderStage::Vertex, vec![1])
        .with_uniform("model", ShaderUpdateFrequency::PerDraw, 64);
    let shader = backend.shader_create(&config).unwrap();

    let new_code = ShaderConfig::new("lit")
        .with_stage(ShaderStage::Vertex, vec![2])
        .with_uniform("model", ShaderUpdateFrequency::PerDraw, 64);
    backend.shader_reload(shader, &new_code).unwrap();

    let new_layout = ShaderConfig::new("lit")
        .with_stage(ShaderStage::Vertex, vec![2])
        .with_uniform("model", ShaderUpdateFrequency::PerDraw, 16);
    assert!(matches!(backend.shader_reload(shader, &new_layout), Err(Galaxy3dError::InvalidArgument(_))));

    // Invalid configurations never reach the shader table
    assert!(backend.shader_create(&ShaderConfig::new("empty")).is_err());
}

// ============================================================================
// Dynamic state
// ============================================================================

#[test]
#[serial]
fn test_dynamic_state_recorded() {
    let mut backend = initialized();
    assert_eq!(*backend.dynamic_state(), DynamicState::default());

    backend.winding_set(Winding::Clockwise);
    backend.cull_mode_set(CullMode::None);
    backend.viewport_set(Viewport::from_rect(Vec4::new(0.0, 0.0, 640.0, 480.0)));
    backend.scissor_set(Rect2D::new(10, 10, 100, 100));
    backend.depth_write_enable(false);

    let state = backend.dynamic_state();
    assert_eq!(state.winding, Winding::Clockwise);
    assert_eq!(state.cull_mode, CullMode::None);
    assert_eq!(state.viewport.width, 640.0);
    assert_eq!(state.scissor, Rect2D::new(10, 10, 100, 100));
    assert!(!state.depth_write);
}
