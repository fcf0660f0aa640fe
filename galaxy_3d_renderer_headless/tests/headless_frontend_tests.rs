//! Integration tests: RendererFrontend running on the headless backend
//!
//! The backend keeps real bytes, so every upload, clear and copy issued
//! through the frontend is checked by reading it back.

use std::sync::Arc;

use galaxy_3d_renderer::galaxy3d::render::{
    BackendPluginRegistry, DefaultTexture, Geometry, RenderbufferTrackType, RenderbufferType, RendererConfig,
    RendererConfigFlags, RendererFlags, ShaderStage, ShaderUpdateFrequency, ShaderConfig, TextureDesc,
    TextureFlags, TextureType, Vertex3d, WindowId, FrameStatus,
};
use galaxy_3d_renderer::galaxy3d::{Galaxy3dError, FrameData, KvarChanged, KvarValue, RendererFrontend};
use galaxy_3d_renderer::glam::{Mat4, Vec2, Vec3, Vec4};
use galaxy_3d_renderer::winit::dpi::PhysicalSize;
use galaxy_3d_renderer_headless::HeadlessCounters;
use serial_test::serial;

// ============================================================================
// Helpers
// ============================================================================

const WINDOW: WindowId = WindowId(1);

fn config() -> RendererConfig {
    RendererConfig {
        application_name: "headless-frontend-tests".to_string(),
        backend_plugin: galaxy_3d_renderer_headless::PLUGIN_NAME.to_string(),
        flags: RendererConfigFlags::USE_PCF,
        vertex_buffer_size: 64 * 1024,
        index_buffer_size: 16 * 1024,
        material_storage_size: 16 * 1024,
    }
}

fn setup() -> (Arc<HeadlessCounters>, RendererFrontend) {
    let mut registry = BackendPluginRegistry::new();
    let counters = galaxy_3d_renderer_headless::register(&mut registry);
    let renderer = RendererFrontend::new(config(), &registry).unwrap();
    (counters, renderer)
}

fn setup_with_window(width: u32, height: u32) -> (Arc<HeadlessCounters>, RendererFrontend) {
    let (counters, mut renderer) = setup();
    renderer.on_window_created(WINDOW, PhysicalSize::new(width, height)).unwrap();
    (counters, renderer)
}

fn triangle(name: &str) -> Geometry {
    let vertices = [
        Vertex3d::new(Vec3::new(-0.5, -0.5, 0.0), Vec2::new(0.0, 0.0)),
        Vertex3d::new(Vec3::new(0.5, -0.5, 0.0), Vec2::new(1.0, 0.0)),
        Vertex3d::new(Vec3::new(0.0, 0.5, 0.0), Vec2::new(0.5, 1.0)),
    ];
    Geometry::from_vertices(name, &vertices, vec![0, 1, 2])
}

/// Run one full frame; the closure records commands between begin and end
fn run_frame<F>(renderer: &mut RendererFrontend, frame_data: &mut FrameData, record: F) -> FrameStatus
where
    F: FnOnce(&mut RendererFrontend, &FrameData),
{
    let status = renderer.frame_prepare(frame_data).unwrap();
    if status == FrameStatus::Skip {
        return status;
    }
    renderer.begin(frame_data).unwrap();
    record(renderer, frame_data);
    renderer.end(frame_data).unwrap();
    renderer.present(frame_data).unwrap();
    status
}

// ============================================================================
// Startup
// ============================================================================

#[test]
#[serial]
fn test_startup_creates_buffers_and_default_textures() {
    let (counters, mut renderer) = setup();
    let stats = counters.snapshot();

    assert_eq!(stats.renderbuffers_created, 3);
    assert_eq!(stats.textures_created, DefaultTexture::COUNT as u64);
    assert!(renderer.flag_enabled_get(RendererFlags::USE_PCF));
    assert!(!renderer.flag_enabled_get(RendererFlags::VSYNC));

    let base = renderer.default_texture_get(DefaultTexture::Base);
    assert_eq!(renderer.texture_read_pixel(base, 3, 7).unwrap(), [255; 4]);
    let normal = renderer.default_texture_get(DefaultTexture::Normal);
    assert_eq!(renderer.texture_read_pixel(normal, 0, 0).unwrap(), [128, 128, 255, 255]);

    let checker = renderer.default_texture_get(DefaultTexture::Default);
    assert_eq!(renderer.texture_read_pixel(checker, 0, 0).unwrap(), [255, 0, 255, 255]);
    assert_eq!(renderer.texture_read_pixel(checker, 1, 0).unwrap(), [255, 255, 255, 255]);
}

#[test]
#[serial]
fn test_unknown_plugin_fails_initialization() {
    let mut registry = BackendPluginRegistry::new();
    galaxy_3d_renderer_headless::register(&mut registry);

    let config = RendererConfig { backend_plugin: "vulkan".to_string(), ..config() };
    assert!(matches!(RendererFrontend::new(config, &registry), Err(Galaxy3dError::InitializationFailed(_))));
}

#[test]
#[serial]
fn test_global_buffer_sizes_follow_config() {
    let mut registry = BackendPluginRegistry::new();
    galaxy_3d_renderer_headless::register(&mut registry);

    let config = RendererConfig { vertex_buffer_size: 1 << 20, ..config() };
    let mut renderer = RendererFrontend::new(config, &registry).unwrap();
    assert_eq!(renderer.renderbuffer_free_space(renderer.vertex_buffer()).unwrap(), 1 << 20);
    assert_eq!(renderer.renderbuffer_free_space(renderer.index_buffer()).unwrap(), 16 * 1024);
    renderer.shutdown();
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
#[serial]
fn test_geometry_upload_lands_in_global_buffers() {
    let (counters, mut renderer) = setup();
    let mut geometry = triangle("tri");

    renderer.geometry_upload(&mut geometry).unwrap();
    assert!(geometry.is_uploaded());

    let vertices = renderer
        .renderbuffer_read(renderer.vertex_buffer(), geometry.vertex_buffer_offset, geometry.vertex_size())
        .unwrap();
    assert_eq!(vertices, geometry.vertices);

    let indices = renderer
        .renderbuffer_read(renderer.index_buffer(), geometry.index_buffer_offset, geometry.index_size())
        .unwrap();
    assert_eq!(indices, bytemuck::cast_slice::<u32, u8>(&geometry.indices).to_vec());

    let stats = counters.snapshot();
    assert_eq!(stats.bytes_uploaded, geometry.vertex_size() + geometry.index_size() + textures_bytes());
}

/// Bytes uploaded at startup by the default textures
fn textures_bytes() -> u64 {
    DefaultTexture::ALL.iter().map(|kind| kind.built_in().1.len() as u64).sum()
}

#[test]
#[serial]
fn test_geometry_vertex_update_patches_buffer() {
    let (_counters, mut renderer) = setup();
    let mut geometry = triangle("tri");
    renderer.geometry_upload(&mut geometry).unwrap();
    let generation = geometry.generation;

    let moved = Vertex3d::new(Vec3::new(0.0, 1.0, 0.0), Vec2::new(0.5, 1.0));
    let bytes = bytemuck::bytes_of(&moved).to_vec();
    let stride = geometry.vertex_element_size as u64;
    renderer.geometry_vertex_update(&mut geometry, 2 * stride, &bytes).unwrap();

    assert_ne!(geometry.generation, generation);
    let stored = renderer
        .renderbuffer_read(renderer.vertex_buffer(), geometry.vertex_buffer_offset + 2 * stride, stride)
        .unwrap();
    assert_eq!(stored, bytes);
}

#[test]
#[serial]
fn test_geometry_draw_counted_by_backend() {
    let (counters, mut renderer) = setup_with_window(32, 32);
    let mut frame_data = FrameData::new(1024);
    let mut geometry = triangle("tri");
    renderer.geometry_upload(&mut geometry).unwrap();

    let data = geometry.render_data(Mat4::IDENTITY, 0);
    run_frame(&mut renderer, &mut frame_data, |renderer, _| {
        renderer.geometry_draw(&data).unwrap();
        renderer.geometry_draw(&data).unwrap();
    });

    let stats = counters.snapshot();
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.elements_drawn, 6);
    assert_eq!(stats.frames_presented, 1);
    assert_eq!(renderer.stats().triangles, 2);
}

#[test]
#[serial]
fn test_destroyed_geometry_range_reused_after_three_frames() {
    let (_counters, mut renderer) = setup_with_window(16, 16);
    let mut frame_data = FrameData::new(1024);

    let mut first = triangle("first");
    renderer.geometry_upload(&mut first).unwrap();
    let offset = first.vertex_buffer_offset;
    renderer.geometry_destroy(&mut first).unwrap();

    let mut second = triangle("second");
    renderer.geometry_upload(&mut second).unwrap();
    assert_ne!(second.vertex_buffer_offset, offset);

    for _ in 0..3 {
        run_frame(&mut renderer, &mut frame_data, |_, _| {});
    }
    let mut third = triangle("third");
    renderer.geometry_upload(&mut third).unwrap();
    assert_eq!(third.vertex_buffer_offset, offset);
}

#[test]
#[serial]
fn test_grown_geometry_cannot_overwrite_neighbour() {
    let (_counters, mut renderer) = setup_with_window(16, 16);
    let mut frame_data = FrameData::new(1024);

    let mut a = Geometry::new("a", 16, vec![0xAA; 16], Vec::new());
    let mut b = Geometry::new("b", 16, vec![0xBB; 16], Vec::new());
    renderer.geometry_upload(&mut a).unwrap();
    renderer.geometry_upload(&mut b).unwrap();
    assert_eq!((a.vertex_buffer_offset, b.vertex_buffer_offset), (0, 16));

    a.vertices = vec![0xCC; 32];
    assert!(matches!(renderer.geometry_upload(&mut a), Err(Galaxy3dError::InvalidArgument(_))));
    let stored = renderer.renderbuffer_read(renderer.vertex_buffer(), 16, 16).unwrap();
    assert_eq!(stored, vec![0xBB; 16]);

    // Only the 16 bytes reserved for `a` come back to the freelist
    renderer.geometry_destroy(&mut a).unwrap();
    for _ in 0..3 {
        run_frame(&mut renderer, &mut frame_data, |_, _| {});
    }
    let offset = renderer.renderbuffer_allocate(renderer.vertex_buffer(), 32).unwrap();
    assert!(offset >= 32);
    assert_eq!(renderer.renderbuffer_allocate(renderer.vertex_buffer(), 16).unwrap(), 0);
}

// ============================================================================
// Renderbuffers
// ============================================================================

#[test]
#[serial]
fn test_renderbuffer_clear_zeroes_contents() {
    let (_counters, mut renderer) = setup();
    let buffer = renderer
        .renderbuffer_create("scratch", RenderbufferType::Storage, 256, RenderbufferTrackType::Linear)
        .unwrap();
    renderer.renderbuffer_load_range(buffer, 0, &[0xAB; 256], false).unwrap();
    assert_eq!(renderer.renderbuffer_allocate(buffer, 64).unwrap(), 0);

    renderer.renderbuffer_clear(buffer, true).unwrap();
    assert_eq!(renderer.renderbuffer_read(buffer, 0, 256).unwrap(), vec![0; 256]);
    assert_eq!(renderer.renderbuffer_allocate(buffer, 64).unwrap(), 0);
}

#[test]
#[serial]
fn test_renderbuffer_resize_keeps_contents() {
    let (_counters, mut renderer) = setup();
    let buffer = renderer
        .renderbuffer_create("growing", RenderbufferType::Storage, 128, RenderbufferTrackType::Freelist)
        .unwrap();
    renderer.renderbuffer_load_range(buffer, 120, &[1, 2, 3, 4, 5, 6, 7, 8], false).unwrap();

    renderer.renderbuffer_resize(buffer, 512).unwrap();
    assert_eq!(renderer.renderbuffer_read(buffer, 120, 8).unwrap(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(renderer.renderbuffer_free_space(buffer).unwrap(), 512);
    assert!(renderer.renderbuffer_resize(buffer, 256).is_err());
}

#[test]
#[serial]
fn test_renderbuffer_copy_between_buffers() {
    let (_counters, mut renderer) = setup();
    let staging = renderer
        .renderbuffer_create("staging", RenderbufferType::Staging, 64, RenderbufferTrackType::None)
        .unwrap();
    let target = renderer
        .renderbuffer_create("target", RenderbufferType::Storage, 64, RenderbufferTrackType::None)
        .unwrap();

    let payload: Vec<u8> = (0..16).collect();
    renderer.renderbuffer_load_range(staging, 0, &payload, false).unwrap();
    renderer.renderbuffer_copy_range(staging, 0, target, 32, 16, false).unwrap();

    assert_eq!(renderer.renderbuffer_read(target, 32, 16).unwrap(), payload);
    assert!(renderer.renderbuffer_copy_range(staging, 56, target, 0, 16, false).is_err());
}

// ============================================================================
// Textures
// ============================================================================

#[test]
#[serial]
fn test_texture_data_round_trips_through_backend() {
    let (_counters, mut renderer) = setup();
    let desc = TextureDesc {
        texture_type: TextureType::Type2D,
        width: 4,
        height: 4,
        channels: 4,
        mip_levels: 1,
        array_size: 1,
        flags: TextureFlags::IS_WRITEABLE,
    };
    let texture = renderer.texture_create("streamed", desc, None).unwrap();

    renderer.texture_write_data(texture, 4 * 4 * 2, &[9, 8, 7, 6], true).unwrap();
    assert_eq!(renderer.texture_read_pixel(texture, 0, 2).unwrap(), [9, 8, 7, 6]);
    assert_eq!(renderer.texture_read_data(texture, 32, 4).unwrap(), vec![9, 8, 7, 6]);
}

#[test]
#[serial]
fn test_window_targets_cleared_through_frontend() {
    let (_counters, mut renderer) = setup_with_window(8, 8);
    let colour = renderer.window_colour_target(WINDOW);
    let depth = renderer.window_depth_target(WINDOW);

    renderer.clear_colour_set(Vec4::new(0.0, 1.0, 0.0, 1.0));
    renderer.clear_colour_texture(colour).unwrap();
    assert_eq!(renderer.texture_read_pixel(colour, 7, 7).unwrap(), [0, 255, 0, 255]);

    renderer.clear_depth_set(0.0);
    renderer.clear_stencil_set(3);
    renderer.clear_depth_stencil(depth).unwrap();
    assert_eq!(renderer.texture_read_pixel(depth, 4, 4).unwrap(), [0, 3, 0, 0]);

    assert!(matches!(renderer.clear_colour_texture(depth), Err(Galaxy3dError::InvalidArgument(_))));
}

// ============================================================================
// Shaders
// ============================================================================

#[test]
#[serial]
fn test_shader_group_uniforms_through_frontend() {
    let (_counters, mut renderer) = setup();
    let config = ShaderConfig::new("material")
        .with_stage(ShaderStage::Vertex, vec![0x03, 0x02, 0x23, 0x07])
        .with_stage(ShaderStage::Fragment, vec![0x03, 0x02, 0x23, 0x07])
        .with_uniform("view_projection", ShaderUpdateFrequency::PerFrame, 64)
        .with_uniform("diffuse_colour", ShaderUpdateFrequency::PerGroup, 16);
    let shader = renderer.shader_create(config).unwrap();
    renderer.shader_use(shader).unwrap();

    let group = renderer.shader_per_group_acquire(shader).unwrap();
    renderer.shader_bind(shader, ShaderUpdateFrequency::PerGroup, group).unwrap();

    let index = renderer.shader_uniform_index(shader, "diffuse_colour").unwrap();
    let colour = Vec4::new(1.0, 0.5, 0.25, 1.0);
    renderer.shader_uniform_set(shader, index, bytemuck::bytes_of(&colour)).unwrap();
    renderer.shader_apply(shader, ShaderUpdateFrequency::PerGroup).unwrap();

    // Wrong size is refused before it reaches the backend
    assert!(renderer.shader_uniform_set(shader, index, &[0; 4]).is_err());

    renderer.shader_per_group_release(shader, group).unwrap();
    assert!(renderer.shader_bind(shader, ShaderUpdateFrequency::PerGroup, group).is_err());
}

// ============================================================================
// Windows and frames
// ============================================================================

#[test]
#[serial]
fn test_frames_present_on_every_window() {
    let (counters, mut renderer) = setup_with_window(16, 16);
    renderer.on_window_created(WindowId(2), PhysicalSize::new(32, 32)).unwrap();
    let mut frame_data = FrameData::new(1024);

    for _ in 0..4 {
        assert_eq!(run_frame(&mut renderer, &mut frame_data, |_, _| {}), FrameStatus::Ready);
    }

    let stats = counters.snapshot();
    assert_eq!(stats.frames_submitted, 4);
    assert_eq!(stats.frames_presented, 8);
    assert_eq!(frame_data.renderer_frame_number, 4);
}

#[test]
#[serial]
fn test_resize_skips_one_frame_and_resizes_targets() {
    let (counters, mut renderer) = setup_with_window(16, 16);
    let mut frame_data = FrameData::new(1024);
    run_frame(&mut renderer, &mut frame_data, |_, _| {});

    renderer.on_window_resized(WINDOW, PhysicalSize::new(40, 30)).unwrap();
    let colour = renderer.window_colour_target(WINDOW);
    let desc = renderer.texture_info(colour).unwrap();
    assert_eq!((desc.width, desc.height), (40, 30));
    assert!(renderer.texture_read_pixel(colour, 39, 29).is_ok());

    assert_eq!(run_frame(&mut renderer, &mut frame_data, |_, _| {}), FrameStatus::Skip);
    assert_eq!(renderer.frame_number(), 1);
    assert_eq!(run_frame(&mut renderer, &mut frame_data, |_, _| {}), FrameStatus::Ready);
    assert_eq!(renderer.frame_number(), 2);

    let stats = counters.snapshot();
    assert_eq!(stats.frames_skipped, 1);
    assert_eq!(stats.frames_presented, 2);
}

#[test]
#[serial]
fn test_minimized_window_skips_until_restored() {
    let (counters, mut renderer) = setup_with_window(0, 0);
    let mut frame_data = FrameData::new(1024);

    // Targets exist at 1x1 even though the surface has no size
    let colour = renderer.window_colour_target(WINDOW);
    assert_eq!(renderer.texture_info(colour).unwrap().width, 1);

    assert_eq!(run_frame(&mut renderer, &mut frame_data, |_, _| {}), FrameStatus::Skip);
    renderer.on_window_resized(WINDOW, PhysicalSize::new(0, 0)).unwrap();
    assert_eq!(run_frame(&mut renderer, &mut frame_data, |_, _| {}), FrameStatus::Skip);

    renderer.on_window_resized(WINDOW, PhysicalSize::new(8, 8)).unwrap();
    // The resize itself costs one skipped frame
    assert_eq!(run_frame(&mut renderer, &mut frame_data, |_, _| {}), FrameStatus::Skip);
    assert_eq!(run_frame(&mut renderer, &mut frame_data, |_, _| {}), FrameStatus::Ready);
    assert_eq!(counters.snapshot().frames_presented, 1);
}

#[test]
#[serial]
fn test_rendering_scope_on_window_targets() {
    let (_counters, mut renderer) = setup_with_window(8, 8);
    let mut frame_data = FrameData::new(1024);
    let colour = renderer.window_colour_target(WINDOW);
    let depth = renderer.window_depth_target(WINDOW);

    run_frame(&mut renderer, &mut frame_data, |renderer, frame_data| {
        let area = Vec4::new(0.0, 0.0, 8.0, 8.0);
        renderer.begin_rendering(frame_data, area, &[colour], Some(depth)).unwrap();
        renderer.end_rendering(frame_data).unwrap();

        // A depth texture cannot be a colour target
        assert!(renderer.begin_rendering(frame_data, area, &[depth], None).is_err());
    });
}

#[test]
#[serial]
fn test_use_pcf_kvar_reaches_backend() {
    let (_counters, mut renderer) = setup();
    assert!(renderer.on_kvar_changed(&KvarChanged::new("use_pcf", KvarValue::Int(0))));
    assert!(!renderer.flag_enabled_get(RendererFlags::USE_PCF));
    assert!(!renderer.on_kvar_changed(&KvarChanged::new("vsync", KvarValue::Int(1))));
}

#[test]
#[serial]
fn test_shutdown_releases_backend_objects() {
    let (counters, mut renderer) = setup_with_window(8, 8);
    let mut frame_data = FrameData::new(1024);
    run_frame(&mut renderer, &mut frame_data, |_, _| {});

    renderer.shutdown();
    renderer.shutdown();
    assert_eq!(counters.snapshot().frames_presented, 1);
}
