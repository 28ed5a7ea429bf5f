/// Tests for RenderSystem
///
/// Drives full frames against MockGraphicsDevice: slot allocation,
/// batching by pipeline, the recorded draw stream, frame-index
/// advancement, and the bounded fence wait.

use super::*;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::pipeline::{PipelineFamily, PipelineLayoutType};
use crate::render::render_pass_manager::RenderPassManager;
use crate::resource::asset::new_asset_id;
use crate::resource::{
    AssetSetting, MaterialSetting, MeshSetting, PipelineLayoutSetting, PipelineSetting,
    ShaderSource,
};
use glam::Mat4;

fn setup() -> (Arc<MockGraphicsDevice>, Arc<RenderPassManager>, ResourceManager) {
    let device = Arc::new(MockGraphicsDevice::new());
    let device_dyn: Arc<dyn GraphicsDevice> = device.clone();
    let render_passes = Arc::new(RenderPassManager::new(&device_dyn, Log::disabled()).unwrap());
    let resources = ResourceManager::with_default_managers(
        Arc::clone(&device_dyn),
        Arc::clone(&render_passes),
        Log::disabled(),
    )
    .unwrap();
    (device, render_passes, resources)
}

fn render_system(
    device: &Arc<MockGraphicsDevice>,
    render_passes: &RenderPassManager,
    frame_count: u32,
) -> RenderSystem {
    let device_dyn: Arc<dyn GraphicsDevice> = Arc::clone(device) as Arc<dyn GraphicsDevice>;
    RenderSystem::new(
        device_dyn,
        render_passes,
        Log::disabled(),
        RenderSystemConfig {
            frame_count: Some(frame_count),
            width: 640,
            height: 480,
        },
    )
    .unwrap()
}

/// Create layout + pipeline + mesh (36 indices) + material
fn create_scene_assets(resources: &mut ResourceManager) -> (AssetId, AssetId) {
    resources
        .create_asset(AssetSetting::PipelineLayout(PipelineLayoutSetting {
            name: "pbr_layout".to_string(),
            layout_type: PipelineLayoutType::Pbr,
        }))
        .unwrap();
    let pipeline = resources
        .create_asset(AssetSetting::Pipeline(PipelineSetting {
            name: "forward_pbr".to_string(),
            vertex_shader: ShaderSource::SpirvBytes(vec![0u8; 16]),
            fragment_shader: Some(ShaderSource::SpirvBytes(vec![0u8; 16])),
            ..Default::default()
        }))
        .unwrap();
    let mesh = resources
        .create_asset(AssetSetting::Mesh(MeshSetting {
            name: "cube".to_string(),
            vertex_buffer_size: 1024,
            index_buffer_size: 256,
            vertex_stride: 32,
            ..Default::default()
        }))
        .unwrap();
    resources
        .write_mesh(mesh, &vec![0u8; 24 * 32], &vec![0u8; 36 * 4])
        .unwrap();
    let material = resources
        .create_asset(AssetSetting::Material(MaterialSetting {
            name: "default".to_string(),
            pipeline,
            textures: Vec::new(),
            params: Vec::new(),
        }))
        .unwrap();
    (mesh, material)
}

fn renderable(mesh: AssetId, material: AssetId) -> Renderable {
    Renderable {
        mesh,
        material,
        transform: Mat4::IDENTITY,
    }
}

// ============================================================================
// Tests: Init
// ============================================================================

#[test]
fn test_init_allocates_one_slot_per_frame() {
    let (device, render_passes, _resources) = setup();
    let system = render_system(&device, &render_passes, 2);

    assert_eq!(system.frame_count(), 2);
    assert_eq!(system.current_frame_index(), 0);
    // Color + depth target per slot
    let textures = device.get_created_textures();
    assert_eq!(textures.iter().filter(|t| t.contains("640x480")).count(), 4);
    assert!(system.render_finished_semaphore(0).is_some());
    assert!(system.render_finished_semaphore(1).is_some());
    assert!(system.render_finished_semaphore(2).is_none());
}

#[test]
fn test_init_defaults_to_device_image_count() {
    let device = Arc::new(MockGraphicsDevice::with_image_count(3));
    let device_dyn: Arc<dyn GraphicsDevice> = device.clone();
    let render_passes = RenderPassManager::new(&device_dyn, Log::disabled()).unwrap();

    let system = RenderSystem::new(
        device_dyn,
        &render_passes,
        Log::disabled(),
        RenderSystemConfig::default(),
    )
    .unwrap();

    assert_eq!(system.frame_count(), 3);
}

// ============================================================================
// Tests: Empty-scene frames
// ============================================================================

#[test]
fn test_update_with_zero_entities_advances_frame_index() {
    let (device, render_passes, resources) = setup();
    let mut system = render_system(&device, &render_passes, 2);

    for expected in [1usize, 0, 1, 0] {
        system.update(&[], &resources, None).unwrap();
        assert_eq!(system.current_frame_index(), expected);
    }

    // Four clear-only frames were submitted, none drew anything
    assert_eq!(device.get_submit_count(), 4);
    assert!(!device.get_commands().iter().any(|c| c.starts_with("draw")));
}

#[test]
fn test_empty_frame_still_records_clear_pass() {
    let (device, render_passes, resources) = setup();
    let mut system = render_system(&device, &render_passes, 2);
    device.clear_commands();

    system.update(&[], &resources, None).unwrap();

    let commands = device.get_commands();
    assert!(commands.iter().any(|c| c == "begin_render_pass"));
    assert!(commands.iter().any(|c| c == "end_render_pass"));
    assert_eq!(system.frame_stats().draw_calls, 0);
    assert_eq!(system.frame_stats().batches, 0);
}

// ============================================================================
// Tests: Draw dispatch
// ============================================================================

#[test]
fn test_single_entity_issues_one_indexed_draw() {
    let (device, render_passes, mut resources) = setup();
    let (mesh, material) = create_scene_assets(&mut resources);
    let mut system = render_system(&device, &render_passes, 2);
    device.clear_commands();

    system.update(&[renderable(mesh, material)], &resources, None).unwrap();

    let commands = device.get_commands();
    let draws: Vec<&String> = commands.iter().filter(|c| c.starts_with("draw_indexed")).collect();
    // Exactly one indexed draw with the mesh's 36 indices
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0], &"draw_indexed(36, 0, 0)".to_string());
    assert_eq!(system.frame_stats().draw_calls, 1);
    assert_eq!(system.frame_stats().batches, 1);
}

#[test]
fn test_draw_stream_order() {
    let (device, render_passes, mut resources) = setup();
    let (mesh, material) = create_scene_assets(&mut resources);
    let mut system = render_system(&device, &render_passes, 2);
    device.clear_commands();

    system.update(&[renderable(mesh, material)], &resources, None).unwrap();

    let commands = device.get_commands();
    let position = |needle: &str| {
        commands
            .iter()
            .position(|c| c.contains(needle))
            .unwrap_or_else(|| panic!("'{}' missing from {:?}", needle, commands))
    };
    assert!(position("begin_render_pass") < position("bind_pipeline"));
    assert!(position("bind_pipeline") < position("bind_vertex_buffer"));
    assert!(position("bind_vertex_buffer") < position("draw_indexed"));
    assert!(position("draw_indexed") < position("end_render_pass"));
    assert!(position("end_render_pass") < position("submit"));
    // Viewport and scissor come from the frame extent
    assert!(commands.iter().any(|c| c == "set_viewport(640x480)"));
    assert!(commands.iter().any(|c| c == "set_scissor(640x480)"));
    // The 64-byte transform push
    assert!(commands.iter().any(|c| c == "push_constants(offset 0, 64 bytes)"));
}

#[test]
fn test_entities_sharing_a_pipeline_form_one_batch() {
    let (device, render_passes, mut resources) = setup();
    let (mesh, material) = create_scene_assets(&mut resources);
    let mut system = render_system(&device, &render_passes, 2);

    let entities = [
        renderable(mesh, material),
        renderable(mesh, material),
        renderable(mesh, material),
    ];
    system.update(&entities, &resources, None).unwrap();

    assert_eq!(system.frame_stats().batches, 1);
    assert_eq!(system.frame_stats().draw_calls, 3);
    let binds = device
        .get_commands()
        .iter()
        .filter(|c| *c == "bind_pipeline")
        .count();
    assert_eq!(binds, 1);
}

#[test]
fn test_unresolvable_material_is_skipped_with_no_error() {
    let (device, render_passes, mut resources) = setup();
    let (mesh, material) = create_scene_assets(&mut resources);
    let mut system = render_system(&device, &render_passes, 2);

    let entities = [
        renderable(mesh, material),
        renderable(mesh, new_asset_id()),
    ];
    system.update(&entities, &resources, None).unwrap();

    assert_eq!(system.frame_stats().draw_calls, 1);
    assert_eq!(system.frame_stats().skipped_entities, 1);
}

#[test]
fn test_entities_targeting_undriven_pass_kind_are_skipped() {
    let (device, render_passes, mut resources) = setup();
    let (mesh, _material) = create_scene_assets(&mut resources);

    // A material whose pipeline targets the deferred pass, which the
    // render system does not drive
    resources
        .create_asset(AssetSetting::PipelineLayout(PipelineLayoutSetting {
            name: "gbuffer_layout".to_string(),
            layout_type: PipelineLayoutType::GBuffer,
        }))
        .unwrap();
    let gbuffer_pipeline = resources
        .create_asset(AssetSetting::Pipeline(PipelineSetting {
            name: "gbuffer_fill".to_string(),
            vertex_shader: ShaderSource::SpirvBytes(vec![0u8; 16]),
            fragment_shader: Some(ShaderSource::SpirvBytes(vec![0u8; 16])),
            render_pass_kind: RenderPassKind::DeferredComposite,
            layout_type: PipelineLayoutType::GBuffer,
            family: PipelineFamily::GBuffer,
            ..Default::default()
        }))
        .unwrap();
    let deferred_material = resources
        .create_asset(AssetSetting::Material(MaterialSetting {
            name: "gbuffer_mat".to_string(),
            pipeline: gbuffer_pipeline,
            textures: Vec::new(),
            params: Vec::new(),
        }))
        .unwrap();

    let mut system = render_system(&device, &render_passes, 2);
    system
        .update(&[renderable(mesh, deferred_material)], &resources, None)
        .unwrap();

    // Silently skipped: no draws, no error, frame still advanced
    assert_eq!(system.frame_stats().draw_calls, 0);
    assert_eq!(system.frame_stats().skipped_entities, 1);
    assert_eq!(system.current_frame_index(), 1);
}

#[test]
fn test_unwritten_mesh_is_skipped() {
    let (device, render_passes, mut resources) = setup();
    let (_mesh, material) = create_scene_assets(&mut resources);
    let empty_mesh = resources
        .create_asset(AssetSetting::Mesh(MeshSetting {
            name: "empty".to_string(),
            vertex_buffer_size: 64,
            index_buffer_size: 64,
            vertex_stride: 16,
            ..Default::default()
        }))
        .unwrap();

    let mut system = render_system(&device, &render_passes, 2);
    system
        .update(&[renderable(empty_mesh, material)], &resources, None)
        .unwrap();

    assert_eq!(system.frame_stats().draw_calls, 0);
    assert_eq!(system.frame_stats().skipped_entities, 1);
}

// ============================================================================
// Tests: Frame-slot synchronization
// ============================================================================

#[test]
fn test_at_most_n_frames_in_flight() {
    let (device, render_passes, resources) = setup();
    let mut system = render_system(&device, &render_passes, 2);

    // Simulate a GPU that never completes: fences stay unsignaled
    device.set_force_fence_timeout(true);

    // The first two updates occupy the two slots (fences start signaled)
    system.update(&[], &resources, None).unwrap();
    system.update(&[], &resources, None).unwrap();

    // The third frame must block on slot 0's fence and time out
    let result = system.update(&[], &resources, None);
    assert!(matches!(result, Err(Error::SyncTimeout(_))));
    // The failed frame did not advance the slot index
    assert_eq!(system.current_frame_index(), 0);
}

#[test]
fn test_fence_timeout_is_fatal_not_retried() {
    let (device, render_passes, resources) = setup();
    let mut system = render_system(&device, &render_passes, 2);
    device.set_force_fence_timeout(true);

    system.update(&[], &resources, None).unwrap();
    system.update(&[], &resources, None).unwrap();
    assert!(system.update(&[], &resources, None).is_err());
    // Still stuck: the engine performs no recovery on its own
    assert!(system.update(&[], &resources, None).is_err());
}

#[test]
fn test_update_waits_signal_wiring() {
    let (device, render_passes, resources) = setup();
    let device_dyn: Arc<dyn GraphicsDevice> = device.clone() as Arc<dyn GraphicsDevice>;
    let mut system = render_system(&device, &render_passes, 2);

    let image_available = device_dyn.create_semaphore().unwrap();
    system.update(&[], &resources, Some(&image_available)).unwrap();

    assert_eq!(device.get_submit_count(), 1);
}
