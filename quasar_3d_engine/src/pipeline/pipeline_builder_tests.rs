/// Tests for the pipeline builders and director
///
/// Uses MockGraphicsDevice; covers the full 12-step script, family
/// overrides, and the deterministic failures for omitted steps and
/// mismatched blend state.

use super::*;
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{
    DescriptorSetLayoutDesc, GraphicsDevice, PipelineLayoutDesc, RenderPassDesc,
    ShaderModuleDesc, ShaderStage,
};
use crate::render::RenderPassKind;
use crate::resource::pipeline::{PipelineSetting, ShaderSource};

fn mock_device() -> Arc<dyn GraphicsDevice> {
    Arc::new(MockGraphicsDevice::new())
}

/// Resolve a build input by hand, the way PipelineManager does
fn build_input(
    device: &Arc<dyn GraphicsDevice>,
    name: &str,
    color_attachment_count: u32,
    with_fragment: bool,
) -> PipelineBuildInput {
    let vertex_shader = device
        .create_shader_module(ShaderModuleDesc {
            name: format!("{}_vert", name),
            stage: ShaderStage::Vertex,
            code: vec![0u8; 16],
        })
        .unwrap();
    let fragment_shader = with_fragment.then(|| {
        device
            .create_shader_module(ShaderModuleDesc {
                name: format!("{}_frag", name),
                stage: ShaderStage::Fragment,
                code: vec![0u8; 16],
            })
            .unwrap()
    });
    let layout = device
        .create_pipeline_layout(&PipelineLayoutDesc {
            name: format!("{}_layout", name),
            set_layouts: vec![DescriptorSetLayoutDesc::default()],
            push_constant_ranges: Vec::new(),
        })
        .unwrap();
    let render_pass = device
        .create_render_pass(&RenderPassDesc {
            name: format!("{}_pass", name),
            attachments: Vec::new(),
            subpasses: Vec::new(),
            dependencies: Vec::new(),
        })
        .unwrap();

    PipelineBuildInput {
        setting: PipelineSetting {
            name: name.to_string(),
            vertex_shader: ShaderSource::SpirvBytes(vec![0u8; 16]),
            ..Default::default()
        },
        vertex_shader,
        fragment_shader,
        layout,
        render_pass,
        color_attachment_count,
    }
}

// ============================================================================
// Tests: Director-driven construction
// ============================================================================

#[test]
fn test_forward_builder_full_script_builds() {
    let device = mock_device();
    let mut builder = ForwardPipelineBuilder::new();
    let input = build_input(&device, "forward", 1, true);

    let asset =
        PipelineDirector::construct(&mut builder, &device, &Log::disabled(), input).unwrap();

    assert_eq!(asset.render_pass_kind(), RenderPassKind::ForwardComposite);
    assert_eq!(asset.subpass(), 0);
    assert_eq!(asset.info().state, crate::resource::asset::AssetState::Loaded);
}

#[test]
fn test_gbuffer_builder_covers_four_attachments() {
    let device = mock_device();
    let mut builder = GBufferPipelineBuilder::new();
    let input = build_input(&device, "gbuffer", 4, true);

    // The override replicates the blend state across all four attachments
    assert!(PipelineDirector::construct(&mut builder, &device, &Log::disabled(), input).is_ok());
}

#[test]
fn test_custom_shader_builder_uses_configured_entry_point() {
    let device = mock_device();
    let mut builder = CustomShaderPipelineBuilder::new();
    let mut input = build_input(&device, "custom", 1, true);
    input.setting.entry_point = "mainColor".to_string();

    builder.reset(input);
    builder.set_shader();
    let staging = builder.staging().unwrap();
    assert!(staging.completed.contains(PipelineStep::SHADER));
    assert_eq!(staging.stages[0].entry_point, "mainColor");
    assert_eq!(staging.stages[1].entry_point, "mainColor");
}

#[test]
fn test_vertex_only_pipeline_builds() {
    let device = mock_device();
    let mut builder = ForwardPipelineBuilder::new();
    let input = build_input(&device, "depth_only", 1, false);

    let asset =
        PipelineDirector::construct(&mut builder, &device, &Log::disabled(), input).unwrap();
    assert_eq!(asset.info().name, "depth_only");
}

// ============================================================================
// Tests: Omitted steps are construction-time errors
// ============================================================================

#[test]
fn test_build_without_reset_fails() {
    let device = mock_device();
    let mut builder = ForwardPipelineBuilder::new();

    match builder.build(&device, &Log::disabled()) {
        Err(Error::InvalidResource(msg)) => assert!(msg.contains("Reset"), "message was: {}", msg),
        other => panic!("Expected InvalidResource, got {:?}", other.err()),
    }
}

#[test]
fn test_build_without_shader_step_fails_naming_step() {
    let device = mock_device();
    let mut builder = ForwardPipelineBuilder::new();
    let input = build_input(&device, "no_shader", 1, true);

    builder.reset(input);
    builder.set_vertex_input_state();
    builder.set_input_assembly_state();
    // set_shader skipped
    builder.set_rasterization_state();
    builder.set_viewport_state();
    builder.set_multi_sample_state();
    builder.set_depth_stencil_state();
    builder.set_color_blend_state();
    builder.set_layout();
    builder.set_render_pass();
    builder.set_dynamic_state();

    match builder.build(&device, &Log::disabled()) {
        Err(Error::InvalidResource(msg)) => {
            assert!(msg.contains("SetShader"), "message was: {}", msg);
        }
        other => panic!("Expected InvalidResource naming SetShader, got {:?}", other.err()),
    }
}

#[test]
fn test_build_with_empty_name_fails() {
    let device = mock_device();
    let mut builder = ForwardPipelineBuilder::new();
    let mut input = build_input(&device, "x", 1, true);
    input.setting.name = String::new();

    match PipelineDirector::construct(&mut builder, &device, &Log::disabled(), input) {
        Err(Error::InvalidResource(msg)) => assert!(msg.contains("empty name"), "message was: {}", msg),
        other => panic!("Expected InvalidResource, got {:?}", other.err()),
    }
}

// ============================================================================
// Tests: Blend-attachment count must match the render pass
// ============================================================================

#[test]
fn test_forward_blend_state_against_deferred_pass_fails() {
    let device = mock_device();
    let mut builder = ForwardPipelineBuilder::new();
    // Forward builder stages one blend attachment; the target subpass
    // declares four color attachments.
    let input = build_input(&device, "mismatch", 4, true);

    match PipelineDirector::construct(&mut builder, &device, &Log::disabled(), input) {
        Err(Error::InvalidResource(msg)) => {
            assert!(msg.contains("color attachments"), "message was: {}", msg);
        }
        other => panic!("Expected InvalidResource, got {:?}", other.err()),
    }
}

#[test]
fn test_no_pipeline_created_on_failed_build() {
    let device = Arc::new(MockGraphicsDevice::new());
    let device_dyn: Arc<dyn GraphicsDevice> = device.clone();
    let mut builder = ForwardPipelineBuilder::new();
    let input = build_input(&device_dyn, "mismatch", 4, true);

    let _ = PipelineDirector::construct(&mut builder, &device_dyn, &Log::disabled(), input);
    assert!(device.get_created_pipelines().is_empty());
}
