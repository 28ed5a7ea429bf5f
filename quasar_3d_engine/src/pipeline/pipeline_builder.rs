//! Graphics-pipeline builders and their director.
//!
//! Pipeline creation info is a large aggregate with structurally
//! dependent fields (the blend-attachment count must match the color-
//! attachment count of the chosen render pass, the layout must match the
//! descriptor sets the shaders expect). The fixed script
//! `reset → set_vertex_input_state → set_input_assembly_state →
//! set_shader → set_rasterization_state → set_viewport_state →
//! set_multi_sample_state → set_depth_stencil_state →
//! set_color_blend_state → set_layout → set_render_pass →
//! set_dynamic_state → build` guarantees every required field is
//! populated exactly once and in a dependency-safe order.
//!
//! Specializations override only the steps that differ (shader stage
//! list, color-attachment count) and inherit the rest.

use bitflags::bitflags;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{
    ColorBlendState, DynamicStateFlags, GraphicsDevice, Pipeline, PipelineLayout,
    PipelineStateDesc, RenderPass, ShaderModule, ShaderStageDesc,
};
use crate::log::Log;
use crate::resource::asset::{AssetInfo, AssetState};
use crate::resource::pipeline::{PipelineAsset, PipelineSetting};
use crate::engine_debug;

/// Pipeline families a setting can request; selects the concrete builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineFamily {
    /// Forward-shaded pipeline, one color attachment
    Forward,
    /// G-buffer fill pipeline, four color attachments
    GBuffer,
    /// User-authored shaders with a configurable entry point
    CustomShader,
}

bitflags! {
    /// Steps of the pipeline construction script
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PipelineStep: u32 {
        const RESET = 1 << 0;
        const VERTEX_INPUT = 1 << 1;
        const INPUT_ASSEMBLY = 1 << 2;
        const SHADER = 1 << 3;
        const RASTERIZATION = 1 << 4;
        const VIEWPORT = 1 << 5;
        const MULTISAMPLE = 1 << 6;
        const DEPTH_STENCIL = 1 << 7;
        const COLOR_BLEND = 1 << 8;
        const LAYOUT = 1 << 9;
        const RENDER_PASS = 1 << 10;
        const DYNAMIC_STATE = 1 << 11;
    }
}

impl PipelineStep {
    const REQUIRED: PipelineStep = PipelineStep::all();

    /// Script order, for reporting the first missing step
    const ORDERED: [(PipelineStep, &'static str); 12] = [
        (PipelineStep::RESET, "Reset"),
        (PipelineStep::VERTEX_INPUT, "SetVertexInputState"),
        (PipelineStep::INPUT_ASSEMBLY, "SetInputAssemblyState"),
        (PipelineStep::SHADER, "SetShader"),
        (PipelineStep::RASTERIZATION, "SetRasterizationState"),
        (PipelineStep::VIEWPORT, "SetViewportState"),
        (PipelineStep::MULTISAMPLE, "SetMultiSampleState"),
        (PipelineStep::DEPTH_STENCIL, "SetDepthStencilState"),
        (PipelineStep::COLOR_BLEND, "SetColorBlendState"),
        (PipelineStep::LAYOUT, "SetLayout"),
        (PipelineStep::RENDER_PASS, "SetRenderPass"),
        (PipelineStep::DYNAMIC_STATE, "SetDynamicState"),
    ];
}

/// Everything a builder needs, resolved by the pipeline manager before
/// the script runs: the setting plus the shader modules, layout, and
/// render pass it references.
pub struct PipelineBuildInput {
    pub setting: PipelineSetting,
    pub vertex_shader: Arc<dyn ShaderModule>,
    pub fragment_shader: Option<Arc<dyn ShaderModule>>,
    pub layout: Arc<dyn PipelineLayout>,
    pub render_pass: Arc<dyn RenderPass>,
    /// Color-attachment count of the target subpass; the staged blend
    /// state must match it
    pub color_attachment_count: u32,
}

/// Builder-local staging state for a pipeline
pub struct PipelineStaging {
    input: PipelineBuildInput,
    stages: Vec<ShaderStageDesc>,
    color_blend: ColorBlendState,
    dynamic_state: DynamicStateFlags,
    layout: Option<Arc<dyn PipelineLayout>>,
    render_pass: Option<Arc<dyn RenderPass>>,
    completed: PipelineStep,
}

impl PipelineStaging {
    fn new(input: PipelineBuildInput) -> Self {
        Self {
            input,
            stages: Vec::new(),
            color_blend: ColorBlendState::default(),
            dynamic_state: DynamicStateFlags::empty(),
            layout: None,
            render_pass: None,
            completed: PipelineStep::RESET,
        }
    }

    /// The resolved build input
    pub fn input(&self) -> &PipelineBuildInput {
        &self.input
    }

    /// Mark a script step as completed
    pub fn mark(&mut self, step: PipelineStep) {
        self.completed |= step;
    }
}

/// Stepwise constructor for an immutable pipeline asset.
///
/// Every step has a canonical default implementation driven by the
/// resolved setting; families override only what differs.
pub trait PipelineBuilder {
    /// Access the builder-local staging state; `None` before `reset`
    fn staging(&self) -> Option<&PipelineStaging>;

    /// Mutable access to the staging state
    fn staging_mut(&mut self) -> &mut Option<PipelineStaging>;

    /// Step 1: discard previous staging state and adopt the build input
    fn reset(&mut self, input: PipelineBuildInput) {
        *self.staging_mut() = Some(PipelineStaging::new(input));
    }

    /// Step 2: vertex input bindings and attributes
    fn set_vertex_input_state(&mut self) {
        if let Some(staging) = self.staging_mut() {
            staging.mark(PipelineStep::VERTEX_INPUT);
        }
    }

    /// Step 3: primitive topology
    fn set_input_assembly_state(&mut self) {
        if let Some(staging) = self.staging_mut() {
            staging.mark(PipelineStep::INPUT_ASSEMBLY);
        }
    }

    /// Step 4: programmable stages
    fn set_shader(&mut self) {
        if let Some(staging) = self.staging_mut() {
            let mut stages = vec![ShaderStageDesc {
                module: Arc::clone(&staging.input.vertex_shader),
                entry_point: "main".to_string(),
            }];
            if let Some(fragment) = &staging.input.fragment_shader {
                stages.push(ShaderStageDesc {
                    module: Arc::clone(fragment),
                    entry_point: "main".to_string(),
                });
            }
            staging.stages = stages;
            staging.mark(PipelineStep::SHADER);
        }
    }

    /// Step 5: rasterization state
    fn set_rasterization_state(&mut self) {
        if let Some(staging) = self.staging_mut() {
            staging.mark(PipelineStep::RASTERIZATION);
        }
    }

    /// Step 6: viewport state (one viewport/scissor pair, values supplied
    /// at record time)
    fn set_viewport_state(&mut self) {
        if let Some(staging) = self.staging_mut() {
            staging.mark(PipelineStep::VIEWPORT);
        }
    }

    /// Step 7: multisample state
    fn set_multi_sample_state(&mut self) {
        if let Some(staging) = self.staging_mut() {
            staging.mark(PipelineStep::MULTISAMPLE);
        }
    }

    /// Step 8: depth/stencil state
    fn set_depth_stencil_state(&mut self) {
        if let Some(staging) = self.staging_mut() {
            staging.mark(PipelineStep::DEPTH_STENCIL);
        }
    }

    /// Step 9: blend state, one entry per color attachment of the target
    /// subpass. Default: a single attachment using the setting's blend.
    fn set_color_blend_state(&mut self) {
        if let Some(staging) = self.staging_mut() {
            staging.color_blend = ColorBlendState {
                attachments: vec![staging.input.setting.blend.clone()],
            };
            staging.mark(PipelineStep::COLOR_BLEND);
        }
    }

    /// Step 10: the pipeline layout the shaders were written against
    fn set_layout(&mut self) {
        if let Some(staging) = self.staging_mut() {
            staging.layout = Some(Arc::clone(&staging.input.layout));
            staging.mark(PipelineStep::LAYOUT);
        }
    }

    /// Step 11: target render pass and subpass
    fn set_render_pass(&mut self) {
        if let Some(staging) = self.staging_mut() {
            staging.render_pass = Some(Arc::clone(&staging.input.render_pass));
            staging.mark(PipelineStep::RENDER_PASS);
        }
    }

    /// Step 12: record-time dynamic states (viewport + scissor)
    fn set_dynamic_state(&mut self) {
        if let Some(staging) = self.staging_mut() {
            staging.dynamic_state = DynamicStateFlags::VIEWPORT | DynamicStateFlags::SCISSOR;
            staging.mark(PipelineStep::DYNAMIC_STATE);
        }
    }

    /// Final step: validate the staged aggregate, perform the single
    /// device call, and return the owned asset.
    fn build(&mut self, device: &Arc<dyn GraphicsDevice>, log: &Log) -> Result<PipelineAsset> {
        let staging = self.staging().ok_or_else(|| {
            Error::InvalidResource(
                "Pipeline build attempted without running step 'Reset'".to_string(),
            )
        })?;

        for (step, step_name) in PipelineStep::ORDERED {
            if PipelineStep::REQUIRED.contains(step) && !staging.completed.contains(step) {
                return Err(Error::InvalidResource(format!(
                    "Pipeline build attempted without running step '{}'",
                    step_name
                )));
            }
        }

        let setting = &staging.input.setting;
        if setting.name.is_empty() {
            return Err(Error::InvalidResource(
                "Pipeline build attempted with an empty name".to_string(),
            ));
        }
        if staging.stages.is_empty() {
            return Err(Error::InvalidResource(format!(
                "Pipeline '{}' has no shader stages",
                setting.name
            )));
        }
        let blend_count = staging.color_blend.attachments.len() as u32;
        if blend_count != staging.input.color_attachment_count {
            return Err(Error::InvalidResource(format!(
                "Pipeline '{}': blend state covers {} attachments but render pass {:?} has {} color attachments",
                setting.name,
                blend_count,
                setting.render_pass_kind,
                staging.input.color_attachment_count
            )));
        }
        // Guarded by the step check above; kept as lookups rather than
        // unwraps so a broken override surfaces as an error.
        let layout = staging.layout.as_ref().ok_or_else(|| {
            Error::InvalidResource(format!("Pipeline '{}' has no layout staged", setting.name))
        })?;
        let render_pass = staging.render_pass.as_ref().ok_or_else(|| {
            Error::InvalidResource(format!("Pipeline '{}' has no render pass staged", setting.name))
        })?;

        let desc = PipelineStateDesc {
            name: setting.name.clone(),
            stages: staging.stages.clone(),
            vertex_layout: setting.vertex_layout.clone(),
            topology: setting.topology,
            rasterization: setting.rasterization.clone(),
            multisample: setting.multisample.clone(),
            depth_stencil: setting.depth_stencil.clone(),
            color_blend: staging.color_blend.clone(),
            dynamic_state: staging.dynamic_state,
            layout: Arc::clone(layout),
            render_pass: Arc::clone(render_pass),
            subpass: setting.subpass,
        };
        let pipeline: Arc<dyn Pipeline> = device.create_pipeline(&desc)?;

        engine_debug!(
            log,
            "quasar3d::PipelineBuilder",
            "Built pipeline '{}' ({:?} pass, subpass {})",
            setting.name,
            setting.render_pass_kind,
            setting.subpass
        );

        Ok(PipelineAsset {
            info: AssetInfo::new(setting.name.clone(), AssetState::Loaded),
            pipeline,
            layout_type: setting.layout_type,
            render_pass_kind: setting.render_pass_kind,
            subpass: setting.subpass,
        })
    }
}

/// Fixes the canonical step order; a concrete builder cannot reorder it
pub struct PipelineDirector;

impl PipelineDirector {
    /// Run the full construction script against a builder
    pub fn construct(
        builder: &mut dyn PipelineBuilder,
        device: &Arc<dyn GraphicsDevice>,
        log: &Log,
        input: PipelineBuildInput,
    ) -> Result<PipelineAsset> {
        builder.reset(input);
        builder.set_vertex_input_state();
        builder.set_input_assembly_state();
        builder.set_shader();
        builder.set_rasterization_state();
        builder.set_viewport_state();
        builder.set_multi_sample_state();
        builder.set_depth_stencil_state();
        builder.set_color_blend_state();
        builder.set_layout();
        builder.set_render_pass();
        builder.set_dynamic_state();
        builder.build(device, log)
    }
}

// ============================================================================
// Forward pipeline
// ============================================================================

/// Forward-shaded pipeline: the canonical script with no overrides.
#[derive(Default)]
pub struct ForwardPipelineBuilder {
    staging: Option<PipelineStaging>,
}

impl ForwardPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineBuilder for ForwardPipelineBuilder {
    fn staging(&self) -> Option<&PipelineStaging> {
        self.staging.as_ref()
    }

    fn staging_mut(&mut self) -> &mut Option<PipelineStaging> {
        &mut self.staging
    }
}

// ============================================================================
// G-buffer pipeline
// ============================================================================

/// G-buffer fill pipeline: overrides the blend step to cover the four
/// G-buffer attachments (blending disabled; the G-buffer is opaque data).
#[derive(Default)]
pub struct GBufferPipelineBuilder {
    staging: Option<PipelineStaging>,
}

impl GBufferPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineBuilder for GBufferPipelineBuilder {
    fn staging(&self) -> Option<&PipelineStaging> {
        self.staging.as_ref()
    }

    fn staging_mut(&mut self) -> &mut Option<PipelineStaging> {
        &mut self.staging
    }

    fn set_color_blend_state(&mut self) {
        if let Some(staging) = self.staging_mut() {
            let count = staging.input.color_attachment_count as usize;
            staging.color_blend = ColorBlendState {
                attachments: vec![Default::default(); count],
            };
            staging.mark(PipelineStep::COLOR_BLEND);
        }
    }
}

// ============================================================================
// Custom shader pipeline
// ============================================================================

/// User-authored shader pipeline: overrides only the shader step to use
/// the entry point named in the setting.
#[derive(Default)]
pub struct CustomShaderPipelineBuilder {
    staging: Option<PipelineStaging>,
}

impl CustomShaderPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineBuilder for CustomShaderPipelineBuilder {
    fn staging(&self) -> Option<&PipelineStaging> {
        self.staging.as_ref()
    }

    fn staging_mut(&mut self) -> &mut Option<PipelineStaging> {
        &mut self.staging
    }

    fn set_shader(&mut self) {
        if let Some(staging) = self.staging_mut() {
            let entry_point = staging.input.setting.entry_point.clone();
            let mut stages = vec![ShaderStageDesc {
                module: Arc::clone(&staging.input.vertex_shader),
                entry_point: entry_point.clone(),
            }];
            if let Some(fragment) = &staging.input.fragment_shader {
                stages.push(ShaderStageDesc {
                    module: Arc::clone(fragment),
                    entry_point,
                });
            }
            staging.stages = stages;
            staging.mark(PipelineStep::SHADER);
        }
    }
}

#[cfg(test)]
#[path = "pipeline_builder_tests.rs"]
mod tests;
