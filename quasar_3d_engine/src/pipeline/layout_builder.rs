//! Pipeline-layout builders and their director.
//!
//! A pipeline layout is assembled through a fixed linear script:
//! `reset → set_bindings → set_layout → set_push_constants →
//! set_pipeline_layout_type → build`. The director fixes that order;
//! concrete builders vary only the steps that differ per layout family
//! and inherit the rest. Each step mutates builder-local staging state
//! only; `build` performs the single device call.
//!
//! Completed steps are tracked in a flag set, so running `build` with a
//! step omitted is a construction-time error naming the missing step,
//! never a degenerate layout.

use bitflags::bitflags;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{
    BindingType, DescriptorBindingDesc, DescriptorSetLayoutDesc, GraphicsDevice,
    PipelineLayoutDesc, PushConstantRange, ShaderStageFlags,
};
use crate::log::Log;
use crate::resource::asset::{AssetInfo, AssetState};
use crate::resource::pipeline::PipelineLayoutAsset;
use crate::engine_debug;

/// Layout families, used to look pipelines up by rendering technique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineLayoutType {
    Pbr,
    GBuffer,
    Sky,
}

bitflags! {
    /// Steps of the layout construction script
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LayoutStep: u32 {
        const RESET = 1 << 0;
        const BINDINGS = 1 << 1;
        const LAYOUT = 1 << 2;
        const PUSH_CONSTANTS = 1 << 3;
        const LAYOUT_TYPE = 1 << 4;
    }
}

impl LayoutStep {
    const REQUIRED: LayoutStep = LayoutStep::all();

    /// Script order, for reporting the first missing step
    const ORDERED: [(LayoutStep, &'static str); 5] = [
        (LayoutStep::RESET, "Reset"),
        (LayoutStep::BINDINGS, "SetBindings"),
        (LayoutStep::LAYOUT, "SetLayout"),
        (LayoutStep::PUSH_CONSTANTS, "SetPushConstants"),
        (LayoutStep::LAYOUT_TYPE, "SetPipelineLayoutType"),
    ];
}

/// Builder-local staging state for a pipeline layout
#[derive(Default)]
pub struct LayoutStaging {
    name: String,
    /// Bindings per set index, filled by `set_bindings`
    bindings: Vec<Vec<DescriptorBindingDesc>>,
    /// Assembled set layouts, filled by `set_layout`
    set_layouts: Vec<DescriptorSetLayoutDesc>,
    push_constant_ranges: Vec<PushConstantRange>,
    layout_type: Option<PipelineLayoutType>,
    completed: LayoutStep,
}

impl LayoutStaging {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            completed: LayoutStep::RESET,
            ..Default::default()
        }
    }
}

/// Stepwise constructor for an immutable pipeline-layout asset.
///
/// `set_bindings` and `set_pipeline_layout_type` are family-specific;
/// the remaining steps have canonical default implementations.
pub trait PipelineLayoutBuilder {
    /// Access the builder-local staging state
    fn staging(&self) -> &LayoutStaging;

    /// Mutable access to the staging state
    fn staging_mut(&mut self) -> &mut LayoutStaging;

    /// Step 1: discard previous staging state and name the layout
    fn reset(&mut self, name: &str) {
        *self.staging_mut() = LayoutStaging::new(name);
    }

    /// Step 2: stage the descriptor bindings per set (family-specific)
    fn set_bindings(&mut self);

    /// Step 3: assemble the staged bindings into set layouts
    fn set_layout(&mut self) {
        let staging = self.staging_mut();
        staging.set_layouts = staging
            .bindings
            .iter()
            .map(|bindings| DescriptorSetLayoutDesc { bindings: bindings.clone() })
            .collect();
        staging.completed |= LayoutStep::LAYOUT;
    }

    /// Step 4: stage the push-constant ranges
    ///
    /// Default: one 64-byte vertex-stage range at offset 0 (the object
    /// transform pushed per draw).
    fn set_push_constants(&mut self) {
        let staging = self.staging_mut();
        staging.push_constant_ranges = vec![PushConstantRange {
            stages: ShaderStageFlags::VERTEX,
            offset: 0,
            size: 64,
        }];
        staging.completed |= LayoutStep::PUSH_CONSTANTS;
    }

    /// Step 5: tag the layout with its family (family-specific)
    fn set_pipeline_layout_type(&mut self);

    /// Step 6: the single device call; returns the owned asset
    fn build(&mut self, device: &Arc<dyn GraphicsDevice>, log: &Log) -> Result<PipelineLayoutAsset> {
        let staging = self.staging();

        for (step, step_name) in LayoutStep::ORDERED {
            if LayoutStep::REQUIRED.contains(step) && !staging.completed.contains(step) {
                return Err(Error::InvalidResource(format!(
                    "Pipeline layout build attempted without running step '{}'",
                    step_name
                )));
            }
        }
        if staging.name.is_empty() {
            return Err(Error::InvalidResource(
                "Pipeline layout build attempted with an empty name".to_string(),
            ));
        }
        let layout_type = staging.layout_type.ok_or_else(|| {
            Error::InvalidResource(
                "Pipeline layout build attempted without a layout type".to_string(),
            )
        })?;

        let desc = PipelineLayoutDesc {
            name: staging.name.clone(),
            set_layouts: staging.set_layouts.clone(),
            push_constant_ranges: staging.push_constant_ranges.clone(),
        };
        let layout = device.create_pipeline_layout(&desc)?;

        engine_debug!(
            log,
            "quasar3d::PipelineLayoutBuilder",
            "Built pipeline layout '{}' ({:?}, {} sets)",
            staging.name,
            layout_type,
            desc.set_layouts.len()
        );

        Ok(PipelineLayoutAsset {
            info: AssetInfo::new(staging.name.clone(), AssetState::Loaded),
            layout,
            layout_type,
            desc,
        })
    }
}

/// Fixes the canonical step order; a concrete builder cannot reorder it
pub struct PipelineLayoutDirector;

impl PipelineLayoutDirector {
    /// Run the full construction script against a builder
    pub fn construct(
        builder: &mut dyn PipelineLayoutBuilder,
        device: &Arc<dyn GraphicsDevice>,
        log: &Log,
        name: &str,
    ) -> Result<PipelineLayoutAsset> {
        builder.reset(name);
        builder.set_bindings();
        builder.set_layout();
        builder.set_push_constants();
        builder.set_pipeline_layout_type();
        builder.build(device, log)
    }
}

fn sampled(binding: u32) -> DescriptorBindingDesc {
    DescriptorBindingDesc {
        binding,
        binding_type: BindingType::CombinedImageSampler,
        count: 1,
        stages: ShaderStageFlags::FRAGMENT,
    }
}

fn uniform(binding: u32, stages: ShaderStageFlags) -> DescriptorBindingDesc {
    DescriptorBindingDesc {
        binding,
        binding_type: BindingType::UniformBuffer,
        count: 1,
        stages,
    }
}

// ============================================================================
// PBR layout
// ============================================================================

/// PBR forward layout: global set (frame/light data + environment maps)
/// and material set (parameters + the five PBR texture maps).
#[derive(Default)]
pub struct PbrPipelineLayoutBuilder {
    staging: LayoutStaging,
}

impl PbrPipelineLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineLayoutBuilder for PbrPipelineLayoutBuilder {
    fn staging(&self) -> &LayoutStaging {
        &self.staging
    }

    fn staging_mut(&mut self) -> &mut LayoutStaging {
        &mut self.staging
    }

    fn set_bindings(&mut self) {
        let staging = self.staging_mut();
        staging.bindings = vec![
            // Set 0 (global): frame UBO, lights UBO, irradiance map,
            // prefiltered environment map, BRDF lookup table
            vec![
                uniform(0, ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT),
                uniform(1, ShaderStageFlags::FRAGMENT),
                sampled(2),
                sampled(3),
                sampled(4),
            ],
            // Set 1 (material): parameter UBO, albedo, normal,
            // metallic/roughness, occlusion, emissive
            vec![
                uniform(0, ShaderStageFlags::FRAGMENT),
                sampled(1),
                sampled(2),
                sampled(3),
                sampled(4),
                sampled(5),
            ],
        ];
        staging.completed |= LayoutStep::BINDINGS;
    }

    fn set_pipeline_layout_type(&mut self) {
        let staging = self.staging_mut();
        staging.layout_type = Some(PipelineLayoutType::Pbr);
        staging.completed |= LayoutStep::LAYOUT_TYPE;
    }
}

// ============================================================================
// G-buffer layout
// ============================================================================

/// G-buffer fill layout: global set (frame UBO + instance storage) and a
/// material set without environment maps.
#[derive(Default)]
pub struct GBufferPipelineLayoutBuilder {
    staging: LayoutStaging,
}

impl GBufferPipelineLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineLayoutBuilder for GBufferPipelineLayoutBuilder {
    fn staging(&self) -> &LayoutStaging {
        &self.staging
    }

    fn staging_mut(&mut self) -> &mut LayoutStaging {
        &mut self.staging
    }

    fn set_bindings(&mut self) {
        let staging = self.staging_mut();
        staging.bindings = vec![
            // Set 0 (global): frame UBO, instance storage buffer
            vec![
                uniform(0, ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT),
                DescriptorBindingDesc {
                    binding: 1,
                    binding_type: BindingType::StorageBuffer,
                    count: 1,
                    stages: ShaderStageFlags::VERTEX,
                },
            ],
            // Set 1 (material): parameter UBO, albedo, normal,
            // metallic/roughness
            vec![uniform(0, ShaderStageFlags::FRAGMENT), sampled(1), sampled(2), sampled(3)],
        ];
        staging.completed |= LayoutStep::BINDINGS;
    }

    fn set_pipeline_layout_type(&mut self) {
        let staging = self.staging_mut();
        staging.layout_type = Some(PipelineLayoutType::GBuffer);
        staging.completed |= LayoutStep::LAYOUT_TYPE;
    }
}

// ============================================================================
// Sky layout
// ============================================================================

/// Sky layout: a single global set (frame UBO + sky cubemap), no
/// per-object transform, so the push-constant step is overridden to stage
/// nothing.
#[derive(Default)]
pub struct SkyPipelineLayoutBuilder {
    staging: LayoutStaging,
}

impl SkyPipelineLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineLayoutBuilder for SkyPipelineLayoutBuilder {
    fn staging(&self) -> &LayoutStaging {
        &self.staging
    }

    fn staging_mut(&mut self) -> &mut LayoutStaging {
        &mut self.staging
    }

    fn set_bindings(&mut self) {
        let staging = self.staging_mut();
        staging.bindings = vec![vec![
            uniform(0, ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT),
            sampled(1),
        ]];
        staging.completed |= LayoutStep::BINDINGS;
    }

    fn set_push_constants(&mut self) {
        let staging = self.staging_mut();
        staging.push_constant_ranges = Vec::new();
        staging.completed |= LayoutStep::PUSH_CONSTANTS;
    }

    fn set_pipeline_layout_type(&mut self) {
        let staging = self.staging_mut();
        staging.layout_type = Some(PipelineLayoutType::Sky);
        staging.completed |= LayoutStep::LAYOUT_TYPE;
    }
}

#[cfg(test)]
#[path = "layout_builder_tests.rs"]
mod tests;
