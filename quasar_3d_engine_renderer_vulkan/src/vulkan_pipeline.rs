/// Pipeline and PipelineLayout - Vulkan implementations

use ash::vk;
use std::sync::Arc;

use quasar_3d_engine::quasar3d::device::{
    Pipeline as DevicePipeline, PipelineLayout as DevicePipelineLayout,
};

use crate::vulkan_context::GpuContext;

/// Vulkan pipeline layout implementation
///
/// Owns its descriptor-set layout handles; immutable after construction.
pub struct PipelineLayout {
    /// Shared GPU context (for cleanup)
    pub(crate) context: Arc<GpuContext>,
    /// Vulkan pipeline layout
    pub(crate) layout: vk::PipelineLayout,
    /// Descriptor-set layouts, set index = position
    pub(crate) set_layouts: Vec<vk::DescriptorSetLayout>,
}

impl DevicePipelineLayout for PipelineLayout {
    fn descriptor_set_layout_count(&self) -> u32 {
        self.set_layouts.len() as u32
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            for set_layout in self.set_layouts.drain(..) {
                self.context.device.destroy_descriptor_set_layout(set_layout, None);
            }
            self.context.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

/// Vulkan pipeline implementation
pub struct Pipeline {
    /// Shared GPU context (for cleanup)
    pub(crate) context: Arc<GpuContext>,
    /// Vulkan pipeline state object
    pub(crate) pipeline: vk::Pipeline,
    /// Layout handle kept for descriptor binds and push constants
    pub(crate) layout: vk::PipelineLayout,
    /// The layout object, kept alive for the pipeline's lifetime
    #[allow(dead_code)]
    pub(crate) layout_ref: Arc<dyn DevicePipelineLayout>,
}

impl DevicePipeline for Pipeline {}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_pipeline(self.pipeline, None);
        }
    }
}
