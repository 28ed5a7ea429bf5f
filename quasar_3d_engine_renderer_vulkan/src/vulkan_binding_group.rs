/// BindingGroup - Vulkan implementation of the BindingGroup trait

use ash::vk;
use std::sync::Arc;

use quasar_3d_engine::quasar3d::device::{
    BindingGroup as DeviceBindingGroup, Buffer as DeviceBuffer,
    Sampler as DeviceSampler, Texture as DeviceTexture,
};

use crate::vulkan_context::GpuContext;

/// Vulkan binding group implementation (a descriptor set)
///
/// Keeps the bound resources alive for as long as the set exists. The
/// set is returned to its pool on drop.
pub struct BindingGroup {
    /// Shared GPU context (for cleanup)
    pub(crate) context: Arc<GpuContext>,
    /// The descriptor set
    pub(crate) descriptor_set: vk::DescriptorSet,
    /// Pool the set was allocated from
    pub(crate) pool: vk::DescriptorPool,
    /// Set index this group was allocated for
    pub(crate) set_index: u32,
    /// Bound resources, kept alive with the set
    #[allow(dead_code)]
    pub(crate) bound_textures: Vec<(Arc<dyn DeviceTexture>, Arc<dyn DeviceSampler>)>,
    #[allow(dead_code)]
    pub(crate) bound_buffers: Vec<Arc<dyn DeviceBuffer>>,
}

impl DeviceBindingGroup for BindingGroup {
    fn set_index(&self) -> u32 {
        self.set_index
    }
}

impl Drop for BindingGroup {
    fn drop(&mut self) {
        unsafe {
            self.context
                .device
                .free_descriptor_sets(self.pool, &[self.descriptor_set])
                .ok();
        }
    }
}
