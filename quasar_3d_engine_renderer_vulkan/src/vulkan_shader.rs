/// ShaderModule - Vulkan implementation of the ShaderModule trait

use ash::vk;
use std::sync::Arc;

use quasar_3d_engine::quasar3d::device::{ShaderModule as DeviceShaderModule, ShaderStage};

use crate::vulkan_context::GpuContext;

/// Vulkan shader module implementation
pub struct ShaderModule {
    /// Shared GPU context (for cleanup)
    pub(crate) context: Arc<GpuContext>,
    /// Vulkan shader module
    pub(crate) module: vk::ShaderModule,
    /// Stage this module was created for
    pub(crate) stage: ShaderStage,
}

impl DeviceShaderModule for ShaderModule {
    fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_shader_module(self.module, None);
        }
    }
}
