/// RenderPass - Vulkan implementation of the RenderPass trait

use ash::vk;
use std::sync::Arc;

use quasar_3d_engine::quasar3d::device::RenderPass as DeviceRenderPass;

use crate::vulkan_context::GpuContext;

/// Vulkan render pass implementation
pub struct RenderPass {
    /// Shared GPU context (for cleanup)
    pub(crate) context: Arc<GpuContext>,
    /// Vulkan render pass
    pub(crate) render_pass: vk::RenderPass,
}

impl DeviceRenderPass for RenderPass {}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
