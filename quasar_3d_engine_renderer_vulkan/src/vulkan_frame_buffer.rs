/// Framebuffer - Vulkan implementation of the Framebuffer trait

use ash::vk;
use std::sync::Arc;

use quasar_3d_engine::quasar3d::device::{Framebuffer as DeviceFramebuffer, Texture};

use crate::vulkan_context::GpuContext;

/// Vulkan framebuffer implementation
///
/// Keeps its attachment textures alive for as long as the framebuffer
/// exists.
pub struct Framebuffer {
    /// Shared GPU context (for cleanup)
    pub(crate) context: Arc<GpuContext>,
    /// Vulkan framebuffer
    pub(crate) framebuffer: vk::Framebuffer,
    /// Attachments referenced by the framebuffer
    #[allow(dead_code)]
    pub(crate) attachments: Vec<Arc<dyn Texture>>,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl DeviceFramebuffer for Framebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
