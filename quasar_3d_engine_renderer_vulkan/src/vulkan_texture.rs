/// Texture - Vulkan implementation of the Texture trait

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::sync::Arc;

use quasar_3d_engine::quasar3d::device::{Texture as DeviceTexture, TextureInfo};

use crate::vulkan_context::GpuContext;

/// Vulkan texture implementation
///
/// The image, its view, and its memory allocation are created and
/// destroyed together.
pub struct Texture {
    /// Shared GPU context (for cleanup)
    pub(crate) context: Arc<GpuContext>,
    /// Vulkan image
    pub(crate) image: vk::Image,
    /// Vulkan image view
    pub(crate) view: vk::ImageView,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    /// Allocation size for the stats counters
    pub(crate) allocation_size: u64,
    /// Read-only texture properties
    pub(crate) info: TextureInfo,
}

impl Texture {
    /// Aspect flags matching the texture's format
    pub(crate) fn aspect_mask(&self) -> vk::ImageAspectFlags {
        if self.info.format.is_depth() {
            vk::ImageAspectFlags::DEPTH
        } else {
            vk::ImageAspectFlags::COLOR
        }
    }
}

impl DeviceTexture for Texture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            // Destroy image view
            self.context.device.destroy_image_view(self.view, None);

            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                self.context.allocator.lock().unwrap().free(allocation).ok();
                self.context.track_free(self.allocation_size);
            }

            // Destroy image
            self.context.device.destroy_image(self.image, None);
        }
    }
}
