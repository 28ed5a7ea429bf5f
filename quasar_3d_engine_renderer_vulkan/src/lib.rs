/*!
# Quasar 3D Engine - Vulkan backend

Vulkan implementation of the `quasar_3d_engine` graphics-device boundary,
built on `ash` and `gpu-allocator`.

The device is headless: instance, physical device, one graphics queue,
allocator. Surface/swapchain bootstrap belongs to the application's
windowing layer and is out of scope here; the presentation subsystem
supplies "image available" semaphores to the render system and consumes
its render targets and "render finished" semaphores.

Enable the `vulkan-validation` feature to compile in the Khronos
validation layer and debug messenger.
*/

mod vulkan;
mod vulkan_binding_group;
mod vulkan_buffer;
mod vulkan_command_list;
mod vulkan_context;
mod vulkan_format;
mod vulkan_frame_buffer;
mod vulkan_pipeline;
mod vulkan_render_pass;
mod vulkan_sampler;
mod vulkan_shader;
mod vulkan_sync;
mod vulkan_texture;

#[cfg(feature = "vulkan-validation")]
mod vulkan_debug;

// Main quasar3d namespace module
pub mod quasar3d {
    pub use crate::vulkan::VulkanGraphicsDevice;
}

pub use vulkan::VulkanGraphicsDevice;
