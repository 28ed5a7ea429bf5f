/// GraphicsDevice trait - main device factory and queue interface

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    BindingGroup, BindingResource, Buffer, BufferDesc, CommandList, Fence,
    Framebuffer, FramebufferDesc, Pipeline, PipelineLayout, PipelineLayoutDesc,
    PipelineStateDesc, RenderPass, RenderPassDesc, Sampler, SamplerDesc,
    Semaphore, ShaderModule, ShaderModuleDesc, Texture, TextureDesc,
};

/// Graphics device configuration
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Number of presentable images the device reports; drives the
    /// render system's frame-slot count
    pub image_count: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Quasar3D Application".to_string(),
            app_version: (1, 0, 0),
            image_count: 2,
        }
    }
}

/// Device memory statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceStats {
    /// Bytes currently allocated for device objects
    pub allocated_bytes: u64,
    /// Number of live allocations
    pub allocation_count: u32,
}

/// One queue submission: command lists plus semaphore/fence wiring
pub struct SubmitDesc<'a> {
    /// Command lists to execute, in order
    pub command_lists: &'a [&'a dyn CommandList],
    /// Semaphores to wait on before execution (color-attachment-output stage)
    pub wait_semaphores: &'a [&'a dyn Semaphore],
    /// Semaphores to signal after execution
    pub signal_semaphores: &'a [&'a dyn Semaphore],
    /// Fence to signal when execution completes
    pub fence: Option<&'a dyn Fence>,
}

impl<'a> SubmitDesc<'a> {
    /// Submission with no synchronization wiring
    pub fn commands_only(command_lists: &'a [&'a dyn CommandList]) -> Self {
        Self {
            command_lists,
            wait_semaphores: &[],
            signal_semaphores: &[],
            fence: None,
        }
    }
}

/// Main graphics device trait
///
/// Central factory for device objects and the submission interface.
/// Implemented by backend-specific devices (e.g., VulkanGraphicsDevice).
/// All methods take `&self`; backends use interior mutability for their
/// allocator and caches, so managers share one `Arc<dyn GraphicsDevice>`
/// without an outer lock.
pub trait GraphicsDevice: Send + Sync {
    /// Create a texture (image + view + memory, created and destroyed together)
    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a buffer (buffer + memory, created and destroyed together)
    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a sampler
    fn create_sampler(&self, desc: SamplerDesc) -> Result<Arc<dyn Sampler>>;

    /// Create a shader module from SPIR-V code
    fn create_shader_module(&self, desc: ShaderModuleDesc) -> Result<Arc<dyn ShaderModule>>;

    /// Create a render pass from an attachment/subpass/dependency graph
    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    /// Create a framebuffer
    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    /// Create a pipeline layout (owns its descriptor-set layouts)
    fn create_pipeline_layout(&self, desc: &PipelineLayoutDesc) -> Result<Arc<dyn PipelineLayout>>;

    /// Create a graphics pipeline state object
    fn create_pipeline(&self, desc: &PipelineStateDesc) -> Result<Arc<dyn Pipeline>>;

    /// Allocate a binding group against one set layout of a pipeline layout
    fn create_binding_group(
        &self,
        layout: &Arc<dyn PipelineLayout>,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn BindingGroup>>;

    /// Create a command list with its own pool
    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    /// Create a fence, optionally in the signaled state
    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>>;

    /// Create a semaphore
    fn create_semaphore(&self) -> Result<Arc<dyn Semaphore>>;

    /// Submit command lists to the graphics queue
    fn submit(&self, desc: SubmitDesc<'_>) -> Result<()>;

    /// Wait for all GPU operations to complete
    fn wait_idle(&self) -> Result<()>;

    /// Number of presentable images; drives the frame-slot count N
    fn swapchain_image_count(&self) -> u32;

    /// Get memory statistics about the device
    fn stats(&self) -> DeviceStats;
}
