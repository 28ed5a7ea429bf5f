/// Mock graphics device for unit tests (no GPU required)
///
/// Implements the full `GraphicsDevice` trait without a GPU. Created
/// objects are tracked by name, recorded commands are appended to a shared
/// string log, and buffer/texture memory is counted so tests can assert
/// that staging allocations are released. `set_force_fence_timeout` keeps
/// submitted fences unsignaled so both bounded-wait paths (upload 10 s,
/// frame 1 s) can be exercised without blocking.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::graphics_device::{
    BindingGroup, BindingResource, Buffer, BufferDesc, ClearValue, CommandList,
    DeviceStats, Fence, Framebuffer, FramebufferDesc, GraphicsDevice, ImageLayout,
    IndexType, MemoryLocation, Pipeline, PipelineLayout, PipelineLayoutDesc,
    PipelineStateDesc, Rect2D, RenderPass, RenderPassDesc, Sampler, SamplerDesc,
    Semaphore, ShaderModule, ShaderModuleDesc, ShaderStage, ShaderStageFlags,
    SubmitDesc, Texture, TextureDesc, TextureInfo, Viewport,
};

/// Shared mock device state (allocation counters + fault injection)
struct MockState {
    allocated_bytes: AtomicU64,
    allocation_count: AtomicU32,
    force_fence_timeout: AtomicBool,
}

impl MockState {
    fn track_alloc(&self, bytes: u64) {
        self.allocated_bytes.fetch_add(bytes, Ordering::SeqCst);
        self.allocation_count.fetch_add(1, Ordering::SeqCst);
    }

    fn track_free(&self, bytes: u64) {
        self.allocated_bytes.fetch_sub(bytes, Ordering::SeqCst);
        self.allocation_count.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

pub struct MockTexture {
    info: TextureInfo,
    byte_size: u64,
    state: Arc<MockState>,
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        self.state.track_free(self.byte_size);
    }
}

// ============================================================================
// Mock Buffer
// ============================================================================

pub struct MockBuffer {
    size: u64,
    location: MemoryLocation,
    /// Contents of CPU-visible buffers, for assertions
    pub data: Mutex<Vec<u8>>,
    state: Arc<MockState>,
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        if self.location != MemoryLocation::CpuToGpu {
            return Err(Error::BackendError(
                "Buffer is not host-visible; use the staged upload protocol".to_string(),
            ));
        }
        if offset + data.len() as u64 > self.size {
            return Err(Error::InvalidResource(format!(
                "Buffer update out of bounds: offset {} + {} bytes > size {}",
                offset,
                data.len(),
                self.size
            )));
        }
        let mut contents = self.data.lock().unwrap();
        contents[offset as usize..offset as usize + data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.state.track_free(self.size);
    }
}

// ============================================================================
// Mock Sampler / Shader / RenderPass / Framebuffer
// ============================================================================

pub struct MockSampler;

impl Sampler for MockSampler {}

pub struct MockShaderModule {
    stage: ShaderStage,
}

impl ShaderModule for MockShaderModule {
    fn stage(&self) -> ShaderStage {
        self.stage
    }
}

pub struct MockRenderPass {
    pub name: String,
}

impl RenderPass for MockRenderPass {}

pub struct MockFramebuffer {
    width: u32,
    height: u32,
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

// ============================================================================
// Mock PipelineLayout / Pipeline / BindingGroup
// ============================================================================

pub struct MockPipelineLayout {
    pub desc: PipelineLayoutDesc,
}

impl PipelineLayout for MockPipelineLayout {
    fn descriptor_set_layout_count(&self) -> u32 {
        self.desc.set_layouts.len() as u32
    }
}

pub struct MockPipeline {
    pub name: String,
}

impl Pipeline for MockPipeline {}

pub struct MockBindingGroup {
    set_index: u32,
}

impl BindingGroup for MockBindingGroup {
    fn set_index(&self) -> u32 {
        self.set_index
    }
}

// ============================================================================
// Mock Fence / Semaphore
// ============================================================================

pub struct MockFence {
    signaled: AtomicBool,
}

impl Fence for MockFence {
    fn wait(&self, timeout: Duration) -> Result<()> {
        // The mock signals fences synchronously at submit; an unsignaled
        // fence here means the timeout path is being exercised, so fail
        // immediately instead of sleeping out the bound.
        if self.signaled.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::SyncTimeout(format!(
                "fence wait exceeded {:?}",
                timeout
            )))
        }
    }

    fn reset(&self) -> Result<()> {
        self.signaled.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }
}

pub struct MockSemaphore;

impl Semaphore for MockSemaphore {}

// ============================================================================
// Mock CommandList
// ============================================================================

/// Records commands into the device-shared string log
pub struct MockCommandList {
    commands: Arc<Mutex<Vec<String>>>,
    is_recording: bool,
    in_render_pass: bool,
}

impl MockCommandList {
    fn record(&self, command: String) {
        self.commands.lock().unwrap().push(command);
    }
}

impl CommandList for MockCommandList {
    fn reset(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError(
                "Cannot reset a command list while recording".to_string(),
            ));
        }
        self.record("reset".to_string());
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError("Command list already recording".to_string()));
        }
        self.is_recording = true;
        self.in_render_pass = false;
        self.record("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        if self.in_render_pass {
            return Err(Error::BackendError(
                "Render pass not ended before ending command list".to_string(),
            ));
        }
        self.is_recording = false;
        self.record("end".to_string());
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        _render_pass: &Arc<dyn RenderPass>,
        _framebuffer: &Arc<dyn Framebuffer>,
        _clear_values: &[ClearValue],
    ) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        if self.in_render_pass {
            return Err(Error::BackendError("Already inside a render pass".to_string()));
        }
        self.in_render_pass = true;
        self.record("begin_render_pass".to_string());
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::BackendError("Not inside a render pass".to_string()));
        }
        self.in_render_pass = false;
        self.record("end_render_pass".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(format!("set_viewport({}x{})", viewport.width, viewport.height));
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.record(format!("set_scissor({}x{})", scissor.width, scissor.height));
        Ok(())
    }

    fn bind_pipeline(&mut self, _pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::BackendError(
                "bind_pipeline outside a render pass".to_string(),
            ));
        }
        self.record("bind_pipeline".to_string());
        Ok(())
    }

    fn bind_binding_group(
        &mut self,
        _pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        _binding_group: &Arc<dyn BindingGroup>,
    ) -> Result<()> {
        self.record(format!("bind_binding_group(set {})", set_index));
        Ok(())
    }

    fn push_constants(&mut self, _stages: ShaderStageFlags, offset: u32, data: &[u8]) -> Result<()> {
        self.record(format!("push_constants(offset {}, {} bytes)", offset, data.len()));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, _buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()> {
        self.record(format!("bind_vertex_buffer(offset {})", offset));
        Ok(())
    }

    fn bind_index_buffer(
        &mut self,
        _buffer: &Arc<dyn Buffer>,
        offset: u64,
        _index_type: IndexType,
    ) -> Result<()> {
        self.record(format!("bind_index_buffer(offset {})", offset));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::BackendError("draw outside a render pass".to_string()));
        }
        self.record(format!("draw({}, {})", vertex_count, first_vertex));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::BackendError("draw_indexed outside a render pass".to_string()));
        }
        self.record(format!(
            "draw_indexed({}, {}, {})",
            index_count, first_index, vertex_offset
        ));
        Ok(())
    }

    fn transition_texture(
        &mut self,
        _texture: &Arc<dyn Texture>,
        from: ImageLayout,
        to: ImageLayout,
    ) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        self.record(format!("transition({:?} -> {:?})", from, to));
        Ok(())
    }

    fn copy_buffer_to_texture(
        &mut self,
        _src: &Arc<dyn Buffer>,
        src_offset: u64,
        _dst: &Arc<dyn Texture>,
    ) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        self.record(format!("copy_buffer_to_texture(src offset {})", src_offset));
        Ok(())
    }

    fn copy_buffer_to_buffer(
        &mut self,
        _src: &Arc<dyn Buffer>,
        src_offset: u64,
        _dst: &Arc<dyn Buffer>,
        dst_offset: u64,
        size: u64,
    ) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        self.record(format!(
            "copy_buffer_to_buffer({} -> {}, {} bytes)",
            src_offset, dst_offset, size
        ));
        Ok(())
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Mock device that tracks created resources and recorded commands
pub struct MockGraphicsDevice {
    state: Arc<MockState>,
    image_count: u32,
    /// Names of created textures
    created_textures: Arc<Mutex<Vec<String>>>,
    /// Names of created buffers
    created_buffers: Arc<Mutex<Vec<String>>>,
    /// Names of created pipelines
    created_pipelines: Arc<Mutex<Vec<String>>>,
    /// Names of created render passes
    created_render_passes: Arc<Mutex<Vec<String>>>,
    /// Every command recorded by every command list of this device
    commands: Arc<Mutex<Vec<String>>>,
    /// Fences passed to submit (weak view via shared signaled flags is
    /// unnecessary; submit signals the fence reference directly)
    submit_count: AtomicU32,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::with_image_count(3)
    }

    pub fn with_image_count(image_count: u32) -> Self {
        Self {
            state: Arc::new(MockState {
                allocated_bytes: AtomicU64::new(0),
                allocation_count: AtomicU32::new(0),
                force_fence_timeout: AtomicBool::new(false),
            }),
            image_count,
            created_textures: Arc::new(Mutex::new(Vec::new())),
            created_buffers: Arc::new(Mutex::new(Vec::new())),
            created_pipelines: Arc::new(Mutex::new(Vec::new())),
            created_render_passes: Arc::new(Mutex::new(Vec::new())),
            commands: Arc::new(Mutex::new(Vec::new())),
            submit_count: AtomicU32::new(0),
        }
    }

    /// When set, submit leaves fences unsignaled so bounded waits fail
    pub fn set_force_fence_timeout(&self, force: bool) {
        self.state.force_fence_timeout.store(force, Ordering::SeqCst);
    }

    /// Get names of created textures
    pub fn get_created_textures(&self) -> Vec<String> {
        self.created_textures.lock().unwrap().clone()
    }

    /// Get names of created buffers
    pub fn get_created_buffers(&self) -> Vec<String> {
        self.created_buffers.lock().unwrap().clone()
    }

    /// Get names of created pipelines
    pub fn get_created_pipelines(&self) -> Vec<String> {
        self.created_pipelines.lock().unwrap().clone()
    }

    /// Get names of created render passes
    pub fn get_created_render_passes(&self) -> Vec<String> {
        self.created_render_passes.lock().unwrap().clone()
    }

    /// Get all commands recorded so far
    pub fn get_commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Clear the recorded command log
    pub fn clear_commands(&self) {
        self.commands.lock().unwrap().clear();
    }

    /// Number of submissions so far
    pub fn get_submit_count(&self) -> u32 {
        self.submit_count.load(Ordering::SeqCst)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        let info = TextureInfo {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
            mip_levels: desc.mip_levels,
            array_layers: desc.array_layers,
        };
        let byte_size = info.layer_byte_size() * desc.array_layers as u64;
        self.state.track_alloc(byte_size);
        self.created_textures
            .lock()
            .unwrap()
            .push(format!("texture_{}x{}", desc.width, desc.height));
        Ok(Arc::new(MockTexture {
            info,
            byte_size,
            state: Arc::clone(&self.state),
        }))
    }

    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        self.state.track_alloc(desc.size);
        self.created_buffers
            .lock()
            .unwrap()
            .push(format!("buffer_{}", desc.size));
        Ok(Arc::new(MockBuffer {
            size: desc.size,
            location: desc.location,
            data: Mutex::new(vec![0u8; desc.size as usize]),
            state: Arc::clone(&self.state),
        }))
    }

    fn create_sampler(&self, _desc: SamplerDesc) -> Result<Arc<dyn Sampler>> {
        Ok(Arc::new(MockSampler))
    }

    fn create_shader_module(&self, desc: ShaderModuleDesc) -> Result<Arc<dyn ShaderModule>> {
        if desc.code.is_empty() {
            return Err(Error::BackendError(format!(
                "Shader module '{}' has empty code",
                desc.name
            )));
        }
        Ok(Arc::new(MockShaderModule { stage: desc.stage }))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        self.created_render_passes.lock().unwrap().push(desc.name.clone());
        Ok(Arc::new(MockRenderPass { name: desc.name.clone() }))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        Ok(Arc::new(MockFramebuffer {
            width: desc.width,
            height: desc.height,
        }))
    }

    fn create_pipeline_layout(&self, desc: &PipelineLayoutDesc) -> Result<Arc<dyn PipelineLayout>> {
        Ok(Arc::new(MockPipelineLayout { desc: desc.clone() }))
    }

    fn create_pipeline(&self, desc: &PipelineStateDesc) -> Result<Arc<dyn Pipeline>> {
        self.created_pipelines.lock().unwrap().push(desc.name.clone());
        Ok(Arc::new(MockPipeline { name: desc.name.clone() }))
    }

    fn create_binding_group(
        &self,
        _layout: &Arc<dyn PipelineLayout>,
        set_index: u32,
        _resources: &[BindingResource],
    ) -> Result<Arc<dyn BindingGroup>> {
        Ok(Arc::new(MockBindingGroup { set_index }))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList {
            commands: Arc::clone(&self.commands),
            is_recording: false,
            in_render_pass: false,
        }))
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>> {
        Ok(Box::new(MockFence {
            signaled: AtomicBool::new(signaled),
        }))
    }

    fn create_semaphore(&self) -> Result<Arc<dyn Semaphore>> {
        Ok(Arc::new(MockSemaphore))
    }

    fn submit(&self, desc: SubmitDesc<'_>) -> Result<()> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);
        self.commands
            .lock()
            .unwrap()
            .push(format!("submit({} lists)", desc.command_lists.len()));
        if let Some(fence) = desc.fence {
            if !self.state.force_fence_timeout.load(Ordering::SeqCst) {
                // Mock execution is instantaneous: signal on submit
                let mock_fence = fence as *const dyn Fence as *const MockFence;
                unsafe {
                    (*mock_fence).signaled.store(true, Ordering::SeqCst);
                }
            }
        }
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }

    fn swapchain_image_count(&self) -> u32 {
        self.image_count
    }

    fn stats(&self) -> DeviceStats {
        DeviceStats {
            allocated_bytes: self.state.allocated_bytes.load(Ordering::SeqCst),
            allocation_count: self.state.allocation_count.load(Ordering::SeqCst),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
