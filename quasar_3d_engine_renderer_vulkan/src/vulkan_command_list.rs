/// CommandList - Vulkan implementation of the CommandList trait
///
/// Records rendering and transfer commands for later submission. Each
/// command list owns its command pool, so independent owners (texture
/// manager, mesh manager, render system slots) never contend.

use ash::vk;
use std::sync::Arc;

use quasar_3d_engine::quasar3d::device::{
    BindingGroup as DeviceBindingGroup, Buffer as DeviceBuffer, ClearValue,
    CommandList as DeviceCommandList, Framebuffer as DeviceFramebuffer,
    ImageLayout, IndexType, Pipeline as DevicePipeline, Rect2D,
    RenderPass as DeviceRenderPass, ShaderStageFlags, Texture as DeviceTexture,
    Viewport,
};
use quasar_3d_engine::quasar3d::{Error, Result};

use crate::vulkan_binding_group::BindingGroup;
use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{index_type_to_vk, layout_sync_scope, layout_to_vk, shader_stage_flags_to_vk};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_texture::Texture;

/// Vulkan command list implementation
pub struct CommandList {
    /// Shared GPU context
    context: Arc<GpuContext>,
    /// Command pool for allocating the command buffer
    command_pool: vk::CommandPool,
    /// Command buffer for recording
    command_buffer: vk::CommandBuffer,
    /// Whether the command list is currently recording
    is_recording: bool,
    /// Whether we're inside a render pass
    in_render_pass: bool,
    /// Currently bound pipeline layout (for descriptor binds and push constants)
    bound_pipeline_layout: Option<vk::PipelineLayout>,
}

impl CommandList {
    /// Create a new command list with its own pool
    pub fn new(context: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(context.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = context
                .device
                .create_command_pool(&command_pool_create_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create command pool: {:?}", e)))?;

            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffers = context
                .device
                .allocate_command_buffers(&command_buffer_allocate_info)
                .map_err(|e| {
                    context.device.destroy_command_pool(command_pool, None);
                    Error::BackendError(format!("Failed to allocate command buffer: {:?}", e))
                })?;

            Ok(Self {
                context,
                command_pool,
                command_buffer: command_buffers[0],
                is_recording: false,
                in_render_pass: false,
                bound_pipeline_layout: None,
            })
        }
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    fn require_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        Ok(())
    }
}

impl DeviceCommandList for CommandList {
    fn reset(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError(
                "Cannot reset a command list while recording".to_string(),
            ));
        }
        unsafe {
            self.context
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| Error::BackendError(format!("Failed to reset command buffer: {:?}", e)))
        }
    }

    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError("Command list already recording".to_string()));
        }
        unsafe {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.context
                .device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| Error::BackendError(format!("Failed to begin command buffer: {:?}", e)))?;

            self.is_recording = true;
            self.in_render_pass = false;
            self.bound_pipeline_layout = None;
            Ok(())
        }
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording()?;
        if self.in_render_pass {
            return Err(Error::BackendError(
                "Render pass not ended before ending command list".to_string(),
            ));
        }
        unsafe {
            self.context
                .device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| Error::BackendError(format!("Failed to end command buffer: {:?}", e)))?;
            self.is_recording = false;
            Ok(())
        }
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn DeviceRenderPass>,
        framebuffer: &Arc<dyn DeviceFramebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_recording()?;
        if self.in_render_pass {
            return Err(Error::BackendError("Already inside a render pass".to_string()));
        }
        unsafe {
            // Downcast to Vulkan types
            let vk_render_pass = render_pass.as_ref() as *const dyn DeviceRenderPass as *const RenderPass;
            let vk_render_pass = &*vk_render_pass;
            let vk_framebuffer = framebuffer.as_ref() as *const dyn DeviceFramebuffer as *const Framebuffer;
            let vk_framebuffer = &*vk_framebuffer;

            let vk_clear_values: Vec<vk::ClearValue> = clear_values
                .iter()
                .map(|cv| match cv {
                    ClearValue::Color(color) => vk::ClearValue {
                        color: vk::ClearColorValue { float32: *color },
                    },
                    ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                        depth_stencil: vk::ClearDepthStencilValue {
                            depth: *depth,
                            stencil: *stencil,
                        },
                    },
                })
                .collect();

            let begin_info = vk::RenderPassBeginInfo::default()
                .render_pass(vk_render_pass.render_pass)
                .framebuffer(vk_framebuffer.framebuffer)
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent: vk::Extent2D {
                        width: vk_framebuffer.width,
                        height: vk_framebuffer.height,
                    },
                })
                .clear_values(&vk_clear_values);

            self.context.device.cmd_begin_render_pass(
                self.command_buffer,
                &begin_info,
                vk::SubpassContents::INLINE,
            );
            self.in_render_pass = true;
            Ok(())
        }
    }

    fn end_render_pass(&mut self) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::BackendError("Not inside a render pass".to_string()));
        }
        unsafe {
            self.context.device.cmd_end_render_pass(self.command_buffer);
            self.in_render_pass = false;
            Ok(())
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording()?;
        unsafe {
            self.context.device.cmd_set_viewport(
                self.command_buffer,
                0,
                &[vk::Viewport {
                    x: viewport.x,
                    y: viewport.y,
                    width: viewport.width,
                    height: viewport.height,
                    min_depth: viewport.min_depth,
                    max_depth: viewport.max_depth,
                }],
            );
            Ok(())
        }
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_recording()?;
        unsafe {
            self.context.device.cmd_set_scissor(
                self.command_buffer,
                0,
                &[vk::Rect2D {
                    offset: vk::Offset2D {
                        x: scissor.x,
                        y: scissor.y,
                    },
                    extent: vk::Extent2D {
                        width: scissor.width,
                        height: scissor.height,
                    },
                }],
            );
            Ok(())
        }
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn DevicePipeline>) -> Result<()> {
        self.require_recording()?;
        unsafe {
            // Downcast to Vulkan type
            let vk_pipeline = pipeline.as_ref() as *const dyn DevicePipeline as *const Pipeline;
            let vk_pipeline = &*vk_pipeline;

            self.context.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );
            self.bound_pipeline_layout = Some(vk_pipeline.layout);
            Ok(())
        }
    }

    fn bind_binding_group(
        &mut self,
        pipeline: &Arc<dyn DevicePipeline>,
        set_index: u32,
        binding_group: &Arc<dyn DeviceBindingGroup>,
    ) -> Result<()> {
        self.require_recording()?;
        unsafe {
            let vk_pipeline = pipeline.as_ref() as *const dyn DevicePipeline as *const Pipeline;
            let vk_pipeline = &*vk_pipeline;
            let vk_group = binding_group.as_ref() as *const dyn DeviceBindingGroup as *const BindingGroup;
            let vk_group = &*vk_group;

            self.context.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.layout,
                set_index,
                &[vk_group.descriptor_set],
                &[],
            );
            Ok(())
        }
    }

    fn push_constants(&mut self, stages: ShaderStageFlags, offset: u32, data: &[u8]) -> Result<()> {
        self.require_recording()?;
        let layout = self.bound_pipeline_layout.ok_or_else(|| {
            Error::BackendError("push_constants requires a bound pipeline".to_string())
        })?;
        unsafe {
            self.context.device.cmd_push_constants(
                self.command_buffer,
                layout,
                shader_stage_flags_to_vk(stages),
                offset,
                data,
            );
            Ok(())
        }
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn DeviceBuffer>, offset: u64) -> Result<()> {
        self.require_recording()?;
        unsafe {
            let vk_buffer = buffer.as_ref() as *const dyn DeviceBuffer as *const Buffer;
            let vk_buffer = &*vk_buffer;

            self.context.device.cmd_bind_vertex_buffers(
                self.command_buffer,
                0,
                &[vk_buffer.buffer],
                &[offset],
            );
            Ok(())
        }
    }

    fn bind_index_buffer(
        &mut self,
        buffer: &Arc<dyn DeviceBuffer>,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()> {
        self.require_recording()?;
        unsafe {
            let vk_buffer = buffer.as_ref() as *const dyn DeviceBuffer as *const Buffer;
            let vk_buffer = &*vk_buffer;

            self.context.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
            Ok(())
        }
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::BackendError("draw outside a render pass".to_string()));
        }
        unsafe {
            self.context
                .device
                .cmd_draw(self.command_buffer, vertex_count, 1, first_vertex, 0);
            Ok(())
        }
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::BackendError("draw_indexed outside a render pass".to_string()));
        }
        unsafe {
            self.context.device.cmd_draw_indexed(
                self.command_buffer,
                index_count,
                1,
                first_index,
                vertex_offset,
                0,
            );
            Ok(())
        }
    }

    fn transition_texture(
        &mut self,
        texture: &Arc<dyn DeviceTexture>,
        from: ImageLayout,
        to: ImageLayout,
    ) -> Result<()> {
        self.require_recording()?;
        unsafe {
            let vk_texture = texture.as_ref() as *const dyn DeviceTexture as *const Texture;
            let vk_texture = &*vk_texture;

            let (src_stage, src_access) = layout_sync_scope(from);
            let (dst_stage, dst_access) = layout_sync_scope(to);

            let barrier = vk::ImageMemoryBarrier::default()
                .old_layout(layout_to_vk(from))
                .new_layout(layout_to_vk(to))
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(vk_texture.image)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk_texture.aspect_mask(),
                    base_mip_level: 0,
                    level_count: vk_texture.info.mip_levels,
                    base_array_layer: 0,
                    layer_count: vk_texture.info.array_layers,
                })
                .src_access_mask(src_access)
                .dst_access_mask(dst_access);

            self.context.device.cmd_pipeline_barrier(
                self.command_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
            Ok(())
        }
    }

    fn copy_buffer_to_texture(
        &mut self,
        src: &Arc<dyn DeviceBuffer>,
        src_offset: u64,
        dst: &Arc<dyn DeviceTexture>,
    ) -> Result<()> {
        self.require_recording()?;
        unsafe {
            let vk_buffer = src.as_ref() as *const dyn DeviceBuffer as *const Buffer;
            let vk_buffer = &*vk_buffer;
            let vk_texture = dst.as_ref() as *const dyn DeviceTexture as *const Texture;
            let vk_texture = &*vk_texture;

            let region = vk::BufferImageCopy::default()
                .buffer_offset(src_offset)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk_texture.aspect_mask(),
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                .image_extent(vk::Extent3D {
                    width: vk_texture.info.width,
                    height: vk_texture.info.height,
                    depth: 1,
                });

            self.context.device.cmd_copy_buffer_to_image(
                self.command_buffer,
                vk_buffer.buffer,
                vk_texture.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
            Ok(())
        }
    }

    fn copy_buffer_to_buffer(
        &mut self,
        src: &Arc<dyn DeviceBuffer>,
        src_offset: u64,
        dst: &Arc<dyn DeviceBuffer>,
        dst_offset: u64,
        size: u64,
    ) -> Result<()> {
        self.require_recording()?;
        unsafe {
            let vk_src = src.as_ref() as *const dyn DeviceBuffer as *const Buffer;
            let vk_src = &*vk_src;
            let vk_dst = dst.as_ref() as *const dyn DeviceBuffer as *const Buffer;
            let vk_dst = &*vk_dst;

            let region = vk::BufferCopy::default()
                .src_offset(src_offset)
                .dst_offset(dst_offset)
                .size(size);

            self.context.device.cmd_copy_buffer(
                self.command_buffer,
                vk_src.buffer,
                vk_dst.buffer,
                &[region],
            );
            Ok(())
        }
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
