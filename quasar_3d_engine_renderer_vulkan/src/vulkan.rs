/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Headless bring-up: instance, first physical device, one graphics
/// queue, gpu-allocator. Presentation (surface/swapchain) is owned by the
/// application's windowing layer and is not part of this device.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use quasar_3d_engine::quasar3d::device::{
    BindingGroup as DeviceBindingGroup, BindingResource, Buffer as DeviceBuffer,
    BufferDesc, CommandList as DeviceCommandList, DeviceConfig, DeviceStats,
    DynamicStateFlags, Fence as DeviceFence, Framebuffer as DeviceFramebuffer,
    FramebufferDesc, GraphicsDevice, MemoryLocation, Pipeline as DevicePipeline,
    PipelineLayout as DevicePipelineLayout, PipelineLayoutDesc, PipelineStateDesc,
    RenderPass as DeviceRenderPass, RenderPassDesc, Sampler as DeviceSampler,
    SamplerDesc, Semaphore as DeviceSemaphore, ShaderModule as DeviceShaderModule,
    ShaderModuleDesc, SubmitDesc, Texture as DeviceTexture, TextureDesc,
    TextureInfo,
};
use quasar_3d_engine::quasar3d::log::Log;
use quasar_3d_engine::quasar3d::{Error, Result};
use quasar_3d_engine::{engine_err, engine_error, engine_info};

use crate::vulkan_binding_group::BindingGroup;
use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::CommandList;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{
    binding_type_to_vk, blend_factor_to_vk, blend_op_to_vk, buffer_format_to_vk,
    buffer_usage_to_vk, compare_op_to_vk, cull_mode_to_vk, format_to_vk,
    front_face_to_vk, layout_to_vk, load_op_to_vk, polygon_mode_to_vk,
    sample_count_to_vk, shader_stage_flags_to_vk, shader_stage_to_vk,
    stage_mask_to_vk, store_op_to_vk, texture_usage_to_vk, topology_to_vk,
    vertex_input_rate_to_vk, access_mask_to_vk,
};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::{Pipeline, PipelineLayout};
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_sampler::{Sampler, SamplerCache};
use crate::vulkan_shader::ShaderModule;
use crate::vulkan_sync::{Fence, Semaphore};
use crate::vulkan_texture::Texture;

/// Vulkan graphics device
///
/// Central object for creating device resources and submitting commands.
pub struct VulkanGraphicsDevice {
    /// Vulkan entry (keeps the loader alive)
    _entry: ash::Entry,
    /// Vulkan instance
    instance: ash::Instance,
    /// Physical device
    #[allow(dead_code)]
    physical_device: vk::PhysicalDevice,

    /// GPU memory allocator (dropped manually before the device)
    allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Descriptor pools for binding group allocation (grows when exhausted)
    descriptor_pools: Mutex<Vec<vk::DescriptorPool>>,
    /// Internal sampler cache (creates VkSampler on first use)
    sampler_cache: Mutex<SamplerCache>,
    /// Serializes queue submission (the trait is &self)
    queue_lock: Mutex<()>,

    /// Number of presentable images reported to the render system
    image_count: u32,

    /// Debug messenger (validation builds only)
    #[cfg(feature = "vulkan-validation")]
    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,

    /// Shared GPU context for all resources
    context: Arc<GpuContext>,

    log: Log,
}

impl VulkanGraphicsDevice {
    /// Create a descriptor pool with fixed capacity (1024 sets).
    /// Called during init and when the current pool is exhausted.
    fn create_descriptor_pool(device: &ash::Device, log: &Log) -> Result<vk::DescriptorPool> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: 2048,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 1024,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::STORAGE_BUFFER,
                descriptor_count: 1024,
            },
        ];
        let info = vk::DescriptorPoolCreateInfo::default()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .pool_sizes(&pool_sizes)
            .max_sets(1024);

        unsafe {
            device
                .create_descriptor_pool(&info, None)
                .map_err(|e| engine_err!(log, "quasar3d::vulkan", "Failed to create descriptor pool: {:?}", e))
        }
    }

    /// Create a new headless Vulkan device
    pub fn new(config: DeviceConfig, log: Log) -> Result<Self> {
        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load().map_err(|e| {
                engine_error!(log, "quasar3d::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            // Application Info
            let app_name = CString::new(config.app_name.as_str()).map_err(|_| {
                Error::InvalidResource("Application name contains a nul byte".to_string())
            })?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Quasar3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            // Headless: no surface extensions
            #[allow(unused_mut)]
            let mut extension_names: Vec<*const std::ffi::c_char> = Vec::new();
            #[cfg(feature = "vulkan-validation")]
            if config.enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            // Validation layers
            let layer_names = if cfg!(feature = "vulkan-validation") && config.enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                engine_error!(log, "quasar3d::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            // Setup debug messenger if validation is enabled
            #[cfg(feature = "vulkan-validation")]
            let debug_utils = if config.enable_validation {
                let loader = ash::ext::debug_utils::Instance::new(&entry, &instance);
                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(
                        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                    )
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                    )
                    .pfn_user_callback(Some(crate::vulkan_debug::vulkan_debug_callback));
                let messenger = loader
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| {
                        engine_error!(log, "quasar3d::vulkan", "Failed to create debug messenger: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
                    })?;
                Some((loader, messenger))
            } else {
                None
            };

            // Pick Physical Device
            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                engine_error!(log, "quasar3d::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;
            let physical_device = physical_devices.into_iter().next().ok_or_else(|| {
                engine_error!(log, "quasar3d::vulkan", "No Vulkan-capable GPU found");
                Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
            })?;

            // Find the graphics queue family
            let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
            let graphics_family_index = queue_families
                .iter()
                .enumerate()
                .find(|(_, qf)| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|(i, _)| i as u32)
                .ok_or_else(|| {
                    engine_error!(log, "quasar3d::vulkan", "No graphics queue family found");
                    Error::InitializationFailed("No graphics queue family found".to_string())
                })?;

            // Create Logical Device
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .queue_priorities(&queue_priorities)];

            let device_features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!(log, "quasar3d::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);

            // Create GPU allocator
            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                engine_error!(log, "quasar3d::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create GPU allocator: {:?}", e))
            })?;
            let allocator = Arc::new(Mutex::new(allocator));

            let initial_pool = Self::create_descriptor_pool(&device, &log)?;

            let context = Arc::new(GpuContext::new(
                device,
                Arc::clone(&allocator),
                graphics_queue,
                graphics_family_index,
            ));

            engine_info!(log, "quasar3d::vulkan", "Vulkan device initialized (headless)");

            Ok(Self {
                _entry: entry,
                instance,
                physical_device,
                allocator: ManuallyDrop::new(allocator),
                descriptor_pools: Mutex::new(vec![initial_pool]),
                sampler_cache: Mutex::new(SamplerCache::new()),
                queue_lock: Mutex::new(()),
                image_count: config.image_count.max(1),
                #[cfg(feature = "vulkan-validation")]
                debug_utils,
                context,
                log,
            })
        }
    }

    fn memory_location(location: MemoryLocation) -> gpu_allocator::MemoryLocation {
        match location {
            MemoryLocation::GpuOnly => gpu_allocator::MemoryLocation::GpuOnly,
            MemoryLocation::CpuToGpu => gpu_allocator::MemoryLocation::CpuToGpu,
        }
    }

    /// Allocate a descriptor set, growing the pool list when exhausted
    fn allocate_descriptor_set(&self, set_layout: vk::DescriptorSetLayout) -> Result<(vk::DescriptorSet, vk::DescriptorPool)> {
        let mut pools = self.descriptor_pools.lock().unwrap();
        let set_layouts = [set_layout];

        unsafe {
            let pool = match pools.last() {
                Some(&pool) => pool,
                None => {
                    let fresh = Self::create_descriptor_pool(&self.context.device, &self.log)?;
                    pools.push(fresh);
                    fresh
                }
            };
            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(pool)
                .set_layouts(&set_layouts);

            match self.context.device.allocate_descriptor_sets(&allocate_info) {
                Ok(sets) => Ok((sets[0], pool)),
                Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {
                    // Grow: add a fresh pool and retry once
                    let fresh = Self::create_descriptor_pool(&self.context.device, &self.log)?;
                    pools.push(fresh);
                    let allocate_info = vk::DescriptorSetAllocateInfo::default()
                        .descriptor_pool(fresh)
                        .set_layouts(&set_layouts);
                    let sets = self
                        .context
                        .device
                        .allocate_descriptor_sets(&allocate_info)
                        .map_err(|e| {
                            engine_err!(self.log, "quasar3d::vulkan", "Failed to allocate descriptor set: {:?}", e)
                        })?;
                    Ok((sets[0], fresh))
                }
                Err(e) => Err(engine_err!(
                    self.log,
                    "quasar3d::vulkan",
                    "Failed to allocate descriptor set: {:?}",
                    e
                )),
            }
        }
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn DeviceTexture>> {
        unsafe {
            let format = format_to_vk(desc.format);
            let array_layers = desc.array_layers.max(1);
            let mip_levels = desc.mip_levels.max(1);

            let view_type = if array_layers > 1 {
                vk::ImageViewType::TYPE_2D_ARRAY
            } else {
                vk::ImageViewType::TYPE_2D
            };

            let aspect_mask = if desc.format.is_depth() {
                vk::ImageAspectFlags::DEPTH
            } else {
                vk::ImageAspectFlags::COLOR
            };

            // Create image
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D {
                    width: desc.width,
                    height: desc.height,
                    depth: 1,
                })
                .mip_levels(mip_levels)
                .array_layers(array_layers)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(texture_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = self
                .context
                .device
                .create_image(&image_create_info, None)
                .map_err(|e| engine_err!(self.log, "quasar3d::vulkan", "Failed to create texture image: {:?}", e))?;

            // Allocate memory
            let requirements = self.context.device.get_image_memory_requirements(image);
            let allocation = self
                .allocator
                .lock()
                .unwrap()
                .allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                    name: "texture",
                    requirements,
                    location: gpu_allocator::MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    self.context.device.destroy_image(image, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!(
                        self.log,
                        "quasar3d::vulkan",
                        "Out of GPU memory for texture ({}x{}, layers: {}, {:.2} MB)",
                        desc.width,
                        desc.height,
                        array_layers,
                        size_mb
                    );
                    Error::OutOfMemory
                })?;
            let allocation_size = requirements.size;

            // Bind memory
            self.context
                .device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| engine_err!(self.log, "quasar3d::vulkan", "Failed to bind texture image memory: {:?}", e))?;

            // Create image view
            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(view_type)
                .format(format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask,
                    base_mip_level: 0,
                    level_count: mip_levels,
                    base_array_layer: 0,
                    layer_count: array_layers,
                });

            let view = self
                .context
                .device
                .create_image_view(&view_create_info, None)
                .map_err(|e| engine_err!(self.log, "quasar3d::vulkan", "Failed to create texture image view: {:?}", e))?;

            self.context.track_alloc(allocation_size);

            Ok(Arc::new(Texture {
                context: Arc::clone(&self.context),
                image,
                view,
                allocation: Some(allocation),
                allocation_size,
                info: TextureInfo {
                    width: desc.width,
                    height: desc.height,
                    format: desc.format,
                    usage: desc.usage,
                    mip_levels,
                    array_layers,
                },
            }))
        }
    }

    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn DeviceBuffer>> {
        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(buffer_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = self
                .context
                .device
                .create_buffer(&buffer_create_info, None)
                .map_err(|e| {
                    engine_err!(self.log, "quasar3d::vulkan", "Failed to create buffer of size {} bytes: {:?}", desc.size, e)
                })?;

            let requirements = self.context.device.get_buffer_memory_requirements(buffer);
            let allocation = self
                .allocator
                .lock()
                .unwrap()
                .allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                    name: "buffer",
                    requirements,
                    location: Self::memory_location(desc.location),
                    linear: true,
                    allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    self.context.device.destroy_buffer(buffer, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!(
                        self.log,
                        "quasar3d::vulkan",
                        "Out of GPU memory for buffer (required: {:.2} MB)",
                        size_mb
                    );
                    Error::OutOfMemory
                })?;
            let allocation_size = requirements.size;

            self.context
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| engine_err!(self.log, "quasar3d::vulkan", "Failed to bind buffer memory: {:?}", e))?;

            self.context.track_alloc(allocation_size);

            Ok(Arc::new(Buffer {
                context: Arc::clone(&self.context),
                buffer,
                allocation: Mutex::new(Some(allocation)),
                allocation_size,
                size: desc.size,
            }))
        }
    }

    fn create_sampler(&self, desc: SamplerDesc) -> Result<Arc<dyn DeviceSampler>> {
        let sampler = self
            .sampler_cache
            .lock()
            .unwrap()
            .get_or_create(&self.context.device, &desc)?;
        Ok(Arc::new(Sampler { sampler }))
    }

    fn create_shader_module(&self, desc: ShaderModuleDesc) -> Result<Arc<dyn DeviceShaderModule>> {
        if desc.code.is_empty() || desc.code.len() % 4 != 0 {
            return Err(Error::InvalidResource(format!(
                "Shader module '{}' has invalid SPIR-V ({} bytes)",
                desc.name,
                desc.code.len()
            )));
        }
        let code: Vec<u32> = desc
            .code
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        unsafe {
            let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
            let module = self
                .context
                .device
                .create_shader_module(&create_info, None)
                .map_err(|e| {
                    engine_err!(self.log, "quasar3d::vulkan", "Failed to create shader module '{}': {:?}", desc.name, e)
                })?;

            Ok(Arc::new(ShaderModule {
                context: Arc::clone(&self.context),
                module,
                stage: desc.stage,
            }))
        }
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn DeviceRenderPass>> {
        unsafe {
            let attachments: Vec<vk::AttachmentDescription> = desc
                .attachments
                .iter()
                .map(|a| {
                    vk::AttachmentDescription::default()
                        .format(format_to_vk(a.format))
                        .samples(vk::SampleCountFlags::TYPE_1)
                        .load_op(load_op_to_vk(a.load_op))
                        .store_op(store_op_to_vk(a.store_op))
                        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                        .initial_layout(layout_to_vk(a.initial_layout))
                        .final_layout(layout_to_vk(a.final_layout))
                })
                .collect();

            // Attachment references must outlive the subpass descriptions
            let mut color_refs: Vec<Vec<vk::AttachmentReference>> = Vec::new();
            let mut input_refs: Vec<Vec<vk::AttachmentReference>> = Vec::new();
            let mut depth_refs: Vec<Option<vk::AttachmentReference>> = Vec::new();
            for subpass in &desc.subpasses {
                color_refs.push(
                    subpass
                        .color_attachments
                        .iter()
                        .map(|&i| vk::AttachmentReference {
                            attachment: i,
                            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                        })
                        .collect(),
                );
                input_refs.push(
                    subpass
                        .input_attachments
                        .iter()
                        .map(|&i| vk::AttachmentReference {
                            attachment: i,
                            layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                        })
                        .collect(),
                );
                depth_refs.push(subpass.depth_stencil_attachment.map(|i| {
                    vk::AttachmentReference {
                        attachment: i,
                        layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                    }
                }));
            }

            let subpasses: Vec<vk::SubpassDescription> = (0..desc.subpasses.len())
                .map(|i| {
                    let mut subpass = vk::SubpassDescription::default()
                        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                        .color_attachments(&color_refs[i])
                        .input_attachments(&input_refs[i]);
                    if let Some(depth) = &depth_refs[i] {
                        subpass = subpass.depth_stencil_attachment(depth);
                    }
                    subpass
                })
                .collect();

            let dependencies: Vec<vk::SubpassDependency> = desc
                .dependencies
                .iter()
                .map(|d| {
                    vk::SubpassDependency::default()
                        .src_subpass(d.src_subpass.unwrap_or(vk::SUBPASS_EXTERNAL))
                        .dst_subpass(d.dst_subpass.unwrap_or(vk::SUBPASS_EXTERNAL))
                        .src_stage_mask(stage_mask_to_vk(d.src_stage))
                        .dst_stage_mask(stage_mask_to_vk(d.dst_stage))
                        .src_access_mask(access_mask_to_vk(d.src_access))
                        .dst_access_mask(access_mask_to_vk(d.dst_access))
                })
                .collect();

            let create_info = vk::RenderPassCreateInfo::default()
                .attachments(&attachments)
                .subpasses(&subpasses)
                .dependencies(&dependencies);

            let render_pass = self
                .context
                .device
                .create_render_pass(&create_info, None)
                .map_err(|e| {
                    engine_err!(self.log, "quasar3d::vulkan", "Failed to create render pass '{}': {:?}", desc.name, e)
                })?;

            Ok(Arc::new(RenderPass {
                context: Arc::clone(&self.context),
                render_pass,
            }))
        }
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn DeviceFramebuffer>> {
        unsafe {
            // Downcast attachments to collect their image views
            let views: Vec<vk::ImageView> = desc
                .attachments
                .iter()
                .map(|t| {
                    let vk_texture = t.as_ref() as *const dyn DeviceTexture as *const Texture;
                    (*vk_texture).view
                })
                .collect();
            let vk_render_pass =
                desc.render_pass.as_ref() as *const dyn DeviceRenderPass as *const RenderPass;
            let vk_render_pass = &*vk_render_pass;

            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(vk_render_pass.render_pass)
                .attachments(&views)
                .width(desc.width)
                .height(desc.height)
                .layers(1);

            let framebuffer = self
                .context
                .device
                .create_framebuffer(&create_info, None)
                .map_err(|e| engine_err!(self.log, "quasar3d::vulkan", "Failed to create framebuffer: {:?}", e))?;

            Ok(Arc::new(Framebuffer {
                context: Arc::clone(&self.context),
                framebuffer,
                attachments: desc.attachments.clone(),
                width: desc.width,
                height: desc.height,
            }))
        }
    }

    fn create_pipeline_layout(&self, desc: &PipelineLayoutDesc) -> Result<Arc<dyn DevicePipelineLayout>> {
        unsafe {
            let mut set_layouts: Vec<vk::DescriptorSetLayout> = Vec::with_capacity(desc.set_layouts.len());
            for set in &desc.set_layouts {
                let bindings: Vec<vk::DescriptorSetLayoutBinding> = set
                    .bindings
                    .iter()
                    .map(|b| {
                        vk::DescriptorSetLayoutBinding::default()
                            .binding(b.binding)
                            .descriptor_type(binding_type_to_vk(b.binding_type))
                            .descriptor_count(b.count)
                            .stage_flags(shader_stage_flags_to_vk(b.stages))
                    })
                    .collect();
                let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
                match self.context.device.create_descriptor_set_layout(&create_info, None) {
                    Ok(set_layout) => set_layouts.push(set_layout),
                    Err(e) => {
                        // No partially constructed layouts survive
                        for set_layout in set_layouts {
                            self.context.device.destroy_descriptor_set_layout(set_layout, None);
                        }
                        return Err(engine_err!(
                            self.log,
                            "quasar3d::vulkan",
                            "Failed to create descriptor set layout for '{}': {:?}",
                            desc.name,
                            e
                        ));
                    }
                }
            }

            let push_constant_ranges: Vec<vk::PushConstantRange> = desc
                .push_constant_ranges
                .iter()
                .map(|r| {
                    vk::PushConstantRange::default()
                        .stage_flags(shader_stage_flags_to_vk(r.stages))
                        .offset(r.offset)
                        .size(r.size)
                })
                .collect();

            let create_info = vk::PipelineLayoutCreateInfo::default()
                .set_layouts(&set_layouts)
                .push_constant_ranges(&push_constant_ranges);

            let layout = match self.context.device.create_pipeline_layout(&create_info, None) {
                Ok(layout) => layout,
                Err(e) => {
                    for set_layout in set_layouts {
                        self.context.device.destroy_descriptor_set_layout(set_layout, None);
                    }
                    return Err(engine_err!(
                        self.log,
                        "quasar3d::vulkan",
                        "Failed to create pipeline layout '{}': {:?}",
                        desc.name,
                        e
                    ));
                }
            };

            Ok(Arc::new(PipelineLayout {
                context: Arc::clone(&self.context),
                layout,
                set_layouts,
            }))
        }
    }

    fn create_pipeline(&self, desc: &PipelineStateDesc) -> Result<Arc<dyn DevicePipeline>> {
        unsafe {
            // Shader stages (entry-point names must outlive the infos)
            let mut entry_names: Vec<CString> = Vec::with_capacity(desc.stages.len());
            for stage in &desc.stages {
                entry_names.push(CString::new(stage.entry_point.as_str()).map_err(|_| {
                    Error::InvalidResource(format!(
                        "Pipeline '{}' entry point contains a nul byte",
                        desc.name
                    ))
                })?);
            }
            let stage_infos: Vec<vk::PipelineShaderStageCreateInfo> = desc
                .stages
                .iter()
                .zip(&entry_names)
                .map(|(stage, name)| {
                    let module =
                        stage.module.as_ref() as *const dyn DeviceShaderModule as *const ShaderModule;
                    let module = &*module;
                    vk::PipelineShaderStageCreateInfo::default()
                        .stage(shader_stage_to_vk(module.stage))
                        .module(module.module)
                        .name(name)
                })
                .collect();

            // Vertex input
            let bindings: Vec<vk::VertexInputBindingDescription> = desc
                .vertex_layout
                .bindings
                .iter()
                .map(|b| {
                    vk::VertexInputBindingDescription::default()
                        .binding(b.binding)
                        .stride(b.stride)
                        .input_rate(vertex_input_rate_to_vk(b.input_rate))
                })
                .collect();
            let attributes: Vec<vk::VertexInputAttributeDescription> = desc
                .vertex_layout
                .attributes
                .iter()
                .map(|a| {
                    vk::VertexInputAttributeDescription::default()
                        .location(a.location)
                        .binding(a.binding)
                        .format(buffer_format_to_vk(a.format))
                        .offset(a.offset)
                })
                .collect();
            let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(&bindings)
                .vertex_attribute_descriptions(&attributes);

            let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(topology_to_vk(desc.topology));

            // One viewport/scissor pair, values supplied at record time
            let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                .viewport_count(1)
                .scissor_count(1);

            let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
                .polygon_mode(polygon_mode_to_vk(desc.rasterization.polygon_mode))
                .cull_mode(cull_mode_to_vk(desc.rasterization.cull_mode))
                .front_face(front_face_to_vk(desc.rasterization.front_face))
                .line_width(desc.rasterization.line_width);

            let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
                .rasterization_samples(sample_count_to_vk(desc.multisample.samples));

            let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(desc.depth_stencil.depth_test)
                .depth_write_enable(desc.depth_stencil.depth_write)
                .depth_compare_op(compare_op_to_vk(desc.depth_stencil.compare_op));

            let blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = desc
                .color_blend
                .attachments
                .iter()
                .map(|a| {
                    vk::PipelineColorBlendAttachmentState::default()
                        .blend_enable(a.blend_enable)
                        .src_color_blend_factor(blend_factor_to_vk(a.src_color))
                        .dst_color_blend_factor(blend_factor_to_vk(a.dst_color))
                        .color_blend_op(blend_op_to_vk(a.color_op))
                        .src_alpha_blend_factor(blend_factor_to_vk(a.src_alpha))
                        .dst_alpha_blend_factor(blend_factor_to_vk(a.dst_alpha))
                        .alpha_blend_op(blend_op_to_vk(a.alpha_op))
                        .color_write_mask(vk::ColorComponentFlags::RGBA)
                })
                .collect();
            let color_blend_state =
                vk::PipelineColorBlendStateCreateInfo::default().attachments(&blend_attachments);

            let mut dynamic_states = Vec::new();
            if desc.dynamic_state.contains(DynamicStateFlags::VIEWPORT) {
                dynamic_states.push(vk::DynamicState::VIEWPORT);
            }
            if desc.dynamic_state.contains(DynamicStateFlags::SCISSOR) {
                dynamic_states.push(vk::DynamicState::SCISSOR);
            }
            let dynamic_state =
                vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

            // Downcast layout and render pass
            let vk_layout =
                desc.layout.as_ref() as *const dyn DevicePipelineLayout as *const PipelineLayout;
            let vk_layout = &*vk_layout;
            let vk_render_pass =
                desc.render_pass.as_ref() as *const dyn DeviceRenderPass as *const RenderPass;
            let vk_render_pass = &*vk_render_pass;

            let create_info = vk::GraphicsPipelineCreateInfo::default()
                .stages(&stage_infos)
                .vertex_input_state(&vertex_input_state)
                .input_assembly_state(&input_assembly_state)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterization_state)
                .multisample_state(&multisample_state)
                .depth_stencil_state(&depth_stencil_state)
                .color_blend_state(&color_blend_state)
                .dynamic_state(&dynamic_state)
                .layout(vk_layout.layout)
                .render_pass(vk_render_pass.render_pass)
                .subpass(desc.subpass);

            let pipelines = self
                .context
                .device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, e)| {
                    engine_err!(self.log, "quasar3d::vulkan", "Failed to create pipeline '{}': {:?}", desc.name, e)
                })?;

            Ok(Arc::new(Pipeline {
                context: Arc::clone(&self.context),
                pipeline: pipelines[0],
                layout: vk_layout.layout,
                layout_ref: Arc::clone(&desc.layout),
            }))
        }
    }

    fn create_binding_group(
        &self,
        layout: &Arc<dyn DevicePipelineLayout>,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn DeviceBindingGroup>> {
        unsafe {
            let vk_layout = layout.as_ref() as *const dyn DevicePipelineLayout as *const PipelineLayout;
            let vk_layout = &*vk_layout;

            let set_layout = *vk_layout.set_layouts.get(set_index as usize).ok_or_else(|| {
                Error::InvalidResource(format!(
                    "Binding group set index {} out of range ({} set layouts)",
                    set_index,
                    vk_layout.set_layouts.len()
                ))
            })?;

            let (descriptor_set, pool) = self.allocate_descriptor_set(set_layout)?;

            // Build the write infos (storage must outlive the writes)
            let mut image_infos: Vec<vk::DescriptorImageInfo> = Vec::new();
            let mut buffer_infos: Vec<vk::DescriptorBufferInfo> = Vec::new();
            let mut bound_textures = Vec::new();
            let mut bound_buffers = Vec::new();
            for resource in resources {
                match resource {
                    BindingResource::Texture { texture, sampler } => {
                        let vk_texture = texture.as_ref() as *const dyn DeviceTexture as *const Texture;
                        let vk_sampler = sampler.as_ref() as *const dyn DeviceSampler as *const Sampler;
                        image_infos.push(
                            vk::DescriptorImageInfo::default()
                                .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                                .image_view((*vk_texture).view)
                                .sampler((*vk_sampler).sampler),
                        );
                        bound_textures.push((Arc::clone(texture), Arc::clone(sampler)));
                    }
                    BindingResource::UniformBuffer { buffer, offset, range } => {
                        let vk_buffer = buffer.as_ref() as *const dyn DeviceBuffer as *const Buffer;
                        buffer_infos.push(
                            vk::DescriptorBufferInfo::default()
                                .buffer((*vk_buffer).buffer)
                                .offset(*offset)
                                .range(*range),
                        );
                        bound_buffers.push(Arc::clone(buffer));
                    }
                }
            }

            let mut writes: Vec<vk::WriteDescriptorSet> = Vec::with_capacity(resources.len());
            let mut image_cursor = 0usize;
            let mut buffer_cursor = 0usize;
            for (binding, resource) in resources.iter().enumerate() {
                let write = vk::WriteDescriptorSet::default()
                    .dst_set(descriptor_set)
                    .dst_binding(binding as u32)
                    .dst_array_element(0);
                match resource {
                    BindingResource::Texture { .. } => {
                        writes.push(
                            write
                                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                                .image_info(std::slice::from_ref(&image_infos[image_cursor])),
                        );
                        image_cursor += 1;
                    }
                    BindingResource::UniformBuffer { .. } => {
                        writes.push(
                            write
                                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                                .buffer_info(std::slice::from_ref(&buffer_infos[buffer_cursor])),
                        );
                        buffer_cursor += 1;
                    }
                }
            }

            self.context.device.update_descriptor_sets(&writes, &[]);

            Ok(Arc::new(BindingGroup {
                context: Arc::clone(&self.context),
                descriptor_set,
                pool,
                set_index,
                bound_textures,
                bound_buffers,
            }))
        }
    }

    fn create_command_list(&self) -> Result<Box<dyn DeviceCommandList>> {
        Ok(Box::new(CommandList::new(Arc::clone(&self.context))?))
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn DeviceFence>> {
        unsafe {
            let flags = if signaled {
                vk::FenceCreateFlags::SIGNALED
            } else {
                vk::FenceCreateFlags::empty()
            };
            let fence = self
                .context
                .device
                .create_fence(&vk::FenceCreateInfo::default().flags(flags), None)
                .map_err(|e| engine_err!(self.log, "quasar3d::vulkan", "Failed to create fence: {:?}", e))?;

            Ok(Box::new(Fence {
                context: Arc::clone(&self.context),
                fence,
            }))
        }
    }

    fn create_semaphore(&self) -> Result<Arc<dyn DeviceSemaphore>> {
        unsafe {
            let semaphore = self
                .context
                .device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| engine_err!(self.log, "quasar3d::vulkan", "Failed to create semaphore: {:?}", e))?;

            Ok(Arc::new(Semaphore {
                context: Arc::clone(&self.context),
                semaphore,
            }))
        }
    }

    fn submit(&self, desc: SubmitDesc<'_>) -> Result<()> {
        unsafe {
            // Collect command buffers
            let command_buffers: Vec<vk::CommandBuffer> = desc
                .command_lists
                .iter()
                .map(|cmd| {
                    let vk_cmd = *cmd as *const dyn DeviceCommandList as *const CommandList;
                    (*vk_cmd).command_buffer()
                })
                .collect();

            let wait_semaphores: Vec<vk::Semaphore> = desc
                .wait_semaphores
                .iter()
                .map(|s| {
                    let vk_semaphore = *s as *const dyn DeviceSemaphore as *const Semaphore;
                    (*vk_semaphore).semaphore
                })
                .collect();
            let wait_stages: Vec<vk::PipelineStageFlags> = wait_semaphores
                .iter()
                .map(|_| vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .collect();
            let signal_semaphores: Vec<vk::Semaphore> = desc
                .signal_semaphores
                .iter()
                .map(|s| {
                    let vk_semaphore = *s as *const dyn DeviceSemaphore as *const Semaphore;
                    (*vk_semaphore).semaphore
                })
                .collect();
            let fence = desc
                .fence
                .map(|f| {
                    let vk_fence = f as *const dyn DeviceFence as *const Fence;
                    (*vk_fence).fence
                })
                .unwrap_or(vk::Fence::null());

            let submit_info = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);

            let _queue_guard = self.queue_lock.lock().unwrap();
            self.context
                .device
                .queue_submit(self.context.graphics_queue, &[submit_info], fence)
                .map_err(|e| {
                    engine_err!(self.log, "quasar3d::vulkan", "Failed to submit commands to GPU queue: {:?}", e)
                })?;

            Ok(())
        }
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.context
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!(self.log, "quasar3d::vulkan", "Failed to wait for device idle: {:?}", e))
        }
    }

    fn swapchain_image_count(&self) -> u32 {
        self.image_count
    }

    fn stats(&self) -> DeviceStats {
        DeviceStats {
            allocated_bytes: self.context.allocated_bytes.load(Ordering::SeqCst),
            allocation_count: self.context.allocation_count.load(Ordering::SeqCst),
        }
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            self.context.device.device_wait_idle().ok();

            for pool in self.descriptor_pools.lock().unwrap().drain(..) {
                self.context.device.destroy_descriptor_pool(pool, None);
            }
            self.sampler_cache.lock().unwrap().destroy(&self.context.device);

            // The allocator must release its memory blocks before the
            // device is destroyed
            ManuallyDrop::drop(&mut self.allocator);

            self.context.device.destroy_device(None);

            #[cfg(feature = "vulkan-validation")]
            if let Some((loader, messenger)) = self.debug_utils.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}
