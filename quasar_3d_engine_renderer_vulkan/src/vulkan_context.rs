/// GpuContext - shared GPU resources for all Vulkan objects
///
/// Contains everything a resource needs for its lifetime: the device for
/// Vulkan API calls, the allocator for memory management, the graphics
/// queue, and the allocation counters backing `DeviceStats`.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Shared GPU context for all Vulkan resources.
///
/// This struct is shared (via `Arc`) by all GPU resources (textures,
/// buffers, etc.) to avoid duplicating device/allocator/queue references
/// in each resource.
///
/// Note: device and instance destruction is handled by
/// VulkanGraphicsDevice::drop() to avoid drop-ordering issues; this Drop
/// impl intentionally does nothing.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator (shared, requires mutex for thread safety)
    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics queue for command submission
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Bytes currently allocated through the allocator
    pub allocated_bytes: AtomicU64,

    /// Number of live allocations
    pub allocation_count: AtomicU32,
}

impl GpuContext {
    pub fn new(
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(allocator),
            graphics_queue,
            graphics_queue_family,
            allocated_bytes: AtomicU64::new(0),
            allocation_count: AtomicU32::new(0),
        }
    }

    /// Record a completed allocation in the stats counters
    pub fn track_alloc(&self, bytes: u64) {
        self.allocated_bytes.fetch_add(bytes, Ordering::SeqCst);
        self.allocation_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a freed allocation in the stats counters
    pub fn track_free(&self, bytes: u64) {
        self.allocated_bytes.fetch_sub(bytes, Ordering::SeqCst);
        self.allocation_count.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        // Device and instance destruction belongs to
        // VulkanGraphicsDevice::drop(); nothing to do here.
    }
}
