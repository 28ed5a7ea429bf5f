/// Buffer - Vulkan implementation of the Buffer trait

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::sync::{Arc, Mutex};

use quasar_3d_engine::quasar3d::device::Buffer as DeviceBuffer;
use quasar_3d_engine::quasar3d::{Error, Result};

use crate::vulkan_context::GpuContext;

/// Vulkan buffer implementation
///
/// The buffer and its memory allocation are created and destroyed
/// together. Host-visible buffers stay persistently mapped through the
/// allocator.
pub struct Buffer {
    /// Shared GPU context (for cleanup)
    pub(crate) context: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation (behind a mutex: update() takes &self)
    pub(crate) allocation: Mutex<Option<Allocation>>,
    /// Allocation size for the stats counters
    pub(crate) allocation_size: u64,
    /// Usable buffer size in bytes
    pub(crate) size: u64,
}

impl DeviceBuffer for Buffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            return Err(Error::InvalidResource(format!(
                "Buffer update out of bounds: offset {} + {} bytes > size {}",
                offset,
                data.len(),
                self.size
            )));
        }

        let guard = self.allocation.lock().unwrap();
        let allocation = guard.as_ref().ok_or_else(|| {
            Error::BackendError("Buffer allocation already freed".to_string())
        })?;
        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| {
                Error::BackendError(
                    "Buffer is not host-visible; use the staged upload protocol".to_string(),
                )
            })?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                mapped_ptr.add(offset as usize),
                data.len(),
            );
        }
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.lock().unwrap().take() {
                self.context.allocator.lock().unwrap().free(allocation).ok();
                self.context.track_free(self.allocation_size);
            }
            self.context.device.destroy_buffer(self.buffer, None);
        }
    }
}
