/// Fence and Semaphore - Vulkan implementations

use ash::vk;
use std::sync::Arc;
use std::time::Duration;

use quasar_3d_engine::quasar3d::device::{
    Fence as DeviceFence, Semaphore as DeviceSemaphore,
};
use quasar_3d_engine::quasar3d::{Error, Result};

use crate::vulkan_context::GpuContext;

/// Vulkan fence implementation
pub struct Fence {
    /// Shared GPU context (for cleanup)
    pub(crate) context: Arc<GpuContext>,
    /// Vulkan fence
    pub(crate) fence: vk::Fence,
}

impl DeviceFence for Fence {
    fn wait(&self, timeout: Duration) -> Result<()> {
        let timeout_ns = timeout.as_nanos().min(u64::MAX as u128) as u64;
        let result = unsafe {
            self.context
                .device
                .wait_for_fences(&[self.fence], true, timeout_ns)
        };
        match result {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(Error::SyncTimeout(format!(
                "fence wait exceeded {:?}",
                timeout
            ))),
            Err(e) => Err(Error::BackendError(format!("Failed to wait for fence: {:?}", e))),
        }
    }

    fn reset(&self) -> Result<()> {
        unsafe {
            self.context
                .device
                .reset_fences(&[self.fence])
                .map_err(|e| Error::BackendError(format!("Failed to reset fence: {:?}", e)))
        }
    }

    fn is_signaled(&self) -> bool {
        unsafe { self.context.device.get_fence_status(self.fence).unwrap_or(false) }
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_fence(self.fence, None);
        }
    }
}

/// Vulkan semaphore implementation
pub struct Semaphore {
    /// Shared GPU context (for cleanup)
    pub(crate) context: Arc<GpuContext>,
    /// Vulkan semaphore
    pub(crate) semaphore: vk::Semaphore,
}

impl DeviceSemaphore for Semaphore {}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_semaphore(self.semaphore, None);
        }
    }
}
