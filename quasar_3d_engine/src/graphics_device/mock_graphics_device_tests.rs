/// Tests for MockGraphicsDevice
///
/// Validates the mock itself: resource tracking, allocation accounting,
/// fence semantics, and command list state validation. Every other test
/// suite in the crate builds on these guarantees.

use super::*;
use crate::graphics_device::{BufferUsage, TextureFormat, TextureUsage};
use std::time::Duration;

fn texture_desc() -> TextureDesc {
    TextureDesc {
        width: 64,
        height: 64,
        format: TextureFormat::R8G8B8A8_UNORM,
        usage: TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST,
        mip_levels: 1,
        array_layers: 1,
    }
}

// ============================================================================
// Tests: Resource tracking
// ============================================================================

#[test]
fn test_create_texture_tracked() {
    let device = MockGraphicsDevice::new();
    device.create_texture(texture_desc()).unwrap();

    let created = device.get_created_textures();
    assert_eq!(created, vec!["texture_64x64".to_string()]);
}

#[test]
fn test_create_buffer_tracked() {
    let device = MockGraphicsDevice::new();
    device
        .create_buffer(BufferDesc {
            size: 1024,
            usage: BufferUsage::VERTEX | BufferUsage::TRANSFER_DST,
            location: MemoryLocation::GpuOnly,
        })
        .unwrap();

    assert_eq!(device.get_created_buffers(), vec!["buffer_1024".to_string()]);
}

// ============================================================================
// Tests: Allocation accounting
// ============================================================================

#[test]
fn test_allocation_bytes_track_texture_lifetime() {
    let device = MockGraphicsDevice::new();
    assert_eq!(device.stats().allocated_bytes, 0);

    let texture = device.create_texture(texture_desc()).unwrap();
    assert_eq!(device.stats().allocated_bytes, 64 * 64 * 4);
    assert_eq!(device.stats().allocation_count, 1);

    drop(texture);
    assert_eq!(device.stats().allocated_bytes, 0);
    assert_eq!(device.stats().allocation_count, 0);
}

#[test]
fn test_allocation_bytes_track_buffer_lifetime() {
    let device = MockGraphicsDevice::new();
    let buffer = device
        .create_buffer(BufferDesc {
            size: 512,
            usage: BufferUsage::TRANSFER_SRC,
            location: MemoryLocation::CpuToGpu,
        })
        .unwrap();
    assert_eq!(device.stats().allocated_bytes, 512);

    drop(buffer);
    assert_eq!(device.stats().allocated_bytes, 0);
}

// ============================================================================
// Tests: Buffer update
// ============================================================================

#[test]
fn test_buffer_update_host_visible() {
    let device = MockGraphicsDevice::new();
    let buffer = device
        .create_buffer(BufferDesc {
            size: 16,
            usage: BufferUsage::UNIFORM,
            location: MemoryLocation::CpuToGpu,
        })
        .unwrap();

    assert!(buffer.update(4, &[1, 2, 3, 4]).is_ok());
}

#[test]
fn test_buffer_update_device_local_fails() {
    let device = MockGraphicsDevice::new();
    let buffer = device
        .create_buffer(BufferDesc {
            size: 16,
            usage: BufferUsage::VERTEX,
            location: MemoryLocation::GpuOnly,
        })
        .unwrap();

    assert!(matches!(buffer.update(0, &[0u8; 4]), Err(Error::BackendError(_))));
}

#[test]
fn test_buffer_update_out_of_bounds_fails() {
    let device = MockGraphicsDevice::new();
    let buffer = device
        .create_buffer(BufferDesc {
            size: 8,
            usage: BufferUsage::UNIFORM,
            location: MemoryLocation::CpuToGpu,
        })
        .unwrap();

    assert!(matches!(
        buffer.update(4, &[0u8; 8]),
        Err(Error::InvalidResource(_))
    ));
}

// ============================================================================
// Tests: Fence semantics
// ============================================================================

#[test]
fn test_fence_created_signaled() {
    let device = MockGraphicsDevice::new();
    let fence = device.create_fence(true).unwrap();
    assert!(fence.is_signaled());
    assert!(fence.wait(Duration::from_secs(1)).is_ok());
}

#[test]
fn test_fence_reset_unsignals() {
    let device = MockGraphicsDevice::new();
    let fence = device.create_fence(true).unwrap();
    fence.reset().unwrap();
    assert!(!fence.is_signaled());
}

#[test]
fn test_submit_signals_fence() {
    let device = MockGraphicsDevice::new();
    let fence = device.create_fence(false).unwrap();

    device
        .submit(SubmitDesc {
            command_lists: &[],
            wait_semaphores: &[],
            signal_semaphores: &[],
            fence: Some(fence.as_ref()),
        })
        .unwrap();

    assert!(fence.is_signaled());
}

#[test]
fn test_forced_timeout_leaves_fence_unsignaled() {
    let device = MockGraphicsDevice::new();
    device.set_force_fence_timeout(true);
    let fence = device.create_fence(false).unwrap();

    device
        .submit(SubmitDesc {
            command_lists: &[],
            wait_semaphores: &[],
            signal_semaphores: &[],
            fence: Some(fence.as_ref()),
        })
        .unwrap();

    assert!(!fence.is_signaled());
    assert!(matches!(
        fence.wait(Duration::from_secs(10)),
        Err(Error::SyncTimeout(_))
    ));
}

// ============================================================================
// Tests: Command list state validation
// ============================================================================

#[test]
fn test_command_list_begin_twice_fails() {
    let device = MockGraphicsDevice::new();
    let mut cmd = device.create_command_list().unwrap();
    cmd.begin().unwrap();
    assert!(cmd.begin().is_err());
}

#[test]
fn test_command_list_end_without_begin_fails() {
    let device = MockGraphicsDevice::new();
    let mut cmd = device.create_command_list().unwrap();
    assert!(cmd.end().is_err());
}

#[test]
fn test_draw_outside_render_pass_fails() {
    let device = MockGraphicsDevice::new();
    let mut cmd = device.create_command_list().unwrap();
    cmd.begin().unwrap();
    assert!(cmd.draw_indexed(3, 0, 0).is_err());
}

#[test]
fn test_commands_recorded_in_order() {
    let device = MockGraphicsDevice::new();
    let mut cmd = device.create_command_list().unwrap();
    cmd.begin().unwrap();
    cmd.end().unwrap();

    assert_eq!(device.get_commands(), vec!["begin".to_string(), "end".to_string()]);
}

// ============================================================================
// Tests: Device misc
// ============================================================================

#[test]
fn test_swapchain_image_count_configurable() {
    let device = MockGraphicsDevice::with_image_count(2);
    assert_eq!(device.swapchain_image_count(), 2);
}

#[test]
fn test_empty_shader_code_fails() {
    let device = MockGraphicsDevice::new();
    let result = device.create_shader_module(ShaderModuleDesc {
        name: "empty".to_string(),
        stage: ShaderStage::Vertex,
        code: Vec::new(),
    });
    assert!(result.is_err());
}
