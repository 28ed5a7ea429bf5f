//! Integration tests for VulkanGraphicsDevice
//!
//! These tests verify that VulkanGraphicsDevice correctly implements the
//! GraphicsDevice trait. All tests require a Vulkan-capable GPU and are
//! marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_device_tests -- --ignored

use quasar_3d_engine::quasar3d::device::{
    BufferDesc, BufferUsage, DeviceConfig, GraphicsDevice, MemoryLocation,
    SamplerDesc, ShaderModuleDesc, ShaderStage, SubmitDesc, TextureDesc,
    TextureFormat, TextureUsage,
};
use quasar_3d_engine::quasar3d::log::Log;
use quasar_3d_engine_renderer_vulkan::VulkanGraphicsDevice;
use std::time::Duration;

fn create_device() -> VulkanGraphicsDevice {
    VulkanGraphicsDevice::new(DeviceConfig::default(), Log::disabled())
        .expect("Failed to create VulkanGraphicsDevice for tests")
}

// ============================================================================
// TEXTURE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_create_texture() {
    let device = create_device();

    let texture = device
        .create_texture(TextureDesc {
            width: 256,
            height: 256,
            format: TextureFormat::R8G8B8A8_UNORM,
            usage: TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST,
            mip_levels: 1,
            array_layers: 1,
        })
        .unwrap();

    assert_eq!(texture.info().width, 256);
    assert_eq!(texture.info().height, 256);
    assert!(device.stats().allocated_bytes >= 256 * 256 * 4);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_texture_drop_releases_memory() {
    let device = create_device();

    let texture = device
        .create_texture(TextureDesc {
            width: 64,
            height: 64,
            format: TextureFormat::R8G8B8A8_UNORM,
            usage: TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST,
            mip_levels: 1,
            array_layers: 1,
        })
        .unwrap();
    let with_texture = device.stats().allocated_bytes;
    drop(texture);

    assert!(device.stats().allocated_bytes < with_texture);
}

// ============================================================================
// BUFFER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_create_and_update_host_visible_buffer() {
    let device = create_device();

    let buffer = device
        .create_buffer(BufferDesc {
            size: 1024,
            usage: BufferUsage::TRANSFER_SRC,
            location: MemoryLocation::CpuToGpu,
        })
        .unwrap();

    assert_eq!(buffer.size(), 1024);
    assert!(buffer.update(0, &[7u8; 512]).is_ok());
    assert!(buffer.update(1000, &[7u8; 100]).is_err());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_device_local_buffer_rejects_update() {
    let device = create_device();

    let buffer = device
        .create_buffer(BufferDesc {
            size: 256,
            usage: BufferUsage::VERTEX | BufferUsage::TRANSFER_DST,
            location: MemoryLocation::GpuOnly,
        })
        .unwrap();

    assert!(buffer.update(0, &[0u8; 16]).is_err());
}

// ============================================================================
// SYNC TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_fence_lifecycle() {
    let device = create_device();

    let fence = device.create_fence(true).unwrap();
    assert!(fence.is_signaled());
    assert!(fence.wait(Duration::from_secs(1)).is_ok());

    fence.reset().unwrap();
    assert!(!fence.is_signaled());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_empty_submit_signals_fence() {
    let device = create_device();

    let mut cmd = device.create_command_list().unwrap();
    cmd.begin().unwrap();
    cmd.end().unwrap();

    let fence = device.create_fence(false).unwrap();
    device
        .submit(SubmitDesc {
            command_lists: &[cmd.as_ref()],
            wait_semaphores: &[],
            signal_semaphores: &[],
            fence: Some(fence.as_ref()),
        })
        .unwrap();

    assert!(fence.wait(Duration::from_secs(10)).is_ok());
}

// ============================================================================
// SHADER / SAMPLER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_shader_module_rejects_misaligned_code() {
    let device = create_device();

    let result = device.create_shader_module(ShaderModuleDesc {
        name: "bad".to_string(),
        stage: ShaderStage::Vertex,
        code: vec![0u8; 10],
    });
    assert!(result.is_err());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_sampler_cache_reuses_samplers() {
    let device = create_device();

    // Same desc twice: second comes from the cache, no error either way
    let a = device.create_sampler(SamplerDesc::default());
    let b = device.create_sampler(SamplerDesc::default());
    assert!(a.is_ok());
    assert!(b.is_ok());
}
