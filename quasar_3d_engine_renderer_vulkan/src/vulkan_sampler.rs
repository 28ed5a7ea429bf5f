/// Sampler cache and the Vulkan sampler wrapper
///
/// Samplers are immutable and cheap to share, so identical sampler
/// settings resolve to the same VkSampler. The cache owns every sampler
/// it creates and destroys them when the device shuts down.

use ash::vk;
use rustc_hash::FxHashMap;

use quasar_3d_engine::quasar3d::device::{Sampler as DeviceSampler, SamplerDesc};
use quasar_3d_engine::quasar3d::{Error, Result};

use crate::vulkan_format::{address_mode_to_vk, filter_to_vk};

/// Hashable cache key derived from a SamplerDesc (anisotropy by bit pattern)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SamplerKey {
    min_filter: vk::Filter,
    mag_filter: vk::Filter,
    address_mode: vk::SamplerAddressMode,
    anisotropy_bits: u32,
}

impl SamplerKey {
    fn new(desc: &SamplerDesc) -> Self {
        Self {
            min_filter: filter_to_vk(desc.min_filter),
            mag_filter: filter_to_vk(desc.mag_filter),
            address_mode: address_mode_to_vk(desc.address_mode),
            anisotropy_bits: desc.max_anisotropy.to_bits(),
        }
    }
}

/// Creates VkSampler objects on first use and reuses them afterwards
pub struct SamplerCache {
    samplers: FxHashMap<SamplerKey, vk::Sampler>,
}

impl SamplerCache {
    pub fn new() -> Self {
        Self {
            samplers: FxHashMap::default(),
        }
    }

    /// Get or create the sampler for a desc
    pub fn get_or_create(&mut self, device: &ash::Device, desc: &SamplerDesc) -> Result<vk::Sampler> {
        let key = SamplerKey::new(desc);
        if let Some(&sampler) = self.samplers.get(&key) {
            return Ok(sampler);
        }

        let anisotropy_enable = desc.max_anisotropy > 1.0;
        let create_info = vk::SamplerCreateInfo::default()
            .min_filter(key.min_filter)
            .mag_filter(key.mag_filter)
            .address_mode_u(key.address_mode)
            .address_mode_v(key.address_mode)
            .address_mode_w(key.address_mode)
            .anisotropy_enable(anisotropy_enable)
            .max_anisotropy(desc.max_anisotropy.max(1.0))
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK);

        let sampler = unsafe {
            device
                .create_sampler(&create_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create sampler: {:?}", e)))?
        };
        self.samplers.insert(key, sampler);
        Ok(sampler)
    }

    /// Destroy every cached sampler; called at device shutdown
    pub fn destroy(&mut self, device: &ash::Device) {
        for (_, sampler) in self.samplers.drain() {
            unsafe {
                device.destroy_sampler(sampler, None);
            }
        }
    }
}

/// Vulkan sampler handle; the cache owns the underlying VkSampler
pub struct Sampler {
    pub(crate) sampler: vk::Sampler,
}

impl DeviceSampler for Sampler {}
