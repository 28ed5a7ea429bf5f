//! Texture asset, setting, and manager.
//!
//! A texture asset owns a GPU image (image + view + allocation fused
//! behind one `Texture` object) and a sampler. Creation allocates device
//! memory with undefined contents; pixel data arrives through the staged
//! upload protocol in [`TextureManager::write_pixels`].

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferDesc, BufferUsage, CommandList, Fence, GraphicsDevice, ImageLayout,
    MemoryLocation, Sampler, SamplerDesc, SubmitDesc, Texture, TextureDesc,
    TextureFormat, TextureUsage,
};
use crate::log::Log;
use crate::resource::asset::{Asset, AssetInfo, AssetKind, AssetSetting, AssetState};
use crate::resource::resource_manager::{AssetManager, ManagerContext, WritePayload};
use crate::engine_error;

/// Bound on the upload fence wait; exceeding it means a stuck device
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable creation descriptor for a texture asset
#[derive(Debug, Clone)]
pub struct TextureSetting {
    /// Asset name
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Number of mip levels (>= 1)
    pub mip_levels: u32,
    /// Number of array layers (>= 1)
    pub array_layers: u32,
    /// Usage flags; TRANSFER_DST is added automatically for uploads
    pub usage: TextureUsage,
    /// Sampler parameters
    pub sampler: SamplerDesc,
}

impl Default for TextureSetting {
    fn default() -> Self {
        Self {
            name: String::new(),
            width: 1,
            height: 1,
            format: TextureFormat::R8G8B8A8_UNORM,
            mip_levels: 1,
            array_layers: 1,
            usage: TextureUsage::SAMPLED,
            sampler: SamplerDesc::default(),
        }
    }
}

/// Texture asset: GPU image + sampler + the setting it was created from
pub struct TextureAsset {
    pub(crate) info: AssetInfo,
    pub(crate) texture: Arc<dyn Texture>,
    pub(crate) sampler: Arc<dyn Sampler>,
    pub(crate) setting: TextureSetting,
}

impl TextureAsset {
    /// The GPU texture object
    pub fn texture(&self) -> &Arc<dyn Texture> {
        &self.texture
    }

    /// The sampler created from the setting's sampler parameters
    pub fn sampler(&self) -> &Arc<dyn Sampler> {
        &self.sampler
    }

    /// The setting this asset was created from
    pub fn setting(&self) -> &TextureSetting {
        &self.setting
    }

    /// Shared identity/lifecycle info
    pub fn info(&self) -> &AssetInfo {
        &self.info
    }
}

/// Creates texture assets and uploads their pixel data.
///
/// Owns a private command list + fence pair so concurrent uploads through
/// other managers never contend for the same recording state.
pub struct TextureManager {
    device: Arc<dyn GraphicsDevice>,
    log: Log,
    cmd: Box<dyn CommandList>,
    fence: Box<dyn Fence>,
}

impl TextureManager {
    pub fn new(device: Arc<dyn GraphicsDevice>, log: Log) -> Result<Self> {
        let cmd = device.create_command_list()?;
        let fence = device.create_fence(false)?;
        Ok(Self { device, log, cmd, fence })
    }

    fn create_texture_asset(&self, setting: &TextureSetting) -> Result<Asset> {
        // ========== VALIDATION ==========
        if setting.name.is_empty() {
            return Err(Error::InvalidResource(
                "Texture setting has an empty name".to_string(),
            ));
        }
        if setting.width == 0 || setting.height == 0 {
            return Err(Error::InvalidResource(format!(
                "Texture '{}' has zero extent ({}x{})",
                setting.name, setting.width, setting.height
            )));
        }
        if setting.mip_levels == 0 || setting.array_layers == 0 {
            return Err(Error::InvalidResource(format!(
                "Texture '{}' must have at least one mip level and one array layer",
                setting.name
            )));
        }

        // ========== DEVICE OBJECTS ==========
        // Image first, then the sampler; a failure at either step raises
        // and nothing gets registered.
        let texture = self
            .device
            .create_texture(TextureDesc {
                width: setting.width,
                height: setting.height,
                format: setting.format,
                usage: setting.usage | TextureUsage::TRANSFER_DST,
                mip_levels: setting.mip_levels,
                array_layers: setting.array_layers,
            })
            .map_err(|e| {
                engine_error!(
                    self.log,
                    "quasar3d::TextureManager",
                    "Failed to create image for texture '{}': {}",
                    setting.name,
                    e
                );
                e
            })?;

        let sampler = self.device.create_sampler(setting.sampler.clone()).map_err(|e| {
            engine_error!(
                self.log,
                "quasar3d::TextureManager",
                "Failed to create sampler for texture '{}': {}",
                setting.name,
                e
            );
            e
        })?;

        Ok(Asset::Texture(TextureAsset {
            info: AssetInfo::new(setting.name.clone(), AssetState::Unloaded),
            texture,
            sampler,
            setting: setting.clone(),
        }))
    }

    /// Staged upload of pixel data into layer 0, mip 0.
    ///
    /// Strictly ordered: reset command list + fence, create a transient
    /// CPU-visible staging buffer, record barrier/copy/barrier, submit
    /// signaling the fence, wait bounded, drop the staging buffer. The
    /// staging buffer never survives this call, including the timeout
    /// path. Synchronous by design; callers never observe a partial
    /// upload.
    fn write_pixels(&mut self, asset: &mut TextureAsset, data: &[u8]) -> Result<()> {
        let expected = asset.texture.info().layer_byte_size();
        if data.len() as u64 != expected {
            return Err(Error::InvalidResource(format!(
                "Texture '{}' expects exactly {} bytes per write, got {}",
                asset.info.name,
                expected,
                data.len()
            )));
        }

        // Step 1: reset recording state so a stale wait cannot falsely succeed
        self.cmd.reset()?;
        self.fence.reset()?;

        // Step 2: transient staging buffer sized to the payload
        let staging = self.device.create_buffer(BufferDesc {
            size: data.len() as u64,
            usage: BufferUsage::TRANSFER_SRC,
            location: MemoryLocation::CpuToGpu,
        })?;
        staging.update(0, data)?;

        // Step 3: record barrier -> copy -> barrier
        self.cmd.begin()?;
        self.cmd
            .transition_texture(&asset.texture, ImageLayout::Undefined, ImageLayout::TransferDst)?;
        self.cmd.copy_buffer_to_texture(&staging, 0, &asset.texture)?;
        self.cmd.transition_texture(
            &asset.texture,
            ImageLayout::TransferDst,
            ImageLayout::ShaderReadOnly,
        )?;
        self.cmd.end()?;

        // Step 4: submit signaling the fence
        self.device.submit(SubmitDesc {
            command_lists: &[self.cmd.as_ref()],
            wait_semaphores: &[],
            signal_semaphores: &[],
            fence: Some(self.fence.as_ref()),
        })?;

        // Step 5: bounded wait; a timeout is fatal for this write and is
        // never retried. The staging buffer is dropped on every exit path.
        self.fence.wait(UPLOAD_TIMEOUT).map_err(|_| {
            engine_error!(
                self.log,
                "quasar3d::TextureManager",
                "Texture upload '{}' did not complete within {:?}",
                asset.info.name,
                UPLOAD_TIMEOUT
            );
            Error::SyncTimeout(format!(
                "texture upload '{}' exceeded {:?}",
                asset.info.name, UPLOAD_TIMEOUT
            ))
        })?;

        asset.info.state = AssetState::Loaded;
        Ok(())
    }
}

impl AssetManager for TextureManager {
    fn kind(&self) -> AssetKind {
        AssetKind::Texture
    }

    fn create(&mut self, setting: &AssetSetting, _ctx: &ManagerContext<'_>) -> Result<Asset> {
        let AssetSetting::Texture(setting) = setting else {
            return Err(Error::InvalidResource(
                "TextureManager received a non-texture setting".to_string(),
            ));
        };
        self.create_texture_asset(setting)
    }

    fn write(&mut self, asset: &mut Asset, payload: &WritePayload<'_>) -> Result<()> {
        match (asset, payload) {
            (Asset::Texture(texture), WritePayload::Texture { data }) => {
                self.write_pixels(texture, data)
            }
            _ => Err(Error::InvalidResource(
                "TextureManager received a mismatched write payload".to_string(),
            )),
        }
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
