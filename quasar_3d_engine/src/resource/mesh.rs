//! Mesh asset, setting, and manager.
//!
//! A mesh asset owns a device-local vertex buffer and index buffer sized
//! by its setting. Vertex/index data reaches the buffers only through the
//! staged upload protocol in [`MeshManager::write_geometry`]; callers
//! never map device memory directly.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, BufferDesc, BufferUsage, CommandList, Fence, GraphicsDevice, IndexType,
    MemoryLocation, SubmitDesc,
};
use crate::log::Log;
use crate::resource::asset::{Asset, AssetInfo, AssetKind, AssetSetting, AssetState};
use crate::resource::resource_manager::{AssetManager, ManagerContext, WritePayload};
use crate::engine_error;

/// Bound on the upload fence wait; exceeding it means a stuck device
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable creation descriptor for a mesh asset
#[derive(Debug, Clone)]
pub struct MeshSetting {
    /// Asset name
    pub name: String,
    /// Vertex buffer size in bytes
    pub vertex_buffer_size: u64,
    /// Index buffer size in bytes
    pub index_buffer_size: u64,
    /// Size of one vertex in bytes
    pub vertex_stride: u32,
    /// Index element type
    pub index_type: IndexType,
    /// Extra usage flags beyond VERTEX/INDEX | TRANSFER_DST
    pub usage: BufferUsage,
}

impl Default for MeshSetting {
    fn default() -> Self {
        Self {
            name: String::new(),
            vertex_buffer_size: 0,
            index_buffer_size: 0,
            vertex_stride: 0,
            index_type: IndexType::U32,
            usage: BufferUsage::empty(),
        }
    }
}

/// Mesh asset: vertex + index buffers and the index count set by write
pub struct MeshAsset {
    pub(crate) info: AssetInfo,
    pub(crate) vertex_buffer: Arc<dyn Buffer>,
    pub(crate) index_buffer: Arc<dyn Buffer>,
    pub(crate) index_count: u32,
    pub(crate) setting: MeshSetting,
}

impl MeshAsset {
    /// The device-local vertex buffer
    pub fn vertex_buffer(&self) -> &Arc<dyn Buffer> {
        &self.vertex_buffer
    }

    /// The device-local index buffer
    pub fn index_buffer(&self) -> &Arc<dyn Buffer> {
        &self.index_buffer
    }

    /// Number of indices written by the last `write_geometry`
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Index element type
    pub fn index_type(&self) -> IndexType {
        self.setting.index_type
    }

    /// The setting this asset was created from
    pub fn setting(&self) -> &MeshSetting {
        &self.setting
    }

    /// Shared identity/lifecycle info
    pub fn info(&self) -> &AssetInfo {
        &self.info
    }
}

/// Creates mesh assets and uploads their geometry.
///
/// Owns a private command list + fence pair, independent from the texture
/// manager's, so the two never contend.
pub struct MeshManager {
    device: Arc<dyn GraphicsDevice>,
    log: Log,
    cmd: Box<dyn CommandList>,
    fence: Box<dyn Fence>,
}

impl MeshManager {
    pub fn new(device: Arc<dyn GraphicsDevice>, log: Log) -> Result<Self> {
        let cmd = device.create_command_list()?;
        let fence = device.create_fence(false)?;
        Ok(Self { device, log, cmd, fence })
    }

    fn create_mesh_asset(&self, setting: &MeshSetting) -> Result<Asset> {
        // ========== VALIDATION ==========
        if setting.name.is_empty() {
            return Err(Error::InvalidResource("Mesh setting has an empty name".to_string()));
        }
        if setting.vertex_buffer_size == 0 || setting.index_buffer_size == 0 {
            return Err(Error::InvalidResource(format!(
                "Mesh '{}' must declare non-zero buffer sizes",
                setting.name
            )));
        }
        if setting.vertex_stride == 0 {
            return Err(Error::InvalidResource(format!(
                "Mesh '{}' must declare a non-zero vertex stride",
                setting.name
            )));
        }

        // ========== DEVICE OBJECTS ==========
        let vertex_buffer = self
            .device
            .create_buffer(BufferDesc {
                size: setting.vertex_buffer_size,
                usage: BufferUsage::VERTEX | BufferUsage::TRANSFER_DST | setting.usage,
                location: MemoryLocation::GpuOnly,
            })
            .map_err(|e| {
                engine_error!(
                    self.log,
                    "quasar3d::MeshManager",
                    "Failed to create vertex buffer for mesh '{}': {}",
                    setting.name,
                    e
                );
                e
            })?;

        let index_buffer = self
            .device
            .create_buffer(BufferDesc {
                size: setting.index_buffer_size,
                usage: BufferUsage::INDEX | BufferUsage::TRANSFER_DST | setting.usage,
                location: MemoryLocation::GpuOnly,
            })
            .map_err(|e| {
                engine_error!(
                    self.log,
                    "quasar3d::MeshManager",
                    "Failed to create index buffer for mesh '{}': {}",
                    setting.name,
                    e
                );
                e
            })?;

        Ok(Asset::Mesh(MeshAsset {
            info: AssetInfo::new(setting.name.clone(), AssetState::Unloaded),
            vertex_buffer,
            index_buffer,
            index_count: 0,
            setting: setting.clone(),
        }))
    }

    /// Staged upload of vertex and index data.
    ///
    /// One staging buffer carries both payloads (vertices at offset 0,
    /// indices after them) and two copies move them into the device-local
    /// buffers. Same ordering and timeout rules as the texture upload;
    /// the staging buffer never survives this call.
    fn write_geometry(&mut self, asset: &mut MeshAsset, vertices: &[u8], indices: &[u8]) -> Result<()> {
        // ========== VALIDATION ==========
        let stride = asset.setting.vertex_stride as usize;
        let index_size = asset.setting.index_type.size_bytes() as usize;
        if vertices.is_empty() || indices.is_empty() {
            return Err(Error::InvalidResource(format!(
                "Mesh '{}' write requires vertex and index data",
                asset.info.name
            )));
        }
        if vertices.len() % stride != 0 {
            return Err(Error::InvalidResource(format!(
                "Mesh '{}' vertex data ({} bytes) is not a multiple of the stride ({})",
                asset.info.name,
                vertices.len(),
                stride
            )));
        }
        if indices.len() % index_size != 0 {
            return Err(Error::InvalidResource(format!(
                "Mesh '{}' index data ({} bytes) is not a multiple of the index size ({})",
                asset.info.name,
                indices.len(),
                index_size
            )));
        }
        if vertices.len() as u64 > asset.vertex_buffer.size() {
            return Err(Error::InvalidResource(format!(
                "Mesh '{}' vertex data ({} bytes) exceeds the vertex buffer ({} bytes)",
                asset.info.name,
                vertices.len(),
                asset.vertex_buffer.size()
            )));
        }
        if indices.len() as u64 > asset.index_buffer.size() {
            return Err(Error::InvalidResource(format!(
                "Mesh '{}' index data ({} bytes) exceeds the index buffer ({} bytes)",
                asset.info.name,
                indices.len(),
                asset.index_buffer.size()
            )));
        }

        // Step 1: reset recording state
        self.cmd.reset()?;
        self.fence.reset()?;

        // Step 2: one staging buffer for both payloads
        let staging = self.device.create_buffer(BufferDesc {
            size: (vertices.len() + indices.len()) as u64,
            usage: BufferUsage::TRANSFER_SRC,
            location: MemoryLocation::CpuToGpu,
        })?;
        staging.update(0, vertices)?;
        staging.update(vertices.len() as u64, indices)?;

        // Step 3: record the copies
        self.cmd.begin()?;
        self.cmd.copy_buffer_to_buffer(
            &staging,
            0,
            &asset.vertex_buffer,
            0,
            vertices.len() as u64,
        )?;
        self.cmd.copy_buffer_to_buffer(
            &staging,
            vertices.len() as u64,
            &asset.index_buffer,
            0,
            indices.len() as u64,
        )?;
        self.cmd.end()?;

        // Step 4: submit signaling the fence
        self.device.submit(SubmitDesc {
            command_lists: &[self.cmd.as_ref()],
            wait_semaphores: &[],
            signal_semaphores: &[],
            fence: Some(self.fence.as_ref()),
        })?;

        // Step 5: bounded wait, fatal on timeout
        self.fence.wait(UPLOAD_TIMEOUT).map_err(|_| {
            engine_error!(
                self.log,
                "quasar3d::MeshManager",
                "Mesh upload '{}' did not complete within {:?}",
                asset.info.name,
                UPLOAD_TIMEOUT
            );
            Error::SyncTimeout(format!(
                "mesh upload '{}' exceeded {:?}",
                asset.info.name, UPLOAD_TIMEOUT
            ))
        })?;

        asset.index_count = (indices.len() / index_size) as u32;
        asset.info.state = AssetState::Loaded;
        Ok(())
    }
}

impl AssetManager for MeshManager {
    fn kind(&self) -> AssetKind {
        AssetKind::Mesh
    }

    fn create(&mut self, setting: &AssetSetting, _ctx: &ManagerContext<'_>) -> Result<Asset> {
        let AssetSetting::Mesh(setting) = setting else {
            return Err(Error::InvalidResource(
                "MeshManager received a non-mesh setting".to_string(),
            ));
        };
        self.create_mesh_asset(setting)
    }

    fn write(&mut self, asset: &mut Asset, payload: &WritePayload<'_>) -> Result<()> {
        match (asset, payload) {
            (Asset::Mesh(mesh), WritePayload::Mesh { vertices, indices }) => {
                self.write_geometry(mesh, vertices, indices)
            }
            _ => Err(Error::InvalidResource(
                "MeshManager received a mismatched write payload".to_string(),
            )),
        }
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
