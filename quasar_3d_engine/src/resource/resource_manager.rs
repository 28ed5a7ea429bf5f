//! Central resource registry.
//!
//! Owns every asset by identifier and a closed registry of one manager
//! per asset kind. Managers construct and mutate assets; they never hold
//! authoritative copies. Dispatch is by kind tag: there is no type
//! erasure and no unchecked downcast: the typed getters fail loudly when
//! the stored asset's kind does not match the request.
//!
//! Concurrency: the registry is driven from the caller's thread.
//! Concurrent creation/destruction of the SAME asset identifier is
//! undefined and must be serialized by the caller.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::GraphicsDevice;
use crate::log::Log;
use crate::pipeline::PipelineLayoutType;
use crate::render::RenderPassManager;
use crate::resource::asset::{Asset, AssetId, AssetKind, AssetSetting};
use crate::resource::folder::{FolderAsset, FolderManager};
use crate::resource::material::{MaterialAsset, MaterialManager};
use crate::resource::mesh::{MeshAsset, MeshManager};
use crate::resource::pipeline::{
    PipelineAsset, PipelineLayoutAsset, PipelineLayoutManager, PipelineManager,
};
use crate::resource::texture::{TextureAsset, TextureManager};
use crate::{engine_debug, engine_warn};

/// CPU payload handed to a manager's write protocol
pub enum WritePayload<'a> {
    /// Pixel data for layer 0, mip 0 of a texture
    Texture { data: &'a [u8] },
    /// Vertex and index data for a mesh
    Mesh { vertices: &'a [u8], indices: &'a [u8] },
}

/// Read-only view managers get while creating or updating an asset:
/// the asset map (for dependency resolution) and the render-pass
/// descriptions.
pub struct ManagerContext<'a> {
    pub assets: &'a FxHashMap<AssetId, Asset>,
    pub render_passes: &'a RenderPassManager,
}

impl<'a> ManagerContext<'a> {
    /// Look up any asset by identifier
    pub fn asset(&self, id: AssetId) -> Option<&'a Asset> {
        self.assets.get(&id)
    }

    /// Find the pipeline layout asset built for a layout family
    pub fn pipeline_layout_by_type(
        &self,
        layout_type: PipelineLayoutType,
    ) -> Option<&'a PipelineLayoutAsset> {
        self.assets.values().find_map(|asset| match asset {
            Asset::PipelineLayout(layout) if layout.layout_type() == layout_type => Some(layout),
            _ => None,
        })
    }
}

/// Capability interface implemented once per asset kind.
///
/// `update` and `write` default to an explicit "not supported" error:
/// kinds without those operations refuse them rather than silently
/// succeeding. `destroy` defaults to a no-op because GPU resources are
/// freed when the asset drops.
pub trait AssetManager: Send + Sync {
    /// The single asset kind this manager owns
    fn kind(&self) -> AssetKind;

    /// Create an asset from a setting.
    ///
    /// Construction order for GPU-backed assets: device memory object
    /// first, auxiliary view/sampler objects second; a failure at any
    /// step raises and the caller registers nothing.
    fn create(&mut self, setting: &AssetSetting, ctx: &ManagerContext<'_>) -> Result<Asset>;

    /// Re-apply a setting to an existing asset
    fn update(
        &mut self,
        asset: &mut Asset,
        setting: &AssetSetting,
        ctx: &ManagerContext<'_>,
    ) -> Result<()> {
        let _ = (asset, setting, ctx);
        Err(Error::InvalidResource(format!(
            "update is not supported for {:?} assets",
            self.kind()
        )))
    }

    /// Upload CPU data into the asset's GPU resources
    fn write(&mut self, asset: &mut Asset, payload: &WritePayload<'_>) -> Result<()> {
        let _ = (asset, payload);
        Err(Error::InvalidResource(format!(
            "write is not supported for {:?} assets",
            self.kind()
        )))
    }

    /// Release manager-side state for an asset about to be dropped
    fn destroy(&mut self, asset: &mut Asset) -> Result<()> {
        let _ = asset;
        Ok(())
    }
}

/// Type-safe registry of asset managers plus the exclusive asset map
pub struct ResourceManager {
    managers: FxHashMap<AssetKind, Box<dyn AssetManager>>,
    assets: FxHashMap<AssetId, Asset>,
    render_passes: Arc<RenderPassManager>,
    log: Log,
}

impl ResourceManager {
    /// Create an empty registry; managers are registered separately
    pub fn new(render_passes: Arc<RenderPassManager>, log: Log) -> Self {
        Self {
            managers: FxHashMap::default(),
            assets: FxHashMap::default(),
            render_passes,
            log,
        }
    }

    /// Create a registry with every built-in manager registered
    pub fn with_default_managers(
        device: Arc<dyn GraphicsDevice>,
        render_passes: Arc<RenderPassManager>,
        log: Log,
    ) -> Result<Self> {
        let mut manager = Self::new(render_passes, log.clone());
        manager.register_manager(Box::new(TextureManager::new(Arc::clone(&device), log.clone())?));
        manager.register_manager(Box::new(MeshManager::new(Arc::clone(&device), log.clone())?));
        manager.register_manager(Box::new(PipelineLayoutManager::new(
            Arc::clone(&device),
            log.clone(),
        )));
        manager.register_manager(Box::new(PipelineManager::new(Arc::clone(&device), log.clone())));
        manager.register_manager(Box::new(MaterialManager::new(Arc::clone(&device), log)));
        manager.register_manager(Box::new(FolderManager::new()));
        Ok(manager)
    }

    // ===== MANAGER REGISTRY =====

    /// Bind a manager for its asset kind.
    ///
    /// Registering a second manager for an already-registered kind is a
    /// no-op with a warning; the first instance stays bound.
    pub fn register_manager(&mut self, manager: Box<dyn AssetManager>) {
        let kind = manager.kind();
        if self.managers.contains_key(&kind) {
            engine_warn!(
                self.log,
                "quasar3d::ResourceManager",
                "A manager for {:?} assets is already registered; keeping the first",
                kind
            );
            return;
        }
        self.managers.insert(kind, manager);
    }

    /// True if a manager is registered for the kind
    pub fn has_manager(&self, kind: AssetKind) -> bool {
        self.managers.contains_key(&kind)
    }

    // ===== CREATE / UPDATE / DELETE =====

    /// Create an asset, store it under its identifier, and return the id.
    ///
    /// Fails with `MissingDependency` if no manager is registered for the
    /// setting's kind. A failed create registers nothing.
    pub fn create_asset(&mut self, setting: AssetSetting) -> Result<AssetId> {
        let kind = setting.kind();
        let Self { managers, assets, render_passes, log } = self;
        let Some(manager) = managers.get_mut(&kind) else {
            engine_warn!(
                log,
                "quasar3d::ResourceManager",
                "Create for '{}' failed: no manager registered for {:?} assets",
                setting.name(),
                kind
            );
            return Err(Error::MissingDependency(format!(
                "no manager registered for {:?} assets",
                kind
            )));
        };

        let ctx = ManagerContext { assets: &*assets, render_passes: &**render_passes };
        let asset = manager.create(&setting, &ctx)?;
        let id = asset.id();
        assets.insert(id, asset);

        engine_debug!(
            log,
            "quasar3d::ResourceManager",
            "Created {:?} asset '{}' ({})",
            kind,
            setting.name(),
            id
        );
        Ok(id)
    }

    /// Re-apply a setting to an existing asset via its owning manager
    pub fn update_asset(&mut self, id: AssetId, setting: &AssetSetting) -> Result<()> {
        let mut asset = self
            .assets
            .remove(&id)
            .ok_or_else(|| Error::MissingDependency(format!("asset {} not found", id)))?;
        let kind = asset.kind();

        let Self { managers, assets, render_passes, .. } = self;
        let result = match managers.get_mut(&kind) {
            Some(manager) => {
                let ctx = ManagerContext { assets: &*assets, render_passes: &**render_passes };
                manager.update(&mut asset, setting, &ctx)
            }
            None => Err(Error::MissingDependency(format!(
                "no manager registered for {:?} assets",
                kind
            ))),
        };

        // The asset stays registered whether or not the update succeeded
        assets.insert(id, asset);
        result
    }

    /// Destroy an asset and remove it from the registry.
    ///
    /// GPU resources are released when the removed asset drops at the end
    /// of this call.
    pub fn delete_asset(&mut self, id: AssetId) -> Result<()> {
        let mut asset = self
            .assets
            .remove(&id)
            .ok_or_else(|| Error::MissingDependency(format!("asset {} not found", id)))?;
        let kind = asset.kind();

        if let Some(manager) = self.managers.get_mut(&kind) {
            manager.destroy(&mut asset)?;
        }

        engine_debug!(
            self.log,
            "quasar3d::ResourceManager",
            "Deleted {:?} asset '{}' ({})",
            kind,
            asset.name(),
            id
        );
        Ok(())
    }

    // ===== WRITE PROTOCOL =====

    /// Upload pixel data into a texture asset (staged, synchronous)
    pub fn write_texture(&mut self, id: AssetId, data: &[u8]) -> Result<()> {
        self.write_asset(id, &WritePayload::Texture { data })
    }

    /// Upload vertex/index data into a mesh asset (staged, synchronous)
    pub fn write_mesh(&mut self, id: AssetId, vertices: &[u8], indices: &[u8]) -> Result<()> {
        self.write_asset(id, &WritePayload::Mesh { vertices, indices })
    }

    fn write_asset(&mut self, id: AssetId, payload: &WritePayload<'_>) -> Result<()> {
        let Self { managers, assets, .. } = self;
        let asset = assets
            .get_mut(&id)
            .ok_or_else(|| Error::MissingDependency(format!("asset {} not found", id)))?;
        let kind = asset.kind();
        let manager = managers.get_mut(&kind).ok_or_else(|| {
            Error::MissingDependency(format!("no manager registered for {:?} assets", kind))
        })?;
        manager.write(asset, payload)
    }

    // ===== LOOKUP =====

    /// Get a stored asset, or `None` if absent
    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    /// Typed getter; fails loudly if the stored asset is not a texture
    pub fn texture(&self, id: AssetId) -> Result<&TextureAsset> {
        match self.assets.get(&id) {
            Some(Asset::Texture(texture)) => Ok(texture),
            Some(other) => Err(Self::kind_mismatch(id, AssetKind::Texture, other.kind())),
            None => Err(Error::MissingDependency(format!("asset {} not found", id))),
        }
    }

    /// Typed getter; fails loudly if the stored asset is not a mesh
    pub fn mesh(&self, id: AssetId) -> Result<&MeshAsset> {
        match self.assets.get(&id) {
            Some(Asset::Mesh(mesh)) => Ok(mesh),
            Some(other) => Err(Self::kind_mismatch(id, AssetKind::Mesh, other.kind())),
            None => Err(Error::MissingDependency(format!("asset {} not found", id))),
        }
    }

    /// Typed getter; fails loudly if the stored asset is not a pipeline layout
    pub fn pipeline_layout(&self, id: AssetId) -> Result<&PipelineLayoutAsset> {
        match self.assets.get(&id) {
            Some(Asset::PipelineLayout(layout)) => Ok(layout),
            Some(other) => Err(Self::kind_mismatch(id, AssetKind::PipelineLayout, other.kind())),
            None => Err(Error::MissingDependency(format!("asset {} not found", id))),
        }
    }

    /// Typed getter; fails loudly if the stored asset is not a pipeline
    pub fn pipeline(&self, id: AssetId) -> Result<&PipelineAsset> {
        match self.assets.get(&id) {
            Some(Asset::Pipeline(pipeline)) => Ok(pipeline),
            Some(other) => Err(Self::kind_mismatch(id, AssetKind::Pipeline, other.kind())),
            None => Err(Error::MissingDependency(format!("asset {} not found", id))),
        }
    }

    /// Typed getter; fails loudly if the stored asset is not a material
    pub fn material(&self, id: AssetId) -> Result<&MaterialAsset> {
        match self.assets.get(&id) {
            Some(Asset::Material(material)) => Ok(material),
            Some(other) => Err(Self::kind_mismatch(id, AssetKind::Material, other.kind())),
            None => Err(Error::MissingDependency(format!("asset {} not found", id))),
        }
    }

    /// Typed getter; fails loudly if the stored asset is not a folder
    pub fn folder(&self, id: AssetId) -> Result<&FolderAsset> {
        match self.assets.get(&id) {
            Some(Asset::Folder(folder)) => Ok(folder),
            Some(other) => Err(Self::kind_mismatch(id, AssetKind::Folder, other.kind())),
            None => Err(Error::MissingDependency(format!("asset {} not found", id))),
        }
    }

    /// Find the pipeline layout asset built for a layout family
    pub fn pipeline_layout_by_type(
        &self,
        layout_type: PipelineLayoutType,
    ) -> Option<&PipelineLayoutAsset> {
        self.assets.values().find_map(|asset| match asset {
            Asset::PipelineLayout(layout) if layout.layout_type() == layout_type => Some(layout),
            _ => None,
        })
    }

    /// Number of assets currently registered
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Identifiers of all registered assets
    pub fn asset_ids(&self) -> Vec<AssetId> {
        self.assets.keys().copied().collect()
    }

    fn kind_mismatch(id: AssetId, requested: AssetKind, stored: AssetKind) -> Error {
        Error::InvalidResource(format!(
            "asset {} is a {:?}, not a {:?}",
            id, stored, requested
        ))
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
