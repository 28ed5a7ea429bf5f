//! Asset model: identity, kind tags, lifecycle state, and the closed asset
//! variant.
//!
//! Assets are dispatched by kind tag rather than by inheritance: the
//! `Asset` enum is the single closed set of things the resource registry
//! can own, and `AssetSetting` is the matching closed set of creation
//! descriptors.

use uuid::Uuid;

use crate::resource::folder::{FolderAsset, FolderSetting};
use crate::resource::material::{MaterialAsset, MaterialSetting};
use crate::resource::mesh::{MeshAsset, MeshSetting};
use crate::resource::pipeline::{
    PipelineAsset, PipelineLayoutAsset, PipelineLayoutSetting, PipelineSetting,
};
use crate::resource::texture::{TextureAsset, TextureSetting};

/// Stable asset identifier: 128-bit, time-ordered, generated once at
/// creation and never reused.
pub type AssetId = Uuid;

/// Generate a fresh asset identifier
pub fn new_asset_id() -> AssetId {
    Uuid::now_v7()
}

/// Closed set of asset kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Texture,
    Mesh,
    PipelineLayout,
    Pipeline,
    Material,
    Folder,
}

/// Asset lifecycle state
///
/// GPU-backed assets whose contents arrive through the write protocol
/// (textures, meshes) start `Unloaded` (memory allocated, contents
/// undefined) and become `Loaded` after a successful write. Assets that
/// are complete at creation (pipelines, layouts, materials, folders) are
/// `Loaded` immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Unloaded,
    Loaded,
}

/// Identity and lifecycle shared by every asset
#[derive(Debug, Clone)]
pub struct AssetInfo {
    /// Stable identifier
    pub id: AssetId,
    /// Human-readable name
    pub name: String,
    /// Lifecycle state
    pub state: AssetState,
}

impl AssetInfo {
    /// Create info for a new asset with a fresh identifier
    pub fn new(name: impl Into<String>, state: AssetState) -> Self {
        Self {
            id: new_asset_id(),
            name: name.into(),
            state,
        }
    }
}

/// The closed asset variant owned by the resource registry.
///
/// GPU sub-resources are owned by the concrete asset structs and released
/// when the asset is dropped; no two assets ever share a GPU handle.
pub enum Asset {
    Texture(TextureAsset),
    Mesh(MeshAsset),
    PipelineLayout(PipelineLayoutAsset),
    Pipeline(PipelineAsset),
    Material(MaterialAsset),
    Folder(FolderAsset),
}

impl Asset {
    /// Kind tag of this asset
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Texture(_) => AssetKind::Texture,
            Asset::Mesh(_) => AssetKind::Mesh,
            Asset::PipelineLayout(_) => AssetKind::PipelineLayout,
            Asset::Pipeline(_) => AssetKind::Pipeline,
            Asset::Material(_) => AssetKind::Material,
            Asset::Folder(_) => AssetKind::Folder,
        }
    }

    /// Shared identity/lifecycle info
    pub fn info(&self) -> &AssetInfo {
        match self {
            Asset::Texture(a) => &a.info,
            Asset::Mesh(a) => &a.info,
            Asset::PipelineLayout(a) => &a.info,
            Asset::Pipeline(a) => &a.info,
            Asset::Material(a) => &a.info,
            Asset::Folder(a) => &a.info,
        }
    }

    /// Mutable shared info
    pub fn info_mut(&mut self) -> &mut AssetInfo {
        match self {
            Asset::Texture(a) => &mut a.info,
            Asset::Mesh(a) => &mut a.info,
            Asset::PipelineLayout(a) => &mut a.info,
            Asset::Pipeline(a) => &mut a.info,
            Asset::Material(a) => &mut a.info,
            Asset::Folder(a) => &mut a.info,
        }
    }

    /// Stable identifier
    pub fn id(&self) -> AssetId {
        self.info().id
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.info().name
    }

    /// Lifecycle state
    pub fn state(&self) -> AssetState {
        self.info().state
    }
}

/// Closed set of creation descriptors, mirroring `AssetKind`
pub enum AssetSetting {
    Texture(TextureSetting),
    Mesh(MeshSetting),
    PipelineLayout(PipelineLayoutSetting),
    Pipeline(PipelineSetting),
    Material(MaterialSetting),
    Folder(FolderSetting),
}

impl AssetSetting {
    /// Kind of asset this setting creates
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetSetting::Texture(_) => AssetKind::Texture,
            AssetSetting::Mesh(_) => AssetKind::Mesh,
            AssetSetting::PipelineLayout(_) => AssetKind::PipelineLayout,
            AssetSetting::Pipeline(_) => AssetKind::Pipeline,
            AssetSetting::Material(_) => AssetKind::Material,
            AssetSetting::Folder(_) => AssetKind::Folder,
        }
    }

    /// Requested asset name
    pub fn name(&self) -> &str {
        match self {
            AssetSetting::Texture(s) => &s.name,
            AssetSetting::Mesh(s) => &s.name,
            AssetSetting::PipelineLayout(s) => &s.name,
            AssetSetting::Pipeline(s) => &s.name,
            AssetSetting::Material(s) => &s.name,
            AssetSetting::Folder(s) => &s.name,
        }
    }
}

#[cfg(test)]
#[path = "asset_tests.rs"]
mod tests;
