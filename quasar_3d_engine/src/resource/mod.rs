//! Resource management module
//!
//! The asset model, one manager per asset kind, and the central registry
//! that owns every asset by identifier.

pub mod asset;
pub mod texture;
pub mod mesh;
pub mod pipeline;
pub mod material;
pub mod folder;
mod resource_manager;

pub use asset::{Asset, AssetId, AssetInfo, AssetKind, AssetSetting, AssetState};
pub use texture::{TextureAsset, TextureManager, TextureSetting};
pub use mesh::{MeshAsset, MeshManager, MeshSetting};
pub use pipeline::{
    PipelineAsset, PipelineLayoutAsset, PipelineLayoutManager, PipelineLayoutSetting,
    PipelineManager, PipelineSetting, ShaderSource,
};
pub use material::{MaterialAsset, MaterialManager, MaterialSetting, ParamValue};
pub use folder::{FolderAsset, FolderManager, FolderSetting};
pub use resource_manager::{AssetManager, ManagerContext, ResourceManager, WritePayload};
