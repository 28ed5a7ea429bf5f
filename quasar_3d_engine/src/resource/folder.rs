//! Folder asset, setting, and manager.
//!
//! Folders carry no GPU state; they exist so the registry can organize
//! assets hierarchically. Folder is the one kind with a meaningful
//! `update` (rename / reparent).

use crate::error::{Error, Result};
use crate::resource::asset::{Asset, AssetId, AssetInfo, AssetKind, AssetSetting, AssetState};
use crate::resource::resource_manager::{AssetManager, ManagerContext};

/// Creation descriptor for a folder asset
#[derive(Debug, Clone)]
pub struct FolderSetting {
    /// Asset name
    pub name: String,
    /// Parent folder, if any
    pub parent: Option<AssetId>,
}

/// Folder asset: organizational node, no GPU resources
pub struct FolderAsset {
    pub(crate) info: AssetInfo,
    pub(crate) parent: Option<AssetId>,
}

impl FolderAsset {
    /// The parent folder, if any
    pub fn parent(&self) -> Option<AssetId> {
        self.parent
    }

    /// Shared identity/lifecycle info
    pub fn info(&self) -> &AssetInfo {
        &self.info
    }
}

/// Creates and updates folder assets
pub struct FolderManager;

impl FolderManager {
    pub fn new() -> Self {
        Self
    }

    fn validate_parent(setting: &FolderSetting, ctx: &ManagerContext<'_>) -> Result<()> {
        if let Some(parent) = setting.parent {
            match ctx.asset(parent) {
                Some(Asset::Folder(_)) => {}
                Some(other) => {
                    return Err(Error::InvalidResource(format!(
                        "Folder '{}' parent {} is a {:?}, not a Folder",
                        setting.name,
                        parent,
                        other.kind()
                    )));
                }
                None => {
                    return Err(Error::MissingDependency(format!(
                        "parent folder {} referenced by folder '{}'",
                        parent, setting.name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl AssetManager for FolderManager {
    fn kind(&self) -> AssetKind {
        AssetKind::Folder
    }

    fn create(&mut self, setting: &AssetSetting, ctx: &ManagerContext<'_>) -> Result<Asset> {
        let AssetSetting::Folder(setting) = setting else {
            return Err(Error::InvalidResource(
                "FolderManager received a non-folder setting".to_string(),
            ));
        };
        if setting.name.is_empty() {
            return Err(Error::InvalidResource(
                "Folder setting has an empty name".to_string(),
            ));
        }
        Self::validate_parent(setting, ctx)?;

        Ok(Asset::Folder(FolderAsset {
            info: AssetInfo::new(setting.name.clone(), AssetState::Loaded),
            parent: setting.parent,
        }))
    }

    fn update(&mut self, asset: &mut Asset, setting: &AssetSetting, ctx: &ManagerContext<'_>) -> Result<()> {
        let (Asset::Folder(folder), AssetSetting::Folder(setting)) = (asset, setting) else {
            return Err(Error::InvalidResource(
                "FolderManager received a mismatched update".to_string(),
            ));
        };
        if setting.name.is_empty() {
            return Err(Error::InvalidResource(
                "Folder update has an empty name".to_string(),
            ));
        }
        Self::validate_parent(setting, ctx)?;

        folder.info.name = setting.name.clone();
        folder.parent = setting.parent;
        Ok(())
    }
}

#[cfg(test)]
#[path = "folder_tests.rs"]
mod tests;
