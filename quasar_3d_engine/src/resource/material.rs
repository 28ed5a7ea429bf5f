//! Material asset, setting, and manager.
//!
//! A material references a pipeline by identifier and carries a binding
//! group (descriptor set) with its parameter uniform buffer and textures.
//! The pipeline reference must resolve at creation: a material with a
//! dangling pipeline reference is never constructed, so everything the
//! draw loop picks up is valid.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{
    BindingGroup, BindingResource, Buffer, BufferDesc, BufferUsage, GraphicsDevice,
    MemoryLocation,
};
use crate::log::Log;
use crate::resource::asset::{Asset, AssetId, AssetInfo, AssetKind, AssetSetting, AssetState};
use crate::resource::resource_manager::{AssetManager, ManagerContext};

/// Set index materials bind their descriptor set at (set 0 is global)
const MATERIAL_SET_INDEX: u32 = 1;

/// A typed parameter value for the material
#[derive(Debug, Clone)]
pub enum ParamValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    UInt(u32),
}

impl ParamValue {
    /// Pack the value into one 16-byte uniform slot (std140-compatible)
    fn to_slot(&self) -> [u8; 16] {
        let mut slot = [0u8; 16];
        match self {
            ParamValue::Float(v) => slot[..4].copy_from_slice(&v.to_le_bytes()),
            ParamValue::Vec2(v) => slot[..8].copy_from_slice(bytemuck::bytes_of(v)),
            ParamValue::Vec3(v) => slot[..12].copy_from_slice(bytemuck::bytes_of(v)),
            ParamValue::Vec4(v) => slot.copy_from_slice(bytemuck::bytes_of(v)),
            ParamValue::Int(v) => slot[..4].copy_from_slice(&v.to_le_bytes()),
            ParamValue::UInt(v) => slot[..4].copy_from_slice(&v.to_le_bytes()),
        }
        slot
    }
}

/// Creation descriptor for a material asset
#[derive(Clone)]
pub struct MaterialSetting {
    /// Asset name
    pub name: String,
    /// Identifier of the pipeline this material renders with
    pub pipeline: AssetId,
    /// Texture assets bound after the parameter buffer, in binding order
    pub textures: Vec<AssetId>,
    /// Named parameter values packed into the material uniform buffer
    pub params: Vec<(String, ParamValue)>,
}

/// Material asset: resolved pipeline reference + descriptor set + params
pub struct MaterialAsset {
    pub(crate) info: AssetInfo,
    pub(crate) pipeline: AssetId,
    pub(crate) binding_group: Arc<dyn BindingGroup>,
    pub(crate) param_buffer: Arc<dyn Buffer>,
}

impl MaterialAsset {
    /// Identifier of the pipeline this material renders with
    pub fn pipeline(&self) -> AssetId {
        self.pipeline
    }

    /// The material descriptor set
    pub fn binding_group(&self) -> &Arc<dyn BindingGroup> {
        &self.binding_group
    }

    /// The parameter uniform buffer
    pub fn param_buffer(&self) -> &Arc<dyn Buffer> {
        &self.param_buffer
    }

    /// Shared identity/lifecycle info
    pub fn info(&self) -> &AssetInfo {
        &self.info
    }
}

/// Creates material assets from settings
pub struct MaterialManager {
    device: Arc<dyn GraphicsDevice>,
    #[allow(dead_code)]
    log: Log,
}

impl MaterialManager {
    pub fn new(device: Arc<dyn GraphicsDevice>, log: Log) -> Self {
        Self { device, log }
    }
}

impl AssetManager for MaterialManager {
    fn kind(&self) -> AssetKind {
        AssetKind::Material
    }

    fn create(&mut self, setting: &AssetSetting, ctx: &ManagerContext<'_>) -> Result<Asset> {
        let AssetSetting::Material(setting) = setting else {
            return Err(Error::InvalidResource(
                "MaterialManager received a non-material setting".to_string(),
            ));
        };
        // ========== VALIDATION ==========
        if setting.name.is_empty() {
            return Err(Error::InvalidResource(
                "Material setting has an empty name".to_string(),
            ));
        }
        let mut seen_params = HashSet::new();
        for (param_name, _) in &setting.params {
            if !seen_params.insert(param_name) {
                return Err(Error::InvalidResource(format!(
                    "Material '{}' has duplicate parameter name '{}'",
                    setting.name, param_name
                )));
            }
        }

        // ========== DEPENDENCY RESOLUTION ==========
        let pipeline = match ctx.asset(setting.pipeline) {
            Some(Asset::Pipeline(pipeline)) => pipeline,
            Some(other) => {
                return Err(Error::InvalidResource(format!(
                    "Material '{}' references asset {} as its pipeline, but it is a {:?}",
                    setting.name,
                    setting.pipeline,
                    other.kind()
                )));
            }
            None => {
                return Err(Error::MissingDependency(format!(
                    "pipeline {} referenced by material '{}'",
                    setting.pipeline, setting.name
                )));
            }
        };

        let layout = ctx.pipeline_layout_by_type(pipeline.layout_type()).ok_or_else(|| {
            Error::MissingDependency(format!(
                "pipeline layout type {:?} required by material '{}'",
                pipeline.layout_type(),
                setting.name
            ))
        })?;

        // ========== PARAMETER BUFFER ==========
        let slot_count = setting.params.len().max(1);
        let buffer_size = (slot_count * 16) as u64;
        let param_buffer = self.device.create_buffer(BufferDesc {
            size: buffer_size,
            usage: BufferUsage::UNIFORM,
            location: MemoryLocation::CpuToGpu,
        })?;
        for (slot, (_, value)) in setting.params.iter().enumerate() {
            param_buffer.update(slot as u64 * 16, &value.to_slot())?;
        }

        // ========== BINDING GROUP ==========
        let mut resources = vec![BindingResource::UniformBuffer {
            buffer: Arc::clone(&param_buffer),
            offset: 0,
            range: buffer_size,
        }];
        for texture_id in &setting.textures {
            let texture = match ctx.asset(*texture_id) {
                Some(Asset::Texture(texture)) => texture,
                Some(other) => {
                    return Err(Error::InvalidResource(format!(
                        "Material '{}' references asset {} as a texture, but it is a {:?}",
                        setting.name,
                        texture_id,
                        other.kind()
                    )));
                }
                None => {
                    return Err(Error::MissingDependency(format!(
                        "texture {} referenced by material '{}'",
                        texture_id, setting.name
                    )));
                }
            };
            resources.push(BindingResource::Texture {
                texture: Arc::clone(texture.texture()),
                sampler: Arc::clone(texture.sampler()),
            });
        }

        let binding_group =
            self.device
                .create_binding_group(layout.layout(), MATERIAL_SET_INDEX, &resources)?;

        Ok(Asset::Material(MaterialAsset {
            info: AssetInfo::new(setting.name.clone(), AssetState::Loaded),
            pipeline: setting.pipeline,
            binding_group,
            param_buffer,
        }))
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
