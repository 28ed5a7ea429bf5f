/// Shader module trait and descriptor

use bitflags::bitflags;

/// A single programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

bitflags! {
    /// Shader stage visibility flags (descriptor bindings, push constants)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
    }
}

/// Descriptor for creating a shader module from SPIR-V code
#[derive(Debug, Clone)]
pub struct ShaderModuleDesc {
    /// Human-readable name (shader file stem)
    pub name: String,
    /// Stage this module is compiled for
    pub stage: ShaderStage,
    /// Raw SPIR-V bytes (length must be a multiple of 4)
    pub code: Vec<u8>,
}

/// Shader module resource trait
///
/// Implemented by backend-specific shader types. Destroyed on drop.
pub trait ShaderModule: Send + Sync {
    /// Stage this module was created for
    fn stage(&self) -> ShaderStage;
}
