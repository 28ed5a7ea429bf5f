/// Sampler trait and sampler descriptor

/// Texture filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Texture coordinate addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Descriptor for creating a sampler
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDesc {
    /// Minification filter
    pub min_filter: Filter,
    /// Magnification filter
    pub mag_filter: Filter,
    /// Addressing mode for all coordinates
    pub address_mode: AddressMode,
    /// Maximum anisotropy (1.0 = disabled)
    pub max_anisotropy: f32,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            address_mode: AddressMode::Repeat,
            max_anisotropy: 1.0,
        }
    }
}

/// Sampler resource trait
///
/// Implemented by backend-specific sampler types. Destroyed on drop.
pub trait Sampler: Send + Sync {}
