/// BindingGroup trait and binding resource descriptors

use std::sync::Arc;
use crate::graphics_device::{Buffer, Sampler, Texture};

/// One resource bound into a binding group slot
#[derive(Clone)]
pub enum BindingResource {
    /// A sampled texture with its sampler
    Texture {
        texture: Arc<dyn Texture>,
        sampler: Arc<dyn Sampler>,
    },
    /// A uniform buffer range
    UniformBuffer {
        buffer: Arc<dyn Buffer>,
        offset: u64,
        range: u64,
    },
}

/// Binding group resource trait (a descriptor set)
///
/// An immutable set of GPU resource bindings allocated against one
/// descriptor-set layout of a pipeline layout. Destroyed on drop.
pub trait BindingGroup: Send + Sync {
    /// The set index this group was allocated for
    fn set_index(&self) -> u32;
}
