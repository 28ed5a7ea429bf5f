/// The scene boundary: an iterable view of drawable entities.
///
/// The render system consumes these without mutating them; how they are
/// produced (ECS, flat list, editor selection) is external.

use glam::Mat4;
use crate::resource::AssetId;

/// One drawable entity: mesh + material references and a world transform
#[derive(Debug, Clone, Copy)]
pub struct Renderable {
    /// Mesh asset providing vertex/index buffers and the index count
    pub mesh: AssetId,
    /// Material asset providing the pipeline reference and descriptor set
    pub material: AssetId,
    /// World transform, pushed per draw
    pub transform: Mat4,
}
