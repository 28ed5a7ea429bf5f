//! Per-frame rendering: render-pass descriptions and the frame driver.

pub mod render_pass_manager;
pub mod render_system;
pub mod renderable;

pub use render_pass_manager::{RenderPassKind, RenderPassManager};
pub use render_system::{FrameStats, RenderSystem, RenderSystemConfig};
pub use renderable::Renderable;
