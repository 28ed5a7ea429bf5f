/// RenderPass trait and the attachment/subpass/dependency description graph

use bitflags::bitflags;
use crate::graphics_device::{ImageLayout, TextureFormat};

/// Load operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    /// Load existing content
    Load,
    /// Clear the content
    Clear,
    /// Don't care about existing content
    DontCare,
}

/// Store operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// Store the rendered content
    Store,
    /// Don't care about storing the content
    DontCare,
}

bitflags! {
    /// Pipeline stages referenced by subpass dependencies
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StageMask: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const EARLY_FRAGMENT_TESTS = 1 << 1;
        const FRAGMENT_SHADER = 1 << 2;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 3;
        const TRANSFER = 1 << 4;
        const BOTTOM_OF_PIPE = 1 << 5;
    }
}

bitflags! {
    /// Memory access kinds referenced by subpass dependencies
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessMask: u32 {
        const COLOR_ATTACHMENT_READ = 1 << 0;
        const COLOR_ATTACHMENT_WRITE = 1 << 1;
        const DEPTH_STENCIL_READ = 1 << 2;
        const DEPTH_STENCIL_WRITE = 1 << 3;
        const SHADER_READ = 1 << 4;
        const TRANSFER_WRITE = 1 << 5;
    }
}

/// Descriptor for a single attachment in a render pass
#[derive(Debug, Clone)]
pub struct AttachmentDesc {
    /// Pixel format
    pub format: TextureFormat,
    /// Load operation (what to do with existing content)
    pub load_op: LoadOp,
    /// Store operation (what to do with rendered content)
    pub store_op: StoreOp,
    /// Initial layout (how the attachment starts)
    pub initial_layout: ImageLayout,
    /// Final layout (how the attachment ends)
    pub final_layout: ImageLayout,
}

/// Descriptor for one subpass: attachment indices into the pass
#[derive(Debug, Clone, Default)]
pub struct SubpassDesc {
    /// Indices of color attachments written by this subpass
    pub color_attachments: Vec<u32>,
    /// Index of the depth/stencil attachment, if any
    pub depth_stencil_attachment: Option<u32>,
    /// Indices of attachments read as input attachments
    pub input_attachments: Vec<u32>,
}

/// Descriptor for one subpass-to-subpass (or external) dependency
#[derive(Debug, Clone)]
pub struct SubpassDependencyDesc {
    /// Source subpass index; `None` = external
    pub src_subpass: Option<u32>,
    /// Destination subpass index; `None` = external
    pub dst_subpass: Option<u32>,
    pub src_stage: StageMask,
    pub dst_stage: StageMask,
    pub src_access: AccessMask,
    pub dst_access: AccessMask,
}

/// Descriptor for creating a render pass.
///
/// A fixed graph of attachments, subpasses, and dependencies, built once
/// and immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct RenderPassDesc {
    /// Human-readable name
    pub name: String,
    /// All attachments referenced by the subpasses
    pub attachments: Vec<AttachmentDesc>,
    /// Subpasses in execution order
    pub subpasses: Vec<SubpassDesc>,
    /// Execution/memory dependencies between subpasses
    pub dependencies: Vec<SubpassDependencyDesc>,
}

/// Render pass resource trait
///
/// Implemented by backend-specific render pass types. Destroyed on drop.
pub trait RenderPass: Send + Sync {}
