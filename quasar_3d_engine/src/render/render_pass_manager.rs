/// Render pass manager: the fixed set of render-pass descriptions
///
/// Precomputes, at construction, every supported render-pass kind via one
/// private builder per kind. Pure construction, no per-frame state.
/// Kinds whose builders are not yet implemented simply produce no entry;
/// looking one up is a non-retryable configuration fault, not a transient
/// condition.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{
    AccessMask, AttachmentDesc, GraphicsDevice, ImageLayout, LoadOp, RenderPass,
    RenderPassDesc, StageMask, StoreOp, SubpassDependencyDesc, SubpassDesc,
    TextureFormat,
};
use crate::log::Log;
use crate::engine_error;

/// Closed enumeration of render-pass kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPassKind {
    ForwardComposite,
    DeferredComposite,
    Shadow,
    Sky,
    Transparent,
    PostProcess,
    Ui,
}

impl RenderPassKind {
    /// All kinds, in the order the manager attempts to build them
    pub const ALL: [RenderPassKind; 7] = [
        RenderPassKind::ForwardComposite,
        RenderPassKind::DeferredComposite,
        RenderPassKind::Shadow,
        RenderPassKind::Sky,
        RenderPassKind::Transparent,
        RenderPassKind::PostProcess,
        RenderPassKind::Ui,
    ];
}

/// A built render pass plus the facts pipeline construction needs
struct RenderPassEntry {
    render_pass: Arc<dyn RenderPass>,
    color_attachment_count: u32,
    color_format: TextureFormat,
    depth_format: Option<TextureFormat>,
}

/// Stores one immutable render-pass description per implemented kind
pub struct RenderPassManager {
    entries: FxHashMap<RenderPassKind, RenderPassEntry>,
    log: Log,
}

impl RenderPassManager {
    /// Build every supported render-pass kind exactly once
    pub fn new(device: &Arc<dyn GraphicsDevice>, log: Log) -> Result<Self> {
        let mut entries = FxHashMap::default();

        for kind in RenderPassKind::ALL {
            if let Some(entry) = Self::build_kind(device, kind)? {
                entries.insert(kind, entry);
            }
        }

        Ok(Self { entries, log })
    }

    /// Get the render pass for a kind
    ///
    /// Returns `None` (with a logged error) if the kind was never built.
    /// Callers must treat this as a configuration fault, not something to
    /// retry.
    pub fn render_pass(&self, kind: RenderPassKind) -> Option<&Arc<dyn RenderPass>> {
        match self.entries.get(&kind) {
            Some(entry) => Some(&entry.render_pass),
            None => {
                engine_error!(
                    self.log,
                    "quasar3d::RenderPassManager",
                    "Render pass kind {:?} was never built",
                    kind
                );
                None
            }
        }
    }

    /// True if a description was built for this kind
    pub fn has_render_pass(&self, kind: RenderPassKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Color-attachment count of the kind's single subpass
    ///
    /// Pipeline builders validate their blend-attachment count against
    /// this value.
    pub fn color_attachment_count(&self, kind: RenderPassKind) -> Option<u32> {
        self.entries.get(&kind).map(|e| e.color_attachment_count)
    }

    /// Color format the kind renders into
    pub fn color_format(&self, kind: RenderPassKind) -> Option<TextureFormat> {
        self.entries.get(&kind).map(|e| e.color_format)
    }

    /// Depth format of the kind, if it has a depth attachment
    pub fn depth_format(&self, kind: RenderPassKind) -> Option<TextureFormat> {
        self.entries.get(&kind).and_then(|e| e.depth_format)
    }

    /// Number of kinds that were actually built
    pub fn render_pass_count(&self) -> usize {
        self.entries.len()
    }

    // ===== PER-KIND BUILDERS =====

    fn build_kind(
        device: &Arc<dyn GraphicsDevice>,
        kind: RenderPassKind,
    ) -> Result<Option<RenderPassEntry>> {
        match kind {
            RenderPassKind::ForwardComposite => Self::build_forward_composite(device).map(Some),
            RenderPassKind::DeferredComposite => Self::build_deferred_composite(device).map(Some),
            // Placeholders: these kinds produce no entry until their
            // passes are wired into the draw loop.
            RenderPassKind::Shadow
            | RenderPassKind::Sky
            | RenderPassKind::Transparent
            | RenderPassKind::PostProcess
            | RenderPassKind::Ui => Ok(None),
        }
    }

    /// Forward composite: one color attachment + depth, single subpass,
    /// external dependency covering color and depth writes.
    fn build_forward_composite(device: &Arc<dyn GraphicsDevice>) -> Result<RenderPassEntry> {
        let color_format = TextureFormat::B8G8R8A8_UNORM;
        let depth_format = TextureFormat::D32_FLOAT;

        let desc = RenderPassDesc {
            name: "forward_composite".to_string(),
            attachments: vec![
                AttachmentDesc {
                    format: color_format,
                    load_op: LoadOp::Clear,
                    store_op: StoreOp::Store,
                    initial_layout: ImageLayout::Undefined,
                    final_layout: ImageLayout::ShaderReadOnly,
                },
                AttachmentDesc {
                    format: depth_format,
                    load_op: LoadOp::Clear,
                    store_op: StoreOp::DontCare,
                    initial_layout: ImageLayout::Undefined,
                    final_layout: ImageLayout::DepthStencilAttachment,
                },
            ],
            subpasses: vec![SubpassDesc {
                color_attachments: vec![0],
                depth_stencil_attachment: Some(1),
                input_attachments: Vec::new(),
            }],
            dependencies: vec![SubpassDependencyDesc {
                src_subpass: None,
                dst_subpass: Some(0),
                src_stage: StageMask::COLOR_ATTACHMENT_OUTPUT | StageMask::EARLY_FRAGMENT_TESTS,
                dst_stage: StageMask::COLOR_ATTACHMENT_OUTPUT | StageMask::EARLY_FRAGMENT_TESTS,
                src_access: AccessMask::empty(),
                dst_access: AccessMask::COLOR_ATTACHMENT_WRITE | AccessMask::DEPTH_STENCIL_WRITE,
            }],
        };

        let render_pass = device.create_render_pass(&desc)?;
        Ok(RenderPassEntry {
            render_pass,
            color_attachment_count: 1,
            color_format,
            depth_format: Some(depth_format),
        })
    }

    /// Deferred composite: four G-buffer color attachments
    /// (albedo, normal, material parameters, emissive) + depth.
    fn build_deferred_composite(device: &Arc<dyn GraphicsDevice>) -> Result<RenderPassEntry> {
        let color_format = TextureFormat::R8G8B8A8_UNORM;
        let depth_format = TextureFormat::D32_FLOAT;

        let gbuffer_formats = [
            TextureFormat::R8G8B8A8_UNORM,       // albedo
            TextureFormat::R16G16B16A16_SFLOAT,  // world-space normal
            TextureFormat::R8G8B8A8_UNORM,       // metallic/roughness/occlusion
            TextureFormat::R8G8B8A8_UNORM,       // emissive
        ];

        let mut attachments: Vec<AttachmentDesc> = gbuffer_formats
            .iter()
            .map(|&format| AttachmentDesc {
                format,
                load_op: LoadOp::Clear,
                store_op: StoreOp::Store,
                initial_layout: ImageLayout::Undefined,
                final_layout: ImageLayout::ShaderReadOnly,
            })
            .collect();
        attachments.push(AttachmentDesc {
            format: depth_format,
            load_op: LoadOp::Clear,
            store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::DepthStencilAttachment,
        });

        let desc = RenderPassDesc {
            name: "deferred_composite".to_string(),
            attachments,
            subpasses: vec![SubpassDesc {
                color_attachments: vec![0, 1, 2, 3],
                depth_stencil_attachment: Some(4),
                input_attachments: Vec::new(),
            }],
            dependencies: vec![SubpassDependencyDesc {
                src_subpass: None,
                dst_subpass: Some(0),
                src_stage: StageMask::COLOR_ATTACHMENT_OUTPUT | StageMask::EARLY_FRAGMENT_TESTS,
                dst_stage: StageMask::COLOR_ATTACHMENT_OUTPUT | StageMask::EARLY_FRAGMENT_TESTS,
                src_access: AccessMask::empty(),
                dst_access: AccessMask::COLOR_ATTACHMENT_WRITE | AccessMask::DEPTH_STENCIL_WRITE,
            }],
        };

        let render_pass = device.create_render_pass(&desc)?;
        Ok(RenderPassEntry {
            render_pass,
            color_attachment_count: 4,
            color_format,
            depth_format: Some(depth_format),
        })
    }
}

#[cfg(test)]
#[path = "render_pass_manager_tests.rs"]
mod tests;
