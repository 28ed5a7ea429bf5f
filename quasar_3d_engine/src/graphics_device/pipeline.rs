/// Pipeline and pipeline-layout traits plus the fixed-function state descriptors
///
/// Pipeline creation info is a large aggregate with structurally dependent
/// fields; these value structs carry documented defaults so builders only
/// override what differs per pipeline family.

use bitflags::bitflags;
use std::sync::Arc;
use crate::graphics_device::{
    RenderPass, ShaderModule, ShaderStageFlags, VertexLayout,
};

/// Primitive assembly topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    TriangleList,
    TriangleStrip,
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Winding order considered front-facing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// Polygon rasterization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
}

/// Depth/stencil comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    Always,
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Blend operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendOp {
    Add,
    Subtract,
}

/// Multisample count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleCount {
    X1,
    X2,
    X4,
    X8,
}

/// Rasterization state
#[derive(Debug, Clone)]
pub struct RasterizationState {
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub line_width: f32,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            line_width: 1.0,
        }
    }
}

/// Multisample state
#[derive(Debug, Clone)]
pub struct MultisampleState {
    pub samples: SampleCount,
}

impl Default for MultisampleState {
    fn default() -> Self {
        Self { samples: SampleCount::X1 }
    }
}

/// Depth/stencil state
#[derive(Debug, Clone)]
pub struct DepthStencilState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub compare_op: CompareOp,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            compare_op: CompareOp::Less,
        }
    }
}

/// Blend state for one color attachment
#[derive(Debug, Clone)]
pub struct BlendAttachmentState {
    pub blend_enable: bool,
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub color_op: BlendOp,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub alpha_op: BlendOp,
}

impl Default for BlendAttachmentState {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_color: BlendFactor::One,
            dst_color: BlendFactor::Zero,
            color_op: BlendOp::Add,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
            alpha_op: BlendOp::Add,
        }
    }
}

/// Blend state for all color attachments of the target subpass.
///
/// The attachment count must equal the color-attachment count of the
/// subpass the pipeline is built against.
#[derive(Debug, Clone, Default)]
pub struct ColorBlendState {
    pub attachments: Vec<BlendAttachmentState>,
}

bitflags! {
    /// States supplied at record time instead of bake time
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DynamicStateFlags: u32 {
        const VIEWPORT = 1 << 0;
        const SCISSOR = 1 << 1;
    }
}

// ===== PIPELINE LAYOUT =====

/// Resource kind bound at a descriptor binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    UniformBuffer,
    StorageBuffer,
    CombinedImageSampler,
}

/// One binding within a descriptor-set layout
#[derive(Debug, Clone)]
pub struct DescriptorBindingDesc {
    pub binding: u32,
    pub binding_type: BindingType,
    pub count: u32,
    pub stages: ShaderStageFlags,
}

/// One descriptor-set layout (an ordered set of bindings)
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetLayoutDesc {
    pub bindings: Vec<DescriptorBindingDesc>,
}

/// One push-constant range
#[derive(Debug, Clone)]
pub struct PushConstantRange {
    pub stages: ShaderStageFlags,
    pub offset: u32,
    pub size: u32,
}

/// Descriptor for creating a pipeline layout
#[derive(Debug, Clone, Default)]
pub struct PipelineLayoutDesc {
    /// Human-readable name
    pub name: String,
    /// Descriptor-set layouts, set index = position
    pub set_layouts: Vec<DescriptorSetLayoutDesc>,
    /// Push-constant ranges
    pub push_constant_ranges: Vec<PushConstantRange>,
}

/// Pipeline layout resource trait
///
/// Owns its descriptor-set layout handles; immutable after construction.
pub trait PipelineLayout: Send + Sync {
    /// Number of descriptor-set layouts in this pipeline layout
    fn descriptor_set_layout_count(&self) -> u32;
}

// ===== PIPELINE =====

/// One programmable stage of a pipeline
#[derive(Clone)]
pub struct ShaderStageDesc {
    pub module: Arc<dyn ShaderModule>,
    /// Entry point name, normally "main"
    pub entry_point: String,
}

/// Descriptor for creating a graphics pipeline state object
#[derive(Clone)]
pub struct PipelineStateDesc {
    /// Human-readable name
    pub name: String,
    /// Programmable stages (vertex first)
    pub stages: Vec<ShaderStageDesc>,
    pub vertex_layout: VertexLayout,
    pub topology: PrimitiveTopology,
    pub rasterization: RasterizationState,
    pub multisample: MultisampleState,
    pub depth_stencil: DepthStencilState,
    pub color_blend: ColorBlendState,
    pub dynamic_state: DynamicStateFlags,
    /// Layout the pipeline is compiled against
    pub layout: Arc<dyn PipelineLayout>,
    /// Render pass and subpass the pipeline targets
    pub render_pass: Arc<dyn RenderPass>,
    pub subpass: u32,
}

/// Pipeline resource trait
///
/// Immutable after construction; rebuilding requires creating a new one.
pub trait Pipeline: Send + Sync {}
