//! Pipeline-layout and pipeline assets, settings, and managers.
//!
//! Both managers delegate construction to the builder/director scripts in
//! [`crate::pipeline`]; their own job is resolving what the scripts need
//! (SPIR-V code, the layout for the requested technique, the render-pass
//! description) and refusing invalid settings before any device call.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{
    BlendAttachmentState, DepthStencilState, GraphicsDevice, MultisampleState,
    Pipeline, PipelineLayout, PipelineLayoutDesc, PrimitiveTopology,
    RasterizationState, ShaderModule, ShaderModuleDesc, ShaderStage, VertexLayout,
};
use crate::log::Log;
use crate::pipeline::{
    CustomShaderPipelineBuilder, ForwardPipelineBuilder, GBufferPipelineBuilder,
    GBufferPipelineLayoutBuilder, PbrPipelineLayoutBuilder, PipelineBuildInput,
    PipelineBuilder, PipelineDirector, PipelineFamily, PipelineLayoutBuilder,
    PipelineLayoutDirector, PipelineLayoutType, SkyPipelineLayoutBuilder,
};
use crate::render::RenderPassKind;
use crate::resource::asset::{Asset, AssetInfo, AssetKind, AssetSetting};
use crate::resource::resource_manager::{AssetManager, ManagerContext};

/// Where a pipeline's SPIR-V comes from
#[derive(Debug, Clone)]
pub enum ShaderSource {
    /// Raw SPIR-V bytes, already in memory
    SpirvBytes(Vec<u8>),
    /// Path to a compiled `.spv` file, read at pipeline creation
    SpirvPath(PathBuf),
}

impl ShaderSource {
    fn load(&self) -> Result<Vec<u8>> {
        match self {
            ShaderSource::SpirvBytes(bytes) => Ok(bytes.clone()),
            ShaderSource::SpirvPath(path) => std::fs::read(path).map_err(|e| {
                Error::MissingDependency(format!("shader file '{}': {}", path.display(), e))
            }),
        }
    }
}

// ============================================================================
// PIPELINE LAYOUT
// ============================================================================

/// Creation descriptor for a pipeline layout asset
#[derive(Debug, Clone)]
pub struct PipelineLayoutSetting {
    /// Asset name
    pub name: String,
    /// Layout family to construct
    pub layout_type: PipelineLayoutType,
}

/// Pipeline-layout asset: the device layout handle, its family tag, and
/// the descriptor it was built from. Immutable after construction.
pub struct PipelineLayoutAsset {
    pub(crate) info: AssetInfo,
    pub(crate) layout: Arc<dyn PipelineLayout>,
    pub(crate) layout_type: PipelineLayoutType,
    pub(crate) desc: PipelineLayoutDesc,
}

impl PipelineLayoutAsset {
    /// The device pipeline-layout handle
    pub fn layout(&self) -> &Arc<dyn PipelineLayout> {
        &self.layout
    }

    /// The layout family this asset was built as
    pub fn layout_type(&self) -> PipelineLayoutType {
        self.layout_type
    }

    /// The descriptor the layout was built from (set layouts, push constants)
    pub fn desc(&self) -> &PipelineLayoutDesc {
        &self.desc
    }

    /// Shared identity/lifecycle info
    pub fn info(&self) -> &AssetInfo {
        &self.info
    }
}

/// Runs the layout builder/director script for the requested family
pub struct PipelineLayoutManager {
    device: Arc<dyn GraphicsDevice>,
    log: Log,
}

impl PipelineLayoutManager {
    pub fn new(device: Arc<dyn GraphicsDevice>, log: Log) -> Self {
        Self { device, log }
    }
}

impl AssetManager for PipelineLayoutManager {
    fn kind(&self) -> AssetKind {
        AssetKind::PipelineLayout
    }

    fn create(&mut self, setting: &AssetSetting, _ctx: &ManagerContext<'_>) -> Result<Asset> {
        let AssetSetting::PipelineLayout(setting) = setting else {
            return Err(Error::InvalidResource(
                "PipelineLayoutManager received a non-layout setting".to_string(),
            ));
        };
        if setting.name.is_empty() {
            return Err(Error::InvalidResource(
                "Pipeline layout setting has an empty name".to_string(),
            ));
        }

        let mut builder: Box<dyn PipelineLayoutBuilder> = match setting.layout_type {
            PipelineLayoutType::Pbr => Box::new(PbrPipelineLayoutBuilder::new()),
            PipelineLayoutType::GBuffer => Box::new(GBufferPipelineLayoutBuilder::new()),
            PipelineLayoutType::Sky => Box::new(SkyPipelineLayoutBuilder::new()),
        };
        let asset =
            PipelineLayoutDirector::construct(builder.as_mut(), &self.device, &self.log, &setting.name)?;
        Ok(Asset::PipelineLayout(asset))
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Creation descriptor for a pipeline asset
#[derive(Debug, Clone)]
pub struct PipelineSetting {
    /// Asset name
    pub name: String,
    /// Vertex stage SPIR-V
    pub vertex_shader: ShaderSource,
    /// Fragment stage SPIR-V, if any
    pub fragment_shader: Option<ShaderSource>,
    /// Shader entry point (used by the custom-shader family)
    pub entry_point: String,
    /// Render-pass kind the pipeline targets
    pub render_pass_kind: RenderPassKind,
    /// Subpass index within that pass
    pub subpass: u32,
    /// Layout family the shaders were written against
    pub layout_type: PipelineLayoutType,
    /// Builder family that assembles the pipeline
    pub family: PipelineFamily,
    /// Vertex input layout
    pub vertex_layout: VertexLayout,
    /// Primitive topology
    pub topology: PrimitiveTopology,
    /// Fixed-function state
    pub rasterization: RasterizationState,
    pub multisample: MultisampleState,
    pub depth_stencil: DepthStencilState,
    /// Blend state for one color attachment; the builder replicates or
    /// replaces it to match the target pass
    pub blend: BlendAttachmentState,
}

impl Default for PipelineSetting {
    fn default() -> Self {
        Self {
            name: String::new(),
            vertex_shader: ShaderSource::SpirvBytes(Vec::new()),
            fragment_shader: None,
            entry_point: "main".to_string(),
            render_pass_kind: RenderPassKind::ForwardComposite,
            subpass: 0,
            layout_type: PipelineLayoutType::Pbr,
            family: PipelineFamily::Forward,
            vertex_layout: VertexLayout::default(),
            topology: PrimitiveTopology::TriangleList,
            rasterization: RasterizationState::default(),
            multisample: MultisampleState::default(),
            depth_stencil: DepthStencilState::default(),
            blend: BlendAttachmentState::default(),
        }
    }
}

/// Pipeline asset: the device pipeline plus what it was built against.
/// Immutable after construction; rebuilding means creating a new asset.
pub struct PipelineAsset {
    pub(crate) info: AssetInfo,
    pub(crate) pipeline: Arc<dyn Pipeline>,
    pub(crate) layout_type: PipelineLayoutType,
    pub(crate) render_pass_kind: RenderPassKind,
    pub(crate) subpass: u32,
}

impl PipelineAsset {
    /// The device pipeline handle
    pub fn pipeline(&self) -> &Arc<dyn Pipeline> {
        &self.pipeline
    }

    /// The layout family the pipeline was built against
    pub fn layout_type(&self) -> PipelineLayoutType {
        self.layout_type
    }

    /// The render-pass kind the pipeline targets
    pub fn render_pass_kind(&self) -> RenderPassKind {
        self.render_pass_kind
    }

    /// The subpass index the pipeline targets
    pub fn subpass(&self) -> u32 {
        self.subpass
    }

    /// Shared identity/lifecycle info
    pub fn info(&self) -> &AssetInfo {
        &self.info
    }
}

/// Resolves a pipeline setting's dependencies and runs the builder script
pub struct PipelineManager {
    device: Arc<dyn GraphicsDevice>,
    log: Log,
}

impl PipelineManager {
    pub fn new(device: Arc<dyn GraphicsDevice>, log: Log) -> Self {
        Self { device, log }
    }

    fn load_shader_module(
        &self,
        name: &str,
        stage: ShaderStage,
        source: &ShaderSource,
    ) -> Result<Arc<dyn ShaderModule>> {
        let code = source.load()?;
        if code.is_empty() {
            return Err(Error::InvalidResource(format!(
                "No shader code supplied for pipeline '{}' ({:?} stage)",
                name, stage
            )));
        }
        self.device.create_shader_module(ShaderModuleDesc {
            name: name.to_string(),
            stage,
            code,
        })
    }
}

impl AssetManager for PipelineManager {
    fn kind(&self) -> AssetKind {
        AssetKind::Pipeline
    }

    fn create(&mut self, setting: &AssetSetting, ctx: &ManagerContext<'_>) -> Result<Asset> {
        let AssetSetting::Pipeline(setting) = setting else {
            return Err(Error::InvalidResource(
                "PipelineManager received a non-pipeline setting".to_string(),
            ));
        };
        // ========== VALIDATION ==========
        if setting.name.is_empty() {
            return Err(Error::InvalidResource(
                "Pipeline setting has an empty name".to_string(),
            ));
        }

        // ========== DEPENDENCY RESOLUTION ==========
        let layout = ctx.pipeline_layout_by_type(setting.layout_type).ok_or_else(|| {
            Error::MissingDependency(format!(
                "pipeline layout type {:?} required by pipeline '{}'",
                setting.layout_type, setting.name
            ))
        })?;

        let render_pass = ctx
            .render_passes
            .render_pass(setting.render_pass_kind)
            .ok_or_else(|| {
                Error::MissingDependency(format!(
                    "render pass kind {:?} required by pipeline '{}'",
                    setting.render_pass_kind, setting.name
                ))
            })?;
        let color_attachment_count = ctx
            .render_passes
            .color_attachment_count(setting.render_pass_kind)
            .unwrap_or(0);

        let vertex_shader =
            self.load_shader_module(&setting.name, ShaderStage::Vertex, &setting.vertex_shader)?;
        let fragment_shader = match &setting.fragment_shader {
            Some(source) => {
                Some(self.load_shader_module(&setting.name, ShaderStage::Fragment, source)?)
            }
            None => None,
        };

        // ========== BUILD ==========
        let input = PipelineBuildInput {
            setting: setting.clone(),
            vertex_shader,
            fragment_shader,
            layout: Arc::clone(layout.layout()),
            render_pass: Arc::clone(render_pass),
            color_attachment_count,
        };

        let mut builder: Box<dyn PipelineBuilder> = match setting.family {
            PipelineFamily::Forward => Box::new(ForwardPipelineBuilder::new()),
            PipelineFamily::GBuffer => Box::new(GBufferPipelineBuilder::new()),
            PipelineFamily::CustomShader => Box::new(CustomShaderPipelineBuilder::new()),
        };
        let asset = PipelineDirector::construct(builder.as_mut(), &self.device, &self.log, input)?;
        Ok(Asset::Pipeline(asset))
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
