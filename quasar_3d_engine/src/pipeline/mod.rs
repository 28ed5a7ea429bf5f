//! Builder/director construction of immutable pipeline and
//! pipeline-layout objects.

pub mod layout_builder;
pub mod pipeline_builder;

pub use layout_builder::{
    GBufferPipelineLayoutBuilder, LayoutStep, PbrPipelineLayoutBuilder,
    PipelineLayoutBuilder, PipelineLayoutDirector, PipelineLayoutType,
    SkyPipelineLayoutBuilder,
};
pub use pipeline_builder::{
    CustomShaderPipelineBuilder, ForwardPipelineBuilder, GBufferPipelineBuilder,
    PipelineBuildInput, PipelineBuilder, PipelineDirector, PipelineFamily,
    PipelineStep,
};
