/// Tests for engine-to-Vulkan conversions
///
/// These run without a GPU: they only exercise the mapping tables.

use super::*;

// ============================================================================
// Tests: Formats
// ============================================================================

#[test]
fn test_color_format_mapping() {
    assert_eq!(format_to_vk(TextureFormat::R8G8B8A8_UNORM), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(format_to_vk(TextureFormat::R8G8B8A8_SRGB), vk::Format::R8G8B8A8_SRGB);
    assert_eq!(format_to_vk(TextureFormat::B8G8R8A8_UNORM), vk::Format::B8G8R8A8_UNORM);
    assert_eq!(
        format_to_vk(TextureFormat::R16G16B16A16_SFLOAT),
        vk::Format::R16G16B16A16_SFLOAT
    );
}

#[test]
fn test_depth_format_mapping() {
    assert_eq!(format_to_vk(TextureFormat::D16_UNORM), vk::Format::D16_UNORM);
    assert_eq!(format_to_vk(TextureFormat::D32_FLOAT), vk::Format::D32_SFLOAT);
    assert_eq!(
        format_to_vk(TextureFormat::D24_UNORM_S8_UINT),
        vk::Format::D24_UNORM_S8_UINT
    );
}

#[test]
fn test_buffer_format_mapping() {
    assert_eq!(buffer_format_to_vk(BufferFormat::R32G32B32_SFLOAT), vk::Format::R32G32B32_SFLOAT);
    assert_eq!(buffer_format_to_vk(BufferFormat::R32_UINT), vk::Format::R32_UINT);
}

// ============================================================================
// Tests: Usage flags
// ============================================================================

#[test]
fn test_texture_usage_mapping() {
    let flags = texture_usage_to_vk(TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST);
    assert!(flags.contains(vk::ImageUsageFlags::SAMPLED));
    assert!(flags.contains(vk::ImageUsageFlags::TRANSFER_DST));
    assert!(!flags.contains(vk::ImageUsageFlags::COLOR_ATTACHMENT));
}

#[test]
fn test_depth_usage_mapping() {
    let flags = texture_usage_to_vk(TextureUsage::DEPTH_STENCIL);
    assert!(flags.contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT));
}

#[test]
fn test_buffer_usage_mapping() {
    let flags = buffer_usage_to_vk(BufferUsage::VERTEX | BufferUsage::TRANSFER_DST);
    assert!(flags.contains(vk::BufferUsageFlags::VERTEX_BUFFER));
    assert!(flags.contains(vk::BufferUsageFlags::TRANSFER_DST));
    assert!(!flags.contains(vk::BufferUsageFlags::INDEX_BUFFER));
}

// ============================================================================
// Tests: Layouts and barriers
// ============================================================================

#[test]
fn test_layout_mapping() {
    assert_eq!(layout_to_vk(ImageLayout::Undefined), vk::ImageLayout::UNDEFINED);
    assert_eq!(layout_to_vk(ImageLayout::TransferDst), vk::ImageLayout::TRANSFER_DST_OPTIMAL);
    assert_eq!(
        layout_to_vk(ImageLayout::ShaderReadOnly),
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
    );
}

#[test]
fn test_upload_transition_scopes() {
    // Undefined -> TransferDst -> ShaderReadOnly, the upload protocol
    let (src_stage, src_access) = layout_sync_scope(ImageLayout::Undefined);
    assert_eq!(src_stage, vk::PipelineStageFlags::TOP_OF_PIPE);
    assert_eq!(src_access, vk::AccessFlags::empty());

    let (dst_stage, dst_access) = layout_sync_scope(ImageLayout::TransferDst);
    assert_eq!(dst_stage, vk::PipelineStageFlags::TRANSFER);
    assert_eq!(dst_access, vk::AccessFlags::TRANSFER_WRITE);

    let (read_stage, read_access) = layout_sync_scope(ImageLayout::ShaderReadOnly);
    assert_eq!(read_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
    assert_eq!(read_access, vk::AccessFlags::SHADER_READ);
}

// ============================================================================
// Tests: Misc enums
// ============================================================================

#[test]
fn test_stage_and_access_mask_mapping() {
    let stages = stage_mask_to_vk(StageMask::COLOR_ATTACHMENT_OUTPUT | StageMask::EARLY_FRAGMENT_TESTS);
    assert!(stages.contains(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT));
    assert!(stages.contains(vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS));

    let access = access_mask_to_vk(AccessMask::COLOR_ATTACHMENT_WRITE | AccessMask::DEPTH_STENCIL_WRITE);
    assert!(access.contains(vk::AccessFlags::COLOR_ATTACHMENT_WRITE));
    assert!(access.contains(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE));
}

#[test]
fn test_shader_stage_mapping() {
    assert_eq!(shader_stage_to_vk(ShaderStage::Vertex), vk::ShaderStageFlags::VERTEX);
    let both = shader_stage_flags_to_vk(ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT);
    assert!(both.contains(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT));
}

#[test]
fn test_index_type_mapping() {
    assert_eq!(index_type_to_vk(IndexType::U16), vk::IndexType::UINT16);
    assert_eq!(index_type_to_vk(IndexType::U32), vk::IndexType::UINT32);
}

#[test]
fn test_binding_type_mapping() {
    assert_eq!(
        binding_type_to_vk(BindingType::CombinedImageSampler),
        vk::DescriptorType::COMBINED_IMAGE_SAMPLER
    );
    assert_eq!(binding_type_to_vk(BindingType::UniformBuffer), vk::DescriptorType::UNIFORM_BUFFER);
}

#[test]
fn test_sample_count_mapping() {
    assert_eq!(sample_count_to_vk(SampleCount::X1), vk::SampleCountFlags::TYPE_1);
    assert_eq!(sample_count_to_vk(SampleCount::X4), vk::SampleCountFlags::TYPE_4);
}
