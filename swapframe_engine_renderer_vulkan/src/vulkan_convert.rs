/// Conversions between engine types and Vulkan types

use ash::vk;
use std::time::Duration;
use swapframe_engine::swapframe::render::{
    AccessFlags, ImageLayout, PipelineStages, PresentMode, SubresourceRange, TextureFormat,
};

/// Convert TextureFormat to Vulkan format
pub(crate) fn format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
    }
}

/// Convert PresentMode to Vulkan present mode
pub(crate) fn present_mode_to_vk(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
    }
}

pub(crate) fn layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::General => vk::ImageLayout::GENERAL,
        ImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

pub(crate) fn stages_to_vk(stages: PipelineStages) -> vk::PipelineStageFlags2 {
    let mut flags = vk::PipelineStageFlags2::NONE;
    if stages.contains(PipelineStages::TOP_OF_PIPE) {
        flags |= vk::PipelineStageFlags2::TOP_OF_PIPE;
    }
    if stages.contains(PipelineStages::COLOR_ATTACHMENT_OUTPUT) {
        flags |= vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT;
    }
    if stages.contains(PipelineStages::TRANSFER) {
        flags |= vk::PipelineStageFlags2::ALL_TRANSFER;
    }
    if stages.contains(PipelineStages::BOTTOM_OF_PIPE) {
        flags |= vk::PipelineStageFlags2::BOTTOM_OF_PIPE;
    }
    if stages.contains(PipelineStages::ALL_GRAPHICS) {
        flags |= vk::PipelineStageFlags2::ALL_GRAPHICS;
    }
    if stages.contains(PipelineStages::ALL_COMMANDS) {
        flags |= vk::PipelineStageFlags2::ALL_COMMANDS;
    }
    flags
}

pub(crate) fn access_to_vk(access: AccessFlags) -> vk::AccessFlags2 {
    let mut flags = vk::AccessFlags2::NONE;
    if access.contains(AccessFlags::TRANSFER_READ) {
        flags |= vk::AccessFlags2::TRANSFER_READ;
    }
    if access.contains(AccessFlags::TRANSFER_WRITE) {
        flags |= vk::AccessFlags2::TRANSFER_WRITE;
    }
    if access.contains(AccessFlags::COLOR_ATTACHMENT_READ) {
        flags |= vk::AccessFlags2::COLOR_ATTACHMENT_READ;
    }
    if access.contains(AccessFlags::COLOR_ATTACHMENT_WRITE) {
        flags |= vk::AccessFlags2::COLOR_ATTACHMENT_WRITE;
    }
    if access.contains(AccessFlags::MEMORY_READ) {
        flags |= vk::AccessFlags2::MEMORY_READ;
    }
    if access.contains(AccessFlags::MEMORY_WRITE) {
        flags |= vk::AccessFlags2::MEMORY_WRITE;
    }
    flags
}

/// Color-aspect subresource range; `None` counts become `REMAINING_*`
pub(crate) fn range_to_vk(range: SubresourceRange) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: range.base_mip_level,
        level_count: range.level_count.unwrap_or(vk::REMAINING_MIP_LEVELS),
        base_array_layer: range.base_array_layer,
        layer_count: range.layer_count.unwrap_or(vk::REMAINING_ARRAY_LAYERS),
    }
}

/// Timeout in nanoseconds, saturating at `u64::MAX` (wait forever)
pub(crate) fn timeout_ns(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "vulkan_convert_tests.rs"]
mod tests;
