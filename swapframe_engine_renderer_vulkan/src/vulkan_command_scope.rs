/// VulkanCommandScope - CommandScope implementation for Vulkan
///
/// One command pool (RESET_COMMAND_BUFFER) and one primary command buffer.
/// Barriers are recorded through synchronization2.

use swapframe_engine::swapframe::{self, render::{CommandScope, Image, ImageBarrier, ImageLayout}};
use swapframe_engine::{engine_bail, engine_err};
use ash::vk::{self, Handle};
use std::sync::Arc;

use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{access_to_vk, layout_to_vk, range_to_vk, stages_to_vk};

pub struct VulkanCommandScope {
    context: Arc<VulkanContext>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    is_recording: bool,
}

impl VulkanCommandScope {
    /// Create the pool on the device's queue family and allocate its buffer
    pub(crate) fn new(context: Arc<VulkanContext>) -> swapframe::Result<Self> {
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(context.queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = context.device
                .create_command_pool(&pool_info, None)
                .map_err(|e| engine_err!("swapframe::vulkan", "Failed to create command pool: {:?}", e))?;

            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = match context.device.allocate_command_buffers(&alloc_info) {
                Ok(buffers) => buffers[0],
                Err(e) => {
                    context.device.destroy_command_pool(command_pool, None);
                    return Err(engine_err!("swapframe::vulkan",
                        "Failed to allocate command buffer: {:?}", e));
                }
            };

            Ok(Self {
                context,
                command_pool,
                command_buffer,
                is_recording: false,
            })
        }
    }

    /// Get the Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }
}

impl CommandScope for VulkanCommandScope {
    fn reset(&mut self) -> swapframe::Result<()> {
        if self.is_recording {
            engine_bail!("swapframe::vulkan", "Cannot reset a command buffer while recording");
        }
        unsafe {
            self.context.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!("swapframe::vulkan", "Failed to reset command buffer: {:?}", e))?;
        }
        Ok(())
    }

    fn begin(&mut self) -> swapframe::Result<()> {
        if self.is_recording {
            engine_bail!("swapframe::vulkan", "Command buffer is already recording");
        }
        unsafe {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.context.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| engine_err!("swapframe::vulkan", "Failed to begin command buffer: {:?}", e))?;
        }
        self.is_recording = true;
        Ok(())
    }

    fn end(&mut self) -> swapframe::Result<()> {
        if !self.is_recording {
            engine_bail!("swapframe::vulkan", "Command buffer is not recording");
        }
        unsafe {
            self.context.device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| engine_err!("swapframe::vulkan", "Failed to end command buffer: {:?}", e))?;
        }
        self.is_recording = false;
        Ok(())
    }

    fn pipeline_barrier(&mut self, barrier: &ImageBarrier) -> swapframe::Result<()> {
        if !self.is_recording {
            engine_bail!("swapframe::vulkan", "Barrier recorded outside begin/end");
        }

        let image_barrier = vk::ImageMemoryBarrier2::default()
            .src_stage_mask(stages_to_vk(barrier.src_stages))
            .src_access_mask(access_to_vk(barrier.src_access))
            .dst_stage_mask(stages_to_vk(barrier.dst_stages))
            .dst_access_mask(access_to_vk(barrier.dst_access))
            .old_layout(layout_to_vk(barrier.old_layout))
            .new_layout(layout_to_vk(barrier.new_layout))
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(vk::Image::from_raw(barrier.image.as_raw()))
            .subresource_range(range_to_vk(barrier.range));

        let dependency_info = vk::DependencyInfo::default()
            .image_memory_barriers(std::slice::from_ref(&image_barrier));

        unsafe {
            self.context.device.cmd_pipeline_barrier2(self.command_buffer, &dependency_info);
        }
        Ok(())
    }

    fn clear_color_image(&mut self, image: Image, layout: ImageLayout, color: [f32; 4]) -> swapframe::Result<()> {
        if !self.is_recording {
            engine_bail!("swapframe::vulkan", "Clear recorded outside begin/end");
        }

        let clear_value = vk::ClearColorValue { float32: color };
        let range = range_to_vk(swapframe::render::SubresourceRange::full());

        unsafe {
            self.context.device.cmd_clear_color_image(
                self.command_buffer,
                vk::Image::from_raw(image.as_raw()),
                layout_to_vk(layout),
                &clear_value,
                std::slice::from_ref(&range),
            );
        }
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.is_recording
    }

    fn raw_handle(&self) -> u64 {
        self.command_buffer.as_raw()
    }
}

impl Drop for VulkanCommandScope {
    fn drop(&mut self) {
        unsafe {
            // Freeing the pool frees its command buffer
            self.context.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
