/// Swapchain - Vulkan implementation of the Swapchain trait
///
/// Owns the swapchain object, its images (owned by the driver) and one view per
/// image. Presents on the device's single queue.

use swapframe_engine::swapframe::{Result, Error};
use swapframe_engine::swapframe::render::{
    AcquiredImage, Extent2D, Image, PresentStatus, Semaphore, Swapchain as RendererSwapchain,
    SwapchainDesc, SwapchainStatus, TextureFormat,
};
use swapframe_engine::{engine_error, engine_warn, engine_debug, engine_info};
use ash::vk::{self, Handle};
use std::sync::Arc;
use std::time::Duration;

use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{format_to_vk, present_mode_to_vk, timeout_ns};

/// Vulkan swapchain implementation
pub struct Swapchain {
    context: Arc<VulkanContext>,

    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,

    format: TextureFormat,
    extent: Extent2D,
    status: SwapchainStatus,
}

/// Pick the swapchain extent
///
/// The surface dictates the extent unless it reports `u32::MAX`, in which case
/// the requested extent is clamped to the surface limits.
pub(crate) fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, requested: Extent2D) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: requested.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: requested.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One image more than the minimum, capped by the maximum (0 means no limit)
pub(crate) fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        desired.min(capabilities.max_image_count)
    } else {
        desired
    }
}

/// Find the requested format paired with the sRGB non-linear color space
pub(crate) fn find_surface_format(
    available: &[vk::SurfaceFormatKHR],
    format: vk::Format,
) -> Option<vk::SurfaceFormatKHR> {
    available
        .iter()
        .find(|f| f.format == format && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
        .copied()
}

/// Usage every swapchain image must support (clears go through transfer)
pub(crate) const REQUIRED_IMAGE_USAGE: vk::ImageUsageFlags = vk::ImageUsageFlags::from_raw(
    vk::ImageUsageFlags::COLOR_ATTACHMENT.as_raw() | vk::ImageUsageFlags::TRANSFER_DST.as_raw(),
);

impl Swapchain {
    /// Create a new swapchain for the context's surface
    ///
    /// # Errors
    ///
    /// `SwapchainCreationError` if the surface lacks the requested format,
    /// the required image usage or the requested present mode, or if the
    /// resulting extent is zero (minimized window).
    pub(crate) fn new(context: Arc<VulkanContext>, desc: &SwapchainDesc) -> Result<Self> {
        let creation_error = |message: String| {
            engine_error!("swapframe::vulkan", "{}", message);
            Error::SwapchainCreationError(message)
        };

        unsafe {
            let loader = &context.surface_loader;

            let capabilities = loader
                .get_physical_device_surface_capabilities(context.physical_device, context.surface)
                .map_err(|e| creation_error(format!("Failed to get surface capabilities: {:?}", e)))?;

            let formats = loader
                .get_physical_device_surface_formats(context.physical_device, context.surface)
                .map_err(|e| creation_error(format!("Failed to get surface formats: {:?}", e)))?;

            let present_modes = loader
                .get_physical_device_surface_present_modes(context.physical_device, context.surface)
                .map_err(|e| creation_error(format!("Failed to get surface present modes: {:?}", e)))?;

            let vk_format = format_to_vk(desc.format);
            let surface_format = find_surface_format(&formats, vk_format).ok_or_else(|| {
                creation_error(format!(
                    "Surface does not support {:?} with SRGB_NONLINEAR color space", desc.format
                ))
            })?;

            if !capabilities.supported_usage_flags.contains(REQUIRED_IMAGE_USAGE) {
                return Err(creation_error(format!(
                    "Surface images do not support {:?} (supported: {:?})",
                    REQUIRED_IMAGE_USAGE, capabilities.supported_usage_flags
                )));
            }

            let vk_present_mode = present_mode_to_vk(desc.present_mode);
            if !present_modes.contains(&vk_present_mode) {
                return Err(creation_error(format!(
                    "Surface does not support present mode {:?}", desc.present_mode
                )));
            }

            let extent = choose_extent(&capabilities, desc.extent);
            if extent.width == 0 || extent.height == 0 {
                return Err(creation_error(format!(
                    "Surface extent is {}x{}", extent.width, extent.height
                )));
            }

            let min_image_count = choose_image_count(&capabilities);

            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(context.surface)
                .min_image_count(min_image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(REQUIRED_IMAGE_USAGE)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk_present_mode)
                .clipped(true);

            let swapchain = context.swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| creation_error(format!("Failed to create swapchain: {:?}", e)))?;

            let images = match context.swapchain_loader.get_swapchain_images(swapchain) {
                Ok(images) => images,
                Err(e) => {
                    context.swapchain_loader.destroy_swapchain(swapchain, None);
                    return Err(creation_error(format!("Failed to get swapchain images: {:?}", e)));
                }
            };

            let mut image_views = Vec::with_capacity(images.len());
            for &image in &images {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(surface_format.format)
                    .components(vk::ComponentMapping {
                        r: vk::ComponentSwizzle::IDENTITY,
                        g: vk::ComponentSwizzle::IDENTITY,
                        b: vk::ComponentSwizzle::IDENTITY,
                        a: vk::ComponentSwizzle::IDENTITY,
                    })
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });

                match context.device.create_image_view(&view_info, None) {
                    Ok(view) => image_views.push(view),
                    Err(e) => {
                        for view in image_views.drain(..) {
                            context.device.destroy_image_view(view, None);
                        }
                        context.swapchain_loader.destroy_swapchain(swapchain, None);
                        return Err(creation_error(format!(
                            "Failed to create swapchain image view: {:?}", e
                        )));
                    }
                }
            }

            engine_info!("swapframe::vulkan",
                "Swapchain created: {}x{}, {} images, {:?}, {:?}",
                extent.width, extent.height, images.len(), desc.format, desc.present_mode);

            Ok(Self {
                context,
                swapchain,
                images,
                image_views,
                format: desc.format,
                extent: Extent2D::new(extent.width, extent.height),
                status: SwapchainStatus::Live,
            })
        }
    }

    /// Get the Vulkan swapchain handle
    pub fn swapchain(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Get the image view for a swapchain image
    pub fn image_view(&self, index: u32) -> Option<vk::ImageView> {
        self.image_views.get(index as usize).copied()
    }

    fn mark_stale(&mut self, operation: &str) -> Error {
        self.status = SwapchainStatus::Stale;
        engine_warn!("swapframe::vulkan", "Swapchain out of date during {}", operation);
        Error::SwapchainOutOfDate(format!("surface changed during {}", operation))
    }
}

impl RendererSwapchain for Swapchain {
    fn acquire_next_image(&mut self, signal: Semaphore, timeout: Duration) -> Result<AcquiredImage> {
        if self.status == SwapchainStatus::Destroyed {
            return Err(Error::InvalidState("acquire on a destroyed swapchain".to_string()));
        }

        let result = unsafe {
            self.context.swapchain_loader.acquire_next_image(
                self.swapchain,
                timeout_ns(timeout),
                vk::Semaphore::from_raw(signal.as_raw()),
                vk::Fence::null(),
            )
        };

        match result {
            Ok((index, suboptimal)) => {
                if suboptimal {
                    engine_debug!("swapframe::vulkan", "Acquired image {} is suboptimal", index);
                }
                Ok(AcquiredImage { index, suboptimal })
            }
            Err(vk::Result::TIMEOUT) | Err(vk::Result::NOT_READY) => {
                engine_warn!("swapframe::vulkan", "No swapchain image available within {:?}", timeout);
                Err(Error::AcquireTimeout(format!("no image available within {:?}", timeout)))
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(self.mark_stale("acquire")),
            Err(vk::Result::ERROR_OUT_OF_HOST_MEMORY) | Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY) => {
                engine_error!("swapframe::vulkan", "Out of memory during swapchain acquire");
                Err(Error::OutOfMemory)
            }
            Err(e) => {
                engine_error!("swapframe::vulkan", "Failed to acquire next swapchain image: {:?}", e);
                Err(Error::BackendError(format!("Failed to acquire next image: {:?}", e)))
            }
        }
    }

    fn present(&mut self, image_index: u32, wait: Semaphore) -> Result<PresentStatus> {
        if self.status == SwapchainStatus::Destroyed {
            return Err(Error::InvalidState("present on a destroyed swapchain".to_string()));
        }
        if image_index as usize >= self.images.len() {
            return Err(Error::InvalidState(format!(
                "present: image index {} out of range (count: {})", image_index, self.images.len()
            )));
        }

        let wait_semaphores = [vk::Semaphore::from_raw(wait.as_raw())];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe {
            self.context.swapchain_loader.queue_present(self.context.queue, &present_info)
        };

        match result {
            Ok(false) => Ok(PresentStatus::Optimal),
            Ok(true) => Ok(PresentStatus::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(self.mark_stale("present")),
            Err(e) => {
                engine_error!("swapframe::vulkan", "Failed to present swapchain image {}: {:?}", image_index, e);
                Err(Error::PresentError(format!("{:?}", e)))
            }
        }
    }

    fn destroy(&mut self) {
        if self.status == SwapchainStatus::Destroyed {
            return;
        }
        unsafe {
            for view in self.image_views.drain(..) {
                self.context.device.destroy_image_view(view, None);
            }
            self.context.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
        self.swapchain = vk::SwapchainKHR::null();
        self.images.clear();
        self.status = SwapchainStatus::Destroyed;
        engine_debug!("swapframe::vulkan", "Swapchain destroyed");
    }

    fn image(&self, index: u32) -> Result<Image> {
        self.images
            .get(index as usize)
            .map(|image| Image::from_raw(image.as_raw()))
            .ok_or_else(|| Error::InvalidState(format!(
                "swapchain image index {} out of range (count: {})", index, self.images.len()
            )))
    }

    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn status(&self) -> SwapchainStatus {
        self.status
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        if self.status != SwapchainStatus::Destroyed {
            unsafe {
                self.context.device.device_wait_idle().ok();
            }
            self.destroy();
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
