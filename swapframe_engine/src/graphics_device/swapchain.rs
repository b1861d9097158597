/// Swapchain trait - for window presentation

use std::time::Duration;
use crate::error::Result;
use crate::graphics_device::{Image, Semaphore};

/// Pixel format of presentable images
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
}

/// Presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    /// Vertical-sync locked queue (always supported)
    Fifo,
    /// Tear-free, replaces the queued image
    Mailbox,
    /// No vsync
    Immediate,
}

/// Two-dimensional extent in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Swapchain creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDesc {
    /// Requested extent (the driver may clamp it)
    pub extent: Extent2D,
    /// Required pixel format
    pub format: TextureFormat,
    /// Required present mode
    pub present_mode: PresentMode,
}

impl SwapchainDesc {
    /// Fixed format (`B8G8R8A8_UNORM`) and vsync-locked present mode
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extent: Extent2D::new(width, height),
            format: TextureFormat::B8G8R8A8_UNORM,
            present_mode: PresentMode::Fifo,
        }
    }
}

/// Whether the swapchain still matches its surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainStatus {
    /// Usable for acquire/present
    Live,
    /// The presentation engine reported the surface out of date
    Stale,
    /// Views and swapchain object released
    Destroyed,
}

/// Image handed out by the presentation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquiredImage {
    /// Index into the swapchain's image list (independent of the frame slot)
    pub index: u32,
    /// The swapchain no longer matches the surface exactly but is still usable
    pub suboptimal: bool,
}

/// Outcome of a successful present request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    Optimal,
    Suboptimal,
}

/// Swapchain for presenting rendered images to a window
///
/// Owns the ordered presentable images and their views. Images are borrowed by
/// a frame between `acquire_next_image` and `present` and must not be retained
/// past present.
pub trait Swapchain: Send {
    /// Acquire the next presentable image index
    ///
    /// `signal` becomes signaled once the image is actually safe to write.
    ///
    /// # Errors
    ///
    /// - `AcquireTimeout` if no image becomes available within `timeout`
    /// - `SwapchainOutOfDate` if the surface changed incompatibly (status becomes `Stale`)
    fn acquire_next_image(&mut self, signal: Semaphore, timeout: Duration) -> Result<AcquiredImage>;

    /// Present an image on the device queue, gated on `wait`
    ///
    /// # Errors
    ///
    /// - `SwapchainOutOfDate` (status becomes `Stale`)
    /// - `PresentError` on any other driver rejection
    fn present(&mut self, image_index: u32, wait: Semaphore) -> Result<PresentStatus>;

    /// Release all views, then the swapchain object
    ///
    /// Must only be called once the device is idle. Calling it again is a no-op.
    fn destroy(&mut self);

    /// Get the image at `index`
    fn image(&self, index: u32) -> Result<Image>;

    /// Get the number of images in the swapchain
    fn image_count(&self) -> usize;

    /// Get the extent chosen at creation
    fn extent(&self) -> Extent2D;

    /// Get the pixel format of the swapchain images
    fn format(&self) -> TextureFormat;

    /// Get the live/stale status
    fn status(&self) -> SwapchainStatus;
}
