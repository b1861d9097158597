/// Frame content - what gets recorded between the two layout transitions

use crate::error::{Error, Result};
use crate::graphics_device::{CommandScope, Extent2D, Image, ImageLayout};

/// The image a frame is drawing into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTarget {
    /// Acquired swapchain image
    pub image: Image,
    /// Index of `image` in the swapchain
    pub image_index: u32,
    /// Layout the image is in while content is recorded
    pub layout: ImageLayout,
    /// Image extent
    pub extent: Extent2D,
    /// Counter value of the frame being recorded
    pub frame_number: u64,
}

/// Records a frame's drawing work
///
/// Called once per frame with the scope already recording and the target
/// already transitioned to a writable layout. Implementations must leave the
/// image in `target.layout`.
pub trait FrameContent: Send {
    fn record(&mut self, scope: &mut dyn CommandScope, target: &FrameTarget) -> Result<()>;
}

/// Clears the whole image to a blue that pulses with the frame counter
///
/// Blue channel is `|sin(frame / period)|`, the other channels are `(0, 0, _, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashClear {
    /// Frames per radian of the pulse
    pub period: f32,
}

impl Default for FlashClear {
    fn default() -> Self {
        Self { period: 120.0 }
    }
}

impl FlashClear {
    /// Clear color for frame `frame_number`
    pub fn color_for_frame(&self, frame_number: u64) -> [f32; 4] {
        let flash = (frame_number as f32 / self.period).sin().abs();
        [0.0, 0.0, flash, 1.0]
    }
}

impl FrameContent for FlashClear {
    fn record(&mut self, scope: &mut dyn CommandScope, target: &FrameTarget) -> Result<()> {
        if !target.layout.is_writable() {
            return Err(Error::InvalidState(format!(
                "cannot clear image {:?} in layout {:?}",
                target.image, target.layout
            )));
        }
        scope.clear_color_image(
            target.image,
            target.layout,
            self.color_for_frame(target.frame_number),
        )
    }
}

#[cfg(test)]
#[path = "frame_content_tests.rs"]
mod tests;
