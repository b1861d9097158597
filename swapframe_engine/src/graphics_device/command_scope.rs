/// CommandScope trait - one exclusively owned recording context

use crate::error::Result;
use crate::graphics_device::{Image, ImageLayout, ImageBarrier};

/// A recording context: one command pool plus one primary command buffer
///
/// Each frame slot owns exactly one scope. The scope is reset and re-recorded
/// every time its slot comes around, which is only allowed once the slot's
/// completion fence has been observed signaled.
pub trait CommandScope: Send {
    /// Reset the command buffer for new recording
    ///
    /// The GPU must no longer reference the previous recording.
    fn reset(&mut self) -> Result<()>;

    /// Begin recording (one-time-submit usage)
    fn begin(&mut self) -> Result<()>;

    /// End recording, leaving the buffer executable
    fn end(&mut self) -> Result<()>;

    /// Record an image memory barrier (layout transition)
    fn pipeline_barrier(&mut self, barrier: &ImageBarrier) -> Result<()>;

    /// Record a clear of the whole image to a uniform color
    ///
    /// # Arguments
    ///
    /// * `image` - Target image
    /// * `layout` - Layout the image is in when the clear executes (must be writable)
    /// * `color` - RGBA clear color
    fn clear_color_image(&mut self, image: Image, layout: ImageLayout, color: [f32; 4]) -> Result<()>;

    /// Whether the scope is between `begin` and `end`
    fn is_recording(&self) -> bool;

    /// Raw backend command buffer handle (used by the owning device on submit)
    fn raw_handle(&self) -> u64;
}
