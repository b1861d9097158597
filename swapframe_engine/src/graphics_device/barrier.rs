/// Image barrier protocol - layout transitions bracketing a frame's drawing work
///
/// Stateless: every call encodes exactly one full-image barrier into the given
/// command scope. Ordering against the presentation engine comes from the
/// frame's acquire/complete semaphores, never from the barrier itself.

use crate::error::{Error, Result};
use crate::graphics_device::{
    AccessFlags, CommandScope, Image, ImageLayout, PipelineStages,
};

/// Subresource range covered by a barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubresourceRange {
    pub base_mip_level: u32,
    /// `None` means all remaining mip levels
    pub level_count: Option<u32>,
    pub base_array_layer: u32,
    /// `None` means all remaining array layers
    pub layer_count: Option<u32>,
}

impl SubresourceRange {
    /// Every mip level and every array layer of the color aspect
    pub const fn full() -> Self {
        Self {
            base_mip_level: 0,
            level_count: None,
            base_array_layer: 0,
            layer_count: None,
        }
    }
}

/// One image memory barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBarrier {
    pub image: Image,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub src_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_stages: PipelineStages,
    pub dst_access: AccessFlags,
    pub range: SubresourceRange,
}

/// Layout an acquired image is moved to before drawing
pub const FRAME_WRITABLE_LAYOUT: ImageLayout = ImageLayout::General;

/// Stages/accesses that must complete before leaving `layout`
pub fn source_scope(layout: ImageLayout) -> (PipelineStages, AccessFlags) {
    match layout {
        // Chains with the acquire semaphore wait stage; nothing to flush
        ImageLayout::Undefined | ImageLayout::PresentSrc => {
            (PipelineStages::COLOR_ATTACHMENT_OUTPUT, AccessFlags::empty())
        }
        ImageLayout::General | ImageLayout::TransferDst => {
            (PipelineStages::TRANSFER, AccessFlags::TRANSFER_WRITE)
        }
        ImageLayout::ColorAttachment => {
            (PipelineStages::COLOR_ATTACHMENT_OUTPUT, AccessFlags::COLOR_ATTACHMENT_WRITE)
        }
    }
}

/// Stages/accesses that wait for the transition into `layout`
///
/// Returns `None` for `Undefined`, which is never a valid target.
pub fn destination_scope(layout: ImageLayout) -> Option<(PipelineStages, AccessFlags)> {
    match layout {
        ImageLayout::Undefined => None,
        ImageLayout::General | ImageLayout::TransferDst => Some((
            PipelineStages::TRANSFER,
            AccessFlags::TRANSFER_READ | AccessFlags::TRANSFER_WRITE,
        )),
        ImageLayout::ColorAttachment => Some((
            PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            AccessFlags::COLOR_ATTACHMENT_READ | AccessFlags::COLOR_ATTACHMENT_WRITE,
        )),
        // Visibility to the presentation engine comes from the semaphore signal
        ImageLayout::PresentSrc => Some((PipelineStages::empty(), AccessFlags::empty())),
    }
}

/// Build the barrier for a full-image transition
pub fn image_barrier(image: Image, from: ImageLayout, to: ImageLayout) -> Result<ImageBarrier> {
    let (dst_stages, dst_access) = destination_scope(to).ok_or_else(|| {
        Error::InvalidState(format!(
            "cannot transition image {:?} to {:?}", image, to
        ))
    })?;
    let (src_stages, src_access) = source_scope(from);

    Ok(ImageBarrier {
        image,
        old_layout: from,
        new_layout: to,
        src_stages,
        src_access,
        dst_stages,
        dst_access,
        range: SubresourceRange::full(),
    })
}

/// Record a full-image layout transition into `scope`
///
/// # Arguments
///
/// * `scope` - Command scope in the recording state
/// * `image` - Image to transition
/// * `from` - Current layout (`Undefined` discards contents)
/// * `to` - Target layout
pub fn transition(
    scope: &mut dyn CommandScope,
    image: Image,
    from: ImageLayout,
    to: ImageLayout,
) -> Result<()> {
    if !scope.is_recording() {
        return Err(Error::InvalidState(
            "image transition recorded outside begin/end".to_string(),
        ));
    }
    let barrier = image_barrier(image, from, to)?;
    scope.pipeline_barrier(&barrier)
}

#[cfg(test)]
#[path = "barrier_tests.rs"]
mod tests;
