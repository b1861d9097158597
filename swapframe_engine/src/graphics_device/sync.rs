/// Synchronization types - pipeline stages, access masks, layouts and submission wiring

use bitflags::bitflags;
use crate::graphics_device::{Fence, Semaphore};

bitflags! {
    /// Pipeline stages used by barriers and semaphore waits/signals
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStages: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 1;
        const TRANSFER = 1 << 2;
        const BOTTOM_OF_PIPE = 1 << 3;
        const ALL_GRAPHICS = 1 << 4;
        const ALL_COMMANDS = 1 << 5;
    }
}

bitflags! {
    /// Memory access kinds made available/visible by a barrier
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const TRANSFER_READ = 1 << 0;
        const TRANSFER_WRITE = 1 << 1;
        const COLOR_ATTACHMENT_READ = 1 << 2;
        const COLOR_ATTACHMENT_WRITE = 1 << 3;
        const MEMORY_READ = 1 << 4;
        const MEMORY_WRITE = 1 << 5;
    }
}

/// Image layouts used by the frame protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    /// Contents undefined (freshly acquired image, previous contents discarded)
    Undefined,
    /// Generic layout, writable by clears and copies
    General,
    /// Optimal for transfer writes
    TransferDst,
    /// Optimal for color attachment writes
    ColorAttachment,
    /// Required by the presentation engine
    PresentSrc,
}

impl ImageLayout {
    /// Whether frame commands may write the image in this layout
    pub fn is_writable(self) -> bool {
        matches!(self, ImageLayout::General | ImageLayout::TransferDst | ImageLayout::ColorAttachment)
    }
}

/// Result of a bounded fence wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    /// The fence was signaled before the timeout
    Signaled,
    /// The timeout elapsed first
    TimedOut,
}

/// Semaphore/fence wiring of one queue submission
///
/// The wait semaphore gates execution at `wait_stage`; the signal semaphore
/// (GPU-visible) and the fence (CPU-visible) are both signaled on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitSync {
    pub wait: Semaphore,
    pub wait_stage: PipelineStages,
    pub signal: Semaphore,
    pub signal_stage: PipelineStages,
    pub fence: Fence,
}

impl SubmitSync {
    /// Wiring used by a frame: wait for the acquired image before color output,
    /// signal after all commands
    pub fn frame(wait: Semaphore, signal: Semaphore, fence: Fence) -> Self {
        Self {
            wait,
            wait_stage: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            signal,
            signal_stage: PipelineStages::ALL_COMMANDS,
            fence,
        }
    }
}
