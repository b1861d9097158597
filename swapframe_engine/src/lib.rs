/*!
# Swapframe Engine

Core traits and types for the Swapframe frame pacing engine.

This crate provides the platform-agnostic half of a presentation loop: a fixed
ring of per-frame resources, the acquire/submit/present protocol and the image
layout transitions that keep CPU recording, GPU execution and the presentation
engine from stepping on each other. Backend implementations (Vulkan) provide
concrete types for the device traits.

## Architecture

- **GraphicsDevice**: Device handle trait (sync objects, command scopes, submission)
- **Swapchain**: Presentable image set (acquire, present, destroy)
- **CommandScope**: One recording context (pool + primary buffer)
- **FrameRing**: Fixed array of frame slots cycled by the frame counter
- **FrameLoop**: Per-frame driver (wait, acquire, record, submit, present)

No global engine object exists: the device is passed explicitly to every
component that needs it.
*/

// Internal modules
mod error;
pub mod log;
pub mod graphics_device;
pub mod frame;

// Main swapframe namespace module
pub mod swapframe {
    // Error types
    pub use crate::error::{Error, ErrorKind, Result};

    // Device traits
    pub use crate::graphics_device::{GraphicsDevice, Swapchain, CommandScope};

    // Frame loop driver
    pub use crate::frame::{FrameLoop, FrameRing, FrameCounter, FRAME_OVERLAP};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        pub use crate::log::{set_logger, reset_logger, set_min_severity, min_severity};
    }

    // Device sub-module with all device-level types
    pub mod render {
        pub use crate::graphics_device::*;
    }

    // Frame sub-module
    pub mod frame {
        pub use crate::frame::*;
    }
}
