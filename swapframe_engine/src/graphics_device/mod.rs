/// Graphics device module - device-level traits and types used by the frame loop

// Module declarations
pub mod handle;
pub mod config;
pub mod sync;
pub mod graphics_device;
pub mod command_scope;
pub mod swapchain;
pub mod barrier;
pub mod image_state;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use handle::*;
pub use config::*;
pub use sync::*;
pub use command_scope::*;
pub use swapchain::*;
pub use barrier::*;
pub use image_state::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
