/*!
# Swapframe Engine - Vulkan Backend

Vulkan implementation of the swapframe_engine device traits.

This crate provides a Vulkan 1.3 backend using the Ash library for Vulkan
bindings: a `GraphicsDevice` owning one queue and the window surface, a
`Swapchain` over that surface and synchronization2 command scopes.

# Example

```no_run
use swapframe_engine::swapframe::{FrameLoop, render::{Config, SwapchainDesc}};
use swapframe_engine_renderer_vulkan::VulkanGraphicsDevice;
# fn run(window: &winit::window::Window) -> swapframe_engine::swapframe::Result<()> {
let config = Config::default();
let device = VulkanGraphicsDevice::new(window, &config)?;
let mut frame_loop = FrameLoop::new(device, &SwapchainDesc::new(1280, 720), &config)?;
frame_loop.draw_frame()?;
frame_loop.shutdown()?;
# Ok(())
# }
```
*/

// Vulkan implementation modules
mod vulkan;
mod vulkan_context;
mod vulkan_convert;
mod vulkan_command_scope;
mod vulkan_swapchain;
mod debug;

pub use vulkan::VulkanGraphicsDevice;
pub use vulkan_swapchain::Swapchain as VulkanSwapchain;
pub use vulkan_command_scope::VulkanCommandScope;

/// Backend types under the engine's namespace
pub mod swapframe {
    pub use crate::vulkan::VulkanGraphicsDevice;
    pub use crate::vulkan_swapchain::Swapchain as VulkanSwapchain;
    pub use crate::vulkan_command_scope::VulkanCommandScope;
}
