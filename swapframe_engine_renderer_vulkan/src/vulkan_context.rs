/// VulkanContext - Vulkan objects shared by the device, its swapchain and its command scopes
///
/// Held through `Arc` by every object that issues Vulkan calls, so the logical
/// device outlives anything created from it. The last owner destroys, in
/// order: surface, device, validation messenger, instance.

use ash::vk;

use crate::debug::DebugContext;

pub struct VulkanContext {
    /// Vulkan entry (keeps the loader library alive)
    pub(crate) _entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// Single queue used for both submission and presentation
    pub(crate) queue: vk::Queue,
    pub(crate) queue_family: u32,

    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) surface_loader: ash::khr::surface::Instance,
    pub(crate) swapchain_loader: ash::khr::swapchain::Device,

    pub(crate) debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,

    /// Callback context referenced by the messenger's user data pointer.
    /// Dropped after the messenger is destroyed.
    pub(crate) debug_context: Option<Box<DebugContext>>,
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            self.surface_loader.destroy_surface(self.surface, None);
            self.device.destroy_device(None);

            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}
