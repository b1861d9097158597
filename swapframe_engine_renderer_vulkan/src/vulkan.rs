/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Creates the instance (optionally with validation), the surface, a Vulkan 1.3
/// logical device with synchronization2 and dynamic rendering, and one queue
/// that both submits and presents.

use swapframe_engine::swapframe::{Error, Result};
use swapframe_engine::swapframe::render::{
    CommandScope, Config, Fence, FenceStatus, GraphicsDevice, Semaphore, SubmitSync,
    Swapchain as RendererSwapchain, SwapchainDesc, ValidationStats,
};
use swapframe_engine::{engine_debug, engine_error, engine_info, engine_warn, engine_err, engine_bail};
use ash::vk::{self, Handle};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CStr;
use std::sync::Arc;
use std::time::Duration;

use crate::debug::DebugContext;
use crate::vulkan_command_scope::VulkanCommandScope;
use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{stages_to_vk, timeout_ns};
use crate::vulkan_swapchain::Swapchain;

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Vulkan graphics device
///
/// Cheap handles to the shared `VulkanContext` are given to every swapchain and
/// command scope it creates.
pub struct VulkanGraphicsDevice {
    context: Arc<VulkanContext>,
    device_name: String,
}

/// Map a failed Vulkan call to an engine error
///
/// Out-of-memory results keep their own kind; everything else is a backend error.
pub(crate) fn vk_error(operation: &str, result: vk::Result) -> Error {
    match result {
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            engine_error!("swapframe::vulkan", "Out of memory during {}: {:?}", operation, result);
            Error::OutOfMemory
        }
        _ => engine_err!("swapframe::vulkan", "Failed to {}: {:?}", operation, result),
    }
}

fn init_error(message: String) -> Error {
    engine_error!("swapframe::vulkan", "{}", message);
    Error::DeviceInitError(message)
}

/// Instance-level objects created before the logical device exists
///
/// Destroys whatever it still holds when dropped, so a failed initialization
/// releases everything created so far.
struct InstanceObjects {
    instance: Option<ash::Instance>,
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    debug_context: Option<Box<DebugContext>>,
    surface: Option<(ash::khr::surface::Instance, vk::SurfaceKHR)>,
}

impl Drop for InstanceObjects {
    fn drop(&mut self) {
        unsafe {
            if let Some((loader, surface)) = self.surface.take() {
                loader.destroy_surface(surface, None);
            }
            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            if let Some(instance) = self.instance.take() {
                instance.destroy_instance(None);
            }
        }
    }
}

/// A physical device able to drive the frame loop on the given surface
struct DeviceCandidate {
    physical_device: vk::PhysicalDevice,
    queue_family: u32,
    name: String,
    discrete: bool,
}

impl VulkanGraphicsDevice {
    /// Create a new Vulkan device for a window
    ///
    /// # Arguments
    ///
    /// * `window` - Window providing display and window handles for the surface
    /// * `config` - Engine configuration (validation settings)
    ///
    /// # Errors
    ///
    /// `DeviceInitError` if the loader, instance, surface or a suitable GPU
    /// (Vulkan 1.3, synchronization2, dynamic rendering, one queue family with
    /// graphics and present support) is unavailable.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| init_error(format!("Failed to load Vulkan library: {:?}", e)))?;

            let enable_validation = Self::validation_available(&entry, config);

            let display_handle = window.display_handle()
                .map_err(|e| init_error(format!("Failed to get display handle: {}", e)))?;
            let window_handle = window.window_handle()
                .map_err(|e| init_error(format!("Failed to get window handle: {}", e)))?;

            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_error(format!("Failed to get required extensions: {:?}", e)))?
                .to_vec();
            if enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if enable_validation {
                vec![VALIDATION_LAYER.as_ptr()]
            } else {
                vec![]
            };

            let app_name = std::ffi::CString::new(config.app_name.as_str())
                .unwrap_or_else(|_| c"Swapframe Application".to_owned());

            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Swapframe")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| init_error(format!("Failed to create Vulkan instance: {:?}", e)))?;

            let mut objects = InstanceObjects {
                instance: Some(instance.clone()),
                debug_messenger: None,
                debug_context: None,
                surface: None,
            };

            if enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                let debug_context = Box::new(DebugContext::new(config));

                let mut debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(debug_context.severity_flags())
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));
                // The box keeps the context at a stable address for the messenger's lifetime
                debug_info.p_user_data = debug_context.as_ref() as *const DebugContext as *mut std::ffi::c_void;

                let messenger = debug_utils
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| init_error(format!("Failed to create debug messenger: {:?}", e)))?;

                objects.debug_messenger = Some((debug_utils, messenger));
                objects.debug_context = Some(debug_context);
                engine_debug!("swapframe::vulkan", "Validation layer enabled ({:?})", config.debug_severity);
            }

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| init_error(format!("Failed to create surface: {:?}", e)))?;
            objects.surface = Some((surface_loader.clone(), surface));

            let candidate = Self::select_physical_device(&instance, &surface_loader, surface)?;

            let queue_priorities = [1.0];
            let queue_info = vk::DeviceQueueCreateInfo::default()
                .queue_family_index(candidate.queue_family)
                .queue_priorities(&queue_priorities);

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];

            let mut features13 = vk::PhysicalDeviceVulkan13Features::default()
                .synchronization2(true)
                .dynamic_rendering(true);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(std::slice::from_ref(&queue_info))
                .enabled_extension_names(&device_extension_names)
                .push_next(&mut features13);

            let device = instance
                .create_device(candidate.physical_device, &device_create_info, None)
                .map_err(|e| init_error(format!("Failed to create logical device: {:?}", e)))?;

            let queue = device.get_device_queue(candidate.queue_family, 0);
            let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);

            engine_info!("swapframe::vulkan",
                "Vulkan device created: {} (queue family {})", candidate.name, candidate.queue_family);

            // Ownership moves to the context, which destroys everything from here on
            let debug_messenger = objects.debug_messenger.take();
            let debug_context = objects.debug_context.take();
            objects.surface = None;
            objects.instance = None;

            let context = Arc::new(VulkanContext {
                _entry: entry,
                instance,
                physical_device: candidate.physical_device,
                device,
                queue,
                queue_family: candidate.queue_family,
                surface,
                surface_loader,
                swapchain_loader,
                debug_messenger,
                debug_context,
            });

            Ok(Self {
                context,
                device_name: candidate.name,
            })
        }
    }

    /// Whether validation should be enabled for this instance
    fn validation_available(entry: &ash::Entry, config: &Config) -> bool {
        if !config.enable_validation {
            return false;
        }
        if !cfg!(feature = "vulkan-validation") {
            engine_warn!("swapframe::vulkan",
                "Validation requested but the 'vulkan-validation' feature is not enabled");
            return false;
        }

        let layers = unsafe { entry.enumerate_instance_layer_properties() }.unwrap_or_default();
        let found = layers
            .iter()
            .any(|layer| layer.layer_name_as_c_str().is_ok_and(|name| name == VALIDATION_LAYER));
        if !found {
            engine_warn!("swapframe::vulkan",
                "Validation requested but {:?} is not installed", VALIDATION_LAYER);
        }
        found
    }

    /// Pick the first suitable GPU, preferring a discrete one
    unsafe fn select_physical_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<DeviceCandidate> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| init_error(format!("Failed to enumerate physical devices: {:?}", e)))?;

        let mut candidates = Vec::new();
        for physical_device in physical_devices {
            match Self::check_physical_device(instance, surface_loader, surface, physical_device) {
                Ok(candidate) => candidates.push(candidate),
                Err(reason) => {
                    engine_debug!("swapframe::vulkan", "Skipping GPU: {}", reason);
                }
            }
        }

        let index = candidates
            .iter()
            .position(|c| c.discrete)
            .or_else(|| (!candidates.is_empty()).then_some(0))
            .ok_or_else(|| init_error(
                "No GPU supports Vulkan 1.3 with synchronization2 and presentation to this surface".to_string()
            ))?;

        Ok(candidates.swap_remove(index))
    }

    /// Check one GPU; the error string says why it was rejected
    unsafe fn check_physical_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
    ) -> std::result::Result<DeviceCandidate, String> {
        let properties = instance.get_physical_device_properties(physical_device);
        let name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "Unknown GPU".to_string());

        if properties.api_version < vk::API_VERSION_1_3 {
            return Err(format!(
                "{} supports Vulkan {}.{} only",
                name,
                vk::api_version_major(properties.api_version),
                vk::api_version_minor(properties.api_version)
            ));
        }

        let mut features13 = vk::PhysicalDeviceVulkan13Features::default();
        {
            let mut features2 = vk::PhysicalDeviceFeatures2::default().push_next(&mut features13);
            instance.get_physical_device_features2(physical_device, &mut features2);
        }
        if features13.synchronization2 != vk::TRUE || features13.dynamic_rendering != vk::TRUE {
            return Err(format!("{} lacks synchronization2 or dynamic rendering", name));
        }

        let extensions = instance
            .enumerate_device_extension_properties(physical_device)
            .map_err(|e| format!("{}: failed to enumerate extensions: {:?}", name, e))?;
        let has_swapchain = extensions
            .iter()
            .any(|ext| ext.extension_name_as_c_str().is_ok_and(|ext| ext == ash::khr::swapchain::NAME));
        if !has_swapchain {
            return Err(format!("{} lacks {:?}", name, ash::khr::swapchain::NAME));
        }

        let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
        let queue_family = queue_families
            .iter()
            .enumerate()
            .find(|(index, family)| {
                family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                    && surface_loader
                        .get_physical_device_surface_support(physical_device, *index as u32, surface)
                        .unwrap_or(false)
            })
            .map(|(index, _)| index as u32)
            .ok_or_else(|| format!("{} has no queue family with graphics and present support", name))?;

        Ok(DeviceCandidate {
            physical_device,
            queue_family,
            name,
            discrete: properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU,
        })
    }

    /// Name of the selected GPU
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Validation message counters (all zero when validation is off)
    pub fn validation_stats(&self) -> ValidationStats {
        self.context
            .debug_context
            .as_ref()
            .map(|ctx| ctx.stats())
            .unwrap_or_default()
    }

    /// Whether the validation messenger is installed
    pub fn validation_enabled(&self) -> bool {
        self.context.debug_messenger.is_some()
    }

    /// Print the validation statistics report to stdout
    pub fn print_validation_report(&self) {
        let repeated = self
            .context
            .debug_context
            .as_ref()
            .map_or(0, |ctx| ctx.repeated_messages());
        crate::debug::print_validation_report(self.validation_stats(), repeated);
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_command_scope(&self) -> Result<Box<dyn CommandScope>> {
        Ok(Box::new(VulkanCommandScope::new(Arc::clone(&self.context))?))
    }

    fn destroy_command_scope(&self, scope: Box<dyn CommandScope>) {
        // VulkanCommandScope destroys its pool on drop
        drop(scope);
    }

    fn create_semaphore(&self) -> Result<Semaphore> {
        let semaphore = unsafe {
            self.context.device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| vk_error("create semaphore", e))?
        };
        Ok(Semaphore::from_raw(semaphore.as_raw()))
    }

    fn destroy_semaphore(&self, semaphore: Semaphore) {
        unsafe {
            self.context.device.destroy_semaphore(vk::Semaphore::from_raw(semaphore.as_raw()), None);
        }
    }

    fn create_fence(&self, signaled: bool) -> Result<Fence> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let fence = unsafe {
            self.context.device
                .create_fence(&vk::FenceCreateInfo::default().flags(flags), None)
                .map_err(|e| vk_error("create fence", e))?
        };
        Ok(Fence::from_raw(fence.as_raw()))
    }

    fn destroy_fence(&self, fence: Fence) {
        unsafe {
            self.context.device.destroy_fence(vk::Fence::from_raw(fence.as_raw()), None);
        }
    }

    fn create_swapchain(&self, desc: &SwapchainDesc) -> Result<Box<dyn RendererSwapchain>> {
        Ok(Box::new(Swapchain::new(Arc::clone(&self.context), desc)?))
    }

    fn wait_for_fence(&self, fence: Fence, timeout: Duration) -> Result<FenceStatus> {
        let fences = [vk::Fence::from_raw(fence.as_raw())];
        let result = unsafe {
            self.context.device.wait_for_fences(&fences, true, timeout_ns(timeout))
        };
        match result {
            Ok(()) => Ok(FenceStatus::Signaled),
            Err(vk::Result::TIMEOUT) => Ok(FenceStatus::TimedOut),
            Err(e) => Err(vk_error("wait for fence", e)),
        }
    }

    fn reset_fence(&self, fence: Fence) -> Result<()> {
        let fences = [vk::Fence::from_raw(fence.as_raw())];
        unsafe {
            self.context.device
                .reset_fences(&fences)
                .map_err(|e| vk_error("reset fence", e))
        }
    }

    fn submit(&self, commands: &dyn CommandScope, sync: &SubmitSync) -> Result<()> {
        if commands.is_recording() {
            engine_bail!("swapframe::vulkan", "Cannot submit a command buffer that is still recording");
        }

        let wait_info = vk::SemaphoreSubmitInfo::default()
            .semaphore(vk::Semaphore::from_raw(sync.wait.as_raw()))
            .stage_mask(stages_to_vk(sync.wait_stage))
            .value(1);

        let signal_info = vk::SemaphoreSubmitInfo::default()
            .semaphore(vk::Semaphore::from_raw(sync.signal.as_raw()))
            .stage_mask(stages_to_vk(sync.signal_stage))
            .value(1);

        let command_info = vk::CommandBufferSubmitInfo::default()
            .command_buffer(vk::CommandBuffer::from_raw(commands.raw_handle()));

        let submit_info = vk::SubmitInfo2::default()
            .wait_semaphore_infos(std::slice::from_ref(&wait_info))
            .signal_semaphore_infos(std::slice::from_ref(&signal_info))
            .command_buffer_infos(std::slice::from_ref(&command_info));

        unsafe {
            self.context.device
                .queue_submit2(
                    self.context.queue,
                    std::slice::from_ref(&submit_info),
                    vk::Fence::from_raw(sync.fence.as_raw()),
                )
                .map_err(|e| vk_error("submit commands to GPU queue", e))
        }
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.context.device
                .device_wait_idle()
                .map_err(|e| vk_error("wait for device idle", e))
        }
    }
}
