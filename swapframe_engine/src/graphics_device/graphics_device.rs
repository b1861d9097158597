/// GraphicsDevice trait - the device handle capability surface

use std::time::Duration;
use crate::error::Result;
use crate::graphics_device::{
    CommandScope, Swapchain, SwapchainDesc, Semaphore, Fence, FenceStatus, SubmitSync,
};

/// Device handle
///
/// Owns the logical execution context, the single submission queue and the
/// presentable surface. Implemented by backend-specific devices (e.g.
/// VulkanGraphicsDevice).
///
/// The device is passed explicitly to every component that needs it; there is
/// no global accessor.
///
/// Only one thread submits. Command recording never happens concurrently on
/// the same scope, so implementations need no internal queue locking.
pub trait GraphicsDevice: Send {
    // ===== OBJECT CREATION =====

    /// Create a command scope (pool + one primary command buffer)
    fn create_command_scope(&self) -> Result<Box<dyn CommandScope>>;

    /// Destroy a command scope
    ///
    /// The GPU must no longer reference its command buffer.
    fn destroy_command_scope(&self, scope: Box<dyn CommandScope>);

    /// Create a binary semaphore
    fn create_semaphore(&self) -> Result<Semaphore>;

    /// Destroy a semaphore
    fn destroy_semaphore(&self, semaphore: Semaphore);

    /// Create a fence
    ///
    /// # Arguments
    ///
    /// * `signaled` - Create the fence in the signaled state
    fn create_fence(&self, signaled: bool) -> Result<Fence>;

    /// Destroy a fence
    fn destroy_fence(&self, fence: Fence);

    /// Create the swapchain for the device's surface
    ///
    /// # Errors
    ///
    /// `SwapchainCreationError` if the surface cannot satisfy the format,
    /// usage or present mode of `desc`.
    fn create_swapchain(&self, desc: &SwapchainDesc) -> Result<Box<dyn Swapchain>>;

    // ===== SYNCHRONIZATION =====

    /// Block the calling thread until `fence` is signaled or `timeout` elapses
    fn wait_for_fence(&self, fence: Fence, timeout: Duration) -> Result<FenceStatus>;

    /// Reset a fence to the unsignaled state
    fn reset_fence(&self, fence: Fence) -> Result<()>;

    // ===== SUBMISSION =====

    /// Submit a recorded command scope to the queue
    ///
    /// Returns as soon as the work is enqueued. Completion is observed through
    /// `sync.fence`.
    fn submit(&self, commands: &dyn CommandScope, sync: &SubmitSync) -> Result<()>;

    /// Block until the device has finished all outstanding work
    fn wait_idle(&self) -> Result<()>;
}
