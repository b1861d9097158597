/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// Every call is appended to a shared event log so tests can check the exact
/// protocol order. Fences and semaphores are simulated:
///
/// - With instant completion (the default) a submission signals its fence and
///   semaphore immediately.
/// - With deferred completion nothing is signaled until `complete_pending()`
///   or `wait_idle()`.
///
/// Protocol misuse that a real driver would reject (re-recording a scope whose
/// work is still pending, reusing a semaphore with a pending signal, waiting on
/// a semaphore nobody signals) is recorded in `violations()` instead of failing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquiredImage, CommandScope, Extent2D, Fence, FenceStatus, GraphicsDevice, Image,
    ImageBarrier, ImageLayout, PresentStatus, Semaphore, SubmitSync, Swapchain,
    SwapchainDesc, SwapchainStatus, TextureFormat,
};

// ============================================================================
// Event log
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    CreateCommandScope { scope: u64 },
    DestroyCommandScope { scope: u64 },
    CreateSemaphore(Semaphore),
    DestroySemaphore(Semaphore),
    CreateFence { fence: Fence, signaled: bool },
    DestroyFence(Fence),
    WaitFence { fence: Fence, status: FenceStatus },
    ResetFence(Fence),
    ResetScope { scope: u64 },
    Begin { scope: u64 },
    Barrier { scope: u64, barrier: ImageBarrier },
    Clear { scope: u64, image: Image, layout: ImageLayout, color: [f32; 4] },
    End { scope: u64 },
    Submit { scope: u64, sync: SubmitSync },
    CreateSwapchain { image_count: usize },
    CreateImageView { view: u64 },
    DestroyImageView { view: u64 },
    DestroySwapchain,
    Acquire { signal: Semaphore, image_index: u32 },
    Present { image_index: u32, wait: Semaphore },
    WaitIdle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SemaphoreState {
    Unsignaled,
    Pending,
    Signaled,
}

// ============================================================================
// Shared state
// ============================================================================

#[derive(Debug)]
pub struct MockState {
    events: Vec<MockEvent>,
    violations: Vec<String>,
    next_handle: u64,
    fences: HashMap<Fence, bool>,
    fence_order: Vec<Fence>,
    semaphores: HashMap<Semaphore, SemaphoreState>,
    scopes: HashSet<u64>,
    in_flight: HashMap<u64, Fence>,
    pending: Vec<(Fence, Semaphore)>,
    withheld_fences: HashSet<usize>,
    instant_completion: bool,
    image_count: usize,
    next_image: u32,
    acquire_failure: Option<Error>,
    present_failure: Option<Error>,
    present_status: PresentStatus,
    swapchain_failure: Option<Error>,
    semaphore_budget: Option<usize>,
    live_views: usize,
    live_swapchains: usize,
}

impl MockState {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            violations: Vec::new(),
            next_handle: 1,
            fences: HashMap::new(),
            fence_order: Vec::new(),
            semaphores: HashMap::new(),
            scopes: HashSet::new(),
            in_flight: HashMap::new(),
            pending: Vec::new(),
            withheld_fences: HashSet::new(),
            instant_completion: true,
            image_count: 3,
            next_image: 0,
            acquire_failure: None,
            present_failure: None,
            present_status: PresentStatus::Optimal,
            swapchain_failure: None,
            semaphore_budget: None,
            live_views: 0,
            live_swapchains: 0,
        }
    }

    fn allocate(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn is_withheld(&self, fence: Fence) -> bool {
        self.fence_order
            .iter()
            .position(|f| *f == fence)
            .map(|n| self.withheld_fences.contains(&n))
            .unwrap_or(false)
    }

    fn complete(&mut self, fence: Fence, signal: Semaphore) {
        if self.is_withheld(fence) {
            return;
        }
        self.fences.insert(fence, true);
        if let Some(state) = self.semaphores.get_mut(&signal) {
            if *state == SemaphoreState::Pending {
                *state = SemaphoreState::Signaled;
            }
        }
    }

    fn complete_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for (fence, signal) in pending {
            self.complete(fence, signal);
        }
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

#[derive(Debug, Clone)]
pub struct MockGraphicsDevice {
    state: Arc<Mutex<MockState>>,
}

impl MockGraphicsDevice {
    /// Device with instant completion and a 3-image swapchain
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::new())),
        }
    }

    /// Keep submissions pending until `complete_pending()`
    pub fn with_deferred_completion(self) -> Self {
        self.state.lock().unwrap().instant_completion = false;
        self
    }

    /// Number of images in swapchains created from now on
    pub fn with_image_count(self, count: usize) -> Self {
        self.state.lock().unwrap().image_count = count;
        self
    }

    /// Never signal the `nth` fence created (0-based), whatever is submitted with it
    pub fn withhold_fence(self, nth: usize) -> Self {
        self.state.lock().unwrap().withheld_fences.insert(nth);
        self
    }

    /// Fail semaphore creation once `count` semaphores exist
    pub fn with_semaphore_budget(self, count: usize) -> Self {
        self.state.lock().unwrap().semaphore_budget = Some(count);
        self
    }

    /// Make the next `create_swapchain` fail
    pub fn fail_swapchain_creation(&self, error: Error) {
        self.state.lock().unwrap().swapchain_failure = Some(error);
    }

    /// Make the next acquire fail
    pub fn fail_next_acquire(&self, error: Error) {
        self.state.lock().unwrap().acquire_failure = Some(error);
    }

    /// Make the next present fail
    pub fn fail_next_present(&self, error: Error) {
        self.state.lock().unwrap().present_failure = Some(error);
    }

    /// Status returned by successful presents from now on
    pub fn set_present_status(&self, status: PresentStatus) {
        self.state.lock().unwrap().present_status = status;
    }

    /// Signal everything submitted so far (except withheld fences)
    pub fn complete_pending(&self) {
        self.state.lock().unwrap().complete_pending();
    }

    /// Copy of the event log
    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().unwrap().events.clone()
    }

    /// Protocol violations observed so far
    pub fn violations(&self) -> Vec<String> {
        self.state.lock().unwrap().violations.clone()
    }

    /// Number of logged events matching `predicate`
    pub fn count<F: Fn(&MockEvent) -> bool>(&self, predicate: F) -> usize {
        self.state.lock().unwrap().events.iter().filter(|e| predicate(e)).count()
    }

    /// Fences created in creation order
    pub fn fences_created(&self) -> Vec<Fence> {
        self.state.lock().unwrap().fence_order.clone()
    }

    /// Whether `fence` is currently signaled
    pub fn is_fence_signaled(&self, fence: Fence) -> bool {
        self.state.lock().unwrap().fences.get(&fence).copied().unwrap_or(false)
    }

    pub fn live_fences(&self) -> usize {
        self.state.lock().unwrap().fences.len()
    }

    pub fn live_semaphores(&self) -> usize {
        self.state.lock().unwrap().semaphores.len()
    }

    pub fn live_command_scopes(&self) -> usize {
        self.state.lock().unwrap().scopes.len()
    }

    pub fn live_image_views(&self) -> usize {
        self.state.lock().unwrap().live_views
    }

    pub fn live_swapchains(&self) -> usize {
        self.state.lock().unwrap().live_swapchains
    }

    fn log(&self, event: MockEvent) {
        self.state.lock().unwrap().events.push(event);
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_command_scope(&self) -> Result<Box<dyn CommandScope>> {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        state.scopes.insert(id);
        state.events.push(MockEvent::CreateCommandScope { scope: id });
        Ok(Box::new(MockCommandScope {
            id,
            recording: false,
            state: Arc::clone(&self.state),
        }))
    }

    fn destroy_command_scope(&self, scope: Box<dyn CommandScope>) {
        let id = scope.raw_handle();
        let mut state = self.state.lock().unwrap();
        state.scopes.remove(&id);
        state.events.push(MockEvent::DestroyCommandScope { scope: id });
    }

    fn create_semaphore(&self) -> Result<Semaphore> {
        let mut state = self.state.lock().unwrap();
        if let Some(budget) = state.semaphore_budget {
            if state.semaphores.len() >= budget {
                return Err(Error::OutOfMemory);
            }
        }
        let semaphore = Semaphore::from_raw(state.allocate());
        state.semaphores.insert(semaphore, SemaphoreState::Unsignaled);
        state.events.push(MockEvent::CreateSemaphore(semaphore));
        Ok(semaphore)
    }

    fn destroy_semaphore(&self, semaphore: Semaphore) {
        let mut state = self.state.lock().unwrap();
        state.semaphores.remove(&semaphore);
        state.events.push(MockEvent::DestroySemaphore(semaphore));
    }

    fn create_fence(&self, signaled: bool) -> Result<Fence> {
        let mut state = self.state.lock().unwrap();
        let fence = Fence::from_raw(state.allocate());
        state.fences.insert(fence, signaled);
        state.fence_order.push(fence);
        state.events.push(MockEvent::CreateFence { fence, signaled });
        Ok(fence)
    }

    fn destroy_fence(&self, fence: Fence) {
        let mut state = self.state.lock().unwrap();
        state.fences.remove(&fence);
        state.events.push(MockEvent::DestroyFence(fence));
    }

    fn create_swapchain(&self, desc: &SwapchainDesc) -> Result<Box<dyn Swapchain>> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.swapchain_failure.take() {
            return Err(error);
        }

        let image_count = state.image_count;
        state.events.push(MockEvent::CreateSwapchain { image_count });
        state.live_swapchains += 1;

        let mut images = Vec::with_capacity(image_count);
        let mut views = Vec::with_capacity(image_count);
        for _ in 0..image_count {
            images.push(Image::from_raw(state.allocate()));
            let view = state.allocate();
            state.events.push(MockEvent::CreateImageView { view });
            state.live_views += 1;
            views.push(view);
        }
        state.next_image = 0;

        Ok(Box::new(MockSwapchain {
            images,
            views,
            extent: desc.extent,
            format: desc.format,
            status: SwapchainStatus::Live,
            state: Arc::clone(&self.state),
        }))
    }

    fn wait_for_fence(&self, fence: Fence, timeout: Duration) -> Result<FenceStatus> {
        let signaled = {
            let state = self.state.lock().unwrap();
            match state.fences.get(&fence) {
                Some(signaled) => *signaled,
                None => {
                    return Err(Error::InvalidState(format!("unknown fence {:?}", fence)))
                }
            }
        };

        let status = if signaled {
            FenceStatus::Signaled
        } else {
            std::thread::sleep(timeout);
            FenceStatus::TimedOut
        };
        self.log(MockEvent::WaitFence { fence, status });
        Ok(status)
    }

    fn reset_fence(&self, fence: Fence) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.fences.get_mut(&fence) {
            Some(signaled) => *signaled = false,
            None => return Err(Error::InvalidState(format!("unknown fence {:?}", fence))),
        }
        state.events.push(MockEvent::ResetFence(fence));
        Ok(())
    }

    fn submit(&self, commands: &dyn CommandScope, sync: &SubmitSync) -> Result<()> {
        let scope = commands.raw_handle();
        let mut state = self.state.lock().unwrap();

        if commands.is_recording() {
            state.violations.push(format!("scope {} submitted while recording", scope));
        }
        match state.semaphores.get(&sync.wait).copied() {
            Some(SemaphoreState::Signaled) | Some(SemaphoreState::Pending) => {
                state.semaphores.insert(sync.wait, SemaphoreState::Unsignaled);
            }
            _ => state
                .violations
                .push(format!("submit waits on unsignaled {:?}", sync.wait)),
        }
        if state.semaphores.get(&sync.signal) != Some(&SemaphoreState::Unsignaled) {
            state
                .violations
                .push(format!("submit signals {:?} which is not unsignaled", sync.signal));
        }
        if state.fences.get(&sync.fence) != Some(&false) {
            state
                .violations
                .push(format!("submit with {:?} which is not unsignaled", sync.fence));
        }

        state.semaphores.insert(sync.signal, SemaphoreState::Pending);
        state.in_flight.insert(scope, sync.fence);
        state.events.push(MockEvent::Submit { scope, sync: *sync });

        if state.instant_completion {
            state.complete(sync.fence, sync.signal);
        } else {
            state.pending.push((sync.fence, sync.signal));
        }
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.complete_pending();
        state.events.push(MockEvent::WaitIdle);
        Ok(())
    }
}

// ============================================================================
// Mock CommandScope
// ============================================================================

#[derive(Debug)]
pub struct MockCommandScope {
    id: u64,
    recording: bool,
    state: Arc<Mutex<MockState>>,
}

impl MockCommandScope {
    fn require_recording(&self, what: &str) -> Result<()> {
        if self.recording {
            Ok(())
        } else {
            Err(Error::InvalidState(format!("{} outside begin/end on scope {}", what, self.id)))
        }
    }
}

impl CommandScope for MockCommandScope {
    fn reset(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(fence) = state.in_flight.get(&self.id).copied() {
            if state.fences.get(&fence) != Some(&true) {
                state
                    .violations
                    .push(format!("scope {} reset while {:?} unsignaled", self.id, fence));
            }
        }
        state.events.push(MockEvent::ResetScope { scope: self.id });
        self.recording = false;
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        if self.recording {
            return Err(Error::InvalidState(format!("scope {} already recording", self.id)));
        }
        self.recording = true;
        self.state.lock().unwrap().events.push(MockEvent::Begin { scope: self.id });
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording("end")?;
        self.recording = false;
        self.state.lock().unwrap().events.push(MockEvent::End { scope: self.id });
        Ok(())
    }

    fn pipeline_barrier(&mut self, barrier: &ImageBarrier) -> Result<()> {
        self.require_recording("pipeline_barrier")?;
        self.state.lock().unwrap().events.push(MockEvent::Barrier {
            scope: self.id,
            barrier: *barrier,
        });
        Ok(())
    }

    fn clear_color_image(&mut self, image: Image, layout: ImageLayout, color: [f32; 4]) -> Result<()> {
        self.require_recording("clear_color_image")?;
        self.state.lock().unwrap().events.push(MockEvent::Clear {
            scope: self.id,
            image,
            layout,
            color,
        });
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.recording
    }

    fn raw_handle(&self) -> u64 {
        self.id
    }
}

// ============================================================================
// Mock Swapchain
// ============================================================================

#[derive(Debug)]
pub struct MockSwapchain {
    images: Vec<Image>,
    views: Vec<u64>,
    extent: Extent2D,
    format: TextureFormat,
    status: SwapchainStatus,
    state: Arc<Mutex<MockState>>,
}

impl Swapchain for MockSwapchain {
    fn acquire_next_image(&mut self, signal: Semaphore, _timeout: Duration) -> Result<AcquiredImage> {
        if self.status != SwapchainStatus::Live {
            return Err(Error::InvalidState(format!("acquire on {:?} swapchain", self.status)));
        }

        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.acquire_failure.take() {
            if matches!(error, Error::SwapchainOutOfDate(_)) {
                self.status = SwapchainStatus::Stale;
            }
            return Err(error);
        }

        if state.semaphores.get(&signal) != Some(&SemaphoreState::Unsignaled) {
            state
                .violations
                .push(format!("acquire signals {:?} which is not unsignaled", signal));
        }
        state.semaphores.insert(signal, SemaphoreState::Signaled);

        let index = state.next_image;
        state.next_image = (index + 1) % self.images.len() as u32;
        state.events.push(MockEvent::Acquire { signal, image_index: index });

        Ok(AcquiredImage { index, suboptimal: false })
    }

    fn present(&mut self, image_index: u32, wait: Semaphore) -> Result<PresentStatus> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.present_failure.take() {
            if matches!(error, Error::SwapchainOutOfDate(_)) {
                self.status = SwapchainStatus::Stale;
            }
            return Err(error);
        }

        match state.semaphores.get(&wait).copied() {
            Some(SemaphoreState::Signaled) | Some(SemaphoreState::Pending) => {
                state.semaphores.insert(wait, SemaphoreState::Unsignaled);
            }
            _ => state
                .violations
                .push(format!("present waits on unsignaled {:?}", wait)),
        }

        state.events.push(MockEvent::Present { image_index, wait });
        Ok(state.present_status)
    }

    fn destroy(&mut self) {
        if self.status == SwapchainStatus::Destroyed {
            return;
        }
        let mut state = self.state.lock().unwrap();
        for view in self.views.drain(..) {
            state.events.push(MockEvent::DestroyImageView { view });
            state.live_views -= 1;
        }
        state.events.push(MockEvent::DestroySwapchain);
        state.live_swapchains -= 1;
        self.status = SwapchainStatus::Destroyed;
    }

    fn image(&self, index: u32) -> Result<Image> {
        self.images.get(index as usize).copied().ok_or_else(|| {
            Error::InvalidState(format!(
                "image index {} out of range ({} images)",
                index,
                self.images.len()
            ))
        })
    }

    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn status(&self) -> SwapchainStatus {
        self.status
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
