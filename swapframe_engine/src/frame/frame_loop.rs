/// Frame loop - drives one frame per call through wait, acquire, record, submit, present
///
/// The loop owns the device, the swapchain and the frame ring. It keeps at most
/// `FRAME_OVERLAP` frames in flight: before a slot is re-recorded its completion
/// fence must be observed signaled.
///
/// Every error is fatal. The first failing `draw_frame` moves the loop to
/// `Halted` and all later calls report `InvalidState`; teardown still works.

use std::time::Duration;
use crate::error::{Error, Result};
use crate::frame::{FlashClear, FrameContent, FrameCounter, FrameRing, FrameTarget};
use crate::graphics_device::{
    transition, Config, GraphicsDevice, ImageLayout, ImageTracker, PresentStatus,
    SubmitSync, Swapchain, SwapchainDesc, SwapchainStatus, FRAME_WRITABLE_LAYOUT,
};
use crate::{engine_error, engine_info, engine_trace, engine_warn};

/// Where the loop is in the per-frame protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Ready for the next `draw_frame`
    Idle,
    /// Blocked on the slot's completion fence
    Waiting,
    /// Requesting an image from the presentation engine
    Acquiring,
    /// Recording the slot's command scope
    Recording,
    /// Work handed to the queue
    Submitted,
    /// Present request issued
    Presenting,
    /// A frame failed; only teardown is allowed
    Halted,
    /// Resources released
    ShutDown,
}

/// Outcome of one presented frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Counter value of the frame (before it was advanced)
    pub frame_number: u64,
    /// Ring slot used
    pub slot_index: usize,
    /// Swapchain image presented
    pub image_index: u32,
    /// Time spent blocked on the slot's fence
    pub fence_wait: Duration,
    /// Acquire or present reported the swapchain as suboptimal
    pub suboptimal: bool,
}

/// Running totals over all presented frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_presented: u64,
    pub suboptimal_frames: u64,
    pub total_fence_wait: Duration,
    pub longest_fence_wait: Duration,
}

impl FrameStats {
    /// Mean fence wait per presented frame
    pub fn average_fence_wait(&self) -> Duration {
        if self.frames_presented == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_fence_wait.as_nanos() / self.frames_presented as u128;
        Duration::from_nanos(nanos as u64)
    }

    fn record(&mut self, report: &FrameReport) {
        self.frames_presented += 1;
        if report.suboptimal {
            self.suboptimal_frames += 1;
        }
        self.total_fence_wait += report.fence_wait;
        self.longest_fence_wait = self.longest_fence_wait.max(report.fence_wait);
    }
}

/// Per-frame driver
pub struct FrameLoop<D: GraphicsDevice> {
    device: D,
    swapchain: Option<Box<dyn Swapchain>>,
    ring: Option<FrameRing>,
    images: ImageTracker,
    content: Box<dyn FrameContent>,
    counter: FrameCounter,
    state: FrameState,
    fence_timeout: Duration,
    acquire_timeout: Duration,
    stats: FrameStats,
}

impl<D: GraphicsDevice> FrameLoop<D> {
    /// Create the swapchain and the frame ring on `device`
    ///
    /// Content defaults to [`FlashClear`].
    ///
    /// # Errors
    ///
    /// - `SwapchainCreationError` if the surface cannot satisfy `desc`
    /// - Any error from creating the ring's sync objects (the swapchain is
    ///   released before returning)
    pub fn new(device: D, desc: &SwapchainDesc, config: &Config) -> Result<Self> {
        let mut swapchain = device.create_swapchain(desc)?;

        let ring = match FrameRing::new(&device) {
            Ok(ring) => ring,
            Err(e) => {
                swapchain.destroy();
                return Err(e);
            }
        };

        let images = ImageTracker::new(swapchain.image_count());

        engine_info!(
            "swapframe::frame_loop",
            "Frame loop ready: {} swapchain images, {}x{}, {} frame slots",
            swapchain.image_count(),
            swapchain.extent().width,
            swapchain.extent().height,
            ring.len()
        );

        Ok(Self {
            device,
            swapchain: Some(swapchain),
            ring: Some(ring),
            images,
            content: Box::new(FlashClear::default()),
            counter: FrameCounter::new(),
            state: FrameState::Idle,
            fence_timeout: config.fence_timeout,
            acquire_timeout: config.acquire_timeout,
            stats: FrameStats::default(),
        })
    }

    /// Replace what is recorded between the two transitions
    pub fn with_content<C: FrameContent + 'static>(mut self, content: C) -> Self {
        self.content = Box::new(content);
        self
    }

    /// Draw and present one frame
    ///
    /// # Errors
    ///
    /// - `FrameTimeout` if the slot's previous work did not finish in time
    ///   (nothing is acquired)
    /// - `AcquireTimeout` / `SwapchainOutOfDate` from acquisition (nothing is
    ///   presented)
    /// - `PresentError` / `SwapchainOutOfDate` from presentation
    /// - `InvalidState` if the loop is halted or shut down
    pub fn draw_frame(&mut self) -> Result<FrameReport> {
        match self.state {
            FrameState::Idle => {}
            FrameState::Halted => {
                return Err(Error::InvalidState(
                    "frame loop halted after a failed frame".to_string(),
                ))
            }
            FrameState::ShutDown => {
                return Err(Error::InvalidState("frame loop shut down".to_string()))
            }
            other => {
                return Err(Error::InvalidState(format!(
                    "draw_frame called while frame loop is {:?}",
                    other
                )))
            }
        }

        match self.run_frame() {
            Ok(report) => {
                self.state = FrameState::Idle;
                self.stats.record(&report);
                Ok(report)
            }
            Err(e) => {
                engine_error!(
                    "swapframe::frame_loop",
                    "Frame {} failed in state {:?}: {}",
                    self.counter.value(),
                    self.state,
                    e
                );
                self.state = FrameState::Halted;
                Err(e)
            }
        }
    }

    /// Draw `count` frames, stopping at the first error
    pub fn run_frames(&mut self, count: u64) -> Result<Vec<FrameReport>> {
        let mut reports = Vec::new();
        for _ in 0..count {
            reports.push(self.draw_frame()?);
        }
        Ok(reports)
    }

    fn run_frame(&mut self) -> Result<FrameReport> {
        let frame_number = self.counter.value();
        let (Some(ring), Some(swapchain)) = (self.ring.as_mut(), self.swapchain.as_mut()) else {
            return Err(Error::InvalidState("frame loop resources missing".to_string()));
        };

        self.state = FrameState::Waiting;
        let slot = ring.acquire_slot(self.counter);
        let slot_index = slot.index();
        let fence_wait = FrameRing::wait_and_reset(&self.device, slot, self.fence_timeout)?;

        self.state = FrameState::Acquiring;
        let acquired = swapchain.acquire_next_image(slot.acquire_signal(), self.acquire_timeout)?;
        let image = swapchain.image(acquired.index)?;
        self.images.acquired(acquired.index, frame_number)?;

        engine_trace!(
            "swapframe::frame_loop",
            "Frame {} slot {} acquired image {}",
            frame_number,
            slot_index,
            acquired.index
        );

        self.state = FrameState::Recording;
        let target = FrameTarget {
            image,
            image_index: acquired.index,
            layout: FRAME_WRITABLE_LAYOUT,
            extent: swapchain.extent(),
            frame_number,
        };
        {
            let scope = slot.command_scope_mut();
            scope.begin()?;
            transition(scope, image, ImageLayout::Undefined, FRAME_WRITABLE_LAYOUT)?;
            self.images.writable(acquired.index, frame_number)?;
            self.content.record(scope, &target)?;
            transition(scope, image, FRAME_WRITABLE_LAYOUT, ImageLayout::PresentSrc)?;
            self.images.present_ready(acquired.index, frame_number)?;
            scope.end()?;
        }

        let sync = SubmitSync::frame(
            slot.acquire_signal(),
            slot.complete_signal(),
            slot.complete_fence(),
        );
        self.device.submit(slot.command_scope(), &sync)?;
        self.state = FrameState::Submitted;
        engine_trace!(
            "swapframe::frame_loop",
            "Frame {} submitted from slot {}",
            frame_number,
            slot_index
        );

        let status = swapchain.present(acquired.index, slot.complete_signal())?;
        self.state = FrameState::Presenting;
        self.images.presented(acquired.index, frame_number)?;

        let suboptimal = acquired.suboptimal || status == PresentStatus::Suboptimal;
        if suboptimal {
            engine_warn!(
                "swapframe::frame_loop",
                "Frame {} presented on a suboptimal swapchain",
                frame_number
            );
        }

        self.counter.advance();

        Ok(FrameReport {
            frame_number,
            slot_index,
            image_index: acquired.index,
            fence_wait,
            suboptimal,
        })
    }

    /// Wait for the device to go idle, then release the ring and the swapchain
    ///
    /// Resources are released even if the idle wait fails; that error is
    /// returned afterwards. Calling it again is a no-op.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.state == FrameState::ShutDown {
            return Ok(());
        }

        let idle = self.device.wait_idle();
        if let Err(e) = &idle {
            engine_error!("swapframe::frame_loop", "wait_idle failed during shutdown: {}", e);
        }

        if let Some(ring) = self.ring.take() {
            ring.destroy(&self.device);
        }
        if let Some(mut swapchain) = self.swapchain.take() {
            swapchain.destroy();
        }

        self.state = FrameState::ShutDown;
        engine_info!(
            "swapframe::frame_loop",
            "Frame loop shut down after {} frames",
            self.counter.value()
        );

        idle
    }

    /// Current protocol state
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Frames presented so far
    pub fn frame_number(&self) -> u64 {
        self.counter.value()
    }

    /// Running totals
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// The device the loop drives
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Swapchain status, `None` after shutdown
    pub fn swapchain_status(&self) -> Option<SwapchainStatus> {
        self.swapchain.as_ref().map(|s| s.status())
    }

    /// Per-image ownership
    pub fn images(&self) -> &ImageTracker {
        &self.images
    }
}

impl<D: GraphicsDevice> Drop for FrameLoop<D> {
    fn drop(&mut self) {
        if self.state != FrameState::ShutDown {
            let _ = self.shutdown();
        }
    }
}

#[cfg(test)]
#[path = "frame_loop_tests.rs"]
mod tests;
