/// Frame resource ring - fixed pool of per-frame recording contexts and sync objects
///
/// The ring bounds the CPU to at most `FRAME_OVERLAP` frames ahead of the GPU:
/// a slot is only re-recorded after its completion fence has been observed.

use std::time::{Duration, Instant};
use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandScope, Fence, FenceStatus, GraphicsDevice, Semaphore,
};
use crate::{engine_debug, engine_trace};

/// Number of frames whose GPU work may be outstanding at once
pub const FRAME_OVERLAP: usize = 2;

/// Monotonically increasing frame counter
///
/// Never reset during a run; `slot_index()` is `value mod FRAME_OVERLAP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameCounter(u64);

impl FrameCounter {
    /// Counter at frame zero
    pub const fn new() -> Self {
        Self(0)
    }

    /// Number of frames completed so far
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Ring slot used by the current frame
    pub const fn slot_index(self) -> usize {
        FrameRing::slot_index(self.0)
    }

    /// Move on to the next frame
    pub fn advance(&mut self) {
        self.0 += 1;
    }
}

/// One reusable bundle of recording context plus synchronization objects
pub struct FrameSlot {
    index: usize,
    command_scope: Box<dyn CommandScope>,
    acquire_signal: Semaphore,
    complete_signal: Semaphore,
    complete_fence: Fence,
}

impl FrameSlot {
    /// Create a slot; the fence starts signaled so the first use never blocks
    ///
    /// On failure, objects created so far are destroyed before returning.
    fn create(device: &dyn GraphicsDevice, index: usize) -> Result<Self> {
        let command_scope = device.create_command_scope()?;

        let acquire_signal = match device.create_semaphore() {
            Ok(semaphore) => semaphore,
            Err(e) => {
                device.destroy_command_scope(command_scope);
                return Err(e);
            }
        };

        let complete_signal = match device.create_semaphore() {
            Ok(semaphore) => semaphore,
            Err(e) => {
                device.destroy_semaphore(acquire_signal);
                device.destroy_command_scope(command_scope);
                return Err(e);
            }
        };

        let complete_fence = match device.create_fence(true) {
            Ok(fence) => fence,
            Err(e) => {
                device.destroy_semaphore(complete_signal);
                device.destroy_semaphore(acquire_signal);
                device.destroy_command_scope(command_scope);
                return Err(e);
            }
        };

        Ok(Self {
            index,
            command_scope,
            acquire_signal,
            complete_signal,
            complete_fence,
        })
    }

    fn destroy(self, device: &dyn GraphicsDevice) {
        device.destroy_fence(self.complete_fence);
        device.destroy_semaphore(self.complete_signal);
        device.destroy_semaphore(self.acquire_signal);
        device.destroy_command_scope(self.command_scope);
    }

    /// Position of this slot in the ring
    pub fn index(&self) -> usize {
        self.index
    }

    /// Semaphore signaled by the presentation engine once the acquired image is writable
    pub fn acquire_signal(&self) -> Semaphore {
        self.acquire_signal
    }

    /// Semaphore signaled by the queue when this slot's work finishes
    pub fn complete_signal(&self) -> Semaphore {
        self.complete_signal
    }

    /// Fence signaled by the queue when this slot's work finishes
    pub fn complete_fence(&self) -> Fence {
        self.complete_fence
    }

    /// The slot's recording context
    pub fn command_scope(&self) -> &dyn CommandScope {
        self.command_scope.as_ref()
    }

    /// The slot's recording context, for recording
    pub fn command_scope_mut(&mut self) -> &mut dyn CommandScope {
        self.command_scope.as_mut()
    }
}

/// Fixed-size ring of frame slots
pub struct FrameRing {
    slots: [FrameSlot; FRAME_OVERLAP],
}

impl FrameRing {
    /// Create all `FRAME_OVERLAP` slots
    ///
    /// If a slot fails to create, every slot created before it is destroyed.
    pub fn new(device: &dyn GraphicsDevice) -> Result<Self> {
        let mut created: Vec<FrameSlot> = Vec::with_capacity(FRAME_OVERLAP);

        for index in 0..FRAME_OVERLAP {
            match FrameSlot::create(device, index) {
                Ok(slot) => created.push(slot),
                Err(e) => {
                    for slot in created {
                        slot.destroy(device);
                    }
                    return Err(e);
                }
            }
        }

        let slots: [FrameSlot; FRAME_OVERLAP] = match created.try_into() {
            Ok(slots) => slots,
            Err(_) => {
                return Err(Error::InvalidState(
                    "frame ring slot count mismatch".to_string(),
                ))
            }
        };

        engine_debug!("swapframe::frame_ring", "Created {} frame slots", FRAME_OVERLAP);

        Ok(Self { slots })
    }

    /// Slot used by frame `counter`
    pub const fn slot_index(counter: u64) -> usize {
        (counter % FRAME_OVERLAP as u64) as usize
    }

    /// Number of slots (always `FRAME_OVERLAP`)
    pub const fn len(&self) -> usize {
        FRAME_OVERLAP
    }

    /// Get a slot by index
    pub fn slot(&self, index: usize) -> Option<&FrameSlot> {
        self.slots.get(index)
    }

    /// Iterate over all slots in ring order
    pub fn slots(&self) -> impl Iterator<Item = &FrameSlot> {
        self.slots.iter()
    }

    /// Slot for the given frame counter
    pub fn acquire_slot(&mut self, counter: FrameCounter) -> &mut FrameSlot {
        &mut self.slots[counter.slot_index()]
    }

    /// Wait until the slot's previous GPU work is done, then reset it for recording
    ///
    /// Blocks until `complete_fence` is signaled or `timeout` elapses. On success
    /// resets the command scope, then resets the fence to unsignaled, and returns
    /// the time spent blocked.
    ///
    /// # Errors
    ///
    /// `FrameTimeout` if the fence is still unsignaled after `timeout`. Nothing
    /// is reset in that case.
    pub fn wait_and_reset(
        device: &dyn GraphicsDevice,
        slot: &mut FrameSlot,
        timeout: Duration,
    ) -> Result<Duration> {
        let started = Instant::now();
        let status = device.wait_for_fence(slot.complete_fence, timeout)?;
        let waited = started.elapsed();

        if status == FenceStatus::TimedOut {
            return Err(Error::FrameTimeout(format!(
                "slot {} fence {:?} not signaled within {:?}",
                slot.index, slot.complete_fence, timeout
            )));
        }

        // Scope first: its buffer must not be reset once the fence is unsignaled
        slot.command_scope.reset()?;
        device.reset_fence(slot.complete_fence)?;

        engine_trace!(
            "swapframe::frame_ring",
            "Slot {} ready after {:?}",
            slot.index,
            waited
        );

        Ok(waited)
    }

    /// Destroy every slot
    ///
    /// The device must be idle.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        for slot in self.slots {
            slot.destroy(device);
        }
        engine_debug!("swapframe::frame_ring", "Destroyed {} frame slots", FRAME_OVERLAP);
    }
}

#[cfg(test)]
#[path = "frame_ring_tests.rs"]
mod tests;
