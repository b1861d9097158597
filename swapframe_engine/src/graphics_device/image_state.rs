/// Swapchain image ownership tracking
///
/// Each image cycles through
/// `Presentable -> Acquired -> Writable -> PresentReady -> Presentable`.
/// An image is writable by at most one frame at a time; any transition out of
/// order is a protocol bug and is reported as `InvalidState`.

use crate::error::{Error, Result};

/// Who currently owns a swapchain image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOwnership {
    /// Held by the presentation engine
    Presentable,
    /// Handed to a frame; writable once the acquire semaphore fires and the
    /// first barrier executes
    Acquired { frame: u64 },
    /// In the writable layout for `frame`'s commands
    Writable { frame: u64 },
    /// In the present layout, waiting for the present request
    PresentReady { frame: u64 },
}

/// Ownership state of every image of one swapchain
#[derive(Debug, Clone)]
pub struct ImageTracker {
    states: Vec<ImageOwnership>,
}

impl ImageTracker {
    /// All images start owned by the presentation engine
    pub fn new(image_count: usize) -> Self {
        Self {
            states: vec![ImageOwnership::Presentable; image_count],
        }
    }

    /// Number of tracked images
    pub fn image_count(&self) -> usize {
        self.states.len()
    }

    /// Current ownership of `index`
    pub fn state(&self, index: u32) -> Option<ImageOwnership> {
        self.states.get(index as usize).copied()
    }

    /// Number of images currently owned by frames
    pub fn frames_holding_images(&self) -> usize {
        self.states
            .iter()
            .filter(|s| !matches!(s, ImageOwnership::Presentable))
            .count()
    }

    /// Presentation engine handed `index` to `frame`
    pub fn acquired(&mut self, index: u32, frame: u64) -> Result<()> {
        self.advance(index, frame, "acquire", |state| match state {
            ImageOwnership::Presentable => Some(ImageOwnership::Acquired { frame }),
            _ => None,
        })
    }

    /// Transition to the writable layout was recorded for `frame`
    pub fn writable(&mut self, index: u32, frame: u64) -> Result<()> {
        self.advance(index, frame, "make writable", |state| match state {
            ImageOwnership::Acquired { frame: owner } if owner == frame => {
                Some(ImageOwnership::Writable { frame })
            }
            _ => None,
        })
    }

    /// Transition to the present layout was recorded for `frame`
    pub fn present_ready(&mut self, index: u32, frame: u64) -> Result<()> {
        self.advance(index, frame, "make present-ready", |state| match state {
            ImageOwnership::Writable { frame: owner } if owner == frame => {
                Some(ImageOwnership::PresentReady { frame })
            }
            _ => None,
        })
    }

    /// Image was handed back to the presentation engine by `frame`
    pub fn presented(&mut self, index: u32, frame: u64) -> Result<()> {
        self.advance(index, frame, "present", |state| match state {
            ImageOwnership::PresentReady { frame: owner } if owner == frame => {
                Some(ImageOwnership::Presentable)
            }
            _ => None,
        })
    }

    fn advance<F>(&mut self, index: u32, frame: u64, action: &str, next: F) -> Result<()>
    where
        F: FnOnce(ImageOwnership) -> Option<ImageOwnership>,
    {
        let count = self.states.len();
        let slot = self.states.get_mut(index as usize).ok_or_else(|| {
            Error::InvalidState(format!(
                "frame {} cannot {} image {}: swapchain has {} images",
                frame, action, index, count
            ))
        })?;

        match next(*slot) {
            Some(new_state) => {
                *slot = new_state;
                Ok(())
            }
            None => Err(Error::InvalidState(format!(
                "frame {} cannot {} image {} while it is {:?}",
                frame, action, index, *slot
            ))),
        }
    }
}

#[cfg(test)]
#[path = "image_state_tests.rs"]
mod tests;
