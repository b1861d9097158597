//! Error types for the Swapframe engine
//!
//! This module defines the error taxonomy surfaced by the frame loop. Every
//! kind is fatal inside the core; they stay distinct so a caller can react
//! (e.g. rebuild the swapchain on `SwapchainOutOfDate`).

use std::fmt;

/// Result type for Swapframe engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Swapframe engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Instance, surface, device or queue creation failed (startup only)
    DeviceInitError(String),

    /// The surface/device combination cannot satisfy the swapchain request
    SwapchainCreationError(String),

    /// The surface changed incompatibly; the swapchain is now stale
    SwapchainOutOfDate(String),

    /// No presentable image became available within the acquire timeout
    AcquireTimeout(String),

    /// A frame slot's completion fence was not signaled within the timeout
    FrameTimeout(String),

    /// The presentation engine rejected a present request
    PresentError(String),

    /// Backend-specific error (command recording, submission, ...)
    BackendError(String),

    /// An operation was issued in a state that does not allow it
    InvalidState(String),

    /// Out of host or device memory
    OutOfMemory,
}

/// Fieldless discriminant of [`Error`], handy for matching and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DeviceInit,
    SwapchainCreation,
    SwapchainOutOfDate,
    AcquireTimeout,
    FrameTimeout,
    Present,
    Backend,
    InvalidState,
    OutOfMemory,
}

impl Error {
    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DeviceInitError(_) => ErrorKind::DeviceInit,
            Error::SwapchainCreationError(_) => ErrorKind::SwapchainCreation,
            Error::SwapchainOutOfDate(_) => ErrorKind::SwapchainOutOfDate,
            Error::AcquireTimeout(_) => ErrorKind::AcquireTimeout,
            Error::FrameTimeout(_) => ErrorKind::FrameTimeout,
            Error::PresentError(_) => ErrorKind::Present,
            Error::BackendError(_) => ErrorKind::Backend,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::OutOfMemory => ErrorKind::OutOfMemory,
        }
    }

    /// Whether a recovery layer could retry after this error
    ///
    /// Only an out-of-date swapchain qualifies (by recreating it). The core
    /// itself never recovers.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::SwapchainOutOfDate(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DeviceInitError(msg) => write!(f, "Device initialization failed: {}", msg),
            Error::SwapchainCreationError(msg) => write!(f, "Swapchain creation failed: {}", msg),
            Error::SwapchainOutOfDate(msg) => write!(f, "Swapchain out of date: {}", msg),
            Error::AcquireTimeout(msg) => write!(f, "Swapchain image acquire timed out: {}", msg),
            Error::FrameTimeout(msg) => write!(f, "Frame fence wait timed out: {}", msg),
            Error::PresentError(msg) => write!(f, "Present failed: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::OutOfMemory => write!(f, "Out of memory"),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR (with file:line) and build an `Error::BackendError` from it
///
/// # Example
///
/// ```no_run
/// # use swapframe_engine::engine_err;
/// let err = engine_err!("swapframe::vulkan", "Failed to reset fence: {}", 42);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::write_detailed(
            $crate::swapframe::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::swapframe::Error::BackendError(message)
    }};
}

/// Log an ERROR and return early with an `Error::BackendError`
///
/// # Example
///
/// ```no_run
/// # use swapframe_engine::engine_bail;
/// fn check(index: u32) -> swapframe_engine::swapframe::Result<()> {
///     if index > 3 {
///         engine_bail!("swapframe::vulkan", "index {} out of range", index);
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
