/// Opaque GPU object handles
///
/// Backends store their native handle as a raw `u64` (Vulkan non-dispatchable
/// handles are 64-bit). The core only compares and forwards them.

use std::fmt;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// The null handle
            pub const NULL: Self = Self(0);

            /// Wrap a raw backend handle
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the raw backend handle
            pub const fn as_raw(self) -> u64 {
                self.0
            }

            /// Whether this is the null handle
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{:x})", stringify!($name), self.0)
            }
        }
    };
}

define_handle!(
    /// GPU-side semaphore (wait/signal between queue operations and presentation)
    Semaphore
);

define_handle!(
    /// CPU-visible fence (signaled by the queue when a submission completes)
    Fence
);

define_handle!(
    /// Swapchain image (borrowed by a frame between acquire and present)
    Image
);
