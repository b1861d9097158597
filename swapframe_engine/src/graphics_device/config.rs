/// Device and frame loop configuration

use std::time::Duration;

/// Default bound on the per-slot fence wait
pub const DEFAULT_FENCE_TIMEOUT: Duration = Duration::from_millis(100);

/// Default bound on swapchain image acquisition
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(1);

/// Which validation messages reach the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Errors only
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything, including info and verbose
    All,
}

/// Which validation message types reach the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: true,
        }
    }
}

/// Validation layer message counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    /// Total number of messages received
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }

    /// Whether any error was reported
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name (passed to the driver)
    pub app_name: String,
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Severity filter for validation messages
    pub debug_severity: DebugSeverity,
    /// Message type filter for validation messages
    pub debug_message_filter: DebugMessageFilter,
    /// Panic as soon as the validation layer reports an error
    pub panic_on_validation_error: bool,
    /// Count validation messages (see `ValidationStats`)
    pub enable_validation_stats: bool,
    /// Bound on the wait for a frame slot's completion fence
    pub fence_timeout: Duration,
    /// Bound on the wait for the next presentable image
    pub acquire_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Swapframe Application".to_string(),
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_message_filter: DebugMessageFilter::default(),
            panic_on_validation_error: false,
            enable_validation_stats: true,
            fence_timeout: DEFAULT_FENCE_TIMEOUT,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}
