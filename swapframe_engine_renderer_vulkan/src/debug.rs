/// Vulkan Debug Messenger - routes validation layer messages to the engine logger
///
/// The callback reaches its configuration and counters through the messenger's
/// user data pointer, which points at the device's boxed `DebugContext`.

use ash::vk;
use colored::*;
use rustc_hash::FxHashMap;
use swapframe_engine::swapframe::render::{Config, DebugMessageFilter, DebugSeverity, ValidationStats};
use swapframe_engine::{engine_debug, engine_error, engine_info, engine_warn};
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Callback configuration, stats and repeated-message tracking of one device
pub(crate) struct DebugContext {
    severity: DebugSeverity,
    message_filter: DebugMessageFilter,
    panic_on_error: bool,
    enable_stats: bool,
    stats: ValidationStatsTracker,
    messages: Mutex<FxHashMap<String, u32>>,
}

/// Thread-safe validation statistics tracker
struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn increment(&self, severity: vk::DebugUtilsMessageSeverityFlagsEXT) {
        let counter = if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            &self.errors
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            &self.warnings
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            &self.info
        } else {
            &self.verbose
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get_stats(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }
}

impl DebugContext {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            severity: config.debug_severity,
            message_filter: config.debug_message_filter,
            panic_on_error: config.panic_on_validation_error,
            enable_stats: config.enable_validation_stats,
            stats: ValidationStatsTracker::new(),
            messages: Mutex::new(FxHashMap::default()),
        }
    }

    /// Severity flags the messenger subscribes to
    pub(crate) fn severity_flags(&self) -> vk::DebugUtilsMessageSeverityFlagsEXT {
        severity_flags(self.severity)
    }

    pub(crate) fn stats(&self) -> ValidationStats {
        self.stats.get_stats()
    }

    /// Number of distinct messages seen more than once
    pub(crate) fn repeated_messages(&self) -> usize {
        match self.messages.lock() {
            Ok(messages) => messages.values().filter(|&&count| count > 1).count(),
            Err(_) => 0,
        }
    }

    fn accepts(
        &self,
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    ) -> bool {
        if !severity_flags(self.severity).intersects(severity) {
            return false;
        }
        if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
            self.message_filter.show_validation
        } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
            self.message_filter.show_performance
        } else {
            self.message_filter.show_general
        }
    }

    /// Count the message and return how many times it has been seen
    fn track(&self, message: &str) -> u32 {
        match self.messages.lock() {
            Ok(mut messages) => {
                let count = messages.entry(message.to_string()).or_insert(0);
                *count += 1;
                *count
            }
            Err(_) => 1,
        }
    }

    /// Filter, count and log one message
    ///
    /// Returns `false` if the message was filtered out.
    pub(crate) fn handle_message(
        &self,
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT,
        message_id: &str,
        message: &str,
    ) -> bool {
        if !self.accepts(severity, message_type) {
            return false;
        }

        let occurrence_count = if self.enable_stats {
            self.stats.increment(severity);
            self.track(message)
        } else {
            1
        };

        let repeat_indicator = if occurrence_count > 1 {
            format!(" [×{}]", occurrence_count)
        } else {
            String::new()
        };

        let type_str = message_type_name(message_type);

        if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            engine_error!("swapframe::validation", "[{}]{} {}: {}", type_str, repeat_indicator, message_id, message);
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            engine_warn!("swapframe::validation", "[{}]{} {}: {}", type_str, repeat_indicator, message_id, message);
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            engine_info!("swapframe::validation", "[{}]{} {}: {}", type_str, repeat_indicator, message_id, message);
        } else {
            engine_debug!("swapframe::validation", "[{}]{} {}: {}", type_str, repeat_indicator, message_id, message);
        }

        if self.panic_on_error && severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            panic!(
                "Validation error (strict mode)\nMessage ID: {}\nType: {}\nMessage: {}",
                message_id, type_str, message
            );
        }

        true
    }
}

/// Severity flags for a severity filter
pub(crate) fn severity_flags(severity: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    match severity {
        DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    }
}

fn message_type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

/// Print validation statistics report
pub(crate) fn print_validation_report(stats: ValidationStats, repeated: usize) {
    if stats.total() == 0 {
        println!("\n{}", "✓ No validation messages".green().bold());
        return;
    }

    println!("\n{}", "=== Validation Statistics Report ===".bright_blue().bold());

    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }

    println!("  {} {}", "Total:".white().bold(), stats.total());

    if repeated > 0 {
        println!("\n  {} {} message(s) appeared multiple times", "ℹ".cyan(), repeated);
    }

    println!("{}\n", "====================================".bright_blue().bold());
}

/// Vulkan debug messenger callback
///
/// `user_data` must point at the `DebugContext` registered with the messenger.
pub(crate) unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if user_data.is_null() || p_callback_data.is_null() {
        return vk::FALSE;
    }
    let context = &*(user_data as *const DebugContext);
    let callback_data = &*p_callback_data;

    let message_id = if callback_data.p_message_id_name.is_null() {
        "Unknown"
    } else {
        CStr::from_ptr(callback_data.p_message_id_name)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };

    context.handle_message(message_severity, message_type, message_id, message);

    vk::FALSE // Don't abort Vulkan execution
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
