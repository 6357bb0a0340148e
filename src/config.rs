//! System configuration parameters.
//!
//! All tunable timing and behaviour parameters for the lamp controller.
//! The values below match the shipped hardware; they can be overridden at
//! construction time (e.g. shortened windows in tests).

use serde::{Deserialize, Serialize};

/// Core system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Main loop ---
    /// Cooperative loop iteration interval (milliseconds).
    pub loop_interval_ms: u32,
    /// Schedule evaluation interval (milliseconds). The tick is gated by an
    /// elapsed-time check, not a hardware timer.
    pub schedule_interval_ms: u32,

    // --- Button gestures ---
    /// Minimum gap between accepted button edges (milliseconds).
    pub debounce_ms: u32,
    /// Grouping window for single/double/triple click (milliseconds).
    pub multi_click_window_ms: u32,
    /// True when the button reads LOW while pressed.
    pub button_active_low: bool,

    // --- Override acknowledgment ---
    /// Number of off/on blink cycles after a hardware override.
    pub override_blink_count: u8,
    /// Half-period of one blink cycle (milliseconds).
    pub override_blink_interval_ms: u32,

    // --- Diagnostics ---
    /// Minimum spacing between "no valid time" warnings (seconds).
    pub clock_warn_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: 10,
            schedule_interval_ms: 1000,

            debounce_ms: 35,
            multi_click_window_ms: 600,
            button_active_low: true,

            override_blink_count: 2,
            override_blink_interval_ms: 150,

            clock_warn_interval_secs: 30,
        }
    }
}
