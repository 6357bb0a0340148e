//! Port traits — the boundary between the lamp core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LampService (domain)
//! ```
//!
//! Driven adapters (PWM hardware, event sinks, the wall clock, the message
//! transport) implement these traits. The
//! [`LampService`](super::service::LampService) consumes them via generics,
//! so the core never touches hardware directly and runs unmodified in
//! host-side tests.

use super::commands::Message;
use super::events::LampEvent;

// ───────────────────────────────────────────────────────────────
// Lamp output port (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port driving the two PWM groups.
///
/// Duties are on the inverted 0–15 scale of
/// [`compute_channels`](crate::output::compute_channels).
pub trait LampPort {
    /// Set both channel duties in one call.
    fn set_channels(&mut self, warm: u8, white: u8);

    /// Last duties written (used to restore output after a blink).
    fn channels(&self) -> (u8, u8);

    /// Busy-wait for the given interval. Only the override blink uses this;
    /// it deliberately blocks the loop for `count × 2 × interval_ms`.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → observers)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`LampEvent`]s through this port. Adapters
/// decide where they go (serial log, WebSocket broadcast, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &LampEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port (domain ↔ wall-clock service)
// ───────────────────────────────────────────────────────────────

/// Wall-clock service. May legitimately have no reading (pre time-sync);
/// the schedule tick must tolerate that indefinitely.
pub trait ClockPort {
    /// Local time as minutes since midnight (0–1439), or `None` when the
    /// clock has not been synchronized yet.
    fn minutes_since_midnight(&self) -> Option<u16>;

    /// Set the clock from a UTC epoch-milliseconds timestamp.
    fn set_epoch_ms(&mut self, epoch_ms: i64) -> Result<(), ClockError>;
}

/// Errors from [`ClockPort::set_epoch_ms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The timestamp is not a plausible wall-clock reading.
    InvalidTimestamp,
    /// The platform refused to set the system time.
    SetFailed,
}

impl core::fmt::Display for ClockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidTimestamp => write!(f, "invalid timestamp"),
            Self::SetFailed => write!(f, "failed to set system time"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Message source port (transport → domain)
// ───────────────────────────────────────────────────────────────

/// Inbound side of the opaque bidirectional channel. The transport decodes
/// and validates wire frames; the core only ever sees typed [`Message`]s.
pub trait MessageSource {
    /// Next pending message, if any. Non-blocking.
    fn poll(&mut self) -> Option<Message>;
}
