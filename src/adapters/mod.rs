//! Adapters — concrete implementations of the port traits.
//!
//! Everything platform-specific lives here: the PWM lamp output, the
//! wall clock, the JSON event sink and the message transport. The
//! domain core never imports from this module.

pub mod hardware;
pub mod log_sink;
pub mod time;
pub mod transport;
