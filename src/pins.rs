//! GPIO / peripheral pin assignments for the lamp controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// LED output channels (two PWM groups behind constant-current drivers)
// ---------------------------------------------------------------------------

/// Warm LED group — LEDC channel 0.
pub const LED_WARM_GPIO: i32 = 16;
/// White LED group — LEDC channel 1.
pub const LED_WHITE_GPIO: i32 = 17;

/// LEDC channel indices for the two lamp groups.
pub const LEDC_CH_WARM: u32 = 0;
pub const LEDC_CH_WHITE: u32 = 1;

/// PWM carrier frequency (Hz). 4-bit duty resolution gives the 0–15 scale
/// the channel mapper works in.
pub const LEDC_FREQ_HZ: u32 = 5000;
pub const LEDC_DUTY_BITS: u32 = 4;

// ---------------------------------------------------------------------------
// Rotary encoder with push button
// ---------------------------------------------------------------------------

/// Quadrature DT line.
pub const ROTARY_DT_GPIO: i32 = 32;
/// Quadrature CLK line.
pub const ROTARY_CLK_GPIO: i32 = 33;
/// Push button on the encoder shaft. Wired active-low with internal pull-up.
pub const BUTTON_GPIO: i32 = 25;
