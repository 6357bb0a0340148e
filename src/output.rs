//! Lamp state and the deterministic channel mapper.
//!
//! The lamp has two PWM groups (warm, white) driven on an **inverted**
//! 0–15 duty scale: 15 = fully off, 0 = fully on. That is a property of the
//! constant-current driver board, not a software choice — the mapper must
//! preserve it exactly.

use serde::{Deserialize, Serialize};

/// Duty value that switches a channel fully off.
pub const CHANNEL_OFF: u8 = 15;

/// Maximum user-facing brightness step.
pub const BRIGHTNESS_MAX: u8 = 15;

/// Colour mode selecting which LED group(s) carry the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Mode {
    Warm = 0,
    White = 1,
    Both = 2,
}

impl Mode {
    /// Decode a wire value (0–2).
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(Self::Warm),
            1 => Some(Self::White),
            2 => Some(Self::Both),
            _ => None,
        }
    }

    /// Next mode in the double-click cycle: warm → white → both → warm.
    pub fn next(self) -> Self {
        match self {
            Self::Warm => Self::White,
            Self::White => Self::Both,
            Self::Both => Self::Warm,
        }
    }
}

/// The process-wide lamp state. Always valid: `brightness <= 15`.
///
/// When `is_on`, the effective brightness fed to the mapper is
/// `max(1, brightness)` so the lamp never renders "on but dark".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LampState {
    pub is_on: bool,
    pub brightness: u8,
    pub mode: Mode,
}

impl Default for LampState {
    fn default() -> Self {
        Self {
            is_on: true,
            brightness: 0,
            mode: Mode::Both,
        }
    }
}

/// Map `{on, brightness, mode}` to the two channel duties.
///
/// Pure and total over valid inputs. Off always yields `(15, 15)`.
pub fn compute_channels(is_on: bool, brightness: u8, mode: Mode) -> (u8, u8) {
    if !is_on {
        return (CHANNEL_OFF, CHANNEL_OFF);
    }

    let safe = brightness.clamp(1, BRIGHTNESS_MAX);
    let inverted = BRIGHTNESS_MAX - safe;

    match mode {
        Mode::Warm => (inverted, CHANNEL_OFF),
        Mode::White => (CHANNEL_OFF, inverted),
        Mode::Both => (inverted, inverted),
    }
}
