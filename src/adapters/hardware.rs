//! Hardware adapter — bridges the LEDC PWM peripheral to [`LampPort`].
//!
//! This is the only module besides `drivers::hw_init` that touches the
//! LED hardware. It caches the last written duties so the core can read
//! them back (the override blink restores from this cache, mirroring a
//! register read on the real peripheral).

use crate::app::ports::LampPort;
use crate::drivers::hw_init;
use crate::output::CHANNEL_OFF;
use crate::pins;

/// Concrete lamp output driving the two inverted LEDC channels.
pub struct LampAdapter {
    warm: u8,
    white: u8,
}

impl Default for LampAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LampAdapter {
    /// Starts with both channels at the off duty, matching the state
    /// `hw_init::init_peripherals` leaves the LEDC channels in.
    pub fn new() -> Self {
        Self {
            warm: CHANNEL_OFF,
            white: CHANNEL_OFF,
        }
    }
}

impl LampPort for LampAdapter {
    fn set_channels(&mut self, warm: u8, white: u8) {
        self.warm = warm;
        self.white = white;
        hw_init::ledc_set(pins::LEDC_CH_WARM, warm);
        hw_init::ledc_set(pins::LEDC_CH_WHITE, white);
    }

    fn channels(&self) -> (u8, u8) {
        (self.warm, self.white)
    }

    #[cfg(target_os = "espidf")]
    fn delay_ms(&mut self, ms: u32) {
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
