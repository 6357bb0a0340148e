//! One-shot hardware peripheral initialization.
//!
//! Configures the two LEDC lamp channels (5 kHz, 4-bit duty so the raw
//! 0–15 scale maps 1:1 onto the driver board) and the rotary/button GPIO
//! inputs. Called once from `main()` before the control loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcInitFailed,
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed => write!(f, "LEDC timer/channel config failed"),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_gpio_inputs()?;
        init_ledc()?;
    }
    log::info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO inputs (rotary + button, pull-up) ────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    let mask = (1u64 << pins::ROTARY_DT_GPIO)
        | (1u64 << pins::ROTARY_CLK_GPIO)
        | (1u64 << pins::BUTTON_GPIO);
    let cfg = gpio_config_t {
        pin_bit_mask: mask,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let rc = unsafe { gpio_config(&cfg) };
    if rc != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(rc));
    }
    Ok(())
}

// ── LEDC (two lamp channels) ──────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    let timer_cfg = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        duty_resolution: pins::LEDC_DUTY_BITS,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        freq_hz: pins::LEDC_FREQ_HZ,
        clk_cfg: ledc_clk_cfg_t_LEDC_AUTO_CLK,
        deconfigure: false,
    };
    if unsafe { ledc_timer_config(&timer_cfg) } != ESP_OK {
        return Err(HwInitError::LedcInitFailed);
    }

    for (channel, gpio) in [
        (pins::LEDC_CH_WARM, pins::LED_WARM_GPIO),
        (pins::LEDC_CH_WHITE, pins::LED_WHITE_GPIO),
    ] {
        let ch_cfg = ledc_channel_config_t {
            gpio_num: gpio,
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            intr_type: ledc_intr_type_t_LEDC_INTR_DISABLE,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            duty: u32::from(crate::output::CHANNEL_OFF),
            hpoint: 0,
            flags: Default::default(),
        };
        if unsafe { ledc_channel_config(&ch_cfg) } != ESP_OK {
            return Err(HwInitError::LedcInitFailed);
        }
    }
    Ok(())
}

// ── Runtime helpers ───────────────────────────────────────────

/// Set a LEDC channel duty (raw 0–15 on the 4-bit timer).
#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: channel was configured in init_ledc(); duty fits the timer.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) {}

/// Read a GPIO input level.
#[cfg(target_os = "espidf")]
pub fn gpio_read(gpio: i32) -> bool {
    // SAFETY: gpio was configured as input in init_gpio_inputs().
    unsafe { gpio_get_level(gpio) != 0 }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_gpio: i32) -> bool {
    true // idle level for the active-low button
}
