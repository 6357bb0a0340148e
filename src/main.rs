//! Circadian Light Firmware — Main Entry Point
//!
//! Hexagonal architecture with a cooperative polled loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  LampAdapter     JsonEventSink   LocalClock   transport      │
//! │  (LampPort)      (EventSink)     (ClockPort)  (MessageSource)│
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ──────────────────      │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │            LampService (pure logic)                  │    │
//! │  │  arbiter · override · schedule store · output map    │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! │                                                              │
//! │  RotaryDecoder · ClickDecoder (polled input drivers)         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! One loop iteration: poll the encoder and button, drain inbound
//! messages, and run the schedule tick when its interval has elapsed.
//! Everything is polled; no ISRs, no tasks.
#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use circadian_light::adapters::hardware::LampAdapter;
use circadian_light::adapters::log_sink::JsonEventSink;
use circadian_light::adapters::time::LocalClock;
use circadian_light::adapters::transport::NullMessageSource;
use circadian_light::app::ports::{ClockPort, MessageSource};
use circadian_light::app::service::LampService;
use circadian_light::config::SystemConfig;
use circadian_light::drivers::button::ClickDecoder;
use circadian_light::drivers::rotary::RotaryDecoder;
use circadian_light::drivers::hw_init;
use circadian_light::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    env_logger_fallback();

    info!("circadian-light v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt; the
        // hardware watchdog resets us after its timeout.
        log::error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Adapters + input decoders ──────────────────────────
    let config = SystemConfig::default();
    let mut hw = LampAdapter::new();
    let mut sink = JsonEventSink::new();
    let mut clock = LocalClock::new();
    let mut source = NullMessageSource;

    let mut button = ClickDecoder::new(
        config.button_active_low,
        config.debounce_ms,
        config.multi_click_window_ms,
    );
    let mut rotary = RotaryDecoder::new(
        hw_init::gpio_read(pins::ROTARY_CLK_GPIO),
        hw_init::gpio_read(pins::ROTARY_DT_GPIO),
    );

    // ── 4. Lamp service ───────────────────────────────────────
    let mut lamp = LampService::new(config.clone());
    lamp.apply_output(&mut hw);
    lamp.publish_state(&mut sink);

    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    let mut last_schedule_tick_ms: u64 = 0;

    loop {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(
            config.loop_interval_ms,
        )));
        let now_ms = clock.uptime_ms();

        // Rotary encoder — quadrature quarter-steps, ±1 per detent.
        let clk = hw_init::gpio_read(pins::ROTARY_CLK_GPIO);
        let dt = hw_init::gpio_read(pins::ROTARY_DT_GPIO);
        let delta = rotary.sample(clk, dt);
        if delta != 0 {
            lamp.handle_rotary(delta, &mut hw, &mut sink);
        }

        // Button gestures.
        let raw = hw_init::gpio_read(pins::BUTTON_GPIO);
        if let Some(gesture) = button.sample(raw, now_ms as u32) {
            lamp.handle_click(gesture, now_ms, &mut hw, &mut sink);
        }

        // Inbound remote messages.
        while let Some(msg) = source.poll() {
            lamp.handle_message(&msg, &mut clock, &mut hw, &mut sink);
        }

        // Schedule evaluation, elapsed-time gated.
        if now_ms.saturating_sub(last_schedule_tick_ms) >= u64::from(config.schedule_interval_ms)
        {
            last_schedule_tick_ms = now_ms;
            lamp.tick_schedule(clock.minutes_since_midnight(), &mut hw, &mut sink);
        }
    }
}

/// Plain stderr logging for host-side runs.
#[cfg(not(target_os = "espidf"))]
fn env_logger_fallback() {
    struct StderrLog;
    impl log::Log for StderrLog {
        fn enabled(&self, _m: &log::Metadata) -> bool {
            true
        }
        fn log(&self, record: &log::Record) {
            eprintln!("{} - {}", record.level(), record.args());
        }
        fn flush(&self) {}
    }
    static LOGGER: StderrLog = StderrLog;
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Info);
}
