//! Mock adapters for integration tests.
//!
//! Records every PWM write and every emitted event so tests can assert
//! on the full history without touching real GPIO/LEDC registers.

use circadian_light::app::events::LampEvent;
use circadian_light::app::ports::{ClockError, ClockPort, EventSink, LampPort};

// ── MockLamp ──────────────────────────────────────────────────

/// Lamp port that records every duty write and delay.
pub struct MockLamp {
    pub writes: Vec<(u8, u8)>,
    pub delays: Vec<u32>,
    current: (u8, u8),
}

#[allow(dead_code)]
impl MockLamp {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            delays: Vec::new(),
            current: (15, 15),
        }
    }

    pub fn last_write(&self) -> Option<(u8, u8)> {
        self.writes.last().copied()
    }

    /// True when the last write left both channels at the off duty.
    pub fn is_dark(&self) -> bool {
        self.current == (15, 15)
    }
}

impl Default for MockLamp {
    fn default() -> Self {
        Self::new()
    }
}

impl LampPort for MockLamp {
    fn set_channels(&mut self, warm: u8, white: u8) {
        self.current = (warm, white);
        self.writes.push((warm, white));
    }

    fn channels(&self) -> (u8, u8) {
        self.current
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Event sink that keeps every emitted event.
pub struct RecordingSink {
    pub events: Vec<LampEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn snapshots(&self) -> Vec<&circadian_light::app::events::StateSnapshot> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LampEvent::State(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn last_snapshot(&self) -> Option<&circadian_light::app::events::StateSnapshot> {
        self.snapshots().last().copied()
    }

    pub fn sync_responses(&self) -> Vec<&circadian_light::app::events::SyncResponse> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LampEvent::SyncResponse(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &LampEvent) {
        self.events.push(event.clone());
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Clock with a directly settable minute-of-day reading.
pub struct MockClock {
    pub minutes: Option<u16>,
    pub reject_set: bool,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self {
            minutes: None,
            reject_set: false,
        }
    }

    pub fn at(minutes: u16) -> Self {
        Self {
            minutes: Some(minutes),
            reject_set: false,
        }
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for MockClock {
    fn minutes_since_midnight(&self) -> Option<u16> {
        self.minutes
    }

    fn set_epoch_ms(&mut self, epoch_ms: i64) -> Result<(), ClockError> {
        if self.reject_set || epoch_ms < 1_577_836_800_000 {
            return Err(ClockError::InvalidTimestamp);
        }
        let minute_of_day = (epoch_ms / 60_000).rem_euclid(1440);
        self.minutes = Some(minute_of_day as u16);
        Ok(())
    }
}
