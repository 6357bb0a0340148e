//! Lamp service — the authority arbiter.
//!
//! [`LampService`] owns every piece of mutable state: the lamp state, the
//! schedule store, the two automation slots, the suppression windows and
//! the sun-sync flags. Handlers take it by exclusive reference, which is
//! what upholds the single-writer invariant — the loop stays
//! single-threaded, so no locking is needed; if tasks are ever introduced,
//! this struct becomes the lock boundary as one atomic unit.
//!
//! ```text
//!  rotary / button ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  remote messages ──▶ │        LampService        │
//!  schedule tick   ──▶ │  arbiter · override ·     │ ──▶ LampPort
//!                      │  suppression · store      │
//!                      └──────────────────────────┘
//! ```
//!
//! Authority order, highest first: hardware override (triple-click),
//! routine, alarm, sun-sync. While any automation source is active the
//! dial and single/double clicks are ignored; remote commands are not.

use core::fmt::Write as _;

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::drivers::button::ClickEvent;
use crate::output::{compute_channels, LampState, Mode, BRIGHTNESS_MAX, CHANNEL_OFF};
use crate::schedule::{check_id, Alarm, Routine, ScheduleError, ScheduleStore};

use super::commands::Message;
use super::events::{LampEvent, OverrideReport, Source, StateSnapshot, SyncKind, SyncResponse};
use super::ports::{ClockPort, EventSink, LampPort};

/// Duty written during the blink on-phase when the lamp was off before the
/// override — a gentle pulse instead of full blast.
const BLINK_PULSE_DUTY: u8 = 12;

// ───────────────────────────────────────────────────────────────
// Automation slot
// ───────────────────────────────────────────────────────────────

/// Live bookkeeping for one automation kind (routine or alarm).
///
/// `saved_state` captures the manual state at automation start. Neither
/// automation kind restores it on end (routines keep their final state,
/// alarms lock in full daytime brightness).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutomationSlot {
    pub active: bool,
    pub active_id: Option<u16>,
    pub last_applied_minute: Option<u16>,
    pub saved_state: Option<LampState>,
}

impl AutomationSlot {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ───────────────────────────────────────────────────────────────
// LampService
// ───────────────────────────────────────────────────────────────

/// The lamp core. See module docs for the authority model.
pub struct LampService {
    config: SystemConfig,
    state: LampState,
    store: ScheduleStore,

    routine_slot: AutomationSlot,
    alarm_slot: AutomationSlot,

    /// Suppression windows: a captured definition whose configured window
    /// vetoes re-application until the window elapses. There is no explicit
    /// un-suppress — expiry is purely time-based.
    suppressed_routine: Option<Routine>,
    suppressed_alarm: Option<Alarm>,

    sun_sync_active: bool,
    sun_sync_disabled_by_hw: bool,

    /// Consecutive schedule ticks without a clock reading, for rate-limited
    /// degraded-mode reporting.
    no_clock_ticks: u32,
}

impl LampService {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            config,
            state: LampState::default(),
            store: ScheduleStore::new(),
            routine_slot: AutomationSlot::default(),
            alarm_slot: AutomationSlot::default(),
            suppressed_routine: None,
            suppressed_alarm: None,
            sun_sync_active: false,
            sun_sync_disabled_by_hw: false,
            no_clock_ticks: 0,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> &LampState {
        &self.state
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    /// Dial and single/double clicks are ignored while any automation
    /// source is active; only the triple-click override stays live.
    pub fn manual_control_locked(&self) -> bool {
        self.routine_slot.active || self.alarm_slot.active || self.sun_sync_active
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            brightness: self.state.brightness,
            mode: self.state.mode as u8,
            on: self.state.is_on,
            routine_active: self.routine_slot.active,
            alarm_active: self.alarm_slot.active,
            sun_sync_active: self.sun_sync_active,
            routine_suppressed: self.suppressed_routine.is_some(),
            alarm_suppressed: self.suppressed_alarm.is_some(),
            sun_sync_disabled_by_hw: self.sun_sync_disabled_by_hw,
            manual_control_locked: self.manual_control_locked(),
        }
    }

    // ── Output + publish ──────────────────────────────────────

    /// Recompute channel duties from the current state and drive them out.
    pub fn apply_output(&self, hw: &mut impl LampPort) {
        let (warm, white) = compute_channels(self.state.is_on, self.state.brightness, self.state.mode);
        debug!(
            "apply_output: on={} mode={:?} brightness={} -> warm={} white={}",
            self.state.is_on, self.state.mode, self.state.brightness, warm, white
        );
        hw.set_channels(warm, white);
    }

    /// Emit a full state snapshot to every observer.
    pub fn publish_state(&self, sink: &mut impl EventSink) {
        sink.emit(&LampEvent::State(self.snapshot()));
    }

    // ── Manual input ──────────────────────────────────────────

    /// One encoder detent = one brightness unit. Clamped to `[1, 15]`
    /// while on (zero is reachable only while off).
    pub fn handle_rotary(&mut self, delta: i8, hw: &mut impl LampPort, sink: &mut impl EventSink) {
        if delta == 0 {
            return;
        }
        if self.manual_control_locked() {
            info!("rotary input ignored: schedule or sun sync currently active");
            return;
        }

        let min = i16::from(self.state.is_on);
        let next = (i16::from(self.state.brightness) + i16::from(delta))
            .clamp(min, i16::from(BRIGHTNESS_MAX)) as u8;
        if next != self.state.brightness {
            self.state.brightness = next;
            info!("rotary: brightness -> {}", next);
            self.apply_output(hw);
            self.publish_state(sink);
        }
    }

    /// Classified button gesture. Single toggles power, double cycles the
    /// mode — both subject to the manual lock. Triple is the override path
    /// and always goes through.
    pub fn handle_click(
        &mut self,
        event: ClickEvent,
        now_ms: u64,
        hw: &mut impl LampPort,
        sink: &mut impl EventSink,
    ) {
        match event {
            ClickEvent::TripleOrMore => self.trigger_override(now_ms, hw, sink),
            ClickEvent::Single => {
                if self.manual_control_locked() {
                    info!("single click ignored: schedule or sun sync active");
                    return;
                }
                self.state.is_on = !self.state.is_on;
                info!("single click: on -> {}", self.state.is_on);
                self.apply_output(hw);
                self.publish_state(sink);
            }
            ClickEvent::Double => {
                if self.manual_control_locked() {
                    info!("double click ignored: schedule or sun sync active");
                    return;
                }
                self.state.mode = self.state.mode.next();
                info!("double click: mode -> {:?}", self.state.mode);
                self.apply_output(hw);
                self.publish_state(sink);
            }
        }
    }

    // ── Remote messages ───────────────────────────────────────

    pub fn handle_message(
        &mut self,
        msg: &Message,
        clock: &mut impl ClockPort,
        hw: &mut impl LampPort,
        sink: &mut impl EventSink,
    ) {
        match msg {
            Message::DirectSet {
                brightness,
                mode,
                on,
            } => self.handle_direct_set(*brightness, *mode, *on, hw),

            Message::StateRequest => self.publish_state(sink),

            Message::RoutineUpsert(payload) => {
                let result = self.store.upsert_routine(payload);
                self.sync_result(sink, SyncKind::Routine, result, "Routine synced successfully");
            }

            Message::RoutineDelete { id } => {
                let result = check_id(*id)
                    .map_err(ScheduleError::Invalid)
                    .and_then(|id| self.store.delete_routine(id));
                self.sync_result(sink, SyncKind::Routine, result, "Routine deleted");
            }

            Message::AlarmUpsert(payload) => {
                let result = self.store.upsert_alarm(payload);
                self.sync_result(sink, SyncKind::Alarm, result, "Alarm synced successfully");
            }

            Message::AlarmDelete { id } => {
                let result = check_id(*id)
                    .map_err(ScheduleError::Invalid)
                    .and_then(|id| self.store.delete_alarm(id));
                self.sync_result(sink, SyncKind::Alarm, result, "Alarm deleted");
            }

            Message::FullSync { routines, alarms } => {
                let report = self.store.full_replace(routines, alarms);
                let mut message: heapless::String<96> = heapless::String::new();
                if report.success() {
                    let _ = write!(
                        message,
                        "Full sync complete: {} routine(s), {} alarm(s)",
                        report.routines_loaded, report.alarms_loaded
                    );
                } else {
                    let _ = write!(
                        message,
                        "{} routine(s) skipped, {} alarm(s) skipped",
                        report.routines_skipped, report.alarms_skipped
                    );
                }
                self.sync_response(sink, SyncKind::Full, report.success(), &message);
            }

            Message::TimeSync { timestamp_ms } => match clock.set_epoch_ms(*timestamp_ms) {
                Ok(()) => {
                    info!("time sync: clock set from epoch {} ms", timestamp_ms);
                    self.sync_response(sink, SyncKind::Time, true, "Time synchronized");
                }
                Err(e) => {
                    warn!("time sync rejected: {}", e);
                    self.sync_response(sink, SyncKind::Time, false, "Invalid time data");
                }
            },

            Message::SunSyncState { active, source } => {
                let previous = self.sun_sync_active;
                self.sun_sync_active = *active;
                if *active {
                    self.sun_sync_disabled_by_hw = false;
                } else {
                    self.sun_sync_disabled_by_hw = *source == Source::Hardware;
                }
                info!("sun sync updated by {:?} -> {}", source, active);
                if previous != self.sun_sync_active {
                    self.publish_state(sink);
                }
            }
        }
    }

    /// Direct state set from the remote application. Exempt from the
    /// manual lock (the app is trusted to coordinate), but brightness is
    /// still clamped and floored. Deliberately does **not** publish a
    /// snapshot — the change came from the app, and echoing it back would
    /// loop. Automation-flag changes still publish via their own paths.
    fn handle_direct_set(
        &mut self,
        brightness: Option<i64>,
        mode: Option<i64>,
        on: Option<bool>,
        hw: &mut impl LampPort,
    ) {
        let mut changed = false;

        if let Some(raw) = brightness {
            let mut next = raw.clamp(0, i64::from(BRIGHTNESS_MAX)) as u8;
            if self.state.is_on && next < 1 {
                next = 1;
            }
            if next != self.state.brightness {
                self.state.brightness = next;
                changed = true;
                info!("remote: brightness -> {}", next);
            }
        }

        if let Some(raw) = mode {
            if let Some(next) = Mode::from_raw(raw.clamp(0, 2)) {
                if next != self.state.mode {
                    self.state.mode = next;
                    changed = true;
                    info!("remote: mode -> {:?}", next);
                }
            }
        }

        if let Some(next) = on {
            if next != self.state.is_on {
                self.state.is_on = next;
                changed = true;
                info!("remote: on -> {}", next);
            }
        }

        if changed {
            self.apply_output(hw);
        }
    }

    fn sync_result(
        &self,
        sink: &mut impl EventSink,
        kind: SyncKind,
        result: Result<(), ScheduleError>,
        ok_message: &str,
    ) {
        match result {
            Ok(()) => self.sync_response(sink, kind, true, ok_message),
            Err(ScheduleError::StorageFull) => {
                self.sync_response(sink, kind, false, "Storage full");
            }
            Err(ScheduleError::NotFound) => {
                let noun = match kind {
                    SyncKind::Alarm => "Alarm not found",
                    _ => "Routine not found",
                };
                self.sync_response(sink, kind, false, noun);
            }
            Err(ScheduleError::Invalid(reason)) => self.sync_response(sink, kind, false, reason),
        }
    }

    fn sync_response(&self, sink: &mut impl EventSink, kind: SyncKind, success: bool, text: &str) {
        let mut message: heapless::String<96> = heapless::String::new();
        let _ = message.push_str(&text[..text.len().min(95)]);
        sink.emit(&LampEvent::SyncResponse(SyncResponse {
            kind,
            success,
            message,
        }));
    }

    // ── Schedule tick (the arbiter) ───────────────────────────

    /// Evaluate routines and alarms for the current minute. `now_min` is
    /// minutes since local midnight, or `None` when no valid time exists —
    /// then the tick no-ops with rate-limited diagnostics.
    ///
    /// Routine preempts alarm: alarms are only evaluated when no routine
    /// is active. A suppressed routine/alarm matching the current window
    /// ends the whole pass for that tick (deliberate early return).
    pub fn tick_schedule(
        &mut self,
        now_min: Option<u16>,
        hw: &mut impl LampPort,
        sink: &mut impl EventSink,
    ) {
        let Some(now) = now_min else {
            let warn_every = (self.config.clock_warn_interval_secs * 1000
                / self.config.schedule_interval_ms)
                .max(1);
            if self.no_clock_ticks % warn_every == 0 {
                warn!("schedule: no valid time available, skipping evaluation");
            }
            self.no_clock_ticks = self.no_clock_ticks.wrapping_add(1);
            return;
        };
        self.no_clock_ticks = 0;

        self.update_suppression_windows(now);

        if self.tick_routines(now, hw, sink) {
            return;
        }

        // Alarms only run when no routine holds the channel.
        if !self.routine_slot.active {
            self.tick_alarms(now, hw, sink);
        }
    }

    /// Returns true when the routine pass consumed the tick (matched,
    /// suppressed, or ended a routine).
    fn tick_routines(
        &mut self,
        now: u16,
        hw: &mut impl LampPort,
        sink: &mut impl EventSink,
    ) -> bool {
        for idx in 0..self.store.routines().len() {
            let routine = self.store.routines()[idx];
            if !routine.enabled || !routine.contains(now) {
                continue;
            }

            if let Some(suppressed) = &self.suppressed_routine {
                if suppressed.id == routine.id {
                    // Suppression vetoes the whole routine channel for this
                    // tick, not just this id.
                    debug!("routine {} suppressed for current window", routine.id);
                    return true;
                }
            }

            let fresh = !self.routine_slot.active
                || self.routine_slot.active_id != Some(routine.id);
            let minute_advanced = self.routine_slot.last_applied_minute != Some(now);
            if fresh || minute_advanced {
                if !self.routine_slot.active {
                    self.routine_slot.saved_state = Some(self.state);
                    info!(
                        "routine {} starting: saved state on={} brightness={} mode={:?}",
                        routine.id, self.state.is_on, self.state.brightness, self.state.mode
                    );
                }
                self.routine_slot.active = true;
                self.routine_slot.active_id = Some(routine.id);
                self.routine_slot.last_applied_minute = Some(now);

                self.state.brightness = routine.brightness;
                self.state.mode = routine.mode;
                self.state.is_on = true;
                info!(
                    "routine {} applied: brightness={} mode={:?}",
                    routine.id, routine.brightness, routine.mode
                );
                self.apply_output(hw);
                self.publish_state(sink);
            }
            // First match wins; overlap resolution is storage order.
            return true;
        }

        if self.routine_slot.active {
            // No restore: routines leave a lasting effect by design.
            info!(
                "routine {:?} ended: keeping on={} brightness={} mode={:?}",
                self.routine_slot.active_id,
                self.state.is_on,
                self.state.brightness,
                self.state.mode
            );
            self.routine_slot.clear();
            self.publish_state(sink);
            return true;
        }

        false
    }

    fn tick_alarms(&mut self, now: u16, hw: &mut impl LampPort, sink: &mut impl EventSink) {
        for idx in 0..self.store.alarms().len() {
            let alarm = self.store.alarms()[idx];
            if !alarm.enabled || !alarm.contains(now) {
                continue;
            }

            if let Some(suppressed) = &self.suppressed_alarm {
                if suppressed.id == alarm.id {
                    debug!("alarm {} suppressed for current window", alarm.id);
                    return;
                }
            }

            let fresh =
                !self.alarm_slot.active || self.alarm_slot.active_id != Some(alarm.id);
            let minute_advanced = self.alarm_slot.last_applied_minute != Some(now);
            if fresh || minute_advanced {
                if !self.alarm_slot.active {
                    self.alarm_slot.saved_state = Some(self.state);
                    info!(
                        "alarm {} starting: saved state on={} brightness={}",
                        alarm.id, self.state.is_on, self.state.brightness
                    );
                }
                self.alarm_slot.active = true;
                self.alarm_slot.active_id = Some(alarm.id);
                self.alarm_slot.last_applied_minute = Some(now);

                // Sunrise ramp: 0 → 15 over the configured duration, both
                // channels together. Recomputed each minute while matched.
                let elapsed = now.saturating_sub(alarm.start.minutes());
                let progress =
                    (f32::from(elapsed) / f32::from(alarm.duration_minutes)).clamp(0.0, 1.0);
                self.state.brightness = (progress * f32::from(BRIGHTNESS_MAX)).round() as u8;
                self.state.mode = Mode::Both;
                self.state.is_on = true;
                info!(
                    "alarm {} progress {:.2}: brightness={}",
                    alarm.id, progress, self.state.brightness
                );
                self.apply_output(hw);
                self.publish_state(sink);
            }
            return;
        }

        if self.alarm_slot.active {
            // Lock in the daytime end-state regardless of what preceded the
            // alarm. Differs from routine end on purpose.
            info!(
                "alarm {:?} ended: locking on=true brightness=15 mode=Both",
                self.alarm_slot.active_id
            );
            self.state = LampState {
                is_on: true,
                brightness: BRIGHTNESS_MAX,
                mode: Mode::Both,
            };
            self.alarm_slot.clear();
            self.apply_output(hw);
            self.publish_state(sink);
        }
    }

    /// Clear any suppression whose source window has elapsed. Runs first
    /// in every schedule tick; there is no other way out of suppression.
    fn update_suppression_windows(&mut self, now: u16) {
        if let Some(routine) = &self.suppressed_routine {
            if !routine.contains(now) {
                info!("routine {} suppression window ended", routine.id);
                self.suppressed_routine = None;
            }
        }
        if let Some(alarm) = &self.suppressed_alarm {
            if !alarm.suppression_window_contains(now) {
                info!("alarm {} suppression window ended", alarm.id);
                self.suppressed_alarm = None;
            }
        }
    }

    // ── Hardware override ─────────────────────────────────────

    /// Triple-click: suspend whatever automation is active for its current
    /// window, acknowledge visually, and broadcast the override.
    fn trigger_override(&mut self, now_ms: u64, hw: &mut impl LampPort, sink: &mut impl EventSink) {
        let routine_was_active = self.routine_slot.active;
        let alarm_was_active = self.alarm_slot.active;
        let sun_sync_was_active = self.sun_sync_active;

        info!("triple click: disabling active schedules for current window");

        if self.routine_slot.active {
            match self
                .routine_slot
                .active_id
                .and_then(|id| self.store.find_routine(id))
            {
                Some(routine) => {
                    info!("routine {} suppressed for current window", routine.id);
                    self.suppressed_routine = Some(*routine);
                }
                None => {
                    // Active id no longer resolves (deleted mid-window).
                    // Nothing to suppress; recover and carry on.
                    warn!("active routine id not found for suppression");
                    self.suppressed_routine = None;
                }
            }
            self.routine_slot.clear();
        }

        if self.alarm_slot.active {
            match self
                .alarm_slot
                .active_id
                .and_then(|id| self.store.find_alarm(id))
            {
                Some(alarm) => {
                    info!("alarm {} suppressed for current window", alarm.id);
                    self.suppressed_alarm = Some(*alarm);
                }
                None => {
                    warn!("active alarm id not found for suppression");
                    self.suppressed_alarm = None;
                }
            }
            self.alarm_slot.clear();
        }

        if self.sun_sync_active {
            self.sun_sync_active = false;
            self.sun_sync_disabled_by_hw = true;
            sink.emit(&LampEvent::SunSync {
                active: false,
                source: Source::Hardware,
                timestamp_ms: now_ms,
            });
        }

        if routine_was_active || alarm_was_active || sun_sync_was_active {
            self.blink(hw);
        } else {
            info!("triple click with no active routine/alarm/sun sync");
        }

        self.apply_output(hw);
        self.publish_state(sink);
        sink.emit(&LampEvent::Override(OverrideReport {
            source: Source::Hardware,
            timestamp_ms: now_ms,
            routine_disabled: routine_was_active,
            alarm_disabled: alarm_was_active,
            sun_sync_disabled: sun_sync_was_active,
            routine_suppressed: self.suppressed_routine.is_some(),
            alarm_suppressed: self.suppressed_alarm.is_some(),
            sun_sync_active: self.sun_sync_active,
        }));
    }

    /// Visual acknowledgment: N off/on cycles, then restore. Blocks the
    /// loop for `count × 2 × interval_ms` — bounded and accepted.
    fn blink(&self, hw: &mut impl LampPort) {
        let (saved_warm, saved_white) = hw.channels();
        let was_on = self.state.is_on;

        for _ in 0..self.config.override_blink_count {
            hw.set_channels(CHANNEL_OFF, CHANNEL_OFF);
            hw.delay_ms(self.config.override_blink_interval_ms);

            if was_on {
                hw.set_channels(saved_warm, saved_white);
            } else {
                hw.set_channels(BLINK_PULSE_DUTY, BLINK_PULSE_DUTY);
            }
            hw.delay_ms(self.config.override_blink_interval_ms);
        }
    }
}
