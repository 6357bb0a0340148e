//! Schedule arbiter flows: routine lifecycle, alarm ramps, preemption,
//! and the suppression windows opened by the hardware override.

use circadian_light::app::commands::Message;
use circadian_light::app::service::LampService;
use circadian_light::config::SystemConfig;
use circadian_light::drivers::button::ClickEvent;
use circadian_light::output::Mode;
use circadian_light::schedule::{AlarmPayload, RoutinePayload};

use crate::mock_hw::{MockClock, MockLamp, RecordingSink};

fn evening_routine(id: i64) -> RoutinePayload {
    RoutinePayload {
        id,
        enabled: true,
        start_hour: 18,
        start_minute: 0,
        end_hour: 22,
        end_minute: 30,
        brightness: 8,
        mode: 0, // warm
    }
}

fn sunrise_alarm(id: i64) -> AlarmPayload {
    AlarmPayload {
        id,
        enabled: true,
        start_hour: 6,
        start_minute: 30,
        wake_hour: 7,
        wake_minute: 0,
        duration_minutes: 30,
    }
}

fn setup(routines: &[RoutinePayload], alarms: &[AlarmPayload]) -> (LampService, MockLamp, RecordingSink) {
    let mut svc = LampService::new(SystemConfig::default());
    let mut hw = MockLamp::new();
    let mut sink = RecordingSink::new();
    let mut clock = MockClock::new();
    for r in routines {
        svc.handle_message(
            &Message::RoutineUpsert(r.clone()),
            &mut clock,
            &mut hw,
            &mut sink,
        );
    }
    for a in alarms {
        svc.handle_message(
            &Message::AlarmUpsert(a.clone()),
            &mut clock,
            &mut hw,
            &mut sink,
        );
    }
    hw.writes.clear();
    sink.clear();
    (svc, hw, sink)
}

// ── Routine lifecycle ─────────────────────────────────────────

#[test]
fn routine_applies_inside_window_and_locks_manual() {
    let (mut svc, mut hw, mut sink) = setup(&[evening_routine(1)], &[]);

    svc.tick_schedule(Some(18 * 60), &mut hw, &mut sink);
    assert!(svc.state().is_on);
    assert_eq!(svc.state().brightness, 8);
    assert_eq!(svc.state().mode, Mode::Warm);
    assert!(svc.manual_control_locked());
    assert_eq!(hw.last_write(), Some((7, 15)));

    // Manual input is rejected while the routine holds the lamp.
    svc.handle_rotary(1, &mut hw, &mut sink);
    svc.handle_click(ClickEvent::Single, 1000, &mut hw, &mut sink);
    assert_eq!(svc.state().brightness, 8);
    assert!(svc.state().is_on);
}

#[test]
fn routine_reasserts_once_per_minute() {
    let (mut svc, mut hw, mut sink) = setup(&[evening_routine(1)], &[]);

    svc.tick_schedule(Some(18 * 60), &mut hw, &mut sink);
    let writes_after_first = hw.writes.len();

    // Same minute again: nothing new.
    svc.tick_schedule(Some(18 * 60), &mut hw, &mut sink);
    assert_eq!(hw.writes.len(), writes_after_first);

    // Next minute: reasserted.
    svc.tick_schedule(Some(18 * 60 + 1), &mut hw, &mut sink);
    assert!(hw.writes.len() > writes_after_first);
}

#[test]
fn routine_end_keeps_final_state() {
    let (mut svc, mut hw, mut sink) = setup(&[evening_routine(1)], &[]);

    svc.tick_schedule(Some(22 * 60), &mut hw, &mut sink);
    assert!(svc.manual_control_locked());

    svc.tick_schedule(Some(22 * 60 + 31), &mut hw, &mut sink);
    // No restore: the routine's output outlives its window.
    assert!(!svc.manual_control_locked());
    assert!(svc.state().is_on);
    assert_eq!(svc.state().brightness, 8);
    assert_eq!(svc.state().mode, Mode::Warm);
    let snap = sink.last_snapshot().expect("end snapshot");
    assert!(!snap.routine_active);
}

#[test]
fn disabled_routines_never_match() {
    let mut routine = evening_routine(1);
    routine.enabled = false;
    let (mut svc, mut hw, mut sink) = setup(&[routine], &[]);
    svc.tick_schedule(Some(18 * 60), &mut hw, &mut sink);
    assert!(!svc.manual_control_locked());
    assert!(hw.writes.is_empty());
}

#[test]
fn first_routine_in_storage_order_wins_overlap() {
    let mut second = evening_routine(2);
    second.brightness = 2;
    let (mut svc, mut hw, mut sink) = setup(&[evening_routine(1), second], &[]);
    svc.tick_schedule(Some(19 * 60), &mut hw, &mut sink);
    assert_eq!(svc.state().brightness, 8);
}

#[test]
fn wrapping_routine_window_spans_midnight() {
    let mut night = evening_routine(1);
    night.start_hour = 22;
    night.start_minute = 0;
    night.end_hour = 6;
    night.end_minute = 0;
    let (mut svc, mut hw, mut sink) = setup(&[night], &[]);

    svc.tick_schedule(Some(23 * 60), &mut hw, &mut sink);
    assert!(svc.manual_control_locked());

    // Still matched after midnight.
    svc.tick_schedule(Some(3 * 60), &mut hw, &mut sink);
    assert!(svc.manual_control_locked());

    // Out of the window by mid-morning.
    svc.tick_schedule(Some(10 * 60), &mut hw, &mut sink);
    assert!(!svc.manual_control_locked());
}

// ── Alarm ramp ────────────────────────────────────────────────

#[test]
fn alarm_ramps_brightness_over_duration() {
    let (mut svc, mut hw, mut sink) = setup(&[], &[sunrise_alarm(1)]);

    svc.tick_schedule(Some(6 * 60 + 30), &mut hw, &mut sink);
    assert_eq!(svc.state().brightness, 0);
    assert!(svc.state().is_on);
    assert_eq!(svc.state().mode, Mode::Both);

    svc.tick_schedule(Some(6 * 60 + 45), &mut hw, &mut sink);
    assert_eq!(svc.state().brightness, 8); // round(0.5 * 15)

    svc.tick_schedule(Some(7 * 60), &mut hw, &mut sink);
    assert_eq!(svc.state().brightness, 15);
}

#[test]
fn alarm_end_locks_full_daytime_state() {
    let (mut svc, mut hw, mut sink) = setup(&[], &[sunrise_alarm(1)]);

    svc.tick_schedule(Some(6 * 60 + 40), &mut hw, &mut sink);
    assert!(svc.manual_control_locked());

    svc.tick_schedule(Some(7 * 60 + 1), &mut hw, &mut sink);
    assert!(!svc.manual_control_locked());
    assert!(svc.state().is_on);
    assert_eq!(svc.state().brightness, 15);
    assert_eq!(svc.state().mode, Mode::Both);
    assert_eq!(hw.last_write(), Some((0, 0)));
}

#[test]
fn routine_preempts_overlapping_alarm() {
    let mut routine = evening_routine(1);
    routine.start_hour = 6;
    routine.start_minute = 0;
    routine.end_hour = 8;
    routine.end_minute = 0;
    let (mut svc, mut hw, mut sink) = setup(&[routine], &[sunrise_alarm(1)]);

    svc.tick_schedule(Some(6 * 60 + 45), &mut hw, &mut sink);
    // The routine wins; alarm never starts.
    assert_eq!(svc.state().brightness, 8);
    assert_eq!(svc.state().mode, Mode::Warm);
    let snap = svc.snapshot();
    assert!(snap.routine_active);
    assert!(!snap.alarm_active);
}

// ── Hardware override + suppression ───────────────────────────

#[test]
fn override_suppresses_routine_for_current_window() {
    let (mut svc, mut hw, mut sink) = setup(&[evening_routine(1)], &[]);

    svc.tick_schedule(Some(19 * 60), &mut hw, &mut sink);
    assert!(svc.manual_control_locked());

    svc.handle_click(ClickEvent::TripleOrMore, 9000, &mut hw, &mut sink);
    assert!(!svc.manual_control_locked());
    assert!(svc.snapshot().routine_suppressed);

    // Later ticks inside the same window must not re-apply.
    let brightness = svc.state().brightness;
    svc.handle_rotary(-3, &mut hw, &mut sink);
    let dimmed = svc.state().brightness;
    assert!(dimmed < brightness);
    svc.tick_schedule(Some(19 * 60 + 1), &mut hw, &mut sink);
    svc.tick_schedule(Some(20 * 60), &mut hw, &mut sink);
    assert_eq!(svc.state().brightness, dimmed);
    assert!(!svc.manual_control_locked());
}

#[test]
fn suppressed_routine_vetoes_all_routines_for_the_tick() {
    // Two overlapping routines; the suppressed one sits first in
    // storage order.
    let mut second = evening_routine(2);
    second.brightness = 3;
    let (mut svc, mut hw, mut sink) = setup(&[evening_routine(1), second], &[]);

    svc.tick_schedule(Some(19 * 60), &mut hw, &mut sink);
    assert_eq!(svc.state().brightness, 8);
    svc.handle_click(ClickEvent::TripleOrMore, 9000, &mut hw, &mut sink);
    assert!(svc.snapshot().routine_suppressed);
    hw.writes.clear();

    // Suppression blocks the whole routine channel, not just routine 1 —
    // routine 2 also matches but must not be applied.
    svc.tick_schedule(Some(19 * 60 + 1), &mut hw, &mut sink);
    assert!(!svc.snapshot().routine_active);
    assert_eq!(svc.state().brightness, 8);
    assert!(hw.writes.is_empty());
}

#[test]
fn suppression_expires_with_the_window() {
    let (mut svc, mut hw, mut sink) = setup(&[evening_routine(1)], &[]);

    svc.tick_schedule(Some(19 * 60), &mut hw, &mut sink);
    svc.handle_click(ClickEvent::TripleOrMore, 9000, &mut hw, &mut sink);
    assert!(svc.snapshot().routine_suppressed);

    // One tick past the end of the window clears the suppression.
    svc.tick_schedule(Some(22 * 60 + 31), &mut hw, &mut sink);
    assert!(!svc.snapshot().routine_suppressed);

    // The next occurrence of the window applies normally again.
    svc.tick_schedule(Some(18 * 60), &mut hw, &mut sink);
    assert!(svc.manual_control_locked());
    assert_eq!(svc.state().brightness, 8);
}

#[test]
fn suppressed_alarm_stays_quiet_until_wake_passes() {
    let (mut svc, mut hw, mut sink) = setup(&[], &[sunrise_alarm(1)]);

    svc.tick_schedule(Some(6 * 60 + 35), &mut hw, &mut sink);
    assert!(svc.snapshot().alarm_active);

    svc.handle_click(ClickEvent::TripleOrMore, 9000, &mut hw, &mut sink);
    assert!(svc.snapshot().alarm_suppressed);
    assert!(!svc.snapshot().alarm_active);

    let brightness = svc.state().brightness;
    svc.tick_schedule(Some(6 * 60 + 50), &mut hw, &mut sink);
    assert_eq!(svc.state().brightness, brightness);
    // No end-of-alarm lock fires for a suppressed alarm either.
    svc.tick_schedule(Some(7 * 60 + 1), &mut hw, &mut sink);
    assert!(!svc.snapshot().alarm_suppressed);
    assert_eq!(svc.state().brightness, brightness);
}

#[test]
fn override_event_reports_what_was_disabled() {
    use circadian_light::app::events::{LampEvent, Source};

    let (mut svc, mut hw, mut sink) = setup(&[evening_routine(1)], &[]);
    svc.tick_schedule(Some(19 * 60), &mut hw, &mut sink);
    sink.clear();

    svc.handle_click(ClickEvent::TripleOrMore, 9000, &mut hw, &mut sink);
    let report = sink
        .events
        .iter()
        .find_map(|e| match e {
            LampEvent::Override(r) => Some(r),
            _ => None,
        })
        .expect("override event");
    assert_eq!(report.source, Source::Hardware);
    assert_eq!(report.timestamp_ms, 9000);
    assert!(report.routine_disabled);
    assert!(!report.alarm_disabled);
    assert!(report.routine_suppressed);
}

// ── Degraded clock ────────────────────────────────────────────

#[test]
fn missing_clock_skips_evaluation_entirely() {
    let (mut svc, mut hw, mut sink) = setup(&[evening_routine(1)], &[]);
    for _ in 0..100 {
        svc.tick_schedule(None, &mut hw, &mut sink);
    }
    assert!(hw.writes.is_empty());
    assert!(sink.events.is_empty());
    assert!(!svc.manual_control_locked());
}

#[test]
fn routine_deleted_mid_window_ends_cleanly() {
    let (mut svc, mut hw, mut sink) = setup(&[evening_routine(1)], &[]);
    let mut clock = MockClock::at(19 * 60);

    svc.tick_schedule(Some(19 * 60), &mut hw, &mut sink);
    assert!(svc.manual_control_locked());

    svc.handle_message(
        &Message::RoutineDelete { id: 1 },
        &mut clock,
        &mut hw,
        &mut sink,
    );
    // With the definition gone, the next tick finds no match and the
    // routine ends without restoring anything.
    svc.tick_schedule(Some(19 * 60 + 1), &mut hw, &mut sink);
    assert!(!svc.manual_control_locked());
    assert_eq!(svc.state().brightness, 8);
}
