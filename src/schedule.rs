//! Routine/alarm definitions, field validation, and the bounded store.
//!
//! The store holds at most [`MAX_ROUTINES`] routines and [`MAX_ALARMS`]
//! alarms in `heapless` vectors (insertion order, compacted on delete).
//! Every record enters through payload validation: a violated range rejects
//! the whole item with a specific reason string, never a partial write.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::output::Mode;

/// Capacity of the routine store.
pub const MAX_ROUTINES: usize = 10;
/// Capacity of the alarm store.
pub const MAX_ALARMS: usize = 5;

// ---------------------------------------------------------------------------
// Time-of-day
// ---------------------------------------------------------------------------

/// Wall-clock time of day, minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    /// Minutes since midnight (0–1439).
    pub fn minutes(self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

/// Inclusive containment test for a daily window given in minutes since
/// midnight. `end < start` means the window wraps midnight.
///
/// Shared by routine matching, alarm suppression scoping, and
/// suppression-window expiry.
pub fn in_range(start_min: u16, end_min: u16, now_min: u16) -> bool {
    if end_min > start_min {
        now_min >= start_min && now_min <= end_min
    } else {
        now_min >= start_min || now_min <= end_min
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A recurring daily on-window with fixed brightness and mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub id: u16,
    pub enabled: bool,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub brightness: u8,
    pub mode: Mode,
}

impl Routine {
    /// Whether `now_min` falls inside this routine's window.
    pub fn contains(&self, now_min: u16) -> bool {
        in_range(self.start.minutes(), self.end.minutes(), now_min)
    }
}

/// A sunrise ramp from `start` to `wake`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: u16,
    pub enabled: bool,
    pub start: TimeOfDay,
    pub wake: TimeOfDay,
    pub duration_minutes: u16,
}

impl Alarm {
    /// Whether `now_min` falls inside `[start, wake]` (non-wrapping).
    pub fn contains(&self, now_min: u16) -> bool {
        now_min >= self.start.minutes() && now_min <= self.wake.minutes()
    }

    /// Suppression scope for this alarm — the same `[start, wake]` window,
    /// evaluated through the shared wrap-aware predicate.
    pub fn suppression_window_contains(&self, now_min: u16) -> bool {
        in_range(self.start.minutes(), self.wake.minutes(), now_min)
    }
}

// ---------------------------------------------------------------------------
// Wire payloads + validation
// ---------------------------------------------------------------------------

/// Raw routine fields as decoded from the remote application.
/// Presence and type are enforced by the deserializer; ranges are not.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutinePayload {
    pub id: i64,
    pub enabled: bool,
    pub start_hour: i64,
    pub start_minute: i64,
    pub end_hour: i64,
    pub end_minute: i64,
    pub brightness: i64,
    pub mode: i64,
}

/// Raw alarm fields as decoded from the remote application.
#[derive(Debug, Clone, Deserialize)]
pub struct AlarmPayload {
    pub id: i64,
    pub enabled: bool,
    pub start_hour: i64,
    pub start_minute: i64,
    pub wake_hour: i64,
    pub wake_minute: i64,
    pub duration_minutes: i64,
}

/// Shared id range check for upserts and delete-by-id frames.
pub fn check_id(raw: i64) -> Result<u16, &'static str> {
    if (0..=32767).contains(&raw) {
        Ok(raw as u16)
    } else {
        Err("id out of range (0-32767)")
    }
}

fn check_time(hour: i64, minute: i64, what: &'static str) -> Result<TimeOfDay, &'static str> {
    if !(0..=23).contains(&hour) {
        return Err(match what {
            "start" => "start hour out of range (0-23)",
            "end" => "end hour out of range (0-23)",
            _ => "wake hour out of range (0-23)",
        });
    }
    if !(0..=59).contains(&minute) {
        return Err(match what {
            "start" => "start minute out of range (0-59)",
            "end" => "end minute out of range (0-59)",
            _ => "wake minute out of range (0-59)",
        });
    }
    Ok(TimeOfDay {
        hour: hour as u8,
        minute: minute as u8,
    })
}

impl RoutinePayload {
    /// Validate every field and produce a store-ready [`Routine`].
    pub fn validate(&self) -> Result<Routine, &'static str> {
        let id = check_id(self.id)?;
        let start = check_time(self.start_hour, self.start_minute, "start")?;
        let end = check_time(self.end_hour, self.end_minute, "end")?;
        if !(0..=15).contains(&self.brightness) {
            return Err("brightness out of range (0-15)");
        }
        let mode = Mode::from_raw(self.mode).ok_or("mode out of range (0-2)")?;
        Ok(Routine {
            id,
            enabled: self.enabled,
            start,
            end,
            brightness: self.brightness as u8,
            mode,
        })
    }
}

impl AlarmPayload {
    /// Validate every field and produce a store-ready [`Alarm`].
    pub fn validate(&self) -> Result<Alarm, &'static str> {
        let id = check_id(self.id)?;
        let start = check_time(self.start_hour, self.start_minute, "start")?;
        let wake = check_time(self.wake_hour, self.wake_minute, "wake")?;
        if !(1..=240).contains(&self.duration_minutes) {
            return Err("duration out of range (1-240)");
        }
        Ok(Alarm {
            id,
            enabled: self.enabled,
            start,
            wake,
            duration_minutes: self.duration_minutes as u16,
        })
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Errors from store mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// A field failed range validation; carries the reason.
    Invalid(&'static str),
    /// Insert would exceed the fixed capacity.
    StorageFull,
    /// Delete target does not exist.
    NotFound,
}

impl core::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Invalid(reason) => write!(f, "{}", reason),
            Self::StorageFull => write!(f, "storage full"),
            Self::NotFound => write!(f, "not found"),
        }
    }
}

/// Outcome of a [`ScheduleStore::full_replace`] batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FullSyncReport {
    pub routines_loaded: usize,
    pub routines_skipped: usize,
    pub alarms_loaded: usize,
    pub alarms_skipped: usize,
}

impl FullSyncReport {
    /// The batch succeeded only if no item was skipped.
    pub fn success(&self) -> bool {
        self.routines_skipped == 0 && self.alarms_skipped == 0
    }
}

/// Bounded collections of routines and alarms, keyed by id.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    routines: Vec<Routine, MAX_ROUTINES>,
    alarms: Vec<Alarm, MAX_ALARMS>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a routine by id.
    pub fn upsert_routine(&mut self, payload: &RoutinePayload) -> Result<(), ScheduleError> {
        let routine = payload.validate().map_err(ScheduleError::Invalid)?;
        if let Some(existing) = self.routines.iter_mut().find(|r| r.id == routine.id) {
            *existing = routine;
            return Ok(());
        }
        self.routines
            .push(routine)
            .map_err(|_| ScheduleError::StorageFull)
    }

    /// Remove a routine by id, compacting insertion order.
    pub fn delete_routine(&mut self, id: u16) -> Result<(), ScheduleError> {
        let idx = self
            .routines
            .iter()
            .position(|r| r.id == id)
            .ok_or(ScheduleError::NotFound)?;
        self.routines.remove(idx);
        Ok(())
    }

    /// Insert or overwrite an alarm by id.
    pub fn upsert_alarm(&mut self, payload: &AlarmPayload) -> Result<(), ScheduleError> {
        let alarm = payload.validate().map_err(ScheduleError::Invalid)?;
        if let Some(existing) = self.alarms.iter_mut().find(|a| a.id == alarm.id) {
            *existing = alarm;
            return Ok(());
        }
        self.alarms
            .push(alarm)
            .map_err(|_| ScheduleError::StorageFull)
    }

    /// Remove an alarm by id, compacting insertion order.
    pub fn delete_alarm(&mut self, id: u16) -> Result<(), ScheduleError> {
        let idx = self
            .alarms
            .iter()
            .position(|a| a.id == id)
            .ok_or(ScheduleError::NotFound)?;
        self.alarms.remove(idx);
        Ok(())
    }

    /// Atomically clear and repopulate both collections.
    ///
    /// Invalid items (and items beyond capacity) are skipped and counted;
    /// the rest of the batch still loads.
    pub fn full_replace(
        &mut self,
        routines: &[RoutinePayload],
        alarms: &[AlarmPayload],
    ) -> FullSyncReport {
        self.routines.clear();
        self.alarms.clear();
        let mut report = FullSyncReport::default();

        for payload in routines {
            match payload.validate() {
                Ok(routine) => {
                    if self.routines.push(routine).is_ok() {
                        report.routines_loaded += 1;
                    } else {
                        log::warn!("full sync: routine {} dropped, storage full", payload.id);
                        report.routines_skipped += 1;
                    }
                }
                Err(reason) => {
                    log::warn!("full sync: routine {} skipped: {}", payload.id, reason);
                    report.routines_skipped += 1;
                }
            }
        }

        for payload in alarms {
            match payload.validate() {
                Ok(alarm) => {
                    if self.alarms.push(alarm).is_ok() {
                        report.alarms_loaded += 1;
                    } else {
                        log::warn!("full sync: alarm {} dropped, storage full", payload.id);
                        report.alarms_skipped += 1;
                    }
                }
                Err(reason) => {
                    log::warn!("full sync: alarm {} skipped: {}", payload.id, reason);
                    report.alarms_skipped += 1;
                }
            }
        }

        report
    }

    /// Routines in insertion order. Matching order is significant:
    /// the arbiter applies the first routine whose window contains now.
    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    /// Alarms in insertion order.
    pub fn alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    pub fn find_routine(&self, id: u16) -> Option<&Routine> {
        self.routines.iter().find(|r| r.id == id)
    }

    pub fn find_alarm(&self, id: u16) -> Option<&Alarm> {
        self.alarms.iter().find(|a| a.id == id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
