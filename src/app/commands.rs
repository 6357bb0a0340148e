//! Inbound messages consumed by the lamp core.
//!
//! The transport decodes wire frames into this closed enum once, at the
//! boundary — the core switches on message kinds, never on type strings.
//! Field presence and types are the decoder's problem; range validation
//! happens in [`schedule`](crate::schedule) payload validation.

use crate::schedule::{AlarmPayload, RoutinePayload};

use super::events::Source;

/// Decoded remote messages.
#[derive(Debug, Clone)]
pub enum Message {
    /// Direct state mutation from the remote application. Absent fields
    /// are left untouched. Exempt from the manual control lock.
    DirectSet {
        brightness: Option<i64>,
        mode: Option<i64>,
        on: Option<bool>,
    },

    /// Observer asks for an immediate state snapshot (reconnect path).
    StateRequest,

    /// Create or update one routine.
    RoutineUpsert(RoutinePayload),

    /// Delete one routine by id.
    RoutineDelete { id: i64 },

    /// Create or update one alarm.
    AlarmUpsert(AlarmPayload),

    /// Delete one alarm by id.
    AlarmDelete { id: i64 },

    /// Atomically replace both schedule collections.
    FullSync {
        routines: Vec<RoutinePayload>,
        alarms: Vec<AlarmPayload>,
    },

    /// Set the wall clock from UTC epoch milliseconds.
    TimeSync { timestamp_ms: i64 },

    /// Remote update of the sun-sync automation flag.
    SunSyncState { active: bool, source: Source },
}
