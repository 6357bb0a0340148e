//! Outbound events published by the lamp core.
//!
//! Every externally observable mutation ends in one of these. The
//! [`EventSink`](super::ports::EventSink) adapters fan them out to all
//! connected observers; the JSON wire shapes live in the sink adapter,
//! not here.

use serde::Serialize;

/// Originator tag carried by sun-sync and override traffic. Anything the
/// remote application sends that is not `"hardware"` decodes as `App`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Hardware,
    App,
}

impl Source {
    /// Map a wire source string; only `"hardware"` is significant.
    pub fn from_wire(source: &str) -> Self {
        if source == "hardware" {
            Self::Hardware
        } else {
            Self::App
        }
    }
}

/// Which sync request a [`SyncResponse`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Routine,
    Alarm,
    Full,
    Time,
}

impl SyncKind {
    /// Wire `type` string of the response message.
    pub fn response_type(self) -> &'static str {
        match self {
            Self::Routine => "routine_sync_response",
            Self::Alarm => "alarm_sync_response",
            Self::Full => "full_sync_response",
            Self::Time => "time_sync_response",
        }
    }
}

/// Full state snapshot, published after every externally observable
/// mutation (with the documented direct-state-set exception).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub brightness: u8,
    pub mode: u8,
    pub on: bool,
    pub routine_active: bool,
    pub alarm_active: bool,
    pub sun_sync_active: bool,
    pub routine_suppressed: bool,
    pub alarm_suppressed: bool,
    pub sun_sync_disabled_by_hw: bool,
    pub manual_control_locked: bool,
}

/// Per-request acknowledgment. Always sent, including on validation
/// failure — a sync request is never silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResponse {
    pub kind: SyncKind,
    pub success: bool,
    pub message: heapless::String<96>,
}

/// Broadcast after a hardware override resolved (triple-click).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverrideReport {
    pub source: Source,
    pub timestamp_ms: u64,
    pub routine_disabled: bool,
    pub alarm_disabled: bool,
    pub sun_sync_disabled: bool,
    pub routine_suppressed: bool,
    pub alarm_suppressed: bool,
    pub sun_sync_active: bool,
}

/// Structured events emitted by the lamp core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LampEvent {
    /// Current state, for every connected observer.
    State(StateSnapshot),

    /// Acknowledgment of a sync request.
    SyncResponse(SyncResponse),

    /// Echo of a sun-sync flag change (e.g. hardware disabling it).
    SunSync {
        active: bool,
        source: Source,
        timestamp_ms: u64,
    },

    /// A hardware override disabled one or more automation sources.
    Override(OverrideReport),
}
