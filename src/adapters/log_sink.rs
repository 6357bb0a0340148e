//! JSON event sink adapter.
//!
//! Renders every [`LampEvent`] into the wire JSON understood by the
//! companion app and hands the rendered frame to every observer. In this
//! build the only observer is the serial console; a WebSocket broadcast
//! adapter would implement the same trait and reuse [`render`].
//!
//! Wire shapes:
//!
//! - state snapshot       → `{"state":{...}}`
//! - sync acknowledgment  → `{"type":"<kind>_sync_response","success":..,"message":".."}`
//! - sun-sync echo        → `{"type":"sun_sync_state",...}`
//! - override broadcast   → `{"type":"schedule_override_event",...}`

use log::{info, warn};
use serde_json::json;

use crate::app::events::LampEvent;
use crate::app::ports::EventSink;

/// Render one event into its wire JSON value.
pub fn render(event: &LampEvent) -> serde_json::Value {
    match event {
        LampEvent::State(snapshot) => json!({ "state": snapshot }),

        LampEvent::SyncResponse(resp) => json!({
            "type": resp.kind.response_type(),
            "success": resp.success,
            "message": resp.message.as_str(),
        }),

        LampEvent::SunSync {
            active,
            source,
            timestamp_ms,
        } => json!({
            "type": "sun_sync_state",
            "active": active,
            "source": source,
            "timestamp_ms": timestamp_ms,
        }),

        LampEvent::Override(report) => json!({
            "type": "schedule_override_event",
            "source": report.source,
            "timestamp_ms": report.timestamp_ms,
            "routine_disabled": report.routine_disabled,
            "alarm_disabled": report.alarm_disabled,
            "sun_sync_disabled": report.sun_sync_disabled,
            "routine_suppressed": report.routine_suppressed,
            "alarm_suppressed": report.alarm_suppressed,
            "sun_sync_active": report.sun_sync_active,
        }),
    }
}

/// Adapter that writes rendered frames to the serial console.
pub struct JsonEventSink;

impl JsonEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for JsonEventSink {
    fn emit(&mut self, event: &LampEvent) {
        match serde_json::to_string(&render(event)) {
            Ok(frame) => info!("TX | {}", frame),
            Err(e) => warn!("event serialization failed: {}", e),
        }
    }
}
