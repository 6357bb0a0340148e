//! Message transport adapters.
//!
//! The lamp core consumes decoded [`Message`]s through the
//! [`MessageSource`] port; this module owns the wire decoding. The real
//! network transport (WebSocket server) is wired in by the connectivity
//! layer; until then [`NullMessageSource`] keeps the loop running with
//! manual control only.

use log::warn;
use serde_json::Value;

use crate::app::commands::Message;
use crate::app::events::Source;
use crate::app::ports::MessageSource;
use crate::schedule::{AlarmPayload, RoutinePayload};

/// Transport that never produces a message. Stand-in until the network
/// transport is attached.
pub struct NullMessageSource;

impl MessageSource for NullMessageSource {
    fn poll(&mut self) -> Option<Message> {
        None
    }
}

/// Decode one wire frame into a typed [`Message`].
///
/// Unknown or malformed frames decode to `None` (logged, never fatal);
/// range validation of schedule fields happens later in the store, so a
/// syntactically valid upsert with out-of-range values still produces a
/// failed sync response rather than silence.
pub fn decode_frame(raw: &str) -> Option<Message> {
    let doc: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("RX | undecodable frame: {}", e);
            return None;
        }
    };

    // Direct state fields arrive without a type tag.
    if doc.get("type").is_none() {
        if doc.get("brightness").is_some() || doc.get("mode").is_some() || doc.get("on").is_some()
        {
            return Some(Message::DirectSet {
                brightness: doc.get("brightness").and_then(Value::as_i64),
                mode: doc.get("mode").and_then(Value::as_i64),
                on: doc.get("on").and_then(Value::as_bool),
            });
        }
        if doc.get("request_state").and_then(Value::as_bool) == Some(true) {
            return Some(Message::StateRequest);
        }
        warn!("RX | no recognized keys in payload");
        return None;
    }

    let msg_type = doc.get("type").and_then(Value::as_str)?;
    match msg_type {
        "routine_sync" => decode_schedule_action(
            &doc,
            |data| Some(Message::RoutineUpsert(decode_routine(data)?)),
            |id| Message::RoutineDelete { id },
        ),
        "alarm_sync" => decode_schedule_action(
            &doc,
            |data| Some(Message::AlarmUpsert(decode_alarm(data)?)),
            |id| Message::AlarmDelete { id },
        ),
        "full_sync" => {
            let routines = doc
                .get("routines")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(decode_routine).collect())
                .unwrap_or_default();
            let alarms = doc
                .get("alarms")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(decode_alarm).collect())
                .unwrap_or_default();
            Some(Message::FullSync { routines, alarms })
        }
        "time_sync" => doc
            .get("timestamp")
            .and_then(Value::as_i64)
            .map(|timestamp_ms| Message::TimeSync { timestamp_ms }),
        "sun_sync_state" => {
            let active = doc.get("active").and_then(Value::as_bool).unwrap_or(false);
            let source = doc
                .get("source")
                .and_then(Value::as_str)
                .map(Source::from_wire)
                .unwrap_or(Source::App);
            Some(Message::SunSyncState { active, source })
        }
        other => {
            warn!("RX | unknown message type '{}'", other);
            None
        }
    }
}

fn decode_schedule_action(
    doc: &Value,
    upsert: impl FnOnce(&Value) -> Option<Message>,
    delete: impl FnOnce(i64) -> Message,
) -> Option<Message> {
    match doc.get("action").and_then(Value::as_str) {
        Some("upsert") => upsert(doc.get("data")?),
        // Delete frames carry the id at the top level, not under data.
        Some("delete") => doc.get("id").and_then(Value::as_i64).map(delete),
        other => {
            warn!("RX | unknown schedule action {:?}", other);
            None
        }
    }
}

fn field(data: &Value, key: &str) -> i64 {
    // Missing numeric fields decode to -1 so range validation rejects
    // them with a reason instead of the frame vanishing.
    data.get(key).and_then(Value::as_i64).unwrap_or(-1)
}

fn decode_routine(data: &Value) -> Option<RoutinePayload> {
    Some(RoutinePayload {
        id: field(data, "id"),
        enabled: data.get("enabled").and_then(Value::as_bool).unwrap_or(true),
        start_hour: field(data, "start_hour"),
        start_minute: field(data, "start_minute"),
        end_hour: field(data, "end_hour"),
        end_minute: field(data, "end_minute"),
        brightness: field(data, "brightness"),
        mode: field(data, "mode"),
    })
}

fn decode_alarm(data: &Value) -> Option<AlarmPayload> {
    Some(AlarmPayload {
        id: field(data, "id"),
        enabled: data.get("enabled").and_then(Value::as_bool).unwrap_or(true),
        start_hour: field(data, "start_hour"),
        start_minute: field(data, "start_minute"),
        wake_hour: field(data, "wake_hour"),
        wake_minute: field(data, "wake_minute"),
        duration_minutes: field(data, "duration_minutes"),
    })
}
