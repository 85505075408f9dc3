//! Event-stream wire framing.

use bytes::Bytes;

/// Event name of the acknowledgement frame that opens every stream.
pub const CONNECTED_EVENT: &str = "connected";

/// Formats one frame: `event: <type>\ndata: <data>\n\n`.
pub fn event_frame(event_type: &str, data: &str) -> Bytes {
    Bytes::from(format!("event: {event_type}\ndata: {data}\n\n"))
}

/// Frame written once when a stream opens, carrying the entity id for
/// entity-scoped streams.
pub fn connected_frame(entity_id: Option<u64>) -> Bytes {
    let data = match entity_id.filter(|id| *id > 0) {
        Some(id) => format!(r#"{{"status":"connected", "id": {id}}}"#),
        None => r#"{"status":"connected"}"#.to_string(),
    };
    event_frame(CONNECTED_EVENT, &data)
}
