use axum::{extract::ws::Message, response::sse::Event};
use json_patch::Patch;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One message on a live update channel. Patches target the client's
/// mirrored state document; `Finished` closes the stream.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "content", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogMsg {
    JsonPatch(#[ts(type = "Array<any>")] Patch),
    Finished,
}

impl LogMsg {
    pub fn to_sse_event(&self) -> Event {
        match self {
            LogMsg::JsonPatch(patch) => Event::default()
                .event("json_patch")
                .json_data(patch)
                .unwrap_or_else(|err| {
                    tracing::error!("Failed to serialize JSON patch for SSE: {}", err);
                    Event::default().event("json_patch").data("[]")
                }),
            LogMsg::Finished => Event::default().event("finished").data("{}"),
        }
    }

    /// Serialization of these variants cannot fail, hence "unchecked".
    pub fn to_ws_message_unchecked(&self) -> Message {
        let payload =
            serde_json::to_string(self).expect("LogMsg serializes to JSON");
        Message::Text(payload.into())
    }

    pub fn approx_bytes(&self) -> usize {
        match self {
            LogMsg::JsonPatch(patch) => serde_json::to_string(patch)
                .map(|s| s.len())
                .unwrap_or(2),
            LogMsg::Finished => 16,
        }
    }
}
