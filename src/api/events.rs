use serde::Deserialize;

use crate::api::models::Message;

/// Everything the push channel reports back to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened,
    Message(Message),
    /// `{"error": "..."}` frames the server sends instead of a broadcast.
    ServerError(String),
    Closed,
    Failed(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IncomingFrame {
    Message(Message),
    Error { error: String },
}

/// Decodes one text frame from the channel.
pub fn decode_frame(text: &str) -> Result<ChannelEvent, serde_json::Error> {
    Ok(match serde_json::from_str::<IncomingFrame>(text)? {
        IncomingFrame::Message(msg) => ChannelEvent::Message(msg),
        IncomingFrame::Error { error } => ChannelEvent::ServerError(error),
    })
}
