use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::api::events::{decode_frame, ChannelEvent};
use crate::api::models::OutboundMessage;
use crate::api::ApiError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Frames queued for the writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Close,
}

/// Handle to the push channel of one conversation.
///
/// Writes are queued to a background writer, reads arrive as [`ChannelEvent`]s
/// on the receiver returned by [`ChannelHandle::take_events`]. Dropping the
/// handle closes the socket.
#[derive(Debug)]
pub struct ChannelHandle {
    conversation_id: String,
    outbound: UnboundedSender<OutboundFrame>,
    events: Option<UnboundedReceiver<ChannelEvent>>,
}

impl ChannelHandle {
    /// Builds a handle over already wired queues. The socket implementation
    /// uses this too; tests use it to stand in for a server.
    pub fn from_parts(
        conversation_id: impl Into<String>,
        outbound: UnboundedSender<OutboundFrame>,
        events: UnboundedReceiver<ChannelEvent>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            outbound,
            events: Some(events),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn send(&self, message: &OutboundMessage) -> Result<(), ApiError> {
        let text = serde_json::to_string(message)?;
        self.outbound
            .send(OutboundFrame::Text(text))
            .map_err(|_| ApiError::ChannelClosed)
    }

    pub fn close(&self) {
        // The writer may already be gone, which is as closed as it gets.
        let _ = self.outbound.send(OutboundFrame::Close);
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }

    /// The event stream can be taken once.
    pub fn take_events(&mut self) -> Option<UnboundedReceiver<ChannelEvent>> {
        self.events.take()
    }
}

pub async fn connect(conversation_id: &str, url: &Url) -> Result<ChannelHandle, ApiError> {
    log::debug!("Opening channel for conversation {conversation_id}");
    let (ws, _) = connect_async(url.as_str()).await?;
    log::info!("WebSocket connection established for {conversation_id}");
    Ok(spawn(conversation_id, ws))
}

fn spawn(conversation_id: &str, ws: WsStream) -> ChannelHandle {
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutboundFrame>();
    let (ev_tx, ev_rx) = mpsc::unbounded_channel::<ChannelEvent>();
    let (mut sink, mut stream) = ws.split();
    let _ = ev_tx.send(ChannelEvent::Opened);

    let writer_id = conversation_id.to_string();
    tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            match frame {
                OutboundFrame::Text(text) => {
                    if let Err(e) = sink.send(WsMessage::Text(text)).await {
                        log::warn!("Send failed on channel {writer_id}: {e}");
                        break;
                    }
                }
                OutboundFrame::Close => break,
            }
        }
        let _ = sink.close().await;
        log::debug!("Writer for channel {writer_id} stopped");
    });

    let reader_id = conversation_id.to_string();
    tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => match decode_frame(&text) {
                    Ok(event) => {
                        if ev_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => log::error!("Error processing message on channel {reader_id}: {e}"),
                },
                Ok(WsMessage::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    log::error!("WebSocket error on channel {reader_id}: {e}");
                    let _ = ev_tx.send(ChannelEvent::Failed(e.to_string()));
                    break;
                }
            }
        }
        log::info!("WebSocket connection closed for {reader_id}");
        let _ = ev_tx.send(ChannelEvent::Closed);
    });

    ChannelHandle::from_parts(conversation_id, out_tx, ev_rx)
}
