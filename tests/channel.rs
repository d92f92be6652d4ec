use std::time::Duration;

use chatter::api::models::OutboundMessage;
use chatter::api::{ApiClient, ChannelEvent, Endpoints, Transport};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message as WsMessage;

const BROADCAST: &str = r#"{"id":"m1","content":"hello","timestamp":1700000000.5,"sender":{"id":"u2","name":"Bob","username":"bob"},"type":"text","status":"delivered"}"#;

/// One-shot push server: reports the request path, sends a broadcast, a
/// malformed frame and a server error, echoes the first client frame back to
/// the test, then closes.
async fn serve_once(
    listener: TcpListener,
    path_tx: oneshot::Sender<String>,
    got_tx: mpsc::UnboundedSender<String>,
) {
    let (stream, _) = listener.accept().await.unwrap();
    let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        let _ = path_tx.send(req.uri().to_string());
        Ok(resp)
    };
    let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback).await.unwrap();
    ws.send(WsMessage::Text(BROADCAST.into())).await.unwrap();
    ws.send(WsMessage::Text("not json at all".into())).await.unwrap();
    ws.send(WsMessage::Text(r#"{"error":"Unauthorized access to conversation"}"#.into()))
        .await
        .unwrap();
    while let Some(frame) = ws.next().await {
        if let Ok(WsMessage::Text(text)) = frame {
            let _ = got_tx.send(text);
            break;
        }
    }
    ws.close(None).await.unwrap();
}

async fn next(events: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap()
}

#[tokio::test]
async fn channel_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (path_tx, path_rx) = oneshot::channel();
    let (got_tx, mut got_rx) = mpsc::unbounded_channel();
    let server = tokio::spawn(serve_once(listener, path_tx, got_tx));

    let client = ApiClient::new(&Endpoints {
        api_url: format!("http://{addr}"),
        ws_url: format!("ws://{addr}"),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
    .with_token("tok");

    let mut handle = client.open_channel("c1").await.unwrap();
    assert_eq!(handle.conversation_id(), "c1");
    assert_eq!(path_rx.await.unwrap(), "/ws/c1?token=tok");

    let mut events = handle.take_events().unwrap();

    assert_eq!(next(&mut events).await, ChannelEvent::Opened);
    match next(&mut events).await {
        ChannelEvent::Message(m) => {
            assert_eq!(m.id, "m1");
            assert_eq!(m.sender.name, "Bob");
        }
        other => panic!("expected a message, got {other:?}"),
    }
    // The malformed frame is dropped, the error frame comes through.
    assert_eq!(
        next(&mut events).await,
        ChannelEvent::ServerError("Unauthorized access to conversation".into())
    );

    handle
        .send(&OutboundMessage {
            content: "hi".into(),
            timestamp: 1700000001,
        })
        .unwrap();
    let sent = timeout(Duration::from_secs(5), got_rx.recv()).await.unwrap().unwrap();
    assert_eq!(sent, r#"{"content":"hi","timestamp":1700000001}"#);

    assert_eq!(next(&mut events).await, ChannelEvent::Closed);
    server.await.unwrap();
}

#[tokio::test]
async fn unreachable_server_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(&Endpoints {
        api_url: format!("http://{addr}"),
        ws_url: format!("ws://{addr}"),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
    .with_token("tok");
    assert!(client.open_channel("c1").await.is_err());
}
