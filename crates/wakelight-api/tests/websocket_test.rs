// Integration tests for `WebSocketTransport` against a local tungstenite server.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use wakelight_api::{Transport, TransportConfig, TransportEvent, WebSocketTransport};

// ── Helpers ─────────────────────────────────────────────────────────

const WAIT: Duration = Duration::from_secs(5);

async fn next_event(events: &mut mpsc::Receiver<TransportEvent>) -> TransportEvent {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for transport event")
        .expect("event channel closed")
}

/// Accept one client, push `greeting` to it, forward the first text it
/// sends back through `seen_tx`, then close.
async fn spawn_server(greeting: String, seen_tx: mpsc::Sender<String>) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        ws.send(Message::text(greeting)).await.unwrap();

        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                seen_tx.send(text.to_string()).await.unwrap();
                break;
            }
        }
        ws.close(None).await.unwrap();
    });

    Url::parse(&format!("ws://{addr}/ws")).unwrap()
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn delivers_fragments_and_sends_text() {
    let greeting = format!(r#"{{"action":"ping","pad":"{}"}}"#, "x".repeat(2000));
    let (seen_tx, mut seen_rx) = mpsc::channel(1);
    let url = spawn_server(greeting.clone(), seen_tx).await;

    let config = TransportConfig {
        rx_buffer_size: 1024,
        ..TransportConfig::default()
    };
    let (mut transport, mut events) = WebSocketTransport::new(url, config).unwrap();
    transport.start();

    assert_eq!(next_event(&mut events).await, TransportEvent::Connected);
    assert!(transport.is_connected());

    let mut reassembled = Vec::new();
    while reassembled.len() < greeting.len() {
        match next_event(&mut events).await {
            TransportEvent::Data(fragment) => {
                assert!(fragment.is_text);
                assert_eq!(fragment.payload_len, greeting.len());
                assert_eq!(fragment.payload_offset, reassembled.len());
                assert!(fragment.data.len() <= 1024);
                reassembled.extend_from_slice(&fragment.data);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert_eq!(reassembled, greeting.as_bytes());

    transport.send_text(r#"{"action":"get_config"}"#).unwrap();
    let seen = tokio::time::timeout(WAIT, seen_rx.recv()).await.unwrap().unwrap();
    assert_eq!(seen, r#"{"action":"get_config"}"#);

    assert_eq!(next_event(&mut events).await, TransportEvent::Disconnected);
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn refused_connection_reports_error_then_disconnect() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("ws://{addr}/ws")).unwrap();
    let (mut transport, mut events) =
        WebSocketTransport::new(url, TransportConfig::default()).unwrap();
    transport.start();

    assert!(matches!(
        next_event(&mut events).await,
        TransportEvent::Error(_)
    ));
    assert_eq!(next_event(&mut events).await, TransportEvent::Disconnected);
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn stopped_connection_is_silent() {
    let (seen_tx, _seen_rx) = mpsc::channel(1);
    let url = spawn_server("{}".into(), seen_tx).await;

    let (mut transport, mut events) =
        WebSocketTransport::new(url, TransportConfig::default()).unwrap();
    transport.start();
    assert_eq!(next_event(&mut events).await, TransportEvent::Connected);

    transport.stop();
    assert!(!transport.is_connected());

    // Anything still in flight from the old connection may drain, but no
    // Disconnected/Error event follows a deliberate stop.
    let drained = tokio::time::timeout(Duration::from_millis(300), async {
        while let Some(event) = events.recv().await {
            assert!(matches!(event, TransportEvent::Data(_)), "unexpected {event:?}");
        }
    })
    .await;
    assert!(drained.is_err(), "event channel should stay open");
}
