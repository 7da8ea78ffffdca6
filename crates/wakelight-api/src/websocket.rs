//! WebSocket transport with externally driven reconnects.
//!
//! Wraps a single tokio-tungstenite client connection behind the
//! [`Transport`] trait. Unlike a self-healing client, this transport never
//! retries on its own: the session manager calls [`Transport::start`] when
//! its backoff allows, and learns the outcome from the event channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use wakelight_api::{Transport, TransportConfig, TransportEvent, WebSocketTransport};
//! use url::Url;
//!
//! let url = Url::parse("ws://192.168.1.10:8080/ws")?;
//! let (mut transport, mut events) = WebSocketTransport::new(url, TransportConfig::default())?;
//! transport.start();
//!
//! while let Some(event) = events.recv().await {
//!     if let TransportEvent::Connected = event {
//!         transport.send_text(r#"{"action":"get_config"}"#)?;
//!     }
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::transport::{
    EVENT_CHANNEL_CAPACITY, Transport, TransportConfig, TransportEvent, fragment_payload,
};

// ── WebSocketTransport ───────────────────────────────────────────────

/// One outbound WebSocket connection, restarted on demand.
///
/// Each [`start`](Transport::start) spawns a fresh connection task with its
/// own cancellation token, outbound queue and connected flag, so a stale
/// task winding down can never clobber the state of its successor.
pub struct WebSocketTransport {
    url: Url,
    config: TransportConfig,
    event_tx: mpsc::Sender<TransportEvent>,
    connected: Arc<AtomicBool>,
    outgoing: Option<mpsc::UnboundedSender<String>>,
    cancel: Option<CancellationToken>,
}

impl WebSocketTransport {
    /// Create a stopped transport for `url` and the receiver its events
    /// will be delivered on.
    pub fn new(
        url: Url,
        config: TransportConfig,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), Error> {
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::UnsupportedScheme {
                    scheme: other.to_owned(),
                });
            }
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let transport = Self {
            url,
            config,
            event_tx,
            connected: Arc::new(AtomicBool::new(false)),
            outgoing: None,
            cancel: None,
        };
        Ok((transport, event_rx))
    }

    /// The endpoint this transport connects to.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Transport for WebSocketTransport {
    fn start(&mut self) {
        self.stop();

        let cancel = CancellationToken::new();
        let connected = Arc::new(AtomicBool::new(false));
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        tokio::spawn(connection_task(
            self.url.clone(),
            self.config.clone(),
            self.event_tx.clone(),
            out_rx,
            Arc::clone(&connected),
            cancel.clone(),
        ));

        self.cancel = Some(cancel);
        self.connected = connected;
        self.outgoing = Some(out_tx);
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.outgoing = None;
        self.connected = Arc::new(AtomicBool::new(false));
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send_text(&self, payload: &str) -> Result<(), Error> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        let tx = self.outgoing.as_ref().ok_or(Error::NotConnected)?;
        tx.send(payload.to_owned())
            .map_err(|_| Error::Send("connection task has exited".into()))
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Connection task ──────────────────────────────────────────────────

/// Run one connection to completion and report how it ended.
///
/// A stopped (cancelled) connection exits silently: the owner already
/// knows it is gone.
async fn connection_task(
    url: Url,
    config: TransportConfig,
    events: mpsc::Sender<TransportEvent>,
    outgoing: mpsc::UnboundedReceiver<String>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    let result = run_connection(&url, &config, &events, outgoing, &connected, &cancel).await;
    connected.store(false, Ordering::SeqCst);

    if cancel.is_cancelled() {
        tracing::debug!("WebSocket connection stopped");
        return;
    }

    if let Err(e) = result {
        tracing::warn!(error = %e, "WebSocket error");
        let _ = events.send(TransportEvent::Error(e.to_string())).await;
    }
    let _ = events.send(TransportEvent::Disconnected).await;
}

/// Handshake, then pump frames both ways until the link drops.
async fn run_connection(
    url: &Url,
    config: &TransportConfig,
    events: &mpsc::Sender<TransportEvent>,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    connected: &AtomicBool,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "Connecting to WebSocket");

    let handshake = tokio::time::timeout(
        config.connect_timeout,
        tokio_tungstenite::connect_async(url.as_str()),
    );

    let (ws_stream, _response) = tokio::select! {
        biased;
        () = cancel.cancelled() => return Ok(()),
        result = handshake => result
            .map_err(|_| Error::ConnectTimeout {
                timeout_secs: config.connect_timeout.as_secs(),
            })?
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?,
    };

    connected.store(true, Ordering::SeqCst);
    tracing::info!("WebSocket connected");
    if events.send(TransportEvent::Connected).await.is_err() {
        return Ok(());
    }

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = write.send(tungstenite::Message::Close(None)).await;
                return Ok(());
            }
            outbound = outgoing.recv() => {
                let Some(text) = outbound else { return Ok(()) };
                write
                    .send(tungstenite::Message::text(text))
                    .await
                    .map_err(|e| Error::Send(e.to_string()))?;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        let payload = Bytes::copy_from_slice(text.as_bytes());
                        if !deliver(events, &payload, true, config.rx_buffer_size).await {
                            return Ok(());
                        }
                    }
                    Some(Ok(tungstenite::Message::Binary(data))) => {
                        let payload = Bytes::copy_from_slice(&data);
                        if !deliver(events, &payload, false, config.rx_buffer_size).await {
                            return Ok(());
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite queues the pong itself
                        tracing::trace!("WebSocket ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "WebSocket close frame received"
                            );
                        } else {
                            tracing::info!("WebSocket close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        return Ok(());
                    }
                    Some(Ok(_)) => {
                        // Pong, raw Frame -- ignore
                    }
                }
            }
        }
    }
}

/// Hand a received payload to the session as buffer-sized fragments.
///
/// Returns `false` once the session side of the channel is gone.
async fn deliver(
    events: &mpsc::Sender<TransportEvent>,
    payload: &Bytes,
    is_text: bool,
    rx_buffer_size: usize,
) -> bool {
    tracing::trace!(len = payload.len(), is_text, "WebSocket data received");
    for fragment in fragment_payload(payload, is_text, rx_buffer_size) {
        if events.send(TransportEvent::Data(fragment)).await.is_err() {
            return false;
        }
    }
    true
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_websocket_scheme() {
        let url = Url::parse("http://127.0.0.1:8080/ws").unwrap();
        let err = WebSocketTransport::new(url, TransportConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::UnsupportedScheme { ref scheme } if scheme == "http"));
    }

    #[tokio::test]
    async fn send_before_start_is_not_connected() {
        let url = Url::parse("ws://127.0.0.1:9/ws").unwrap();
        let (transport, _events) =
            WebSocketTransport::new(url, TransportConfig::default()).unwrap();
        assert!(!transport.is_connected());
        assert!(matches!(
            transport.send_text("{}"),
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn stop_without_start_is_harmless() {
        let url = Url::parse("wss://example.invalid/ws").unwrap();
        let (mut transport, _events) =
            WebSocketTransport::new(url, TransportConfig::default()).unwrap();
        transport.stop();
        transport.stop();
        assert!(!transport.is_connected());
    }
}
