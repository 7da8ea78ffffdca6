//! Session manager: owns the one server connection.
//!
//! A single task drives the transport from two inputs: transport events
//! (connect, disconnect, error, data fragments) and a fixed supervision
//! tick. The tick starts connection attempts under [`Backoff`] and carries
//! out reconnects requested by the dispatcher. Everything here runs on
//! that one task, so the reassembler and the pending-reconnect flag need
//! no locking.

mod backoff;

pub use backoff::Backoff;

use std::time::Instant;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wakelight_api::{AuthMessage, Fragment, Transport, TransportEvent};

use crate::config::SessionConfig;
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::error::CoreError;
use crate::reassembly::Reassembler;

/// Configuration request sent right after authenticating.
pub const GET_CONFIG: &str = r#"{"action":"get_config"}"#;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

// ── Session ──────────────────────────────────────────────────────

pub struct Session<T: Transport> {
    config: SessionConfig,
    transport: T,
    events: mpsc::Receiver<TransportEvent>,
    dispatcher: Dispatcher,
    reassembler: Reassembler,
    backoff: Backoff,
    force_reconnect: bool,
    was_connected: bool,
    attempt_id: Option<Uuid>,
    state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl<T: Transport> Session<T> {
    pub fn new(
        config: SessionConfig,
        transport: T,
        events: mpsc::Receiver<TransportEvent>,
        dispatcher: Dispatcher,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            reassembler: Reassembler::new(config.max_message_len),
            backoff: Backoff::from_config(&config.reconnect),
            config,
            transport,
            events,
            dispatcher,
            force_reconnect: false,
            was_connected: false,
            attempt_id: None,
            state,
            cancel: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// `true` while a dispatcher-requested reconnect is waiting for the tick.
    pub fn reconnect_pending(&self) -> bool {
        self.force_reconnect
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    // ── Supervision tick ─────────────────────────────────────────

    /// One pass of the reconnect state machine.
    pub fn poll_tick(&mut self, now: Instant) {
        if self.transport.is_connected() {
            if !self.force_reconnect {
                if !self.was_connected {
                    tracing::info!("WebSocket connection stable; reset reconnect backoff");
                }
                self.backoff.reset();
                self.was_connected = true;
                self.set_state(ConnectionState::Connected);
                return;
            }

            tracing::warn!("Forcing reconnect to retry get_config");
            self.force_reconnect = false;
            self.transport.stop();
            self.reassembler.reset();
            self.set_state(ConnectionState::Disconnected);
        }

        if self.backoff.attempt_due(now) {
            let attempt = Uuid::new_v4();
            tracing::info!(
                url = %self.config.url,
                attempt = %attempt,
                backoff = %humantime::format_duration(self.backoff.current_delay()),
                "Connecting to WebSocket"
            );
            self.transport.stop();
            self.transport.start();
            self.backoff.record_attempt(now);
            self.attempt_id = Some(attempt);
            self.set_state(ConnectionState::Connecting);
        } else if self.state() == ConnectionState::Connected {
            self.set_state(ConnectionState::Disconnected);
        }
        self.was_connected = false;
    }

    // ── Transport events ─────────────────────────────────────────

    pub async fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                tracing::info!(attempt = ?self.attempt_id, "WebSocket connected");
                self.reassembler.reset();
                self.set_state(ConnectionState::Connected);
                if let Err(e) = self.send_handshake() {
                    tracing::error!(error = %e, "Failed to send handshake");
                }
            }
            TransportEvent::Disconnected => {
                tracing::warn!(attempt = ?self.attempt_id, "WebSocket disconnected");
                self.reassembler.reset();
                self.force_reconnect = false;
                self.set_state(ConnectionState::Disconnected);
            }
            TransportEvent::Error(reason) => {
                tracing::error!(attempt = ?self.attempt_id, error = %reason, "WebSocket error");
                self.reassembler.reset();
            }
            TransportEvent::Data(fragment) => self.handle_fragment(fragment).await,
        }
    }

    fn send_handshake(&self) -> Result<(), CoreError> {
        let device_mac = self.config.device.mac.map(|mac| mac.to_string());
        let auth = AuthMessage::new(
            &self.config.device.name,
            device_mac.as_deref(),
            &self.config.secret,
            Utc::now(),
        )?;
        self.transport.send_text(&auth.to_json()?)?;
        tracing::info!(token = %auth.token, mac = %auth.mac, "Auth sent");

        self.transport.send_text(GET_CONFIG)?;
        tracing::info!("Requested server config");
        Ok(())
    }

    async fn handle_fragment(&mut self, fragment: Fragment) {
        if !fragment.is_text {
            tracing::trace!(len = fragment.data.len(), "Ignoring non-text frame");
            return;
        }
        if fragment.payload_len == 0 || fragment.data.is_empty() {
            tracing::warn!("Empty payload received");
            return;
        }

        if fragment.payload_offset == 0 {
            if let Err(e) = self.reassembler.begin(fragment.payload_len) {
                tracing::error!(error = %e, "Cannot reassemble payload");
                return;
            }
        }

        if let Err(e) = self.reassembler.append(
            fragment.payload_offset,
            &fragment.data,
            fragment.payload_len,
        ) {
            tracing::warn!(
                offset = fragment.payload_offset,
                data_len = fragment.data.len(),
                payload_len = fragment.payload_len,
                error = %e,
                "Invalid fragment payload"
            );
            self.reassembler.reset();
            return;
        }

        let Some(payload) = self.reassembler.take_complete() else {
            return;
        };
        let outcome = self.dispatcher.dispatch_bytes(&payload).await;
        self.apply_outcome(outcome);
    }

    fn apply_outcome(&mut self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Reply(reply) => {
                let sent = reply
                    .to_json()
                    .map_err(CoreError::from)
                    .and_then(|json| self.transport.send_text(&json).map_err(CoreError::from));
                if let Err(e) = sent {
                    tracing::warn!(error = %e, "Failed to send reply");
                }
            }
            DispatchOutcome::ForceReconnect => self.force_reconnect = true,
            DispatchOutcome::Silent => {}
        }
    }

    // ── Run loop ─────────────────────────────────────────────────

    /// Drive the session until cancelled or the transport's event
    /// channel closes. Stops the transport on the way out.
    pub async fn run(mut self) {
        let cancel = self.cancel.clone();
        let mut tick = tokio::time::interval(self.config.reconnect.tick);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = self.events.recv() => {
                    let Some(event) = event else {
                        tracing::warn!("Transport event channel closed");
                        break;
                    };
                    self.handle_event(event).await;
                }
                at = tick.tick() => self.poll_tick(at.into_std()),
            }
        }

        self.transport.stop();
        self.set_state(ConnectionState::Disconnected);
        tracing::info!("Session stopped");
    }
}

impl<T: Transport + 'static> Session<T> {
    /// Run the session on its own task.
    pub fn spawn(self) -> SessionHandle {
        let state = self.subscribe();
        let cancel = self.cancel_token();
        let task = tokio::spawn(self.run());
        SessionHandle {
            state,
            cancel,
            task,
        }
    }
}

// ── SessionHandle ────────────────────────────────────────────────

/// Control surface of a spawned session.
pub struct SessionHandle {
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch channel of connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Ask the session to stop. Returns immediately.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait for the session task to finish.
    pub async fn join(self) -> Result<(), CoreError> {
        self.task
            .await
            .map_err(|e| CoreError::Internal(format!("session task failed: {e}")))
    }
}
