//! `wakelight run`: the long-lived appliance session.

use std::sync::Arc;
use std::time::Duration;

use wakelight_api::{UdpWakeSender, WebSocketTransport};
use wakelight_core::{CoreError, Dispatcher, LedController, Session, SimulatedHardware};

use crate::cli::{GlobalOpts, RunArgs};
use crate::error::CliError;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub async fn handle(args: &RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = super::load_config(global)?;
    let secret = wakelight_config::resolve_secret(&cfg, args.secret.as_deref())?;
    let session_config = cfg.to_session_config(secret, args.url.as_deref())?;

    // The LED queue must exist before the first config push arrives.
    let hardware = SimulatedHardware::new(session_config.led.max_pixels);
    let (led, worker) = LedController::start(hardware).map_err(CoreError::from)?;

    let wake = Arc::new(UdpWakeSender::new(session_config.wol_target));
    let dispatcher = Dispatcher::new(led, wake, session_config.led.enqueue_timeout);

    let (transport, events) =
        WebSocketTransport::new(session_config.url.clone(), session_config.transport.clone())
            .map_err(CoreError::from)?;

    tracing::info!(
        url = %session_config.url,
        device = %session_config.device.name,
        "Starting session"
    );
    let session = Session::new(session_config, transport, events, dispatcher);
    let handle = session.spawn();
    let mut state = handle.subscribe();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Interrupt received; shutting down");
                break;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                tracing::debug!(state = ?current, "Connection state changed");
            }
        }
    }

    handle.shutdown();
    handle.join().await?;

    // The session owned the last controller handle, so the actor's queue is
    // now closed and the worker drains and exits.
    let joined = tokio::time::timeout(
        SHUTDOWN_GRACE,
        tokio::task::spawn_blocking(move || worker.join()),
    )
    .await
    .map_err(|_| CliError::ShutdownTimeout {
        secs: SHUTDOWN_GRACE.as_secs(),
    })?
    .map_err(|e| CliError::Runtime {
        message: format!("LED worker join failed: {e}"),
    })?;
    joined.map_err(CoreError::from)?;

    tracing::info!("Stopped");
    Ok(())
}
