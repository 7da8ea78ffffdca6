//! `wakelight wake`: send one magic packet from this host.

use std::net::SocketAddr;

use wakelight_api::{UdpWakeSender, WakeSender};
use wakelight_core::{CoreError, MacAddress};

use crate::cli::{GlobalOpts, WakeArgs};
use crate::error::CliError;

pub fn handle(args: &WakeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mac: MacAddress = args.mac.parse().map_err(CoreError::from)?;

    let target: SocketAddr = match args.broadcast.as_deref() {
        Some(addr) => addr.parse().map_err(|e| CliError::Validation {
            field: "broadcast".into(),
            reason: format!("'{addr}': {e}"),
        })?,
        None => super::load_config(global)?.wol_target()?,
    };

    UdpWakeSender::new(target)
        .send_wake(mac.octets())
        .map_err(|e| CliError::WakeFailed {
            mac: mac.to_string(),
            reason: e.to_string(),
        })?;

    tracing::info!(%mac, %target, "Magic packet sent");
    println!("Sent magic packet for {mac} to {target}");
    Ok(())
}
