// ── Wake-on-LAN ──
//
// A magic packet is six 0xFF bytes followed by the target MAC repeated
// sixteen times, sent once as a UDP broadcast.

use std::net::{SocketAddr, UdpSocket};

use crate::error::Error;

/// Size of a magic packet: 6 sync bytes + 16 × 6 MAC bytes.
pub const MAGIC_PACKET_LEN: usize = 102;

/// Default destination: limited broadcast, discard port.
pub const DEFAULT_BROADCAST: &str = "255.255.255.255:9";

/// Build the magic packet for `mac`.
pub fn magic_packet(mac: [u8; 6]) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0xFF_u8; MAGIC_PACKET_LEN];
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&mac);
    }
    packet
}

/// Something that can wake a machine given its hardware address.
pub trait WakeSender: Send + Sync {
    fn send_wake(&self, mac: [u8; 6]) -> Result<(), Error>;
}

/// Sends magic packets from an ephemeral broadcast-enabled UDP socket.
#[derive(Debug, Clone)]
pub struct UdpWakeSender {
    target: SocketAddr,
}

impl UdpWakeSender {
    pub fn new(target: SocketAddr) -> Self {
        Self { target }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Default for UdpWakeSender {
    fn default() -> Self {
        Self {
            target: SocketAddr::from(([255, 255, 255, 255], 9)),
        }
    }
}

impl WakeSender for UdpWakeSender {
    fn send_wake(&self, mac: [u8; 6]) -> Result<(), Error> {
        let packet = magic_packet(mac);

        let bind_addr: SocketAddr = if self.target.is_ipv6() {
            SocketAddr::from(([0_u16; 8], 0))
        } else {
            SocketAddr::from(([0, 0, 0, 0], 0))
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_broadcast(true)?;

        let sent = socket.send_to(&packet, self.target)?;
        if sent != MAGIC_PACKET_LEN {
            tracing::error!(sent, "Failed to send Wake-on-LAN packet");
            return Err(Error::ShortWrite {
                sent,
                expected: MAGIC_PACKET_LEN,
            });
        }

        tracing::info!(target = %self.target, bytes = sent, "Wake-on-LAN packet sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    const MAC: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];

    #[test]
    fn magic_packet_layout() {
        let packet = magic_packet(MAC);
        assert_eq!(&packet[..6], &[0xFF; 6]);
        for rep in packet[6..].chunks(6) {
            assert_eq!(rep, &MAC);
        }
    }

    #[test]
    fn default_target_is_limited_broadcast() {
        assert_eq!(
            UdpWakeSender::default().target(),
            DEFAULT_BROADCAST.parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn sends_packet_to_target() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let sender = UdpWakeSender::new(receiver.local_addr().unwrap());

        sender.send_wake(MAC).unwrap();

        let mut buf = [0_u8; 256];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(len, MAGIC_PACKET_LEN);
        assert_eq!(&buf[..len], &magic_packet(MAC)[..]);
    }
}
