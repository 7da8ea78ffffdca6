// wakelight-api: wire-level collaborators for the wakelight control plane
// (WebSocket transport, HMAC auth, Wake-on-LAN).

pub mod auth;
pub mod error;
pub mod transport;
pub mod websocket;
pub mod wol;

pub use auth::AuthMessage;
pub use error::Error;
pub use transport::{Fragment, Transport, TransportConfig, TransportEvent};
pub use websocket::WebSocketTransport;
pub use wol::{UdpWakeSender, WakeSender};
