//! WiZ transport over the bulb's local UDP interface

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::trace;

use crate::error::TransportError;
use crate::protocol::{self, timing};
use crate::types::LightState;
use crate::BulbTransport;

/// Sends `setPilot` datagrams and waits for the bulb's acknowledgement.
///
/// Each dispatch uses its own ephemeral socket so that concurrent
/// dispatches to different bulbs never read each other's replies.
/// The whole exchange is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct WizUdpTransport {
    timeout: Duration,
}

impl Default for WizUdpTransport {
    fn default() -> Self {
        Self::new(Duration::from_millis(timing::DEFAULT_TIMEOUT_MS))
    }
}

impl WizUdpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn exchange(&self, address: SocketAddr, payload: &[u8]) -> Result<(), TransportError> {
        let bind: SocketAddr = if address.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(address).await?;
        socket.send(payload).await?;

        let mut buf = vec![0u8; timing::RECV_BUFFER];
        let len = socket.recv(&mut buf).await?;
        trace!(
            "{} <- {}",
            address,
            String::from_utf8_lossy(&buf[..len])
        );
        protocol::parse_set_pilot_ack(&buf[..len])
    }
}

#[async_trait]
impl BulbTransport for WizUdpTransport {
    async fn set_state(&self, address: SocketAddr, state: &LightState) -> Result<(), TransportError> {
        let payload = protocol::encode_set_pilot(state)?;
        trace!("{} -> {}", address, String::from_utf8_lossy(&payload));

        match tokio::time::timeout(self.timeout, self.exchange(address, &payload)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    fn name(&self) -> &'static str {
        "wiz-udp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rgb;

    /// Fake bulb: answers the first datagram it receives with `reply`.
    async fn fake_bulb(reply: &'static [u8]) -> (SocketAddr, tokio::task::JoinHandle<Vec<u8>>) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut buf = vec![0u8; 1024];
            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            socket.send_to(reply, peer).await.unwrap();
            buf.truncate(len);
            buf
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_set_state_acknowledged() {
        let (addr, bulb) =
            fake_bulb(br#"{"method":"setPilot","env":"pro","result":{"success":true}}"#).await;
        let transport = WizUdpTransport::new(Duration::from_secs(2));

        let state = LightState::Color {
            rgb: Rgb::new(10, 20, 30),
            brightness: 255,
        };
        transport.set_state(addr, &state).await.unwrap();

        let received: serde_json::Value = serde_json::from_slice(&bulb.await.unwrap()).unwrap();
        assert_eq!(received["method"], "setPilot");
        assert_eq!(received["params"]["g"], 20);
    }

    #[tokio::test]
    async fn test_set_state_times_out() {
        // Bound but silent socket: datagrams are swallowed, nothing answers
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = silent.local_addr().unwrap();
        let transport = WizUdpTransport::new(Duration::from_millis(50));

        let err = transport.set_state(addr, &LightState::Off).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn test_set_state_rejected() {
        let (addr, _bulb) =
            fake_bulb(br#"{"method":"setPilot","error":{"code":-32600,"message":"bad"}}"#).await;
        let transport = WizUdpTransport::new(Duration::from_secs(2));
        let err = transport.set_state(addr, &LightState::Off).await.unwrap_err();
        assert!(matches!(err, TransportError::Rejected(_)));
    }
}
