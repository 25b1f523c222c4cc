//! Transport that never touches the network

use std::net::SocketAddr;

use async_trait::async_trait;
use tracing::debug;

use crate::error::TransportError;
use crate::types::LightState;
use crate::BulbTransport;

/// Logs every dispatch and reports success. Used when lights are disabled
/// for a session or no bulbs are available.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunTransport;

#[async_trait]
impl BulbTransport for DryRunTransport {
    async fn set_state(&self, address: SocketAddr, state: &LightState) -> Result<(), TransportError> {
        debug!("[dry-run] {address}: {}", state.describe());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
