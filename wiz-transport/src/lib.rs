//! Transport abstraction for WiZ smart bulb communication
//!
//! Bulbs are addressed by socket address and driven with one-shot
//! "set state" dispatches. Backends:
//!
//! - WiZ UDP (the bulb's local `setPilot` interface on port 38899)
//! - Dry run (logs only, for sessions without lights)

pub mod error;
pub mod protocol;
pub mod types;

mod dry_run;
mod wiz_udp;

pub use dry_run::DryRunTransport;
pub use error::TransportError;
pub use types::{LightState, Rgb};
pub use wiz_udp::WizUdpTransport;

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;

/// The core transport trait - all backends implement this
///
/// A dispatch either completes with the bulb's acknowledgement or fails
/// with a [`TransportError`]; implementations must bound every dispatch
/// in time so a dead bulb resolves to an error instead of hanging.
#[async_trait]
pub trait BulbTransport: Send + Sync {
    /// Drive one bulb to `state`
    async fn set_state(&self, address: SocketAddr, state: &LightState) -> Result<(), TransportError>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

/// Type alias for a shared transport
pub type BoxedTransport = Arc<dyn BulbTransport>;
