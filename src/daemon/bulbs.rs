//! Bulb handles and fire-and-forget fan-out to a group.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wiz_transport::{BoxedTransport, LightState, TransportError};

use crate::animation::GroupName;

/// One network-addressable bulb.
///
/// The reachability flag only feeds diagnostics; dispatches are sent
/// regardless of its value.
#[derive(Debug, Clone)]
pub struct BulbHandle {
    address: SocketAddr,
    reachable: Arc<AtomicBool>,
}

impl BulbHandle {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            reachable: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Outcome of the most recent completed dispatch.
    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Relaxed)
    }
}

/// A failed dispatch, delivered asynchronously to whoever owns the
/// report channel.
#[derive(Debug)]
pub struct DispatchFailure {
    pub group: GroupName,
    pub address: SocketAddr,
    pub error: TransportError,
    /// True when the bulb was reachable before this failure.
    pub newly_unreachable: bool,
}

/// Sender half of the dispatch report channel.
pub type ReportSender = mpsc::UnboundedSender<DispatchFailure>;

/// Bulbs that receive the same state each tick.
pub struct BulbGroup {
    name: GroupName,
    handles: Vec<BulbHandle>,
    transport: BoxedTransport,
    reports: ReportSender,
}

impl BulbGroup {
    pub fn new(
        name: GroupName,
        addresses: &[SocketAddr],
        transport: BoxedTransport,
        reports: ReportSender,
    ) -> Self {
        Self {
            name,
            handles: addresses.iter().copied().map(BulbHandle::new).collect(),
            transport,
            reports,
        }
    }

    pub fn name(&self) -> GroupName {
        self.name
    }

    /// Bulbs whose most recent dispatch failed.
    pub fn unreachable(&self) -> Vec<SocketAddr> {
        self.handles
            .iter()
            .filter(|h| !h.is_reachable())
            .map(BulbHandle::address)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Send `state` to every bulb without waiting for any of them.
    ///
    /// Each dispatch is its own task: a slow, dead or panicking bulb only
    /// affects its own dispatch. Must be called from within a tokio runtime.
    pub fn apply(&self, state: LightState) {
        for handle in &self.handles {
            self.dispatch(handle, state);
        }
    }

    /// Power every bulb off (fire-and-forget).
    pub fn turn_off(&self) {
        self.apply(LightState::Off);
    }

    fn dispatch(&self, handle: &BulbHandle, state: LightState) {
        let transport = Arc::clone(&self.transport);
        let reachable = Arc::clone(&handle.reachable);
        let reports = self.reports.clone();
        let address = handle.address;
        let group = self.name;

        tokio::spawn(async move {
            match transport.set_state(address, &state).await {
                Ok(()) => {
                    if !reachable.swap(true, Ordering::Relaxed) {
                        info!("{group} bulb {address} is responding again");
                    }
                }
                Err(error) => {
                    let newly_unreachable = reachable.swap(false, Ordering::Relaxed);
                    if newly_unreachable {
                        warn!("{group} bulb {address}: {error}");
                    } else {
                        debug!("{group} bulb {address} still failing: {error}");
                    }
                    // Receiver gone means the daemon is shutting down
                    let _ = reports.send(DispatchFailure {
                        group,
                        address,
                        error,
                        newly_unreachable,
                    });
                }
            }
        });
    }
}
