//! JSON-lines serve loop: commands in, status messages out.

use std::future::Future;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use super::bulbs::DispatchFailure;
use super::controller::{Applied, ControllerEvents, DaemonController};
use super::protocol::{DaemonMessage, DaemonRequest};

pub mod status {
    pub const SHUTDOWN_SIGNAL: &str = "Received shutdown signal";
    pub const SHUT_DOWN: &str = "Lighting daemon shut down";
}

/// Writes one message per line and flushes after each.
struct MessageWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    async fn send(&mut self, message: &DaemonMessage) -> io::Result<()> {
        let line = message
            .to_line()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.inner.write_all(line.as_bytes()).await?;
        self.inner.flush().await
    }
}

/// Run the daemon until input closes or `shutdown` resolves.
///
/// Every request gets exactly one reply. Loop failures and bulbs going
/// unreachable are pushed as unsolicited error messages. On exit all loops
/// are stopped before the final status line is written.
pub async fn serve<R, W, S>(
    mut controller: DaemonController,
    mut events: ControllerEvents,
    input: R,
    output: W,
    shutdown: S,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut out = MessageWriter { inner: output };
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    out.send(&DaemonMessage::ready(controller.inventory().groups()))
        .await?;
    info!("lighting daemon ready");

    let result = loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break out.send(&DaemonMessage::status(status::SHUTDOWN_SIGNAL)).await;
            }

            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let reply = handle_line(&mut controller, line);
                    if let Err(e) = out.send(&reply).await {
                        break Err(e);
                    }
                }
                Ok(None) => {
                    info!("input closed");
                    break Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    warn!("unreadable input line: {e}");
                    if let Err(e) = out.send(&DaemonMessage::error_with_detail("Error reading command", &e)).await {
                        break Err(e);
                    }
                }
                Err(e) => {
                    error!("input failed: {e}");
                    break Err(e);
                }
            },

            Some(failure) = events.dispatch.recv() => {
                if let Some(message) = dispatch_message(&failure) {
                    if let Err(e) = out.send(&message).await {
                        break Err(e);
                    }
                }
            }

            Some(event) = events.loops.recv() => {
                if let Some(reason) = controller.on_loop_exit(&event) {
                    let message = DaemonMessage::group_error(
                        event.group,
                        format!("{} animation loop stopped", event.group),
                        reason,
                    );
                    if let Err(e) = out.send(&message).await {
                        break Err(e);
                    }
                }
            }
        }
    };

    controller.shutdown().await;
    // Output may already be gone; shut down quietly in that case
    if let Err(e) = out.send(&DaemonMessage::status(status::SHUT_DOWN)).await {
        debug!("could not write final status: {e}");
    }
    info!("lighting daemon shut down");
    result
}

/// Parse and execute one request, producing its reply.
pub fn handle_line(controller: &mut DaemonController, line: &str) -> DaemonMessage {
    let request = match DaemonRequest::parse(line) {
        Ok(request) => request,
        Err(e) => {
            warn!("{e}");
            return DaemonMessage::error_with_detail(e.to_string(), line);
        }
    };

    match request {
        DaemonRequest::StartAnimation { config } => {
            applied_message(controller.start_animation(&config), "Failed to start animation")
        }
        DaemonRequest::UpdateAnimation { config } => {
            applied_message(controller.update_animation(&config), "Failed to update animation")
        }
        DaemonRequest::Stop { resting } => {
            DaemonMessage::status(controller.stop(resting.map(|r| r.light_state())))
        }
        DaemonRequest::Ping => DaemonMessage::pong(
            controller.animation_running(),
            controller.running_groups(),
        ),
    }
}

fn applied_message(
    result: Result<Applied, crate::animation::ConfigError>,
    failure: &str,
) -> DaemonMessage {
    match result {
        Ok(applied) => DaemonMessage::status_with_groups(applied.message, applied.running),
        Err(e) => {
            warn!("{failure}: {e}");
            DaemonMessage::error_with_detail(failure, e)
        }
    }
}

/// Only the transition to unreachable is worth a message; repeats are
/// logged by the dispatcher.
fn dispatch_message(failure: &DispatchFailure) -> Option<DaemonMessage> {
    failure.newly_unreachable.then(|| {
        let what = if failure.error.is_unreachable() {
            "not responding"
        } else {
            "rejected the command"
        };
        DaemonMessage::group_error(
            failure.group,
            format!("Bulb {} {what}", failure.address),
            &failure.error,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::GroupName;
    use wiz_transport::TransportError;

    fn failure(error: TransportError, newly_unreachable: bool) -> DispatchFailure {
        DispatchFailure {
            group: GroupName::Overhead,
            address: "10.0.0.4:38899".parse().unwrap(),
            error,
            newly_unreachable,
        }
    }

    fn message_of(msg: DaemonMessage) -> String {
        match msg {
            DaemonMessage::Error { message, group, .. } => {
                assert_eq!(group, Some(GroupName::Overhead));
                message
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_message_wording() {
        let timeout = dispatch_message(&failure(TransportError::Timeout, true)).unwrap();
        assert_eq!(message_of(timeout), "Bulb 10.0.0.4:38899 not responding");

        let rejected =
            dispatch_message(&failure(TransportError::Rejected("bad params".into()), true)).unwrap();
        assert_eq!(message_of(rejected), "Bulb 10.0.0.4:38899 rejected the command");
    }

    #[test]
    fn test_repeat_failures_are_quiet() {
        assert!(dispatch_message(&failure(TransportError::Timeout, false)).is_none());
    }
}
