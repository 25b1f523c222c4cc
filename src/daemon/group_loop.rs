//! The per-group animation loop task.
//!
//! Each loop owns its [`GroupRuntime`] outright. The controller talks to it
//! only through [`LoopHandle`]: program swaps and stop requests travel over
//! a channel and are handled between ticks, never during one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info};
use wiz_transport::LightState;

use super::state::{GroupProgram, GroupRuntime};
use crate::animation::model::ModelError;
use crate::animation::GroupName;

static NEXT_LOOP_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum LoopError {
    /// Internal invariant violation while evaluating a tick.
    #[error("animation model: {0}")]
    Model(#[from] ModelError),

    #[error("{0} loop is not running")]
    NotRunning(GroupName),
}

/// Lifecycle of one loop. `Idle` only lasts until the task is first
/// scheduled; `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Why a loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// Stop was requested or the controller went away
    Stopped,
    /// The loop hit an internal error or panicked
    Failed(String),
}

/// Sent once by every loop when it reaches `Stopped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopEvent {
    pub group: GroupName,
    pub id: u64,
    pub exit: LoopExit,
}

pub type LoopEventSender = mpsc::UnboundedSender<LoopEvent>;

#[derive(Debug)]
enum LoopControl {
    Update(Arc<GroupProgram>),
    Stop { resting: Option<LightState> },
}

/// Controller-side handle to a running loop. Dropping it ends the loop
/// at its next wakeup.
#[derive(Debug)]
pub struct LoopHandle {
    group: GroupName,
    id: u64,
    program: Arc<GroupProgram>,
    control: mpsc::UnboundedSender<LoopControl>,
    state: watch::Receiver<LoopState>,
}

impl LoopHandle {
    /// Start a loop with an entropy-seeded generator. The first tick fires
    /// immediately.
    pub fn spawn(runtime: GroupRuntime, events: LoopEventSender) -> Self {
        Self::spawn_with_rng(runtime, events, StdRng::from_entropy())
    }

    pub fn spawn_with_rng<R>(runtime: GroupRuntime, events: LoopEventSender, rng: R) -> Self
    where
        R: Rng + Send + 'static,
    {
        let group = runtime.group();
        let program = Arc::clone(runtime.program());
        let id = NEXT_LOOP_ID.fetch_add(1, Ordering::Relaxed);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(LoopState::Idle);

        tokio::spawn(async move {
            state_tx.send_replace(LoopState::Running);
            info!(
                "{group} loop #{id} started ({} bulbs, every {:.1}s)",
                runtime.bulbs().len(),
                runtime.program().cycletime.as_secs_f64()
            );

            // A panic inside the tick stays inside this inner task
            let exit = match tokio::spawn(run(runtime, control_rx, rng)).await {
                Ok(Ok(())) => LoopExit::Stopped,
                Ok(Err(e)) => {
                    error!("{group} loop #{id} failed: {e}");
                    LoopExit::Failed(e.to_string())
                }
                Err(e) if e.is_panic() => {
                    error!("{group} loop #{id} panicked");
                    LoopExit::Failed("animation loop panicked".to_string())
                }
                Err(_) => LoopExit::Stopped,
            };

            state_tx.send_replace(LoopState::Stopped);
            debug!("{group} loop #{id} stopped");
            let _ = events.send(LoopEvent { group, id, exit });
        });

        Self {
            group,
            id,
            program,
            control: control_tx,
            state: state_rx,
        }
    }

    pub fn group(&self) -> GroupName {
        self.group
    }

    /// Identity of this loop instance; a restarted group gets a new id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Program most recently handed to the loop.
    pub fn program(&self) -> &Arc<GroupProgram> {
        &self.program
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() != LoopState::Stopped
    }

    /// Hot-swap the program. Observed by the next tick at the latest.
    pub fn update(&mut self, program: Arc<GroupProgram>) -> Result<(), LoopError> {
        self.control
            .send(LoopControl::Update(Arc::clone(&program)))
            .map_err(|_| LoopError::NotRunning(self.group))?;
        self.program = program;
        Ok(())
    }

    /// Ask the loop to stop, optionally applying a resting state on its
    /// way out. No tick runs after the loop sees the request.
    pub fn stop(&self, resting: Option<LightState>) -> Result<(), LoopError> {
        self.control
            .send(LoopControl::Stop { resting })
            .map_err(|_| LoopError::NotRunning(self.group))
    }

    /// Resolves once the loop has reached `Stopped`.
    pub async fn stopped(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| *s == LoopState::Stopped).await;
    }
}

async fn run<R: Rng>(
    mut runtime: GroupRuntime,
    mut control: mpsc::UnboundedReceiver<LoopControl>,
    mut rng: R,
) -> Result<(), LoopError> {
    let group = runtime.group();
    let mut deadline = Instant::now();

    loop {
        tokio::select! {
            biased;

            msg = control.recv() => match msg {
                Some(LoopControl::Update(program)) => {
                    debug!("{group} program swapped");
                    runtime.swap_program(program);
                }
                Some(LoopControl::Stop { resting }) => {
                    let unreachable = runtime.bulbs().unreachable();
                    if !unreachable.is_empty() {
                        info!("{group} stopping with bulbs not responding: {unreachable:?}");
                    }
                    if let Some(state) = resting {
                        info!("{group} resting at {}", state.describe());
                        runtime.bulbs().apply(state);
                    }
                    return Ok(());
                }
                None => return Ok(()),
            },

            _ = sleep_until(deadline) => {
                let started = Instant::now();
                runtime.tick(started, &mut rng)?;

                // Missed ticks are skipped, never queued. A late tick restarts
                // the cadence from when it ran.
                deadline = deadline.max(started) + runtime.program().cycletime;
                let now = Instant::now();
                if deadline < now {
                    deadline = now;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{BrightnessRange, GroupSpec, Pattern};
    use crate::daemon::bulbs::BulbGroup;
    use std::net::SocketAddr;
    use std::time::Duration;
    use wiz_transport::{DryRunTransport, Rgb};

    fn runtime(cycletime: Duration) -> GroupRuntime {
        let (reports, _) = mpsc::unbounded_channel();
        let bulbs = BulbGroup::new(
            GroupName::Backdrop,
            &[SocketAddr::from(([10, 0, 0, 1], 38899))],
            Arc::new(DryRunTransport),
            reports,
        );
        let program = GroupProgram::new(
            GroupSpec {
                pattern: Pattern::Rgb {
                    base: Rgb::new(1, 2, 3),
                    variance: [0, 0, 0],
                },
                brightness: BrightnessRange { min: 5, max: 5 },
                flash: None,
            },
            cycletime,
        );
        GroupRuntime::new(bulbs, Arc::new(program))
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_reaches_stopped_and_reports() {
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let handle = LoopHandle::spawn(runtime(Duration::from_secs(2)), events_tx);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(handle.state(), LoopState::Running);

        handle.stop(None).unwrap();
        handle.stopped().await;
        assert!(!handle.is_running());

        let event = events.recv().await.unwrap();
        assert_eq!(event.group, GroupName::Backdrop);
        assert_eq!(event.id, handle.id());
        assert_eq!(event.exit, LoopExit::Stopped);

        // Channel is closed once the loop is gone
        assert!(matches!(
            handle.stop(None),
            Err(LoopError::NotRunning(GroupName::Backdrop))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_ids_are_unique() {
        let (events_tx, _events) = mpsc::unbounded_channel();
        let a = LoopHandle::spawn(runtime(Duration::from_secs(1)), events_tx.clone());
        let b = LoopHandle::spawn(runtime(Duration::from_secs(1)), events_tx);
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_ends_loop() {
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let handle = LoopHandle::spawn(runtime(Duration::from_secs(1)), events_tx);
        let id = handle.id();
        drop(handle);
        let event = events.recv().await.unwrap();
        assert_eq!((event.id, event.exit), (id, LoopExit::Stopped));
    }
}
