//! Lighting daemon: per-group animation loops behind a JSON-lines
//! command channel.
//!
//! ```text
//! stdin ──> server ──> DaemonController ──> LoopHandle (one per group)
//!                          ^                     │ tick: Animator -> BulbGroup
//!                          │                     v
//! stdout <── server <── loop / dispatch events   bulbs (fire-and-forget)
//! ```
//!
//! Each group's runtime state is owned by its loop task; the controller
//! only ever sends it a new program or a stop request.

pub mod bulbs;
pub mod controller;
pub mod group_loop;
pub mod protocol;
pub mod server;
pub mod state;

pub use bulbs::{BulbGroup, BulbHandle, DispatchFailure};
pub use controller::{Applied, ControllerEvents, DaemonController};
pub use group_loop::{LoopError, LoopEvent, LoopExit, LoopHandle, LoopState};
pub use protocol::{DaemonMessage, DaemonRequest, ProtocolError, RestingPreset, RestingState};
pub use server::serve;
pub use state::{Animator, GroupProgram, GroupRuntime, Tick, TickKind};
