//! The daemon controller: owns one animation loop per group and applies
//! start / update / stop requests to them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wiz_transport::{BoxedTransport, LightState};

use super::bulbs::{BulbGroup, DispatchFailure, ReportSender};
use super::group_loop::{LoopEvent, LoopEventSender, LoopExit, LoopHandle};
use super::state::{GroupProgram, GroupRuntime};
use crate::animation::{self, AnimationConfig, AnimationConfigDef, ConfigError, GroupName};
use crate::inventory::BulbInventory;

/// Receivers for everything loops and dispatches report asynchronously.
pub struct ControllerEvents {
    pub dispatch: mpsc::UnboundedReceiver<DispatchFailure>,
    pub loops: mpsc::UnboundedReceiver<LoopEvent>,
}

/// Result of a successful start or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub message: &'static str,
    /// Groups with a live loop afterwards
    pub running: Vec<GroupName>,
    /// Disabled groups that were powered off
    pub turned_off: Vec<GroupName>,
    /// Configured groups with no bulbs in the inventory
    pub without_bulbs: Vec<GroupName>,
    /// Failed groups left stopped until the next start
    pub failed: Vec<GroupName>,
}

impl Applied {
    fn new(message: &'static str) -> Self {
        Self {
            message,
            running: Vec::new(),
            turned_off: Vec::new(),
            without_bulbs: Vec::new(),
            failed: Vec::new(),
        }
    }
}

pub mod status {
    pub const STARTED: &str = "Animation started";
    pub const UPDATED: &str = "Animation configuration updated (hot-swapped)";
    pub const STOPPED: &str = "Animation stopped";
    pub const NOT_RUNNING: &str = "No animation running";
}

pub struct DaemonController {
    inventory: BulbInventory,
    transport: BoxedTransport,
    reports: ReportSender,
    events: LoopEventSender,
    loops: BTreeMap<GroupName, LoopHandle>,
    /// Groups whose loop failed since the last start
    failed: BTreeSet<GroupName>,
    config: Option<Arc<AnimationConfig>>,
}

impl DaemonController {
    pub fn new(inventory: BulbInventory, transport: BoxedTransport) -> (Self, ControllerEvents) {
        let (reports, dispatch) = mpsc::unbounded_channel();
        let (events, loops) = mpsc::unbounded_channel();
        let controller = Self {
            inventory,
            transport,
            reports,
            events,
            loops: BTreeMap::new(),
            failed: BTreeSet::new(),
            config: None,
        };
        (controller, ControllerEvents { dispatch, loops })
    }

    pub fn inventory(&self) -> &BulbInventory {
        &self.inventory
    }

    /// True between a successful start and the next stop.
    pub fn animation_running(&self) -> bool {
        self.config.is_some()
    }

    /// Groups whose loop is currently live.
    pub fn running_groups(&self) -> Vec<GroupName> {
        self.loops
            .iter()
            .filter(|(_, handle)| handle.is_running())
            .map(|(&group, _)| group)
            .collect()
    }

    /// Loop instance id per live group.
    pub fn loop_ids(&self) -> BTreeMap<GroupName, u64> {
        self.loops
            .iter()
            .filter(|(_, handle)| handle.is_running())
            .map(|(&group, handle)| (group, handle.id()))
            .collect()
    }

    /// Replace whatever is running with `def`.
    ///
    /// The config is resolved before anything is touched, so a bad config
    /// leaves the current animation as it was.
    pub fn start_animation(&mut self, def: &AnimationConfigDef) -> Result<Applied, ConfigError> {
        let config = Arc::new(animation::resolve(def)?);

        for (group, handle) in std::mem::take(&mut self.loops) {
            if handle.stop(None).is_err() {
                debug!("{group} loop already stopped");
            }
        }
        self.failed.clear();

        let mut applied = Applied::new(status::STARTED);
        for (&group, spec) in &config.groups {
            if spec.is_off() {
                self.power_off(group, &mut applied);
                continue;
            }
            let program = Arc::new(GroupProgram::new(spec.clone(), config.cycletime));
            self.start_loop(group, program, &mut applied);
        }

        info!(
            "animation started: {} groups, cycletime {:.1}s",
            applied.running.len(),
            config.cycletime.as_secs_f64()
        );
        self.config = Some(config);
        Ok(applied)
    }

    /// Hot-swap to `def` without interrupting groups present before and
    /// after. Starts fresh when nothing is running.
    pub fn update_animation(&mut self, def: &AnimationConfigDef) -> Result<Applied, ConfigError> {
        let Some(previous) = self.config.clone() else {
            return self.start_animation(def);
        };
        let config = Arc::new(animation::resolve(def)?);
        let mut applied = Applied::new(status::UPDATED);

        // Groups dropped or disabled by the new config
        let live: Vec<GroupName> = self.loops.keys().copied().collect();
        for group in live {
            let keep = config.groups.get(&group).is_some_and(|spec| !spec.is_off());
            if !keep {
                if let Some(handle) = self.loops.remove(&group) {
                    if handle.stop(None).is_err() {
                        debug!("{group} loop already stopped");
                    }
                    info!("{group} removed from animation");
                }
            }
        }

        for (&group, spec) in &config.groups {
            if spec.is_off() {
                let was_off = previous.groups.get(&group).is_some_and(|s| s.is_off());
                if !was_off {
                    self.power_off(group, &mut applied);
                }
                continue;
            }
            if self.failed.contains(&group) {
                applied.failed.push(group);
                continue;
            }

            let program = Arc::new(GroupProgram::new(spec.clone(), config.cycletime));
            match self.loops.get_mut(&group) {
                Some(handle) if handle.program() == &program => {
                    applied.running.push(group);
                }
                Some(handle) => match handle.update(Arc::clone(&program)) {
                    Ok(()) => {
                        debug!("{group} program hot-swapped");
                        applied.running.push(group);
                    }
                    Err(e) => {
                        // Died before its exit event was seen
                        warn!("{e}; left stopped");
                        self.loops.remove(&group);
                        self.failed.insert(group);
                        applied.failed.push(group);
                    }
                },
                None => self.start_loop(group, program, &mut applied),
            }
        }

        self.config = Some(config);
        Ok(applied)
    }

    /// Stop every loop, leaving every configured group's bulbs at
    /// `resting` if given.
    pub fn stop(&mut self, resting: Option<LightState>) -> &'static str {
        let Some(config) = self.config.take() else {
            return status::NOT_RUNNING;
        };

        // Groups whose resting state is left to their own loop
        let mut resting_in_loop = BTreeSet::new();
        for (group, handle) in std::mem::take(&mut self.loops) {
            // The loop applies the resting state itself after its last tick
            if handle.stop(resting).is_ok() {
                resting_in_loop.insert(group);
            }
        }
        self.failed.clear();

        if let Some(state) = resting {
            // Disabled, failed and dead groups are rested directly
            for &group in config.groups.keys() {
                if !resting_in_loop.contains(&group) {
                    self.group(group).apply(state);
                }
            }
        }

        info!("animation stopped");
        status::STOPPED
    }

    /// Record a loop reaching `Stopped`. Returns a description when it
    /// failed while still being the group's current loop.
    pub fn on_loop_exit(&mut self, event: &LoopEvent) -> Option<String> {
        let LoopExit::Failed(reason) = &event.exit else {
            return None;
        };
        match self.loops.get(&event.group) {
            Some(handle) if handle.id() == event.id => {
                self.loops.remove(&event.group);
                self.failed.insert(event.group);
                warn!("{} loop stopped after failure: {reason}", event.group);
                Some(reason.clone())
            }
            _ => None,
        }
    }

    /// Stop all loops and wait for each to finish.
    pub async fn shutdown(&mut self) {
        self.config = None;
        self.failed.clear();
        let loops = std::mem::take(&mut self.loops);
        for handle in loops.values() {
            let _ = handle.stop(None);
        }
        for handle in loops.values() {
            handle.stopped().await;
        }
    }

    fn group(&self, group: GroupName) -> BulbGroup {
        BulbGroup::new(
            group,
            self.inventory.addresses(group),
            Arc::clone(&self.transport),
            self.reports.clone(),
        )
    }

    fn power_off(&self, group: GroupName, applied: &mut Applied) {
        let bulbs = self.group(group);
        if !bulbs.is_empty() {
            info!("{group} disabled, turning off {} bulbs", bulbs.len());
            bulbs.turn_off();
        }
        applied.turned_off.push(group);
    }

    fn start_loop(&mut self, group: GroupName, program: Arc<GroupProgram>, applied: &mut Applied) {
        let bulbs = self.group(group);
        if bulbs.is_empty() {
            warn!("{group} is configured but has no bulbs");
            applied.without_bulbs.push(group);
            return;
        }
        let handle = LoopHandle::spawn(GroupRuntime::new(bulbs, program), self.events.clone());
        self.loops.insert(group, handle);
        applied.running.push(group);
    }
}
