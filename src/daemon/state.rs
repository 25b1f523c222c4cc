//! Per-group runtime state: the held program, flash tracking, and the
//! evaluate-then-apply step run once per tick.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::debug;
use wiz_transport::LightState;

use crate::animation::model::{self, ModelError};
use crate::animation::{AnimationConfig, GroupName, GroupSpec};
use crate::daemon::bulbs::BulbGroup;

/// What one group's loop executes: its resolved spec plus the show-wide
/// cadence. Shared immutably; a hot-swap replaces the whole `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupProgram {
    pub spec: GroupSpec,
    pub cycletime: Duration,
}

impl GroupProgram {
    pub fn new(spec: GroupSpec, cycletime: Duration) -> Self {
        Self { spec, cycletime }
    }

    /// Program for `group` in `config`, if the group is configured.
    pub fn from_config(config: &AnimationConfig, group: GroupName) -> Option<Self> {
        config
            .groups
            .get(&group)
            .map(|spec| Self::new(spec.clone(), config.cycletime))
    }
}

/// How a tick's state came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// Fresh draw from the base pattern
    Base,
    /// A flash started on this tick
    FlashStart,
    /// A flash started earlier is still in effect
    FlashHeld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub state: LightState,
    pub kind: TickKind,
}

#[derive(Debug, Clone, Copy)]
struct ActiveFlash {
    state: LightState,
    until: Instant,
}

/// Turns a program into one state per tick.
///
/// Flash rules: while a flash is active every tick re-sends it; the tick on
/// which it expires performs a base draw without rolling; any other tick
/// rolls for a new flash before drawing.
#[derive(Debug)]
pub struct Animator {
    program: Arc<GroupProgram>,
    flash: Option<ActiveFlash>,
    last: Option<LightState>,
}

impl Animator {
    pub fn new(program: Arc<GroupProgram>) -> Self {
        Self {
            program,
            flash: None,
            last: None,
        }
    }

    pub fn program(&self) -> &Arc<GroupProgram> {
        &self.program
    }

    /// Last state produced, if any tick has run.
    pub fn last(&self) -> Option<LightState> {
        self.last
    }

    /// Replace the held program. Takes effect on the next call to
    /// [`Animator::next`]; a flash in progress survives only if the new
    /// program flashes the same way.
    pub fn swap_program(&mut self, program: Arc<GroupProgram>) {
        if program.spec.flash != self.program.spec.flash {
            self.flash = None;
        }
        self.program = program;
    }

    /// Compute the state for the tick happening at `now`.
    pub fn next<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> Result<Tick, ModelError> {
        let spec = &self.program.spec;
        let held = self.flash;

        let tick = match held {
            Some(active) if now < active.until => Tick {
                state: active.state,
                kind: TickKind::FlashHeld,
            },
            Some(_) => {
                self.flash = None;
                Tick {
                    state: model::draw_base(spec, rng)?,
                    kind: TickKind::Base,
                }
            }
            None => match spec.flash.as_ref().filter(|f| model::roll_flash(Some(*f), rng)) {
                Some(flash) => {
                    let state = model::flash_state(flash);
                    self.flash = Some(ActiveFlash {
                        state,
                        until: now + flash.duration,
                    });
                    Tick {
                        state,
                        kind: TickKind::FlashStart,
                    }
                }
                None => Tick {
                    state: model::draw_base(spec, rng)?,
                    kind: TickKind::Base,
                },
            },
        };

        self.last = Some(tick.state);
        Ok(tick)
    }
}

/// Everything one animation loop owns exclusively.
pub struct GroupRuntime {
    bulbs: BulbGroup,
    animator: Animator,
}

impl GroupRuntime {
    pub fn new(bulbs: BulbGroup, program: Arc<GroupProgram>) -> Self {
        Self {
            bulbs,
            animator: Animator::new(program),
        }
    }

    pub fn group(&self) -> GroupName {
        self.bulbs.name()
    }

    pub fn bulbs(&self) -> &BulbGroup {
        &self.bulbs
    }

    pub fn program(&self) -> &Arc<GroupProgram> {
        self.animator.program()
    }

    pub fn swap_program(&mut self, program: Arc<GroupProgram>) {
        self.animator.swap_program(program);
    }

    /// One tick: evaluate the model, then hand the state to every bulb
    /// without waiting on any of them.
    pub fn tick<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> Result<Tick, ModelError> {
        let tick = self.animator.next(now, rng)?;
        debug!(
            "{} tick ({:?}): {}",
            self.bulbs.name(),
            tick.kind,
            tick.state.describe()
        );
        self.bulbs.apply(tick.state);
        Ok(tick)
    }
}
