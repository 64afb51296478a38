//! Tween records and loop policy
//!
//! A [`TweenRecord`] holds everything the scheduler needs for one tween. The
//! time arithmetic lives here; callback dispatch lives in the scheduler so
//! that caller code never runs while pool state is borrowed.

use crate::easing::Ease;
use crate::id::TweenId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

/// Loop count meaning "repeat forever". Any negative count is unbounded.
pub const LOOP_INFINITE: i32 = -1;

/// What happens when an iteration completes and more remain
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopKind {
    /// Jump back to the start and play forward again
    #[default]
    Restart,
    /// Reverse direction each iteration
    Yoyo,
    /// Restart from the beginning. Callers that want accumulated values must
    /// track the iteration count in their update callback.
    Incremental,
}

/// Return type accepted from tween callbacks
///
/// Callbacks may return `()` or any `Result<(), E>` whose error converts into
/// [`anyhow::Error`]. Errors are reported to the scheduler's fault sink.
pub trait HookOutput {
    fn into_result(self) -> anyhow::Result<()>;
}

impl HookOutput for () {
    fn into_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E> HookOutput for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

/// Start / step-complete / complete callback
pub(crate) type ActionHook = Rc<RefCell<dyn FnMut() -> anyhow::Result<()>>>;
/// Update callback, receives eased time
pub(crate) type UpdateHook = Rc<RefCell<dyn FnMut(f32) -> anyhow::Result<()>>>;
/// Caller-supplied easing function, receives raw normalized time
pub(crate) type CustomEase = Rc<dyn Fn(f32) -> f32>;

pub(crate) fn action_hook<F, R>(mut f: F) -> ActionHook
where
    F: FnMut() -> R + 'static,
    R: HookOutput,
{
    Rc::new(RefCell::new(move || f().into_result()))
}

pub(crate) fn update_hook<F, R>(mut f: F) -> UpdateHook
where
    F: FnMut(f32) -> R + 'static,
    R: HookOutput,
{
    Rc::new(RefCell::new(move |t: f32| f(t).into_result()))
}

/// Callback slots of a tween
#[derive(Default)]
pub(crate) struct Hooks {
    pub on_start: Option<ActionHook>,
    pub on_update: Option<UpdateHook>,
    pub on_step_complete: Option<ActionHook>,
    /// Invoked in registration order
    pub on_complete: SmallVec<[ActionHook; 2]>,
}

/// One live tween as stored in the pool
///
/// Occupancy of the pool slot is the `active` flag: a record only exists
/// while its tween is live.
pub(crate) struct TweenRecord {
    pub id: TweenId,
    pub duration: f32,
    pub elapsed: f32,
    pub delay: f32,
    pub paused: bool,
    pub ease: Ease,
    pub custom_ease: Option<CustomEase>,
    pub loops: i32,
    pub loop_kind: LoopKind,
    pub loops_completed: u32,
    pub playing_backwards: bool,
    pub started: bool,
    /// Tick epoch the tween was created in
    pub spawned_epoch: u64,
    pub hooks: Hooks,
}

impl TweenRecord {
    pub fn new(id: TweenId, duration: f32, ease: Ease, spawned_epoch: u64) -> Self {
        Self {
            id,
            duration,
            elapsed: 0.0,
            delay: 0.0,
            paused: false,
            ease,
            custom_ease: None,
            loops: 1,
            loop_kind: LoopKind::Restart,
            loops_completed: 0,
            playing_backwards: false,
            started: false,
            spawned_epoch,
            hooks: Hooks::default(),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.loops < 0
    }

    /// Consume `dt` from the remaining delay
    ///
    /// Returns the time left over for this tick once the delay has run out,
    /// or `None` while the tween is still waiting.
    pub fn consume_delay(&mut self, dt: f32) -> Option<f32> {
        if self.delay <= 0.0 {
            return Some(dt);
        }
        self.delay -= dt;
        if self.delay > 0.0 {
            return None;
        }
        let overshoot = -self.delay;
        self.delay = 0.0;
        Some(overshoot)
    }

    /// Integrate `dt` in the current direction
    ///
    /// Returns true when the iteration reached its boundary; `elapsed` is
    /// clamped to that boundary.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.playing_backwards {
            self.elapsed -= dt;
            if self.elapsed <= 0.0 {
                self.elapsed = 0.0;
                return true;
            }
        } else {
            self.elapsed += dt;
            if self.elapsed >= self.duration {
                self.elapsed = self.duration;
                return true;
            }
        }
        false
    }

    pub fn normalized_time(&self) -> f32 {
        if self.duration > 0.0 {
            self.elapsed / self.duration
        } else {
            1.0
        }
    }

    /// Count a finished iteration and apply the loop policy
    ///
    /// Returns true when the tween has run all of its iterations.
    pub fn complete_iteration(&mut self) -> bool {
        self.loops_completed = self.loops_completed.saturating_add(1);

        if !self.is_unbounded() && self.loops_completed as i64 >= self.loops as i64 {
            return true;
        }

        match self.loop_kind {
            LoopKind::Restart | LoopKind::Incremental => {
                self.elapsed = 0.0;
            }
            LoopKind::Yoyo => {
                self.playing_backwards = !self.playing_backwards;
            }
        }
        false
    }

    pub fn state(&self) -> TweenState {
        TweenState {
            id: self.id,
            duration: self.duration,
            elapsed: self.elapsed,
            delay: self.delay,
            paused: self.paused,
            ease: self.ease,
            has_custom_ease: self.custom_ease.is_some(),
            loops: self.loops,
            loop_kind: self.loop_kind,
            loops_completed: self.loops_completed,
            playing_backwards: self.playing_backwards,
            started: self.started,
        }
    }
}

/// Snapshot of a live tween's configuration and progress
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TweenState {
    pub id: TweenId,
    pub duration: f32,
    pub elapsed: f32,
    /// Remaining delay before the tween starts
    pub delay: f32,
    pub paused: bool,
    pub ease: Ease,
    /// A custom easing function overrides `ease`
    pub has_custom_ease: bool,
    pub loops: i32,
    pub loop_kind: LoopKind,
    pub loops_completed: u32,
    pub playing_backwards: bool,
    pub started: bool,
}

impl TweenState {
    /// Raw (un-eased) progress through the current iteration
    pub fn progress(&self) -> f32 {
        if self.duration > 0.0 {
            self.elapsed / self.duration
        } else {
            1.0
        }
    }
}
