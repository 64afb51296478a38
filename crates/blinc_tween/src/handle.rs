//! Fluent tween handle
//!
//! A [`Tween`] is what `create` hands back: the tween's id plus a weak
//! scheduler handle. Builder-style methods configure the tween in place and
//! return the handle for chaining:
//!
//! ```
//! use blinc_tween::{Ease, LoopKind, TweenScheduler};
//!
//! let scheduler = TweenScheduler::new();
//! let tween = scheduler
//!     .create(0.4, |t| println!("progress {t}"))
//!     .ease(Ease::OutBack)
//!     .loops(2, LoopKind::Yoyo)
//!     .delay(0.1)
//!     .on_complete(|| println!("done"));
//!
//! assert!(tween.is_live());
//! ```
//!
//! A chained call on a tween that has already finished or been cancelled
//! does nothing to the scheduler; it reports [`TweenFault::Stale`] to the
//! fault sink and the chain carries on.

use crate::easing::Ease;
use crate::error::{Result, TweenError, TweenFault};
use crate::id::TweenId;
use crate::scheduler::SchedulerHandle;
use crate::tween::{HookOutput, LoopKind, TweenState};

/// Handle to a scheduled tween
#[derive(Clone)]
pub struct Tween {
    id: TweenId,
    scheduler: SchedulerHandle,
}

impl Tween {
    pub(crate) fn new(id: TweenId, scheduler: SchedulerHandle) -> Self {
        Self { id, scheduler }
    }

    pub fn id(&self) -> TweenId {
        self.id
    }

    /// The scheduler this tween belongs to
    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    fn settle(&self, operation: &'static str, result: Result<()>) {
        match result {
            Ok(()) => {}
            Err(TweenError::NotFound(tween)) => {
                self.scheduler.report(TweenFault::Stale { tween, operation })
            }
            Err(err) => tracing::debug!("tween {}: {} skipped: {}", self.id, operation, err),
        }
    }

    // =========================================================================
    // Chained configuration
    // =========================================================================

    pub fn ease(self, ease: Ease) -> Self {
        self.settle("ease", self.scheduler.set_ease(self.id, ease));
        self
    }

    pub fn custom_ease<F>(self, ease_fn: F) -> Self
    where
        F: Fn(f32) -> f32 + 'static,
    {
        self.settle("custom_ease", self.scheduler.set_custom_ease(self.id, ease_fn));
        self
    }

    /// Set loop count (-1 for infinite) and loop policy
    pub fn loops(self, count: i32, kind: LoopKind) -> Self {
        self.settle("loops", self.scheduler.set_loops(self.id, count, kind));
        self
    }

    pub fn delay(self, delay: f32) -> Self {
        self.settle("delay", self.scheduler.set_delay(self.id, delay));
        self
    }

    pub fn on_start<F, R>(self, f: F) -> Self
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.settle("on_start", self.scheduler.set_on_start(self.id, f));
        self
    }

    pub fn on_update<F, R>(self, f: F) -> Self
    where
        F: FnMut(f32) -> R + 'static,
        R: HookOutput,
    {
        self.settle("on_update", self.scheduler.set_on_update(self.id, f));
        self
    }

    pub fn on_step_complete<F, R>(self, f: F) -> Self
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.settle(
            "on_step_complete",
            self.scheduler.set_on_step_complete(self.id, f),
        );
        self
    }

    /// Replace the completion callbacks with `f`
    pub fn on_complete<F, R>(self, f: F) -> Self
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.settle("on_complete", self.scheduler.set_on_complete(self.id, f));
        self
    }

    /// Run `f` after the existing completion callbacks
    pub fn then<F, R>(self, f: F) -> Self
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.settle("then", self.scheduler.add_on_complete(self.id, f));
        self
    }

    // =========================================================================
    // Control and queries
    // =========================================================================

    pub fn pause(&self) {
        self.settle("pause", self.scheduler.set_paused(self.id, true));
    }

    pub fn play(&self) {
        self.settle("play", self.scheduler.set_paused(self.id, false));
    }

    /// Cancel the tween. Returns false if it was already gone.
    pub fn cancel(&self) -> bool {
        self.scheduler.cancel(self.id)
    }

    pub fn is_live(&self) -> bool {
        self.scheduler.is_live(self.id)
    }

    pub fn state(&self) -> Result<TweenState> {
        self.scheduler.state(self.id)
    }
}

impl std::fmt::Debug for Tween {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tween")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}
