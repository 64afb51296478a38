//! Tween scheduler
//!
//! Owns the slot pool and advances every live tween once per tick.
//!
//! The scheduler is single-threaded: state sits behind a `RefCell` and the
//! borrow is never held while caller code runs. Callbacks can therefore
//! create, cancel, and configure tweens (through a captured
//! [`SchedulerHandle`]) in the middle of a tick:
//!
//! - a tween cancelled by a callback is skipped when the tick reaches it
//! - a tween created during a tick is first processed on the next tick
//! - a slot freed and reused during a tick is not processed under its new tween

use crate::config::SchedulerConfig;
use crate::easing::Ease;
use crate::error::{panic_message, FaultSink, Hook, LogSink, Result, TweenError, TweenFault};
use crate::handle::Tween;
use crate::id::TweenId;
use crate::pool::{SlotPool, TweenKey};
use crate::tween::{
    action_hook, update_hook, ActionHook, CustomEase, HookOutput, LoopKind, TweenRecord,
    TweenState, UpdateHook,
};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

/// Mutable scheduler state
struct SchedulerState {
    pool: SlotPool,
    config: SchedulerConfig,
    /// Incremented at the start of every tick
    epoch: u64,
    ticking: bool,
    /// Reused key buffer so steady-state ticks don't allocate
    tick_keys: Vec<TweenKey>,
}

/// State plus the fault channel, shared by the scheduler and its handles
struct Shared {
    state: RefCell<SchedulerState>,
    sink: Box<dyn FaultSink>,
}

/// Clears the ticking flag even if a fault sink unwinds out of a tick
struct TickGuard<'a> {
    shared: &'a Shared,
    keys: Vec<TweenKey>,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.state.try_borrow_mut() {
            state.ticking = false;
            let mut keys = std::mem::take(&mut self.keys);
            keys.clear();
            state.tick_keys = keys;
        }
    }
}

impl Shared {
    fn new(config: SchedulerConfig, sink: Box<dyn FaultSink>) -> Self {
        tracing::debug!(
            "TweenScheduler: created with {} slots",
            config.initial_capacity
        );
        Self {
            state: RefCell::new(SchedulerState {
                pool: SlotPool::with_capacity(config.initial_capacity),
                tick_keys: Vec::with_capacity(config.initial_capacity),
                config,
                epoch: 0,
                ticking: false,
            }),
            sink,
        }
    }

    fn report(&self, fault: TweenFault) {
        self.sink.report(fault);
    }

    // =========================================================================
    // Creation and lookup
    // =========================================================================

    fn create(&self, duration: f32, on_update: Option<UpdateHook>) -> TweenId {
        let duration = if duration.is_nan() || duration < 0.0 {
            tracing::warn!("TweenScheduler: invalid duration {}, using 0", duration);
            0.0
        } else {
            duration
        };

        let mut state = self.state.borrow_mut();
        let ease = state.config.default_ease;
        let epoch = state.epoch;
        let (id, _) = state.pool.allocate(|id| {
            let mut record = TweenRecord::new(id, duration, ease, epoch);
            record.hooks.on_update = on_update;
            record
        });
        tracing::trace!("tween {} created (duration {})", id, duration);
        id
    }

    /// Apply `f` to a live tween and return what it returns
    ///
    /// Anything `f` hands back is dropped after the state borrow ends, so
    /// replaced closures never drop while the pool is borrowed.
    fn configure<R>(&self, id: TweenId, f: impl FnOnce(&mut TweenRecord) -> R) -> Result<R> {
        let mut state = self.state.borrow_mut();
        let record = state.pool.find_record_mut(id)?;
        Ok(f(record))
    }

    fn is_live(&self, id: TweenId) -> bool {
        self.state.borrow().pool.contains(id)
    }

    fn tween_state(&self, id: TweenId) -> Result<TweenState> {
        self.state
            .borrow()
            .pool
            .find_record(id)
            .map(TweenRecord::state)
    }

    fn cancel(&self, id: TweenId) -> bool {
        let released = {
            let mut state = self.state.borrow_mut();
            match state.pool.find(id) {
                Ok(key) => state.pool.release(key),
                Err(_) => None,
            }
        };
        match released {
            Some(record) => {
                tracing::trace!("tween {} cancelled", id);
                drop(record);
                true
            }
            None => false,
        }
    }

    fn cancel_all(&self) -> usize {
        let released = self.state.borrow_mut().pool.drain();
        let count = released.len();
        if count > 0 {
            tracing::debug!("TweenScheduler: cancelled all {} tweens", count);
        }
        count
    }

    // =========================================================================
    // Tick processing
    // =========================================================================

    fn tick(&self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            tracing::warn!("TweenScheduler: ignoring invalid tick delta {}", dt);
            return;
        }

        let (dt, epoch, keys) = {
            let mut state = self.state.borrow_mut();
            if state.ticking {
                tracing::warn!("TweenScheduler: re-entrant tick ignored");
                return;
            }
            if state.pool.is_empty() {
                state.epoch += 1;
                return;
            }
            state.ticking = true;
            state.epoch += 1;

            let dt = match state.config.max_tick_delta {
                Some(max) if dt > max => max.max(0.0),
                _ => dt,
            };
            let mut keys = std::mem::take(&mut state.tick_keys);
            state.pool.collect_keys(&mut keys);
            (dt, state.epoch, keys)
        };

        let guard = TickGuard { shared: self, keys };
        for &key in &guard.keys {
            self.step(key, dt, epoch);
        }
    }

    /// Advance one tween by `dt`
    ///
    /// State is re-read from the pool after every callback: a callback may
    /// have cancelled this tween, in which case processing stops.
    fn step(&self, key: TweenKey, dt: f32, epoch: u64) {
        // Delay and start
        let (id, dt, on_start) = {
            let mut state = self.state.borrow_mut();
            let Some(record) = state.pool.get_mut(key) else {
                return;
            };
            if record.paused || record.spawned_epoch >= epoch {
                return;
            }
            let Some(dt) = record.consume_delay(dt) else {
                return;
            };
            let on_start = if record.started {
                None
            } else {
                record.started = true;
                record.hooks.on_start.clone()
            };
            (record.id, dt, on_start)
        };

        if let Some(hook) = on_start {
            self.run_action(id, Hook::Start, &hook);
        }

        // Integrate and report progress
        let (completed, normalized, ease, custom_ease, on_update) = {
            let mut state = self.state.borrow_mut();
            let Some(record) = state.pool.get_mut(key) else {
                return;
            };
            let completed = record.advance(dt);
            (
                completed,
                record.normalized_time(),
                record.ease,
                record.custom_ease.clone(),
                record.hooks.on_update.clone(),
            )
        };

        // Eased every step, so a faulting custom ease is reported even
        // without an update hook
        let eased = match custom_ease {
            Some(ease_fn) => self.run_custom_ease(id, &ease_fn, normalized),
            None => ease.apply(normalized),
        };
        if let Some(hook) = on_update {
            self.run_update(id, &hook, eased);
        }

        if !completed {
            return;
        }

        // Iteration boundary
        let on_step_complete = {
            let mut state = self.state.borrow_mut();
            let Some(record) = state.pool.get_mut(key) else {
                return;
            };
            record.hooks.on_step_complete.clone()
        };

        if let Some(hook) = on_step_complete {
            self.run_action(id, Hook::StepComplete, &hook);
        }

        let on_complete: SmallVec<[ActionHook; 2]> = {
            let mut state = self.state.borrow_mut();
            let Some(record) = state.pool.get_mut(key) else {
                return;
            };
            if !record.complete_iteration() {
                return;
            }
            record.hooks.on_complete.clone()
        };

        for hook in &on_complete {
            self.run_action(id, Hook::Complete, hook);
        }

        let released = self.state.borrow_mut().pool.release(key);
        if released.is_some() {
            tracing::trace!("tween {} finished", id);
        }
    }

    fn run_action(&self, id: TweenId, hook: Hook, action: &ActionHook) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut f = action.borrow_mut();
            (*f)()
        }));
        self.settle(id, hook, outcome);
    }

    fn run_update(&self, id: TweenId, update: &UpdateHook, eased: f32) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut f = update.borrow_mut();
            (*f)(eased)
        }));
        self.settle(id, Hook::Update, outcome);
    }

    /// Evaluate a custom easing function, falling back to the raw time on fault
    fn run_custom_ease(&self, id: TweenId, ease_fn: &CustomEase, t: f32) -> f32 {
        match panic::catch_unwind(AssertUnwindSafe(|| ease_fn(t))) {
            Ok(value) if value.is_finite() => value,
            Ok(value) => {
                self.report(TweenFault::NonFiniteEase { tween: id, value });
                t
            }
            Err(payload) => {
                self.report(TweenFault::Panicked {
                    tween: id,
                    hook: Hook::Ease,
                    message: panic_message(payload.as_ref()),
                });
                t
            }
        }
    }

    fn settle(&self, id: TweenId, hook: Hook, outcome: std::thread::Result<anyhow::Result<()>>) {
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(source)) => self.report(TweenFault::Callback {
                tween: id,
                hook,
                source,
            }),
            Err(payload) => self.report(TweenFault::Panicked {
                tween: id,
                hook,
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

// ============================================================================
// Configuration operations, shared by the scheduler and its handles
// ============================================================================

impl Shared {
    fn set_ease(&self, id: TweenId, ease: Ease) -> Result<()> {
        let old = self.configure(id, |r| {
            r.ease = ease;
            r.custom_ease.take()
        })?;
        drop(old);
        Ok(())
    }

    fn set_custom_ease(&self, id: TweenId, ease_fn: CustomEase) -> Result<()> {
        let old = self.configure(id, |r| r.custom_ease.replace(ease_fn))?;
        drop(old);
        Ok(())
    }

    fn clear_custom_ease(&self, id: TweenId) -> Result<()> {
        let old = self.configure(id, |r| r.custom_ease.take())?;
        drop(old);
        Ok(())
    }

    fn set_loops(&self, id: TweenId, loops: i32, kind: LoopKind) -> Result<()> {
        self.configure(id, |r| {
            r.loops = loops;
            r.loop_kind = kind;
        })
    }

    fn set_delay(&self, id: TweenId, delay: f32) -> Result<()> {
        let delay = if delay.is_nan() { 0.0 } else { delay.max(0.0) };
        self.configure(id, |r| r.delay = delay)
    }

    fn set_paused(&self, id: TweenId, paused: bool) -> Result<()> {
        self.configure(id, |r| r.paused = paused)
    }

    fn set_on_start(&self, id: TweenId, hook: ActionHook) -> Result<()> {
        let old = self.configure(id, |r| r.hooks.on_start.replace(hook))?;
        drop(old);
        Ok(())
    }

    fn set_on_update(&self, id: TweenId, hook: UpdateHook) -> Result<()> {
        let old = self.configure(id, |r| r.hooks.on_update.replace(hook))?;
        drop(old);
        Ok(())
    }

    fn set_on_step_complete(&self, id: TweenId, hook: ActionHook) -> Result<()> {
        let old = self.configure(id, |r| r.hooks.on_step_complete.replace(hook))?;
        drop(old);
        Ok(())
    }

    fn set_on_complete(&self, id: TweenId, hook: ActionHook) -> Result<()> {
        let old = self.configure(id, |r| {
            let mut hooks = SmallVec::new();
            hooks.push(hook);
            std::mem::replace(&mut r.hooks.on_complete, hooks)
        })?;
        drop(old);
        Ok(())
    }

    fn add_on_complete(&self, id: TweenId, hook: ActionHook) -> Result<()> {
        self.configure(id, |r| r.hooks.on_complete.push(hook))
    }
}

// ============================================================================
// TweenScheduler
// ============================================================================

/// The tween scheduler
///
/// Owned by the host, which calls [`TweenScheduler::tick`] once per frame.
/// Code that creates tweens (including callbacks) should hold a
/// [`SchedulerHandle`] instead of the scheduler itself.
///
/// ```
/// use blinc_tween::{Ease, TweenScheduler};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let scheduler = TweenScheduler::new();
/// let progress = Rc::new(Cell::new(0.0));
/// let sink = progress.clone();
///
/// scheduler
///     .create(1.0, move |t| sink.set(t))
///     .ease(Ease::InQuad);
///
/// scheduler.tick(0.5);
/// assert_eq!(progress.get(), 0.25);
/// ```
#[derive(Clone)]
pub struct TweenScheduler {
    shared: Rc<Shared>,
}

impl TweenScheduler {
    /// Create a scheduler with the default config, logging faults via tracing
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self::with_sink(config, LogSink)
    }

    /// Create a scheduler that reports faults to `sink`
    pub fn with_sink(config: SchedulerConfig, sink: impl FaultSink + 'static) -> Self {
        Self {
            shared: Rc::new(Shared::new(config, Box::new(sink))),
        }
    }

    /// Get a weak handle for passing to components and callbacks
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Advance every live, unpaused tween by `dt` seconds
    ///
    /// Runs all callbacks synchronously and recycles finished tweens before
    /// returning. Negative or non-finite deltas are ignored, as is a tick
    /// issued from inside a callback of a tick in progress.
    pub fn tick(&self, dt: f32) {
        self.shared.tick(dt);
    }

    /// Create a tween that reports eased progress to `on_update`
    ///
    /// Defaults: the configured default ease, one loop, restart policy, no
    /// delay.
    pub fn create<F, R>(&self, duration: f32, on_update: F) -> Tween
    where
        F: FnMut(f32) -> R + 'static,
        R: HookOutput,
    {
        let id = self.shared.create(duration, Some(update_hook(on_update)));
        Tween::new(id, self.handle())
    }

    /// Create a tween without an update callback
    pub fn create_silent(&self, duration: f32) -> Tween {
        let id = self.shared.create(duration, None);
        Tween::new(id, self.handle())
    }

    /// Cancel a tween. Returns false if it was not live.
    pub fn cancel(&self, id: TweenId) -> bool {
        self.shared.cancel(id)
    }

    /// Cancel every tween, returning how many were live
    pub fn cancel_all(&self) -> usize {
        self.shared.cancel_all()
    }

    pub fn is_live(&self, id: TweenId) -> bool {
        self.shared.is_live(id)
    }

    /// Snapshot a live tween
    pub fn state(&self, id: TweenId) -> Result<TweenState> {
        self.shared.tween_state(id)
    }

    /// Number of live tweens
    pub fn live_count(&self) -> usize {
        self.shared.state.borrow().pool.len()
    }

    /// Number of reserved slots
    pub fn capacity(&self) -> usize {
        self.shared.state.borrow().pool.capacity()
    }

    /// Check if any tweens are live
    pub fn has_active_tweens(&self) -> bool {
        !self.shared.state.borrow().pool.is_empty()
    }

    /// Number of ticks processed so far
    pub fn tick_count(&self) -> u64 {
        self.shared.state.borrow().epoch
    }

    pub fn config(&self) -> SchedulerConfig {
        self.shared.state.borrow().config.clone()
    }

    /// Forward a fault to this scheduler's sink
    pub fn report(&self, fault: TweenFault) {
        self.shared.report(fault);
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Set the named curve. Clears any custom easing function.
    pub fn set_ease(&self, id: TweenId, ease: Ease) -> Result<()> {
        self.shared.set_ease(id, ease)
    }

    /// Use a custom easing function, which receives raw normalized time
    pub fn set_custom_ease<F>(&self, id: TweenId, ease_fn: F) -> Result<()>
    where
        F: Fn(f32) -> f32 + 'static,
    {
        self.shared.set_custom_ease(id, Rc::new(ease_fn))
    }

    /// Drop the custom easing function and fall back to the named curve
    pub fn clear_custom_ease(&self, id: TweenId) -> Result<()> {
        self.shared.clear_custom_ease(id)
    }

    /// Set the loop count ([`LOOP_INFINITE`](crate::LOOP_INFINITE) for
    /// unbounded) and loop policy
    pub fn set_loops(&self, id: TweenId, loops: i32, kind: LoopKind) -> Result<()> {
        self.shared.set_loops(id, loops, kind)
    }

    /// Set the remaining delay before the tween starts
    pub fn set_delay(&self, id: TweenId, delay: f32) -> Result<()> {
        self.shared.set_delay(id, delay)
    }

    pub fn set_paused(&self, id: TweenId, paused: bool) -> Result<()> {
        self.shared.set_paused(id, paused)
    }

    pub fn pause(&self, id: TweenId) -> Result<()> {
        self.shared.set_paused(id, true)
    }

    pub fn resume(&self, id: TweenId) -> Result<()> {
        self.shared.set_paused(id, false)
    }

    pub fn set_on_start<F, R>(&self, id: TweenId, f: F) -> Result<()>
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.shared.set_on_start(id, action_hook(f))
    }

    pub fn set_on_update<F, R>(&self, id: TweenId, f: F) -> Result<()>
    where
        F: FnMut(f32) -> R + 'static,
        R: HookOutput,
    {
        self.shared.set_on_update(id, update_hook(f))
    }

    pub fn set_on_step_complete<F, R>(&self, id: TweenId, f: F) -> Result<()>
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.shared.set_on_step_complete(id, action_hook(f))
    }

    /// Replace all completion callbacks with `f`
    pub fn set_on_complete<F, R>(&self, id: TweenId, f: F) -> Result<()>
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.shared.set_on_complete(id, action_hook(f))
    }

    /// Append a completion callback; callbacks run in registration order
    pub fn add_on_complete<F, R>(&self, id: TweenId, f: F) -> Result<()>
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.shared.add_on_complete(id, action_hook(f))
    }
}

impl Default for TweenScheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SchedulerHandle
// ============================================================================

/// A weak handle to the tween scheduler
///
/// This is passed to components and captured by callbacks that need to
/// create or control tweens. It won't keep the scheduler alive; operations
/// on a handle whose scheduler is gone fail with
/// [`TweenError::SchedulerDropped`] or return a neutral value.
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Weak<Shared>,
}

impl SchedulerHandle {
    fn upgrade(&self) -> Result<Rc<Shared>> {
        self.shared.upgrade().ok_or(TweenError::SchedulerDropped)
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }

    pub fn create<F, R>(&self, duration: f32, on_update: F) -> Result<Tween>
    where
        F: FnMut(f32) -> R + 'static,
        R: HookOutput,
    {
        let id = self
            .upgrade()?
            .create(duration, Some(update_hook(on_update)));
        Ok(Tween::new(id, self.clone()))
    }

    pub fn create_silent(&self, duration: f32) -> Result<Tween> {
        let id = self.upgrade()?.create(duration, None);
        Ok(Tween::new(id, self.clone()))
    }

    /// Cancel a tween. Returns false if it was not live or the scheduler is gone.
    pub fn cancel(&self, id: TweenId) -> bool {
        self.upgrade().map(|s| s.cancel(id)).unwrap_or(false)
    }

    pub fn is_live(&self, id: TweenId) -> bool {
        self.upgrade().map(|s| s.is_live(id)).unwrap_or(false)
    }

    pub fn state(&self, id: TweenId) -> Result<TweenState> {
        self.upgrade()?.tween_state(id)
    }

    /// Forward a fault to the scheduler's sink (dropped if the scheduler is gone)
    pub fn report(&self, fault: TweenFault) {
        match self.upgrade() {
            Ok(shared) => shared.report(fault),
            Err(_) => tracing::debug!("fault after scheduler drop: {}", fault),
        }
    }

    pub fn set_ease(&self, id: TweenId, ease: Ease) -> Result<()> {
        self.upgrade()?.set_ease(id, ease)
    }

    pub fn set_custom_ease<F>(&self, id: TweenId, ease_fn: F) -> Result<()>
    where
        F: Fn(f32) -> f32 + 'static,
    {
        self.upgrade()?.set_custom_ease(id, Rc::new(ease_fn))
    }

    pub fn clear_custom_ease(&self, id: TweenId) -> Result<()> {
        self.upgrade()?.clear_custom_ease(id)
    }

    pub fn set_loops(&self, id: TweenId, loops: i32, kind: LoopKind) -> Result<()> {
        self.upgrade()?.set_loops(id, loops, kind)
    }

    pub fn set_delay(&self, id: TweenId, delay: f32) -> Result<()> {
        self.upgrade()?.set_delay(id, delay)
    }

    pub fn set_paused(&self, id: TweenId, paused: bool) -> Result<()> {
        self.upgrade()?.set_paused(id, paused)
    }

    pub fn set_on_start<F, R>(&self, id: TweenId, f: F) -> Result<()>
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.upgrade()?.set_on_start(id, action_hook(f))
    }

    pub fn set_on_update<F, R>(&self, id: TweenId, f: F) -> Result<()>
    where
        F: FnMut(f32) -> R + 'static,
        R: HookOutput,
    {
        self.upgrade()?.set_on_update(id, update_hook(f))
    }

    pub fn set_on_step_complete<F, R>(&self, id: TweenId, f: F) -> Result<()>
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.upgrade()?.set_on_step_complete(id, action_hook(f))
    }

    pub fn set_on_complete<F, R>(&self, id: TweenId, f: F) -> Result<()>
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.upgrade()?.set_on_complete(id, action_hook(f))
    }

    pub fn add_on_complete<F, R>(&self, id: TweenId, f: F) -> Result<()>
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.upgrade()?.add_on_complete(id, action_hook(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn recording_scheduler() -> (TweenScheduler, Rc<RefCell<Vec<TweenFault>>>) {
        let faults = Rc::new(RefCell::new(Vec::new()));
        let faults_clone = faults.clone();
        let scheduler = TweenScheduler::with_sink(SchedulerConfig::default(), move |f: TweenFault| {
            faults_clone.borrow_mut().push(f)
        });
        (scheduler, faults)
    }

    #[test]
    fn test_linear_progress_and_completion() {
        let scheduler = TweenScheduler::new();
        let values = Rc::new(RefCell::new(Vec::new()));
        let done = Rc::new(Cell::new(false));

        let v = values.clone();
        let d = done.clone();
        let tween = scheduler
            .create(1.0, move |t| v.borrow_mut().push(t))
            .on_complete(move || d.set(true));

        scheduler.tick(0.5);
        assert_eq!(*values.borrow(), vec![0.5]);
        assert!(!done.get());

        scheduler.tick(0.5);
        assert_eq!(*values.borrow(), vec![0.5, 1.0]);
        assert!(done.get());
        assert!(!scheduler.is_live(tween.id()));
        assert_eq!(scheduler.live_count(), 0);
    }

    #[test]
    fn test_start_fires_once_after_delay() {
        let scheduler = TweenScheduler::new();
        let starts = Rc::new(Cell::new(0));
        let s = starts.clone();

        scheduler
            .create_silent(1.0)
            .delay(0.3)
            .on_start(move || s.set(s.get() + 1));

        scheduler.tick(0.2);
        assert_eq!(starts.get(), 0);
        scheduler.tick(0.2);
        assert_eq!(starts.get(), 1);
        scheduler.tick(0.2);
        assert_eq!(starts.get(), 1);
    }

    #[test]
    fn test_paused_tween_keeps_slot_and_state() {
        let scheduler = TweenScheduler::new();
        let tween = scheduler.create_silent(1.0);

        scheduler.tick(0.25);
        tween.pause();
        scheduler.tick(0.5);

        let state = tween.state().unwrap();
        assert!(state.paused);
        assert!(approx(state.elapsed, 0.25));

        tween.play();
        scheduler.tick(0.25);
        assert!(approx(tween.state().unwrap().elapsed, 0.5));
    }

    #[test]
    fn test_paused_tween_does_not_consume_delay() {
        let scheduler = TweenScheduler::new();
        let tween = scheduler.create_silent(1.0).delay(0.5);
        tween.pause();
        scheduler.tick(1.0);
        assert!(approx(tween.state().unwrap().delay, 0.5));
    }

    #[test]
    fn test_zero_duration_completes_on_first_tick() {
        let scheduler = TweenScheduler::new();
        let values = Rc::new(RefCell::new(Vec::new()));
        let v = values.clone();
        let tween = scheduler.create(0.0, move |t| v.borrow_mut().push(t));

        scheduler.tick(0.0);
        assert_eq!(*values.borrow(), vec![1.0]);
        assert!(!tween.is_live());
    }

    #[test]
    fn test_zero_loop_count_finishes_after_one_iteration() {
        let scheduler = TweenScheduler::new();
        let steps = Rc::new(Cell::new(0));
        let s = steps.clone();
        let tween = scheduler
            .create_silent(1.0)
            .loops(0, LoopKind::Restart)
            .on_step_complete(move || s.set(s.get() + 1));

        scheduler.tick(1.0);
        assert_eq!(steps.get(), 1);
        assert!(!tween.is_live());
    }

    #[test]
    fn test_restart_loops() {
        let scheduler = TweenScheduler::new();
        let steps = Rc::new(Cell::new(0));
        let s = steps.clone();
        let tween = scheduler
            .create_silent(1.0)
            .loops(3, LoopKind::Restart)
            .on_step_complete(move || s.set(s.get() + 1));

        scheduler.tick(1.0);
        let state = tween.state().unwrap();
        assert_eq!(state.loops_completed, 1);
        assert_eq!(state.elapsed, 0.0);

        scheduler.tick(1.0);
        scheduler.tick(1.0);
        assert_eq!(steps.get(), 3);
        assert!(!tween.is_live());
    }

    #[test]
    fn test_custom_ease_overrides_named_curve() {
        let scheduler = TweenScheduler::new();
        let last = Rc::new(Cell::new(0.0));
        let l = last.clone();
        let tween = scheduler
            .create(1.0, move |t| l.set(t))
            .ease(Ease::InQuad)
            .custom_ease(|t| 1.0 - t);

        scheduler.tick(0.25);
        assert!(approx(last.get(), 0.75));

        scheduler.clear_custom_ease(tween.id()).unwrap();
        scheduler.tick(0.25);
        assert!(approx(last.get(), 0.25));
    }

    #[test]
    fn test_set_ease_replaces_custom_ease() {
        let scheduler = TweenScheduler::new();
        let tween = scheduler.create_silent(1.0).custom_ease(|t| t * 0.5);
        assert!(tween.state().unwrap().has_custom_ease);

        scheduler.set_ease(tween.id(), Ease::OutQuad).unwrap();
        let state = tween.state().unwrap();
        assert!(!state.has_custom_ease);
        assert_eq!(state.ease, Ease::OutQuad);
    }

    #[test]
    fn test_faulting_update_still_completes() {
        let (scheduler, faults) = recording_scheduler();
        let done = Rc::new(Cell::new(false));
        let d = done.clone();

        scheduler
            .create(1.0, |_| -> anyhow::Result<()> { anyhow::bail!("render failed") })
            .on_complete(move || d.set(true));

        scheduler.tick(1.0);
        assert!(done.get());
        let faults = faults.borrow();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].hook(), Some(Hook::Update));
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let (scheduler, faults) = recording_scheduler();
        let other = Rc::new(Cell::new(0.0));
        let o = other.clone();

        scheduler
            .create_silent(1.0)
            .on_start(|| -> anyhow::Result<()> { panic!("start exploded") });
        scheduler.create(1.0, move |t| o.set(t));

        scheduler.tick(0.5);
        assert_eq!(other.get(), 0.5);
        let faults = faults.borrow();
        assert_eq!(faults.len(), 1);
        assert!(matches!(
            &faults[0],
            TweenFault::Panicked { hook: Hook::Start, message, .. } if message == "start exploded"
        ));
    }

    #[test]
    fn test_faulting_custom_ease_falls_back_to_normalized_time() {
        let (scheduler, faults) = recording_scheduler();
        let last = Rc::new(Cell::new(0.0));
        let l = last.clone();
        scheduler
            .create(1.0, move |t| l.set(t))
            .custom_ease(|_| f32::NAN);

        scheduler.tick(0.5);
        assert_eq!(last.get(), 0.5);
        assert!(matches!(
            faults.borrow()[0],
            TweenFault::NonFiniteEase { .. }
        ));
    }

    #[test]
    fn test_panicking_custom_ease_falls_back_to_normalized_time() {
        let (scheduler, faults) = recording_scheduler();
        let last = Rc::new(Cell::new(0.0));
        let l = last.clone();
        let tween = scheduler
            .create(1.0, move |t| l.set(t))
            .custom_ease(|_| panic!("ease boom"));

        scheduler.tick(0.5);
        assert_eq!(last.get(), 0.5);
        assert!(tween.is_live());

        let faults = faults.borrow();
        assert_eq!(faults.len(), 1);
        assert!(matches!(
            &faults[0],
            TweenFault::Panicked { hook: Hook::Ease, message, .. } if message == "ease boom"
        ));
    }

    #[test]
    fn test_custom_ease_fault_reported_without_update_hook() {
        let (scheduler, faults) = recording_scheduler();
        let completed = Rc::new(Cell::new(false));
        let c = completed.clone();
        scheduler
            .create_silent(1.0)
            .custom_ease(|_| panic!("silent ease"))
            .on_complete(move || c.set(true));

        scheduler.tick(1.0);
        assert!(completed.get());
        assert!(matches!(
            &faults.borrow()[0],
            TweenFault::Panicked { hook: Hook::Ease, .. }
        ));
    }

    #[test]
    fn test_completion_callbacks_run_in_order_with_isolation() {
        let (scheduler, faults) = recording_scheduler();
        let order = Rc::new(RefCell::new(Vec::new()));
        let (a, c) = (order.clone(), order.clone());

        scheduler
            .create_silent(0.5)
            .on_complete(move || a.borrow_mut().push("first"))
            .then(|| -> Result<()> { Err(TweenError::SchedulerDropped) })
            .then(move || c.borrow_mut().push("third"));

        scheduler.tick(0.5);
        assert_eq!(*order.borrow(), vec!["first", "third"]);
        assert_eq!(faults.borrow().len(), 1);
    }

    #[test]
    fn test_set_on_complete_replaces_chain() {
        let scheduler = TweenScheduler::new();
        let count = Rc::new(Cell::new(0));
        let (a, b) = (count.clone(), count.clone());
        let tween = scheduler
            .create_silent(1.0)
            .then(move || a.set(a.get() + 10));
        scheduler
            .set_on_complete(tween.id(), move || b.set(b.get() + 1))
            .unwrap();

        scheduler.tick(1.0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_callback_can_cancel_later_tween() {
        let scheduler = TweenScheduler::new();
        let handle = scheduler.handle();
        let victim_ran = Rc::new(Cell::new(false));
        let victim_id = Rc::new(Cell::new(TweenId::NONE));

        let id_cell = victim_id.clone();
        scheduler.create(1.0, move |_| {
            handle.cancel(id_cell.get());
        });
        let v = victim_ran.clone();
        let victim = scheduler.create(1.0, move |_| v.set(true));
        victim_id.set(victim.id());

        scheduler.tick(0.1);
        assert!(!victim_ran.get());
        assert!(!victim.is_live());
    }

    #[test]
    fn test_tween_created_during_tick_waits_for_next_tick() {
        let scheduler = TweenScheduler::new();
        let handle = scheduler.handle();
        let child_values = Rc::new(RefCell::new(Vec::new()));

        let cv = child_values.clone();
        scheduler.create_silent(0.1).on_complete(move || {
            let cv = cv.clone();
            handle
                .create(1.0, move |t| cv.borrow_mut().push(t))
                .map(|_| ())
        });

        scheduler.tick(0.1);
        assert!(child_values.borrow().is_empty());
        assert_eq!(scheduler.live_count(), 1);

        scheduler.tick(0.5);
        assert_eq!(*child_values.borrow(), vec![0.5]);
    }

    #[test]
    fn test_growth_during_tick_defers_new_tweens() {
        let scheduler =
            TweenScheduler::with_config(SchedulerConfig::default().with_initial_capacity(2));
        let handle = scheduler.handle();
        let child_hits = Rc::new(Cell::new(0));
        let parent_hits = Rc::new(Cell::new(0));

        let (hits, ph) = (child_hits.clone(), parent_hits.clone());
        let parent = scheduler.create(10.0, move |_| {
            ph.set(ph.get() + 1);
            if ph.get() == 1 {
                for _ in 0..10 {
                    let hits = hits.clone();
                    let _ = handle.create(1.0, move |_| hits.set(hits.get() + 1));
                }
            }
        });

        scheduler.tick(0.1);
        assert_eq!(parent_hits.get(), 1);
        assert_eq!(child_hits.get(), 0);
        assert_eq!(scheduler.live_count(), 11);
        assert!(scheduler.capacity() >= 11);
        assert!(approx(parent.state().unwrap().elapsed, 0.1));

        scheduler.tick(0.1);
        assert_eq!(parent_hits.get(), 2);
        assert_eq!(child_hits.get(), 10);
        assert_eq!(scheduler.live_count(), 11);
    }

    #[test]
    fn test_reused_slot_not_processed_in_same_tick() {
        let scheduler =
            TweenScheduler::with_config(SchedulerConfig::default().with_initial_capacity(2));
        let handle = scheduler.handle();
        let replacement_ticks = Rc::new(Cell::new(0));
        let victim_id = Rc::new(Cell::new(TweenId::NONE));

        // The canceller sits in an earlier slot; the replacement it creates
        // lands in the victim's freed slot, which the tick has not visited yet
        let rt = replacement_ticks.clone();
        let id_cell = victim_id.clone();
        let canceller = scheduler.create(1.0, move |_| {
            if handle.cancel(id_cell.get()) {
                let rt = rt.clone();
                let _ = handle.create(1.0, move |_| rt.set(rt.get() + 1));
            }
        });
        let victim = scheduler.create_silent(1.0);
        victim_id.set(victim.id());

        scheduler.tick(0.1);
        assert!(canceller.is_live());
        assert!(!victim.is_live());
        assert_eq!(scheduler.live_count(), 2);
        assert_eq!(replacement_ticks.get(), 0);

        scheduler.tick(0.1);
        assert_eq!(replacement_ticks.get(), 1);
    }

    #[test]
    fn test_reentrant_tick_is_ignored() {
        let scheduler = TweenScheduler::new();
        let inner = scheduler.clone();
        let values = Rc::new(RefCell::new(Vec::new()));
        let v = values.clone();

        scheduler.create(1.0, move |t| {
            v.borrow_mut().push(t);
            inner.tick(0.25);
        });

        scheduler.tick(0.25);
        assert_eq!(*values.borrow(), vec![0.25]);
    }

    #[test]
    fn test_invalid_delta_is_ignored() {
        let scheduler = TweenScheduler::new();
        let tween = scheduler.create_silent(1.0);
        scheduler.tick(-1.0);
        scheduler.tick(f32::NAN);
        scheduler.tick(f32::INFINITY);
        assert_eq!(tween.state().unwrap().elapsed, 0.0);
        assert_eq!(scheduler.tick_count(), 0);
    }

    #[test]
    fn test_max_tick_delta_clamps() {
        let scheduler =
            TweenScheduler::with_config(SchedulerConfig::default().with_max_tick_delta(0.1));
        let tween = scheduler.create_silent(1.0);
        scheduler.tick(5.0);
        assert!(approx(tween.state().unwrap().elapsed, 0.1));
    }

    #[test]
    fn test_default_ease_from_config() {
        let scheduler =
            TweenScheduler::with_config(SchedulerConfig::default().with_default_ease(Ease::InQuad));
        let tween = scheduler.create_silent(1.0);
        assert_eq!(tween.state().unwrap().ease, Ease::InQuad);
    }

    #[test]
    fn test_negative_duration_clamped() {
        let scheduler = TweenScheduler::new();
        let tween = scheduler.create_silent(-3.0);
        assert_eq!(tween.state().unwrap().duration, 0.0);
    }

    #[test]
    fn test_stale_configure_is_rejected() {
        let scheduler = TweenScheduler::new();
        let tween = scheduler.create_silent(0.1);
        scheduler.tick(0.1);

        let err = scheduler.set_delay(tween.id(), 1.0).unwrap_err();
        assert!(matches!(err, TweenError::NotFound(id) if id == tween.id()));
        assert!(scheduler.state(tween.id()).is_err());
    }

    #[test]
    fn test_cancel_all() {
        let scheduler = TweenScheduler::new();
        let a = scheduler.create_silent(1.0);
        scheduler.create_silent(1.0);
        assert_eq!(scheduler.cancel_all(), 2);
        assert!(!a.is_live());
        assert!(!scheduler.has_active_tweens());
    }

    #[test]
    fn test_handle_weak_reference() {
        let handle = {
            let scheduler = TweenScheduler::new();
            scheduler.handle()
        };

        assert!(!handle.is_alive());
        assert!(matches!(
            handle.create_silent(1.0),
            Err(TweenError::SchedulerDropped)
        ));
        assert!(!handle.cancel(TweenId::from_raw(1)));
    }
}
