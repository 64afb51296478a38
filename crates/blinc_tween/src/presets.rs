//! Convenience constructors built on `create`
//!
//! - `delay` - a timer: no progress reporting, just completion
//! - `value` - tween a float between two endpoints

use crate::error::Result;
use crate::handle::Tween;
use crate::scheduler::{SchedulerHandle, TweenScheduler};
use crate::tween::HookOutput;

/// Linear interpolation without clamping `t`
///
/// Curves like back and elastic leave `[0, 1]`; the result follows them.
#[inline]
pub fn lerp_unclamped(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

impl TweenScheduler {
    /// Call `on_complete` once `duration` seconds of ticks have elapsed
    pub fn delay<F, R>(&self, duration: f32, on_complete: F) -> Tween
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        self.create_silent(duration).on_complete(on_complete)
    }

    /// Tween from `start` to `end`, passing the interpolated value to `on_value`
    pub fn value<F, R>(&self, start: f32, end: f32, duration: f32, mut on_value: F) -> Tween
    where
        F: FnMut(f32) -> R + 'static,
        R: HookOutput,
    {
        self.create(duration, move |t| on_value(lerp_unclamped(start, end, t)))
    }
}

impl SchedulerHandle {
    /// See [`TweenScheduler::delay`]
    pub fn delay<F, R>(&self, duration: f32, on_complete: F) -> Result<Tween>
    where
        F: FnMut() -> R + 'static,
        R: HookOutput,
    {
        Ok(self.create_silent(duration)?.on_complete(on_complete))
    }

    /// See [`TweenScheduler::value`]
    pub fn value<F, R>(&self, start: f32, end: f32, duration: f32, mut on_value: F) -> Result<Tween>
    where
        F: FnMut(f32) -> R + 'static,
        R: HookOutput,
    {
        self.create(duration, move |t| on_value(lerp_unclamped(start, end, t)))
    }
}
