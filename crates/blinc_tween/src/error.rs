//! Tween error types and the fault channel

use crate::id::TweenId;
use std::fmt;
use thiserror::Error;

/// A rejected scheduler operation
#[derive(Error, Debug)]
pub enum TweenError {
    /// The id is not live (finished, cancelled, or never issued)
    #[error("Tween not found: {0}")]
    NotFound(TweenId),

    /// The scheduler behind a handle has been dropped
    #[error("Tween scheduler has been dropped")]
    SchedulerDropped,

    /// Scheduler configuration could not be parsed
    #[error("Invalid scheduler config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for tween operations
pub type Result<T> = std::result::Result<T, TweenError>;

/// Which caller-supplied function a fault came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hook {
    Start,
    Update,
    StepComplete,
    Complete,
    Ease,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hook::Start => "on_start",
            Hook::Update => "on_update",
            Hook::StepComplete => "on_step_complete",
            Hook::Complete => "on_complete",
            Hook::Ease => "custom ease",
        };
        f.write_str(name)
    }
}

/// A fault captured while driving tweens
///
/// Faults never abort a tick. They are handed to the scheduler's
/// [`FaultSink`] and processing continues with the next callback.
#[derive(Error, Debug)]
pub enum TweenFault {
    /// A callback returned an error
    #[error("{hook} of tween {tween} failed: {source}")]
    Callback {
        tween: TweenId,
        hook: Hook,
        #[source]
        source: anyhow::Error,
    },

    /// A callback or custom easing function panicked
    #[error("{hook} of tween {tween} panicked: {message}")]
    Panicked {
        tween: TweenId,
        hook: Hook,
        message: String,
    },

    /// A custom easing function produced NaN or infinity
    #[error("custom ease of tween {tween} returned non-finite value {value}")]
    NonFiniteEase { tween: TweenId, value: f32 },

    /// A fluent configuration call targeted a tween that is no longer live
    #[error("{operation} on stale tween {tween}")]
    Stale {
        tween: TweenId,
        operation: &'static str,
    },
}

impl TweenFault {
    /// The tween the fault belongs to
    pub fn tween(&self) -> TweenId {
        match self {
            TweenFault::Callback { tween, .. }
            | TweenFault::Panicked { tween, .. }
            | TweenFault::NonFiniteEase { tween, .. }
            | TweenFault::Stale { tween, .. } => *tween,
        }
    }

    /// The hook that faulted, if the fault came from caller code
    pub fn hook(&self) -> Option<Hook> {
        match self {
            TweenFault::Callback { hook, .. } | TweenFault::Panicked { hook, .. } => Some(*hook),
            TweenFault::NonFiniteEase { .. } => Some(Hook::Ease),
            TweenFault::Stale { .. } => None,
        }
    }
}

/// Receives every fault captured by a scheduler
///
/// Supplied when the scheduler is constructed. Reporting has no effect on
/// scheduling. Closures taking a [`TweenFault`] implement this trait.
pub trait FaultSink {
    fn report(&self, fault: TweenFault);
}

impl<F> FaultSink for F
where
    F: Fn(TweenFault),
{
    fn report(&self, fault: TweenFault) {
        self(fault)
    }
}

/// Default sink: writes faults to the tracing log
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl FaultSink for LogSink {
    fn report(&self, fault: TweenFault) {
        tracing::error!(tween = %fault.tween(), "{}", fault);
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
