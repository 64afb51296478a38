//! Blinc Tween Scheduler
//!
//! A micro-scheduler for short-lived, callback-driven tweens. The host calls
//! [`TweenScheduler::tick`] once per frame; every live tween advances,
//! eases its progress, and reports it to caller callbacks.
//!
//! # Features
//!
//! - **Pooled Storage**: Tweens live in a growable generational slot pool;
//!   steady-state ticks don't allocate
//! - **Stable Identity**: Callers hold a [`TweenId`], never a slot; stale ids
//!   are rejected, never aliased
//! - **Easing**: 31 named curves plus cubic bezier and caller-supplied functions
//! - **Delays and Loops**: Delay overshoot carries into the first frame;
//!   restart, yoyo, and incremental loops, bounded or infinite
//! - **Fault Isolation**: A failing or panicking callback is reported to a
//!   [`FaultSink`] and never aborts a tick
//!
//! # Example
//!
//! ```
//! use blinc_tween::{Ease, LoopKind, TweenScheduler};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let scheduler = TweenScheduler::new();
//! let opacity = Rc::new(Cell::new(0.0));
//!
//! let o = opacity.clone();
//! scheduler
//!     .value(0.0, 1.0, 0.5, move |v| o.set(v))
//!     .ease(Ease::OutCubic)
//!     .loops(2, LoopKind::Yoyo);
//!
//! scheduler.tick(0.5);
//! assert_eq!(opacity.get(), 1.0);
//! scheduler.tick(0.5);
//! assert_eq!(opacity.get(), 0.0);
//! assert_eq!(scheduler.live_count(), 0);
//! ```

pub mod clock;
pub mod config;
pub mod easing;
pub mod error;
pub mod handle;
pub mod id;
mod pool;
pub mod presets;
pub mod scheduler;
pub mod tween;

pub use clock::FrameClock;
pub use config::SchedulerConfig;
pub use easing::Ease;
pub use error::{FaultSink, Hook, LogSink, TweenError, TweenFault};
pub use handle::Tween;
pub use id::{IdAllocator, TweenId};
pub use presets::lerp_unclamped;
pub use scheduler::{SchedulerHandle, TweenScheduler};
pub use tween::{HookOutput, LoopKind, TweenState, LOOP_INFINITE};
