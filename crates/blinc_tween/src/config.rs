//! Scheduler configuration

use crate::easing::Ease;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Configuration for a [`TweenScheduler`](crate::TweenScheduler)
///
/// Can be loaded from TOML:
///
/// ```
/// use blinc_tween::{Ease, SchedulerConfig};
///
/// let config = SchedulerConfig::from_toml_str(r#"
///     initial_capacity = 256
///     default_ease = "OutCubic"
/// "#).unwrap();
/// assert_eq!(config.initial_capacity, 256);
/// assert_eq!(config.default_ease, Ease::OutCubic);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Slots reserved up front. The pool doubles when they are all in use.
    pub initial_capacity: usize,
    /// Curve given to newly created tweens
    pub default_ease: Ease,
    /// Upper bound applied to every tick delta (e.g. after the host stalls)
    pub max_tick_delta: Option<f32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            default_ease: Ease::Linear,
            max_tick_delta: None,
        }
    }
}

impl SchedulerConfig {
    /// Parse a config from TOML. Missing fields take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_default_ease(mut self, ease: Ease) -> Self {
        self.default_ease = ease;
        self
    }

    pub fn with_max_tick_delta(mut self, max: f32) -> Self {
        self.max_tick_delta = Some(max);
        self
    }
}
