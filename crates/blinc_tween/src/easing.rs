//! Easing curves for tweens
//!
//! Every named curve maps normalized time `t` in `[0, 1]` to eased time.
//! Endpoints are exact: `apply(0.0) == 0.0` and `apply(1.0) == 1.0` for every
//! curve, including the exponential and elastic families whose closed forms
//! only approach those values asymptotically.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;
const ELASTIC_C4: f32 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f32 = (2.0 * PI) / 4.5;
const BOUNCE_N1: f32 = 7.5625;
const BOUNCE_D1: f32 = 2.75;

/// Easing curve
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Ease {
    #[default]
    Linear,
    InSine,
    OutSine,
    InOutSine,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    InExpo,
    OutExpo,
    InOutExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    InBack,
    OutBack,
    InOutBack,
    InElastic,
    OutElastic,
    InOutElastic,
    InBounce,
    OutBounce,
    InOutBounce,
    /// CSS-style cubic bezier with control points (x1, y1, x2, y2)
    CubicBezier(f32, f32, f32, f32),
}

impl Ease {
    /// All named curves, in declaration order
    pub const NAMED: [Ease; 31] = [
        Ease::Linear,
        Ease::InSine,
        Ease::OutSine,
        Ease::InOutSine,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::InCubic,
        Ease::OutCubic,
        Ease::InOutCubic,
        Ease::InQuart,
        Ease::OutQuart,
        Ease::InOutQuart,
        Ease::InQuint,
        Ease::OutQuint,
        Ease::InOutQuint,
        Ease::InExpo,
        Ease::OutExpo,
        Ease::InOutExpo,
        Ease::InCirc,
        Ease::OutCirc,
        Ease::InOutCirc,
        Ease::InBack,
        Ease::OutBack,
        Ease::InOutBack,
        Ease::InElastic,
        Ease::OutElastic,
        Ease::InOutElastic,
        Ease::InBounce,
        Ease::OutBounce,
        Ease::InOutBounce,
    ];

    /// Apply the curve to a normalized time value
    ///
    /// Input outside `[0, 1]` is clamped and NaN is treated as `0.0`, so the
    /// result is always finite. Back and elastic curves may still leave
    /// `[0, 1]` in the interior of the range.
    pub fn apply(&self, t: f32) -> f32 {
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }

        match *self {
            Ease::Linear => t,
            Ease::InSine => 1.0 - (t * PI / 2.0).cos(),
            Ease::OutSine => (t * PI / 2.0).sin(),
            Ease::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Ease::InQuad => t * t,
            Ease::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Ease::InCubic => t * t * t,
            Ease::OutCubic => 1.0 - (1.0 - t).powi(3),
            Ease::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Ease::InQuart => t * t * t * t,
            Ease::OutQuart => 1.0 - (1.0 - t).powi(4),
            Ease::InOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Ease::InQuint => t * t * t * t * t,
            Ease::OutQuint => 1.0 - (1.0 - t).powi(5),
            Ease::InOutQuint => {
                if t < 0.5 {
                    16.0 * t * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            Ease::InExpo => 2f32.powf(10.0 * t - 10.0),
            Ease::OutExpo => 1.0 - 2f32.powf(-10.0 * t),
            Ease::InOutExpo => {
                if t < 0.5 {
                    2f32.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f32.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Ease::InCirc => 1.0 - (1.0 - t * t).sqrt(),
            Ease::OutCirc => (1.0 - (t - 1.0).powi(2)).sqrt(),
            Ease::InOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
                }
            }
            Ease::InBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Ease::OutBack => 1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2),
            Ease::InOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2)
                        + 2.0)
                        / 2.0
                }
            }
            Ease::InElastic => {
                -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
            }
            Ease::OutElastic => {
                2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
            }
            Ease::InOutElastic => {
                if t < 0.5 {
                    -(2f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
                } else {
                    (2f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
                        + 1.0
                }
            }
            Ease::InBounce => 1.0 - bounce_out(1.0 - t),
            Ease::OutBounce => bounce_out(t),
            Ease::InOutBounce => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }
            Ease::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, x1, y1, x2, y2),
        }
    }
}

fn bounce_out(t: f32) -> f32 {
    if t < 1.0 / BOUNCE_D1 {
        BOUNCE_N1 * t * t
    } else if t < 2.0 / BOUNCE_D1 {
        let t = t - 1.5 / BOUNCE_D1;
        BOUNCE_N1 * t * t + 0.75
    } else if t < 2.5 / BOUNCE_D1 {
        let t = t - 2.25 / BOUNCE_D1;
        BOUNCE_N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / BOUNCE_D1;
        BOUNCE_N1 * t * t + 0.984375
    }
}

/// Cubic bezier easing calculation (matches CSS `cubic-bezier()`).
///
/// Uses Newton-Raphson with binary-search fallback for robustness.
/// Computes in f64 internally to avoid f32 precision jitter at high frame rates.
fn cubic_bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let x = t as f64;
    let x1 = x1 as f64;
    let y1 = y1 as f64;
    let x2 = x2 as f64;
    let y2 = y2 as f64;

    let mut p = x;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - x;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2) as f32;
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    // Binary search always converges
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = x;
    for _ in 0..20 {
        let val = bezier_sample(p, x1, x2);
        if (val - x).abs() < 1e-7 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2) as f32
}

/// Evaluate cubic bezier at parameter t: B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

/// Derivative of cubic bezier: B'(t) = 3(1-t)²·p1 + 6(1-t)t·(p2-p1) + 3t²·(1-p2)
#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}
