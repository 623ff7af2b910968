//! One Euro filter — adaptive low-pass for landmark jitter.
//!
//! Smooth when the fingers are still, responsive when they move.  The mapper
//! applies it to the raw pinch distance before clamping, so the change-gate
//! still runs on the quantized result.

use std::f32::consts::PI;

use serde::Deserialize;

/// Tuning for [`OneEuroFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub enabled:    bool,
    /// Cutoff at rest (Hz).  Lower = smoother when still.
    pub min_cutoff: f32,
    /// Speed coefficient.  Higher = less lag during fast motion.
    pub beta:       f32,
    /// Cutoff for the derivative estimate (Hz).
    pub d_cutoff:   f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        SmoothingConfig {
            enabled:    false,
            min_cutoff: 1.0,
            beta:       0.15,
            d_cutoff:   1.0,
        }
    }
}

pub struct OneEuroFilter {
    min_cutoff: f32,
    beta:       f32,
    d_cutoff:   f32,

    x_prev:  f32,
    dx_prev: f32,
    t_prev:  f64,
    initialized: bool,
}

impl OneEuroFilter {
    pub fn new(cfg: SmoothingConfig) -> Self {
        OneEuroFilter {
            min_cutoff: cfg.min_cutoff,
            beta:       cfg.beta,
            d_cutoff:   cfg.d_cutoff,
            x_prev:  0.0,
            dx_prev: 0.0,
            t_prev:  0.0,
            initialized: false,
        }
    }

    fn alpha(t_e: f32, cutoff: f32) -> f32 {
        let r = 2.0 * PI * cutoff * t_e;
        r / (r + 1.0)
    }

    /// Filter `x` observed at time `t` (seconds).
    ///
    /// A non-advancing timestamp returns the previous output unchanged.
    pub fn filter(&mut self, t: f64, x: f32) -> f32 {
        if !self.initialized {
            self.x_prev = x;
            self.dx_prev = 0.0;
            self.t_prev = t;
            self.initialized = true;
            return x;
        }

        let t_e = (t - self.t_prev) as f32;
        if t_e <= 0.0 {
            return self.x_prev;
        }

        let a_d   = Self::alpha(t_e, self.d_cutoff);
        let dx    = (x - self.x_prev) / t_e;
        let dx_hat = a_d * dx + (1.0 - a_d) * self.dx_prev;

        let cutoff = self.min_cutoff + self.beta * dx_hat.abs();
        let a      = Self::alpha(t_e, cutoff);
        let x_hat  = a * x + (1.0 - a) * self.x_prev;

        self.x_prev  = x_hat;
        self.dx_prev = dx_hat;
        self.t_prev  = t;
        x_hat
    }

    pub fn reset(&mut self) {
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> SmoothingConfig {
        SmoothingConfig { enabled: true, ..SmoothingConfig::default() }
    }

    #[test]
    fn first_sample_passes_through() {
        let mut f = OneEuroFilter::new(enabled());
        assert_eq!(f.filter(0.0, 0.1), 0.1);
    }

    #[test]
    fn step_is_attenuated() {
        let mut f = OneEuroFilter::new(enabled());
        f.filter(0.0, 0.0);
        let y = f.filter(1.0 / 30.0, 1.0);
        assert!(y > 0.0 && y < 1.0, "y = {}", y);
    }

    #[test]
    fn converges_on_constant_input() {
        let mut f = OneEuroFilter::new(enabled());
        f.filter(0.0, 0.0);
        let mut y = 0.0;
        for i in 1..300 {
            y = f.filter(i as f64 / 30.0, 0.5);
        }
        assert!((y - 0.5).abs() < 1e-3, "y = {}", y);
    }

    #[test]
    fn stale_timestamp_holds_output() {
        let mut f = OneEuroFilter::new(enabled());
        f.filter(1.0, 0.2);
        assert_eq!(f.filter(1.0, 0.9), 0.2);
        assert_eq!(f.filter(0.5, 0.9), 0.2);
    }

    #[test]
    fn reset_restarts_from_next_sample() {
        let mut f = OneEuroFilter::new(enabled());
        f.filter(0.0, 0.0);
        f.filter(0.1, 0.0);
        f.reset();
        assert_eq!(f.filter(0.2, 0.7), 0.7);
    }
}
