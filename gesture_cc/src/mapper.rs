//! The pinch → CC control law.
//!
//! Per frame: distance → (optional smoothing) → clamp → normalize →
//! quantize → change-gate.  At most one [`CcMessage`] leaves per frame, and
//! none while the quantized value stays in the same bucket.

use crate::config::MappingConfig;
use crate::filter::{OneEuroFilter, SmoothingConfig};
use crate::landmark::GestureSample;
use crate::message::CcMessage;

/// Highest 7-bit controller value.
pub const CC_MAX: u8 = 127;

// ════════════════════════════════════════════════════════════════════════════
// Pure mapping steps
// ════════════════════════════════════════════════════════════════════════════

/// Clamp `distance` into `[min, max]` and rescale to `[0, 1]`.
///
/// An empty or inverted window (`max <= min`, or NaN bounds) yields `0.0`
/// instead of dividing by a zero span.  A NaN distance also yields `0.0`.
pub fn normalize(distance: f32, min: f32, max: f32) -> f32 {
    if !(max > min) || distance.is_nan() {
        return 0.0;
    }
    let d = distance.clamp(min, max);
    (d - min) / (max - min)
}

/// Quantize a `[0, 1]` value to one of 128 levels, rounding halves up.
///
/// `f32::round` rounds half away from zero, which on this non-negative
/// domain is round-half-up: `0.5 → 63.5 → 64`.
pub fn quantize(normalized: f32) -> u8 {
    let n = if normalized.is_nan() { 0.0 } else { normalized.clamp(0.0, 1.0) };
    (n * CC_MAX as f32).round() as u8
}

/// Distance straight to a CC value under `config`.
pub fn map_distance(distance: f32, config: &MappingConfig) -> u8 {
    quantize(normalize(distance, config.min_distance(), config.max_distance()))
}

// ════════════════════════════════════════════════════════════════════════════
// MapperState
// ════════════════════════════════════════════════════════════════════════════

/// Session-lifetime memory of the mapper: the last value put on the wire.
///
/// Starts unset, so the first valid value is always sent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapperState {
    last_sent: Option<u8>,
}

impl MapperState {
    pub fn last_sent(&self) -> Option<u8> { self.last_sent }
}

// ════════════════════════════════════════════════════════════════════════════
// Frame output
// ════════════════════════════════════════════════════════════════════════════

/// Values for a live readout; independent of whether a message was sent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Display {
    /// Raw (or smoothed) pinch distance; `0.0` when no hand is tracked.
    pub distance:     f32,
    /// The value the receiving device currently holds, if any was sent.
    pub value:        Option<u8>,
    pub hand_present: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameOutput {
    pub message: Option<CcMessage>,
    pub display: Display,
}

// ════════════════════════════════════════════════════════════════════════════
// GestureMapper
// ════════════════════════════════════════════════════════════════════════════

/// Stateful mapper driven once per frame by an external pump.
#[derive(Default)]
pub struct GestureMapper {
    state:  MapperState,
    filter: Option<OneEuroFilter>,
}

impl GestureMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_smoothing(cfg: SmoothingConfig) -> Self {
        let mut m = Self::new();
        m.set_smoothing(cfg);
        m
    }

    /// Swap the smoothing setup.  Filter history is discarded.
    pub fn set_smoothing(&mut self, cfg: SmoothingConfig) {
        self.filter = cfg.enabled.then(|| OneEuroFilter::new(cfg));
    }

    pub fn state(&self) -> &MapperState { &self.state }

    /// Process one frame.
    ///
    /// `config` is read fresh on every call, so edits take effect on the
    /// next frame.  A missing hand emits nothing and leaves `last_sent`
    /// alone, so the device keeps its last value instead of jumping to 0.
    pub fn on_frame(
        &mut self,
        sample: Option<&GestureSample>,
        config: &MappingConfig,
    ) -> FrameOutput {
        let sample = match sample {
            Some(s) => s,
            None    => return self.absent(),
        };

        let raw = sample.distance();
        if !raw.is_finite() {
            return self.absent();
        }

        let distance = match self.filter.as_mut() {
            Some(f) => f.filter(sample.at, raw),
            None    => raw,
        };

        let value = map_distance(distance, config);

        let message = if self.state.last_sent != Some(value) {
            self.state.last_sent = Some(value);
            Some(CcMessage::new(config.channel(), config.cc_number(), value))
        } else {
            None
        };

        FrameOutput {
            message,
            display: Display {
                distance,
                value: self.state.last_sent,
                hand_present: true,
            },
        }
    }

    fn absent(&mut self) -> FrameOutput {
        if let Some(f) = self.filter.as_mut() {
            f.reset();
        }
        FrameOutput {
            message: None,
            display: Display {
                distance: 0.0,
                value: self.state.last_sent,
                hand_present: false,
            },
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
