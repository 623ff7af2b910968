//! Validated mapping configuration.
//!
//! A [`MappingConfig`] can only be obtained through [`MappingConfig::new`] (or
//! deserialization, which goes through the same checks), so the mapper never
//! sees an out-of-range channel, CC number, or an empty distance window.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a mapping configuration is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("MIDI channel {0} out of range (1–16)")]
    Channel(u8),

    #[error("CC number {0} out of range (0–127)")]
    CcNumber(u8),

    #[error("distance bounds must be finite (min={min}, max={max})")]
    NonFinite { min: f32, max: f32 },

    #[error("min distance {min} must be below max distance {max}")]
    EmptyWindow { min: f32, max: f32 },
}

// ════════════════════════════════════════════════════════════════════════════
// MappingConfig
// ════════════════════════════════════════════════════════════════════════════

/// The four user-adjustable mapping fields.
///
/// `channel` is 1-based as users see it; the wire encoding subtracts one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMapping", into = "RawMapping")]
pub struct MappingConfig {
    min_distance: f32,
    max_distance: f32,
    channel:      u8,
    cc_number:    u8,
}

impl MappingConfig {
    pub const DEFAULT_MIN:     f32 = 0.02;
    pub const DEFAULT_MAX:     f32 = 0.20;
    pub const DEFAULT_CHANNEL: u8  = 1;
    /// CC 74 — "brightness" / filter cutoff on most synths.
    pub const DEFAULT_CC:      u8  = 74;

    pub fn new(
        channel:      u8,
        cc_number:    u8,
        min_distance: f32,
        max_distance: f32,
    ) -> Result<Self, MappingError> {
        if !(1..=16).contains(&channel) {
            return Err(MappingError::Channel(channel));
        }
        if cc_number > 127 {
            return Err(MappingError::CcNumber(cc_number));
        }
        if !min_distance.is_finite() || !max_distance.is_finite() {
            return Err(MappingError::NonFinite { min: min_distance, max: max_distance });
        }
        if min_distance >= max_distance {
            return Err(MappingError::EmptyWindow { min: min_distance, max: max_distance });
        }
        Ok(MappingConfig { min_distance, max_distance, channel, cc_number })
    }

    pub fn channel(&self)      -> u8  { self.channel }
    pub fn cc_number(&self)    -> u8  { self.cc_number }
    pub fn min_distance(&self) -> f32 { self.min_distance }
    pub fn max_distance(&self) -> f32 { self.max_distance }

    // ── single-field edits, re-validated ────────────────────────────────

    pub fn with_channel(&self, channel: u8) -> Result<Self, MappingError> {
        Self::new(channel, self.cc_number, self.min_distance, self.max_distance)
    }

    pub fn with_cc_number(&self, cc_number: u8) -> Result<Self, MappingError> {
        Self::new(self.channel, cc_number, self.min_distance, self.max_distance)
    }

    pub fn with_min_distance(&self, min: f32) -> Result<Self, MappingError> {
        Self::new(self.channel, self.cc_number, min, self.max_distance)
    }

    pub fn with_max_distance(&self, max: f32) -> Result<Self, MappingError> {
        Self::new(self.channel, self.cc_number, self.min_distance, max)
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        MappingConfig {
            min_distance: Self::DEFAULT_MIN,
            max_distance: Self::DEFAULT_MAX,
            channel:      Self::DEFAULT_CHANNEL,
            cc_number:    Self::DEFAULT_CC,
        }
    }
}

// ── serde shadow ─────────────────────────────────────────────────────────

/// Unchecked field bag that serde reads; converted through `new`.
#[derive(Serialize, Deserialize)]
#[serde(default)]
struct RawMapping {
    channel:      u8,
    cc_number:    u8,
    min_distance: f32,
    max_distance: f32,
}

impl Default for RawMapping {
    fn default() -> Self {
        MappingConfig::default().into()
    }
}

impl TryFrom<RawMapping> for MappingConfig {
    type Error = MappingError;
    fn try_from(r: RawMapping) -> Result<Self, Self::Error> {
        MappingConfig::new(r.channel, r.cc_number, r.min_distance, r.max_distance)
    }
}

impl From<MappingConfig> for RawMapping {
    fn from(c: MappingConfig) -> Self {
        RawMapping {
            channel:      c.channel,
            cc_number:    c.cc_number,
            min_distance: c.min_distance,
            max_distance: c.max_distance,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let d = MappingConfig::default();
        assert_eq!(
            MappingConfig::new(d.channel(), d.cc_number(), d.min_distance(), d.max_distance()),
            Ok(d)
        );
    }

    #[test]
    fn rejects_channel_zero_and_seventeen() {
        assert_eq!(MappingConfig::new(0, 74, 0.0, 1.0), Err(MappingError::Channel(0)));
        assert_eq!(MappingConfig::new(17, 74, 0.0, 1.0), Err(MappingError::Channel(17)));
        assert!(MappingConfig::new(16, 74, 0.0, 1.0).is_ok());
    }

    #[test]
    fn rejects_cc_above_127() {
        assert_eq!(MappingConfig::new(1, 128, 0.0, 1.0), Err(MappingError::CcNumber(128)));
        assert!(MappingConfig::new(1, 127, 0.0, 1.0).is_ok());
        assert!(MappingConfig::new(1, 0, 0.0, 1.0).is_ok());
    }

    #[test]
    fn rejects_equal_bounds() {
        assert!(matches!(
            MappingConfig::new(1, 74, 0.1, 0.1),
            Err(MappingError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn rejects_inverted_bounds() {
        assert!(matches!(
            MappingConfig::new(1, 74, 0.3, 0.1),
            Err(MappingError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn rejects_nan_bounds() {
        assert!(matches!(
            MappingConfig::new(1, 74, f32::NAN, 0.1),
            Err(MappingError::NonFinite { .. })
        ));
        assert!(matches!(
            MappingConfig::new(1, 74, 0.0, f32::INFINITY),
            Err(MappingError::NonFinite { .. })
        ));
    }

    #[test]
    fn edit_keeps_other_fields() {
        let c = MappingConfig::default().with_cc_number(1).unwrap();
        assert_eq!(c.cc_number(), 1);
        assert_eq!(c.channel(), MappingConfig::DEFAULT_CHANNEL);
        assert_eq!(c.min_distance(), MappingConfig::DEFAULT_MIN);
    }

    #[test]
    fn edit_rejects_collapsing_window() {
        let c = MappingConfig::default();
        assert!(c.with_min_distance(c.max_distance()).is_err());
        assert!(c.with_max_distance(c.min_distance()).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: MappingConfig = toml::from_str(
            "channel = 2\ncc_number = 1\nmin_distance = 0.05\nmax_distance = 0.3",
        ).unwrap();
        assert_eq!(ok.channel(), 2);
        assert_eq!(ok.cc_number(), 1);

        let bad: Result<MappingConfig, _> = toml::from_str("channel = 0");
        assert!(bad.is_err());

        let collapsed: Result<MappingConfig, _> =
            toml::from_str("min_distance = 0.5\nmax_distance = 0.5");
        assert!(collapsed.is_err());
    }

    #[test]
    fn deserialize_fills_defaults() {
        let c: MappingConfig = toml::from_str("cc_number = 7").unwrap();
        assert_eq!(c.cc_number(), 7);
        assert_eq!(c.channel(), MappingConfig::DEFAULT_CHANNEL);
        assert_eq!(c.max_distance(), MappingConfig::DEFAULT_MAX);
    }
}
