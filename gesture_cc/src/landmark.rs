//! Hand landmarks as delivered by an external hand tracker.
//!
//! Trackers in the MediaPipe family report 21 points per hand in a fixed
//! topology.  Only two of them matter here: the thumb tip and the index tip.

use serde::Deserialize;

// ════════════════════════════════════════════════════════════════════════════
// Hand topology
// ════════════════════════════════════════════════════════════════════════════

/// Number of landmarks in one tracked hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One tracked point in normalized camera space.
///
/// `x` and `y` are conventionally in `[0, 1]`; `z` is a relative depth with
/// no fixed unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "[f32; 3]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// True 3D Euclidean distance, so depth motion counts.
    pub fn distance_to(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx*dx + dy*dy + dz*dz).sqrt()
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Landmark { x, y, z }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandLandmarks — one complete hand
// ════════════════════════════════════════════════════════════════════════════

/// A full hand: exactly [`HAND_LANDMARK_COUNT`] points.
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks([Landmark; HAND_LANDMARK_COUNT]);

impl HandLandmarks {
    pub fn new(points: [Landmark; HAND_LANDMARK_COUNT]) -> Self {
        HandLandmarks(points)
    }

    /// Build from a tracker's point list.  Returns `None` unless exactly 21
    /// points are present.
    pub fn from_slice(points: &[Landmark]) -> Option<Self> {
        let arr: [Landmark; HAND_LANDMARK_COUNT] = points.try_into().ok()?;
        Some(HandLandmarks(arr))
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.0.get(index)
    }

    pub fn points(&self) -> &[Landmark; HAND_LANDMARK_COUNT] {
        &self.0
    }

    /// The thumb-tip / index-tip pair for this hand, stamped with `at`.
    pub fn pinch(&self, at: f64) -> GestureSample {
        GestureSample {
            thumb_tip: self.0[THUMB_TIP],
            index_tip: self.0[INDEX_TIP],
            at,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureSample
// ════════════════════════════════════════════════════════════════════════════

/// The two landmarks of interest for one frame.
///
/// Absence of a hand is `Option::<GestureSample>::None` at the call site, so a
/// half-present pair cannot be expressed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureSample {
    pub thumb_tip: Landmark,
    pub index_tip: Landmark,
    /// Frame timestamp in seconds (monotonic, source-relative).
    pub at: f64,
}

impl GestureSample {
    pub fn new(thumb_tip: Landmark, index_tip: Landmark, at: f64) -> Self {
        GestureSample { thumb_tip, index_tip, at }
    }

    pub fn distance(&self) -> f32 {
        self.thumb_tip.distance_to(&self.index_tip)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_three_dimensional() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.0, 0.0, 0.5);
        assert!((a.distance_to(&b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn distance_pythagorean() {
        let a = Landmark::new(0.1, 0.1, 0.0);
        let b = Landmark::new(0.4, 0.5, 0.0);
        assert!((a.distance_to(&b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn from_slice_requires_21_points() {
        let short = vec![Landmark::default(); 20];
        assert!(HandLandmarks::from_slice(&short).is_none());
        let long = vec![Landmark::default(); 22];
        assert!(HandLandmarks::from_slice(&long).is_none());
        let exact = vec![Landmark::default(); 21];
        assert!(HandLandmarks::from_slice(&exact).is_some());
    }

    #[test]
    fn pinch_reads_thumb_and_index_tips() {
        let mut pts = [Landmark::default(); HAND_LANDMARK_COUNT];
        pts[THUMB_TIP] = Landmark::new(0.2, 0.3, 0.0);
        pts[INDEX_TIP] = Landmark::new(0.5, 0.7, 0.0);
        let s = HandLandmarks::new(pts).pinch(1.5);
        assert_eq!(s.thumb_tip, Landmark::new(0.2, 0.3, 0.0));
        assert_eq!(s.index_tip, Landmark::new(0.5, 0.7, 0.0));
        assert_eq!(s.at, 1.5);
        assert!((s.distance() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn landmark_deserializes_from_triple() {
        #[derive(Deserialize)]
        struct W { p: Landmark }
        let w: W = toml::from_str("p = [0.25, 0.5, -0.125]").unwrap();
        assert_eq!(w.p, Landmark::new(0.25, 0.5, -0.125));
    }
}
