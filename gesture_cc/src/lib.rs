//! # gesture_cc
//!
//! Turn a tracked thumb-tip / index-tip pair into a MIDI Control Change
//! stream:
//!
//! | Step | Rule |
//! |---|---|
//! | Distance | 3D Euclidean norm between landmarks 4 and 8 |
//! | Clamp | into `[min_distance, max_distance]` |
//! | Normalize | `(d - min) / (max - min)` → `[0, 1]` |
//! | Quantize | `round(n × 127)`, halves round up |
//! | Change-gate | emit only when the value differs from the last one sent |
//!
//! No hand → no message, and the last sent value is kept.
//!
//! ## Quick start
//!
//! ```rust
//! use gesture_cc::{GestureMapper, GestureSample, Landmark, MappingConfig};
//!
//! let config = MappingConfig::new(1, 74, 0.02, 0.20).unwrap();
//! let mut mapper = GestureMapper::new();
//!
//! let pinch = GestureSample::new(
//!     Landmark::new(0.40, 0.50, 0.0),   // thumb tip
//!     Landmark::new(0.51, 0.50, 0.0),   // index tip
//!     0.0,
//! );
//!
//! let out = mapper.on_frame(Some(&pinch), &config);
//! let msg = out.message.unwrap();
//! assert_eq!(msg.to_bytes()[0], 0xB0);
//!
//! // Same bucket again: nothing to send.
//! assert!(mapper.on_frame(Some(&pinch), &config).message.is_none());
//! ```

pub mod config;
pub mod filter;
pub mod landmark;
pub mod mapper;
pub mod message;

pub use config::{MappingConfig, MappingError};
pub use filter::{OneEuroFilter, SmoothingConfig};
pub use landmark::{GestureSample, HandLandmarks, Landmark, HAND_LANDMARK_COUNT, INDEX_TIP, THUMB_TIP};
pub use mapper::{map_distance, normalize, quantize, Display, FrameOutput, GestureMapper, MapperState, CC_MAX};
pub use message::CcMessage;
