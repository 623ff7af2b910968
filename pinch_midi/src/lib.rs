//! # pinch_midi
//!
//! Hand-tracking pinch controller.  The distance between thumb tip and index
//! tip drives one MIDI Control Change on one output device, with a live meter
//! window for tuning the mapping.
//!
//! ## Data flow
//!
//! ```text
//!  source thread                      main thread
//! ┌──────────────┐  HandFrame   ┌──────────────────────────────────────┐
//! │ UDP / stdin  │ ──mpsc────▶  │ Session                              │
//! │ sim / Leap   │              │   GestureMapper ─▶ MidiTransport ─▶ │ MIDI out
//! └──────────────┘              │   (gesture_cc)     (midir)           │
//!                               └──────────────────────────────────────┘
//! ```
//!
//! ## Landmark sources
//!
//! | `--source` | Input |
//! |---|---|
//! | `udp` | JSON packets from an external tracker (e.g. a MediaPipe Hands script) |
//! | `stdin` | The same JSON, one packet per line |
//! | `sim` | Mouse and arrow keys in the meter window (default) |
//! | `leap` | LeapMotion controller; needs the `leap` feature |
//!
//! Tracker packet:
//!
//! ```json
//! {"timestamp": 12.25, "hands": [[[x, y, z], ... 21 points ...]]}
//! ```
//!
//! Only the first hand is used.  Landmark 4 is the thumb tip, landmark 8 the
//! index tip.
//!
//! ## Feature flags
//!
//! * (default) — UDP, stdin and simulation sources.
//! * `leap` — **Hardware mode**: polls a real LeapMotion controller via LeapC.

pub mod app;
pub mod config;
pub mod error;
pub mod meter;
pub mod session;
pub mod source;
pub mod transport;

pub use config::{Config, SourceKind};
pub use error::{PinchError, Result};
pub use session::{ConfigEdit, Session};
pub use transport::{Endpoint, MemoryBackend, MidiTransport, MidirBackend, TransportState};

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
