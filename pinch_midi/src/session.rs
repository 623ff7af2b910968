//! Session — everything the frame pump touches, in one owned struct.
//!
//! The main thread owns the `Session` and calls [`Session::handle_frame`]
//! for every frame a source delivers.  Device control and live config edits
//! go through the same struct, so mapper state and the bound endpoint are
//! only ever touched from one thread.
//!
//! `status` is last-write text for the user: each operation that has
//! something to say overwrites it.  There is no history.

use gesture_cc::{Display, FrameOutput, GestureMapper, MappingConfig, SmoothingConfig};
use tracing::{info, warn};

use crate::error::TransportError;
use crate::source::HandFrame;
use crate::transport::{Endpoint, MidiTransport, TransportState};

// ════════════════════════════════════════════════════════════════════════════
// ConfigEdit
// ════════════════════════════════════════════════════════════════════════════

/// A live edit of one mapping field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigEdit {
    Channel(u8),
    CcNumber(u8),
    MinDistance(f32),
    MaxDistance(f32),
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

pub struct Session {
    mapper:    GestureMapper,
    transport: MidiTransport,
    config:    MappingConfig,
    display:   Display,
    status:    String,
    /// `Unsupported` has already been reported to the user.
    unsupported_reported: bool,
}

impl Session {
    pub fn new(config: MappingConfig, smoothing: SmoothingConfig, transport: MidiTransport) -> Self {
        Session {
            mapper: GestureMapper::with_smoothing(smoothing),
            transport,
            config,
            display: Display::default(),
            status: "Scan for MIDI devices to begin".to_string(),
            unsupported_reported: false,
        }
    }

    pub fn config(&self)    -> &MappingConfig  { &self.config }
    pub fn display(&self)   -> Display         { self.display }
    pub fn status(&self)    -> &str            { &self.status }
    pub fn transport(&self) -> &MidiTransport  { &self.transport }

    // ── frame pump ────────────────────────────────────────────────────────

    /// Map one frame and send the resulting message, if any.
    pub fn handle_frame(&mut self, frame: &HandFrame) -> FrameOutput {
        let sample = frame.sample();
        let out = self.mapper.on_frame(sample.as_ref(), &self.config);
        if let Some(msg) = &out.message {
            self.transport.send(msg);
        }
        self.display = out.display;
        out
    }

    // ── live configuration ────────────────────────────────────────────────

    /// Apply one edit.  An invalid edit keeps the previous configuration.
    pub fn apply_edit(&mut self, edit: ConfigEdit) -> bool {
        let result = match edit {
            ConfigEdit::Channel(ch)     => self.config.with_channel(ch),
            ConfigEdit::CcNumber(cc)    => self.config.with_cc_number(cc),
            ConfigEdit::MinDistance(d)  => self.config.with_min_distance(d),
            ConfigEdit::MaxDistance(d)  => self.config.with_max_distance(d),
        };

        match result {
            Ok(config) => {
                self.config = config;
                self.status = format!(
                    "ch {}  CC {}  window {:.3}..{:.3}",
                    config.channel(), config.cc_number(),
                    config.min_distance(), config.max_distance(),
                );
                info!("Mapping updated: {}", self.status);
                true
            }
            Err(e) => {
                self.status = format!("Rejected: {}", e);
                warn!("{}", self.status);
                false
            }
        }
    }

    // ── device control ────────────────────────────────────────────────────

    /// Enumerate endpoints and report the outcome in `status`.
    pub fn scan(&mut self) -> Result<Vec<Endpoint>, TransportError> {
        match self.transport.scan() {
            Ok(list) => {
                let list = list.to_vec();
                self.status = if list.is_empty() {
                    "No MIDI devices found; connect one and rescan".to_string()
                } else {
                    format!("{} MIDI device(s) found", list.len())
                };
                Ok(list)
            }
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    pub fn select(&mut self, id: &str) -> Result<(), TransportError> {
        let r = self.transport.select(id);
        self.after_select(r)
    }

    pub fn select_index(&mut self, index: usize) -> Result<(), TransportError> {
        let r = self.transport.select_index(index);
        self.after_select(r)
    }

    pub fn select_matching(&mut self, wanted: &str) -> Result<(), TransportError> {
        let r = self.transport.select_matching(wanted);
        self.after_select(r)
    }

    fn after_select(&mut self, r: Result<(), TransportError>) -> Result<(), TransportError> {
        match &r {
            Ok(()) => {
                if let Some(id) = self.transport.selected() {
                    self.status = format!("Selected {}", id);
                }
            }
            Err(e) => self.report(e),
        }
        r
    }

    pub fn connect(&mut self) -> Result<Endpoint, TransportError> {
        match self.transport.connect() {
            Ok(ep) => {
                self.status = format!("Connected to {}", ep.name);
                Ok(ep)
            }
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    pub fn disconnect(&mut self) {
        if self.transport.state() == TransportState::Connected {
            self.transport.disconnect();
            self.status = "Disconnected".to_string();
        }
    }

    /// `Unsupported` is reported once; later attempts leave status alone.
    fn report(&mut self, e: &TransportError) {
        if let TransportError::Unsupported(_) = e {
            if self.unsupported_reported { return; }
            self.unsupported_reported = true;
        }
        warn!("{}", e);
        self.status = e.to_string();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryBackend;
    use gesture_cc::{HandLandmarks, Landmark, HAND_LANDMARK_COUNT, INDEX_TIP, THUMB_TIP};

    fn pinch(at: f64, distance: f32) -> HandFrame {
        let mut points = [Landmark::default(); HAND_LANDMARK_COUNT];
        points[THUMB_TIP] = Landmark::new(0.4, 0.5, 0.0);
        points[INDEX_TIP] = Landmark::new(0.4 + distance, 0.5, 0.0);
        HandFrame { at, hands: vec![HandLandmarks::new(points)] }
    }

    fn session(probe: &MemoryBackend) -> Session {
        let transport = MidiTransport::new(Box::new(probe.clone()));
        Session::new(MappingConfig::default(), SmoothingConfig::default(), transport)
    }

    fn connected(names: &[&str]) -> (Session, MemoryBackend) {
        let probe = MemoryBackend::with_endpoints(names);
        let mut s = session(&probe);
        s.scan().unwrap();
        s.select_index(0).unwrap();
        s.connect().unwrap();
        (s, probe)
    }

    #[test]
    fn frames_reach_the_wire_through_the_gate() {
        let (mut s, probe) = connected(&["Synth"]);
        s.handle_frame(&pinch(0.0, 0.20));
        s.handle_frame(&pinch(0.1, 0.20));
        s.handle_frame(&pinch(0.2, 0.02));

        let sent: Vec<Vec<u8>> = probe.sent().into_iter().map(|(_, b)| b).collect();
        assert_eq!(sent, vec![vec![0xB0, 74, 127], vec![0xB0, 74, 0]]);
        assert_eq!(s.display().value, Some(0));
        assert!(s.display().hand_present);
    }

    #[test]
    fn frames_before_connect_are_dropped() {
        let probe = MemoryBackend::with_endpoints(&["Synth"]);
        let mut s = session(&probe);
        let out = s.handle_frame(&pinch(0.0, 0.20));
        assert!(out.message.is_some());
        assert!(probe.sent().is_empty());
        assert_eq!(s.transport().stats().dropped, 1);
    }

    #[test]
    fn empty_frame_keeps_last_value() {
        let (mut s, probe) = connected(&["Synth"]);
        s.handle_frame(&pinch(0.0, 0.20));
        let out = s.handle_frame(&HandFrame::empty(0.1));
        assert!(out.message.is_none());
        assert!(!s.display().hand_present);
        assert_eq!(s.display().value, Some(127));
        assert_eq!(probe.sent().len(), 1);
    }

    #[test]
    fn edit_applies_on_next_frame() {
        let (mut s, probe) = connected(&["Synth"]);
        s.handle_frame(&pinch(0.0, 0.20));
        assert!(s.apply_edit(ConfigEdit::CcNumber(1)));
        assert!(s.apply_edit(ConfigEdit::Channel(16)));
        s.handle_frame(&pinch(0.1, 0.02));
        assert_eq!(probe.sent().last().unwrap().1, vec![0xBF, 1, 0]);
    }

    #[test]
    fn rejected_edit_keeps_config() {
        let probe = MemoryBackend::default();
        let mut s = session(&probe);
        let before = *s.config();
        assert!(!s.apply_edit(ConfigEdit::MaxDistance(0.01)));
        assert!(!s.apply_edit(ConfigEdit::Channel(0)));
        assert!(!s.apply_edit(ConfigEdit::CcNumber(128)));
        assert_eq!(*s.config(), before);
        assert!(s.status().starts_with("Rejected"));
    }

    #[test]
    fn no_devices_is_status_not_error() {
        let probe = MemoryBackend::default();
        let mut s = session(&probe);
        assert!(s.scan().unwrap().is_empty());
        assert!(s.status().contains("rescan"));
        assert_eq!(s.transport().state(), TransportState::DeviceListed);
    }

    #[test]
    fn bad_selection_reported() {
        let probe = MemoryBackend::with_endpoints(&["Synth"]);
        let mut s = session(&probe);
        s.scan().unwrap();
        assert!(matches!(s.select_index(3), Err(TransportError::InvalidSelection(_))));
        assert!(s.status().contains("Invalid selection"));
        assert!(matches!(s.connect(), Err(TransportError::InvalidSelection(_))));
    }

    #[test]
    fn unsupported_reported_once() {
        let probe = MemoryBackend::default();
        probe.set_unsupported("no MIDI subsystem");
        let mut s = session(&probe);
        assert!(s.scan().is_err());
        let first = s.status().to_string();
        assert!(first.contains("not available"));

        s.apply_edit(ConfigEdit::CcNumber(7));
        assert!(matches!(s.scan(), Err(TransportError::Unsupported(_))));
        assert!(s.status().starts_with("ch "), "status was overwritten: {}", s.status());
    }

    #[test]
    fn select_matching_by_name_fragment() {
        let probe = MemoryBackend::with_endpoints(&["IAC Driver Bus 1", "USB Synth"]);
        let mut s = session(&probe);
        s.scan().unwrap();
        s.select_matching("synth").unwrap();
        assert_eq!(s.connect().unwrap().name, "USB Synth");
        assert_eq!(s.status(), "Connected to USB Synth");
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (mut s, _probe) = connected(&["Synth"]);
        s.disconnect();
        assert_eq!(s.status(), "Disconnected");
        assert_eq!(s.transport().state(), TransportState::DeviceListed);
        s.disconnect();
        assert_eq!(s.transport().state(), TransportState::DeviceListed);
    }

    #[test]
    fn send_failure_does_not_reach_frame_path() {
        let (mut s, probe) = connected(&["Synth"]);
        probe.set_failing(true);
        let out = s.handle_frame(&pinch(0.0, 0.20));
        assert!(out.message.is_some());
        assert_eq!(s.transport().stats().failed, 1);
        assert_eq!(s.display().value, Some(127));
    }
}
