//! MIDI transport adapter.
//!
//! Binds to exactly one output endpoint and forwards CC messages verbatim.
//!
//! ```text
//!   Unbound ──scan──▶ Scanning ──▶ DeviceListed ──connect──▶ Connected
//!                                   ▲    │ select                 │
//!                                   │    └────────┘               │
//!                                   └──────────disconnect─────────┘
//! ```
//!
//! Endpoints are selected by their stable id, so a rescan that reorders the
//! device list cannot silently retarget a selection.  Sending while not
//! connected drops the message; a failed send is logged and swallowed.

pub mod memory;
pub mod midir_backend;

use gesture_cc::CcMessage;
use tracing::{debug, info, trace, warn};

use crate::error::TransportError;

pub use memory::MemoryBackend;
pub use midir_backend::MidirBackend;

// ════════════════════════════════════════════════════════════════════════════
// Backend seam
// ════════════════════════════════════════════════════════════════════════════

/// One output endpoint as reported by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Stable identifier used for selection.
    pub id:           String,
    /// Display name.
    pub name:         String,
    pub manufacturer: Option<String>,
}

impl Endpoint {
    pub fn new(id: &str, name: &str) -> Self {
        Endpoint { id: id.to_string(), name: name.to_string(), manufacturer: None }
    }
}

/// An open connection to one endpoint.
pub trait MidiSink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

/// Anything that can enumerate and open MIDI outputs.
pub trait MidiBackend {
    /// A fresh snapshot of the endpoints available right now.
    fn endpoints(&mut self) -> Result<Vec<Endpoint>, TransportError>;

    /// Open `endpoint`.  Fails with [`TransportError::EndpointGone`] if it is
    /// no longer present.
    fn open(&mut self, endpoint: &Endpoint) -> Result<Box<dyn MidiSink>, TransportError>;
}

// ════════════════════════════════════════════════════════════════════════════
// TransportState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Unbound,
    Scanning,
    DeviceListed,
    Connected,
}

/// Running counters, for the status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub sent:    u64,
    /// Messages dropped because nothing was connected.
    pub dropped: u64,
    /// Messages the backend failed to transmit.
    pub failed:  u64,
}

// ════════════════════════════════════════════════════════════════════════════
// MidiTransport
// ════════════════════════════════════════════════════════════════════════════

pub struct MidiTransport {
    backend:     Box<dyn MidiBackend>,
    state:       TransportState,
    endpoints:   Vec<Endpoint>,
    selected:    Option<String>,
    bound:       Option<(Endpoint, Box<dyn MidiSink>)>,
    /// Set once the environment reports MIDI as unavailable; never retried.
    unsupported: Option<TransportError>,
    stats:       TransportStats,
}

impl MidiTransport {
    pub fn new(backend: Box<dyn MidiBackend>) -> Self {
        MidiTransport {
            backend,
            state:       TransportState::Unbound,
            endpoints:   Vec::new(),
            selected:    None,
            bound:       None,
            unsupported: None,
            stats:       TransportStats::default(),
        }
    }

    pub fn state(&self)     -> TransportState  { self.state }
    pub fn endpoints(&self) -> &[Endpoint]     { &self.endpoints }
    pub fn selected(&self)  -> Option<&str>    { self.selected.as_deref() }
    pub fn stats(&self)     -> TransportStats  { self.stats }
    pub fn bound(&self)     -> Option<&Endpoint> {
        self.bound.as_ref().map(|(ep, _)| ep)
    }

    // ── scan ──────────────────────────────────────────────────────────────

    /// Enumerate endpoints.  An empty list is a valid result.
    ///
    /// Rejected while connected, so the bound endpoint cannot churn.
    pub fn scan(&mut self) -> Result<&[Endpoint], TransportError> {
        if let Some(err) = &self.unsupported {
            return Err(err.clone());
        }
        if let Some((ep, _)) = &self.bound {
            return Err(TransportError::AlreadyConnected(ep.name.clone()));
        }

        let previous = self.state;
        self.state = TransportState::Scanning;

        match self.backend.endpoints() {
            Ok(list) => {
                debug!(count = list.len(), "MIDI endpoints enumerated");
                if let Some(id) = &self.selected {
                    if !list.iter().any(|e| &e.id == id) {
                        info!("Selected endpoint {:?} is gone after rescan", id);
                        self.selected = None;
                    }
                }
                self.endpoints = list;
                self.state = TransportState::DeviceListed;
                Ok(self.endpoints.as_slice())
            }
            Err(e) => {
                if matches!(e, TransportError::Unsupported(_)) {
                    self.unsupported = Some(e.clone());
                }
                self.state = previous;
                Err(e)
            }
        }
    }

    // ── select ────────────────────────────────────────────────────────────

    /// Arm `id` as the endpoint to connect to.
    pub fn select(&mut self, id: &str) -> Result<(), TransportError> {
        if self.state != TransportState::DeviceListed {
            return Err(TransportError::InvalidSelection(
                "scan for devices before selecting".to_string(),
            ));
        }
        if !self.endpoints.iter().any(|e| e.id == id) {
            return Err(TransportError::InvalidSelection(format!("unknown endpoint {:?}", id)));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    /// Select by position in the last scan.  Resolves to the endpoint's id
    /// immediately, so later rescans cannot change what it refers to.
    pub fn select_index(&mut self, index: usize) -> Result<(), TransportError> {
        let id = self.endpoints.get(index)
            .map(|e| e.id.clone())
            .ok_or_else(|| TransportError::InvalidSelection(format!("no endpoint #{}", index)))?;
        self.select(&id)
    }

    /// Select the first endpoint whose id equals `wanted`, else whose name
    /// contains it (case-insensitive).
    pub fn select_matching(&mut self, wanted: &str) -> Result<(), TransportError> {
        let lower = wanted.to_lowercase();
        let id = self.endpoints.iter()
            .find(|e| e.id == wanted)
            .or_else(|| self.endpoints.iter().find(|e| e.name.to_lowercase().contains(&lower)))
            .map(|e| e.id.clone())
            .ok_or_else(|| TransportError::InvalidSelection(format!("no endpoint matches {:?}", wanted)))?;
        self.select(&id)
    }

    // ── connect / disconnect ─────────────────────────────────────────────

    /// Bind to the selected endpoint.
    ///
    /// Connecting again to the already-bound endpoint is a no-op.
    pub fn connect(&mut self) -> Result<Endpoint, TransportError> {
        if let Some((ep, _)) = &self.bound {
            return if self.selected.as_deref() == Some(ep.id.as_str()) {
                Ok(ep.clone())
            } else {
                Err(TransportError::AlreadyConnected(ep.name.clone()))
            };
        }

        let endpoint = self.selected.as_ref()
            .filter(|_| self.state == TransportState::DeviceListed)
            .and_then(|id| self.endpoints.iter().find(|e| &e.id == id))
            .cloned()
            .ok_or_else(|| TransportError::InvalidSelection("no endpoint selected".to_string()))?;

        let sink = self.backend.open(&endpoint)?;
        info!("Connected to MIDI output: {}", endpoint.name);
        self.bound = Some((endpoint.clone(), sink));
        self.state = TransportState::Connected;
        Ok(endpoint)
    }

    /// Release the bound endpoint and return to the device list.
    /// Idempotent; the selection is kept.
    pub fn disconnect(&mut self) {
        if let Some((ep, _sink)) = self.bound.take() {
            info!("Disconnected from MIDI output: {}", ep.name);
            self.state = TransportState::DeviceListed;
        }
    }

    // ── send ──────────────────────────────────────────────────────────────

    /// Fire-and-forget.  Never fails from the caller's point of view.
    pub fn send(&mut self, msg: &CcMessage) {
        let bytes = msg.to_bytes();
        match self.bound.as_mut() {
            Some((ep, sink)) => match sink.send(&bytes) {
                Ok(()) => {
                    self.stats.sent += 1;
                    trace!(bytes = ?bytes, "CC sent");
                }
                Err(e) => {
                    self.stats.failed += 1;
                    warn!("MIDI send to {} failed: {}", ep.name, e);
                }
            },
            None => {
                self.stats.dropped += 1;
                trace!(bytes = ?bytes, "CC dropped, no endpoint bound");
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
