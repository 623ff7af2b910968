//! In-memory MIDI backend.
//!
//! Records every message instead of transmitting it.  Clones share state, so
//! a test can keep one clone as a probe after handing the other to
//! [`MidiTransport`](super::MidiTransport).

use std::sync::{Arc, Mutex, MutexGuard};

use super::{Endpoint, MidiBackend, MidiSink};
use crate::error::TransportError;

#[derive(Default)]
struct Wire {
    endpoints:    Vec<Endpoint>,
    sent:         Vec<(String, Vec<u8>)>,
    unsupported:  Option<String>,
    failing:      bool,
    enumerations: usize,
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    wire: Arc<Mutex<Wire>>,
}

impl MemoryBackend {
    pub fn with_endpoints(names: &[&str]) -> Self {
        let backend = MemoryBackend::default();
        backend.set_endpoints(names);
        backend
    }

    fn wire(&self) -> MutexGuard<'_, Wire> {
        self.wire.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the device list, as if devices were plugged or unplugged.
    pub fn set_endpoints(&self, names: &[&str]) {
        self.wire().endpoints = names.iter().map(|n| Endpoint::new(n, n)).collect();
    }

    /// Make every enumeration fail as an unsupported environment.
    pub fn set_unsupported(&self, reason: &str) {
        self.wire().unsupported = Some(reason.to_string());
    }

    /// Make sends fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.wire().failing = failing;
    }

    /// `(endpoint id, bytes)` for every message delivered so far.
    pub fn sent(&self) -> Vec<(String, Vec<u8>)> {
        self.wire().sent.clone()
    }

    pub fn enumerations(&self) -> usize {
        self.wire().enumerations
    }
}

impl MidiBackend for MemoryBackend {
    fn endpoints(&mut self) -> Result<Vec<Endpoint>, TransportError> {
        let mut wire = self.wire();
        wire.enumerations += 1;
        if let Some(reason) = &wire.unsupported {
            return Err(TransportError::Unsupported(reason.clone()));
        }
        Ok(wire.endpoints.clone())
    }

    fn open(&mut self, endpoint: &Endpoint) -> Result<Box<dyn MidiSink>, TransportError> {
        if !self.wire().endpoints.iter().any(|e| e.id == endpoint.id) {
            return Err(TransportError::EndpointGone(endpoint.id.clone()));
        }
        Ok(Box::new(MemorySink { id: endpoint.id.clone(), backend: self.clone() }))
    }
}

struct MemorySink {
    id:      String,
    backend: MemoryBackend,
}

impl MidiSink for MemorySink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut wire = self.backend.wire();
        if wire.failing {
            return Err(TransportError::Send("simulated failure".to_string()));
        }
        wire.sent.push((self.id.clone(), bytes.to_vec()));
        Ok(())
    }
}
