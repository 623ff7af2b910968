//! `midir` backend.
//!
//! midir has no persistent port identity beyond the port name, so the name
//! doubles as the endpoint id.  Every scan and every open uses a fresh
//! `MidiOutput` client, which gives a fresh snapshot each time.

use midir::{MidiOutput, MidiOutputConnection};
use tracing::debug;

use super::{Endpoint, MidiBackend, MidiSink};
use crate::error::TransportError;

/// Connection name shown by the MIDI subsystem for our output.
const CONNECTION_NAME: &str = "pinch-cc";

pub struct MidirBackend {
    client_name: String,
}

impl MidirBackend {
    pub fn new(client_name: &str) -> Self {
        MidirBackend { client_name: client_name.to_string() }
    }

    fn client(&self) -> Result<MidiOutput, TransportError> {
        MidiOutput::new(&self.client_name)
            .map_err(|e| TransportError::Unsupported(e.to_string()))
    }
}

impl MidiBackend for MidirBackend {
    fn endpoints(&mut self) -> Result<Vec<Endpoint>, TransportError> {
        let out = self.client()?;
        let endpoints = out.ports().iter()
            .filter_map(|p| match out.port_name(p) {
                Ok(name) => Some(Endpoint::new(&name, &name)),
                Err(e) => {
                    debug!("Skipping MIDI port with unreadable name: {}", e);
                    None
                }
            })
            .collect();
        Ok(endpoints)
    }

    fn open(&mut self, endpoint: &Endpoint) -> Result<Box<dyn MidiSink>, TransportError> {
        let out = self.client()?;
        let port = out.ports().into_iter()
            .find(|p| out.port_name(p).map(|n| n == endpoint.id).unwrap_or(false))
            .ok_or_else(|| TransportError::EndpointGone(endpoint.id.clone()))?;

        let conn = out.connect(&port, CONNECTION_NAME)
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Box::new(MidirSink { conn }))
    }
}

struct MidirSink {
    conn: MidiOutputConnection,
}

impl MidiSink for MidirSink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.conn.send(bytes).map_err(|e| TransportError::Send(e.to_string()))
    }
}
