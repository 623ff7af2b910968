//! Configuration file for pinch_midi.
//!
//! ```toml
//! [mapping]
//! channel      = 1
//! cc_number    = 74
//! min_distance = 0.02
//! max_distance = 0.20
//!
//! [smoothing]
//! enabled    = false
//! min_cutoff = 1.0
//! beta       = 0.15
//!
//! [midi]
//! client_name = "pinch_midi"
//! port        = "IAC Driver Bus 1"   # endpoint id or name fragment
//!
//! [source]
//! kind           = "udp"             # udp | stdin | sim | leap
//! listen_address = "127.0.0.1"
//! port           = 5005
//! ```
//!
//! Every section is optional.  The file is read once at startup; live edits
//! made in the meter window are not written back.

use std::path::{Path, PathBuf};

use gesture_cc::{MappingConfig, SmoothingConfig};
use serde::Deserialize;

use crate::error::{ConfigError, PinchError};

/// File looked for in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "pinch_midi.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mapping:   MappingConfig,
    pub smoothing: SmoothingConfig,
    pub midi:      MidiConfig,
    pub source:    SourceConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PinchError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self, PinchError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load from the default locations, or fall back to defaults.
    pub fn load() -> Result<Self, PinchError> {
        let paths = [
            PathBuf::from(DEFAULT_CONFIG_FILE),
            PathBuf::from("config").join(DEFAULT_CONFIG_FILE),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the parts serde cannot check on its own.
    ///
    /// The mapping section is validated while it is deserialized.
    pub fn validate(&self) -> Result<(), PinchError> {
        let s = &self.smoothing;
        if s.enabled {
            if !(s.min_cutoff > 0.0) {
                return Err(invalid("smoothing.min_cutoff", "must be greater than 0"));
            }
            if !(s.beta >= 0.0) {
                return Err(invalid("smoothing.beta", "must not be negative"));
            }
            if !(s.d_cutoff > 0.0) {
                return Err(invalid("smoothing.d_cutoff", "must be greater than 0"));
            }
        }

        if self.midi.client_name.trim().is_empty() {
            return Err(invalid("midi.client_name", "must not be empty"));
        }

        if self.source.kind == SourceKind::Udp && self.source.port == 0 {
            return Err(invalid("source.port", "UDP port must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> PinchError {
    ConfigError::InvalidValue {
        field:   field.to_string(),
        message: message.to_string(),
    }
    .into()
}

// ════════════════════════════════════════════════════════════════════════════
// [midi]
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Client name announced to the MIDI subsystem
    pub client_name: String,
    /// Preferred output endpoint: exact id first, then case-insensitive
    /// name fragment
    pub port: Option<String>,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            client_name: "pinch_midi".to_string(),
            port:        None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// [source]
// ════════════════════════════════════════════════════════════════════════════

/// Where hand landmarks come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// JSON packets over UDP from an external hand tracker
    Udp,
    /// JSON packets, one per line, on standard input
    Stdin,
    /// Mouse/keyboard simulation in the meter window
    Sim,
    /// LeapMotion controller (needs the `leap` feature)
    Leap,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind:           SourceKind,
    /// Listen address for the UDP socket
    pub listen_address: String,
    /// UDP port to receive tracker packets on
    pub port:           u16,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind:           SourceKind::Sim,
            listen_address: "127.0.0.1".to_string(),
            port:           5005,
        }
    }
}

impl SourceConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen_address, self.port)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let c = Config::from_str("").unwrap();
        assert_eq!(c.mapping, MappingConfig::default());
        assert!(!c.smoothing.enabled);
        assert_eq!(c.midi.client_name, "pinch_midi");
        assert_eq!(c.source.kind, SourceKind::Sim);
        c.validate().unwrap();
    }

    #[test]
    fn full_file_parses() {
        let c = Config::from_str(
            r#"
            [mapping]
            channel = 3
            cc_number = 1
            min_distance = 0.03
            max_distance = 0.15

            [smoothing]
            enabled = true
            beta = 0.4

            [midi]
            port = "IAC"

            [source]
            kind = "udp"
            listen_address = "0.0.0.0"
            port = 6000
            "#,
        )
        .unwrap();
        assert_eq!(c.mapping.channel(), 3);
        assert_eq!(c.mapping.cc_number(), 1);
        assert!(c.smoothing.enabled);
        assert_eq!(c.smoothing.beta, 0.4);
        assert_eq!(c.smoothing.min_cutoff, 1.0);
        assert_eq!(c.midi.port.as_deref(), Some("IAC"));
        assert_eq!(c.source.kind, SourceKind::Udp);
        assert_eq!(c.source.bind_address(), "0.0.0.0:6000");
        c.validate().unwrap();
    }

    #[test]
    fn invalid_mapping_is_a_parse_error() {
        let err = Config::from_str("[mapping]\nchannel = 17").unwrap_err();
        assert!(matches!(err, PinchError::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn equal_bounds_rejected_at_load() {
        let r = Config::from_str("[mapping]\nmin_distance = 0.1\nmax_distance = 0.1");
        assert!(r.is_err());
    }

    #[test]
    fn unknown_source_kind_rejected() {
        assert!(Config::from_str("[source]\nkind = \"webcam\"").is_err());
    }

    #[test]
    fn validate_rejects_zero_cutoff() {
        let c = Config::from_str("[smoothing]\nenabled = true\nmin_cutoff = 0.0").unwrap();
        assert!(matches!(
            c.validate(),
            Err(PinchError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn validate_ignores_disabled_smoothing() {
        let c = Config::from_str("[smoothing]\nenabled = false\nmin_cutoff = 0.0").unwrap();
        c.validate().unwrap();
    }

    #[test]
    fn validate_rejects_udp_port_zero() {
        let c = Config::from_str("[source]\nkind = \"udp\"\nport = 0").unwrap();
        assert!(c.validate().is_err());
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::from_file("/nonexistent/pinch_midi.toml").unwrap_err();
        assert!(matches!(err, PinchError::Config(ConfigError::ReadFile(_))));
    }
}
