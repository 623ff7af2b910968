//! The frame pump.
//!
//! Starts the configured landmark source on its own thread, then drains its
//! frames into the [`Session`] on this thread, either under the meter window
//! (~60 fps) or headless until the source ends.

use std::io::{self, BufReader};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use tracing::{debug, info};

use crate::config::{Config, SourceKind};
use crate::error::{Result, SourceError};
use crate::meter::{Meter, MeterCommand};
use crate::session::Session;
use crate::source::{
    spawn_landmark_source, HandFrame, LineLandmarkSource, SimInput, SimLandmarkSource,
    UdpLandmarkSource,
};

/// Run until the window closes, the user quits, or the source ends.
pub fn run(session: &mut Session, cfg: &Config, headless: bool) -> Result<()> {
    let (frames, sim_tx) = start_source(cfg, headless)?;

    if headless {
        run_headless(session, frames);
        return Ok(());
    }

    let mut meter = Meter::new(sim_tx)?;
    info!("Meter window open");

    while meter.is_open() {
        // 1. Window input → session commands (sim input goes to the source)
        for cmd in meter.poll_input(session.config()) {
            match cmd {
                MeterCommand::Quit          => return Ok(()),
                MeterCommand::Edit(edit)    => { session.apply_edit(edit); }
                MeterCommand::Rescan        => { let _ = session.scan(); }
                MeterCommand::Connect       => { let _ = session.connect(); }
                MeterCommand::Disconnect    => session.disconnect(),
            }
        }

        // 2. Drain frames
        loop {
            match frames.try_recv() {
                Ok(frame) => pump(session, &frame),
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => {
                    info!("Landmark source ended");
                    return Ok(());
                }
            }
        }

        // 3. Render
        meter.render(
            &session.display(),
            session.config(),
            session.status(),
            session.transport().state(),
        );
    }

    Ok(())
}

fn run_headless(session: &mut Session, frames: Receiver<HandFrame>) {
    info!("Running headless; waiting for landmark frames");
    for frame in frames {
        pump(session, &frame);
    }
    let stats = session.transport().stats();
    info!(
        sent = stats.sent, dropped = stats.dropped, failed = stats.failed,
        "Landmark source ended"
    );
}

fn pump(session: &mut Session, frame: &HandFrame) {
    let out = session.handle_frame(frame);
    if let Some(msg) = out.message {
        debug!(
            distance = out.display.distance,
            value = msg.value,
            "CC {} on channel {}", msg.cc_number, msg.channel
        );
    }
}

/// Spawn the configured source.  The sim sender is returned for the meter.
fn start_source(
    cfg: &Config,
    headless: bool,
) -> Result<(Receiver<HandFrame>, Option<Sender<SimInput>>)> {
    let started = match cfg.source.kind {
        SourceKind::Udp => {
            let source = UdpLandmarkSource::bind(&cfg.source.bind_address())?;
            (spawn_landmark_source(source), None)
        }
        SourceKind::Stdin => {
            info!("Reading tracker packets from standard input");
            let source = LineLandmarkSource::new(BufReader::new(io::stdin()));
            (spawn_landmark_source(source), None)
        }
        SourceKind::Sim => {
            if headless {
                return Err(SourceError::Unavailable(
                    "the sim source is driven from the meter window; drop --headless".to_string(),
                ).into());
            }
            let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
            (spawn_landmark_source(SimLandmarkSource { rx: sim_rx }), Some(sim_tx))
        }
        SourceKind::Leap => start_leap()?,
    };
    Ok(started)
}

#[cfg(feature = "leap")]
fn start_leap() -> Result<(Receiver<HandFrame>, Option<Sender<SimInput>>)> {
    info!("Polling LeapMotion controller");
    Ok((spawn_landmark_source(crate::source::LeapLandmarkSource), None))
}

#[cfg(not(feature = "leap"))]
fn start_leap() -> Result<(Receiver<HandFrame>, Option<Sender<SimInput>>)> {
    Err(SourceError::Unavailable(
        "built without the `leap` feature (rebuild with --features leap)".to_string(),
    ).into())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PinchError;
    use crate::transport::{MemoryBackend, MidiTransport};
    use gesture_cc::{MappingConfig, SmoothingConfig};

    fn session() -> Session {
        let transport = MidiTransport::new(Box::new(MemoryBackend::default()));
        Session::new(MappingConfig::default(), SmoothingConfig::default(), transport)
    }

    #[test]
    fn sim_source_needs_window() {
        let cfg = Config::default();
        assert_eq!(cfg.source.kind, SourceKind::Sim);
        let err = run(&mut session(), &cfg, true).unwrap_err();
        assert!(matches!(err, PinchError::Source(SourceError::Unavailable(_))));
    }

    #[cfg(not(feature = "leap"))]
    #[test]
    fn leap_source_needs_feature() {
        let mut cfg = Config::default();
        cfg.source.kind = SourceKind::Leap;
        let err = run(&mut session(), &cfg, true).unwrap_err();
        assert!(matches!(err, PinchError::Source(SourceError::Unavailable(_))));
    }
}
