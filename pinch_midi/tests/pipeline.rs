//! End to end: tracker packets on a line stream, through the session, onto
//! a recording MIDI backend.

use std::io::Cursor;

use gesture_cc::{MappingConfig, SmoothingConfig, HAND_LANDMARK_COUNT, INDEX_TIP, THUMB_TIP};
use pinch_midi::source::{spawn_landmark_source, LineLandmarkSource};
use pinch_midi::{ConfigEdit, MemoryBackend, MidiTransport, Session, TransportState};
use serde_json::json;

/// One packet line with a single hand pinched `distance` apart along x.
fn packet(at: f64, distance: f32) -> String {
    let mut points = vec![[0.5f32, 0.6, 0.0]; HAND_LANDMARK_COUNT];
    points[THUMB_TIP] = [0.25, 0.5, 0.0];
    points[INDEX_TIP] = [0.25 + distance, 0.5, 0.0];
    json!({ "timestamp": at, "hands": [points] }).to_string()
}

fn no_hand(at: f64) -> String {
    json!({ "timestamp": at, "hands": [] }).to_string()
}

fn connected_session(probe: &MemoryBackend) -> Session {
    let transport = MidiTransport::new(Box::new(probe.clone()));
    let mut session = Session::new(MappingConfig::default(), SmoothingConfig::default(), transport);
    session.scan().unwrap();
    session.select_matching("synth").unwrap();
    session.connect().unwrap();
    assert_eq!(session.transport().state(), TransportState::Connected);
    session
}

fn run_lines(session: &mut Session, lines: &[String]) {
    let input = lines.join("\n");
    let frames = spawn_landmark_source(LineLandmarkSource::new(Cursor::new(input)));
    for frame in frames {
        session.handle_frame(&frame);
    }
}

#[test]
fn pinch_sweep_reaches_the_wire() {
    let probe = MemoryBackend::with_endpoints(&["IAC Bus", "Synth"]);
    let mut session = connected_session(&probe);

    run_lines(&mut session, &[
        packet(0.00, 0.01),   // below the window
        packet(0.03, 0.01),   // same value: gated
        packet(0.06, 0.25),   // above the window
        no_hand(0.09),        // absence: nothing sent
        "this line is not json".to_string(),
        packet(0.12, 0.25),   // hand back at the same value: gated
        packet(0.15, 0.02),
    ]);

    let sent = probe.sent();
    assert!(sent.iter().all(|(id, _)| id == "Synth"));
    let bytes: Vec<Vec<u8>> = sent.into_iter().map(|(_, b)| b).collect();
    assert_eq!(bytes, vec![
        vec![0xB0, 74, 0],
        vec![0xB0, 74, 127],
        vec![0xB0, 74, 0],
    ]);
    assert_eq!(session.display().value, Some(0));
}

#[test]
fn live_edit_changes_the_next_message() {
    let probe = MemoryBackend::with_endpoints(&["Synth"]);
    let mut session = connected_session(&probe);

    run_lines(&mut session, &[packet(0.0, 0.30)]);
    assert!(session.apply_edit(ConfigEdit::Channel(10)));
    assert!(session.apply_edit(ConfigEdit::CcNumber(1)));
    run_lines(&mut session, &[packet(0.1, 0.01)]);

    let bytes: Vec<Vec<u8>> = probe.sent().into_iter().map(|(_, b)| b).collect();
    assert_eq!(bytes, vec![vec![0xB0, 74, 127], vec![0xB9, 1, 0]]);
}

#[test]
fn unplugged_device_drops_until_reconnected() {
    let probe = MemoryBackend::with_endpoints(&["Synth"]);
    let mut session = connected_session(&probe);

    session.disconnect();
    run_lines(&mut session, &[packet(0.0, 0.30)]);
    assert!(probe.sent().is_empty());
    assert_eq!(session.transport().stats().dropped, 1);

    probe.set_endpoints(&[]);
    assert!(session.scan().unwrap().is_empty());
    assert!(session.connect().is_err());

    probe.set_endpoints(&["Synth"]);
    session.scan().unwrap();
    session.select("Synth").unwrap();
    session.connect().unwrap();
    run_lines(&mut session, &[packet(0.1, 0.01)]);
    assert_eq!(probe.sent().len(), 1);
}
