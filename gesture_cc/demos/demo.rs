//! Sweeps a simulated pinch open and closed and prints what would go on the wire.

use gesture_cc::{GestureMapper, GestureSample, Landmark, MappingConfig, SmoothingConfig};

fn main() {
    println!("\n=== gesture_cc demo ===\n");

    let config = MappingConfig::new(1, 74, 0.02, 0.20).expect("valid mapping");

    // ── 1. Raw sweep: open from 0 to 0.25 and back ───────────────────────
    println!("1. Raw sweep, 60 frames, CC 74 on channel 1");
    let mut mapper = GestureMapper::new();
    let mut sent = 0;
    for frame in 0..60 {
        let phase = frame as f32 / 59.0;
        let d = 0.25 * (1.0 - (2.0 * phase - 1.0).abs());
        let out = mapper.on_frame(Some(&pinch(d, frame as f64 / 30.0)), &config);
        if let Some(msg) = out.message {
            sent += 1;
            println!("   frame {:>2}  d={:.3}  → {:02X?}", frame, d, msg.to_bytes());
        }
    }
    println!("   {} messages for 60 frames\n", sent);

    // ── 2. Jitter around one bucket ──────────────────────────────────────
    println!("2. Hand held still with ±0.0002 jitter");
    let mut mapper = GestureMapper::new();
    let mut sent = 0;
    for frame in 0..30 {
        let jitter = if frame % 2 == 0 { 0.0002 } else { -0.0002 };
        let out = mapper.on_frame(Some(&pinch(0.105 + jitter, frame as f64 / 30.0)), &config);
        if out.message.is_some() { sent += 1; }
    }
    println!("   {} message(s) for 30 frames\n", sent);

    // ── 3. Hand lost mid-stream ──────────────────────────────────────────
    println!("3. Hand lost for 10 frames");
    let mut mapper = GestureMapper::new();
    mapper.on_frame(Some(&pinch(0.15, 0.0)), &config);
    for _ in 0..10 {
        let out = mapper.on_frame(None, &config);
        assert!(out.message.is_none());
    }
    println!("   device still holds {:?}\n", mapper.state().last_sent());

    // ── 4. Smoothed step ─────────────────────────────────────────────────
    println!("4. One Euro smoothing on a closed → open step");
    let smoothing = SmoothingConfig { enabled: true, ..SmoothingConfig::default() };
    let mut mapper = GestureMapper::with_smoothing(smoothing);
    for frame in 0..20 {
        let d = if frame < 5 { 0.02 } else { 0.20 };
        let out = mapper.on_frame(Some(&pinch(d, frame as f64 / 30.0)), &config);
        if let Some(msg) = out.message {
            println!("   frame {:>2}  smoothed={:.3}  value={}", frame, out.display.distance, msg.value);
        }
    }
    println!();
}

fn pinch(d: f32, at: f64) -> GestureSample {
    GestureSample::new(Landmark::new(0.5, 0.5, 0.0), Landmark::new(0.5 + d, 0.5, 0.0), at)
}
