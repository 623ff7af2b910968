//! Landmark sources — external hand trackers, LeapMotion, or simulation.
//!
//! The public interface is [`HandFrame`] delivered over a `mpsc` channel.
//! The session does not need to know whether frames came from a tracker
//! process, a LeapMotion, or the mouse in the meter window.

use std::io::BufRead;
use std::net::UdpSocket;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use gesture_cc::{GestureSample, HandLandmarks, Landmark, HAND_LANDMARK_COUNT, INDEX_TIP, THUMB_TIP};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::SourceError;

// ════════════════════════════════════════════════════════════════════════════
// HandFrame
// ════════════════════════════════════════════════════════════════════════════

/// Everything the tracker saw in one video frame.
#[derive(Clone, Debug, PartialEq)]
pub struct HandFrame {
    /// Seconds, monotonic within one source.
    pub at:    f64,
    pub hands: Vec<HandLandmarks>,
}

impl HandFrame {
    pub fn empty(at: f64) -> Self {
        HandFrame { at, hands: Vec::new() }
    }

    /// The pinch pair of the first hand; further hands are ignored.
    pub fn sample(&self) -> Option<GestureSample> {
        self.hands.first().map(|h| h.pinch(self.at))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tracker packet — JSON shared by the UDP and line sources
// ════════════════════════════════════════════════════════════════════════════

/// One JSON packet from an external hand tracker:
///
/// ```json
/// {"timestamp": 12.25, "hands": [[[0.51, 0.62, -0.03], ... 21 points ...]]}
/// ```
///
/// `timestamp` is optional; the receive time is used when it is missing.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerPacket {
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub hands:     Vec<Vec<Landmark>>,
}

impl TrackerPacket {
    pub fn parse(bytes: &[u8]) -> Result<Self, SourceError> {
        serde_json::from_slice(bytes)
            .map_err(|e| SourceError::Parse(format!("JSON parse error: {}", e)))
    }

    /// Convert to a frame, dropping any hand without exactly 21 points.
    pub fn into_frame(self, received_at: f64) -> HandFrame {
        let at = self.timestamp.unwrap_or(received_at);
        let hands = self.hands.iter()
            .filter_map(|points| {
                let hand = HandLandmarks::from_slice(points);
                if hand.is_none() {
                    debug!(
                        "Dropping hand with {} landmarks (expected {})",
                        points.len(), HAND_LANDMARK_COUNT
                    );
                }
                hand
            })
            .collect();
        HandFrame { at, hands }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait — unified interface for every tracker
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`HandFrame`]s over a channel.
///
/// `run` returns when the source is exhausted or the receiver hangs up.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<HandFrame>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<HandFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// UdpLandmarkSource — JSON over UDP from a tracker process
// ════════════════════════════════════════════════════════════════════════════

/// Receives [`TrackerPacket`]s from an external tracker (e.g. a MediaPipe
/// Hands script) on a UDP socket.
pub struct UdpLandmarkSource {
    socket: UdpSocket,
}

impl UdpLandmarkSource {
    /// Bind now so address errors surface at startup, not on the thread.
    pub fn bind(addr: &str) -> Result<Self, SourceError> {
        let socket = UdpSocket::bind(addr)
            .map_err(|e| SourceError::Bind(format!("{}: {}", addr, e)))?;
        socket.set_read_timeout(Some(Duration::from_millis(100)))
            .map_err(|e| SourceError::Bind(format!("{}: {}", addr, e)))?;
        info!("Tracker receiver listening on {}", addr);
        Ok(UdpLandmarkSource { socket })
    }

    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.socket.local_addr().ok()
    }
}

impl LandmarkSource for UdpLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        let clock = Instant::now();
        let mut buf = [0u8; 65536];

        loop {
            let size = match self.socket.recv(&mut buf) {
                Ok(n) => n,
                Err(e) if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) => continue,
                Err(e) => {
                    warn!("{}", SourceError::Receive(e.to_string()));
                    continue;
                }
            };

            let frame = match TrackerPacket::parse(&buf[..size]) {
                Ok(p)  => p.into_frame(clock.elapsed().as_secs_f64()),
                Err(e) => { warn!("{}", e); continue; }
            };
            if tx.send(frame).is_err() { return; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LineLandmarkSource — one JSON packet per line (stdin, files, pipes)
// ════════════════════════════════════════════════════════════════════════════

pub struct LineLandmarkSource<R> {
    reader: R,
}

impl<R: BufRead + Send + 'static> LineLandmarkSource<R> {
    pub fn new(reader: R) -> Self {
        LineLandmarkSource { reader }
    }
}

impl<R: BufRead + Send + 'static> LandmarkSource for LineLandmarkSource<R> {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        let clock = Instant::now();
        for (n, line) in self.reader.lines().enumerate() {
            let line = match line {
                Ok(l)  => l,
                Err(e) => { warn!("{}", SourceError::Receive(e.to_string())); return; }
            };
            if line.trim().is_empty() { continue; }

            let frame = match TrackerPacket::parse(line.as_bytes()) {
                Ok(p)  => p.into_frame(clock.elapsed().as_secs_f64()),
                Err(e) => { warn!("line {}: {}", n + 1, e); continue; }
            };
            if tx.send(frame).is_err() { return; }
        }
        debug!("Landmark input exhausted");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource — mouse/keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Largest pinch the simulator produces.
pub const SIM_MAX_DISTANCE: f32 = 0.30;

/// Raw input event from the meter window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    /// Set the thumb–index distance directly (mouse drag).
    SetDistance(f32),
    /// Open (+) or close (−) the pinch by a step (arrow keys).
    Nudge(f32),
    /// Show or hide the simulated hand.
    ToggleHand,
    /// One video frame elapsed; emit a [`HandFrame`].
    Tick(f64),
}

/// Gesture source driven by [`SimInput`] events from the meter window.
///
/// Frames are only emitted on `Tick`, so the window's refresh rate plays the
/// part of the camera frame rate.
pub struct SimLandmarkSource {
    pub rx: Receiver<SimInput>,
}

/// Simulated hand state.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SimHand {
    distance: f32,
    present:  bool,
}

impl SimHand {
    fn apply(&mut self, input: &SimInput) {
        match *input {
            SimInput::SetDistance(d) => self.distance = d.clamp(0.0, SIM_MAX_DISTANCE),
            SimInput::Nudge(step)    => {
                self.distance = (self.distance + step).clamp(0.0, SIM_MAX_DISTANCE)
            }
            SimInput::ToggleHand     => self.present = !self.present,
            SimInput::Tick(_)        => {}
        }
    }

    /// A flat hand at mid-frame with the index tip `distance` to the right
    /// of the thumb tip.
    fn frame(&self, at: f64) -> HandFrame {
        if !self.present {
            return HandFrame::empty(at);
        }
        let mut points = [Landmark::new(0.5, 0.6, 0.0); HAND_LANDMARK_COUNT];
        points[THUMB_TIP] = Landmark::new(0.4, 0.5, 0.0);
        points[INDEX_TIP] = Landmark::new(0.4 + self.distance, 0.5, 0.0);
        HandFrame { at, hands: vec![HandLandmarks::new(points)] }
    }
}

impl Default for SimHand {
    fn default() -> Self {
        SimHand { distance: 0.11, present: true }
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        let mut hand = SimHand::default();
        for input in self.rx {
            hand.apply(&input);
            if let SimInput::Tick(at) = input {
                if tx.send(hand.frame(at)).is_err() { return; }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// Leap reports millimetres; points are scaled to metres so the default
/// distance window (0.02–0.20) is a sensible pinch range.  Only the thumb
/// and index tips are real; the other landmarks sit on the palm centre.
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource;

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        use leaprs::*;

        const MM_TO_M: f32 = 0.001;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => { warn!("{}", SourceError::Unavailable(format!("LeapC: {:?}", e))); return; }
        };
        if let Err(e) = connection.open() {
            warn!("{}", SourceError::Unavailable(format!("LeapMotion device: {:?}", e)));
            return;
        }

        let clock = Instant::now();
        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let at = clock.elapsed().as_secs_f64();
                let hands: Vec<_> = frame.hands().collect();

                let hand = hands.first().and_then(|h| {
                    let fingers: Vec<_> = h.digits().collect();
                    if fingers.len() < 2 { return None; }
                    let scale = |x: f32, y: f32, z: f32| {
                        Landmark::new(x * MM_TO_M, y * MM_TO_M, z * MM_TO_M)
                    };
                    let palm  = h.palm().position();
                    let thumb = fingers[0].distal().next_joint();
                    let index = fingers[1].distal().next_joint();
                    let mut points = [scale(palm.x, palm.y, palm.z); HAND_LANDMARK_COUNT];
                    points[THUMB_TIP] = scale(thumb.x, thumb.y, thumb.z);
                    points[INDEX_TIP] = scale(index.x, index.y, index.z);
                    Some(HandLandmarks::new(points))
                });

                let frame = HandFrame { at, hands: hand.into_iter().collect() };
                if tx.send(frame).is_err() { return; }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
