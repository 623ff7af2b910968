//! Software-rendered meter using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  [distance ▓▓▓▓▓▓▓▓|░░░░░░░░░░░|░░░░░]       │  markers at min / max
//! │                                              │
//! │  [CC value ▓▓▓▓▓▓▓▓▓▓▓▓▓░░░░░░░░░░░░░]       │
//! │                                              │
//! │  (hand) (link)                               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Text lives in the window title: mapping, current value, and status.
//!
//! | Key                | Action                          |
//! |--------------------|---------------------------------|
//! | `[` / `]`          | min distance −/+                |
//! | `-` / `=`          | max distance −/+                |
//! | `,` / `.`          | CC number −/+                   |
//! | PageDown / PageUp  | MIDI channel −/+                |
//! | R                  | rescan devices                  |
//! | C / X              | connect / disconnect            |
//! | Q / Esc            | quit                            |
//! | mouse drag on bar  | set distance (sim source)       |
//! | Up / Down          | open / close pinch (sim source) |
//! | Space              | show / hide hand (sim source)   |

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use gesture_cc::{Display, MappingConfig, CC_MAX};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::error::PinchError;
use crate::session::ConfigEdit;
use crate::source::SimInput;
use crate::transport::TransportState;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:     usize = 520;
pub const WIN_H:     usize = 210;
const MARGIN:        usize = 20;
const BAR_W:         usize = WIN_W - 2 * MARGIN;
const BAR_H:         usize = 40;
const DIST_BAR_Y:    usize = 30;
const CC_BAR_Y:      usize = 100;
const LAMP_Y:        usize = 165;
const LAMP_SIZE:     usize = 24;
const BG_COLOR:      u32   = 0xFF1A1A2E;
const TROUGH_COLOR:  u32   = 0xFF0F3460;
const DIST_COLOR:    u32   = 0xFF4FC3F7;
const CC_COLOR:      u32   = 0xFFFFD700;  // gold
const MARKER_COLOR:  u32   = 0xFFEEEEEE;
const LAMP_OFF:      u32   = 0xFF444444;
const LAMP_GREEN:    u32   = 0xFF3DDC84;
const LAMP_AMBER:    u32   = 0xFFFFB300;

/// Step sizes for the distance keys.
const DISTANCE_STEP: f32 = 0.005;
/// Step for Up/Down in the simulator.
const NUDGE_STEP:    f32 = 0.004;

// ════════════════════════════════════════════════════════════════════════════
// MeterCommand
// ════════════════════════════════════════════════════════════════════════════

/// What the user asked for this frame.
#[derive(Clone, Debug, PartialEq)]
pub enum MeterCommand {
    Edit(ConfigEdit),
    Rescan,
    Connect,
    Disconnect,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// Meter
// ════════════════════════════════════════════════════════════════════════════

pub struct Meter {
    window: Window,
    buf:    Vec<u32>,
    /// Present when the sim source is running.
    sim_tx: Option<Sender<SimInput>>,
    clock:  Instant,
    title:  String,
}

impl Meter {
    pub fn new(sim_tx: Option<Sender<SimInput>>) -> Result<Self, PinchError> {
        let mut window = Window::new(
            "pinch_midi",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| PinchError::Window(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Meter {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            clock: Instant::now(),
            title: String::new(),
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard and mouse.  Sim input goes straight to the sim source;
    /// everything else is returned for the caller to apply.
    pub fn poll_input(&mut self, config: &MappingConfig) -> Vec<MeterCommand> {
        let mut commands = Vec::new();
        if !self.window.is_open() {
            commands.push(MeterCommand::Quit);
            return commands;
        }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            commands.push(MeterCommand::Quit);
        }
        if one_shot(Key::R) { commands.push(MeterCommand::Rescan); }
        if one_shot(Key::C) { commands.push(MeterCommand::Connect); }
        if one_shot(Key::X) { commands.push(MeterCommand::Disconnect); }

        for key in EDIT_KEYS {
            if held(key) {
                if let Some(edit) = edit_for_key(config, key) {
                    commands.push(MeterCommand::Edit(edit));
                }
            }
        }

        if let Some(tx) = &self.sim_tx {
            let mut inputs = Vec::new();
            if one_shot(Key::Space) { inputs.push(SimInput::ToggleHand); }
            if held(Key::Up)        { inputs.push(SimInput::Nudge(NUDGE_STEP)); }
            if held(Key::Down)      { inputs.push(SimInput::Nudge(-NUDGE_STEP)); }

            if self.window.get_mouse_down(MouseButton::Left) {
                if let Some((x, y)) = self.window.get_mouse_pos(MouseMode::Discard) {
                    let on_bar = (y as usize) >= DIST_BAR_Y && (y as usize) < DIST_BAR_Y + BAR_H;
                    if on_bar {
                        inputs.push(SimInput::SetDistance(distance_at(x, config)));
                    }
                }
            }

            inputs.push(SimInput::Tick(self.clock.elapsed().as_secs_f64()));
            for input in inputs {
                let _ = tx.send(input);
            }
        }

        commands
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        display: &Display,
        config:  &MappingConfig,
        status:  &str,
        link:    TransportState,
    ) {
        self.buf.fill(BG_COLOR);

        // ── Distance bar with the mapping window marked ──────────────────
        let scale = distance_scale(config);
        self.fill_rect(MARGIN, DIST_BAR_Y, BAR_W, BAR_H, TROUGH_COLOR);
        if display.hand_present {
            let w = bar_width(display.distance / scale, BAR_W);
            self.fill_rect(MARGIN, DIST_BAR_Y, w, BAR_H, DIST_COLOR);
        }
        for edge in [config.min_distance(), config.max_distance()] {
            let x = MARGIN + bar_width(edge / scale, BAR_W);
            self.fill_rect(x.saturating_sub(1), DIST_BAR_Y - 6, 2, BAR_H + 12, MARKER_COLOR);
        }

        // ── CC bar ────────────────────────────────────────────────────────
        self.fill_rect(MARGIN, CC_BAR_Y, BAR_W, BAR_H, TROUGH_COLOR);
        if let Some(v) = display.value {
            let w = bar_width(f32::from(v) / f32::from(CC_MAX), BAR_W);
            self.fill_rect(MARGIN, CC_BAR_Y, w, BAR_H, CC_COLOR);
        }

        // ── Lamps ─────────────────────────────────────────────────────────
        self.fill_rect(MARGIN, LAMP_Y, LAMP_SIZE, LAMP_SIZE, hand_lamp(display.hand_present));
        self.fill_rect(MARGIN + 2 * LAMP_SIZE, LAMP_Y, LAMP_SIZE, LAMP_SIZE, link_lamp(link));

        // ── Title ─────────────────────────────────────────────────────────
        let title = title_text(display, config, status);
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            let start = row * WIN_W + x.min(WIN_W);
            let end   = row * WIN_W + (x + w).min(WIN_W);
            self.buf[start..end].fill(color);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pure helpers
// ════════════════════════════════════════════════════════════════════════════

const EDIT_KEYS: [Key; 8] = [
    Key::LeftBracket, Key::RightBracket,
    Key::Minus,       Key::Equal,
    Key::Comma,       Key::Period,
    Key::PageDown,    Key::PageUp,
];

/// The edit a key asks for, relative to the current config.
///
/// Steps past the valid range are still returned so the session can reject
/// them with a status message.
fn edit_for_key(config: &MappingConfig, key: Key) -> Option<ConfigEdit> {
    let min = config.min_distance();
    let max = config.max_distance();
    let edit = match key {
        Key::LeftBracket  => ConfigEdit::MinDistance((min - DISTANCE_STEP).max(0.0)),
        Key::RightBracket => ConfigEdit::MinDistance(min + DISTANCE_STEP),
        Key::Minus        => ConfigEdit::MaxDistance(max - DISTANCE_STEP),
        Key::Equal        => ConfigEdit::MaxDistance(max + DISTANCE_STEP),
        Key::Comma        => ConfigEdit::CcNumber(config.cc_number().saturating_sub(1)),
        Key::Period       => ConfigEdit::CcNumber(config.cc_number().saturating_add(1)),
        Key::PageDown     => ConfigEdit::Channel(config.channel().saturating_sub(1)),
        Key::PageUp       => ConfigEdit::Channel(config.channel().saturating_add(1)),
        _ => return None,
    };
    Some(edit)
}

/// Full-scale distance of the bar: half again past the window's top.
fn distance_scale(config: &MappingConfig) -> f32 {
    config.max_distance() * 1.5
}

/// Distance under a mouse x coordinate on the distance bar.
fn distance_at(x: f32, config: &MappingConfig) -> f32 {
    let frac = ((x - MARGIN as f32) / BAR_W as f32).clamp(0.0, 1.0);
    frac * distance_scale(config)
}

/// Pixels filled for `fraction` of a bar `width` wide.
fn bar_width(fraction: f32, width: usize) -> usize {
    if !fraction.is_finite() { return 0; }
    (fraction.clamp(0.0, 1.0) * width as f32).round() as usize
}

fn hand_lamp(present: bool) -> u32 {
    if present { LAMP_GREEN } else { LAMP_OFF }
}

fn link_lamp(state: TransportState) -> u32 {
    match state {
        TransportState::Connected    => LAMP_GREEN,
        TransportState::DeviceListed => LAMP_AMBER,
        TransportState::Unbound
        | TransportState::Scanning   => LAMP_OFF,
    }
}

fn title_text(display: &Display, config: &MappingConfig, status: &str) -> String {
    let value = match display.value {
        Some(v) => v.to_string(),
        None    => "--".to_string(),
    };
    format!(
        "pinch_midi  ch {} CC {} = {}  |  {}",
        config.channel(), config.cc_number(), value, status
    )
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_width_clamps() {
        assert_eq!(bar_width(0.0, 100), 0);
        assert_eq!(bar_width(0.5, 100), 50);
        assert_eq!(bar_width(2.0, 100), 100);
        assert_eq!(bar_width(-1.0, 100), 0);
        assert_eq!(bar_width(f32::NAN, 100), 0);
    }

    #[test]
    fn mouse_maps_across_bar() {
        let cfg = MappingConfig::default();
        assert_eq!(distance_at(0.0, &cfg), 0.0);
        let right = distance_at((MARGIN + BAR_W) as f32, &cfg);
        assert!((right - distance_scale(&cfg)).abs() < 1e-6);
        assert_eq!(distance_at(10_000.0, &cfg), right);
    }

    #[test]
    fn edit_keys_step_from_current_config() {
        let cfg = MappingConfig::default();
        assert_eq!(edit_for_key(&cfg, Key::Period), Some(ConfigEdit::CcNumber(75)));
        assert_eq!(edit_for_key(&cfg, Key::PageUp), Some(ConfigEdit::Channel(2)));
        assert_eq!(edit_for_key(&cfg, Key::PageDown), Some(ConfigEdit::Channel(0)));
        match edit_for_key(&cfg, Key::RightBracket) {
            Some(ConfigEdit::MinDistance(d)) => assert!((d - 0.025).abs() < 1e-6),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(edit_for_key(&cfg, Key::A), None);
    }

    #[test]
    fn min_never_steps_below_zero() {
        let cfg = MappingConfig::new(1, 74, 0.0, 0.2).unwrap();
        assert_eq!(edit_for_key(&cfg, Key::LeftBracket), Some(ConfigEdit::MinDistance(0.0)));
    }

    #[test]
    fn lamps() {
        assert_eq!(hand_lamp(true), LAMP_GREEN);
        assert_eq!(hand_lamp(false), LAMP_OFF);
        assert_eq!(link_lamp(TransportState::Connected), LAMP_GREEN);
        assert_eq!(link_lamp(TransportState::DeviceListed), LAMP_AMBER);
        assert_eq!(link_lamp(TransportState::Unbound), LAMP_OFF);
    }

    #[test]
    fn title_shows_value_or_dashes() {
        let cfg = MappingConfig::default();
        let mut d = Display::default();
        assert_eq!(title_text(&d, &cfg, "idle"), "pinch_midi  ch 1 CC 74 = --  |  idle");
        d.value = Some(64);
        assert!(title_text(&d, &cfg, "ok").contains("CC 74 = 64"));
    }
}
