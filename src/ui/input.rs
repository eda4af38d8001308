/// Input: terminal key events → player actions.
///
/// Each frame `InputState::drain_events()` collects the keys freshly
/// pressed since the last frame. `KeyBindings` maps those keys to
/// `Action`s using the `[controls]` table of `config.toml`.
///
/// A single key may be bound to several actions (Esc is both Pause and
/// Back by default); the current screen decides which one applies.

use std::collections::HashMap;
use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::warn;

use crate::config::ControlsConfig;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Reset,
    Pause,
    Confirm,
    Back,
}

// ── Key names ──

/// Parse a key name as written in `config.toml`.
///
/// Named keys are case-insensitive (`"Enter"`, `"esc"`, `"F5"`). A single
/// character names itself; letters match either case.
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let name = name.trim();
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c.to_ascii_lowercase()));
    }

    let lower = name.to_ascii_lowercase();
    let code = match lower.as_str() {
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "space" => KeyCode::Char(' '),
        "backspace" => KeyCode::Backspace,
        "tab" => KeyCode::Tab,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        _ => {
            let n: u8 = lower.strip_prefix('f')?.parse().ok()?;
            if !(1..=12).contains(&n) {
                return None;
            }
            KeyCode::F(n)
        }
    };
    Some(code)
}

/// Letters are bound lower-case; fold incoming keys the same way.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

// ── Bindings ──

#[derive(Clone, Debug, Default)]
pub struct KeyBindings {
    map: HashMap<KeyCode, Vec<Action>>,
}

impl KeyBindings {
    /// Build bindings from config. Unknown key names are logged and skipped.
    pub fn from_config(controls: &ControlsConfig) -> Self {
        let mut bindings = KeyBindings::default();
        let table: [(Action, &[String]); 8] = [
            (Action::Up, &controls.up),
            (Action::Down, &controls.down),
            (Action::Left, &controls.left),
            (Action::Right, &controls.right),
            (Action::Reset, &controls.reset),
            (Action::Pause, &controls.pause),
            (Action::Confirm, &controls.confirm),
            (Action::Back, &controls.back),
        ];
        for (action, names) in table {
            for name in names {
                match parse_key(name) {
                    Some(code) => bindings.bind(code, action),
                    None => warn!(key = %name, ?action, "unknown key name in [controls]"),
                }
            }
        }
        bindings
    }

    pub fn bind(&mut self, code: KeyCode, action: Action) {
        let actions = self.map.entry(normalize(code)).or_default();
        if !actions.contains(&action) {
            actions.push(action);
        }
    }

    /// Every action bound to `code`, in binding order.
    pub fn actions_for(&self, code: KeyCode) -> &[Action] {
        self.map.get(&normalize(code)).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ── Terminal input ──

pub struct InputState {
    /// Keys pressed during the most recent `drain_events()` call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key);
            }
        }
    }

    fn record(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        // Terminals with keyboard enhancement also report Repeat/Release;
        // one command per physical press.
        if key.kind == KeyEventKind::Press {
            self.fresh_presses.push(key.code);
        }
    }

    pub fn fresh_presses(&self) -> &[KeyCode] {
        &self.fresh_presses
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
