//! Keyboard → engine events.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use drumpad::{ControlEvent, Voice};

/// Home row, left to right.
pub const PAD_KEYS: [char; Voice::COUNT] = ['a', 's', 'd', 'f', 'g', 'h', 'j', 'k', 'l', ';'];

/// Shifted home row (accent hits).
const ACCENT_KEYS: [char; Voice::COUNT] = ['A', 'S', 'D', 'F', 'G', 'H', 'J', 'K', 'L', ':'];

const BPM_STEP: f64 = 5.0;
const LEVEL_STEP: f32 = 0.05;
const LATENCY_STEP_MS: i32 = 5;

/// Everything a key can ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Engine(ControlEvent),
    /// Package the recording and write it to disk.
    Save,
    SelectVoice(isize),
    Quit,
}

/// Values the relative keys step from.
pub struct KeyContext {
    pub bpm: f64,
    pub master: f32,
    pub latency_ms: i32,
    pub selected: Voice,
    pub selected_level: f32,
    pub flavor: drumpad::KitFlavor,
}

pub fn map_key(key: KeyEvent, ctx: &KeyContext) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    let action = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Action::Quit,
        KeyCode::Char(c) if PAD_KEYS.contains(&c) => {
            let voice = pad_voice(&PAD_KEYS, c)?;
            Action::Engine(ControlEvent::TriggerStart {
                voice,
                pressure: None,
            })
        }
        KeyCode::Char(c) if ACCENT_KEYS.contains(&c) => {
            let voice = pad_voice(&ACCENT_KEYS, c)?;
            Action::Engine(ControlEvent::TriggerLongPress { voice })
        }
        KeyCode::Char(' ') => Action::Engine(ControlEvent::MetronomeToggle),
        KeyCode::Char('r') => Action::Engine(ControlEvent::RecordToggle),
        KeyCode::Char('w') => Action::Save,
        KeyCode::Char('x') => Action::Engine(ControlEvent::ClearRecording),
        KeyCode::Char('[') => Action::Engine(ControlEvent::TempoChange {
            bpm: ctx.bpm - BPM_STEP,
        }),
        KeyCode::Char(']') => Action::Engine(ControlEvent::TempoChange {
            bpm: ctx.bpm + BPM_STEP,
        }),
        KeyCode::Char('z') => Action::Engine(ControlEvent::KitChange {
            flavor: ctx.flavor.next(),
        }),
        KeyCode::Char(',') => Action::Engine(ControlEvent::MasterChange {
            level: ctx.master - LEVEL_STEP,
        }),
        KeyCode::Char('.') => Action::Engine(ControlEvent::MasterChange {
            level: ctx.master + LEVEL_STEP,
        }),
        KeyCode::Char('-') => Action::Engine(ControlEvent::LatencySave {
            ms: (ctx.latency_ms - LATENCY_STEP_MS).max(0),
        }),
        KeyCode::Char('=') => Action::Engine(ControlEvent::LatencySave {
            ms: ctx.latency_ms + LATENCY_STEP_MS,
        }),
        KeyCode::Left => Action::SelectVoice(-1),
        KeyCode::Right => Action::SelectVoice(1),
        KeyCode::Up => Action::Engine(ControlEvent::MixerChange {
            voice: ctx.selected,
            level: ctx.selected_level + LEVEL_STEP,
        }),
        KeyCode::Down => Action::Engine(ControlEvent::MixerChange {
            voice: ctx.selected,
            level: ctx.selected_level - LEVEL_STEP,
        }),
        _ => return None,
    };
    Some(action)
}

fn pad_voice(keys: &[char; Voice::COUNT], c: char) -> Option<Voice> {
    keys.iter().position(|&k| k == c).map(|i| Voice::ALL[i])
}
