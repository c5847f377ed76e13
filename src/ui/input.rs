use crate::error::ConfigError;
use crate::io::config::ControlsConfig;
use crate::pipeline::frame::DetailInput;
use minifb::{Key, KeyRepeat, Window};

/// Maps a key name from the config file to a `minifb` key.
/// Letters, digits and F1-F12 are accepted, case-insensitively.
pub fn parse_key(name: &str) -> Option<Key> {
    let key = match name.trim().to_ascii_uppercase().as_str() {
        "A" => Key::A,
        "B" => Key::B,
        "C" => Key::C,
        "D" => Key::D,
        "E" => Key::E,
        "F" => Key::F,
        "G" => Key::G,
        "H" => Key::H,
        "I" => Key::I,
        "J" => Key::J,
        "K" => Key::K,
        "L" => Key::L,
        "M" => Key::M,
        "N" => Key::N,
        "O" => Key::O,
        "P" => Key::P,
        "Q" => Key::Q,
        "R" => Key::R,
        "S" => Key::S,
        "T" => Key::T,
        "U" => Key::U,
        "V" => Key::V,
        "W" => Key::W,
        "X" => Key::X,
        "Y" => Key::Y,
        "Z" => Key::Z,
        "0" => Key::Key0,
        "1" => Key::Key1,
        "2" => Key::Key2,
        "3" => Key::Key3,
        "4" => Key::Key4,
        "5" => Key::Key5,
        "6" => Key::Key6,
        "7" => Key::Key7,
        "8" => Key::Key8,
        "9" => Key::Key9,
        "F1" => Key::F1,
        "F2" => Key::F2,
        "F3" => Key::F3,
        "F4" => Key::F4,
        "F5" => Key::F5,
        "F6" => Key::F6,
        "F7" => Key::F7,
        "F8" => Key::F8,
        "F9" => Key::F9,
        "F10" => Key::F10,
        "F11" => Key::F11,
        "F12" => Key::F12,
        "UP" => Key::Up,
        "DOWN" => Key::Down,
        "LEFT" => Key::Left,
        "RIGHT" => Key::Right,
        "SPACE" => Key::Space,
        _ => return None,
    };
    Some(key)
}

/// Resolved key bindings of the viewer window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub increase_detail: Key,
    pub decrease_detail: Key,
    pub screenshot: Key,
}

impl KeyBindings {
    pub fn from_config(controls: &ControlsConfig) -> Result<Self, ConfigError> {
        let resolve = |name: &str| {
            parse_key(name).ok_or_else(|| ConfigError::Invalid(format!("unknown key name '{name}'")))
        };
        Ok(Self {
            increase_detail: resolve(&controls.increase_detail)?,
            decrease_detail: resolve(&controls.decrease_detail)?,
            screenshot: resolve(&controls.screenshot)?,
        })
    }

    /// Held state of the detail keys right now.
    pub fn detail_input(&self, window: &Window) -> DetailInput {
        DetailInput {
            increase: window.is_key_down(self.increase_detail),
            decrease: window.is_key_down(self.decrease_detail),
        }
    }

    /// True once per press of the screenshot key.
    pub fn screenshot_requested(&self, window: &Window) -> bool {
        window.is_key_pressed(self.screenshot, KeyRepeat::No)
    }
}
