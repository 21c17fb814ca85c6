//! Transport controls and their keyboard bindings.

use serde::{Deserialize, Serialize};

/// A playback control, however it was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Next,
    Previous,
    #[serde(alias = "toggle")]
    TogglePlayPause,
    Reset,
}

/// Keys bound to playback controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Space,
    R,
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` value. Unbound keys give `None`.
    pub fn from_dom(name: &str) -> Option<Key> {
        match name {
            "ArrowLeft" => Some(Key::ArrowLeft),
            "ArrowRight" => Some(Key::ArrowRight),
            " " | "Space" => Some(Key::Space),
            "r" => Some(Key::R),
            _ => None,
        }
    }

    pub fn control(self) -> Control {
        match self {
            Key::ArrowLeft => Control::Previous,
            Key::ArrowRight => Control::Next,
            Key::Space => Control::TogglePlayPause,
            Key::R => Control::Reset,
        }
    }
}
