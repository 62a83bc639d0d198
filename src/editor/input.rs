//! Keyboard shortcuts.

use std::str::FromStr;

use crate::error::AnimateError;

/// A key with its modifier state. `primary` is Ctrl, or Cmd on macOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: char,
    pub primary: bool,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: char) -> Self {
        Self {
            key,
            primary: false,
            shift: false,
        }
    }

    pub fn primary(key: char) -> Self {
        Self {
            primary: true,
            ..Self::new(key)
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// Parses chords like `ctrl+z`, `cmd+shift+z` or `Ctrl+Y`.
impl FromStr for KeyPress {
    type Err = AnimateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AnimateError::InvalidState {
            reason: format!("invalid key chord '{}'", s),
        };

        let mut primary = false;
        let mut shift = false;
        let mut key = None;
        for part in s.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "cmd" | "meta" | "primary" => primary = true,
                "shift" => shift = true,
                other => {
                    let mut chars = other.chars();
                    match (chars.next(), chars.next(), key) {
                        (Some(c), None, None) => key = Some(c),
                        _ => return Err(invalid()),
                    }
                }
            }
        }

        Ok(Self {
            key: key.ok_or_else(invalid)?,
            primary,
            shift,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
}

impl Shortcut {
    /// primary+Z undoes; primary+Shift+Z and primary+Y redo.
    pub fn from_key(press: &KeyPress) -> Option<Self> {
        if !press.primary {
            return None;
        }
        match (press.key.to_ascii_lowercase(), press.shift) {
            ('z', false) => Some(Shortcut::Undo),
            ('z', true) | ('y', _) => Some(Shortcut::Redo),
            _ => None,
        }
    }
}
