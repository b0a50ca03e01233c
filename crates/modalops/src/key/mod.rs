//! # Key chords
//!
//! ## Overview
//!
//! This module contains [KeyChord], the key type that bindings are registered under and that
//! gets dispatched.
//!
//! Chords can be written in the same notation Vim uses for mappings:
//!
//! ```
//! use modalops::key::KeyChord;
//! use modalops::keybindings::InputKey;
//!
//! let keys = KeyChord::from_macro_str("d<C-w><Esc>").unwrap();
//! assert_eq!(keys.len(), 3);
//! assert_eq!(keys[1].to_string(), "<C-W>");
//! ```
use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use self::parse::{parse_key_str, parse_macro_str};
use crate::keybindings::InputKey;

mod parse;

/// Errors that occur while parsing key strings.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum KeyError {
    /// Failure to interpret a key string.
    #[error("Invalid key string: {0:?}")]
    InvalidKey(String),

    /// Empty key string.
    #[error("Empty key string")]
    EmptyKey,
}

/// A single chord: a key, plus the modifiers held down while pressing it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct KeyChord {
    code: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyChord {
    /// Create a new chord.
    pub fn new(code: KeyCode, mut modifiers: KeyModifiers) -> Self {
        if let KeyCode::Char(_) = code {
            // SHIFT is already reflected in the character itself, and terminals disagree on
            // whether to report it, so drop it to keep hashing and comparisons stable.
            modifiers -= KeyModifiers::SHIFT;
        }

        Self { code, modifiers }
    }

    /// The key that was pressed.
    pub fn code(&self) -> KeyCode {
        self.code
    }

    /// The modifiers held down while pressing the key.
    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }

}

impl FromStr for KeyChord {
    type Err = KeyError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(KeyError::EmptyKey);
        } else if let Ok((_, key)) = parse_key_str(input) {
            return Ok(key);
        } else {
            return Err(KeyError::InvalidKey(input.to_string()));
        }
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mods = String::new();

        if self.modifiers.contains(KeyModifiers::CONTROL) {
            mods.push_str("C-");
        }

        if self.modifiers.contains(KeyModifiers::SHIFT) {
            mods.push_str("S-");
        }

        if self.modifiers.contains(KeyModifiers::ALT) {
            mods.push_str("A-");
        }

        let name = match self.code {
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::Up => "Up".to_string(),
            KeyCode::Down => "Down".to_string(),
            KeyCode::Backspace => "BS".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            KeyCode::Null => "Nul".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Delete => "Del".to_string(),
            KeyCode::Insert => "Insert".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::BackTab => return write!(f, "<S-Tab>"),
            KeyCode::F(n) => n.to_string(),
            KeyCode::Char(' ') if !mods.is_empty() => "Space".to_string(),
            KeyCode::Char('<') => "lt".to_string(),
            KeyCode::Char(c) if mods.is_empty() => return write!(f, "{c}"),
            KeyCode::Char(c) if self.modifiers.contains(KeyModifiers::CONTROL) => {
                c.to_uppercase().to_string()
            },
            KeyCode::Char(c) => c.to_string(),
            _ => return write!(f, "<{mods}{:?}>", self.code),
        };

        if let KeyCode::F(_) = self.code {
            return write!(f, "<{mods}F{name}>");
        }

        write!(f, "<{mods}{name}>")
    }
}

impl InputKey for KeyChord {
    type Error = KeyError;

    fn from_macro_str(input: &str) -> Result<Vec<Self>, KeyError> {
        if input.is_empty() {
            return Err(KeyError::EmptyKey);
        } else if let Ok((_, keys)) = parse_macro_str(input) {
            return Ok(keys);
        } else {
            return Err(KeyError::InvalidKey(input.to_string()));
        }
    }

    fn get_char(&self) -> Option<char> {
        if let KeyCode::Char(c) = self.code {
            if self.modifiers.is_empty() {
                return Some(c);
            }
        }

        None
    }
}

impl From<char> for KeyChord {
    fn from(c: char) -> Self {
        KeyChord::new(KeyCode::Char(c), KeyModifiers::NONE)
    }
}

impl From<KeyCode> for KeyChord {
    fn from(code: KeyCode) -> Self {
        KeyChord::new(code, KeyModifiers::NONE)
    }
}

impl From<KeyEvent> for KeyChord {
    fn from(ke: KeyEvent) -> Self {
        KeyChord::new(ke.code, ke.modifiers)
    }
}
