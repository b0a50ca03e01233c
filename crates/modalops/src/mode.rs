//! # Modes
//!
//! ## Overview
//!
//! A mode is an exclusive editing context with its own table of keybindings. Modes get
//! registered once, when the bindings are set up, in a [ModeRegistry]. Afterwards they can be
//! looked up either by their identifier or by their alias.
use std::collections::HashMap;
use std::fmt;

use crate::errors::ModeError;

/// Identifies a registered mode.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ModeId(String);

impl ModeId {
    /// The identifier as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModeId {
    fn from(s: &str) -> Self {
        ModeId(s.to_string())
    }
}

impl From<String> for ModeId {
    fn from(s: String) -> Self {
        ModeId(s)
    }
}

impl PartialEq<str> for ModeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ModeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// How the host should draw the cursor.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CursorStyle {
    /// Whatever the host normally uses.
    #[default]
    Default,

    /// A filled block.
    Block,

    /// An unfilled block.
    HollowBlock,

    /// A vertical bar.
    Bar,

    /// An underline.
    Underline,
}

/// The description of a mode.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModeSpec {
    id: ModeId,
    alias: String,
    cursor: CursorStyle,
    transient: bool,
}

impl ModeSpec {
    /// Describe a new mode.
    pub fn new<I: Into<ModeId>, A: Into<String>>(id: I, alias: A) -> Self {
        ModeSpec {
            id: id.into(),
            alias: alias.into(),
            cursor: CursorStyle::Default,
            transient: false,
        }
    }

    /// Set the cursor style to show while this mode is active.
    pub fn cursor(mut self, cursor: CursorStyle) -> Self {
        self.cursor = cursor;
        self
    }

    /// Set whether this mode can be entered transiently.
    pub fn transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }

    /// The identifier of this mode.
    pub fn id(&self) -> &ModeId {
        &self.id
    }

    /// The alias of this mode.
    pub fn alias(&self) -> &str {
        self.alias.as_str()
    }

    /// The cursor style to show while this mode is active.
    pub fn get_cursor(&self) -> CursorStyle {
        self.cursor
    }

    /// Whether this mode can be entered transiently.
    pub fn is_transient(&self) -> bool {
        self.transient
    }
}

/// The table of known modes.
#[derive(Clone, Debug, Default)]
pub struct ModeRegistry {
    modes: Vec<ModeSpec>,
    names: HashMap<String, usize>,
}

impl ModeRegistry {
    /// Register a new mode.
    ///
    /// Identifiers and aliases share a namespace, and must be unique across every mode.
    pub fn define(&mut self, spec: ModeSpec) -> Result<ModeId, ModeError> {
        let id = spec.id.as_str();

        if id.is_empty() || self.names.contains_key(id) {
            return Err(ModeError::DuplicateMode(id.to_string()));
        }

        let alias = spec.alias.as_str();

        if !alias.is_empty() && (alias == id || self.names.contains_key(alias)) {
            return Err(ModeError::DuplicateAlias(alias.to_string()));
        }

        let idx = self.modes.len();

        self.names.insert(id.to_string(), idx);

        if !alias.is_empty() {
            self.names.insert(alias.to_string(), idx);
        }

        let id = spec.id.clone();
        self.modes.push(spec);

        return Ok(id);
    }

    /// Look up a mode by its identifier or alias.
    pub fn get(&self, name: &str) -> Option<&ModeSpec> {
        self.names.get(name).map(|idx| &self.modes[*idx])
    }

    /// Look up the identifier of a mode by its identifier or alias.
    pub fn resolve(&self, name: &str) -> Result<ModeId, ModeError> {
        match self.get(name) {
            Some(spec) => Ok(spec.id.clone()),
            None => Err(ModeError::UnknownMode(name.to_string())),
        }
    }

    /// Whether a mode with this identifier or alias exists.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Iterate over the registered modes, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModeSpec> {
        self.modes.iter()
    }

    /// The number of registered modes.
    pub fn len(&self) -> usize {
        self.modes.len()
    }
}
