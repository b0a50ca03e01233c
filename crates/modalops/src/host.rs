//! # Host interface
//!
//! ## Overview
//!
//! The dispatcher doesn't own any text. Everything it needs from the editing shell that embeds
//! it (cursor and anchor positions, selection state, named contexts, running host commands,
//! prompting for a character) is requested through the [Host] trait.
//!
//! Positions are opaque `usize` offsets; the host decides whether they count bytes, characters
//! or grapheme clusters.
use std::ops::Range;

use crate::errors::{DispatchError, HostError};
use crate::mode::{CursorStyle, ModeId, ModeRegistry};

/// A half-open range of positions that an operator acts on.
pub type Span = Range<usize>;

/// Build the [Span] covering two positions, in whichever order they were given.
///
/// ```
/// use modalops::host::span;
///
/// assert_eq!(span(3, 8), 3..8);
/// assert_eq!(span(8, 3), 3..8);
/// assert!(span(5, 5).is_empty());
/// ```
pub fn span(a: usize, b: usize) -> Span {
    if a <= b {
        a..b
    } else {
        b..a
    }
}

/// The editing shell that a [Dispatcher](crate::dispatch::Dispatcher) drives.
pub trait Host {
    /// The current cursor position.
    fn cursor(&self) -> usize;

    /// Move the cursor.
    fn set_cursor(&mut self, pos: usize);

    /// The selection anchor, if one has been placed.
    fn anchor(&self) -> Option<usize>;

    /// Place the selection anchor.
    fn set_anchor(&mut self, pos: usize);

    /// Whether a selection is currently active.
    fn selection_active(&self) -> bool;

    /// Whether a selection is active and covers at least one position.
    fn selection_nonempty(&self) -> bool {
        self.selection_active() && self.anchor().is_some_and(|a| a != self.cursor())
    }

    /// Stop showing the current selection.
    fn deactivate_selection(&mut self) {}

    /// Whether the named context holds for the document, such as its major mode.
    fn in_context(&self, _: &str) -> bool {
        false
    }

    /// Synchronously run a command that the host knows by name.
    fn invoke(&mut self, name: &str) -> Result<(), HostError> {
        Err(HostError::UnknownCommand(name.to_string()))
    }

    /// Block until the user types a character. Returns [None] if the prompt was cancelled.
    fn read_char(&mut self, _: &str) -> Option<char> {
        None
    }

    /// Tell the user that something went wrong, usually by ringing the bell.
    fn notify(&mut self, _: &DispatchError) {}

    /// Change how the cursor gets drawn.
    fn set_cursor_style(&mut self, _: CursorStyle) {}

    /// Called once when modal editing is enabled for the document. This must return the mode to
    /// start in; if it returns [None], or a mode that isn't registered, modal editing stays off.
    fn start(&mut self, modes: &ModeRegistry) -> Option<ModeId>;
}
