use std::collections::VecDeque;

use crate::errors::{DispatchError, HostError};
use crate::host::Host;
use crate::mode::{CursorStyle, ModeId, ModeRegistry};

macro_rules! key {
    ($k: expr) => {
        <$crate::key::KeyChord as std::str::FromStr>::from_str($k).unwrap()
    };
}

macro_rules! keys {
    ($k: expr) => {
        <$crate::key::KeyChord as $crate::keybindings::InputKey>::from_macro_str($k).unwrap()
    };
}

macro_rules! class {
    ($c: ident) => {
        modalops_bindings::StatePredicate::Class(modalops_bindings::StateClass::$c)
    };
}

/// A host over a plain string, which records everything it gets asked to do.
pub(crate) struct TestHost {
    pub text: String,
    pub cursor: usize,
    pub anchor: Option<usize>,
    pub selection: bool,
    pub contexts: Vec<String>,
    pub chars: VecDeque<char>,
    pub log: Vec<String>,
    pub notices: Vec<DispatchError>,
    pub styles: Vec<CursorStyle>,
    pub start_mode: Option<ModeId>,
}

impl TestHost {
    pub fn new(text: &str) -> Self {
        TestHost {
            text: text.to_string(),
            cursor: 0,
            anchor: None,
            selection: false,
            contexts: vec![],
            chars: VecDeque::new(),
            log: vec![],
            notices: vec![],
            styles: vec![],
            start_mode: Some(ModeId::from("normal")),
        }
    }

    pub fn style(&self) -> Option<CursorStyle> {
        self.styles.last().copied()
    }
}

impl Host for TestHost {
    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.text.len());
    }

    fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    fn set_anchor(&mut self, pos: usize) {
        self.anchor = Some(pos.min(self.text.len()));
    }

    fn selection_active(&self) -> bool {
        self.selection
    }

    fn deactivate_selection(&mut self) {
        self.selection = false;
    }

    fn in_context(&self, name: &str) -> bool {
        self.contexts.iter().any(|c| c == name)
    }

    fn invoke(&mut self, name: &str) -> Result<(), HostError> {
        if name.starts_with("fail") {
            return Err(HostError::Failed(name.to_string()));
        }

        self.log.push(name.to_string());

        Ok(())
    }

    fn read_char(&mut self, _: &str) -> Option<char> {
        self.chars.pop_front()
    }

    fn notify(&mut self, err: &DispatchError) {
        self.notices.push(err.clone());
    }

    fn set_cursor_style(&mut self, style: CursorStyle) {
        self.styles.push(style);
    }

    fn start(&mut self, _: &ModeRegistry) -> Option<ModeId> {
        self.start_mode.clone()
    }
}
