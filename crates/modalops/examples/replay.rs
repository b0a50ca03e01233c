//! Replay a sequence of keys against a line of text, and print what happened.
//!
//! ```text
//! RUST_LOG=modalops=debug cargo run --example replay -- "2dw" "alpha beta gamma delta"
//! ```
use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

use tracing_subscriber::EnvFilter;

use modalops::command::builtin::{digit_argument_name, make_mode_switch, STAY};
use modalops::command::{make_motion, make_operator};
use modalops::dispatch::{Dispatched, Dispatcher};
use modalops::errors::{DispatchError, HostError};
use modalops::host::Host;
use modalops::key::KeyChord;
use modalops::keybindings::{InputKey, StateClass, StatePredicate};
use modalops::mode::{CursorStyle, ModeId, ModeRegistry, ModeSpec};

type Text = Rc<RefCell<Vec<char>>>;

struct Line {
    text: Text,
    cursor: usize,
    anchor: Option<usize>,
}

impl Host for Line {
    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.text.borrow().len());
    }

    fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    fn set_anchor(&mut self, pos: usize) {
        self.anchor = Some(pos);
    }

    fn selection_active(&self) -> bool {
        false
    }

    fn invoke(&mut self, cmd: &str) -> Result<(), HostError> {
        let mut args = cmd.split_whitespace().skip(1).map(str::parse::<usize>);

        match (args.next(), args.next()) {
            (Some(Ok(start)), Some(Ok(end))) => {
                let mut text = self.text.borrow_mut();
                let end = end.min(text.len());
                let start = start.min(end);

                text.drain(start..end);
                self.cursor = start;

                Ok(())
            },
            _ => Err(HostError::UnknownCommand(cmd.to_string())),
        }
    }

    fn notify(&mut self, err: &DispatchError) {
        eprintln!("! {err}");
    }

    fn set_cursor_style(&mut self, style: CursorStyle) {
        println!("  cursor: {style:?}");
    }

    fn start(&mut self, _: &ModeRegistry) -> Option<ModeId> {
        Some(ModeId::from("normal"))
    }
}

fn forward_word(text: &[char], mut pos: usize) -> usize {
    while pos < text.len() && !text[pos].is_whitespace() {
        pos += 1;
    }

    while pos < text.len() && text[pos].is_whitespace() {
        pos += 1;
    }

    return pos;
}

fn setup(text: &Text) -> Result<Dispatcher, Box<dyn std::error::Error>> {
    let mut dispatcher = Dispatcher::default();
    let motion = StatePredicate::Class(StateClass::Motion);

    dispatcher.define_mode(ModeSpec::new("normal", "N").cursor(CursorStyle::Block))?;
    dispatcher.define_mode(ModeSpec::new("insert", "I").cursor(CursorStyle::Bar))?;
    dispatcher.install_core_commands();

    dispatcher.register(make_operator("kill", |inv, span| {
        if span.is_empty() {
            return inv.host_command(&format!("kill 0 {}", usize::MAX));
        }

        inv.host_command(&format!("kill {} {}", span.start, span.end))
    }));
    dispatcher.register(make_motion("forward-char", |inv| {
        let steps = inv.steps();
        let cursor = inv.host().cursor();

        inv.host().set_cursor(steps.offset(cursor));

        Ok(())
    }));

    let words = text.clone();
    dispatcher.register(make_motion("forward-word", move |inv| {
        let steps = inv.steps();
        let mut cursor = inv.host().cursor();

        for _ in 0..steps.magnitude {
            cursor = forward_word(&words.borrow(), cursor);
        }

        inv.host().set_cursor(cursor);

        Ok(())
    }));
    dispatcher.register(make_mode_switch("insert-mode", "insert"));
    dispatcher.register(make_mode_switch("normal-mode", "normal"));

    dispatcher.bind("normal", "d", "kill", StatePredicate::Class(StateClass::Operator))?;
    dispatcher.bind("normal", "d", STAY, StatePredicate::Class(StateClass::DefaultMotion))?;
    dispatcher.bind("normal", "l", "forward-char", motion.clone())?;
    dispatcher.bind("normal", "w", "forward-word", motion)?;
    dispatcher.bind("normal", "i", "insert-mode", StatePredicate::Class(StateClass::Action))?;
    dispatcher.bind("normal", "<Esc>", "keyboard-quit", StatePredicate::Always)?;
    dispatcher.bind("insert", "<Esc>", "normal-mode", StatePredicate::Always)?;

    for d in 0..=9 {
        dispatcher.bind("normal", &d.to_string(), &digit_argument_name(d), StatePredicate::Always)?;
    }

    return Ok(dispatcher);
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut args = std::env::args().skip(1);
    let keys = args.next().unwrap_or_else(|| "2dw".into());
    let text = args.next().unwrap_or_else(|| "hello world".into());

    let text: Text = Rc::new(RefCell::new(text.chars().collect()));
    let dispatcher = match setup(&text) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("failed to set up keymap: {e}");
            return ExitCode::FAILURE;
        },
    };

    let keys = match KeyChord::from_macro_str(&keys) {
        Ok(keys) => keys,
        Err(e) => {
            eprintln!("bad keys: {e}");
            return ExitCode::FAILURE;
        },
    };

    let mut host = Line { text, cursor: 0, anchor: None };
    let mut state = match dispatcher.enable(&mut host) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        },
    };

    for key in keys {
        let res = dispatcher.dispatch(&mut state, &mut host, &key);
        let line: String = host.text.borrow().iter().collect();

        match res {
            Ok(Dispatched::Completed(name)) => println!("{key}: ran {name}"),
            Ok(Dispatched::Pending(name)) => println!("{key}: {name} is pending"),
            Ok(Dispatched::Prefix(name)) => println!("{key}: {name}"),
            Err(_) => println!("{key}: failed"),
        }

        println!("  {line:?} (cursor at {})", host.cursor);
    }

    dispatcher.disable(state, &mut host);

    return ExitCode::SUCCESS;
}
