//! # Dispatching keys
//!
//! ## Overview
//!
//! The [Dispatcher] owns everything that's shared between documents: the registered modes, the
//! binding table, the named commands, the hooks, and the configuration. Each document brings its
//! own [InteractiveState] and [Host] to every call.
//!
//! Dispatching a key:
//!
//! 1. Looks up the bindings for the active mode and the key, and picks the first one whose
//!    context and state predicates both hold.
//! 2. Runs the chosen command through the wrapper for its
//!    [CommandKind](crate::command::CommandKind).
//! 3. Finalizes the state once the command (and any pending operator) fully resolves.
//!
//! When nothing matches, the host gets notified and the state is left untouched.
//!
//! ## Example
//!
//! ```
//! use modalops::command::{make_motion, make_operator};
//! use modalops::dispatch::{Dispatched, Dispatcher};
//! use modalops::host::Host;
//! use modalops::key::KeyChord;
//! use modalops::keybindings::{StateClass, StatePredicate};
//! use modalops::mode::{ModeId, ModeRegistry, ModeSpec};
//!
//! #[derive(Default)]
//! struct Line {
//!     cursor: usize,
//!     anchor: Option<usize>,
//!     killed: Vec<(usize, usize)>,
//! }
//!
//! impl Host for Line {
//!     fn cursor(&self) -> usize { self.cursor }
//!     fn set_cursor(&mut self, pos: usize) { self.cursor = pos; }
//!     fn anchor(&self) -> Option<usize> { self.anchor }
//!     fn set_anchor(&mut self, pos: usize) { self.anchor = Some(pos); }
//!     fn selection_active(&self) -> bool { false }
//!
//!     fn invoke(&mut self, name: &str) -> Result<(), modalops::errors::HostError> {
//!         let (start, end) = name.split_once(' ').unwrap().1.split_once("..").unwrap();
//!         self.killed.push((start.parse().unwrap(), end.parse().unwrap()));
//!         Ok(())
//!     }
//!
//!     fn start(&mut self, _: &ModeRegistry) -> Option<ModeId> {
//!         Some("normal".into())
//!     }
//! }
//!
//! let mut dispatcher = Dispatcher::default();
//! dispatcher.define_mode(ModeSpec::new("normal", "N")).unwrap();
//!
//! dispatcher.register(make_operator("kill", |inv, span| {
//!     inv.host_command(&format!("kill {}..{}", span.start, span.end))
//! }));
//! dispatcher.register(make_motion("forward-word", |inv| {
//!     let cursor = inv.host().cursor();
//!     inv.host().set_cursor(cursor + 5);
//!     Ok(())
//! }));
//!
//! let op = StatePredicate::Class(StateClass::Operator);
//! let mv = StatePredicate::Class(StateClass::Motion);
//! dispatcher.bind("normal", "d", "kill", op).unwrap();
//! dispatcher.bind("normal", "w", "forward-word", mv).unwrap();
//!
//! let mut host = Line::default();
//! let mut state = dispatcher.enable(&mut host).unwrap();
//!
//! let res = dispatcher.dispatch(&mut state, &mut host, &KeyChord::from('d'));
//! assert_eq!(res, Ok(Dispatched::Pending("kill".into())));
//! assert_eq!(state.pending_operator(), Some("kill"));
//!
//! let res = dispatcher.dispatch(&mut state, &mut host, &KeyChord::from('w'));
//! assert_eq!(res, Ok(Dispatched::Completed("forward-word".into())));
//! assert_eq!(host.killed, vec![(0, 5)]);
//! assert!(state.is_idle());
//! ```
use std::str::FromStr;

use tracing::debug;

use modalops_bindings::{Binding, BindingTable, Context, StatePredicate};

use crate::command::{
    builtin::core_commands,
    Body,
    BodyFn,
    Command,
    CommandRef,
    CommandRegistry,
    Invocation,
    OperatorFn,
};
use crate::config::DispatchConfig;
use crate::errors::{BindingSpecError, DispatchError, DispatchResult, ModeError};
use crate::hooks::{HookEvent, HookMask, Hooks};
use crate::host::{span, Host, Span};
use crate::key::KeyChord;
use crate::mode::{CursorStyle, ModeId, ModeRegistry, ModeSpec};
use crate::state::{InteractiveState, LastResolution, ResolveEnv, StateProbe};

/// What a successfully dispatched key did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Dispatched {
    /// The named command ran, and the state was finalized.
    Completed(String),

    /// The named operator is now waiting for a motion.
    Pending(String),

    /// The named prefix command adjusted the state for the next key.
    Prefix(String),
}

/// How a failed command left the interactive state.
enum Failure {
    /// Refused before anything changed.
    Refused(DispatchError),

    /// A command body failed part way through.
    Aborted(DispatchError),
}

/// The table of [Binding]s that a [Dispatcher] resolves keys against.
pub type Bindings = BindingTable<ModeId, KeyChord, CommandRef, StateProbe>;

/// Resolves keys into commands, and runs them against a document's [InteractiveState].
#[derive(Default)]
pub struct Dispatcher {
    modes: ModeRegistry,
    table: Bindings,
    commands: CommandRegistry,
    hooks: Hooks,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Create a new dispatcher with no modes, bindings or commands.
    pub fn new(config: DispatchConfig) -> Self {
        Dispatcher { config, ..Default::default() }
    }

    /// The dispatcher's configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// The registered modes.
    pub fn modes(&self) -> &ModeRegistry {
        &self.modes
    }

    /// The registered commands.
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// The sorted bindings for a key in a mode.
    pub fn bindings(&self, mode: &ModeId, key: &KeyChord) -> &[Binding<CommandRef, StateProbe>] {
        self.table.bindings(mode, key)
    }

    /// Register a new mode.
    pub fn define_mode(&mut self, spec: ModeSpec) -> Result<ModeId, ModeError> {
        let id = self.modes.define(spec)?;

        debug!(target: "modalops::mode", mode = %id, "mode_defined");

        return Ok(id);
    }

    /// Register a command under its name, replacing any previous command with that name.
    pub fn register(&mut self, cmd: Command) -> CommandRef {
        self.commands.insert(cmd)
    }

    /// Register every command from [builtin](crate::command::builtin).
    pub fn install_core_commands(&mut self) {
        for cmd in core_commands() {
            self.register(cmd);
        }
    }

    /// Look up a registered command.
    pub fn command(&self, name: &str) -> Option<CommandRef> {
        self.commands.get(name).cloned()
    }

    /// List the registered command names that start with `prefix`.
    pub fn complete_command(&self, prefix: &str) -> Vec<String> {
        self.commands.complete(prefix)
    }

    /// Subscribe to state machine transitions.
    pub fn add_hook<F>(&mut self, mask: HookMask, f: F)
    where
        F: Fn(&HookEvent<'_>) + 'static,
    {
        self.hooks.add(mask, f);
    }

    /// Insert, replace or remove a binding.
    ///
    /// Passing [None] for `command` removes the binding with the same guards. Bindings get
    /// validated before the table is touched, so a returned error means nothing changed. A
    /// command that isn't registered yet gets registered under its name.
    pub fn define_binding(
        &mut self,
        mode: &str,
        key: KeyChord,
        command: Option<CommandRef>,
        context: Context,
        state: StatePredicate<StateProbe>,
    ) -> Result<Option<CommandRef>, BindingSpecError> {
        let mode = self
            .modes
            .resolve(mode)
            .map_err(|_| BindingSpecError::UnknownMode(mode.to_string()))?;

        if let Some(cmd) = &command {
            if cmd.name().is_empty() {
                return Err(BindingSpecError::EmptyCommandName);
            }

            if !cmd.kind().accepts(&state) {
                let command = cmd.name().to_string();
                let state = state.to_string();

                return Err(BindingSpecError::IncompatibleState { command, state });
            }
        }

        debug!(
            target: "modalops::dispatch",
            mode = %mode,
            key = %key,
            context = %context,
            state = %state,
            command = command.as_ref().map(|c| c.name()),
            "define_binding"
        );

        let prev = self.table.define(mode, key, context, state, command.clone())?;

        if let Some(cmd) = command {
            if self.commands.get(cmd.name()).is_none() {
                self.commands.insert_ref(cmd);
            }
        }

        return Ok(prev);
    }

    /// Bind a key, written in the notation [KeyChord] parses, to a registered command. The
    /// binding applies in every context.
    pub fn bind(
        &mut self,
        mode: &str,
        key: &str,
        command: &str,
        state: StatePredicate<StateProbe>,
    ) -> Result<Option<CommandRef>, BindingSpecError> {
        let key = KeyChord::from_str(key)?;
        let cmd = self
            .command(command)
            .ok_or_else(|| BindingSpecError::UnknownCommand(command.to_string()))?;

        self.define_binding(mode, key, Some(cmd), Context::Always, state)
    }

    /// Remove the binding for a key with these guards.
    pub fn unbind(
        &mut self,
        mode: &str,
        key: &str,
        context: Context,
        state: StatePredicate<StateProbe>,
    ) -> Result<Option<CommandRef>, BindingSpecError> {
        let key = KeyChord::from_str(key)?;

        self.define_binding(mode, key, None, context, state)
    }

    /// Turn on modal editing for a document.
    ///
    /// This calls [Host::start], and activates the mode it picks.
    pub fn enable(&self, host: &mut dyn Host) -> Result<InteractiveState, ModeError> {
        let mut state = InteractiveState::default();

        let Some(start) = host.start(&self.modes) else {
            return Err(ModeError::NotStarted);
        };

        if !self.modes.contains(start.as_str()) {
            return Err(ModeError::NotStarted);
        }

        self.activate(&mut state, host, start.as_str())?;

        debug!(target: "modalops::mode", mode = ?state.mode(), "enable");

        return Ok(state);
    }

    /// Turn off modal editing for a document.
    pub fn disable(&self, mut state: InteractiveState, host: &mut dyn Host) {
        self.finalize(&mut state, host);
        host.set_cursor_style(CursorStyle::Default);

        debug!(target: "modalops::mode", mode = ?state.mode(), "disable");
    }

    /// Look up the command that a key would run, without running it.
    pub fn resolve(
        &self,
        state: &InteractiveState,
        host: &dyn Host,
        key: &KeyChord,
    ) -> Option<CommandRef> {
        let mode = state.mode.as_ref()?;

        self.lookup(mode, state, host, key)
    }

    fn lookup(
        &self,
        mode: &ModeId,
        state: &InteractiveState,
        host: &dyn Host,
        key: &KeyChord,
    ) -> Option<CommandRef> {
        let env = ResolveEnv::new(state, host);

        self.table.resolve(mode, key, &env).map(|b| b.command().clone())
    }

    /// Resolve a key, and run the command it's bound to.
    pub fn dispatch(
        &self,
        state: &mut InteractiveState,
        host: &mut dyn Host,
        key: &KeyChord,
    ) -> DispatchResult<Dispatched> {
        let Some(mode) = state.mode.clone() else {
            return self.fail(state, host, ModeError::NoActiveMode.into(), false);
        };

        debug!(
            target: "modalops::dispatch",
            key = %key,
            mode = %mode,
            pending = state.pending_operator(),
            "key_received"
        );

        let Some(cmd) = self.lookup(&mode, state, host, key) else {
            debug!(target: "modalops::dispatch", key = %key, mode = %mode, "unbound");

            return self.fail(state, host, DispatchError::Unbound(key.to_string()), false);
        };

        debug!(
            target: "modalops::dispatch",
            key = %key,
            command = cmd.name(),
            kind = ?cmd.kind(),
            "binding_chosen"
        );

        self.run(state, host, &cmd, Some(*key))
    }

    /// Dispatch a sequence of keys, stopping at the first failure.
    pub fn execute(
        &self,
        state: &mut InteractiveState,
        host: &mut dyn Host,
        keys: &[KeyChord],
    ) -> DispatchResult<Vec<Dispatched>> {
        keys.iter().map(|key| self.dispatch(state, host, key)).collect()
    }

    /// Run a registered command by name, as if a key bound to it had been pressed.
    ///
    /// The binding predicates aren't consulted, but the command still goes through the wrapper
    /// for its kind.
    pub fn invoke(
        &self,
        state: &mut InteractiveState,
        host: &mut dyn Host,
        name: &str,
    ) -> DispatchResult<Dispatched> {
        let Some(cmd) = self.command(name) else {
            return self.fail(state, host, DispatchError::UnknownCommand(name.to_string()), false);
        };

        debug!(target: "modalops::dispatch", command = name, "invoke");

        self.run(state, host, &cmd, None)
    }

    /// Switch to a mode, forgetting any transient activations.
    pub fn activate(
        &self,
        state: &mut InteractiveState,
        host: &mut dyn Host,
        mode: &str,
    ) -> Result<(), ModeError> {
        let id = self.modes.resolve(mode)?;

        state.transient.clear();
        self.switch(state, id);
        self.restyle(state, host);

        debug!(target: "modalops::mode", mode = ?state.mode(), "activate");

        Ok(())
    }

    /// Switch to a mode until the next time the state gets finalized.
    pub fn activate_transient(
        &self,
        state: &mut InteractiveState,
        host: &mut dyn Host,
        mode: &str,
    ) -> Result<(), ModeError> {
        let spec = self.modes.get(mode).ok_or_else(|| ModeError::UnknownMode(mode.to_string()))?;

        if !spec.is_transient() {
            return Err(ModeError::NotTransient(spec.id().to_string()));
        }

        let Some(prev) = state.mode.clone() else {
            return Err(ModeError::NoActiveMode);
        };

        state.transient.push(prev);
        self.switch(state, spec.id().clone());
        self.restyle(state, host);

        debug!(
            target: "modalops::mode",
            mode = %spec.id(),
            depth = state.transient.len(),
            "transient_push"
        );

        Ok(())
    }

    /// Return the state to its base: no scope, no numeric argument, no pending operator, and no
    /// transient activations.
    pub fn finalize(&self, state: &mut InteractiveState, host: &mut dyn Host) {
        let (pending, bottom) = state.reset();

        if let Some(mode) = bottom {
            debug!(target: "modalops::mode", mode = %mode, "transient_unwind");

            self.switch(state, mode);
        }

        if let Some(op) = &pending {
            self.hooks.fire(&HookEvent::PendingLeave { operator: op.name() });
        }

        self.hooks.fire(&HookEvent::Finalize);
        self.restyle(state, host);

        debug!(
            target: "modalops::state",
            mode = ?state.mode(),
            pending = pending.as_ref().map(|op| op.name()),
            "finalize"
        );
    }

    fn unwind(&self, state: &mut InteractiveState) {
        if let Some(mode) = state.unwind() {
            debug!(target: "modalops::mode", mode = %mode, "transient_unwind");

            self.switch(state, mode);
        }
    }

    fn switch(&self, state: &mut InteractiveState, to: ModeId) {
        let from = state.mode.replace(to);

        if let Some(to) = &state.mode {
            if from.as_ref() != Some(to) {
                self.hooks.fire(&HookEvent::ModeChange { from: from.as_ref(), to });
            }
        }
    }

    fn restyle(&self, state: &InteractiveState, host: &mut dyn Host) {
        let style = match (state.is_pending(), self.config.get_pending_cursor()) {
            (true, Some(style)) => style,
            _ => {
                state
                    .mode
                    .as_ref()
                    .and_then(|mode| self.modes.get(mode.as_str()))
                    .map(ModeSpec::get_cursor)
                    .unwrap_or_default()
            },
        };

        host.set_cursor_style(style);
    }

    fn fail(
        &self,
        state: &mut InteractiveState,
        host: &mut dyn Host,
        err: DispatchError,
        abort: bool,
    ) -> DispatchResult<Dispatched> {
        debug!(target: "modalops::dispatch", error = %err, abort, "dispatch_failed");

        if abort {
            self.finalize(state, host);
        }

        if self.config.get_notify_on_failure() {
            host.notify(&err);
        }

        self.hooks.fire(&HookEvent::Failure(&err));

        return Err(err);
    }

    fn run(
        &self,
        state: &mut InteractiveState,
        host: &mut dyn Host,
        cmd: &CommandRef,
        key: Option<KeyChord>,
    ) -> DispatchResult<Dispatched> {
        match self.apply(state, host, cmd, key) {
            Ok(done) => {
                if !matches!(done, Dispatched::Prefix(_)) {
                    let left_pending = state.is_pending();
                    let command = cmd.name().to_string();

                    state.last = key.map(|key| LastResolution { key, command, left_pending });
                }

                Ok(done)
            },
            Err(Failure::Refused(err)) => self.fail(state, host, err, false),
            Err(Failure::Aborted(err)) => self.fail(state, host, err, true),
        }
    }

    fn apply(
        &self,
        state: &mut InteractiveState,
        host: &mut dyn Host,
        cmd: &CommandRef,
        key: Option<KeyChord>,
    ) -> Result<Dispatched, Failure> {
        let name = cmd.name().to_string();

        match cmd.body() {
            Body::Action(f) => {
                self.call(state, host, key, &**f)?;
                self.finalize(state, host);

                Ok(Dispatched::Completed(name))
            },
            Body::Prefix(f) => {
                self.call(state, host, key, &**f)?;

                Ok(Dispatched::Prefix(name))
            },
            Body::Operator(f) => self.operate(state, host, cmd, &**f, key),
            Body::Motion(f) => self.motion(state, host, cmd, &**f, &[], key),
            Body::TextObject { body, substitutions } => {
                self.motion(state, host, cmd, &**body, substitutions, key)
            },
            Body::Hybrid { operator, motion } => {
                if state.is_pending() {
                    self.motion(state, host, cmd, &**motion, &[], key)
                } else {
                    self.operate(state, host, cmd, &**operator, key)
                }
            },
        }
    }

    fn operate(
        &self,
        state: &mut InteractiveState,
        host: &mut dyn Host,
        cmd: &CommandRef,
        f: &OperatorFn,
        key: Option<KeyChord>,
    ) -> Result<Dispatched, Failure> {
        let name = cmd.name().to_string();

        if host.selection_active() {
            let cursor = host.cursor();
            let range = span(host.anchor().unwrap_or(cursor), cursor);

            debug!(
                target: "modalops::state",
                operator = %name,
                start = range.start,
                end = range.end,
                "operate_on_selection"
            );

            state.ready = true;
            self.call_op(state, host, key, f, range)?;
            self.finalize(state, host);

            return Ok(Dispatched::Completed(name));
        }

        if let Some(op) = &state.pending {
            debug!(
                target: "modalops::state",
                operator = %name,
                pending = op.name(),
                "operator_already_pending"
            );

            return Err(Failure::Refused(DispatchError::OperatorAlreadyPending(name)));
        }

        let cursor = host.cursor();

        host.set_anchor(cursor);
        self.unwind(state);
        state.pending = Some(cmd.clone());

        self.hooks.fire(&HookEvent::PendingEnter { operator: name.as_str() });
        self.restyle(state, host);

        debug!(target: "modalops::state", operator = %name, anchor = cursor, "pending_enter");

        return Ok(Dispatched::Pending(name));
    }

    fn motion(
        &self,
        state: &mut InteractiveState,
        host: &mut dyn Host,
        cmd: &CommandRef,
        body: &BodyFn,
        substitutions: &[(String, CommandRef)],
        key: Option<KeyChord>,
    ) -> Result<Dispatched, Failure> {
        let name = cmd.name().to_string();

        let sub = state.pending.as_ref().and_then(|op| {
            substitutions
                .iter()
                .find(|(orig, _)| orig == op.name())
                .map(|(_, sub)| sub.clone())
        });

        if let Some(sub) = sub {
            debug!(
                target: "modalops::state",
                operator = state.pending_operator(),
                substitute = sub.name(),
                "operator_substituted"
            );

            state.pending = Some(sub);
        }

        self.call(state, host, key, body)?;

        let Some(op) = state.pending.clone() else {
            self.finalize(state, host);

            return Ok(Dispatched::Completed(name));
        };

        let cursor = host.cursor();
        let range = span(host.anchor().unwrap_or(cursor), cursor);

        debug!(
            target: "modalops::state",
            operator = op.name(),
            motion = %name,
            start = range.start,
            end = range.end,
            "pending_resolved"
        );

        state.ready = true;

        if let Some(f) = op.operator_body() {
            self.call_op(state, host, key, &**f, range)?;
        }

        self.finalize(state, host);

        return Ok(Dispatched::Completed(name));
    }

    fn call(
        &self,
        state: &mut InteractiveState,
        host: &mut dyn Host,
        key: Option<KeyChord>,
        f: &BodyFn,
    ) -> Result<(), Failure> {
        let mut inv = Invocation { host, state, dispatcher: self, key };

        f(&mut inv).map_err(Failure::Aborted)
    }

    fn call_op(
        &self,
        state: &mut InteractiveState,
        host: &mut dyn Host,
        key: Option<KeyChord>,
        f: &OperatorFn,
        range: Span,
    ) -> Result<(), Failure> {
        let mut inv = Invocation { host, state, dispatcher: self, key };

        f(&mut inv, range).map_err(Failure::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::builtin::{
        digit_argument_name,
        make_mode_switch,
        make_transient_switch,
        KEYBOARD_QUIT,
        SCOPE_INCREASE,
        STAY,
    };
    use crate::command::{
        make_action,
        make_hybrid,
        make_motion,
        make_operator,
        make_special_text_object,
    };
    use crate::command::CommandKind;
    use crate::config::DispatchConfigBuilder;
    use crate::errors::{CommandResult, HostError};
    use crate::state::Scope;
    use crate::util::TestHost;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use modalops_bindings::StatePredicate;

    fn log_span(inv: &mut Invocation<'_>, op: &str, span: Span) -> CommandResult {
        inv.host_command(&format!("{op} {}..{}", span.start, span.end))
    }

    fn setup() -> Dispatcher {
        let mut dispatcher = Dispatcher::default();

        dispatcher.define_mode(ModeSpec::new("normal", "N").cursor(CursorStyle::Block)).unwrap();
        dispatcher.define_mode(ModeSpec::new("insert", "I").cursor(CursorStyle::Bar)).unwrap();
        dispatcher.define_mode(ModeSpec::new("goto", "G").transient(true)).unwrap();
        dispatcher.define_mode(ModeSpec::new("window", "W").transient(true)).unwrap();
        dispatcher.install_core_commands();

        let unwrap = dispatcher.register(make_operator("unwrap", |inv, s| log_span(inv, "unwrap", s)));
        dispatcher.register(make_operator("kill", |inv, s| log_span(inv, "kill", s)));
        dispatcher.register(make_operator("change", |inv, s| log_span(inv, "change", s)));
        dispatcher.register(make_operator("fail-op", |inv, _| inv.host_command("fail-op")));
        dispatcher.register(make_motion("forward-char", |inv| {
            let steps = inv.steps();
            let cursor = inv.host().cursor();
            inv.host().set_cursor(steps.offset(cursor));
            Ok(())
        }));
        dispatcher.register(make_motion("find-char", |inv| {
            // Pretend the character is always two positions away.
            let _ = inv.read_char("find: ")?;
            let cursor = inv.host().cursor();
            inv.host().set_cursor(cursor + 2);
            Ok(())
        }));
        dispatcher.register(make_motion("goto-top", |inv| {
            inv.host().set_cursor(0);
            Ok(())
        }));
        dispatcher.register(make_special_text_object(
            "delimiters",
            |inv| {
                inv.host().set_anchor(1);
                inv.host().set_cursor(4);
                Ok(())
            },
            vec![("kill", unwrap)],
        ));
        dispatcher.register(make_hybrid(
            "comment",
            |inv, s| log_span(inv, "comment", s),
            |inv| {
                let cursor = inv.host().cursor();
                inv.host().set_cursor(cursor + 2);
                Ok(())
            },
        ));
        dispatcher.register(make_action("save", |inv| inv.host_command("save")));
        dispatcher.register(make_mode_switch("insert-mode", "insert"));
        dispatcher.register(make_mode_switch("normal-mode", "normal"));
        dispatcher.register(make_transient_switch("goto-prefix", "goto"));
        dispatcher.register(make_transient_switch("window-prefix", "window"));
        dispatcher.register(make_transient_switch("bad-prefix", "insert"));

        let binds = [
            ("normal", "d", "kill", class!(Operator)),
            ("normal", "d", STAY, class!(DefaultMotion)),
            ("normal", "c", "change", StatePredicate::Always),
            ("normal", "x", "fail-op", class!(Operator)),
            ("normal", "l", "forward-char", class!(Motion)),
            ("normal", "f", "find-char", class!(Motion)),
            ("normal", "s", "delimiters", class!(TextObject)),
            ("normal", "/", "comment", class!(Operator)),
            ("normal", "/", "comment", class!(Motion)),
            ("normal", "i", "insert-mode", class!(Action)),
            ("normal", "g", "goto-prefix", StatePredicate::Always),
            ("normal", "b", "bad-prefix", class!(Action)),
            ("normal", "<C-s>", "save", class!(Action)),
            ("normal", "a", SCOPE_INCREASE, StatePredicate::Always),
            ("normal", "<Esc>", KEYBOARD_QUIT, StatePredicate::Always),
            ("normal", "-", "negative-argument", StatePredicate::Always),
            ("normal", "<C-u>", "universal-argument", StatePredicate::Always),
            ("goto", "g", "goto-top", class!(Motion)),
            ("goto", "<C-w>", "window-prefix", StatePredicate::Always),
            ("window", "l", "forward-char", class!(Motion)),
            ("insert", "<Esc>", "normal-mode", class!(Action)),
        ];

        for (mode, key, cmd, state) in binds {
            dispatcher.bind(mode, key, cmd, state).unwrap();
        }

        for d in 1..=9 {
            let name = digit_argument_name(d);
            dispatcher.bind("normal", &d.to_string(), &name, StatePredicate::Always).unwrap();
        }

        dispatcher
    }

    fn start(dispatcher: &Dispatcher) -> (InteractiveState, TestHost) {
        let mut host = TestHost::new("hello world, and more");
        let state = dispatcher.enable(&mut host).unwrap();

        (state, host)
    }

    macro_rules! press {
        ($d: expr, $s: expr, $h: expr, $k: expr) => {
            $d.dispatch(&mut $s, &mut $h, &key!($k))
        };
    }

    macro_rules! exec {
        ($d: expr, $s: expr, $h: expr, $k: expr) => {
            $d.execute(&mut $s, &mut $h, &keys!($k))
        };
    }

    #[test]
    fn test_enable() {
        let dispatcher = setup();
        let (state, host) = start(&dispatcher);

        assert_eq!(state.mode(), Some(&ModeId::from("normal")));
        assert!(state.is_idle());
        assert_eq!(host.style(), Some(CursorStyle::Block));
    }

    #[test]
    fn test_enable_not_started() {
        let dispatcher = setup();

        let mut host = TestHost::new("");
        host.start_mode = None;
        assert!(matches!(dispatcher.enable(&mut host), Err(ModeError::NotStarted)));

        host.start_mode = Some("visual".into());
        assert!(matches!(dispatcher.enable(&mut host), Err(ModeError::NotStarted)));

        // Aliases work for picking the starting mode.
        host.start_mode = Some("I".into());
        let state = dispatcher.enable(&mut host).unwrap();
        assert_eq!(state.mode(), Some(&ModeId::from("insert")));
    }

    #[test]
    fn test_operator_then_motion() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);
        host.cursor = 2;

        let res = press!(dispatcher, state, host, "d");
        assert_eq!(res, Ok(Dispatched::Pending("kill".into())));
        assert_eq!(state.pending_operator(), Some("kill"));
        assert_eq!(host.anchor, Some(2));
        assert_eq!(host.style(), Some(CursorStyle::Underline));

        let res = press!(dispatcher, state, host, "l");
        assert_eq!(res, Ok(Dispatched::Completed("forward-char".into())));
        assert_eq!(host.log, vec!["kill 2..3"]);
        assert!(state.is_idle());
        assert!(!state.ready_for_operator());
        assert_eq!(host.style(), Some(CursorStyle::Block));
    }

    #[test]
    fn test_count_reaches_motion() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        let res = exec!(dispatcher, state, host, "12dl").unwrap();
        assert_eq!(res, vec![
            Dispatched::Prefix("digit-argument-1".into()),
            Dispatched::Prefix("digit-argument-2".into()),
            Dispatched::Pending("kill".into()),
            Dispatched::Completed("forward-char".into()),
        ]);
        assert_eq!(host.log, vec!["kill 0..12"]);
        assert!(!state.arg_given());

        // Negative counts move backwards.
        host.log.clear();
        exec!(dispatcher, state, host, "-3dl").unwrap();
        assert_eq!(host.log, vec!["kill 9..12"]);
    }

    #[test]
    fn test_universal_argument() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        exec!(dispatcher, state, host, "<C-u><C-u>").unwrap();
        assert_eq!(state.numeric().peek(), 16);

        press!(dispatcher, state, host, "l").unwrap();
        assert_eq!(host.cursor, 16);
        assert!(!state.arg_given());

        let config = DispatchConfigBuilder::default().universal_base(3).build();
        let mut dispatcher = setup();
        dispatcher.config = config;

        let (mut state, mut host) = start(&dispatcher);
        exec!(dispatcher, state, host, "<C-u><C-u>l").unwrap();
        assert_eq!(host.cursor, 9);
    }

    #[test]
    fn test_operator_twice_zero_width() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);
        host.cursor = 5;

        let res = exec!(dispatcher, state, host, "dd").unwrap();
        assert_eq!(res, vec![
            Dispatched::Pending("kill".into()),
            Dispatched::Completed(STAY.into()),
        ]);
        assert_eq!(host.log, vec!["kill 5..5"]);
        assert!(state.is_idle());

        // After resolving, the key starts a new operator.
        let res = press!(dispatcher, state, host, "d");
        assert_eq!(res, Ok(Dispatched::Pending("kill".into())));
    }

    #[test]
    fn test_prefix_between_operator_keys() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        exec!(dispatcher, state, host, "d3d").unwrap();
        assert_eq!(host.log, vec!["kill 0..0"]);
        assert!(state.is_idle());
    }

    #[test]
    fn test_default_motion_needs_same_key() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        // "c" is a different operator, so "d" isn't its default motion.
        press!(dispatcher, state, host, "c").unwrap();

        let res = press!(dispatcher, state, host, "d");
        assert_eq!(res, Err(DispatchError::Unbound("d".into())));
        assert_eq!(state.pending_operator(), Some("change"));
    }

    #[test]
    fn test_operator_already_pending() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        press!(dispatcher, state, host, "d").unwrap();
        host.cursor = 3;

        let res = press!(dispatcher, state, host, "c");
        assert_eq!(res, Err(DispatchError::OperatorAlreadyPending("change".into())));
        assert_eq!(state.pending_operator(), Some("kill"));
        assert_eq!(host.anchor, Some(0));
        assert_eq!(host.notices, vec![DispatchError::OperatorAlreadyPending("change".into())]);

        let res = dispatcher.invoke(&mut state, &mut host, "kill");
        assert_eq!(res, Err(DispatchError::OperatorAlreadyPending("kill".into())));
        assert_eq!(state.pending_operator(), Some("kill"));

        // The original operator still resolves.
        press!(dispatcher, state, host, "l").unwrap();
        assert_eq!(host.log, vec!["kill 0..4"]);
    }

    #[test]
    fn test_operator_on_selection() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        host.selection = true;
        host.anchor = Some(7);
        host.cursor = 3;

        let res = press!(dispatcher, state, host, "d");
        assert_eq!(res, Ok(Dispatched::Completed("kill".into())));
        assert_eq!(host.log, vec!["kill 3..7"]);
        assert!(!state.is_pending());
        assert!(state.is_idle());
    }

    #[test]
    fn test_operator_body_sees_ready() {
        let mut dispatcher = setup();
        dispatcher.register(make_operator("mark", |inv, _| {
            let ready = inv.ready_for_operator();
            inv.host_command(&format!("ready {ready}"))
        }));
        dispatcher.bind("normal", "m", "mark", class!(Operator)).unwrap();

        // Resolved by a motion.
        let (mut state, mut host) = start(&dispatcher);
        press!(dispatcher, state, host, "m").unwrap();
        assert!(!state.ready_for_operator());
        assert!(host.log.is_empty());

        press!(dispatcher, state, host, "l").unwrap();
        assert_eq!(host.log, vec!["ready true"]);
        assert!(!state.ready_for_operator());

        // Run directly over a selection.
        let (mut state, mut host) = start(&dispatcher);
        host.selection = true;
        host.anchor = Some(2);

        let res = press!(dispatcher, state, host, "m");
        assert_eq!(res, Ok(Dispatched::Completed("mark".into())));
        assert_eq!(host.log, vec!["ready true"]);
        assert!(!state.ready_for_operator());
    }

    #[test]
    fn test_selection_absorbs_second_operator() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        press!(dispatcher, state, host, "d").unwrap();

        host.selection = true;
        host.cursor = 5;

        let res = press!(dispatcher, state, host, "c");
        assert_eq!(res, Ok(Dispatched::Completed("change".into())));
        assert_eq!(host.log, vec!["change 0..5"]);
        assert!(state.is_idle());
    }

    #[test]
    fn test_unbound_changes_nothing() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        exec!(dispatcher, state, host, "2ad").unwrap();

        let res = press!(dispatcher, state, host, "z");
        assert_eq!(res, Err(DispatchError::Unbound("z".into())));
        assert_eq!(host.notices, vec![DispatchError::Unbound("z".into())]);
        assert_eq!(state.pending_operator(), Some("kill"));
        assert_eq!(state.scope(), Scope::Inside);
        assert_eq!(state.numeric().peek(), 2);

        // Text objects need a selection or a pending operator.
        state = dispatcher.enable(&mut host).unwrap();
        let res = press!(dispatcher, state, host, "s");
        assert_eq!(res, Err(DispatchError::Unbound("s".into())));
    }

    #[test]
    fn test_no_notify() {
        let mut dispatcher = setup();
        dispatcher.config = DispatchConfigBuilder::default().notify_on_failure(false).build();

        let (mut state, mut host) = start(&dispatcher);

        assert!(press!(dispatcher, state, host, "z").is_err());
        assert!(host.notices.is_empty());
    }

    #[test]
    fn test_scope() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        exec!(dispatcher, state, host, "aaa").unwrap();
        assert_eq!(state.scope(), Scope::Around);

        // Scope survives the operator going pending, and is cleared by finalizing.
        press!(dispatcher, state, host, "d").unwrap();
        assert_eq!(state.scope(), Scope::Around);

        press!(dispatcher, state, host, "l").unwrap();
        assert_eq!(state.scope(), Scope::NoScope);
    }

    #[test]
    fn test_keyboard_quit() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        exec!(dispatcher, state, host, "5ad").unwrap();
        host.selection = true;

        let res = press!(dispatcher, state, host, "<Esc>");
        assert_eq!(res, Ok(Dispatched::Completed(KEYBOARD_QUIT.into())));
        assert!(state.is_idle());
        assert!(!host.selection);
        assert!(host.log.is_empty());
    }

    #[test]
    fn test_transient_unwind() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        press!(dispatcher, state, host, "g").unwrap();
        assert_eq!(state.mode(), Some(&ModeId::from("goto")));

        press!(dispatcher, state, host, "<C-w>").unwrap();
        assert_eq!(state.mode(), Some(&ModeId::from("window")));
        assert_eq!(state.transient_stack(), &[ModeId::from("normal"), ModeId::from("goto")]);

        // A single finalize goes all the way back.
        press!(dispatcher, state, host, "l").unwrap();
        assert_eq!(state.mode(), Some(&ModeId::from("normal")));
        assert!(state.transient_stack().is_empty());
        assert_eq!(host.style(), Some(CursorStyle::Block));
    }

    #[test]
    fn test_transient_motion_resolves_operator() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);
        host.cursor = 6;

        exec!(dispatcher, state, host, "dgg").unwrap();
        assert_eq!(host.log, vec!["kill 0..6"]);
        assert_eq!(state.mode(), Some(&ModeId::from("normal")));
        assert!(state.is_idle());
    }

    #[test]
    fn test_operator_unwinds_transients() {
        let mut dispatcher = setup();
        dispatcher.bind("goto", "d", "kill", class!(Operator)).unwrap();

        let (mut state, mut host) = start(&dispatcher);

        exec!(dispatcher, state, host, "gd").unwrap();
        assert_eq!(state.pending_operator(), Some("kill"));
        assert_eq!(state.mode(), Some(&ModeId::from("normal")));
        assert!(state.transient_stack().is_empty());
    }

    #[test]
    fn test_mode_errors_abort() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        exec!(dispatcher, state, host, "3").unwrap();

        let res = press!(dispatcher, state, host, "b");
        assert_eq!(res, Err(DispatchError::Mode(ModeError::NotTransient("insert".into()))));
        assert!(state.is_idle());
        assert_eq!(state.mode(), Some(&ModeId::from("normal")));
    }

    #[test]
    fn test_mode_switch() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        press!(dispatcher, state, host, "i").unwrap();
        assert_eq!(state.mode(), Some(&ModeId::from("insert")));
        assert_eq!(host.style(), Some(CursorStyle::Bar));

        // Normal mode bindings don't apply.
        let res = press!(dispatcher, state, host, "d");
        assert_eq!(res, Err(DispatchError::Unbound("d".into())));

        press!(dispatcher, state, host, "<Esc>").unwrap();
        assert_eq!(state.mode(), Some(&ModeId::from("normal")));
    }

    #[test]
    fn test_special_text_object() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        exec!(dispatcher, state, host, "ds").unwrap();
        assert_eq!(host.log, vec!["unwrap 1..4"]);
        assert!(state.is_idle());

        // Operators without a substitution run as themselves.
        host.log.clear();
        exec!(dispatcher, state, host, "cs").unwrap();
        assert_eq!(host.log, vec!["change 1..4"]);
    }

    #[test]
    fn test_hybrid() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        let res = press!(dispatcher, state, host, "/");
        assert_eq!(res, Ok(Dispatched::Pending("comment".into())));

        // The second press moves, resolving the first.
        let res = press!(dispatcher, state, host, "/");
        assert_eq!(res, Ok(Dispatched::Completed("comment".into())));
        assert_eq!(host.log, vec!["comment 0..2"]);

        // As a motion for another operator.
        host.log.clear();
        exec!(dispatcher, state, host, "d/").unwrap();
        assert_eq!(host.log, vec!["kill 2..4"]);
    }

    #[test]
    fn test_cancelled_prompt_aborts() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        exec!(dispatcher, state, host, "2ad").unwrap();

        let res = press!(dispatcher, state, host, "f");
        assert_eq!(res, Err(DispatchError::Cancelled));
        assert!(state.is_idle());
        assert!(host.log.is_empty());
        assert_eq!(host.notices, vec![DispatchError::Cancelled]);

        // With a character available, the motion resolves the operator.
        host.chars.push_back('x');
        exec!(dispatcher, state, host, "df").unwrap();
        assert_eq!(host.log, vec!["kill 0..2"]);
    }

    #[test]
    fn test_body_failure_aborts() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        exec!(dispatcher, state, host, "x").unwrap();
        assert_eq!(state.pending_operator(), Some("fail-op"));

        let res = press!(dispatcher, state, host, "l");
        assert_eq!(res, Err(DispatchError::Host(HostError::Failed("fail-op".into()))));
        assert!(state.is_idle());
    }

    #[test]
    fn test_invoke() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        let res = dispatcher.invoke(&mut state, &mut host, "forward-char");
        assert_eq!(res, Ok(Dispatched::Completed("forward-char".into())));
        assert_eq!(host.cursor, 1);

        let res = dispatcher.invoke(&mut state, &mut host, "no-such-command");
        assert_eq!(res, Err(DispatchError::UnknownCommand("no-such-command".into())));

        // Commands invoked by name don't count for default motions.
        dispatcher.invoke(&mut state, &mut host, "kill").unwrap();
        let res = press!(dispatcher, state, host, "d");
        assert_eq!(res, Err(DispatchError::Unbound("d".into())));
    }

    #[test]
    fn test_no_active_mode() {
        let dispatcher = setup();
        let mut state = InteractiveState::default();
        let mut host = TestHost::new("");

        let res = press!(dispatcher, state, host, "d");
        assert_eq!(res, Err(DispatchError::Mode(ModeError::NoActiveMode)));
    }

    #[test]
    fn test_contexts() {
        let mut dispatcher = setup();
        let cmd = dispatcher.command("save").unwrap();
        let ctx = Context::named("rust");

        dispatcher
            .define_binding("normal", key!("d"), Some(cmd), ctx, class!(Action))
            .unwrap();

        let (mut state, mut host) = start(&dispatcher);

        press!(dispatcher, state, host, "d").unwrap();
        assert!(state.is_pending());

        press!(dispatcher, state, host, "<Esc>").unwrap();
        host.contexts.push("rust".into());

        let res = press!(dispatcher, state, host, "d");
        assert_eq!(res, Ok(Dispatched::Completed("save".into())));
        assert_eq!(host.log, vec!["save"]);
    }

    #[test]
    fn test_custom_predicate() {
        let mut dispatcher = setup();
        let counted = StatePredicate::custom("counted", |p: &StateProbe| p.arg_given);

        dispatcher.bind("normal", "<C-g>", "goto-top", counted).unwrap();
        dispatcher.bind("normal", "<C-g>", "save", StatePredicate::Always).unwrap();

        let (mut state, mut host) = start(&dispatcher);
        host.cursor = 5;

        // Without a count, only the catch-all binding holds.
        press!(dispatcher, state, host, "<C-g>").unwrap();
        assert_eq!(host.log, vec!["save"]);

        exec!(dispatcher, state, host, "2<C-g>").unwrap();
        assert_eq!(host.cursor, 0);
        assert_eq!(host.log, vec!["save"]);
    }

    #[test]
    fn test_define_binding_errors() {
        let mut dispatcher = setup();
        let before = dispatcher.table.len();
        let kill = dispatcher.command("kill").unwrap();

        let res = dispatcher.bind("visual", "d", "kill", class!(Operator));
        assert_eq!(res, Err(BindingSpecError::UnknownMode("visual".into())));

        let res = dispatcher.bind("normal", "d", "kill", class!(Motion));
        assert_eq!(res, Err(BindingSpecError::IncompatibleState {
            command: "kill".into(),
            state: "motion".into(),
        }));

        let res = dispatcher.bind("normal", "d", "nothing", class!(Motion));
        assert_eq!(res, Err(BindingSpecError::UnknownCommand("nothing".into())));

        let res = dispatcher.bind("normal", "<C-", "kill", class!(Operator));
        assert!(matches!(res, Err(BindingSpecError::Key(_))));

        let anon = Arc::new(make_action("", |_| Ok(())));
        let res =
            dispatcher.define_binding("normal", key!("q"), Some(anon), Context::Always, class!(Action));
        assert_eq!(res, Err(BindingSpecError::EmptyCommandName));

        let ctx = Context::named("");
        let res = dispatcher.define_binding("normal", key!("q"), Some(kill), ctx, class!(Operator));
        assert!(matches!(res, Err(BindingSpecError::Table(_))));

        assert_eq!(dispatcher.table.len(), before);
    }

    #[test]
    fn test_rebind_and_unbind() {
        let mut dispatcher = setup();
        let normal = ModeId::from("normal");

        let prev = dispatcher.bind("N", "d", "change", class!(Operator)).unwrap();
        assert_eq!(prev.unwrap().name(), "kill");
        assert_eq!(dispatcher.bindings(&normal, &key!("d")).len(), 2);

        let prev = dispatcher.unbind("normal", "d", Context::Always, class!(Operator)).unwrap();
        assert_eq!(prev.unwrap().name(), "change");
        assert_eq!(dispatcher.bindings(&normal, &key!("d")).len(), 1);

        let prev = dispatcher.unbind("normal", "d", Context::Always, class!(Operator)).unwrap();
        assert!(prev.is_none());
    }

    #[test]
    fn test_define_binding_registers() {
        let mut dispatcher = setup();
        let cmd = Arc::new(make_motion("backward-char", |_| Ok(())));

        dispatcher
            .define_binding("normal", key!("h"), Some(cmd), Context::Always, class!(Motion))
            .unwrap();

        assert!(dispatcher.command("backward-char").is_some());
        assert_eq!(dispatcher.complete_command("backward-"), vec!["backward-char".to_string()]);
    }

    #[test]
    fn test_hooks() {
        let mut dispatcher = setup();
        let events = Rc::new(RefCell::new(Vec::<String>::new()));

        let ev = events.clone();
        dispatcher.add_hook(HookMask::all(), move |event| {
            let desc = match event {
                HookEvent::PendingEnter { operator } => format!("enter {operator}"),
                HookEvent::PendingLeave { operator } => format!("leave {operator}"),
                HookEvent::ModeChange { from, to } => {
                    format!("mode {} -> {to}", from.map(ToString::to_string).unwrap_or_default())
                },
                HookEvent::Finalize => "finalize".into(),
                HookEvent::Failure(err) => format!("failure {err}"),
            };

            ev.borrow_mut().push(desc);
        });

        let (mut state, mut host) = start(&dispatcher);
        exec!(dispatcher, state, host, "dl").unwrap();
        let _ = press!(dispatcher, state, host, "z");

        assert_eq!(*events.borrow(), vec![
            "mode  -> normal".to_string(),
            "enter kill".to_string(),
            "leave kill".to_string(),
            "finalize".to_string(),
            "failure z is undefined".to_string(),
        ]);
    }

    #[test]
    fn test_disable() {
        let dispatcher = setup();
        let (mut state, mut host) = start(&dispatcher);

        press!(dispatcher, state, host, "d").unwrap();
        dispatcher.disable(state, &mut host);

        assert_eq!(host.style(), Some(CursorStyle::Default));
    }

    #[test]
    fn test_resolve_without_running() {
        let dispatcher = setup();
        let (state, host) = start(&dispatcher);

        let cmd = dispatcher.resolve(&state, &host, &key!("d")).unwrap();
        assert_eq!(cmd.kind(), CommandKind::Operator);
        assert!(dispatcher.resolve(&state, &host, &key!("z")).is_none());
        assert!(state.is_idle());
    }
}
