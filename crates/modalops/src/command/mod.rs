//! # Commands
//!
//! ## Overview
//!
//! A [Command] is a named body, plus the category that decides how the dispatcher wraps it:
//!
//! * An **action** runs, and then the interactive state gets finalized.
//! * A **prefix** only adjusts the state for the next command (for example, the numeric
//!   argument), and never finalizes.
//! * An **operator** runs immediately over the selection if there is one. Otherwise, it places
//!   the anchor at the cursor and becomes the pending operator.
//! * A **motion** runs, and then resolves any pending operator over the span between the anchor
//!   and the new cursor position.
//! * A **text object** is a motion that can also substitute a specialized command for the pending
//!   operator before it runs.
//! * A **hybrid** behaves like its motion when an operator is pending, and like its operator
//!   otherwise.
//!
//! Commands are built with [make_action], [make_prefix], [make_operator], [make_motion],
//! [make_text_object], [make_special_text_object] and [make_hybrid]. Bodies receive an
//! [Invocation], which gives them access to the host and the interactive state.
//!
//! ```
//! use modalops::command::{make_motion, make_operator, CommandKind};
//! use modalops::host::Host;
//!
//! let forward = make_motion("forward-char", |inv| {
//!     let steps = inv.steps();
//!     let cursor = inv.host().cursor();
//!
//!     inv.host().set_cursor(steps.offset(cursor));
//!
//!     Ok(())
//! });
//!
//! let kill = make_operator("kill", |inv, span| {
//!     inv.host_command(&format!("kill {}..{}", span.start, span.end))
//! });
//!
//! assert_eq!(forward.kind(), CommandKind::Motion);
//! assert_eq!(kill.kind(), CommandKind::Operator);
//! ```
use std::fmt;
use std::sync::Arc;

use modalops_bindings::{StateClass, StatePredicate};

use crate::config::DispatchConfig;
use crate::count::{ArgSteps, NumericArgument};
use crate::dispatch::Dispatcher;
use crate::errors::{CommandResult, DispatchError, DispatchResult};
use crate::host::{Host, Span};
use crate::key::KeyChord;
use crate::state::{InteractiveState, Scope};

pub mod builtin;
mod registry;

pub use self::registry::CommandRegistry;

/// A shared reference to a [Command].
pub type CommandRef = Arc<Command>;

/// The body of actions, prefixes, motions and text objects.
pub type BodyFn = dyn Fn(&mut Invocation<'_>) -> CommandResult;

/// The body of operators, which also receives the span to act on.
pub type OperatorFn = dyn Fn(&mut Invocation<'_>, Span) -> CommandResult;

/// The category of a [Command].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CommandKind {
    /// Runs, then finalizes.
    Action,

    /// Adjusts state for the next command.
    Prefix,

    /// Acts on a span.
    Operator,

    /// Moves the cursor.
    Motion,

    /// Moves the cursor and anchor to delimit a span.
    TextObject,

    /// A motion when an operator is pending, and an operator otherwise.
    Hybrid,
}

impl CommandKind {
    /// Whether a command of this kind can be bound under the given state predicate.
    pub fn accepts<P: ?Sized>(&self, state: &StatePredicate<P>) -> bool {
        let Some(class) = state.class() else {
            return true;
        };

        match (class, self) {
            (StateClass::Action, CommandKind::Action | CommandKind::Prefix) => true,
            (StateClass::Operator, CommandKind::Operator | CommandKind::Hybrid) => true,
            (
                StateClass::DefaultMotion | StateClass::TextObject | StateClass::Motion,
                CommandKind::Motion | CommandKind::TextObject | CommandKind::Hybrid,
            ) => true,
            _ => false,
        }
    }
}

#[derive(Clone)]
pub(crate) enum Body {
    Action(Arc<BodyFn>),
    Prefix(Arc<BodyFn>),
    Operator(Arc<OperatorFn>),
    Motion(Arc<BodyFn>),
    TextObject {
        body: Arc<BodyFn>,
        substitutions: Vec<(String, CommandRef)>,
    },
    Hybrid {
        operator: Arc<OperatorFn>,
        motion: Arc<BodyFn>,
    },
}

/// A named command that can be bound to keys.
#[derive(Clone)]
pub struct Command {
    name: String,
    body: Body,
}

impl Command {
    /// The name this command is registered under.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The category of this command.
    pub fn kind(&self) -> CommandKind {
        match &self.body {
            Body::Action(_) => CommandKind::Action,
            Body::Prefix(_) => CommandKind::Prefix,
            Body::Operator(_) => CommandKind::Operator,
            Body::Motion(_) => CommandKind::Motion,
            Body::TextObject { .. } => CommandKind::TextObject,
            Body::Hybrid { .. } => CommandKind::Hybrid,
        }
    }

    /// The operators that this text object replaces, and what it replaces them with.
    pub fn substitutions(&self) -> impl Iterator<Item = (&str, &CommandRef)> {
        let subs: &[(String, CommandRef)] = match &self.body {
            Body::TextObject { substitutions, .. } => substitutions.as_slice(),
            _ => &[],
        };

        subs.iter().map(|(op, cmd)| (op.as_str(), cmd))
    }

    pub(crate) fn body(&self) -> &Body {
        &self.body
    }

    pub(crate) fn operator_body(&self) -> Option<&Arc<OperatorFn>> {
        match &self.body {
            Body::Operator(f) => Some(f),
            Body::Hybrid { operator, .. } => Some(operator),
            _ => None,
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind() == other.kind()
    }
}

/// Build a command that runs `f` and then finalizes the interactive state.
pub fn make_action<N, F>(name: N, f: F) -> Command
where
    N: Into<String>,
    F: Fn(&mut Invocation<'_>) -> CommandResult + 'static,
{
    Command { name: name.into(), body: Body::Action(Arc::new(f)) }
}

/// Build a command that adjusts the interactive state for whatever command comes next.
pub fn make_prefix<N, F>(name: N, f: F) -> Command
where
    N: Into<String>,
    F: Fn(&mut Invocation<'_>) -> CommandResult + 'static,
{
    Command { name: name.into(), body: Body::Prefix(Arc::new(f)) }
}

/// Build an operator, which runs `f` over either the selection, or the span that the next
/// motion covers.
pub fn make_operator<N, F>(name: N, f: F) -> Command
where
    N: Into<String>,
    F: Fn(&mut Invocation<'_>, Span) -> CommandResult + 'static,
{
    Command { name: name.into(), body: Body::Operator(Arc::new(f)) }
}

/// Build a motion, which runs `f` and then resolves any pending operator.
pub fn make_motion<N, F>(name: N, f: F) -> Command
where
    N: Into<String>,
    F: Fn(&mut Invocation<'_>) -> CommandResult + 'static,
{
    Command { name: name.into(), body: Body::Motion(Arc::new(f)) }
}

/// Build a text object. The body should place both the anchor and the cursor.
pub fn make_text_object<N, F>(name: N, f: F) -> Command
where
    N: Into<String>,
    F: Fn(&mut Invocation<'_>) -> CommandResult + 'static,
{
    make_special_text_object(name, f, Vec::<(String, CommandRef)>::new())
}

/// Build a text object that replaces certain pending operators with specialized commands.
///
/// Each substitution maps the name of an operator onto the command that should run in its
/// place. Replacements that can't act on a span (anything but operators and hybrids) are
/// dropped.
pub fn make_special_text_object<N, F, I, S>(name: N, f: F, substitutions: I) -> Command
where
    N: Into<String>,
    F: Fn(&mut Invocation<'_>) -> CommandResult + 'static,
    I: IntoIterator<Item = (S, CommandRef)>,
    S: Into<String>,
{
    let substitutions = substitutions
        .into_iter()
        .filter(|(_, cmd)| cmd.operator_body().is_some())
        .map(|(op, cmd)| (op.into(), cmd))
        .collect();

    Command {
        name: name.into(),
        body: Body::TextObject { body: Arc::new(f), substitutions },
    }
}

/// Build a command that moves when an operator is pending, and operates otherwise.
pub fn make_hybrid<N, O, M>(name: N, operator: O, motion: M) -> Command
where
    N: Into<String>,
    O: Fn(&mut Invocation<'_>, Span) -> CommandResult + 'static,
    M: Fn(&mut Invocation<'_>) -> CommandResult + 'static,
{
    Command {
        name: name.into(),
        body: Body::Hybrid { operator: Arc::new(operator), motion: Arc::new(motion) },
    }
}

/// Everything a command body can see and change while it runs.
pub struct Invocation<'a> {
    pub(crate) host: &'a mut dyn Host,
    pub(crate) state: &'a mut InteractiveState,
    pub(crate) dispatcher: &'a Dispatcher,
    pub(crate) key: Option<KeyChord>,
}

impl<'a> Invocation<'a> {
    /// The editing shell.
    pub fn host(&mut self) -> &mut dyn Host {
        &mut *self.host
    }

    /// The interactive state of the document.
    pub fn state(&self) -> &InteractiveState {
        &*self.state
    }

    /// The dispatcher's configuration.
    pub fn config(&self) -> &DispatchConfig {
        self.dispatcher.config()
    }

    /// The key that this command was dispatched from, if it wasn't invoked by name.
    pub fn key(&self) -> Option<&KeyChord> {
        self.key.as_ref()
    }

    /// Read and consume the numeric argument.
    pub fn arg(&mut self) -> i64 {
        self.state.arg.take()
    }

    /// Read the numeric argument without consuming it.
    pub fn peek_arg(&self) -> i64 {
        self.state.arg.peek()
    }

    /// Whether the user typed a numeric argument. This doesn't consume it.
    pub fn arg_given(&self) -> bool {
        self.state.arg.is_given()
    }

    /// Consume the numeric argument as a set of [ArgSteps].
    pub fn steps(&mut self) -> ArgSteps {
        self.state.arg.steps()
    }

    /// Direct access to the numeric argument being collected.
    pub fn numeric_mut(&mut self) -> &mut NumericArgument {
        &mut self.state.arg
    }

    /// The current scope.
    pub fn scope(&self) -> Scope {
        self.state.scope
    }

    /// Widen the scope, and return the new value.
    pub fn increase_scope(&mut self) -> Scope {
        let cycle = self.dispatcher.config().get_scope_cycle();

        self.state.increase_scope(cycle)
    }

    /// Whether a pending operator is about to run.
    pub fn ready_for_operator(&self) -> bool {
        self.state.ready
    }

    /// The name of the pending operator.
    pub fn pending_operator(&self) -> Option<&str> {
        self.state.pending_operator()
    }

    /// Prompt the user for a character. Cancelling the prompt fails with
    /// [DispatchError::Cancelled], which aborts the pending state.
    pub fn read_char(&mut self, prompt: &str) -> DispatchResult<char> {
        self.host.read_char(prompt).ok_or(DispatchError::Cancelled)
    }

    /// Run a command that the host knows by name.
    pub fn host_command(&mut self, name: &str) -> CommandResult {
        self.host.invoke(name)?;

        Ok(())
    }

    /// Switch to another mode, forgetting any transient activations.
    pub fn activate(&mut self, mode: &str) -> CommandResult {
        self.dispatcher.activate(&mut *self.state, &mut *self.host, mode)?;

        Ok(())
    }

    /// Switch to another mode until the next time the state gets finalized.
    pub fn activate_transient(&mut self, mode: &str) -> CommandResult {
        self.dispatcher.activate_transient(&mut *self.state, &mut *self.host, mode)?;

        Ok(())
    }
}
