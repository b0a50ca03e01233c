//! # Interactive state
//!
//! ## Overview
//!
//! Each document in modal editing owns an [InteractiveState]. It records the active mode, the
//! stack of transient mode activations, the pending operator, the scope and the numeric
//! argument, and gets passed by reference into every
//! [Dispatcher::dispatch](crate::dispatch::Dispatcher::dispatch) call.
//!
//! Keys resolve against this state through the fixed [StateClass] legality checks:
//!
//! | Class            | Legal when                                                          |
//! | ---------------- | ------------------------------------------------------------------- |
//! | `Action`         | nothing is selected, and no operator is pending                     |
//! | `Operator`       | something is selected, or no operator is pending                    |
//! | `DefaultMotion`  | an operator is pending, and was left pending by this same key       |
//! | `TextObject`     | something is selected, or an operator is pending                    |
//! | `Motion`         | always                                                              |
use tracing::trace;

use modalops_bindings::{BindingEnv, StateClass};

use crate::command::CommandRef;
use crate::config::ScopeCycle;
use crate::count::NumericArgument;
use crate::host::Host;
use crate::key::KeyChord;
use crate::mode::ModeId;

/// How far a text object should reach around what it delimits.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Scope {
    /// No scope was requested.
    #[default]
    NoScope,

    /// Only the contents.
    Inside,

    /// The contents, plus the delimiters.
    Around,
}

impl Scope {
    /// The next wider scope.
    ///
    /// ```
    /// use modalops::config::ScopeCycle;
    /// use modalops::state::Scope;
    ///
    /// assert_eq!(Scope::NoScope.increase(ScopeCycle::Saturate), Scope::Inside);
    /// assert_eq!(Scope::Around.increase(ScopeCycle::Saturate), Scope::Around);
    /// assert_eq!(Scope::Around.increase(ScopeCycle::Wrap), Scope::NoScope);
    /// ```
    pub fn increase(self, cycle: ScopeCycle) -> Scope {
        match (self, cycle) {
            (Scope::NoScope, _) => Scope::Inside,
            (Scope::Inside, _) => Scope::Around,
            (Scope::Around, ScopeCycle::Saturate) => Scope::Around,
            (Scope::Around, ScopeCycle::Wrap) => Scope::NoScope,
        }
    }
}

/// The most recent command that fully resolved from a key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct LastResolution {
    pub(crate) key: KeyChord,
    pub(crate) command: String,
    pub(crate) left_pending: bool,
}

/// The per-document state of the dispatch engine.
#[derive(Clone, Debug, Default)]
pub struct InteractiveState {
    pub(crate) mode: Option<ModeId>,
    pub(crate) transient: Vec<ModeId>,
    pub(crate) pending: Option<CommandRef>,
    pub(crate) ready: bool,
    pub(crate) scope: Scope,
    pub(crate) arg: NumericArgument,
    pub(crate) last: Option<LastResolution>,
}

impl InteractiveState {
    /// The active mode.
    pub fn mode(&self) -> Option<&ModeId> {
        self.mode.as_ref()
    }

    /// The modes that were active before each transient activation, oldest first.
    pub fn transient_stack(&self) -> &[ModeId] {
        self.transient.as_slice()
    }

    /// Whether an operator is waiting for a motion.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The name of the operator waiting for a motion.
    pub fn pending_operator(&self) -> Option<&str> {
        self.pending.as_ref().map(|cmd| cmd.name())
    }

    /// Whether the pending operator is about to run.
    pub fn ready_for_operator(&self) -> bool {
        self.ready
    }

    /// The current scope.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// The numeric argument being collected.
    pub fn numeric(&self) -> &NumericArgument {
        &self.arg
    }

    /// Whether the user typed a numeric argument.
    pub fn arg_given(&self) -> bool {
        self.arg.is_given()
    }

    /// Whether the state is back at its base: nothing pending, no scope, no argument and no
    /// transient activations.
    pub fn is_idle(&self) -> bool {
        self.pending.is_none() &&
            !self.ready &&
            self.scope == Scope::NoScope &&
            !self.arg.is_given() &&
            self.transient.is_empty()
    }

    pub(crate) fn increase_scope(&mut self, cycle: ScopeCycle) -> Scope {
        self.scope = self.scope.increase(cycle);

        trace!(target: "modalops::state", scope = ?self.scope, "scope_increase");

        return self.scope;
    }

    /// Reset everything that finalizing clears, returning the operator that was pending and the
    /// mode at the bottom of the transient stack.
    pub(crate) fn reset(&mut self) -> (Option<CommandRef>, Option<ModeId>) {
        let pending = self.pending.take();
        let bottom = self.unwind();

        self.ready = false;
        self.scope = Scope::NoScope;
        self.arg.clear();

        return (pending, bottom);
    }

    /// Empty the transient stack, returning the mode at its bottom.
    pub(crate) fn unwind(&mut self) -> Option<ModeId> {
        let bottom = self.transient.drain(..).next();

        return bottom;
    }

    pub(crate) fn probe(&self, host: &dyn Host) -> StateProbe {
        StateProbe {
            mode: self.mode.clone(),
            pending: self.pending_operator().map(ToString::to_string),
            scope: self.scope,
            arg_given: self.arg.is_given(),
            selection_active: host.selection_active(),
            selection_nonempty: host.selection_nonempty(),
            cursor: host.cursor(),
        }
    }
}

/// A snapshot of the state that custom binding predicates get to inspect.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StateProbe {
    /// The active mode.
    pub mode: Option<ModeId>,

    /// The name of the pending operator.
    pub pending: Option<String>,

    /// The current scope.
    pub scope: Scope,

    /// Whether the user typed a numeric argument.
    pub arg_given: bool,

    /// Whether a selection is active.
    pub selection_active: bool,

    /// Whether a non-empty selection is active.
    pub selection_nonempty: bool,

    /// The cursor position.
    pub cursor: usize,
}

/// Evaluates binding predicates against a document's state and its host.
pub(crate) struct ResolveEnv<'a> {
    state: &'a InteractiveState,
    host: &'a dyn Host,
    probe: StateProbe,
}

impl<'a> ResolveEnv<'a> {
    pub(crate) fn new(state: &'a InteractiveState, host: &'a dyn Host) -> Self {
        let probe = state.probe(host);

        ResolveEnv { state, host, probe }
    }

    fn default_motion_legal(&self, key: &KeyChord) -> bool {
        if self.state.pending.is_none() {
            return false;
        }

        match &self.state.last {
            Some(last) => {
                let legal = last.left_pending && last.key == *key;

                trace!(
                    target: "modalops::state",
                    key = %key,
                    last_key = %last.key,
                    last_command = %last.command,
                    legal,
                    "default_motion"
                );

                legal
            },
            None => false,
        }
    }
}

impl<'a> BindingEnv<KeyChord> for ResolveEnv<'a> {
    type Probe = StateProbe;

    fn context_holds(&self, context: &str) -> bool {
        self.host.in_context(context)
    }

    fn class_legal(&self, class: StateClass, key: &KeyChord) -> bool {
        let selection = self.probe.selection_active;
        let pending = self.state.pending.is_some();

        match class {
            StateClass::Action => !selection && !pending,
            StateClass::Operator => selection || !pending,
            StateClass::DefaultMotion => self.default_motion_legal(key),
            StateClass::TextObject => selection || pending,
            StateClass::Motion => true,
        }
    }

    fn probe(&self) -> &StateProbe {
        &self.probe
    }
}
