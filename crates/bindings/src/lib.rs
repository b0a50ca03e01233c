//! # modalops-bindings
//!
//! ## Overview
//!
//! This crate provides an environment-agnostic table of conditional keybindings for modal input.
//!
//! A [BindingTable] maps a (mode, key) pair onto a short list of [Binding]s. Each binding is
//! guarded by two predicates:
//!
//! * A [Context], which is either a named context that the consumer decides is active or not
//!   (for example, the kind of document being edited), or the sentinel [Context::Always].
//! * A [StatePredicate], which is either one of the fixed [StateClass] legality checks, an
//!   arbitrary named [Predicate] over a consumer-provided probe value, or [StatePredicate::Always].
//!
//! The list for each (mode, key) pair is kept in a fixed total order, so that resolving a key
//! always tries context-specific bindings before generic ones, and plain actions before operators
//! before motions. [BindingTable::resolve] returns the first binding whose predicates both hold.
//!
//! Consumers describe the current state of the world by implementing [BindingEnv].
//!
//! ## Example
//!
//! ```
//! use modalops_bindings::{BindingEnv, BindingTable, Context, StateClass, StatePredicate};
//!
//! struct Env {
//!     pending: bool,
//! }
//!
//! impl BindingEnv<char> for Env {
//!     type Probe = ();
//!
//!     fn context_holds(&self, context: &str) -> bool {
//!         context == "text"
//!     }
//!
//!     fn class_legal(&self, class: StateClass, _: &char) -> bool {
//!         match class {
//!             StateClass::Action => !self.pending,
//!             StateClass::Operator => !self.pending,
//!             StateClass::DefaultMotion => false,
//!             StateClass::TextObject => self.pending,
//!             StateClass::Motion => true,
//!         }
//!     }
//!
//!     fn probe(&self) -> &() {
//!         &()
//!     }
//! }
//!
//! let mut table = BindingTable::<&str, char, &str, ()>::new();
//! let op = StatePredicate::Class(StateClass::Operator);
//! let mv = StatePredicate::Class(StateClass::Motion);
//!
//! table.define("normal", 'w', Context::Always, mv, Some("forward-word")).unwrap();
//! table.define("normal", 'w', Context::Always, op, Some("kill-word")).unwrap();
//!
//! // With nothing pending, the operator wins.
//! let env = Env { pending: false };
//! assert_eq!(table.resolve(&"normal", &'w', &env).map(|b| *b.command()), Some("kill-word"));
//!
//! // Once something is pending, only the motion is legal.
//! let env = Env { pending: true };
//! assert_eq!(table.resolve(&"normal", &'w', &env).map(|b| *b.command()), Some("forward-word"));
//! ```

// Require docs for public APIs, and disable the more annoying clippy lints.
#![deny(missing_docs)]
#![allow(clippy::bool_to_int_with_if)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::match_like_matches_macro)]
#![allow(clippy::needless_return)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::Arc;

use tracing::trace;

/// Trait for keys that can be used with a [BindingTable].
pub trait InputKey: Clone + Debug + Hash + Eq {
    /// The error type returned when parsing a macro string fails.
    type Error;

    /// Parse a string representing a series of keypresses.
    fn from_macro_str(mstr: &str) -> Result<Vec<Self>, Self::Error>;

    /// Return this key's representation as a single, printable codepoint, if it exists.
    fn get_char(&self) -> Option<char>;
}

impl InputKey for char {
    type Error = std::convert::Infallible;

    fn from_macro_str(mstr: &str) -> Result<Vec<Self>, Self::Error> {
        Ok(mstr.chars().collect())
    }

    fn get_char(&self) -> Option<char> {
        Some(*self)
    }
}

/// Errors returned when a binding is malformed.
///
/// When one of these is returned, the table has not been modified.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum BindingError {
    /// A named [Context] was given an empty name.
    #[error("Context name cannot be empty")]
    EmptyContext,

    /// A custom [Predicate] was given an empty name.
    #[error("Predicate name cannot be empty")]
    EmptyPredicateName,
}

/// The context axis of a [Binding].
///
/// Named contexts sort alphabetically, and all of them sort before [Context::Always], so that
/// bindings specific to some context are tried before the generic ones.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum Context {
    /// Holds when the consumer reports that the named context is active.
    Named(String),

    /// Always holds.
    #[default]
    Always,
}

impl Context {
    /// Create a new named context.
    pub fn named<T: Into<String>>(name: T) -> Self {
        Context::Named(name.into())
    }

    fn holds<K, E: BindingEnv<K> + ?Sized>(&self, env: &E) -> bool {
        match self {
            Context::Named(name) => env.context_holds(name),
            Context::Always => true,
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Named(name) => write!(f, "{name}"),
            Context::Always => write!(f, "always"),
        }
    }
}

/// The fixed legality classes that a [StatePredicate] can refer to.
///
/// The declaration order is the priority order used when sorting bindings: an action is tried
/// before an operator, which is tried before the motions.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum StateClass {
    /// Legal when nothing is selected, and no operator is pending.
    Action,

    /// Legal when something is selected, or when no operator is pending yet.
    Operator,

    /// Legal when the same key just left an operator pending.
    DefaultMotion,

    /// Legal when something is selected, or when an operator is pending.
    TextObject,

    /// Always legal.
    Motion,
}

impl StateClass {
    /// All classes, in priority order.
    pub const ALL: [StateClass; 5] = [
        StateClass::Action,
        StateClass::Operator,
        StateClass::DefaultMotion,
        StateClass::TextObject,
        StateClass::Motion,
    ];

    /// A short, human-readable name for this class.
    pub fn name(&self) -> &'static str {
        match self {
            StateClass::Action => "action",
            StateClass::Operator => "operator",
            StateClass::DefaultMotion => "default-motion",
            StateClass::TextObject => "text-object",
            StateClass::Motion => "motion",
        }
    }
}

/// An arbitrary, named test over a probe value of type `P`.
///
/// The name is the predicate's identity: two predicates with the same name are considered the
/// same predicate when bindings get compared and replaced.
pub struct Predicate<P: ?Sized> {
    name: String,
    test: Arc<dyn Fn(&P) -> bool>,
}

impl<P: ?Sized> Predicate<P> {
    /// Create a new predicate.
    pub fn new<T, F>(name: T, test: F) -> Self
    where
        T: Into<String>,
        F: Fn(&P) -> bool + 'static,
    {
        Predicate { name: name.into(), test: Arc::new(test) }
    }

    /// The name identifying this predicate.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Run this predicate against a probe value.
    pub fn test(&self, probe: &P) -> bool {
        (self.test)(probe)
    }
}

impl<P: ?Sized> Clone for Predicate<P> {
    fn clone(&self) -> Self {
        Predicate { name: self.name.clone(), test: self.test.clone() }
    }
}

impl<P: ?Sized> Debug for Predicate<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

impl<P: ?Sized> PartialEq for Predicate<P> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<P: ?Sized> Eq for Predicate<P> {}

/// The state axis of a [Binding].
pub enum StatePredicate<P: ?Sized> {
    /// One of the fixed legality classes.
    Class(StateClass),

    /// An arbitrary named predicate.
    Custom(Predicate<P>),

    /// Always holds.
    Always,
}

impl<P: ?Sized> StatePredicate<P> {
    /// Create a new [StatePredicate::Custom].
    pub fn custom<T, F>(name: T, test: F) -> Self
    where
        T: Into<String>,
        F: Fn(&P) -> bool + 'static,
    {
        StatePredicate::Custom(Predicate::new(name, test))
    }

    /// Returns the fixed class this predicate refers to, if it is one.
    pub fn class(&self) -> Option<StateClass> {
        match self {
            StatePredicate::Class(c) => Some(*c),
            _ => None,
        }
    }

    /// Position in the priority list. Custom predicates share the catch-all tier.
    fn rank(&self) -> usize {
        match self {
            StatePredicate::Class(c) => *c as usize,
            StatePredicate::Custom(_) | StatePredicate::Always => StateClass::ALL.len(),
        }
    }

    fn holds<K, E>(&self, env: &E, key: &K) -> bool
    where
        E: BindingEnv<K, Probe = P> + ?Sized,
    {
        match self {
            StatePredicate::Class(c) => env.class_legal(*c, key),
            StatePredicate::Custom(p) => p.test(env.probe()),
            StatePredicate::Always => true,
        }
    }
}

impl<P: ?Sized> Default for StatePredicate<P> {
    fn default() -> Self {
        StatePredicate::Always
    }
}

impl<P: ?Sized> Clone for StatePredicate<P> {
    fn clone(&self) -> Self {
        match self {
            StatePredicate::Class(c) => StatePredicate::Class(*c),
            StatePredicate::Custom(p) => StatePredicate::Custom(p.clone()),
            StatePredicate::Always => StatePredicate::Always,
        }
    }
}

impl<P: ?Sized> Debug for StatePredicate<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatePredicate::Class(c) => f.debug_tuple("Class").field(c).finish(),
            StatePredicate::Custom(p) => f.debug_tuple("Custom").field(&p.name).finish(),
            StatePredicate::Always => write!(f, "Always"),
        }
    }
}

impl<P: ?Sized> fmt::Display for StatePredicate<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatePredicate::Class(c) => write!(f, "{}", c.name()),
            StatePredicate::Custom(p) => write!(f, "{}", p.name),
            StatePredicate::Always => write!(f, "always"),
        }
    }
}

impl<P: ?Sized> PartialEq for StatePredicate<P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<P: ?Sized> Eq for StatePredicate<P> {}

impl<P: ?Sized> PartialOrd for StatePredicate<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: ?Sized> Ord for StatePredicate<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.rank().cmp(&other.rank()) {
            Ordering::Equal => {},
            ord => return ord,
        }

        match (self, other) {
            (StatePredicate::Class(a), StatePredicate::Class(b)) => a.cmp(b),
            (StatePredicate::Custom(a), StatePredicate::Custom(b)) => a.name.cmp(&b.name),
            (StatePredicate::Custom(_), StatePredicate::Always) => Ordering::Less,
            (StatePredicate::Always, StatePredicate::Custom(_)) => Ordering::Greater,
            (StatePredicate::Always, StatePredicate::Always) => Ordering::Equal,

            // Classes never share a rank with the other variants.
            (StatePredicate::Class(_), _) => Ordering::Less,
            (_, StatePredicate::Class(_)) => Ordering::Greater,
        }
    }
}

/// Trait for describing the current state of the world to a [BindingTable].
pub trait BindingEnv<Key> {
    /// The value handed to [Predicate]s.
    type Probe: ?Sized;

    /// Whether the named context is currently active.
    fn context_holds(&self, context: &str) -> bool;

    /// Whether commands of the given class may currently run for `key`.
    fn class_legal(&self, class: StateClass, key: &Key) -> bool;

    /// The value that custom [Predicate]s get evaluated against.
    fn probe(&self) -> &Self::Probe;
}

/// A conditional rule attached to a (mode, key) pair.
pub struct Binding<C, P: ?Sized> {
    context: Context,
    state: StatePredicate<P>,
    command: C,
}

impl<C, P: ?Sized> Binding<C, P> {
    /// The context under which this binding applies.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The state under which this binding applies.
    pub fn state(&self) -> &StatePredicate<P> {
        &self.state
    }

    /// The command this binding runs.
    pub fn command(&self) -> &C {
        &self.command
    }

    /// Whether both of this binding's predicates currently hold.
    pub fn holds<K, E>(&self, env: &E, key: &K) -> bool
    where
        E: BindingEnv<K, Probe = P> + ?Sized,
    {
        self.context.holds::<K, E>(env) && self.state.holds(env, key)
    }

    fn same_guards(&self, context: &Context, state: &StatePredicate<P>) -> bool {
        self.context == *context && self.state == *state
    }

    fn order(&self, other: &Self) -> Ordering {
        self.context.cmp(&other.context).then_with(|| self.state.cmp(&other.state))
    }
}

impl<C: Clone, P: ?Sized> Clone for Binding<C, P> {
    fn clone(&self) -> Self {
        Binding {
            context: self.context.clone(),
            state: self.state.clone(),
            command: self.command.clone(),
        }
    }
}

impl<C: Debug, P: ?Sized> Debug for Binding<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("context", &self.context)
            .field("state", &self.state)
            .field("command", &self.command)
            .finish()
    }
}

fn validate<P: ?Sized>(context: &Context, state: &StatePredicate<P>) -> Result<(), BindingError> {
    if let Context::Named(name) = context {
        if name.is_empty() {
            return Err(BindingError::EmptyContext);
        }
    }

    if let StatePredicate::Custom(p) = state {
        if p.name.is_empty() {
            return Err(BindingError::EmptyPredicateName);
        }
    }

    return Ok(());
}

/// Ordered lists of conditional [Binding]s for each (mode, key) pair.
///
/// The lists are kept sorted by:
///
/// 1. [Context], with named contexts in alphabetical order before [Context::Always].
/// 2. [StatePredicate], ranked as [StateClass::Action], [StateClass::Operator],
///    [StateClass::DefaultMotion], [StateClass::TextObject], [StateClass::Motion], and then the
///    custom and always-true predicates.
/// 3. Custom predicates before [StatePredicate::Always], and by name amongst themselves.
///
/// A (context, state) pair appears at most once per (mode, key) pair, so the order is total.
pub struct BindingTable<M, Key, C, P: ?Sized> {
    maps: HashMap<M, HashMap<Key, Vec<Binding<C, P>>>>,
}

impl<M, Key, C, P> BindingTable<M, Key, C, P>
where
    M: Clone + Debug + Hash + Eq,
    Key: InputKey,
    P: ?Sized,
{
    /// Create a new, empty table.
    pub fn new() -> Self {
        BindingTable { maps: HashMap::new() }
    }

    /// Insert, replace or remove a binding.
    ///
    /// If a binding with the same (mode, key, context, state) already exists, it gets replaced.
    /// If `command` is [None], the matching binding is removed instead. The previously bound
    /// command, if there was one, is returned.
    pub fn define(
        &mut self,
        mode: M,
        key: Key,
        context: Context,
        state: StatePredicate<P>,
        command: Option<C>,
    ) -> Result<Option<C>, BindingError> {
        validate(&context, &state)?;

        let Some(command) = command else {
            return Ok(self.remove(&mode, &key, &context, &state));
        };

        let list = self.maps.entry(mode).or_default().entry(key).or_default();
        let prev = match list.iter().position(|b| b.same_guards(&context, &state)) {
            Some(idx) => Some(std::mem::replace(&mut list[idx].command, command)),
            None => {
                list.push(Binding { context, state, command });
                None
            },
        };

        list.sort_by(Binding::order);

        return Ok(prev);
    }

    fn remove(
        &mut self,
        mode: &M,
        key: &Key,
        context: &Context,
        state: &StatePredicate<P>,
    ) -> Option<C> {
        let keys = self.maps.get_mut(mode)?;
        let list = keys.get_mut(key)?;
        let idx = list.iter().position(|b| b.same_guards(context, state))?;
        let removed = list.remove(idx);

        if list.is_empty() {
            keys.remove(key);
        } else {
            list.sort_by(Binding::order);
        }

        return Some(removed.command);
    }

    /// Returns the sorted bindings for a (mode, key) pair.
    pub fn bindings(&self, mode: &M, key: &Key) -> &[Binding<C, P>] {
        self.maps
            .get(mode)
            .and_then(|keys| keys.get(key))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterate over the keys that have bindings in a mode.
    pub fn keys(&self, mode: &M) -> impl Iterator<Item = &Key> {
        self.maps.get(mode).into_iter().flat_map(|keys| keys.keys())
    }

    /// The total number of bindings across all modes and keys.
    pub fn len(&self) -> usize {
        self.maps.values().flat_map(HashMap::values).map(Vec::len).sum()
    }

    /// Returns the first binding for (mode, key) whose predicates hold.
    pub fn resolve<E>(&self, mode: &M, key: &Key, env: &E) -> Option<&Binding<C, P>>
    where
        E: BindingEnv<Key, Probe = P> + ?Sized,
    {
        self.resolve_with(mode, key, env, |_| true)
    }

    /// Returns the first binding for (mode, key) whose predicates hold, and whose command is also
    /// accepted by `filter`.
    pub fn resolve_with<E, F>(
        &self,
        mode: &M,
        key: &Key,
        env: &E,
        filter: F,
    ) -> Option<&Binding<C, P>>
    where
        E: BindingEnv<Key, Probe = P> + ?Sized,
        F: Fn(&C) -> bool,
    {
        for (idx, binding) in self.bindings(mode, key).iter().enumerate() {
            let holds = binding.holds(env, key) && filter(&binding.command);

            trace!(
                target: "modalops_bindings::resolve",
                mode = ?mode,
                key = ?key,
                idx,
                context = %binding.context,
                state = %binding.state,
                holds,
                "candidate"
            );

            if holds {
                return Some(binding);
            }
        }

        return None;
    }
}

impl<M, Key, C, P: ?Sized> Default for BindingTable<M, Key, C, P> {
    fn default() -> Self {
        BindingTable { maps: HashMap::new() }
    }
}
