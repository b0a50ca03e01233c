//! # modalops
//!
//! ## Overview
//!
//! This crate provides the dispatch and interaction state at the core of a modal text editing
//! interface: deciding which command a key runs, and tracking the state that lets an operator
//! (like delete) combine with a later motion or text object that tells it what span to act on.
//!
//! The main pieces are:
//!
//! - [dispatch::Dispatcher], which owns the modes, bindings and commands, and runs keys.
//! - [state::InteractiveState], the per-document state: the active mode, transient mode
//!   activations, the pending operator, the scope and the numeric argument.
//! - [command], the builders for actions, operators, motions and text objects.
//! - [host::Host], the trait that the embedding editor implements to expose its cursor,
//!   selection and commands.
//!
//! The conditional binding table itself lives in the [keybindings] crate, which is
//! re-exported here.
//!
//! ## Example
//!
//! The [dispatch] module documentation walks through binding an operator and a motion, and
//! running them against a small host.

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

#[cfg(test)]
#[macro_use]
mod util;

pub mod command;
pub mod config;
pub mod count;
pub mod dispatch;
pub mod errors;
pub mod hooks;
pub mod host;
pub mod key;
pub mod mode;
pub mod state;

pub use crossterm;
pub use modalops_bindings as keybindings;
