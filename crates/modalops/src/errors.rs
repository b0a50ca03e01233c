//! # Error Types
//!
//! ## Overview
//!
//! This module contains the error types returned while registering modes and bindings, and while
//! dispatching keys.
use modalops_bindings::BindingError;

use crate::key::KeyError;

/// Errors returned by the host's editing shell.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum HostError {
    /// A host command ran, but failed.
    #[error("Command failed: {0}")]
    Failed(String),

    /// The host doesn't know a command by this name.
    #[error("Unknown host command: {0}")]
    UnknownCommand(String),
}

/// Errors related to defining and activating modes.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ModeError {
    /// No mode is registered under this identifier or alias.
    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    /// A mode with this identifier has already been registered.
    #[error("Mode already defined: {0}")]
    DuplicateMode(String),

    /// Another mode is already using this alias.
    #[error("Mode alias already in use: {0}")]
    DuplicateAlias(String),

    /// The operation requires an active mode, but there isn't one.
    #[error("No mode is currently active")]
    NoActiveMode,

    /// The mode doesn't support transient activation.
    #[error("Mode cannot be activated transiently: {0}")]
    NotTransient(String),

    /// The host's start entry point didn't activate a registered mode.
    #[error("Modal editing was not started: no mode was activated")]
    NotStarted,
}

/// Errors returned when a binding is registered with a malformed mode, command or state.
///
/// When one of these is returned, the binding table has not been modified.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum BindingSpecError {
    /// The binding refers to a mode that hasn't been defined.
    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    /// The command's category can't run under the requested state predicate.
    #[error("Command {command:?} cannot be bound as {state}")]
    IncompatibleState {
        /// Name of the rejected command.
        command: String,
        /// The requested state predicate.
        state: String,
    },

    /// The command has no name.
    #[error("Command name cannot be empty")]
    EmptyCommandName,

    /// No command is registered under the name given for the binding.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The binding's predicates are malformed.
    #[error("Invalid binding: {0}")]
    Table(#[from] BindingError),

    /// The binding's key couldn't be parsed.
    #[error("Invalid key: {0}")]
    Key(#[from] KeyError),
}

/// Failures that can happen while dispatching a key or running a command.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum DispatchError {
    /// No binding matched the key in the current state.
    #[error("{0} is undefined")]
    Unbound(String),

    /// An operator was invoked while another one was already waiting for a motion.
    #[error("Cannot run {0}: an operator is already pending")]
    OperatorAlreadyPending(String),

    /// An interactive prompt was cancelled.
    #[error("Quit")]
    Cancelled,

    /// No command is registered under this name.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The host failed while running a command body.
    #[error("{0}")]
    Host(#[from] HostError),

    /// A mode couldn't be activated.
    #[error("{0}")]
    Mode(#[from] ModeError),
}

/// Common result type for dispatching.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for command bodies.
pub type CommandResult = DispatchResult<()>;
