//! # Core commands
//!
//! ## Overview
//!
//! The handful of commands that every keymap needs, independent of what text operations the
//! host provides: quitting out of a half-typed command, collecting numeric arguments, widening
//! the scope, switching modes, and the motion that doesn't move.
//!
//! [Dispatcher::install_core_commands](crate::dispatch::Dispatcher::install_core_commands)
//! registers them under the names listed here, so that keymaps can bind them by name.
use super::{make_action, make_motion, make_prefix, Command};

/// Name of the command that abandons whatever was being typed.
pub const KEYBOARD_QUIT: &str = "keyboard-quit";

/// Name of the command that widens the scope.
pub const SCOPE_INCREASE: &str = "scope-increase";

/// Name of the command that applies the negation marker to the numeric argument.
pub const NEGATIVE_ARGUMENT: &str = "negative-argument";

/// Name of the command that applies the repeated multiplier to the numeric argument.
pub const UNIVERSAL_ARGUMENT: &str = "universal-argument";

/// Name of the motion that doesn't move.
pub const STAY: &str = "stay";

/// The name of the command that appends `digit` to the numeric argument.
pub fn digit_argument_name(digit: u8) -> String {
    format!("digit-argument-{digit}")
}

/// Deactivate the selection, and finalize.
pub fn keyboard_quit() -> Command {
    make_action(KEYBOARD_QUIT, |inv| {
        inv.host().deactivate_selection();

        Ok(())
    })
}

/// Widen the scope for the next text object.
pub fn scope_increase() -> Command {
    make_prefix(SCOPE_INCREASE, |inv| {
        inv.increase_scope();

        Ok(())
    })
}

/// Append `digit` to the numeric argument.
pub fn digit_argument(digit: u8) -> Command {
    make_prefix(digit_argument_name(digit), move |inv| {
        inv.numeric_mut().push_digit(digit);

        Ok(())
    })
}

/// Negate the numeric argument.
pub fn negative_argument() -> Command {
    make_prefix(NEGATIVE_ARGUMENT, |inv| {
        inv.numeric_mut().negate();

        Ok(())
    })
}

/// Multiply the numeric argument by the configured base.
pub fn universal_argument() -> Command {
    make_prefix(UNIVERSAL_ARGUMENT, |inv| {
        let base = inv.config().get_universal_base();

        inv.numeric_mut().universal(base);

        Ok(())
    })
}

/// A motion that leaves the cursor where it is.
///
/// Bound as a default motion under an operator's own key, this makes pressing the operator twice
/// run it over the zero-width span at the cursor, leaving the operator to decide what that means
/// (usually the current line).
pub fn stay() -> Command {
    make_motion(STAY, |_| Ok(()))
}

/// Build an action that switches to `mode`, dropping any transient activations.
pub fn make_mode_switch<N: Into<String>>(name: N, mode: &str) -> Command {
    let mode = mode.to_string();

    make_action(name, move |inv| inv.activate(&mode))
}

/// Build a prefix that switches to `mode` until the next time the state gets finalized.
pub fn make_transient_switch<N: Into<String>>(name: N, mode: &str) -> Command {
    let mode = mode.to_string();

    make_prefix(name, move |inv| inv.activate_transient(&mode))
}

/// Every core command.
pub fn core_commands() -> Vec<Command> {
    let mut cmds = vec![
        keyboard_quit(),
        scope_increase(),
        negative_argument(),
        universal_argument(),
        stay(),
    ];

    cmds.extend((0..=9).map(digit_argument));

    return cmds;
}
