//! # Lifecycle hooks
//!
//! ## Overview
//!
//! Hooks let a host observe the transitions of the interactive state machine, usually to give
//! the user some feedback (restyling the cursor, updating a status line). They are purely
//! observational: they receive a [HookEvent] by reference, and can't change how a key resolves.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use modalops::hooks::{HookEvent, HookMask, Hooks};
//!
//! let seen = Rc::new(Cell::new(0));
//! let counter = seen.clone();
//!
//! let mut hooks = Hooks::default();
//! hooks.add(HookMask::PENDING_ENTER | HookMask::PENDING_LEAVE, move |_| {
//!     counter.set(counter.get() + 1);
//! });
//!
//! hooks.fire(&HookEvent::PendingEnter { operator: "kill" });
//! hooks.fire(&HookEvent::Finalize);
//! hooks.fire(&HookEvent::PendingLeave { operator: "kill" });
//!
//! assert_eq!(seen.get(), 2);
//! ```
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::errors::DispatchError;
use crate::mode::ModeId;

bitflags! {
    /// Which [HookEvent]s a hook wants to receive.
    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    pub struct HookMask: u32 {
        /// An operator started waiting for a motion.
        const PENDING_ENTER = 0b00000001;

        /// A pending operator was resolved or aborted.
        const PENDING_LEAVE = 0b00000010;

        /// A different mode was activated.
        const MODE_CHANGE = 0b00000100;

        /// The interactive state was finalized.
        const FINALIZE = 0b00001000;

        /// A dispatch failed.
        const FAILURE = 0b00010000;
    }
}

/// A transition of the interactive state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HookEvent<'a> {
    /// An operator is now pending.
    PendingEnter {
        /// Name of the pending operator.
        operator: &'a str,
    },

    /// The pending operator is no longer pending.
    PendingLeave {
        /// Name of the operator that was pending.
        operator: &'a str,
    },

    /// The active mode changed.
    ModeChange {
        /// The previously active mode.
        from: Option<&'a ModeId>,

        /// The newly active mode.
        to: &'a ModeId,
    },

    /// Scope, argument, pending operator and transient modes were all reset.
    Finalize,

    /// A key or command failed.
    Failure(&'a DispatchError),
}

impl<'a> HookEvent<'a> {
    /// The mask bit that selects this event.
    pub fn mask(&self) -> HookMask {
        match self {
            HookEvent::PendingEnter { .. } => HookMask::PENDING_ENTER,
            HookEvent::PendingLeave { .. } => HookMask::PENDING_LEAVE,
            HookEvent::ModeChange { .. } => HookMask::MODE_CHANGE,
            HookEvent::Finalize => HookMask::FINALIZE,
            HookEvent::Failure(_) => HookMask::FAILURE,
        }
    }
}

/// A callback that observes [HookEvent]s.
pub type HookFn = dyn Fn(&HookEvent<'_>);

/// The registered hooks, in registration order.
#[derive(Clone, Default)]
pub struct Hooks {
    hooks: Vec<(HookMask, Arc<HookFn>)>,
}

impl Hooks {
    /// Subscribe to every event selected by `mask`.
    pub fn add<F>(&mut self, mask: HookMask, f: F)
    where
        F: Fn(&HookEvent<'_>) + 'static,
    {
        self.hooks.push((mask, Arc::new(f)));
    }

    /// Run every hook subscribed to this event.
    pub fn fire(&self, event: &HookEvent<'_>) {
        let mask = event.mask();

        for (_, f) in self.hooks.iter().filter(|(m, _)| m.intersects(mask)) {
            f(event);
        }
    }

    /// The number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masks = self.hooks.iter().map(|(m, _)| m).collect::<Vec<_>>();

        f.debug_struct("Hooks").field("hooks", &masks).finish()
    }
}
