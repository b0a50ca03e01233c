//! # Dispatch configuration
//!
//! ## Overview
//!
//! Runtime options that change how a [Dispatcher](crate::dispatch::Dispatcher) behaves.
use crate::mode::CursorStyle;

/// What happens when the scope is increased past [Scope::Around](crate::state::Scope::Around).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ScopeCycle {
    /// Stay at the widest scope.
    #[default]
    Saturate,

    /// Go back to having no scope.
    Wrap,
}

/// Options for dispatching keys.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DispatchConfig {
    pub(crate) scope_cycle: ScopeCycle,
    pub(crate) pending_cursor: Option<CursorStyle>,
    pub(crate) universal_base: i64,
    pub(crate) notify_on_failure: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            scope_cycle: ScopeCycle::Saturate,
            pending_cursor: Some(CursorStyle::Underline),
            universal_base: 4,
            notify_on_failure: true,
        }
    }
}

impl DispatchConfig {
    /// How increasing the scope behaves once it's at its widest.
    pub fn get_scope_cycle(&self) -> ScopeCycle {
        self.scope_cycle
    }

    /// The cursor style to show while an operator is pending.
    pub fn get_pending_cursor(&self) -> Option<CursorStyle> {
        self.pending_cursor
    }

    /// The multiplier applied each time the universal argument is repeated.
    pub fn get_universal_base(&self) -> i64 {
        self.universal_base
    }

    /// Whether failed dispatches get reported to the host.
    pub fn get_notify_on_failure(&self) -> bool {
        self.notify_on_failure
    }
}

/// Build a new [DispatchConfig].
#[derive(Default)]
pub struct DispatchConfigBuilder(DispatchConfig);

impl DispatchConfigBuilder {
    /// Finish building the [DispatchConfig].
    pub fn build(self) -> DispatchConfig {
        self.0
    }

    /// Set the [ScopeCycle].
    pub fn scope_cycle(mut self, v: ScopeCycle) -> Self {
        self.0.scope_cycle = v;
        self
    }

    /// Set the cursor style for when an operator is pending.
    pub fn pending_cursor(mut self, v: Option<CursorStyle>) -> Self {
        self.0.pending_cursor = v;
        self
    }

    /// Set the universal argument multiplier.
    pub fn universal_base(mut self, v: i64) -> Self {
        self.0.universal_base = v;
        self
    }

    /// Set whether failures get reported to the host.
    pub fn notify_on_failure(mut self, v: bool) -> Self {
        self.0.notify_on_failure = v;
        self
    }
}

impl From<DispatchConfig> for DispatchConfigBuilder {
    fn from(config: DispatchConfig) -> Self {
        DispatchConfigBuilder(config)
    }
}
