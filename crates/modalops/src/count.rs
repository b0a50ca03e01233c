//! # Numeric arguments
//!
//! ## Overview
//!
//! A numeric argument is a signed repeat count that the user types before a command. It arrives
//! in one of several raw shapes (see [RawArg]), and commands read it as a single canonical
//! integer.
//!
//! Reading the argument through [NumericArgument::take] consumes it, so that a second read during
//! the same command gets the default of `1`. [NumericArgument::is_given] only reports whether the
//! user typed something, and never consumes it.
use tracing::trace;

/// The loosely-typed shapes that a numeric argument can be entered as.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum RawArg {
    /// Nothing was entered.
    #[default]
    Absent,

    /// Only the negation marker was entered.
    Negate,

    /// A value produced by repeating the universal argument prefix.
    Wrapped(i64),

    /// An explicit integer.
    Int(i64),
}

impl RawArg {
    /// Convert this into the canonical signed count.
    ///
    /// ```
    /// use modalops::count::RawArg;
    ///
    /// assert_eq!(RawArg::Absent.normalize(), 1);
    /// assert_eq!(RawArg::Negate.normalize(), -1);
    /// assert_eq!(RawArg::Wrapped(5).normalize(), 5);
    /// assert_eq!(RawArg::Int(7).normalize(), 7);
    /// ```
    pub fn normalize(&self) -> i64 {
        match self {
            RawArg::Absent => 1,
            RawArg::Negate => -1,
            RawArg::Wrapped(n) => *n,
            RawArg::Int(n) => *n,
        }
    }

    /// Whether this represents something the user explicitly entered.
    pub fn is_given(&self) -> bool {
        !matches!(self, RawArg::Absent)
    }
}

impl From<i64> for RawArg {
    fn from(n: i64) -> Self {
        RawArg::Int(n)
    }
}

impl From<Option<i64>> for RawArg {
    fn from(n: Option<i64>) -> Self {
        n.map(RawArg::Int).unwrap_or_default()
    }
}

/// The numeric argument currently being collected for a document.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NumericArgument {
    raw: RawArg,
}

impl NumericArgument {
    /// Replace the current value.
    pub fn set<T: Into<RawArg>>(&mut self, raw: T) {
        self.raw = raw.into();
    }

    /// The current raw value.
    pub fn raw(&self) -> RawArg {
        self.raw
    }

    /// Whether the user supplied a value. This doesn't consume it.
    pub fn is_given(&self) -> bool {
        self.raw.is_given()
    }

    /// Read the canonical value, and reset it to absent.
    pub fn take(&mut self) -> i64 {
        std::mem::take(&mut self.raw).normalize()
    }

    /// Read the canonical value without consuming it.
    pub fn peek(&self) -> i64 {
        self.raw.normalize()
    }

    /// Read the canonical value, consuming it only when asked to.
    pub fn get(&mut self, consume: bool) -> i64 {
        if consume {
            self.take()
        } else {
            self.peek()
        }
    }

    /// Forget any entered value.
    pub fn clear(&mut self) {
        self.raw = RawArg::Absent;
    }

    /// Consume the value, and bundle up what motions need to know about it.
    pub fn steps(&mut self) -> ArgSteps {
        let given = self.is_given();

        ArgSteps::new(given, self.take())
    }

    /// Append a decimal digit to the value being typed.
    ///
    /// Digits typed after the negation marker build a negative value. Digits typed after a
    /// universal prefix start a fresh value.
    pub fn push_digit(&mut self, digit: u8) {
        let d = i64::from(digit.min(9));

        self.raw = match self.raw {
            RawArg::Absent | RawArg::Wrapped(_) => RawArg::Int(d),

            // A leading zero can't carry the sign, so keep waiting for a real digit.
            RawArg::Negate if d == 0 => RawArg::Negate,
            RawArg::Negate => RawArg::Int(-d),
            RawArg::Int(n) => {
                let shifted = n.saturating_mul(10);
                let n = if n < 0 {
                    shifted.saturating_sub(d)
                } else {
                    shifted.saturating_add(d)
                };

                RawArg::Int(n)
            },
        };

        trace!(target: "modalops::state", raw = ?self.raw, digit, "numeric_digit");
    }

    /// Apply the negation marker.
    pub fn negate(&mut self) {
        self.raw = match self.raw {
            RawArg::Absent => RawArg::Negate,
            RawArg::Negate => RawArg::Absent,
            RawArg::Wrapped(n) | RawArg::Int(n) => RawArg::Int(n.saturating_neg()),
        };

        trace!(target: "modalops::state", raw = ?self.raw, "numeric_negate");
    }

    /// Apply the universal prefix, which multiplies the value by `base` each time it's repeated.
    pub fn universal(&mut self, base: i64) {
        self.raw = match self.raw {
            RawArg::Absent => RawArg::Wrapped(base),
            RawArg::Negate => RawArg::Wrapped(base.saturating_neg()),
            RawArg::Wrapped(n) => RawArg::Wrapped(n.saturating_mul(base)),

            // The prefix only terminates digit entry.
            RawArg::Int(n) => RawArg::Int(n),
        };

        trace!(target: "modalops::state", raw = ?self.raw, "numeric_universal");
    }
}

/// Everything a motion needs to honour a numeric argument in either direction.
///
/// A motion written for the forward case can support negative counts by moving
/// [ArgSteps::magnitude] times by [ArgSteps::step] instead of by a literal `1`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ArgSteps {
    /// Whether the user supplied the count.
    pub given: bool,

    /// The signed count.
    pub count: i64,

    /// The absolute value of the count.
    pub magnitude: u64,

    /// Whether the count moves forward.
    pub forward: bool,
}

impl ArgSteps {
    /// Derive the steps for a signed count.
    pub fn new(given: bool, count: i64) -> Self {
        ArgSteps { given, count, magnitude: count.unsigned_abs(), forward: count >= 0 }
    }

    /// A single unit in the direction of the count.
    pub fn step(&self) -> i64 {
        if self.forward {
            1
        } else {
            -1
        }
    }

    /// A single unit against the direction of the count.
    pub fn back(&self) -> i64 {
        -self.step()
    }

    /// Offset `pos` by one unit per repetition, clamping at zero.
    pub fn offset(&self, pos: usize) -> usize {
        let mag = usize::try_from(self.magnitude).unwrap_or(usize::MAX);

        if self.forward {
            pos.saturating_add(mag)
        } else {
            pos.saturating_sub(mag)
        }
    }
}

impl Default for ArgSteps {
    fn default() -> Self {
        ArgSteps::new(false, 1)
    }
}
