//! Language-level conditions.
//!
//! Conditions are the catchable errors of the language. Inside the runtime
//! they travel as ordinary `Err` values; the evaluator unwinds until a
//! handler or the top of the activity is reached. Fatal states (allocation
//! failure, violated stack invariants) are not conditions and abort instead.

use bitflags::bitflags;
use common::atom::{Atom, Atoms};

pub type Result<T> = std::result::Result<T, Condition>;

bitflags! {
    /// Which condition categories the current execution context traps.
    ///
    /// Mirrors the SIGNAL ON / CALL ON state of the language; an untrapped
    /// condition unwinds the whole activity.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct TrapMask: u8 {
        const SYNTAX = 0b0000_0001;
        const NOVALUE = 0b0000_0010;
        const HALT = 0b0000_0100;
        const NOTREADY = 0b0000_1000;
        const LOSTDIGITS = 0b0001_0000;
    }
}

/// A raised condition.
///
/// Argument positions are 1-based and count left to right, the way the
/// caller wrote the call, not the way the stack stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    TooFewArgs {
        routine: Atom,
        min: usize,
    },
    TooManyArgs {
        routine: Atom,
        max: usize,
    },
    MissingArg {
        routine: Atom,
        position: usize,
    },
    NotWholeNumber {
        routine: Atom,
        position: usize,
        value: String,
    },
    NoString {
        value: String,
    },
}

impl Condition {
    /// The trap category this condition raises under. Argument errors are
    /// all syntax errors to the language.
    pub fn trap(&self) -> TrapMask {
        TrapMask::SYNTAX
    }

    /// Render the user-visible message text.
    pub fn message(&self, atoms: &Atoms) -> String {
        match self {
            Condition::TooFewArgs { routine, min } => format!(
                "Too few arguments in invocation of {}; minimum expected is {}",
                atoms.lookup(*routine),
                min
            ),
            Condition::TooManyArgs { routine, max } => format!(
                "Too many arguments in invocation of {}; maximum expected is {}",
                atoms.lookup(*routine),
                max
            ),
            Condition::MissingArg { routine, position } => format!(
                "Missing argument in invocation of {}; argument {} is required",
                atoms.lookup(*routine),
                position
            ),
            Condition::NotWholeNumber {
                routine,
                position,
                value,
            } => format!(
                "Invocation of {} argument {} must be a whole number; found \"{}\"",
                atoms.lookup(*routine),
                position,
                value
            ),
            Condition::NoString { value } => {
                format!("The value \"{}\" has no string value", value)
            }
        }
    }
}
