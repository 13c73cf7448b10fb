//! Error kinds raised by command handlers, and the two ways a run can end.

use thiserror::Error;

/// One of the error kinds a command handler can raise.
///
/// These are caught by `@`/`$`/`&` the same way regardless of kind: the
/// dispatcher either teleports to the catch cell or terminates the run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AcetoError {
    /// An operation was applied to a value it has no defined behavior for.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Integer or float division by zero.
    #[error("division by zero")]
    DivideByZero,

    /// `F` indexed a string outside its bounds.
    #[error("index {index} out of range for string of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// A pattern passed to `/`, `%`, or `a` failed to compile as a regex.
    #[error("invalid regular expression: {0}")]
    RegexSyntax(String),

    /// Raised explicitly by `&`, or by `$` popping a falsy value.
    #[error("user-raised error")]
    UserRaised,

    /// A blocking read or write to the I/O adapter failed.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Why a run stopped short of running off the end of the Hilbert curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `X` was executed.
    Explicit,
    /// The walk advanced past either end of the curve.
    CurveExhausted,
}

/// An error that escaped every catch cell and terminated the run.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind} at ({x}, {y})")]
pub struct RunError {
    /// The error kind that was raised.
    pub kind: AcetoError,
    /// Grid column of the command that raised it.
    pub x: u32,
    /// Grid row of the command that raised it.
    pub y: u32,
}

/// Source-loading errors, reported with a distinct exit code from runtime errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// A `"` literal's closing quote lies past the end of the Hilbert curve.
    #[error("unterminated string literal starting at ({x}, {y})")]
    UnterminatedStringLiteral {
        /// Grid column of the opening quote.
        x: u32,
        /// Grid row of the opening quote.
        y: u32,
    },

    /// A `'` literal ran off the end of the curve before reading its character.
    #[error("unterminated character literal starting at ({x}, {y})")]
    UnterminatedCharLiteral {
        /// Grid column of the opening quote.
        x: u32,
        /// Grid row of the opening quote.
        y: u32,
    },
}
