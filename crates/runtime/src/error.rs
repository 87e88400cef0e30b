//! Runtime errors, hand-rolled in the manner of the compiler crate's
//! `CodeGenError`: a plain enum, a `Display` impl that writes a human
//! diagnostic, and `std::error::Error` so it composes with `?` anywhere
//! a boxed error is expected. No `thiserror` — the corpus this interpreter
//! is grounded in doesn't reach for it for this class of error either.

use std::fmt;

use labyrinth_core::{Coordinate, ValueError};

/// Every runtime error is reported with the maiden position and the
/// instruction character that triggered it, per the fatal-error policy:
/// all runtime errors terminate the process with exit 1.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub position: Coordinate,
    pub instruction: char,
    pub kind: RuntimeErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    /// A cell character with no recognized meaning, including the NUL
    /// sentinel read when a maiden runs off the grid.
    UnknownInstruction,
    StackUnderflow,
    TypeError(ValueError),
    UnterminatedString,
    DivisionByZero,
    IndexOutOfBounds,
    /// `[`, `]`, `U`, `ord`, and `G`/`S` before they were given semantics.
    Unimplemented,
}

impl RuntimeError {
    pub fn new(position: Coordinate, instruction: char, kind: RuntimeErrorKind) -> Self {
        RuntimeError {
            position,
            instruction,
            kind,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at ({}, {}), instruction {:?}: {}",
            self.position.x, self.position.y, self.instruction, self.kind
        )
    }
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeErrorKind::UnknownInstruction => write!(f, "unknown function"),
            RuntimeErrorKind::StackUnderflow => write!(f, "stack underflow"),
            RuntimeErrorKind::TypeError(e) => write!(f, "type error: {e}"),
            RuntimeErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            RuntimeErrorKind::DivisionByZero => write!(f, "division by zero"),
            RuntimeErrorKind::IndexOutOfBounds => write!(f, "index out of bounds"),
            RuntimeErrorKind::Unimplemented => write!(f, "instruction is not implemented"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<ValueError> for RuntimeErrorKind {
    fn from(e: ValueError) -> Self {
        RuntimeErrorKind::TypeError(e)
    }
}
