//! Errors raised while decoding, translating and running programs.

use std::io;

use thiserror::Error;

use crate::ir::Operator;

/// Result type of the whole pipeline.
pub type Result<T> = std::result::Result<T, Error>;

/// Malformed source text.
#[derive(PartialEq, Eq, Debug, Error)]
pub enum DecodeError {
    /// The digits read do not name any operator.
    #[error("unknown operator code {0}")]
    UnknownOperator(u32),
    /// Source ended in the middle of an operator code.
    #[error("source ends inside an operator code")]
    TruncatedOperator,
    /// Source ended before an operand was complete.
    #[error("source ends inside the operand of {operator} ({remaining} digits missing)")]
    TruncatedOperand {
        /// The operator waiting for its operand.
        operator: Operator,
        /// Digits still expected.
        remaining: usize,
    },
}

/// Unbalanced conditional or loop markers.
#[derive(PartialEq, Eq, Debug, Error)]
pub enum StructureError {
    /// A closer with nothing open, or closing the other kind of block.
    #[error("invalid operator: {0}")]
    Unmatched(Operator),
    /// `BREAK` with no enclosing loop.
    #[error("BREAK outside of a loop")]
    BreakOutsideLoop,
    /// Blocks still open at the end of the program.
    #[error("{0} block(s) left open")]
    Unclosed(usize),
}

/// Runtime faults of the virtual machine.
#[derive(Debug, Error)]
pub enum MachineError {
    /// An operator needed more values than the stack holds.
    #[error("stack underflow: {operator} needs {needed} value(s), found {found}")]
    StackUnderflow {
        /// The faulting operator.
        operator: Operator,
        /// Required depth.
        needed: usize,
        /// Actual depth.
        found: usize,
    },
    /// Divide or remainder by zero.
    #[error("division by zero")]
    ZeroDivision,
    /// A variable was loaded before anything was stored there.
    #[error("variable {0} is not defined")]
    UndefinedVariable(u32),
    /// Integer input was not a non-negative 32-bit decimal number.
    #[error("invalid numeric input: {0:?}")]
    InvalidNumber(String),
    /// The popped value is not a Unicode scalar value.
    #[error("invalid character code {0}")]
    InvalidCharacter(u32),
    /// I/O error occurred.
    #[error("i/o error")]
    MachineIoError(#[from] io::Error),
}

/// Any failure of the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised by the digit decoder.
    #[error("decode error")]
    Decode(#[from] DecodeError),
    /// Raised while matching conditional and loop markers.
    #[error("structure error")]
    Structure(#[from] StructureError),
    /// Raised while running a program.
    #[error("runtime error")]
    Machine(#[from] MachineError),
    /// Raised by the source reader or the output sink.
    #[error(transparent)]
    Io(#[from] io::Error),
}
