//! Runtime instruction lists with resolved jump targets.

use std::mem;

use log::debug;

use crate::error::StructureError;
use crate::ir::{self, Instruction, Operator};

/// An instruction ready to execute.
///
/// `jump` is only meaningful for structural operators and `BREAK`:
///
/// * `IF_NOT_ZERO` / `IF_ZERO`: position of the matching `END_IF`.
/// * `WHILE_NOT_ZERO`: position of the matching `END_WHILE`.
/// * `END_WHILE`: position of the matching `WHILE_NOT_ZERO`.
/// * `BREAK`: position of the enclosing `END_WHILE`.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Code {
    /// The decoded instruction.
    pub inst: Instruction,
    /// Resolved jump target.
    pub jump: usize,
}

impl Code {
    fn new(inst: Instruction) -> Code {
        Code { inst, jump: 0 }
    }
}

/// A complete runtime instruction list.
pub type ByteCode = Vec<Code>;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub(crate) enum Block {
    Conditional,
    Loop,
}

/// An open block waiting for its closer.
#[derive(Debug)]
struct Backpatch {
    kind: Block,
    position: usize,
    breaks: Vec<usize>,
}

/// Builds a [`ByteCode`], backpatching jumps as blocks close.
#[derive(Default, Debug)]
pub struct Assembler {
    codes: ByteCode,
    control: Vec<Backpatch>,
}

impl Assembler {
    /// Creates an empty `Assembler`.
    pub fn new() -> Assembler {
        Assembler::default()
    }

    /// Appends a non-structural instruction.
    pub fn push(&mut self, inst: Instruction) {
        self.codes.push(Code::new(inst));
    }

    /// Opens a conditional block (`IF_NOT_ZERO` or `IF_ZERO`).
    pub fn open_if(&mut self, op: Operator) {
        self.open(Block::Conditional, op);
    }

    /// Closes the innermost conditional block.
    pub fn close_if(&mut self) -> Result<(), StructureError> {
        let opener = self.close(Block::Conditional, ir::EndIf)?;
        let here = self.codes.len();
        self.codes[opener.position].jump = here;
        self.push(ir::EndIf.into());
        Ok(())
    }

    /// Opens a loop block.
    pub fn open_while(&mut self) {
        self.open(Block::Loop, ir::WhileNotZero);
        let here = self.codes.len() - 1;
        self.codes[here].jump = here;
    }

    /// Closes the innermost loop block.
    pub fn close_while(&mut self) -> Result<(), StructureError> {
        let opener = self.close(Block::Loop, ir::EndWhile)?;
        let here = self.codes.len();
        let start = self.codes[opener.position].jump;
        self.codes[opener.position].jump = here;
        for position in opener.breaks {
            self.codes[position].jump = here;
        }
        self.codes.push(Code {
            inst: ir::EndWhile.into(),
            jump: start,
        });
        Ok(())
    }

    /// Appends a `BREAK` leaving the innermost loop.
    pub fn brk(&mut self) -> Result<(), StructureError> {
        let here = self.codes.len();
        match self.control.iter_mut().rev().find(|b| b.kind == Block::Loop) {
            Some(record) => {
                record.breaks.push(here);
                self.push(ir::Break.into());
                Ok(())
            }
            None => Err(StructureError::BreakOutsideLoop),
        }
    }

    /// Returns the finished list, failing if any block is still open.
    pub fn finish(&mut self) -> Result<ByteCode, StructureError> {
        if !self.control.is_empty() {
            return Err(StructureError::Unclosed(self.control.len()));
        }
        debug!("assembled {} codes", self.codes.len());
        Ok(mem::take(&mut self.codes))
    }

    fn open(&mut self, kind: Block, op: Operator) {
        self.control.push(Backpatch {
            kind,
            position: self.codes.len(),
            breaks: Vec::new(),
        });
        self.push(op.into());
    }

    fn close(&mut self, kind: Block, closer: Operator) -> Result<Backpatch, StructureError> {
        match self.control.pop() {
            Some(record) if record.kind == kind => Ok(record),
            _ => Err(StructureError::Unmatched(closer)),
        }
    }
}
