//! Decoder and encoder for NumNum digit source.
//!
//! An operator is written as its digit code (any digits `5`-`9` followed by
//! one of `0`-`4`), followed by its operand, if any, as a fixed number of
//! base-4 digits, most significant first. Everything that is not a decimal
//! digit is ignored.

use std::io::{self, BufRead, ErrorKind, Write};

use crate::error::{DecodeError, Error, Result};
use crate::io::BufReadExt;
use crate::ir::{Instruction, Operator};
use crate::syntax::{Decoder, Encoder};

/// Longest run of prefix digits any operator code uses.
const MAX_PREFIX: usize = 2;

enum State {
    Code { code: u32, prefix: usize },
    Operand { operator: Operator, value: u32, remaining: usize },
}

/// An iterator that converts digits into instructions on each iteration.
pub struct Instructions<T> {
    digits: T,
    state: State,
}

impl<I: Iterator<Item = io::Result<u32>>> Instructions<I> {
    /// Create an iterator that converts digits into instructions.
    pub fn new(iter: I) -> Instructions<I> {
        Instructions {
            digits: iter,
            state: State::Code { code: 0, prefix: 0 },
        }
    }

    /// Feeds one digit, returning an instruction once one is complete.
    fn feed(&mut self, digit: u32) -> Result<Option<Instruction>> {
        match self.state {
            State::Code { code, prefix } => {
                let code = code * 10 + digit;
                if digit >= 5 {
                    if prefix == MAX_PREFIX {
                        return Err(DecodeError::UnknownOperator(code).into());
                    }
                    self.state = State::Code {
                        code,
                        prefix: prefix + 1,
                    };
                    return Ok(None);
                }
                let operator =
                    Operator::from_code(code).ok_or(DecodeError::UnknownOperator(code))?;
                self.state = State::Code { code: 0, prefix: 0 };
                match operator.operand_width() {
                    0 => Ok(Some(operator.into())),
                    width => {
                        self.state = State::Operand {
                            operator,
                            value: 0,
                            remaining: width,
                        };
                        Ok(None)
                    }
                }
            }
            State::Operand {
                operator,
                value,
                remaining,
            } => {
                let value = value.wrapping_mul(4).wrapping_add(digit);
                if remaining > 1 {
                    self.state = State::Operand {
                        operator,
                        value,
                        remaining: remaining - 1,
                    };
                    return Ok(None);
                }
                self.state = State::Code { code: 0, prefix: 0 };
                Ok(Some(Instruction::new(operator, value)))
            }
        }
    }

    fn finish(&self) -> Option<Error> {
        match self.state {
            State::Code { prefix: 0, .. } => None,
            State::Code { .. } => Some(DecodeError::TruncatedOperator.into()),
            State::Operand {
                operator,
                remaining,
                ..
            } => Some(
                DecodeError::TruncatedOperand {
                    operator,
                    remaining,
                }
                .into(),
            ),
        }
    }
}

impl<I: Iterator<Item = io::Result<u32>>> Iterator for Instructions<I> {
    type Item = Result<Instruction>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let digit = match self.digits.next() {
                Some(Ok(d)) => d,
                Some(Err(e)) => return Some(Err(e.into())),
                None => {
                    let err = self.finish()?;
                    self.state = State::Code { code: 0, prefix: 0 };
                    return Some(Err(err));
                }
            };
            match self.feed(digit) {
                Ok(Some(inst)) => return Some(Ok(inst)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

struct Digits<T> {
    lexemes: T,
}

impl<I: Iterator<Item = io::Result<char>>> Digits<I> {
    pub fn parse(self) -> Instructions<Digits<I>> {
        Instructions::new(self)
    }
}

impl<I: Iterator<Item = io::Result<char>>> Iterator for Digits<I> {
    type Item = io::Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(match self.lexemes.next()? {
            Ok(c) => c
                .to_digit(10)
                .ok_or_else(|| io::Error::new(ErrorKind::InvalidData, "not a digit")),
            Err(e) => Err(e),
        })
    }
}

struct Scan<'r, T> {
    buffer: &'r mut T,
}

impl<'r, B: BufRead> Scan<'r, B> {
    pub fn tokenize(self) -> Digits<Scan<'r, B>> {
        Digits { lexemes: self }
    }
}

impl<'r, B: BufRead> Iterator for Scan<'r, B> {
    type Item = io::Result<char>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            return match self.buffer.read_char() {
                Ok(Some(c)) if c.is_ascii_digit() => Some(Ok(c)),
                Ok(Some(_)) => continue,
                Ok(None) => None,
                Err(ref e) if e.kind() == ErrorKind::InvalidData => continue,
                Err(e) => Some(Err(e)),
            };
        }
    }
}

fn scan<B: BufRead>(buffer: &mut B) -> Scan<'_, B> {
    Scan { buffer }
}

/// Writes `value` as `width` base-4 digits.
fn write_operand<W: Write>(output: &mut W, value: u32, width: usize) -> io::Result<()> {
    if width < 16 && value >> (2 * width) != 0 {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("{} does not fit in {} base-4 digits", value, width),
        ));
    }
    for shift in (0..width).rev() {
        write!(output, "{}", (value >> (2 * shift)) & 0b11)?;
    }
    Ok(())
}

/// Decoder and encoder for NumNum.
#[derive(Default)]
pub struct Numnum;

impl Numnum {
    /// Create a new `Numnum`.
    pub fn new() -> Numnum {
        Numnum
    }

    /// Returns an iterator over the instructions of `input`.
    pub fn instructions<'r, B: BufRead>(
        &self,
        input: &'r mut B,
    ) -> impl Iterator<Item = Result<Instruction>> + 'r {
        scan(input).tokenize().parse()
    }
}

impl Decoder for Numnum {
    fn decode<B: BufRead>(&self, input: &mut B) -> Result<Vec<Instruction>> {
        scan(input).tokenize().parse().collect()
    }
}

impl Encoder for Numnum {
    fn encode<W: Write>(&self, program: &[Instruction], output: &mut W) -> io::Result<()> {
        for inst in program {
            write!(output, "{}", inst.operator.code())?;
            let width = inst.operator.operand_width();
            if width > 0 {
                write!(output, " ")?;
                write_operand(output, inst.value, width)?;
            }
            writeln!(output)?;
        }
        Ok(())
    }
}
