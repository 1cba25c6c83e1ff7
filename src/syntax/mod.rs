//! Decoders, encoders and generators.

pub use self::lua::Lua;
pub use self::numnum::Numnum;

use std::io::{self, BufRead, Write};

use crate::error::Result;
use crate::ir::Instruction;

/// Convert from source code to instructions.
pub trait Decoder {
    /// Convert from source code to instructions.
    fn decode<B: BufRead>(&self, input: &mut B) -> Result<Vec<Instruction>>;
}

/// Generate source code from instructions.
pub trait Encoder {
    /// Generate source code from instructions.
    fn encode<W: Write>(&self, program: &[Instruction], output: &mut W) -> io::Result<()>;
}

pub mod lua;
pub mod numnum;
