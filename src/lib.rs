/*! Interpreter and Lua translator for NumNum.

NumNum programs are written with decimal digits only. `numnum` decodes the
digits into instructions and hands them to a backend: the virtual machine in
[`machine`] runs them, the generator in [`syntax::lua`] turns them into Lua.

```rust
extern crate numnum;

use std::io::{self, Cursor};

use numnum::machine::Machine;

fn main() {
    // push 72, putc, push 105, putc
    let src = "0 1020 4\n0 1221 4\n";
    let mut buffer = Cursor::new(src.as_bytes());
    let mut machine = Machine::new(io::empty(), Vec::new());
    match numnum::compile(&mut buffer, &mut machine, false) {
        Err(e) => panic!("{}", e),
        _ => assert_eq!(machine.into_output(), b"Hi"),
    }
}
```
*/

#![crate_name = "numnum"]
#![crate_type = "rlib"]
#![warn(missing_docs)]

extern crate log;

use std::io::{stderr, BufRead, Write};

use log::info;

use crate::error::Result;
use crate::ir::Instruction;
use crate::syntax::{Decoder, Numnum};
use crate::translator::Translator;

/// Decodes `input` and drives `backend` with the result.
///
/// With `show_tokens` the decoded instructions are printed to stderr before
/// the backend sees any of them.
pub fn compile<B: BufRead, T: Translator + ?Sized>(
    input: &mut B,
    backend: &mut T,
    show_tokens: bool,
) -> Result<()> {
    let program = Numnum::new().decode(input)?;
    info!("decoded {} instructions", program.len());
    if show_tokens {
        writeln!(stderr().lock(), "{}", format_tokens(&program))?;
    }
    translator::translate(&program, backend)
}

/// Renders instructions as `[Token(...),Token(...)]`.
pub fn format_tokens(program: &[Instruction]) -> String {
    let tokens: Vec<String> = program.iter().map(|inst| inst.to_string()).collect();
    format!("[{}]", tokens.join(","))
}

pub mod bytecode;
pub mod error;
pub(crate) mod io;
pub mod ir;
pub mod machine;
pub mod syntax;
pub mod translator;
