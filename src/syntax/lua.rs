//! Generator for Lua 5.3.
//!
//! The generated program keeps the evaluation stack in the table `stack`,
//! variables in the table `variables`, and uses `temporary` as scratch space
//! for binary operators.

use std::fmt::Display;
use std::io::Write;

use log::debug;

use crate::bytecode::Block;
use crate::error::{Result, StructureError};
use crate::ir;
use crate::translator::Translator;

const INDENT: &str = "  ";

const PRELUDE: &str = r#"local stack = {}
local variables = {}
local temporary = nil

local function need(depth, operator)
  if #stack < depth then
    error("stack underflow: " .. operator .. " needs " .. depth .. " value(s), found " .. #stack)
  end
end

local function top(operator)
  need(1, operator)
  return stack[#stack]
end

local function write_char(code)
  if code > 0x10ffff or (code >= 0xd800 and code <= 0xdfff) then
    error("invalid character code " .. code)
  end
  io.write(utf8.char(code))
end

local function read_char()
  local c = io.read(1)
  if c == nil then
    return 0xffffffff
  end
  local b = string.byte(c)
  local n = 0
  if b >= 0xf0 then n = 3 elseif b >= 0xe0 then n = 2 elseif b >= 0xc0 then n = 1 end
  if n > 0 then
    c = c .. (io.read(n) or "")
  end
  return utf8.codepoint(c)
end

local function read_integer()
  local line = io.read("l")
  if line == nil or not string.match(line, "^%s*%d+%s*$") or tonumber(line) > 0xffffffff then
    error("invalid numeric input: " .. tostring(line))
  end
  return math.tointeger(tonumber(line))
end

local function load_variable(address)
  local value = variables[address]
  if value == nil then
    error("variable " .. address .. " is not defined")
  end
  return value
end

"#;

/// Translates NumNum programs into Lua source.
pub struct Lua<W> {
    output: W,
    blocks: Vec<Block>,
}

impl<W: Write> Lua<W> {
    /// Create a new `Lua` writing to `output`.
    pub fn new(output: W) -> Lua<W> {
        Lua {
            output,
            blocks: Vec::new(),
        }
    }

    /// Consumes the generator, returning its output sink.
    pub fn into_inner(self) -> W {
        self.output
    }

    fn line(&mut self, stmt: impl Display) -> Result<()> {
        for _ in 0..self.blocks.len() {
            self.output.write_all(INDENT.as_bytes())?;
        }
        writeln!(self.output, "{}", stmt)?;
        Ok(())
    }

    fn open(&mut self, header: &str, kind: Block) -> Result<()> {
        self.line(header)?;
        self.blocks.push(kind);
        Ok(())
    }

    fn close(&mut self, kind: Block, closer: ir::Operator) -> Result<()> {
        match self.blocks.pop() {
            Some(open) if open == kind => self.line("end"),
            _ => Err(StructureError::Unmatched(closer).into()),
        }
    }

    fn need(&mut self, op: ir::Operator, depth: usize) -> Result<()> {
        self.line(format_args!("need({}, \"{}\")", depth, op))
    }

    fn push(&mut self, expr: impl Display) -> Result<()> {
        self.line(format_args!("table.insert(stack, {})", expr))
    }

    fn unary(&mut self, op: ir::Operator, expr: &str) -> Result<()> {
        self.need(op, 1)?;
        self.line(format_args!("stack[#stack] = {}", expr))
    }

    fn operands(&mut self, op: ir::Operator) -> Result<()> {
        self.need(op, 2)?;
        self.line("temporary = table.remove(stack)")
    }

    fn binary(&mut self, op: ir::Operator, sym: &str) -> Result<()> {
        self.operands(op)?;
        self.line(format_args!(
            "stack[#stack] = (stack[#stack] {} temporary) & 0xffffffff",
            sym
        ))
    }

    fn division(&mut self, op: ir::Operator, sym: &str) -> Result<()> {
        self.operands(op)?;
        self.line("if temporary == 0 then error(\"division by zero\") end")?;
        self.line(format_args!("stack[#stack] = stack[#stack] {} temporary", sym))
    }

    fn shift(&mut self, op: ir::Operator, sym: &str) -> Result<()> {
        self.operands(op)?;
        self.line(format_args!(
            "if temporary >= 32 then stack[#stack] = 0 else stack[#stack] = (stack[#stack] {} temporary) & 0xffffffff end",
            sym
        ))
    }

    fn compare(&mut self, op: ir::Operator, sym: &str) -> Result<()> {
        self.operands(op)?;
        self.line(format_args!(
            "if stack[#stack] {} temporary then stack[#stack] = 1 else stack[#stack] = 0 end",
            sym
        ))
    }

    fn check_zero(&mut self, op: ir::Operator, sym: &str) -> Result<()> {
        self.need(op, 1)?;
        self.line(format_args!(
            "if stack[#stack] {} 0 then stack[#stack] = 1 else stack[#stack] = 0 end",
            sym
        ))
    }

    fn test_top(&mut self, op: ir::Operator, sym: &str) -> Result<()> {
        self.need(op, 2)?;
        self.line(format_args!(
            "if stack[#stack - 1] {} stack[#stack] then temporary = 1 else temporary = 0 end",
            sym
        ))?;
        self.push("temporary")
    }
}

impl<W: Write> Translator for Lua<W> {
    fn preprocess(&mut self) -> Result<()> {
        self.output.write_all(PRELUDE.as_bytes())?;
        Ok(())
    }

    fn postprocess(&mut self) -> Result<()> {
        if !self.blocks.is_empty() {
            return Err(StructureError::Unclosed(self.blocks.len()).into());
        }
        self.output.flush()?;
        debug!("lua generation finished");
        Ok(())
    }

    fn count(&mut self) -> Result<()> {
        self.push("#stack")
    }

    fn pop(&mut self) -> Result<()> {
        self.need(ir::Pop, 1)?;
        self.line("table.remove(stack)")
    }

    fn copy(&mut self) -> Result<()> {
        self.need(ir::Copy, 1)?;
        self.push("stack[#stack]")
    }

    fn swap(&mut self) -> Result<()> {
        self.need(ir::Swap, 2)?;
        self.line("stack[#stack - 1], stack[#stack] = stack[#stack], stack[#stack - 1]")
    }

    fn over(&mut self) -> Result<()> {
        self.need(ir::Over, 2)?;
        self.push("stack[#stack - 1]")
    }

    fn increment(&mut self) -> Result<()> {
        self.unary(ir::Increment, "(stack[#stack] + 1) & 0xffffffff")
    }

    fn decrement(&mut self) -> Result<()> {
        self.unary(ir::Decrement, "(stack[#stack] - 1) & 0xffffffff")
    }

    fn not(&mut self) -> Result<()> {
        self.unary(ir::Not, "~stack[#stack] & 0xffffffff")
    }

    fn rotate_down(&mut self) -> Result<()> {
        self.need(ir::RotateDown, 3)?;
        self.line("stack[#stack - 2], stack[#stack - 1], stack[#stack] = stack[#stack - 1], stack[#stack], stack[#stack - 2]")
    }

    fn rotate_up(&mut self) -> Result<()> {
        self.need(ir::RotateUp, 3)?;
        self.line("stack[#stack - 2], stack[#stack - 1], stack[#stack] = stack[#stack], stack[#stack - 2], stack[#stack - 1]")
    }

    fn and(&mut self) -> Result<()> {
        self.binary(ir::And, "&")
    }

    fn or(&mut self) -> Result<()> {
        self.binary(ir::Or, "|")
    }

    fn xor(&mut self) -> Result<()> {
        self.binary(ir::Xor, "~")
    }

    fn shift_right(&mut self) -> Result<()> {
        self.shift(ir::ShiftRight, ">>")
    }

    fn shift_left(&mut self) -> Result<()> {
        self.shift(ir::ShiftLeft, "<<")
    }

    fn add(&mut self) -> Result<()> {
        self.binary(ir::Add, "+")
    }

    fn subtract(&mut self) -> Result<()> {
        self.binary(ir::Subtract, "-")
    }

    fn multiply(&mut self) -> Result<()> {
        self.binary(ir::Multiply, "*")
    }

    fn divide(&mut self) -> Result<()> {
        self.division(ir::Divide, "//")
    }

    fn remainder(&mut self) -> Result<()> {
        self.division(ir::Remainder, "%")
    }

    fn greater_than(&mut self) -> Result<()> {
        self.compare(ir::GreaterThan, ">")
    }

    fn less_than(&mut self) -> Result<()> {
        self.compare(ir::LessThan, "<")
    }

    fn equal(&mut self) -> Result<()> {
        self.compare(ir::Equal, "==")
    }

    fn not_equal(&mut self) -> Result<()> {
        self.compare(ir::NotEqual, "~=")
    }

    fn test(&mut self) -> Result<()> {
        self.test_top(ir::Test, "==")
    }

    fn greater_than_or_equal(&mut self) -> Result<()> {
        self.compare(ir::GreaterThanOrEqual, ">=")
    }

    fn less_than_or_equal(&mut self) -> Result<()> {
        self.compare(ir::LessThanOrEqual, "<=")
    }

    fn equal_zero(&mut self) -> Result<()> {
        self.check_zero(ir::EqualZero, "==")
    }

    fn not_equal_zero(&mut self) -> Result<()> {
        self.check_zero(ir::NotEqualZero, "~=")
    }

    fn test_not(&mut self) -> Result<()> {
        self.test_top(ir::TestNot, "~=")
    }

    fn if_not_zero(&mut self) -> Result<()> {
        self.open(&format!("if top(\"{}\") ~= 0 then", ir::IfNotZero), Block::Conditional)
    }

    fn if_zero(&mut self) -> Result<()> {
        self.open(&format!("if top(\"{}\") == 0 then", ir::IfZero), Block::Conditional)
    }

    fn end_if(&mut self) -> Result<()> {
        self.close(Block::Conditional, ir::EndIf)
    }

    fn while_not_zero(&mut self) -> Result<()> {
        self.open(&format!("while top(\"{}\") ~= 0 do", ir::WhileNotZero), Block::Loop)
    }

    fn end_while(&mut self) -> Result<()> {
        self.close(Block::Loop, ir::EndWhile)
    }

    fn do_break(&mut self) -> Result<()> {
        if !self.blocks.contains(&Block::Loop) {
            return Err(StructureError::BreakOutsideLoop.into());
        }
        self.line("break")
    }

    fn constant_8bit(&mut self, value: u32) -> Result<()> {
        self.push(value)
    }

    fn constant_16bit(&mut self, value: u32) -> Result<()> {
        self.push(value)
    }

    fn constant_32bit(&mut self, value: u32) -> Result<()> {
        self.push(value)
    }

    fn input_character(&mut self) -> Result<()> {
        self.push("read_char()")
    }

    fn output_character(&mut self) -> Result<()> {
        self.need(ir::OutputCharacter, 1)?;
        self.line("write_char(table.remove(stack))")
    }

    fn store_variable(&mut self, address: u32) -> Result<()> {
        self.need(ir::StoreVariable, 1)?;
        self.line(format_args!("variables[{}] = table.remove(stack)", address))
    }

    fn copy_variable(&mut self, address: u32) -> Result<()> {
        self.need(ir::CopyVariable, 1)?;
        self.line(format_args!("variables[{}] = stack[#stack]", address))
    }

    fn load_variable(&mut self, address: u32) -> Result<()> {
        self.push(format_args!("load_variable({})", address))
    }

    fn input_integer(&mut self) -> Result<()> {
        self.push("read_integer()")
    }

    fn output_integer(&mut self) -> Result<()> {
        self.need(ir::OutputInteger, 1)?;
        self.line("io.write(table.remove(stack))")
    }
}
