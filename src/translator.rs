//! Dispatching decoded instructions to a backend.

use log::{debug, trace};

use crate::error::Result;
use crate::ir::{self, Instruction};

/// A backend that gives every operator its effect.
///
/// [`translate`] calls `preprocess` once, then one handler per instruction in
/// program order, then `postprocess` once.
#[allow(missing_docs)]
pub trait Translator {
    fn preprocess(&mut self) -> Result<()>;
    fn postprocess(&mut self) -> Result<()>;

    fn count(&mut self) -> Result<()>;
    fn pop(&mut self) -> Result<()>;
    fn copy(&mut self) -> Result<()>;
    fn swap(&mut self) -> Result<()>;
    fn over(&mut self) -> Result<()>;
    fn increment(&mut self) -> Result<()>;
    fn decrement(&mut self) -> Result<()>;
    fn not(&mut self) -> Result<()>;
    fn rotate_down(&mut self) -> Result<()>;
    fn rotate_up(&mut self) -> Result<()>;
    fn and(&mut self) -> Result<()>;
    fn or(&mut self) -> Result<()>;
    fn xor(&mut self) -> Result<()>;
    fn shift_right(&mut self) -> Result<()>;
    fn shift_left(&mut self) -> Result<()>;
    fn add(&mut self) -> Result<()>;
    fn subtract(&mut self) -> Result<()>;
    fn multiply(&mut self) -> Result<()>;
    fn divide(&mut self) -> Result<()>;
    fn remainder(&mut self) -> Result<()>;
    fn greater_than(&mut self) -> Result<()>;
    fn less_than(&mut self) -> Result<()>;
    fn equal(&mut self) -> Result<()>;
    fn not_equal(&mut self) -> Result<()>;
    fn test(&mut self) -> Result<()>;
    fn greater_than_or_equal(&mut self) -> Result<()>;
    fn less_than_or_equal(&mut self) -> Result<()>;
    fn equal_zero(&mut self) -> Result<()>;
    fn not_equal_zero(&mut self) -> Result<()>;
    fn test_not(&mut self) -> Result<()>;
    fn if_not_zero(&mut self) -> Result<()>;
    fn if_zero(&mut self) -> Result<()>;
    fn end_if(&mut self) -> Result<()>;
    fn while_not_zero(&mut self) -> Result<()>;
    fn end_while(&mut self) -> Result<()>;
    fn do_break(&mut self) -> Result<()>;
    fn constant_8bit(&mut self, value: u32) -> Result<()>;
    fn constant_16bit(&mut self, value: u32) -> Result<()>;
    fn constant_32bit(&mut self, value: u32) -> Result<()>;
    fn input_character(&mut self) -> Result<()>;
    fn output_character(&mut self) -> Result<()>;
    fn store_variable(&mut self, address: u32) -> Result<()>;
    fn copy_variable(&mut self, address: u32) -> Result<()>;
    fn load_variable(&mut self, address: u32) -> Result<()>;
    fn input_integer(&mut self) -> Result<()>;
    fn output_integer(&mut self) -> Result<()>;
}

/// Drives `backend` through `program`, stopping at the first error.
pub fn translate<T: Translator + ?Sized>(program: &[Instruction], backend: &mut T) -> Result<()> {
    debug!("translating {} instructions", program.len());
    backend.preprocess()?;
    for inst in program {
        trace!("{}", inst);
        dispatch(inst, backend)?;
    }
    backend.postprocess()
}

fn dispatch<T: Translator + ?Sized>(inst: &Instruction, backend: &mut T) -> Result<()> {
    match inst.operator {
        ir::Count => backend.count(),
        ir::Pop => backend.pop(),
        ir::Copy => backend.copy(),
        ir::Swap => backend.swap(),
        ir::Over => backend.over(),
        ir::Increment => backend.increment(),
        ir::Decrement => backend.decrement(),
        ir::Not => backend.not(),
        ir::RotateDown => backend.rotate_down(),
        ir::RotateUp => backend.rotate_up(),
        ir::And => backend.and(),
        ir::Or => backend.or(),
        ir::Xor => backend.xor(),
        ir::ShiftRight => backend.shift_right(),
        ir::ShiftLeft => backend.shift_left(),
        ir::Add => backend.add(),
        ir::Subtract => backend.subtract(),
        ir::Multiply => backend.multiply(),
        ir::Divide => backend.divide(),
        ir::Remainder => backend.remainder(),
        ir::GreaterThan => backend.greater_than(),
        ir::LessThan => backend.less_than(),
        ir::Equal => backend.equal(),
        ir::NotEqual => backend.not_equal(),
        ir::Test => backend.test(),
        ir::GreaterThanOrEqual => backend.greater_than_or_equal(),
        ir::LessThanOrEqual => backend.less_than_or_equal(),
        ir::EqualZero => backend.equal_zero(),
        ir::NotEqualZero => backend.not_equal_zero(),
        ir::TestNot => backend.test_not(),
        ir::IfNotZero => backend.if_not_zero(),
        ir::IfZero => backend.if_zero(),
        ir::EndIf => backend.end_if(),
        ir::WhileNotZero => backend.while_not_zero(),
        ir::EndWhile => backend.end_while(),
        ir::Break => backend.do_break(),
        ir::Constant8Bit => backend.constant_8bit(inst.value),
        ir::Constant16Bit => backend.constant_16bit(inst.value),
        ir::Constant32Bit => backend.constant_32bit(inst.value),
        ir::InputCharacter => backend.input_character(),
        ir::OutputCharacter => backend.output_character(),
        ir::StoreVariable => backend.store_variable(inst.address()),
        ir::CopyVariable => backend.copy_variable(inst.address()),
        ir::LoadVariable => backend.load_variable(inst.address()),
        ir::InputInteger => backend.input_integer(),
        ir::OutputInteger => backend.output_integer(),
    }
}
