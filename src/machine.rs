//! A virtual machine that executes NumNum programs.

use std::collections::HashMap;
use std::io::{stdin, stdout, BufRead, BufReader, Stdin, Stdout, Write};

use log::{debug, info};

use crate::bytecode::{Assembler, Code};
use crate::error::{MachineError, Result};
use crate::io::BufReadExt;
use crate::ir::{self, Instruction, Operator};
use crate::translator::Translator;

/// Result of a single machine operation.
pub type MachineResult<T> = std::result::Result<T, MachineError>;

use crate::error::MachineError::*;

/// A virtual machine.
///
/// As a [`Translator`] it assembles the dispatched instructions and runs them
/// once `postprocess` is reached. The assembled program is taken out at that
/// point, so the same `Machine` can run further programs; its stack and
/// variables carry over.
pub struct Machine<B, W> {
    assembler: Assembler,
    stack: Vec<u32>,
    variables: HashMap<u32, u32>,
    stdin: B,
    stdout: W,
}

/// Create a new `Machine` with stdin and stdout.
pub fn with_stdio() -> Machine<BufReader<Stdin>, Stdout> {
    Machine::new(BufReader::new(stdin()), stdout())
}

impl<B: BufRead, W: Write> Machine<B, W> {
    /// Creates a new `Machine` with input and output.
    pub fn new(stdin: B, stdout: W) -> Machine<B, W> {
        Machine {
            assembler: Assembler::new(),
            stack: Vec::new(),
            variables: HashMap::new(),
            stdin,
            stdout,
        }
    }

    /// The evaluation stack, bottom first.
    pub fn stack(&self) -> &[u32] {
        &self.stack
    }

    /// Consumes the machine, returning its output sink.
    pub fn into_output(self) -> W {
        self.stdout
    }

    /// Run program.
    ///
    /// Output is flushed whether or not the program faults.
    pub fn run(&mut self, program: &[Code]) -> MachineResult<()> {
        info!("running {} codes", program.len());
        let mut ip = 0;
        let res = loop {
            if ip >= program.len() {
                break Ok(());
            }
            match self.step(program, ip) {
                Ok(next) => ip = next,
                Err(e) => break Err(e),
            }
        };
        let flushed = self.stdout.flush();
        res?;
        flushed?;
        debug!("halted ({:?}, {:?})", self.stack, self.variables);
        Ok(())
    }

    /// Executes the code at `ip`, returning the next position.
    fn step(&mut self, program: &[Code], ip: usize) -> MachineResult<usize> {
        let code = &program[ip];
        let op = code.inst.operator;
        debug!("{:>5} {}", ip, code.inst);
        match op {
            ir::Count => {
                let depth = self.stack.len() as u32;
                self.stack.push(depth);
            }
            ir::Pop => {
                self.require(op, 1)?;
                self.stack.pop();
            }
            ir::Copy => {
                let top = self.peek(op)?;
                self.stack.push(top);
            }
            ir::Swap => {
                self.require(op, 2)?;
                let len = self.stack.len();
                self.stack.swap(len - 1, len - 2);
            }
            ir::Over => {
                self.require(op, 2)?;
                let next = self.stack[self.stack.len() - 2];
                self.stack.push(next);
            }
            ir::RotateUp => {
                self.require(op, 3)?;
                let len = self.stack.len();
                self.stack[len - 3..].rotate_right(1);
            }
            ir::RotateDown => {
                self.require(op, 3)?;
                let len = self.stack.len();
                self.stack[len - 3..].rotate_left(1);
            }
            ir::Increment => self.unary(op, |x| x.wrapping_add(1))?,
            ir::Decrement => self.unary(op, |x| x.wrapping_sub(1))?,
            ir::Not => self.unary(op, |x| !x)?,
            ir::And => self.calc(op, |y, x| y & x)?,
            ir::Or => self.calc(op, |y, x| y | x)?,
            ir::Xor => self.calc(op, |y, x| y ^ x)?,
            ir::ShiftLeft => self.calc(op, |y, x| y.checked_shl(x).unwrap_or(0))?,
            ir::ShiftRight => self.calc(op, |y, x| y.checked_shr(x).unwrap_or(0))?,
            ir::Add => self.calc(op, |y, x| y.wrapping_add(x))?,
            ir::Subtract => self.calc(op, |y, x| y.wrapping_sub(x))?,
            ir::Multiply => self.calc(op, |y, x| y.wrapping_mul(x))?,
            ir::Divide => self.dcalc(op, |y, x| y / x)?,
            ir::Remainder => self.dcalc(op, |y, x| y % x)?,
            ir::GreaterThan => self.calc(op, |y, x| (y > x) as u32)?,
            ir::LessThan => self.calc(op, |y, x| (y < x) as u32)?,
            ir::Equal => self.calc(op, |y, x| (y == x) as u32)?,
            ir::NotEqual => self.calc(op, |y, x| (y != x) as u32)?,
            ir::GreaterThanOrEqual => self.calc(op, |y, x| (y >= x) as u32)?,
            ir::LessThanOrEqual => self.calc(op, |y, x| (y <= x) as u32)?,
            ir::EqualZero => self.unary(op, |x| (x == 0) as u32)?,
            ir::NotEqualZero => self.unary(op, |x| (x != 0) as u32)?,
            ir::Test => self.compare_top(op, |y, x| y == x)?,
            ir::TestNot => self.compare_top(op, |y, x| y != x)?,
            ir::IfNotZero => {
                if self.peek(op)? == 0 {
                    return Ok(code.jump);
                }
            }
            ir::IfZero => {
                if self.peek(op)? != 0 {
                    return Ok(code.jump);
                }
            }
            ir::EndIf => (),
            ir::WhileNotZero => {
                if self.peek(op)? == 0 {
                    return Ok(code.jump + 1);
                }
            }
            ir::EndWhile => {
                if self.peek(op)? != 0 {
                    return Ok(code.jump);
                }
            }
            ir::Break => return Ok(code.jump + 1),
            ir::Constant8Bit | ir::Constant16Bit | ir::Constant32Bit => {
                self.stack.push(code.inst.value);
            }
            ir::InputCharacter => self.get_char()?,
            ir::OutputCharacter => self.put_char(op)?,
            ir::InputInteger => self.get_num()?,
            ir::OutputInteger => self.put_num(op)?,
            ir::StoreVariable => {
                let top = self.take(op)?;
                self.variables.insert(code.inst.address(), top);
            }
            ir::CopyVariable => {
                let top = self.peek(op)?;
                self.variables.insert(code.inst.address(), top);
            }
            ir::LoadVariable => {
                let address = code.inst.address();
                match self.variables.get(&address) {
                    Some(val) => self.stack.push(*val),
                    None => return Err(UndefinedVariable(address)),
                }
            }
        }
        Ok(ip + 1)
    }

    fn require(&self, operator: Operator, needed: usize) -> MachineResult<()> {
        if self.stack.len() < needed {
            Err(StackUnderflow {
                operator,
                needed,
                found: self.stack.len(),
            })
        } else {
            Ok(())
        }
    }

    fn take(&mut self, op: Operator) -> MachineResult<u32> {
        self.require(op, 1)?;
        Ok(self.stack.pop().unwrap_or_default())
    }

    fn peek(&self, op: Operator) -> MachineResult<u32> {
        self.require(op, 1)?;
        Ok(self.stack[self.stack.len() - 1])
    }

    fn unary(&mut self, op: Operator, f: impl FnOnce(u32) -> u32) -> MachineResult<()> {
        let x = self.take(op)?;
        self.stack.push(f(x));
        Ok(())
    }

    /// Pops `x` then `y` and pushes `f(y, x)`.
    fn calc(&mut self, op: Operator, f: impl FnOnce(u32, u32) -> u32) -> MachineResult<()> {
        self.require(op, 2)?;
        let x = self.take(op)?;
        let y = self.take(op)?;
        self.stack.push(f(y, x));
        Ok(())
    }

    fn dcalc(&mut self, op: Operator, divf: impl FnOnce(u32, u32) -> u32) -> MachineResult<()> {
        self.require(op, 2)?;
        let x = self.take(op)?;
        if x == 0 {
            return Err(ZeroDivision);
        }
        let y = self.take(op)?;
        self.stack.push(divf(y, x));
        Ok(())
    }

    /// Compares the top two values, keeping both.
    fn compare_top(&mut self, op: Operator, f: impl FnOnce(u32, u32) -> bool) -> MachineResult<()> {
        self.require(op, 2)?;
        let len = self.stack.len();
        let result = f(self.stack[len - 2], self.stack[len - 1]);
        self.stack.push(result as u32);
        Ok(())
    }

    fn put_char(&mut self, op: Operator) -> MachineResult<()> {
        let n = self.take(op)?;
        match char::from_u32(n) {
            Some(c) => {
                write!(self.stdout, "{}", c)?;
                Ok(())
            }
            None => Err(InvalidCharacter(n)),
        }
    }

    fn put_num(&mut self, op: Operator) -> MachineResult<()> {
        let n = self.take(op)?;
        write!(self.stdout, "{}", n)?;
        Ok(())
    }

    /// Pushes the next input character, or `u32::MAX` at end of input.
    fn get_char(&mut self) -> MachineResult<()> {
        self.stdout.flush()?;
        let n = match self.stdin.read_char()? {
            Some(c) => c as u32,
            None => u32::MAX,
        };
        self.stack.push(n);
        Ok(())
    }

    fn get_num(&mut self) -> MachineResult<()> {
        self.stdout.flush()?;
        let line = self.stdin.read_text_line()?.unwrap_or_default();
        match line.trim().parse::<u32>() {
            Ok(n) if !line.trim().starts_with('+') => {
                self.stack.push(n);
                Ok(())
            }
            _ => Err(InvalidNumber(line)),
        }
    }

    fn assemble(&mut self, inst: Instruction) -> Result<()> {
        self.assembler.push(inst);
        Ok(())
    }
}

macro_rules! assemble_ops (
    ($($name:ident => $op:ident),* $(,)?) => (
        $(fn $name(&mut self) -> Result<()> {
            self.assemble(ir::$op.into())
        })*
    )
);

impl<B: BufRead, W: Write> Translator for Machine<B, W> {
    fn preprocess(&mut self) -> Result<()> {
        Ok(())
    }

    fn postprocess(&mut self) -> Result<()> {
        let program = self.assembler.finish()?;
        self.run(&program)?;
        Ok(())
    }

    assemble_ops!(
        count => Count,
        pop => Pop,
        copy => Copy,
        swap => Swap,
        over => Over,
        increment => Increment,
        decrement => Decrement,
        not => Not,
        rotate_down => RotateDown,
        rotate_up => RotateUp,
        and => And,
        or => Or,
        xor => Xor,
        shift_right => ShiftRight,
        shift_left => ShiftLeft,
        add => Add,
        subtract => Subtract,
        multiply => Multiply,
        divide => Divide,
        remainder => Remainder,
        greater_than => GreaterThan,
        less_than => LessThan,
        equal => Equal,
        not_equal => NotEqual,
        test => Test,
        greater_than_or_equal => GreaterThanOrEqual,
        less_than_or_equal => LessThanOrEqual,
        equal_zero => EqualZero,
        not_equal_zero => NotEqualZero,
        test_not => TestNot,
        input_character => InputCharacter,
        output_character => OutputCharacter,
        input_integer => InputInteger,
        output_integer => OutputInteger,
    );

    fn if_not_zero(&mut self) -> Result<()> {
        self.assembler.open_if(ir::IfNotZero);
        Ok(())
    }

    fn if_zero(&mut self) -> Result<()> {
        self.assembler.open_if(ir::IfZero);
        Ok(())
    }

    fn end_if(&mut self) -> Result<()> {
        Ok(self.assembler.close_if()?)
    }

    fn while_not_zero(&mut self) -> Result<()> {
        self.assembler.open_while();
        Ok(())
    }

    fn end_while(&mut self) -> Result<()> {
        Ok(self.assembler.close_while()?)
    }

    fn do_break(&mut self) -> Result<()> {
        Ok(self.assembler.brk()?)
    }

    fn constant_8bit(&mut self, value: u32) -> Result<()> {
        self.assemble(Instruction::new(ir::Constant8Bit, value))
    }

    fn constant_16bit(&mut self, value: u32) -> Result<()> {
        self.assemble(Instruction::new(ir::Constant16Bit, value))
    }

    fn constant_32bit(&mut self, value: u32) -> Result<()> {
        self.assemble(Instruction::new(ir::Constant32Bit, value))
    }

    fn store_variable(&mut self, address: u32) -> Result<()> {
        self.assemble(Instruction::new(ir::StoreVariable, address))
    }

    fn copy_variable(&mut self, address: u32) -> Result<()> {
        self.assemble(Instruction::new(ir::CopyVariable, address))
    }

    fn load_variable(&mut self, address: u32) -> Result<()> {
        self.assemble(Instruction::new(ir::LoadVariable, address))
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, Cursor};

    use crate::bytecode::{Assembler, ByteCode, Code};
    use crate::error::{Error, MachineError, StructureError};
    use crate::ir::*;
    use crate::translator::translate;

    fn assemble(ops: &[Instruction]) -> ByteCode {
        let mut asm = Assembler::new();
        for inst in ops {
            match inst.operator {
                IfNotZero | IfZero => asm.open_if(inst.operator),
                EndIf => asm.close_if().unwrap(),
                WhileNotZero => asm.open_while(),
                EndWhile => asm.close_while().unwrap(),
                Break => asm.brk().unwrap(),
                _ => asm.push(*inst),
            }
        }
        asm.finish().unwrap()
    }

    fn ops(ops: &[Operator]) -> ByteCode {
        let insts: Vec<_> = ops.iter().map(|op| Instruction::from(*op)).collect();
        assemble(&insts)
    }

    fn push(n: u32) -> Instruction {
        Instruction::new(Constant32Bit, n)
    }

    fn machine() -> super::Machine<io::Empty, io::Sink> {
        super::Machine::new(io::empty(), io::sink())
    }

    #[test]
    fn test_stack() {
        let bc = ops(&[Copy, Over, Swap, Pop, Count]);
        let mut vm = machine();
        vm.stack.extend_from_slice(&[1, 2]);
        assert_eq!(vm.step(&bc, 0).unwrap(), 1);
        assert_eq!(vm.stack, vec!(1, 2, 2));
        vm.step(&bc, 1).unwrap();
        assert_eq!(vm.stack, vec!(1, 2, 2, 2));
        vm.stack[2] = 5;
        vm.step(&bc, 2).unwrap();
        assert_eq!(vm.stack, vec!(1, 2, 2, 5));
        vm.step(&bc, 3).unwrap();
        assert_eq!(vm.stack, vec!(1, 2, 2));
        vm.step(&bc, 4).unwrap();
        assert_eq!(vm.stack, vec!(1, 2, 2, 3));
    }

    #[test]
    fn test_rotate() {
        let bc = ops(&[RotateUp, RotateDown]);
        let mut vm = machine();
        vm.stack.extend_from_slice(&[0, 1, 2, 3]);
        vm.step(&bc, 0).unwrap();
        assert_eq!(vm.stack, vec!(0, 3, 1, 2));
        vm.step(&bc, 1).unwrap();
        assert_eq!(vm.stack, vec!(0, 1, 2, 3));
    }

    #[test]
    fn test_underflow() {
        let cases: &[(Operator, usize)] = &[
            (Pop, 1),
            (Copy, 1),
            (Swap, 2),
            (Over, 2),
            (RotateUp, 3),
            (RotateDown, 3),
            (Add, 2),
            (Divide, 2),
            (Increment, 1),
            (EqualZero, 1),
            (Test, 2),
            (OutputCharacter, 1),
            (OutputInteger, 1),
            (StoreVariable, 1),
            (CopyVariable, 1),
        ];
        for &(op, needed) in cases {
            let bc = ops(&[op]);
            let mut vm = machine();
            vm.stack.extend(std::iter::repeat(7).take(needed - 1));
            match vm.step(&bc, 0) {
                Err(MachineError::StackUnderflow {
                    operator,
                    needed: n,
                    found,
                }) => {
                    assert_eq!(operator, op);
                    assert_eq!(n, needed);
                    assert_eq!(found, needed - 1);
                }
                other => panic!("{}: expected underflow, got {:?}", op, other),
            }
        }
    }

    #[test]
    fn test_arithmetic() {
        let bc = ops(&[Add, Subtract, Multiply, Divide, Remainder]);
        let mut vm = machine();
        vm.stack.extend_from_slice(&[2, 19, 2, 5, 1, 1]);
        vm.step(&bc, 0).unwrap();
        assert_eq!(vm.stack, vec!(2, 19, 2, 5, 2));
        vm.step(&bc, 1).unwrap();
        assert_eq!(vm.stack, vec!(2, 19, 2, 3));
        vm.step(&bc, 2).unwrap();
        assert_eq!(vm.stack, vec!(2, 19, 6));
        vm.step(&bc, 3).unwrap();
        assert_eq!(vm.stack, vec!(2, 3));
        vm.step(&bc, 4).unwrap();
        assert_eq!(vm.stack, vec!(2));
        assert!(vm.step(&bc, 4).is_err());
    }

    #[test]
    fn test_wraparound() {
        let mut vm = machine();
        vm.run(&assemble(&[push(u32::MAX), push(1), Add.into()]))
            .unwrap();
        assert_eq!(vm.stack, vec!(0));

        let mut vm = machine();
        vm.run(&assemble(&[push(0), push(1), Subtract.into()]))
            .unwrap();
        assert_eq!(vm.stack, vec!(u32::MAX));

        let mut vm = machine();
        vm.run(&assemble(&[push(0x10000), push(0x10001), Multiply.into()]))
            .unwrap();
        assert_eq!(vm.stack, vec!(0x10000));

        let mut vm = machine();
        vm.run(&assemble(&[
            push(0),
            Decrement.into(),
            Increment.into(),
            Increment.into(),
            Not.into(),
        ]))
        .unwrap();
        assert_eq!(vm.stack, vec!(0xffff_fffe));
    }

    #[test]
    fn test_bitwise() {
        let bc = ops(&[And, Or, Xor, ShiftLeft, ShiftRight]);
        let mut vm = machine();
        vm.stack.extend_from_slice(&[0b1100, 0b1010]);
        vm.step(&bc, 0).unwrap();
        assert_eq!(vm.stack, vec!(0b1000));
        vm.stack.push(0b0011);
        vm.step(&bc, 1).unwrap();
        assert_eq!(vm.stack, vec!(0b1011));
        vm.stack.push(0b0001);
        vm.step(&bc, 2).unwrap();
        assert_eq!(vm.stack, vec!(0b1010));
        vm.stack.push(2);
        vm.step(&bc, 3).unwrap();
        assert_eq!(vm.stack, vec!(0b101000));
        vm.stack.push(3);
        vm.step(&bc, 4).unwrap();
        assert_eq!(vm.stack, vec!(0b101));
        vm.stack.push(32);
        vm.step(&bc, 3).unwrap();
        assert_eq!(vm.stack, vec!(0));
    }

    #[test]
    fn test_zero_division() {
        for op in &[Divide, Remainder] {
            let mut vm = machine();
            vm.stack.extend_from_slice(&[9, 0]);
            assert!(matches!(
                vm.step(&ops(&[*op]), 0),
                Err(MachineError::ZeroDivision)
            ));
        }
    }

    #[test]
    fn test_compare() {
        let cases: &[(Operator, u32, u32, u32)] = &[
            (GreaterThan, 3, 2, 1),
            (GreaterThan, 2, 3, 0),
            (LessThan, 2, 3, 1),
            (LessThan, 3, 3, 0),
            (Equal, 3, 3, 1),
            (Equal, 3, 4, 0),
            (NotEqual, 3, 4, 1),
            (NotEqual, 4, 4, 0),
            (GreaterThanOrEqual, 3, 3, 1),
            (GreaterThanOrEqual, 2, 3, 0),
            (LessThanOrEqual, 3, 3, 1),
            (LessThanOrEqual, 4, 3, 0),
        ];
        for &(op, next, top, expected) in cases {
            let mut vm = machine();
            vm.stack.extend_from_slice(&[next, top]);
            vm.step(&ops(&[op]), 0).unwrap();
            assert_eq!(vm.stack, vec!(expected), "{} {} {}", next, op, top);
        }

        let bc = ops(&[EqualZero, NotEqualZero]);
        let mut vm = machine();
        vm.stack.extend_from_slice(&[0, 5]);
        vm.step(&bc, 0).unwrap();
        assert_eq!(vm.stack, vec!(0, 0));
        vm.step(&bc, 1).unwrap();
        assert_eq!(vm.stack, vec!(0, 0));
        vm.stack.pop();
        vm.step(&bc, 0).unwrap();
        assert_eq!(vm.stack, vec!(1));
        vm.step(&bc, 1).unwrap();
        assert_eq!(vm.stack, vec!(1));
    }

    #[test]
    fn test_test_keeps_operands() {
        let bc = ops(&[Test, TestNot]);
        let mut vm = machine();
        vm.stack.extend_from_slice(&[5, 5]);
        vm.step(&bc, 0).unwrap();
        assert_eq!(vm.stack, vec!(5, 5, 1));

        let mut vm = machine();
        vm.stack.extend_from_slice(&[5, 6]);
        vm.step(&bc, 0).unwrap();
        assert_eq!(vm.stack, vec!(5, 6, 0));

        let mut vm = machine();
        vm.stack.extend_from_slice(&[5, 6]);
        vm.step(&bc, 1).unwrap();
        assert_eq!(vm.stack, vec!(5, 6, 1));
    }

    #[test]
    fn test_variables() {
        let bc = assemble(&[
            Instruction::new(StoreVariable, 1),
            Instruction::new(CopyVariable, 2),
            Instruction::new(LoadVariable, 1),
            Instruction::new(LoadVariable, 3),
        ]);
        let mut vm = machine();
        vm.stack.extend_from_slice(&[8, 9]);
        vm.step(&bc, 0).unwrap();
        assert_eq!(vm.stack, vec!(8));
        assert_eq!(vm.variables.get(&1), Some(&9));
        vm.step(&bc, 1).unwrap();
        assert_eq!(vm.stack, vec!(8));
        assert_eq!(vm.variables.get(&2), Some(&8));
        vm.step(&bc, 2).unwrap();
        assert_eq!(vm.stack, vec!(8, 9));
        assert!(matches!(
            vm.step(&bc, 3),
            Err(MachineError::UndefinedVariable(3))
        ));
    }

    #[test]
    fn test_wide_addresses_are_distinct() {
        let bc = assemble(&[
            Instruction::new(StoreVariable, 0x10000),
            Instruction::new(LoadVariable, 0x10000),
            Instruction::new(LoadVariable, 0),
        ]);
        let mut vm = machine();
        vm.stack.push(5);
        vm.step(&bc, 0).unwrap();
        vm.step(&bc, 1).unwrap();
        assert_eq!(vm.stack, vec!(5));
        assert!(matches!(
            vm.step(&bc, 2),
            Err(MachineError::UndefinedVariable(0))
        ));
    }

    #[test]
    fn test_counting_loop() {
        // push 3, while nonzero: decrement, end-while
        let bc = assemble(&[
            push(3),
            WhileNotZero.into(),
            Decrement.into(),
            EndWhile.into(),
        ]);
        let mut vm = machine();
        let mut ip = 0;
        let mut iterations = 0;
        while ip < bc.len() {
            if ip == 2 {
                iterations += 1;
            }
            ip = vm.step(&bc, ip).unwrap();
        }
        assert_eq!(iterations, 3);
        assert_eq!(vm.stack, vec!(0));
    }

    #[test]
    fn test_loop_landing() {
        let bc = ops(&[WhileNotZero, Pop, EndWhile, Count]);
        let mut vm = machine();
        vm.stack.push(0);
        // exit lands one past the closer
        assert_eq!(vm.step(&bc, 0).unwrap(), 3);
        vm.stack.push(1);
        // back edge lands on the opener
        assert_eq!(vm.step(&bc, 2).unwrap(), 0);
    }

    #[test]
    fn test_break() {
        // count down from 5, leaving the loop when 2 is reached
        let bc = assemble(&[
            push(5),
            WhileNotZero.into(),
            Decrement.into(),
            Copy.into(),
            push(2),
            Equal.into(),
            IfNotZero.into(),
            Pop.into(),
            Break.into(),
            EndIf.into(),
            Pop.into(),
            EndWhile.into(),
        ]);
        let mut vm = machine();
        vm.run(&bc).unwrap();
        assert_eq!(vm.stack, vec!(2));
    }

    #[test]
    fn test_if_not_zero() {
        let bc = ops(&[IfNotZero, Increment, EndIf]);
        let mut vm = machine();
        vm.stack.push(0);
        vm.run(&bc).unwrap();
        assert_eq!(vm.stack, vec!(0));

        let mut vm = machine();
        vm.stack.push(4);
        vm.run(&bc).unwrap();
        assert_eq!(vm.stack, vec!(5));
    }

    #[test]
    fn test_if_zero_is_distinct_from_if_not_zero() {
        // IF_ZERO enters its block only when the top is zero
        let bc = ops(&[IfZero, Increment, EndIf]);
        let mut vm = machine();
        vm.stack.push(0);
        vm.run(&bc).unwrap();
        assert_eq!(vm.stack, vec!(1));

        let mut vm = machine();
        vm.stack.push(4);
        vm.run(&bc).unwrap();
        assert_eq!(vm.stack, vec!(4));
    }

    #[test]
    fn test_structural_peek_underflow() {
        for op in &[IfNotZero, IfZero, WhileNotZero] {
            let bc = vec![Code {
                inst: Instruction::from(*op),
                jump: 0,
            }];
            let mut vm = machine();
            assert!(matches!(
                vm.step(&bc, 0),
                Err(MachineError::StackUnderflow { .. })
            ));
        }
    }

    #[test]
    fn test_io() {
        let bc = ops(&[
            InputCharacter,
            InputInteger,
            OutputInteger,
            OutputCharacter,
            InputCharacter,
        ]);
        let input = Cursor::new("W123\n".as_bytes());
        let mut vm = super::Machine::new(input, Vec::new());
        vm.run(&bc).unwrap();
        // end of input reads as u32::MAX
        assert_eq!(vm.stack, vec!(u32::MAX));
        assert_eq!(vm.into_output(), b"123W".to_vec());
    }

    #[test]
    fn test_invalid_input() {
        for line in &["abc\n", "-1\n", "4294967296\n", ""] {
            let mut vm = super::Machine::new(Cursor::new(line.as_bytes()), io::sink());
            assert!(matches!(
                vm.run(&ops(&[InputInteger])),
                Err(MachineError::InvalidNumber(_))
            ));
        }
        let mut vm = super::Machine::new(Cursor::new(" 42 \r\n".as_bytes()), io::sink());
        vm.run(&ops(&[InputInteger])).unwrap();
        assert_eq!(vm.stack, vec!(42));
    }

    #[test]
    fn test_invalid_character() {
        let mut vm = machine();
        let res = vm.run(&assemble(&[push(0xd800), OutputCharacter.into()]));
        assert!(matches!(res, Err(MachineError::InvalidCharacter(0xd800))));
    }

    #[test]
    fn test_fault_stops_output() {
        let bc = assemble(&[
            push(65),
            OutputCharacter.into(),
            push(1),
            push(0),
            Divide.into(),
            push(66),
            OutputCharacter.into(),
        ]);
        let mut vm = super::Machine::new(io::empty(), Vec::new());
        assert!(matches!(vm.run(&bc), Err(MachineError::ZeroDivision)));
        assert_eq!(vm.into_output(), b"A".to_vec());
    }

    #[test]
    fn test_translate() {
        let program = vec![
            push(72),
            Instruction::from(OutputCharacter),
            push(105),
            Instruction::from(OutputCharacter),
        ];
        let mut vm = super::Machine::new(io::empty(), Vec::new());
        translate(&program, &mut vm).unwrap();
        assert_eq!(vm.into_output(), b"Hi".to_vec());
    }

    #[test]
    fn test_reuse_for_second_program() {
        let mut vm = super::Machine::new(io::empty(), Vec::new());
        translate(&[push(65), Instruction::new(StoreVariable, 1)], &mut vm).unwrap();
        translate(
            &[
                Instruction::new(LoadVariable, 1),
                Instruction::from(Increment),
                Instruction::from(OutputCharacter),
            ],
            &mut vm,
        )
        .unwrap();
        assert_eq!(vm.into_output(), b"B".to_vec());
    }

    #[test]
    fn test_translate_unbalanced() {
        let program = vec![Instruction::from(EndWhile)];
        let mut vm = machine();
        assert!(matches!(
            translate(&program, &mut vm),
            Err(Error::Structure(StructureError::Unmatched(EndWhile)))
        ));

        let program = vec![push(1), Instruction::from(WhileNotZero)];
        let mut vm = machine();
        assert!(matches!(
            translate(&program, &mut vm),
            Err(Error::Structure(StructureError::Unclosed(1)))
        ));
    }
}
