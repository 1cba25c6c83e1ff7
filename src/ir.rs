//! Intermediate representations of instruction set.

use std::fmt;

/// Operators of the NumNum language.
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub enum Operator {
    Count,
    Pop,
    Copy,
    Swap,
    Over,
    Increment,
    Decrement,
    Not,
    RotateDown,
    RotateUp,
    And,
    Or,
    Xor,
    ShiftRight,
    ShiftLeft,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    GreaterThan,
    LessThan,
    Equal,
    NotEqual,
    Test,
    GreaterThanOrEqual,
    LessThanOrEqual,
    EqualZero,
    NotEqualZero,
    TestNot,
    IfNotZero,
    IfZero,
    EndIf,
    WhileNotZero,
    EndWhile,
    Break,
    Constant8Bit,
    Constant16Bit,
    Constant32Bit,
    InputCharacter,
    OutputCharacter,
    StoreVariable,
    CopyVariable,
    LoadVariable,
    InputInteger,
    OutputInteger,
}

pub use self::Operator::*;

/// Every operator, in code order.
pub const OPERATORS: [Operator; 46] = [
    Constant8Bit,
    Copy,
    Pop,
    Add,
    OutputCharacter,
    Constant16Bit,
    Constant32Bit,
    Swap,
    Over,
    Count,
    RotateUp,
    RotateDown,
    Increment,
    Decrement,
    Not,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRight,
    InputCharacter,
    IfNotZero,
    IfZero,
    EndIf,
    WhileNotZero,
    EndWhile,
    GreaterThan,
    LessThan,
    Equal,
    NotEqual,
    Test,
    GreaterThanOrEqual,
    LessThanOrEqual,
    EqualZero,
    NotEqualZero,
    TestNot,
    StoreVariable,
    CopyVariable,
    LoadVariable,
    InputInteger,
    OutputInteger,
    Break,
];

impl Operator {
    /// The digit code selecting this operator in source text.
    ///
    /// Codes form a prefix code: any number of digits `5`-`9` followed by
    /// one terminating digit `0`-`4`.
    pub fn code(self) -> u32 {
        match self {
            Constant8Bit => 0,
            Copy => 1,
            Pop => 2,
            Add => 3,
            OutputCharacter => 4,
            Constant16Bit => 50,
            Constant32Bit => 51,
            Swap => 52,
            Over => 53,
            Count => 54,
            RotateUp => 60,
            RotateDown => 61,
            Increment => 62,
            Decrement => 63,
            Not => 64,
            Subtract => 70,
            Multiply => 71,
            Divide => 72,
            Remainder => 73,
            And => 74,
            Or => 80,
            Xor => 81,
            ShiftLeft => 82,
            ShiftRight => 83,
            InputCharacter => 84,
            IfNotZero => 90,
            IfZero => 91,
            EndIf => 92,
            WhileNotZero => 93,
            EndWhile => 94,
            GreaterThan => 550,
            LessThan => 551,
            Equal => 552,
            NotEqual => 553,
            Test => 554,
            GreaterThanOrEqual => 560,
            LessThanOrEqual => 561,
            EqualZero => 562,
            NotEqualZero => 563,
            TestNot => 564,
            StoreVariable => 570,
            CopyVariable => 571,
            LoadVariable => 572,
            InputInteger => 573,
            OutputInteger => 574,
            Break => 580,
        }
    }

    /// Looks up the operator selected by a digit code.
    pub fn from_code(code: u32) -> Option<Operator> {
        OPERATORS.iter().copied().find(|op| op.code() == code)
    }

    /// Number of base-4 digits in the immediate operand, 0 if none.
    pub fn operand_width(self) -> usize {
        match self {
            Constant8Bit => 4,
            Constant16Bit | StoreVariable | CopyVariable | LoadVariable => 8,
            Constant32Bit => 16,
            _ => 0,
        }
    }

    /// Upper-case mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Count => "COUNT",
            Pop => "POP",
            Copy => "COPY",
            Swap => "SWAP",
            Over => "OVER",
            Increment => "INCREMENT",
            Decrement => "DECREMENT",
            Not => "NOT",
            RotateDown => "ROTATE_DOWN",
            RotateUp => "ROTATE_UP",
            And => "AND",
            Or => "OR",
            Xor => "XOR",
            ShiftRight => "SHIFT_RIGHT",
            ShiftLeft => "SHIFT_LEFT",
            Add => "ADD",
            Subtract => "SUBTRACT",
            Multiply => "MULTIPLY",
            Divide => "DIVIDE",
            Remainder => "REMAINDER",
            GreaterThan => "GREATER_THAN",
            LessThan => "LESS_THAN",
            Equal => "EQUAL",
            NotEqual => "NOT_EQUAL",
            Test => "TEST",
            GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            EqualZero => "EQUAL_ZERO",
            NotEqualZero => "NOT_EQUAL_ZERO",
            TestNot => "TEST_NOT",
            IfNotZero => "IF_NOT_ZERO",
            IfZero => "IF_ZERO",
            EndIf => "END_IF",
            WhileNotZero => "WHILE_NOT_ZERO",
            EndWhile => "END_WHILE",
            Break => "BREAK",
            Constant8Bit => "CONSTANT_8_BIT",
            Constant16Bit => "CONSTANT_16_BIT",
            Constant32Bit => "CONSTANT_32_BIT",
            InputCharacter => "INPUT_CHARACTER",
            OutputCharacter => "OUTPUT_CHARACTER",
            StoreVariable => "STORE_VARIABLE",
            CopyVariable => "COPY_VARIABLE",
            LoadVariable => "LOAD_VARIABLE",
            InputInteger => "INPUT_INTEGER",
            OutputInteger => "OUTPUT_INTEGER",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded operator with its immediate operand.
///
/// `value` is 0 for operators without an operand.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub struct Instruction {
    /// The operator.
    pub operator: Operator,
    /// The immediate operand.
    pub value: u32,
}

impl Instruction {
    /// Creates an instruction with an operand.
    pub fn new(operator: Operator, value: u32) -> Instruction {
        Instruction { operator, value }
    }

    /// The operand as a variable address.
    pub fn address(&self) -> u32 {
        self.value
    }
}

impl From<Operator> for Instruction {
    fn from(operator: Operator) -> Instruction {
        Instruction::new(operator, 0)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(Operator: {}, Value: {})",
            self.operator, self.value
        )
    }
}
