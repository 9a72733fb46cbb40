use std::rc::Rc;

use crate::value::Value;

/// One bytecode instruction. Operands travel as payload fields: `u8` for
/// stack slots, constant-pool indices and argument counts, `u16` for
/// jump deltas.
#[derive(Debug, Copy, Clone)]
pub enum Instruction {
    Add,
    Array(u8),
    BitAnd,
    BitNot,
    BitOr,
    BitXor,
    Call(u8),
    Class(u8),
    CloseUpvalue,
    Closure(u8),
    Constant(u8),
    DefineGlobal(u8),
    Divide,
    Dup,
    Equal,
    False,
    GetGlobal(u8),
    GetIndex,
    GetLocal(u8),
    GetProperty(u8),
    GetUpvalue(u8),
    Greater,
    GreaterEqual,
    IncLocal(u8),
    Jump(u16),
    JumpIfFalse(u16),
    JumpIfTrue(u16),
    Less,
    LessEqual,
    LoadOne,
    LoadZero,
    Loop(u16),
    Method(u8),
    Modulo,
    Multiply,
    Negate,
    Not,
    NotEqual,
    Null,
    Object(u8),
    Pop,
    Power,
    Print,
    Return,
    SetGlobal(u8),
    SetIndex,
    SetLocal(u8),
    SetProperty(u8),
    SetUpvalue(u8),
    ShiftLeft,
    ShiftRight,
    Subtract,
    Swap,
    True,
}

/// The compiled body of one function.
#[derive(Debug)]
pub struct Chunk {
    pub code: Vec<Instruction>,
    pub constants: Vec<Value>,
    pub lines: Vec<usize>,
    pub name: String,
}

impl Chunk {
    pub fn new(name: &str) -> Self {
        Chunk {
            code: Vec::new(),
            constants: Vec::new(),
            lines: Vec::new(),
            name: name.to_owned(),
        }
    }

    pub fn write(&mut self, instruction: Instruction, line: usize) -> usize {
        self.code.push(instruction);
        self.lines.push(line);
        self.code.len() - 1
    }

    /// Identical literals share a pool slot. Numbers and strings collapse
    /// by value, heap objects only by identity.
    pub fn add_constant(&mut self, value: Value) -> usize {
        match self.constants.iter().position(|v| *v == value) {
            Some(index) => index,
            None => {
                self.constants.push(value);
                self.constants.len() - 1
            }
        }
    }

    pub fn read_constant(&self, index: u8) -> Value {
        self.constants[index as usize].clone()
    }

    pub fn read_string(&self, index: u8) -> Rc<str> {
        if let Value::String(s) = &self.constants[index as usize] {
            Rc::clone(s)
        } else {
            panic!("Constant is not String!")
        }
    }
}

#[cfg(feature = "trace")]
pub struct Disassembler<'a> {
    chunk: &'a Chunk,
    stack: Option<&'a Vec<Value>>,
}

#[cfg(feature = "trace")]
impl<'a> Disassembler<'a> {
    pub fn new(chunk: &'a Chunk, stack: Option<&'a Vec<Value>>) -> Self {
        Disassembler { chunk, stack }
    }

    pub fn disassemble(&self) {
        println!("== BEGIN {} ==", self.chunk.name);
        for (offset, instruction) in self.chunk.code.iter().enumerate() {
            self.instruction(instruction, offset);
        }
        println!("== END {} ==", self.chunk.name);
        println!();
    }

    pub fn instruction(&self, instruction: &Instruction, offset: usize) {
        self.stack();
        print!("{:04} ", offset);
        let line = self.chunk.lines[offset];
        if offset > 0 && line == self.chunk.lines[offset - 1] {
            print!("   | ");
        } else {
            print!("{:>4} ", line);
        }
        match instruction {
            Instruction::Array(n) => self.operand_instruction("OP_ARRAY", *n),
            Instruction::Call(args) => self.operand_instruction("OP_CALL", *args),
            Instruction::Class(c) => self.const_instruction("OP_CLASS", *c),
            Instruction::Closure(c) => self.const_instruction("OP_CLOSURE", *c),
            Instruction::Constant(c) => self.const_instruction("OP_CONSTANT", *c),
            Instruction::DefineGlobal(c) => self.const_instruction("OP_DEFINE_GLOBAL", *c),
            Instruction::GetGlobal(c) => self.const_instruction("OP_GET_GLOBAL", *c),
            Instruction::GetLocal(s) => self.operand_instruction("OP_GET_LOCAL", *s),
            Instruction::GetProperty(c) => self.const_instruction("OP_GET_PROPERTY", *c),
            Instruction::GetUpvalue(s) => self.operand_instruction("OP_GET_UPVALUE", *s),
            Instruction::IncLocal(s) => self.operand_instruction("OP_INC_LOCAL", *s),
            Instruction::Jump(delta) => self.jump_instruction("OP_JUMP", *delta),
            Instruction::JumpIfFalse(delta) => self.jump_instruction("OP_JUMP_IF_FALSE", *delta),
            Instruction::JumpIfTrue(delta) => self.jump_instruction("OP_JUMP_IF_TRUE", *delta),
            Instruction::Loop(delta) => self.jump_instruction("OP_LOOP", *delta),
            Instruction::Method(c) => self.const_instruction("OP_METHOD", *c),
            Instruction::Object(n) => self.operand_instruction("OP_OBJECT", *n),
            Instruction::SetGlobal(c) => self.const_instruction("OP_SET_GLOBAL", *c),
            Instruction::SetLocal(s) => self.operand_instruction("OP_SET_LOCAL", *s),
            Instruction::SetProperty(c) => self.const_instruction("OP_SET_PROPERTY", *c),
            Instruction::SetUpvalue(s) => self.operand_instruction("OP_SET_UPVALUE", *s),
            other => println!("{}", Self::simple_name(other)),
        }
    }

    fn simple_name(instruction: &Instruction) -> &'static str {
        match instruction {
            Instruction::Add => "OP_ADD",
            Instruction::BitAnd => "OP_BIT_AND",
            Instruction::BitNot => "OP_BIT_NOT",
            Instruction::BitOr => "OP_BIT_OR",
            Instruction::BitXor => "OP_BIT_XOR",
            Instruction::CloseUpvalue => "OP_CLOSE_UPVALUE",
            Instruction::Divide => "OP_DIVIDE",
            Instruction::Dup => "OP_DUP",
            Instruction::Equal => "OP_EQUAL",
            Instruction::False => "OP_FALSE",
            Instruction::GetIndex => "OP_GET_INDEX",
            Instruction::Greater => "OP_GREATER",
            Instruction::GreaterEqual => "OP_GREATER_EQUAL",
            Instruction::Less => "OP_LESS",
            Instruction::LessEqual => "OP_LESS_EQUAL",
            Instruction::LoadOne => "OP_LOAD_ONE",
            Instruction::LoadZero => "OP_LOAD_ZERO",
            Instruction::Modulo => "OP_MODULO",
            Instruction::Multiply => "OP_MULTIPLY",
            Instruction::Negate => "OP_NEGATE",
            Instruction::Not => "OP_NOT",
            Instruction::NotEqual => "OP_NOT_EQUAL",
            Instruction::Null => "OP_NULL",
            Instruction::Pop => "OP_POP",
            Instruction::Power => "OP_POWER",
            Instruction::Print => "OP_PRINT",
            Instruction::Return => "OP_RETURN",
            Instruction::SetIndex => "OP_SET_INDEX",
            Instruction::ShiftLeft => "OP_SHIFT_LEFT",
            Instruction::ShiftRight => "OP_SHIFT_RIGHT",
            Instruction::Subtract => "OP_SUBTRACT",
            Instruction::Swap => "OP_SWAP",
            Instruction::True => "OP_TRUE",
            _ => unreachable!(),
        }
    }

    fn const_instruction(&self, instruction: &str, constant_index: u8) {
        let value = &self.chunk.constants[constant_index as usize];
        println!("{:<16} {:4} ({})", instruction, constant_index, value);
    }

    fn operand_instruction(&self, instruction: &str, operand: u8) {
        println!("{:<16} {:4}", instruction, operand);
    }

    fn jump_instruction(&self, instruction: &str, delta: u16) {
        println!("{:<16} {:4}", instruction, delta);
    }

    fn stack(&self) {
        if let Some(stack) = self.stack {
            print!(" S: ");
            for value in stack.iter() {
                print!("[{}]", value);
            }
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_deduplicate_by_value() {
        let mut chunk = Chunk::new("test");
        let a = chunk.add_constant(Value::Number(42.0));
        let b = chunk.add_constant(Value::String("chai".into()));
        let c = chunk.add_constant(Value::Number(42.0));
        let d = chunk.add_constant(Value::String("chai".into()));
        assert_eq!(a, c);
        assert_eq!(b, d);
        assert_eq!(chunk.constants.len(), 2);
    }

    #[test]
    fn distinct_constants_get_distinct_slots() {
        let mut chunk = Chunk::new("test");
        let a = chunk.add_constant(Value::Number(1.0));
        let b = chunk.add_constant(Value::Number(2.0));
        assert_ne!(a, b);
    }

    #[test]
    fn lines_run_parallel_to_code() {
        let mut chunk = Chunk::new("test");
        chunk.write(Instruction::True, 1);
        chunk.write(Instruction::Print, 1);
        chunk.write(Instruction::Null, 2);
        assert_eq!(chunk.code.len(), chunk.lines.len());
        assert_eq!(chunk.lines, vec![1, 1, 2]);
    }
}
