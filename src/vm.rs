use std::{cell::RefCell, rc::Rc};

use ahash::AHashMap;
use indexmap::IndexMap;
use tracing::debug;

use crate::{
    chunk::Instruction,
    error::RuntimeError,
    natives,
    value::{
        BoundMethod, Class, Closure, Function, Instance, NativeFunction, Upvalue, Value,
        INIT_METHOD,
    },
};

const FRAMES_MAX: usize = 256;
const STACK_MAX: usize = 4096;

struct CallFrame {
    closure: Rc<Closure>,
    ip: usize,
    slot_base: usize,
}

pub struct Vm {
    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    globals: AHashMap<Rc<str>, Value>,
    open_upvalues: Vec<Rc<RefCell<Upvalue>>>,
    output: Box<dyn FnMut(&str)>,
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self::with_output(Box::new(|text| println!("{}", text)))
    }

    /// Build a VM whose prints go through the given sink instead of
    /// stdout. The default native set is preloaded into globals.
    pub fn with_output(output: Box<dyn FnMut(&str)>) -> Self {
        let mut vm = Vm {
            stack: Vec::with_capacity(STACK_MAX),
            frames: Vec::with_capacity(FRAMES_MAX),
            globals: AHashMap::new(),
            open_upvalues: Vec::new(),
            output,
        };
        natives::install(&mut vm);
        vm
    }

    pub fn define_native(
        &mut self,
        name: &str,
        arity: u8,
        function: fn(&[Value]) -> Result<Value, String>,
    ) {
        let native = NativeFunction {
            name: name.to_owned(),
            arity,
            function,
        };
        self.globals
            .insert(Rc::from(name), Value::Native(Rc::new(native)));
    }

    /// Run a compiled top-level function to completion or to the first
    /// fault. Globals survive between runs; everything else is reset.
    pub fn run(&mut self, function: Rc<Function>) -> Result<Value, RuntimeError> {
        debug!(script = %function.name, "starting run");
        self.stack.clear();
        self.frames.clear();
        self.open_upvalues.clear();

        let closure = Rc::new(Closure::new(function));
        self.stack.push(Value::Closure(Rc::clone(&closure)));
        let mut frame = CallFrame {
            closure,
            ip: 0,
            slot_base: 0,
        };

        loop {
            if self.stack.len() > STACK_MAX {
                return Err(self.runtime_error(&frame, "Stack overflow."));
            }

            let instruction = frame.closure.function.chunk.code[frame.ip];

            #[cfg(feature = "trace")]
            crate::chunk::Disassembler::new(&frame.closure.function.chunk, Some(&self.stack))
                .instruction(&instruction, frame.ip);

            frame.ip += 1;

            match instruction {
                Instruction::Add => {
                    let b = self.pop();
                    let a = self.pop();
                    match (&a, &b) {
                        (Value::Number(x), Value::Number(y)) => self.push(Value::Number(x + y)),
                        (Value::String(_), _) | (_, Value::String(_)) => {
                            self.push(Value::String(format!("{}{}", a, b).into()));
                        }
                        _ => {
                            return Err(
                                self.runtime_error(&frame, "Operands must be numbers or strings.")
                            )
                        }
                    }
                }
                Instruction::Subtract => {
                    self.binary_op(&frame, |a, b| a - b, Value::Number)?;
                }
                Instruction::Multiply => {
                    self.binary_op(&frame, |a, b| a * b, Value::Number)?;
                }
                Instruction::Divide => {
                    let b = self.pop();
                    let a = self.pop();
                    match (a, b) {
                        (Value::Number(_), Value::Number(y)) if y == 0.0 => {
                            return Err(self.runtime_error(&frame, "Division by zero."));
                        }
                        (Value::Number(x), Value::Number(y)) => self.push(Value::Number(x / y)),
                        _ => return Err(self.runtime_error(&frame, "Operands must be numbers.")),
                    }
                }
                Instruction::Modulo => {
                    let b = self.pop();
                    let a = self.pop();
                    match (a, b) {
                        (Value::Number(_), Value::Number(y)) if y == 0.0 => {
                            return Err(self.runtime_error(&frame, "Division by zero."));
                        }
                        (Value::Number(x), Value::Number(y)) => self.push(Value::Number(x % y)),
                        _ => return Err(self.runtime_error(&frame, "Operands must be numbers.")),
                    }
                }
                Instruction::Power => {
                    self.binary_op(&frame, |a, b| a.powf(b), Value::Number)?;
                }
                Instruction::Negate => {
                    let value = self.pop();
                    if let Value::Number(value) = value {
                        self.push(Value::Number(-value));
                    } else {
                        return Err(self.runtime_error(&frame, "Operand must be a number."));
                    }
                }
                Instruction::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(a == b));
                }
                Instruction::NotEqual => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(a != b));
                }
                Instruction::Greater => {
                    self.binary_op(&frame, |a, b| a > b, Value::Bool)?;
                }
                Instruction::GreaterEqual => {
                    self.binary_op(&frame, |a, b| a >= b, Value::Bool)?;
                }
                Instruction::Less => {
                    self.binary_op(&frame, |a, b| a < b, Value::Bool)?;
                }
                Instruction::LessEqual => {
                    self.binary_op(&frame, |a, b| a <= b, Value::Bool)?;
                }
                Instruction::Not => {
                    let value = self.pop();
                    self.push(Value::Bool(value.is_falsy()));
                }
                Instruction::BitAnd => {
                    self.bitwise_op(&frame, |a, b| a & b)?;
                }
                Instruction::BitOr => {
                    self.bitwise_op(&frame, |a, b| a | b)?;
                }
                Instruction::BitXor => {
                    self.bitwise_op(&frame, |a, b| a ^ b)?;
                }
                Instruction::ShiftLeft => {
                    self.bitwise_op(&frame, |a, b| a << (b & 0x1f))?;
                }
                Instruction::ShiftRight => {
                    self.bitwise_op(&frame, |a, b| a >> (b & 0x1f))?;
                }
                Instruction::BitNot => {
                    let value = self.pop();
                    if let Value::Number(value) = value {
                        self.push(Value::Number(!as_int32(value) as f64));
                    } else {
                        return Err(self.runtime_error(&frame, "Operand must be a number."));
                    }
                }
                Instruction::True => self.push(Value::Bool(true)),
                Instruction::False => self.push(Value::Bool(false)),
                Instruction::Null => self.push(Value::Nil),
                Instruction::LoadZero => self.push(Value::Number(0.0)),
                Instruction::LoadOne => self.push(Value::Number(1.0)),
                Instruction::Constant(index) => {
                    let value = frame.closure.function.chunk.read_constant(index);
                    self.push(value);
                }
                Instruction::Pop => {
                    self.pop();
                }
                Instruction::Dup => {
                    let value = self.peek(0);
                    self.push(value);
                }
                Instruction::Swap => {
                    let top = self.stack.len() - 1;
                    self.stack.swap(top, top - 1);
                }
                Instruction::DefineGlobal(index) => {
                    let name = frame.closure.function.chunk.read_string(index);
                    let value = self.pop();
                    self.globals.insert(name, value);
                }
                Instruction::GetGlobal(index) => {
                    let name = frame.closure.function.chunk.read_string(index);
                    match self.globals.get(&name) {
                        Some(value) => {
                            let value = value.clone();
                            self.push(value);
                        }
                        None => {
                            let message = format!("Undefined variable '{}'.", name);
                            return Err(self.runtime_error(&frame, &message));
                        }
                    }
                }
                Instruction::SetGlobal(index) => {
                    let name = frame.closure.function.chunk.read_string(index);
                    let value = self.peek(0);
                    match self.globals.get_mut(&name) {
                        Some(slot) => *slot = value,
                        None => {
                            let message = format!("Undefined variable '{}'.", name);
                            return Err(self.runtime_error(&frame, &message));
                        }
                    }
                }
                Instruction::GetLocal(slot) => {
                    let value = self.stack[frame.slot_base + slot as usize].clone();
                    self.push(value);
                }
                Instruction::SetLocal(slot) => {
                    let value = self.peek(0);
                    self.stack[frame.slot_base + slot as usize] = value;
                }
                Instruction::IncLocal(slot) => {
                    let index = frame.slot_base + slot as usize;
                    match &mut self.stack[index] {
                        Value::Number(value) => *value += 1.0,
                        _ => {
                            return Err(self.runtime_error(&frame, "Loop counter must be a number."))
                        }
                    }
                }
                Instruction::GetUpvalue(slot) => {
                    let value = {
                        let upvalue = frame.closure.upvalues[slot as usize].borrow();
                        match &upvalue.closed {
                            Some(value) => value.clone(),
                            None => self.stack[upvalue.location].clone(),
                        }
                    };
                    self.push(value);
                }
                Instruction::SetUpvalue(slot) => {
                    let value = self.peek(0);
                    let mut upvalue = frame.closure.upvalues[slot as usize].borrow_mut();
                    if upvalue.closed.is_none() {
                        self.stack[upvalue.location] = value;
                    } else {
                        upvalue.closed = Some(value);
                    }
                }
                Instruction::CloseUpvalue => {
                    let top = self.stack.len() - 1;
                    self.close_upvalues(top);
                    self.pop();
                }
                Instruction::Closure(index) => {
                    let constant = frame.closure.function.chunk.read_constant(index);
                    if let Value::Function(function) = constant {
                        let mut upvalues = Vec::with_capacity(function.upvalues.len());
                        for info in function.upvalues.iter() {
                            let upvalue = if info.is_local {
                                self.capture_upvalue(frame.slot_base + info.index as usize)
                            } else {
                                Rc::clone(&frame.closure.upvalues[info.index as usize])
                            };
                            upvalues.push(upvalue);
                        }
                        self.push(Value::Closure(Rc::new(Closure { function, upvalues })));
                    }
                }
                Instruction::Jump(delta) => {
                    frame.ip += delta as usize;
                }
                Instruction::JumpIfFalse(delta) => {
                    if self.peek(0).is_falsy() {
                        frame.ip += delta as usize;
                    }
                }
                Instruction::JumpIfTrue(delta) => {
                    if !self.peek(0).is_falsy() {
                        frame.ip += delta as usize;
                    }
                }
                Instruction::Loop(delta) => {
                    frame.ip -= delta as usize + 1;
                }
                Instruction::Call(arg_count) => {
                    frame = self.call_value(frame, arg_count)?;
                }
                Instruction::Return => {
                    let result = self.pop();
                    self.close_upvalues(frame.slot_base);
                    match self.frames.pop() {
                        Some(enclosing) => {
                            self.stack.truncate(frame.slot_base);
                            self.push(result);
                            frame = enclosing;
                        }
                        None => {
                            self.stack.truncate(frame.slot_base);
                            return Ok(result);
                        }
                    }
                }
                Instruction::Class(index) => {
                    let name = frame.closure.function.chunk.read_string(index);
                    self.push(Value::Class(Rc::new(Class::new(&name))));
                }
                Instruction::Method(index) => {
                    let name = frame.closure.function.chunk.read_string(index);
                    let method = self.pop();
                    let class = self.peek(0);
                    match (class, method) {
                        (Value::Class(class), Value::Closure(closure)) => {
                            class.methods.borrow_mut().insert(name, closure);
                        }
                        _ => {
                            return Err(
                                self.runtime_error(&frame, "Methods can only be added to classes.")
                            )
                        }
                    }
                }
                Instruction::GetProperty(index) => {
                    let name = frame.closure.function.chunk.read_string(index);
                    let object = self.pop();
                    match &object {
                        Value::Instance(instance) => {
                            // Fields shadow methods.
                            let field = instance.fields.borrow().get(&name).cloned();
                            if let Some(value) = field {
                                self.push(value);
                            } else {
                                let method = instance.class.methods.borrow().get(&name).cloned();
                                match method {
                                    Some(method) => {
                                        let bound = BoundMethod {
                                            receiver: Rc::clone(instance),
                                            method,
                                        };
                                        self.push(Value::BoundMethod(Rc::new(bound)));
                                    }
                                    None => {
                                        let message = format!("Undefined property '{}'.", name);
                                        return Err(self.runtime_error(&frame, &message));
                                    }
                                }
                            }
                        }
                        Value::Object(entries) => {
                            let value = entries.borrow().get(name.as_ref()).cloned();
                            match value {
                                Some(value) => self.push(value),
                                None => {
                                    let message = format!("Undefined property '{}'.", name);
                                    return Err(self.runtime_error(&frame, &message));
                                }
                            }
                        }
                        _ => {
                            return Err(self
                                .runtime_error(&frame, "Only instances and objects have properties."))
                        }
                    }
                }
                Instruction::SetProperty(index) => {
                    let name = frame.closure.function.chunk.read_string(index);
                    let value = self.pop();
                    let object = self.pop();
                    match object {
                        Value::Instance(instance) => {
                            instance.fields.borrow_mut().insert(name, value.clone());
                        }
                        Value::Object(entries) => {
                            entries.borrow_mut().insert(name.to_string(), value.clone());
                        }
                        _ => {
                            return Err(self
                                .runtime_error(&frame, "Only instances and objects have properties."))
                        }
                    }
                    self.push(value);
                }
                Instruction::Array(count) => {
                    let first = self.stack.len() - count as usize;
                    let elements = self.stack.split_off(first);
                    self.push(Value::Array(Rc::new(RefCell::new(elements))));
                }
                Instruction::Object(count) => {
                    let first = self.stack.len() - 2 * count as usize;
                    let mut entries = IndexMap::with_capacity(count as usize);
                    for pair in self.stack.split_off(first).chunks_exact(2) {
                        entries.insert(pair[0].to_string(), pair[1].clone());
                    }
                    self.push(Value::Object(Rc::new(RefCell::new(entries))));
                }
                Instruction::GetIndex => {
                    let index = self.pop();
                    let object = self.pop();
                    match (&object, &index) {
                        (Value::Array(elements), Value::Number(n)) => {
                            let i = self.element_index(&frame, *n)?;
                            let value = elements.borrow().get(i).cloned().unwrap_or(Value::Nil);
                            self.push(value);
                        }
                        (Value::Array(_), _) => {
                            return Err(self.runtime_error(&frame, "Array index must be a number."))
                        }
                        (Value::Object(entries), key) => {
                            let value = entries.borrow().get(&key.to_string()).cloned();
                            self.push(value.unwrap_or(Value::Nil));
                        }
                        (Value::String(s), Value::Number(n)) => {
                            let i = self.element_index(&frame, *n)?;
                            let value = s
                                .chars()
                                .nth(i)
                                .map(|c| Value::String(c.to_string().into()))
                                .unwrap_or(Value::Nil);
                            self.push(value);
                        }
                        (Value::String(_), _) => {
                            return Err(self.runtime_error(&frame, "String index must be a number."))
                        }
                        _ => {
                            return Err(self.runtime_error(
                                &frame,
                                "Only arrays, objects, and strings can be indexed.",
                            ))
                        }
                    }
                }
                Instruction::SetIndex => {
                    let value = self.pop();
                    let index = self.pop();
                    let object = self.pop();
                    match (&object, &index) {
                        (Value::Array(elements), Value::Number(n)) => {
                            let i = self.element_index(&frame, *n)?;
                            let mut elements = elements.borrow_mut();
                            if i >= elements.len() {
                                // Writes past the end extend with wang.
                                elements.resize(i + 1, Value::Nil);
                            }
                            elements[i] = value.clone();
                        }
                        (Value::Array(_), _) => {
                            return Err(self.runtime_error(&frame, "Array index must be a number."))
                        }
                        (Value::Object(entries), key) => {
                            entries.borrow_mut().insert(key.to_string(), value.clone());
                        }
                        (Value::String(_), _) => {
                            return Err(self
                                .runtime_error(&frame, "Strings do not support indexed assignment."))
                        }
                        _ => {
                            return Err(self.runtime_error(
                                &frame,
                                "Only arrays and objects support indexed assignment.",
                            ))
                        }
                    }
                    self.push(value);
                }
                Instruction::Print => {
                    let value = self.pop();
                    let text = value.to_string();
                    (self.output)(&text);
                }
            }
        }
    }

    fn binary_op<T>(
        &mut self,
        frame: &CallFrame,
        f: fn(f64, f64) -> T,
        wrap: fn(T) -> Value,
    ) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        match (a, b) {
            (Value::Number(a), Value::Number(b)) => {
                self.push(wrap(f(a, b)));
                Ok(())
            }
            _ => Err(self.runtime_error(frame, "Operands must be numbers.")),
        }
    }

    fn bitwise_op(&mut self, frame: &CallFrame, f: fn(i32, i32) -> i32) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        match (a, b) {
            (Value::Number(a), Value::Number(b)) => {
                self.push(Value::Number(f(as_int32(a), as_int32(b)) as f64));
                Ok(())
            }
            _ => Err(self.runtime_error(frame, "Operands must be numbers.")),
        }
    }

    fn element_index(&self, frame: &CallFrame, n: f64) -> Result<usize, RuntimeError> {
        if n < 0.0 || n.fract() != 0.0 {
            Err(self.runtime_error(frame, "Index must be a non-negative integer."))
        } else {
            Ok(n as usize)
        }
    }

    fn call_value(&mut self, frame: CallFrame, arg_count: u8) -> Result<CallFrame, RuntimeError> {
        let arg_count = arg_count as usize;
        let callee = self.peek(arg_count);
        match callee {
            Value::Closure(closure) => self.call(frame, closure, arg_count),
            Value::Class(class) => {
                let base = self.stack.len() - arg_count - 1;
                let instance = Rc::new(Instance::new(Rc::clone(&class)));
                self.stack[base] = Value::Instance(instance);
                let initializer = class.methods.borrow().get(INIT_METHOD).cloned();
                match initializer {
                    Some(initializer) => self.call(frame, initializer, arg_count),
                    None if arg_count != 0 => {
                        let message = format!("Expected 0 arguments but got {}.", arg_count);
                        Err(self.runtime_error(&frame, &message))
                    }
                    None => Ok(frame),
                }
            }
            Value::BoundMethod(bound) => {
                let base = self.stack.len() - arg_count - 1;
                self.stack[base] = Value::Instance(Rc::clone(&bound.receiver));
                self.call(frame, Rc::clone(&bound.method), arg_count)
            }
            Value::Native(native) => {
                let first_arg = self.stack.len() - arg_count;
                let args = self.stack.split_off(first_arg);
                self.stack.pop();
                match (native.function)(&args) {
                    Ok(result) => {
                        self.push(result);
                        Ok(frame)
                    }
                    Err(message) => Err(self.runtime_error(&frame, &message)),
                }
            }
            _ => Err(self.runtime_error(&frame, "Can only call functions and classes.")),
        }
    }

    fn call(
        &mut self,
        frame: CallFrame,
        closure: Rc<Closure>,
        arg_count: usize,
    ) -> Result<CallFrame, RuntimeError> {
        if arg_count != closure.function.arity as usize {
            let message = format!(
                "Expected {} arguments but got {}.",
                closure.function.arity, arg_count
            );
            Err(self.runtime_error(&frame, &message))
        } else if self.frames.len() == FRAMES_MAX {
            Err(self.runtime_error(&frame, "Stack overflow."))
        } else {
            let slot_base = self.stack.len() - arg_count - 1;
            self.frames.push(frame);
            Ok(CallFrame {
                closure,
                ip: 0,
                slot_base,
            })
        }
    }

    /// Close every open upvalue whose slot is at or above `last`.
    fn close_upvalues(&mut self, last: usize) {
        let mut i = 0;
        while i != self.open_upvalues.len() {
            let location = self.open_upvalues[i].borrow().location;
            if location >= last {
                let upvalue = self.open_upvalues.remove(i);
                let value = self.stack[location].clone();
                upvalue.borrow_mut().closed = Some(value);
            } else {
                i += 1;
            }
        }
    }

    /// One open upvalue per stack slot: reuse an existing handle so every
    /// closure over the same variable sees the same storage.
    fn capture_upvalue(&mut self, location: usize) -> Rc<RefCell<Upvalue>> {
        for upvalue in self.open_upvalues.iter() {
            if upvalue.borrow().location == location {
                return Rc::clone(upvalue);
            }
        }
        let upvalue = Rc::new(RefCell::new(Upvalue::new(location)));
        self.open_upvalues.push(Rc::clone(&upvalue));
        upvalue
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("Empty stack")
    }

    fn peek(&self, distance: usize) -> Value {
        self.stack[self.stack.len() - 1 - distance].clone()
    }

    fn runtime_error(&self, frame: &CallFrame, message: &str) -> RuntimeError {
        let chunk = &frame.closure.function.chunk;
        let line = chunk.lines[frame.ip.saturating_sub(1)];
        RuntimeError::new(line, message)
    }
}

fn as_int32(value: f64) -> i32 {
    value.trunc() as i64 as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compiler, parser};

    fn run_source(source: &str) -> (Vec<String>, Result<Value, RuntimeError>) {
        let output = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&output);
        let mut vm = Vm::with_output(Box::new(move |text| sink.borrow_mut().push(text.to_owned())));
        let program = parser::parse(source).expect("parse error");
        let function = compiler::compile(&program).expect("compile error");
        let result = vm.run(function);
        let lines = output.borrow().clone();
        (lines, result)
    }

    fn expect_output(source: &str, expected: &[&str]) {
        let (lines, result) = run_source(source);
        result.expect("runtime error");
        assert_eq!(lines, expected);
    }

    fn expect_fault(source: &str, message: &str) -> RuntimeError {
        let (_, result) = run_source(source);
        let error = result.expect_err("expected a runtime fault");
        assert!(
            error.message.contains(message),
            "fault {:?} does not contain {:?}",
            error.message,
            message
        );
        error
    }

    #[test]
    fn arithmetic_and_variables() {
        expect_output("ao x = 10\nda x + 5\n", &["15"]);
    }

    #[test]
    fn while_loop_and_mutation() {
        expect_output(
            "ao i = 0\nwonn i < 3\n  da i\n  i = i + 1\njob\n",
            &["0", "1", "2"],
        );
    }

    #[test]
    fn closure_counter_shares_state_after_return() {
        expect_output(
            "kian make()\n  ao n = 0\n  kuun kian()\n    n = n + 1\n    kuun n\n  job\njob\nao c = make()\nda c()\nda c()\n",
            &["1", "2"],
        );
    }

    #[test]
    fn sibling_closures_share_one_upvalue() {
        let source = "\
kian make()
  ao n = 0
  ao inc = kian()
    n = n + 1
    kuun n
  job
  ao get = kian()
    kuun n
  job
  kuun [inc, get]
job
ao fns = make()
fns[0]()
fns[0]()
da fns[1]()
";
        expect_output(source, &["2"]);
    }

    #[test]
    fn class_with_initializer_and_method() {
        expect_output(
            "klum Box\n  kian sang(v)\n    ni.v = v\n  job\n  kian get()\n    kuun ni.v\n  job\njob\nao b = mai Box(7)\nda b.get()\n",
            &["7"],
        );
    }

    #[test]
    fn initializer_result_is_the_instance() {
        expect_output(
            "klum Krapao\n  kian sang()\n    kuun 99\n  job\njob\nda mai Krapao()\n",
            &["Krapao instance"],
        );
    }

    #[test]
    fn fields_shadow_methods() {
        expect_output(
            "klum A\n  kian f()\n    kuun 1\n  job\njob\nao a = mai A()\nda a.f()\na.f = kian()\n  kuun 2\njob\nda a.f()\n",
            &["1", "2"],
        );
    }

    #[test]
    fn switch_runs_only_first_match() {
        expect_output(
            "ao x = 2\ncheek x\n  karani 1: da \"one\"\n  karani 2: da \"two\"\n  karani 3: da \"three\"\njob\n",
            &["two"],
        );
    }

    #[test]
    fn switch_default_runs_when_nothing_matches() {
        expect_output(
            "cheek 9\n  karani 1: da \"one\"\n  pokati: da \"other\"\njob\n",
            &["other"],
        );
    }

    #[test]
    fn short_circuit_skips_right_operand() {
        let source = "\
kian side(v)
  da \"side\"
  kuun v
job
tej && side(jing)
jing || side(jing)
da \"quiet\"
jing && side(jing)
tej || side(jing)
";
        expect_output(source, &["quiet", "side", "side"]);
    }

    #[test]
    fn ternary_evaluates_one_branch() {
        let source = "\
kian side(v)
  da v
  kuun v
job
da jing ? 1 : side(2)
da tej ? side(3) : 4
";
        expect_output(source, &["1", "4"]);
    }

    #[test]
    fn division_by_zero_faults_with_line_and_prints_nothing() {
        let (lines, result) = run_source("da 1 / 0\n");
        let error = result.expect_err("expected a runtime fault");
        assert_eq!(error.message, "Division by zero.");
        assert_eq!(error.line, 1);
        assert!(lines.is_empty());
    }

    #[test]
    fn wrong_arity_faults() {
        expect_fault(
            "kian f(a)\n  kuun a\njob\nf(1, 2)\n",
            "Expected 1 arguments but got 2.",
        );
    }

    #[test]
    fn calling_a_number_faults() {
        expect_fault("ao x = 1\nx()\n", "Can only call functions and classes.");
    }

    #[test]
    fn undefined_global_read_and_write_fault() {
        expect_fault("da boo\n", "Undefined variable 'boo'.");
        expect_fault("boo = 1\n", "Undefined variable 'boo'.");
    }

    #[test]
    fn class_without_initializer_rejects_arguments() {
        expect_fault(
            "klum A\njob\nmai A(1)\n",
            "Expected 0 arguments but got 1.",
        );
    }

    #[test]
    fn deep_recursion_overflows_the_frame_stack() {
        expect_fault("kian f()\n  kuun f()\njob\nf()\n", "Stack overflow.");
    }

    #[test]
    fn stack_is_balanced_after_blocks_and_calls() {
        let output = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&output);
        let mut vm = Vm::with_output(Box::new(move |text| sink.borrow_mut().push(text.to_owned())));
        let source = "\
ao result = 0
tha jing
  ao a = 1
  tha jing
    ao b = 2
    result = a + b
  job
job
kian f(x)
  ao y = x + 1
  kuun y
job
result = result + f(1)
da result
";
        let program = parser::parse(source).expect("parse error");
        let function = compiler::compile(&program).expect("compile error");
        vm.run(function).expect("runtime error");
        assert!(vm.stack.is_empty());
        assert_eq!(*output.borrow(), vec!["5"]);
    }

    #[test]
    fn object_keys_keep_first_insertion_order() {
        expect_output(
            "ao o = {b: 1, a: 2}\no.b = 3\no[\"c\"] = 4\nda o\n",
            &["{b: 3,a: 2,c: 4}"],
        );
    }

    #[test]
    fn array_reads_are_lenient_and_writes_extend() {
        expect_output(
            "ao a = [1, 2]\nda a[5]\na[3] = 9\nda a\n",
            &["wang", "[1, 2, wang, 9]"],
        );
    }

    #[test]
    fn string_indexing_yields_single_characters() {
        expect_output(
            "ao s = \"pad\"\nda s[0]\nda s[9]\nda \"ไทย\"[1]\n",
            &["p", "wang", "ท"],
        );
    }

    #[test]
    fn string_index_write_faults() {
        expect_fault(
            "ao s = \"pad\"\ns[0] = \"q\"\n",
            "Strings do not support indexed assignment.",
        );
    }

    #[test]
    fn bitwise_operators_use_int32_semantics() {
        expect_output(
            "da 6 & 3\nda 6 | 3\nda 6 ^ 3\nda 1 << 4\nda -8 >> 1\nda ~0\nda 7.9 & 7\n",
            &["2", "7", "5", "16", "-4", "-1", "7"],
        );
    }

    #[test]
    fn add_concatenates_when_either_side_is_a_string() {
        expect_output(
            "da \"a\" + 1\nda 1 + \"a\"\nda \"a\" + \"b\"\n",
            &["a1", "1a", "ab"],
        );
    }

    #[test]
    fn comparing_mixed_types_faults() {
        expect_fault("da \"a\" < 1\n", "Operands must be numbers.");
    }

    #[test]
    fn equality_follows_identity_for_heap_values() {
        expect_output(
            "ao a = [1]\nao b = [1]\nda a == b\nda a == a\nda \"x\" == \"x\"\nda wang == wang\n",
            &["tej", "jing", "jing", "jing"],
        );
    }

    #[test]
    fn break_and_continue() {
        let source = "\
ao i = 0
wonn jing
  i = i + 1
  tha i == 3
    yut
  job
  da i
job
ao j = 0
wonn j < 5
  j = j + 1
  tha j % 2 == 0
    tor
  job
  da j
job
";
        expect_output(source, &["1", "2", "1", "3", "5"]);
    }

    #[test]
    fn counted_for_and_step() {
        expect_output(
            "samrap i = 0 thueng 3\n  da i\njob\nsamrap j = 0 thueng 5 kao 2\n  da j\njob\n",
            &["0", "1", "2", "0", "2", "4"],
        );
    }

    #[test]
    fn natives_are_preloaded_into_globals() {
        expect_output("da clock() >= 0\n", &["jing"]);
    }

    #[test]
    fn globals_survive_between_runs() {
        let mut vm = Vm::with_output(Box::new(|_| ()));
        let first = parser::parse("ao x = 41\n").expect("parse error");
        vm.run(compiler::compile(&first).expect("compile error"))
            .expect("runtime error");
        let output = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&output);
        vm.output = Box::new(move |text| sink.borrow_mut().push(text.to_owned()));
        let second = parser::parse("da x + 1\n").expect("parse error");
        vm.run(compiler::compile(&second).expect("compile error"))
            .expect("runtime error");
        assert_eq!(*output.borrow(), vec!["42"]);
    }

    #[test]
    fn print_writes_one_line_per_argument() {
        expect_output("da 1, 2, 1 + 2\n", &["1", "2", "3"]);
    }

    #[test]
    fn await_and_spread_are_transparent() {
        expect_output(
            "kian f(x)\n  kuun x\njob\nda ror f(5)\nda [...[1, 2]]\n",
            &["5", "[[1, 2]]"],
        );
    }
}
