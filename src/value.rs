use std::{cell::RefCell, fmt, rc::Rc};

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::chunk::Chunk;

/// Name of the initializer method invoked when a class is called.
pub const INIT_METHOD: &str = "sang";

/// A runtime value. Primitives carry their payload inline; everything
/// else is shared through an `Rc` so instances, arrays and closures can
/// alias each other freely.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<IndexMap<String, Value>>>),
    Function(Rc<Function>),
    Closure(Rc<Closure>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
    BoundMethod(Rc<BoundMethod>),
    Native(Rc<NativeFunction>),
}

impl Value {
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Bool(value) => !value,
            Value::Number(value) => *value == 0.0,
            Value::String(value) => value.is_empty(),
            _ => false,
        }
    }
}

/// Nil/Bool/Number/String compare by payload, everything else by
/// identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "wang"),
            Value::Bool(true) => write!(f, "jing"),
            Value::Bool(false) => write!(f, "tej"),
            Value::Number(value) => {
                // Hack to be able to print -0.0 as -0. Check https://github.com/rust-lang/rfcs/issues/1074
                if *value == 0.0f64 && value.is_sign_negative() {
                    write!(f, "-{}", value)
                } else {
                    write!(f, "{}", value)
                }
            }
            Value::String(value) => write!(f, "{}", value),
            Value::Array(value) => {
                write!(f, "[")?;
                for (i, element) in value.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Value::Object(value) => {
                write!(f, "{{")?;
                for (i, (key, entry)) in value.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}: {}", key, entry)?;
                }
                write!(f, "}}")
            }
            Value::Function(value) => write!(f, "{}", value),
            Value::Closure(value) => write!(f, "{}", value.function),
            Value::Class(value) => write!(f, "{}", value.name),
            Value::Instance(value) => write!(f, "{} instance", value.class.name),
            Value::BoundMethod(value) => write!(f, "{}", value.method.function),
            Value::Native(_) => write!(f, "<native fn>"),
        }
    }
}

/// How a closure reaches one captured variable, relative to the function
/// that encloses it at creation time.
#[derive(Debug, Copy, Clone)]
pub struct FunctionUpvalue {
    pub index: u8,
    pub is_local: bool,
}

/// A compiled function prototype. Immutable once compilation finishes;
/// every closure over the same definition shares it.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub arity: u8,
    pub chunk: Chunk,
    pub upvalues: Vec<FunctionUpvalue>,
}

impl Function {
    pub fn new(name: &str) -> Self {
        Function {
            name: name.to_owned(),
            arity: 0,
            chunk: Chunk::new(name),
            upvalues: Vec::new(),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.name == "script" {
            write!(f, "<script>")
        } else {
            write!(f, "<fn {}>", self.name)
        }
    }
}

/// A captured variable. Open while its referent still lives on the value
/// stack, closed once the slot has been hoisted into `closed`.
#[derive(Debug)]
pub struct Upvalue {
    pub location: usize,
    pub closed: Option<Value>,
}

impl Upvalue {
    pub fn new(location: usize) -> Self {
        Upvalue {
            location,
            closed: None,
        }
    }
}

#[derive(Debug)]
pub struct Closure {
    pub function: Rc<Function>,
    pub upvalues: Vec<Rc<RefCell<Upvalue>>>,
}

impl Closure {
    pub fn new(function: Rc<Function>) -> Self {
        Closure {
            function,
            upvalues: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub methods: RefCell<AHashMap<Rc<str>, Rc<Closure>>>,
}

impl Class {
    pub fn new(name: &str) -> Self {
        Class {
            name: name.to_owned(),
            methods: RefCell::new(AHashMap::new()),
        }
    }
}

#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: RefCell<AHashMap<Rc<str>, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: RefCell::new(AHashMap::new()),
        }
    }
}

#[derive(Debug)]
pub struct BoundMethod {
    pub receiver: Rc<Instance>,
    pub method: Rc<Closure>,
}

/// A host-supplied callable. The declared arity is advisory; the VM
/// passes whatever the call site supplied.
pub struct NativeFunction {
    pub name: String,
    pub arity: u8,
    pub function: fn(&[Value]) -> Result<Value, String>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> Vec<Value> {
        vec![
            Value::Nil,
            Value::Bool(true),
            Value::Number(2.5),
            Value::String("sawasdee".into()),
            Value::Array(Rc::new(RefCell::new(vec![Value::Number(1.0)]))),
            Value::Object(Rc::new(RefCell::new(IndexMap::new()))),
            Value::Class(Rc::new(Class::new("Krapao"))),
        ]
    }

    #[test]
    fn truthiness() {
        assert!(Value::Nil.is_falsy());
        assert!(Value::Bool(false).is_falsy());
        assert!(Value::Number(0.0).is_falsy());
        assert!(Value::String("".into()).is_falsy());
        assert!(!Value::Bool(true).is_falsy());
        assert!(!Value::Number(0.5).is_falsy());
        assert!(!Value::String("0".into()).is_falsy());
        assert!(!Value::Array(Rc::new(RefCell::new(Vec::new()))).is_falsy());
    }

    #[test]
    fn equality_is_reflexive_for_every_variant() {
        for value in values() {
            assert_eq!(value.clone(), value);
        }
    }

    #[test]
    fn heap_values_compare_by_identity() {
        let a = Value::Array(Rc::new(RefCell::new(vec![Value::Number(1.0)])));
        let b = Value::Array(Rc::new(RefCell::new(vec![Value::Number(1.0)])));
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
        assert_eq!(Value::String("x".into()), Value::String("x".into()));
    }

    #[test]
    fn stringification() {
        assert_eq!(Value::Nil.to_string(), "wang");
        assert_eq!(Value::Bool(true).to_string(), "jing");
        assert_eq!(Value::Bool(false).to_string(), "tej");
        assert_eq!(Value::Number(15.0).to_string(), "15");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        let array = Value::Array(Rc::new(RefCell::new(vec![
            Value::Number(1.0),
            Value::String("a".into()),
        ])));
        assert_eq!(array.to_string(), "[1, a]");
        let mut entries = IndexMap::new();
        entries.insert("a".to_owned(), Value::Number(1.0));
        entries.insert("b".to_owned(), Value::Number(2.0));
        let object = Value::Object(Rc::new(RefCell::new(entries)));
        assert_eq!(object.to_string(), "{a: 1,b: 2}");
    }
}
