//! Runtime value model: the closed variant set the evaluator computes with,
//! plus the function/class/instance object model.
//!
//! Ownership follows the environment chain: function values alias their
//! declaration (`Rc<FunctionDecl>`) and captured closure
//! (`Rc<RefCell<Environment>>`); instances are shared mutable cells so every
//! bound method sees the same field table.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::parser::FunctionDecl;

/// Signature of a host-provided native function.  Natives report failures
/// as plain messages; the interpreter attaches the call-site line.
pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

/// A runtime value.  Closed variant set: equality, truthiness, and string
/// conversion are defined over exactly these.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),

    /// Host function injected into the globals by the driver.
    NativeFunction {
        name: String,
        arity: usize,
        func: NativeFn,
    },

    /// User function or bound method (a closure).
    Function(Rc<LoxFunction>),

    /// A class; itself callable as a constructor.
    Class(Rc<LoxClass>),

    /// An object constructed from a class.
    Instance(Rc<RefCell<LoxInstance>>),
}

impl PartialEq for Value {
    /// Structural equality by variant, no cross-variant coercion.
    /// Callables and instances compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (
                Value::NativeFunction { name: a, func: f, .. },
                Value::NativeFunction { name: b, func: g, .. },
            ) => a == b && f == g,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                // Integral values print without the trailing ".0".
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction { .. } => write!(f, "<native fn>"),

            Value::Function(func) => write!(f, "<fn {} >", func.declaration.name.lexeme),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => {
                write!(f, "{} instance", instance.borrow().class.name)
            }
        }
    }
}

/// A user-declared function together with the environment captured at its
/// definition site.  Bound methods are `LoxFunction`s whose closure has one
/// extra scope defining `this`.
#[derive(Debug)]
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produce a fresh function value whose closure is extended with one
    /// scope binding `this` to `instance`.  The declaration is shared.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.closure,
        ))));

        environment.borrow_mut().define("this", instance);

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }
}

/// A class value: a name plus its method table.  Single level - there is no
/// superclass chain.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.methods.get(name).map(Rc::clone)
    }

    /// Constructor arity is the initializer's arity, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }
}

/// Instance state: a class reference plus the mutable field table.  Method
/// lookup falls back to the class; fields shadow methods.
#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    pub fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }
}
