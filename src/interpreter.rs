//! Tree-walking evaluator.
//!
//! Executes statements and evaluates expressions against a chain of mutable
//! scopes ([`Environment`]), using the resolver's scope distances to jump
//! directly to the right environment instead of searching by name.
//!
//! Two things unwind through statement execution, on separate channels of
//! [`InterpretError`]:
//!
//! - a **runtime error** ([`RuntimeError`]), which aborts the current
//!   top-level statement and is surfaced to the driver;
//! - a **`return` signal**, which is pure control transfer: it unwinds to
//!   the nearest function-call boundary carrying the returned value and is
//!   absorbed there, never reported.
//!
//! Every block and call saves the active environment pointer and restores
//! it on *every* exit path, so no frame leaks a partially-entered scope.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Stdout, Write};
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use log::{debug, info};
use thiserror::Error;

use crate::environment::Environment;
use crate::error::{LoxError, Result as LoxResult, RuntimeError};
use crate::parser::{Expr, ExprId, LiteralValue, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, NativeFn, Value};

/// Everything that can unwind out of statement execution.
#[derive(Error, Debug)]
pub enum InterpretError {
    /// A genuine runtime failure.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// The `return` control-flow signal.  Not a failure: absorbed at the
    /// nearest enclosing function-call boundary.
    #[error("return {0}")]
    Return(Value),

    /// Failure writing to the output collaborator.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenient alias for evaluator-internal results.
pub type IResult<T> = Result<T, InterpretError>;

/// The evaluator.  `W` is the `print` output collaborator; stdout in the
/// driver, a byte buffer in tests.
pub struct Interpreter<W: Write = Stdout> {
    /// Retained handle to the outermost scope, for unresolved (global)
    /// references and native injection.
    globals: Rc<RefCell<Environment>>,

    /// The currently active scope.
    environment: Rc<RefCell<Environment>>,

    /// Scope distances from the resolver, keyed by parse-time expression id.
    locals: HashMap<ExprId, usize>,

    writer: W,
}

impl Interpreter<Stdout> {
    /// Create an interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for Interpreter<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// Create an interpreter with an explicit output collaborator.  The
    /// globals come pre-populated with the canonical `clock` native.
    pub fn with_writer(writer: W) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            writer,
        };

        interpreter.define_native("clock", 0, native_clock);

        interpreter
    }

    /// Inject a host function into the global scope.  Natives satisfy the
    /// same arity/call contract as user functions.
    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFn) {
        debug!("Defining native function '{}'", name);

        self.globals.borrow_mut().define(
            name,
            Value::NativeFunction {
                name: name.to_string(),
                arity,
                func,
            },
        );
    }

    /// Install the resolver's scope-distance table.
    pub fn resolve(&mut self, locals: HashMap<ExprId, usize>) {
        self.locals = locals;
    }

    /// Borrow the output collaborator (tests read captured output here).
    pub fn output(&self) -> &W {
        &self.writer
    }

    /// Interpret a list of statements (a "program").  A runtime error
    /// terminates the remaining statements; effects of statements already
    /// executed are not rolled back.
    pub fn interpret(&mut self, statements: &[Stmt]) -> LoxResult<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                self.writer.flush()?;

                return Err(match e {
                    InterpretError::Runtime(err) => LoxError::Runtime(err),
                    // Statically rejected by the resolver; reachable only
                    // when a driver skips the resolve pass.
                    InterpretError::Return(_) => LoxError::Runtime(RuntimeError::new(
                        0,
                        "Cannot return from top-level code",
                    )),
                    InterpretError::Io(err) => LoxError::Io(err),
                });
            }
        }

        self.writer.flush()?;

        info!("Interpretation completed successfully");

        Ok(())
    }

    /// Evaluate a single expression to a value (the `evaluate` driver
    /// subcommand).
    pub fn evaluate_expression(&mut self, expr: &Expr) -> LoxResult<Value> {
        match self.evaluate(expr) {
            Ok(value) => Ok(value),
            Err(InterpretError::Runtime(err)) => Err(LoxError::Runtime(err)),
            Err(InterpretError::Return(_)) => Err(LoxError::Runtime(RuntimeError::new(
                0,
                "Cannot return from top-level code",
            ))),
            Err(InterpretError::Io(err)) => Err(LoxError::Io(err)),
        }
    }

    // ──────────────────────── statement execution ─────────────────────

    fn execute(&mut self, stmt: &Stmt) -> IResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                debug!("Printing value: {}", value);

                writeln!(self.writer, "{}", value)?;
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(())
            }

            Stmt::Block(statements) => {
                let child = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, child)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }
                Ok(())
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                // Declaring a function captures the *currently active*
                // environment by reference as its closure.
                let function = Value::Function(Rc::new(LoxFunction {
                    declaration: Rc::clone(decl),
                    closure: Rc::clone(&self.environment),
                    is_initializer: false,
                }));

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, function);
                Ok(())
            }

            Stmt::Return { keyword: _, value } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Return signal carrying {}", value);

                Err(InterpretError::Return(value))
            }

            Stmt::Class { name, methods } => {
                debug!("Defining class '{}'", name.lexeme);

                // Two-stage define/assign so methods may refer to the class
                // by name.
                self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

                let mut method_table: HashMap<String, Rc<LoxFunction>> = HashMap::new();

                for method in methods {
                    let function = Rc::new(LoxFunction {
                        declaration: Rc::clone(method),
                        closure: Rc::clone(&self.environment),
                        is_initializer: method.name.lexeme == "init",
                    });

                    method_table.insert(method.name.lexeme.clone(), function);
                }

                let class = Value::Class(Rc::new(LoxClass {
                    name: name.lexeme.clone(),
                    methods: method_table,
                }));

                self.environment.borrow_mut().assign(&name.lexeme, class);
                Ok(())
            }
        }
    }

    /// Run `statements` against `environment`, restoring the previously
    /// active environment on every exit path - normal completion, runtime
    /// error, or a `return` signal passing through.
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> IResult<()> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, environment);

        let mut result: IResult<()> = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    // ──────────────────────── expression evaluation ───────────────────

    fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(lit) => Ok(literal_value(lit)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable { name, id } => self.look_up_variable(name, *id),

            Expr::Assign { name, value, id } => {
                let value: Value = self.evaluate(value)?;

                let assigned: bool = match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                    ),
                    None => self.globals.borrow_mut().assign(&name.lexeme, value.clone()),
                };

                if !assigned {
                    return Err(RuntimeError::new(
                        name.line,
                        format!("Undefined variable '{}'.", name.lexeme),
                    )
                    .into());
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                // Arguments evaluate right-to-left; the order is observable
                // through side effects and is part of the language contract.
                let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());

                for arg in arguments.iter().rev() {
                    arg_values.push(self.evaluate(arg)?);
                }

                arg_values.reverse();

                self.invoke_callable(&callee_val, paren, arg_values)
            }

            Expr::Get { object, name } => {
                let object: Value = self.evaluate(object)?;

                let Value::Instance(instance) = object else {
                    return Err(RuntimeError::new(
                        name.line,
                        "Only instances have properties.",
                    )
                    .into());
                };

                // Fields shadow methods.
                if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
                    return Ok(value.clone());
                }

                let method = instance.borrow().class.find_method(&name.lexeme);

                if let Some(method) = method {
                    let bound: LoxFunction = method.bind(Value::Instance(Rc::clone(&instance)));

                    return Ok(Value::Function(Rc::new(bound)));
                }

                Err(RuntimeError::new(
                    name.line,
                    format!("Undefined property '{}'.", name.lexeme),
                )
                .into())
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                let Value::Instance(instance) = object else {
                    return Err(
                        RuntimeError::new(name.line, "Only instances have fields.").into()
                    );
                };

                let value: Value = self.evaluate(value)?;

                instance
                    .borrow_mut()
                    .fields
                    .insert(name.lexeme.clone(), value.clone());

                Ok(value)
            }

            Expr::This { keyword, id } => self.look_up_variable(keyword, *id),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> IResult<Value> {
        let right_val: Value = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => {
                if let Value::Number(n) = right_val {
                    Ok(Value::Number(-n))
                } else {
                    Err(RuntimeError::new(op.line, "Operand must be a number.").into())
                }
            }

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right_val))),

            _ => Err(RuntimeError::new(op.line, "Invalid unary operator").into()),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> IResult<Value> {
        // Right operand first, then left; this order is observable through
        // side effects and is part of the language contract.
        let right_val: Value = self.evaluate(right)?;
        let left_val: Value = self.evaluate(left)?;

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(RuntimeError::new(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                // Division by zero is not trapped: IEEE semantics apply.
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(RuntimeError::new(op.line, "Invalid binary operator").into()),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> IResult<Value> {
        let left_val: Value = self.evaluate(left)?;

        // Short-circuit: the result is whichever operand's value decided
        // the expression, not a coerced boolean.
        if op.token_type == TokenType::OR {
            if is_truthy(&left_val) {
                return Ok(left_val);
            }
        } else if !is_truthy(&left_val) {
            return Ok(left_val);
        }

        self.evaluate(right)
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> IResult<Value> {
        let value: Option<Value> = match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| {
            RuntimeError::new(
                name.line,
                format!("Undefined variable '{}'.", name.lexeme),
            )
            .into()
        })
    }

    // ──────────────────────── callable protocol ───────────────────────

    /// Invoke a callable value: a native, a user function/closure, or a
    /// class-as-constructor.
    fn invoke_callable(
        &mut self,
        callee_val: &Value,
        paren: &Token,
        arg_values: Vec<Value>,
    ) -> IResult<Value> {
        match callee_val {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                check_arity(*arity, arg_values.len(), paren)?;

                let result: Value = func(&arg_values)
                    .map_err(|msg: String| RuntimeError::new(paren.line, msg))?;

                Ok(result)
            }

            Value::Function(function) => {
                debug!("Calling function '{}'", function.declaration.name.lexeme);

                check_arity(function.arity(), arg_values.len(), paren)?;

                self.call_function(function, arg_values)
            }

            Value::Class(class) => {
                debug!("Constructing instance of '{}'", class.name);

                check_arity(class.arity(), arg_values.len(), paren)?;

                let instance = Value::Instance(Rc::new(RefCell::new(LoxInstance::new(
                    Rc::clone(class),
                ))));

                if let Some(init) = class.find_method("init") {
                    // The initializer's own result is ignored; construction
                    // always yields the instance.
                    let bound: LoxFunction = init.bind(instance.clone());
                    self.call_function(&bound, arg_values)?;
                }

                Ok(instance)
            }

            _ => Err(RuntimeError::new(
                paren.line,
                "Can only call functions and classes.",
            )
            .into()),
        }
    }

    /// Execute a user function: one fresh scope nested in the captured
    /// closure, parameters bound positionally, `return` absorbed here.
    fn call_function(&mut self, function: &LoxFunction, arg_values: Vec<Value>) -> IResult<Value> {
        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &function.closure,
        ))));

        for (param, arg) in function.declaration.params.iter().zip(arg_values) {
            environment.borrow_mut().define(&param.lexeme, arg);
        }

        let result: IResult<()> = self.execute_block(&function.declaration.body, environment);

        match result {
            // An initializer always yields the bound `this`, whether the
            // body fell off the end or exited through a bare `return;`.
            Ok(()) | Err(InterpretError::Return(_)) if function.is_initializer => {
                Ok(Environment::get_at(&function.closure, 0, "this")
                    .expect("initializer closure defines 'this'"))
            }

            Ok(()) => Ok(Value::Nil),

            Err(InterpretError::Return(value)) => Ok(value),

            Err(e) => Err(e),
        }
    }
}

// ───────────────────────────── helpers ─────────────────────────────

/// `nil` and `false` are falsey; every other value is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}

fn literal_value(lit: &LiteralValue) -> Value {
    match lit {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(s.clone()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

fn number_operands(op: &Token, left: &Value, right: &Value) -> IResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::new(
            op.line,
            format!("Operands must be numbers for '{}'.", op.lexeme),
        )
        .into()),
    }
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> IResult<()> {
    if got != expected {
        return Err(RuntimeError::new(
            paren.line,
            format!("Expected {} arguments but got {}.", expected, got),
        )
        .into());
    }

    Ok(())
}

/// The canonical injected native: seconds since the Unix epoch, arity 0.
fn native_clock(_args: &[Value]) -> Result<Value, String> {
    let timestamp: f64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
