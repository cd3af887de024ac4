use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

use crate::ast::{self, Block, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::interner::Symbol;

/// Runtime values.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Nil,
    Integer(i64),
    Bool(bool),
    Str(String),
    Function(Function),

    /// Wraps the result of a `return` statement while it propagates through
    /// enclosing blocks.  Unwrapped at program and call boundaries; never
    /// visible to programs.
    Returned(Box<Value>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Integer(_) => "Integer",
            Value::Bool(_) => "Boolean",
            Value::Str(_) => "String",
            Value::Function(_) => "Function",
            Value::Returned(v) => v.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Function(func) => write!(f, "{}", func),
            Value::Returned(v) => write!(f, "{}", v),
        }
    }
}

/// A function value: parameter names, body, and the environment captured
/// where the `fn` expression was evaluated.
#[derive(Clone)]
pub struct Function {
    params: Vec<Symbol>,
    body: Block,
    env: Rc<Env>,
}

// The captured environment is skipped: it can hold the function itself, so
// walking it would recurse forever.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("params", &self.params)
            .field("body", &self.body)
            .finish()
    }
}

// Captured environments are not part of the comparison.
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params && self.body == other.body
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fn({}){}",
            ast::comma_separated_names(&self.params),
            ast::braced(&self.body)
        )
    }
}

#[derive(Debug)]
pub enum RuntimeError {
    UnknownIdentifier(String),
    UndefinedMethod {
        operator: String,
        type_name: &'static str,
    },
    WrongArgumentType {
        operator: String,
        type_name: &'static str,
    },
    DivisionByZero,
    NonBoolCondition(&'static str),
    NotCallable(&'static str),
    ArityMismatch {
        expected: usize,
        found: usize,
    },
}

impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UnknownIdentifier(name) => {
                write!(f, "unknown identifier: {}", name)
            }
            RuntimeError::UndefinedMethod {
                operator,
                type_name,
            } => write!(f, "operator '{}' is not defined on {}", operator, type_name),
            RuntimeError::WrongArgumentType {
                operator,
                type_name,
            } => write!(f, "operator '{}' does not accept {}", operator, type_name),
            RuntimeError::DivisionByZero => write!(f, "division by zero"),
            RuntimeError::NonBoolCondition(type_name) => {
                write!(f, "condition must be a Boolean, given: {}", type_name)
            }
            RuntimeError::NotCallable(type_name) => {
                write!(f, "{} is not callable", type_name)
            }
            RuntimeError::ArityMismatch { expected, found } => write!(
                f,
                "wrong number of arguments: expected {}, found {}",
                expected, found
            ),
        }
    }
}

/// Tree-walking evaluator.
///
/// Owns the root environment, which persists for the lifetime of the
/// evaluator so `let` bindings survive across programs (the REPL relies on
/// this).
#[derive(Debug)]
pub struct Evaluator {
    root: Rc<Env>,
}

impl Evaluator {
    pub fn new() -> Evaluator {
        Evaluator { root: Env::new() }
    }

    /// Evaluates a program against the root environment.
    ///
    /// A `return` at top level stops execution and yields its value; an
    /// empty program yields nil.
    pub fn eval_program(&self, program: &Program) -> Result<Value, RuntimeError> {
        let mut result = Value::Nil;
        for stmt in &program.0 {
            result = self.eval_stmt(stmt, self.root.clone())?;
            if let Value::Returned(value) = result {
                return Ok(*value);
            }
        }
        Ok(result)
    }

    fn eval_stmt(&self, stmt: &Stmt, env: Rc<Env>) -> Result<Value, RuntimeError> {
        match stmt {
            Stmt::Expr(expr) => self.eval_expr(expr, env),
            Stmt::Let(name, value) => {
                let value = self.eval_expr(value, env.clone())?;
                env.set(name, value.clone());
                Ok(value)
            }
            Stmt::Return(expr) => {
                let value = self.eval_expr(expr, env)?;
                Ok(Value::Returned(Box::new(value)))
            }
        }
    }

    /// Evaluates the statements of a block in order.  A `Returned` marker
    /// short-circuits the block but stays wrapped so enclosing blocks keep
    /// propagating it; only a function call or the program unwraps it.
    fn eval_block(&self, block: &Block, env: Rc<Env>) -> Result<Value, RuntimeError> {
        let mut result = Value::Nil;
        for stmt in &block.0 {
            result = self.eval_stmt(stmt, env.clone())?;
            if matches!(result, Value::Returned(_)) {
                return Ok(result);
            }
        }
        Ok(result)
    }

    fn eval_expr(&self, expr: &Expr, env: Rc<Env>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Nil => Ok(Value::Nil),
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Identifier(sym) => env
                .get(sym)
                .ok_or_else(|| RuntimeError::UnknownIdentifier(sym.name().to_owned())),
            Expr::Prefix(op, operand) => {
                let value = self.eval_expr(operand, env)?;
                eval_prefix(*op, value)
            }
            Expr::Infix(left, op, right) => {
                let left = self.eval_expr(left, env.clone())?;
                let right = self.eval_expr(right, env)?;
                eval_infix(*op, left, right)
            }
            Expr::If(condition, then_block, else_block) => {
                match self.eval_expr(condition, env.clone())? {
                    Value::Bool(true) => self.eval_block(then_block, env),
                    Value::Bool(false) => match else_block {
                        Some(block) => self.eval_block(block, env),
                        None => Ok(Value::Nil),
                    },
                    other => Err(RuntimeError::NonBoolCondition(other.type_name())),
                }
            }
            Expr::Function(params, body) => Ok(Value::Function(Function {
                params: params.clone(),
                body: body.clone(),
                env,
            })),
            Expr::Call(callee, args) => self.eval_call(callee, args, env),
        }
    }

    fn eval_call(&self, callee: &Expr, args: &[Expr], env: Rc<Env>) -> Result<Value, RuntimeError> {
        let callee = self.eval_expr(callee, env.clone())?;
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, env.clone())?);
        }

        let function = match callee {
            Value::Function(function) => function,
            other => return Err(RuntimeError::NotCallable(other.type_name())),
        };
        if values.len() != function.params.len() {
            return Err(RuntimeError::ArityMismatch {
                expected: function.params.len(),
                found: values.len(),
            });
        }

        // The call environment descends from the environment captured at the
        // function's creation site, not from the caller's.
        let call_env = Env::with_parent(Some(function.env.clone()));
        for (param, value) in function.params.iter().zip(values) {
            call_env.set(param, value);
        }

        match self.eval_block(&function.body, call_env)? {
            Value::Returned(value) => Ok(*value),
            value => Ok(value),
        }
    }
}

fn eval_prefix(op: PrefixOp, value: Value) -> Result<Value, RuntimeError> {
    match (op, &value) {
        (PrefixOp::Minus, Value::Integer(n)) => Ok(Value::Integer(n.wrapping_neg())),
        (PrefixOp::Bang, Value::Bool(b)) => Ok(Value::Bool(!b)),
        _ => Err(undefined_method(op, value.type_name())),
    }
}

/// Applies an infix operator.
///
/// Dispatch is keyed on the left operand first: an operator the left type
/// does not carry is `UndefinedMethod`, a carried operator given a right
/// operand of the wrong type is `WrongArgumentType`.
fn eval_infix(op: InfixOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match left {
        Value::Integer(l) => {
            let r = match right {
                Value::Integer(r) => r,
                other => return Err(wrong_argument(op, other.type_name())),
            };
            // Wrapping arithmetic, so i64::MIN edge cases cannot abort the
            // interpreter.
            Ok(match op {
                InfixOp::Plus => Value::Integer(l.wrapping_add(r)),
                InfixOp::Minus => Value::Integer(l.wrapping_sub(r)),
                InfixOp::Asterisk => Value::Integer(l.wrapping_mul(r)),
                InfixOp::Slash => {
                    if r == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    Value::Integer(l.wrapping_div(r))
                }
                InfixOp::Lt => Value::Bool(l < r),
                InfixOp::Lte => Value::Bool(l <= r),
                InfixOp::Gt => Value::Bool(l > r),
                InfixOp::Gte => Value::Bool(l >= r),
                InfixOp::Eq => Value::Bool(l == r),
                InfixOp::NotEq => Value::Bool(l != r),
            })
        }
        Value::Bool(l) => match op {
            InfixOp::Eq | InfixOp::NotEq => {
                let r = match right {
                    Value::Bool(r) => r,
                    other => return Err(wrong_argument(op, other.type_name())),
                };
                Ok(Value::Bool(if op == InfixOp::Eq { l == r } else { l != r }))
            }
            _ => Err(undefined_method(op, "Boolean")),
        },
        Value::Str(l) => match op {
            InfixOp::Plus | InfixOp::Eq | InfixOp::NotEq => {
                let r = match right {
                    Value::Str(r) => r,
                    other => return Err(wrong_argument(op, other.type_name())),
                };
                Ok(match op {
                    InfixOp::Plus => Value::Str(l + &r),
                    InfixOp::Eq => Value::Bool(l == r),
                    _ => Value::Bool(l != r),
                })
            }
            _ => Err(undefined_method(op, "String")),
        },
        Value::Nil => match op {
            InfixOp::Eq | InfixOp::NotEq => match right {
                Value::Nil => Ok(Value::Bool(op == InfixOp::Eq)),
                other => Err(wrong_argument(op, other.type_name())),
            },
            _ => Err(undefined_method(op, "Nil")),
        },
        other => Err(undefined_method(op, other.type_name())),
    }
}

fn undefined_method(op: impl fmt::Display, type_name: &'static str) -> RuntimeError {
    RuntimeError::UndefinedMethod {
        operator: op.to_string(),
        type_name,
    }
}

fn wrong_argument(op: impl fmt::Display, type_name: &'static str) -> RuntimeError {
    RuntimeError::WrongArgumentType {
        operator: op.to_string(),
        type_name,
    }
}

/// A scope: bindings plus an optional parent to search when a name is not
/// bound locally.  Environments are shared through `Rc` because closures keep
/// their defining environment alive for as long as the function value lives.
#[derive(Debug)]
pub struct Env {
    parent: Option<Rc<Env>>,
    bindings: RefCell<HashMap<Symbol, Value>>,
}

impl Env {
    fn new() -> Rc<Env> {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Rc<Env>>) -> Rc<Env> {
        Rc::new(Env {
            parent,
            bindings: RefCell::new(HashMap::new()),
        })
    }

    /// Binds unconditionally in the local scope.
    fn set(&self, sym: &Symbol, val: Value) {
        self.bindings.borrow_mut().insert(sym.clone(), val);
    }

    fn get(&self, sym: &Symbol) -> Option<Value> {
        match self.bindings.borrow().get(sym) {
            Some(v) => Some(v.clone()),
            None => self.parent.as_ref().and_then(|p| p.get(sym)),
        }
    }
}
