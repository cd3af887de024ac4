use std::fmt;

use crate::interner::Symbol;

/// An ordered sequence of top-level statements.
#[derive(Debug, PartialEq, Clone)]
pub struct Program(pub Vec<Stmt>);

/// A `{ … }` body, as used by `if` and `fn` expressions.  May be empty.
#[derive(Debug, PartialEq, Clone)]
pub struct Block(pub Vec<Stmt>);

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Let(Symbol, Expr),
    Return(Expr),
    Expr(Expr),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Identifier(Symbol),
    Integer(i64),
    Str(String),
    Bool(bool),
    Nil,
    Prefix(PrefixOp, Box<Expr>),
    Infix(Box<Expr>, InfixOp, Box<Expr>),
    If(Box<Expr>, Block, Option<Block>),
    Function(Vec<Symbol>, Block),
    Call(Box<Expr>, Vec<Expr>),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PrefixOp {
    Minus,
    Bang,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InfixOp {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    NotEq,
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOp::Minus => write!(f, "-"),
            PrefixOp::Bang => write!(f, "!"),
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfixOp::Plus => write!(f, "+"),
            InfixOp::Minus => write!(f, "-"),
            InfixOp::Asterisk => write!(f, "*"),
            InfixOp::Slash => write!(f, "/"),
            InfixOp::Lt => write!(f, "<"),
            InfixOp::Lte => write!(f, "<="),
            InfixOp::Gt => write!(f, ">"),
            InfixOp::Gte => write!(f, ">="),
            InfixOp::Eq => write!(f, "=="),
            InfixOp::NotEq => write!(f, "!="),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.0 {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.0 {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let(name, value) => write!(f, "let {} = {};", name, value),
            Stmt::Return(value) => write!(f, "return {};", value),
            Stmt::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(sym) => write!(f, "{}", sym),
            Expr::Integer(n) => write!(f, "{}", n),
            Expr::Str(s) => write!(f, "\"{}\"", s),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Nil => write!(f, "nil"),
            Expr::Prefix(op, operand) => write!(f, "({}{})", op, operand),
            Expr::Infix(left, op, right) => write!(f, "({} {} {})", left, op, right),
            Expr::If(condition, then_block, else_block) => {
                write!(f, "if {}{}", condition, braced(then_block))?;
                if let Some(block) = else_block {
                    write!(f, " else{}", braced(block))?;
                }
                Ok(())
            }
            Expr::Function(params, body) => {
                write!(f, "fn({}){}", comma_separated_names(params), braced(body))
            }
            Expr::Call(callee, args) => {
                let args = args.iter().map(Expr::to_string).collect::<Vec<_>>();
                write!(f, "{}({})", callee, args.join(", "))
            }
        }
    }
}

/// Renders a block body between braces; empty bodies become `{ }`.
pub(crate) fn braced(block: &Block) -> String {
    let body = block.to_string();
    if body.is_empty() {
        " { }".to_string()
    } else {
        format!(" {{ {} }}", body)
    }
}

pub(crate) fn comma_separated_names(names: &[Symbol]) -> String {
    names.iter().map(Symbol::name).collect::<Vec<_>>().join(", ")
}
