use std::rc::Rc;

use crate::ast::{Block, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::ctx::Context;
use crate::diag::{FullParseError, ParseError, Position};
use crate::interner::Symbol;
use crate::lexer::Lexer;
use crate::token::Token;

/// Binding powers for the Pratt expression loop, weakest first.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

fn precedence_of(token: &Token) -> Precedence {
    match token {
        Token::Eq | Token::NotEq => Precedence::Equals,
        Token::Lt | Token::Gt | Token::Lte | Token::Gte => Precedence::LessGreater,
        Token::Plus | Token::Minus => Precedence::Sum,
        Token::Asterisk | Token::Slash => Precedence::Product,
        Token::LParen => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

/// Pratt parser: consumes tokens from a [`Lexer`] and builds a [`Program`].
///
/// Two tokens of lookahead (`current` and `peek`); `None` in either slot
/// stands for exhausted input.
pub struct Parser<'s> {
    lexer: Lexer<'s>,
    current: Option<Token>,
    peek: Option<Token>,
    pos: Position,
}

impl<'s> Parser<'s> {
    /// Creates a parser over `input` and primes both lookahead slots.
    pub fn new(input: &'s str, ctx: Rc<Context>) -> Result<Parser<'s>, FullParseError> {
        let mut parser = Parser {
            lexer: Lexer::new(input, ctx),
            current: None,
            peek: None,
            pos: 1,
        };
        parser.advance()?;
        parser.advance()?;
        Ok(parser)
    }

    pub fn parse_program(&mut self) -> Result<Program, FullParseError> {
        let mut statements = vec![];
        while self.current.is_some() {
            statements.push(self.parse_statement()?);
            self.advance()?;
        }
        Ok(Program(statements))
    }

    fn parse_statement(&mut self) -> Result<Stmt, FullParseError> {
        match self.current {
            Some(Token::Let) => self.parse_let_statement(),
            Some(Token::Return) => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Parse `let IDENT = EXPR ;?`.  Current token is `let`.
    fn parse_let_statement(&mut self) -> Result<Stmt, FullParseError> {
        let name = self.expect_identifier()?;
        self.expect_peek(&Token::Assign)?;
        self.advance()?;
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon()?;
        Ok(Stmt::Let(name, value))
    }

    /// Parse `return EXPR ;?`.  Current token is `return`.
    fn parse_return_statement(&mut self) -> Result<Stmt, FullParseError> {
        self.advance()?;
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon()?;
        Ok(Stmt::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, FullParseError> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon()?;
        Ok(Stmt::Expr(expr))
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expr, FullParseError> {
        let mut left = self.parse_prefix()?;
        while self.current != Some(Token::Semicolon) && precedence < self.peek_precedence() {
            self.advance()?;
            left = self.parse_infix(left)?;
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, FullParseError> {
        // TODO: can we avoid cloning tokens?
        let token = match self.current.clone() {
            Some(token) => token,
            None => return Err(self.error(ParseError::UnexpectedEof)),
        };
        match token {
            Token::Identifier(sym) => Ok(Expr::Identifier(sym)),
            Token::Integer(digits) => self.parse_integer(digits),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::Nil => Ok(Expr::Nil),
            Token::Bang => self.parse_prefix_operator(PrefixOp::Bang),
            Token::Minus => self.parse_prefix_operator(PrefixOp::Minus),
            Token::LParen => self.parse_grouped(),
            Token::If => self.parse_if(),
            Token::Function => self.parse_function(),
            token => Err(self.error(ParseError::NoPrefixParser(token.to_string()))),
        }
    }

    fn parse_integer(&self, digits: String) -> Result<Expr, FullParseError> {
        match digits.parse::<i64>() {
            Ok(n) => Ok(Expr::Integer(n)),
            Err(_) => Err(self.error(ParseError::BadIntegerLiteral(digits))),
        }
    }

    fn parse_prefix_operator(&mut self, op: PrefixOp) -> Result<Expr, FullParseError> {
        self.advance()?;
        let operand = self.parse_expression(Precedence::Prefix)?;
        Ok(Expr::Prefix(op, Box::new(operand)))
    }

    /// Parse the operator (or call) whose lead token is current.
    fn parse_infix(&mut self, left: Expr) -> Result<Expr, FullParseError> {
        let op = match self.current {
            Some(Token::Plus) => InfixOp::Plus,
            Some(Token::Minus) => InfixOp::Minus,
            Some(Token::Asterisk) => InfixOp::Asterisk,
            Some(Token::Slash) => InfixOp::Slash,
            Some(Token::Lt) => InfixOp::Lt,
            Some(Token::Gt) => InfixOp::Gt,
            Some(Token::Lte) => InfixOp::Lte,
            Some(Token::Gte) => InfixOp::Gte,
            Some(Token::Eq) => InfixOp::Eq,
            Some(Token::NotEq) => InfixOp::NotEq,
            Some(Token::LParen) => return self.parse_call(left),
            // Not an infix operator; cannot be reached through the
            // precedence guard in parse_expression.
            _ => return Ok(left),
        };
        let precedence = self.current_precedence();
        self.advance()?;
        let right = self.parse_expression(precedence)?;
        Ok(Expr::Infix(Box::new(left), op, Box::new(right)))
    }

    /// Parse a call argument list.  Current token is the `(` after the callee.
    fn parse_call(&mut self, callee: Expr) -> Result<Expr, FullParseError> {
        let mut args = vec![];
        if self.peek == Some(Token::RParen) {
            self.advance()?;
        } else {
            self.advance()?;
            args.push(self.parse_expression(Precedence::Lowest)?);
            while self.peek == Some(Token::Comma) {
                self.advance()?;
                self.advance()?;
                args.push(self.parse_expression(Precedence::Lowest)?);
            }
            self.expect_peek(&Token::RParen)?;
        }
        Ok(Expr::Call(Box::new(callee), args))
    }

    /// Parse `( EXPR )`.  Grouping leaves no trace in the tree.
    fn parse_grouped(&mut self) -> Result<Expr, FullParseError> {
        self.advance()?;
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(&Token::RParen)?;
        Ok(expr)
    }

    /// Parse `if ( EXPR ) { BLOCK } (else { BLOCK })?`.
    fn parse_if(&mut self) -> Result<Expr, FullParseError> {
        self.expect_peek(&Token::LParen)?;
        self.advance()?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(&Token::RParen)?;
        self.expect_peek(&Token::LBrace)?;
        let then_block = self.parse_block()?;
        let else_block = if self.peek == Some(Token::Else) {
            self.advance()?;
            self.expect_peek(&Token::LBrace)?;
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Expr::If(Box::new(condition), then_block, else_block))
    }

    /// Parse `fn ( IDENT (, IDENT)* )? { BLOCK }`.
    fn parse_function(&mut self) -> Result<Expr, FullParseError> {
        self.expect_peek(&Token::LParen)?;
        let params = self.parse_parameters()?;
        self.expect_peek(&Token::LBrace)?;
        let body = self.parse_block()?;
        Ok(Expr::Function(params, body))
    }

    fn parse_parameters(&mut self) -> Result<Vec<Symbol>, FullParseError> {
        let mut params = vec![];
        while self.peek != Some(Token::RParen) {
            match self.peek {
                Some(Token::Comma) => self.advance()?,
                Some(Token::Identifier(_)) => params.push(self.expect_identifier()?),
                _ => return Err(self.unexpected_peek("IDENTIFIER")),
            }
        }
        self.advance()?;
        Ok(params)
    }

    /// Parse `{ STMT* }` until `}` or end of input.  Current token is `{`.
    fn parse_block(&mut self) -> Result<Block, FullParseError> {
        let mut statements = vec![];
        self.advance()?;
        while self.current.is_some() && self.current != Some(Token::RBrace) {
            statements.push(self.parse_statement()?);
            self.advance()?;
        }
        Ok(Block(statements))
    }

    fn expect_identifier(&mut self) -> Result<Symbol, FullParseError> {
        if let Some(Token::Identifier(sym)) = self.peek.clone() {
            self.advance()?;
            Ok(sym)
        } else {
            Err(self.unexpected_peek("IDENTIFIER"))
        }
    }

    fn expect_peek(&mut self, expected: &Token) -> Result<(), FullParseError> {
        if self.peek.as_ref() == Some(expected) {
            self.advance()?;
            Ok(())
        } else {
            Err(self.unexpected_peek(&expected.to_string()))
        }
    }

    fn skip_semicolon(&mut self) -> Result<(), FullParseError> {
        if self.peek == Some(Token::Semicolon) {
            self.advance()?;
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<(), FullParseError> {
        self.current = self.peek.take();
        self.peek = match self.lexer.next_token()? {
            Some((pos, token)) => {
                self.pos = pos;
                Some(token)
            }
            None => None,
        };
        Ok(())
    }

    fn peek_precedence(&self) -> Precedence {
        self.peek
            .as_ref()
            .map(precedence_of)
            .unwrap_or(Precedence::Lowest)
    }

    fn current_precedence(&self) -> Precedence {
        self.current
            .as_ref()
            .map(precedence_of)
            .unwrap_or(Precedence::Lowest)
    }

    fn unexpected_peek(&self, expected: &str) -> FullParseError {
        let found = match &self.peek {
            Some(token) => token.to_string(),
            None => "end of input".to_string(),
        };
        self.error(ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found,
        })
    }

    fn error(&self, error: ParseError) -> FullParseError {
        FullParseError {
            pos: self.pos,
            error,
        }
    }
}
