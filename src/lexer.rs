//! Lexical analyzer

use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

use crate::ctx::Context;
use crate::diag::{FullParseError, ParseError, Position};
use crate::token::Token;

/// Turn source text into a sequence of tokens.
pub struct Lexer<'s> {
    input: Peekable<Chars<'s>>,
    line: Position,
    ctx: Rc<Context>,

    // Buffer used when scanning longer tokens.  Allocated here to reuse memory.
    buf: String,
}

impl<'s> Lexer<'s> {
    /// Creates a new lexer operating on `input`.
    pub fn new(input: &'s str, ctx: Rc<Context>) -> Lexer<'s> {
        Lexer {
            input: input.chars().peekable(),
            line: 1,
            ctx,
            buf: String::new(),
        }
    }

    /// Scan the next token and return it together with its line.
    /// `Ok(None)` means the input is exhausted.
    pub fn next_token(&mut self) -> Result<Option<(Position, Token)>, FullParseError> {
        self.scan().map(|t| t.map(|token| (self.line, token)))
    }

    /// Scan the whole input at once.
    #[allow(dead_code)]
    pub fn tokens(self) -> Result<Vec<Token>, FullParseError> {
        self.collect()
    }

    fn scan(&mut self) -> Result<Option<Token>, FullParseError> {
        loop {
            let ch = match self.input.next() {
                None => return Ok(None),
                Some(ch) => ch,
            };
            let token = match ch {
                '\n' => {
                    self.line += 1;
                    continue;
                }
                ' ' | '\t' | '\r' => continue,
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Asterisk,
                '/' => Token::Slash,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '{' => Token::LBrace,
                '}' => Token::RBrace,
                ',' => Token::Comma,
                ';' => Token::Semicolon,
                '=' => {
                    if self.take_eq() {
                        Token::Eq
                    } else {
                        Token::Assign
                    }
                }
                '!' => {
                    if self.take_eq() {
                        Token::NotEq
                    } else {
                        Token::Bang
                    }
                }
                '<' => {
                    if self.take_eq() {
                        Token::Lte
                    } else {
                        Token::Lt
                    }
                }
                '>' => {
                    if self.take_eq() {
                        Token::Gte
                    } else {
                        Token::Gt
                    }
                }
                '"' => self.scan_string()?,
                '0'..='9' => self.scan_number(ch),
                'a'..='z' | 'A'..='Z' | '_' => self.scan_identifier(ch),
                _ => return Err(self.error(ParseError::BadChar(ch))),
            };
            return Ok(Some(token));
        }
    }

    /// Consumes a trailing '=' if one follows.
    fn take_eq(&mut self) -> bool {
        if let Some('=') = self.input.peek() {
            self.input.next();
            true
        } else {
            false
        }
    }

    fn scan_string(&mut self) -> Result<Token, FullParseError> {
        self.buf.clear();
        loop {
            match self.input.next() {
                Some('"') => break,
                // TODO: support escape sequences
                Some(ch) => {
                    if ch == '\n' {
                        self.line += 1;
                    }
                    self.buf.push(ch);
                }
                None => return Err(self.error(ParseError::UnterminatedString)),
            }
        }
        Ok(Token::Str(self.buf.clone()))
    }

    fn scan_number(&mut self, first_digit: char) -> Token {
        self.buf.clear();
        self.buf.push(first_digit);
        loop {
            match self.input.peek() {
                Some(ch) if ch.is_ascii_digit() => {
                    let ch = *ch;
                    self.input.next();
                    self.buf.push(ch);
                }
                _ => break,
            }
        }
        Token::Integer(self.buf.clone())
    }

    fn scan_identifier(&mut self, first_char: char) -> Token {
        self.buf.clear();
        self.buf.push(first_char);
        loop {
            match self.input.peek() {
                Some(ch) if ch.is_ascii_alphabetic() || *ch == '_' => {
                    let ch = *ch;
                    self.input.next();
                    self.buf.push(ch);
                }
                _ => break,
            }
        }

        let sym = self.ctx.symbol(&self.buf);
        if let Some(token) = self.ctx.keyword(&sym) {
            token
        } else {
            Token::Identifier(sym)
        }
    }

    fn error(&self, error: ParseError) -> FullParseError {
        FullParseError {
            pos: self.line,
            error,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, FullParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(Some((_, t))) => Some(Ok(t)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Result<Vec<Token>, FullParseError> {
        let ctx = Context::new();
        Lexer::new(input, ctx).tokens()
    }

    fn lex_with_ctx(input: &str, ctx: Rc<Context>) -> Result<Vec<Token>, FullParseError> {
        Lexer::new(input, ctx).tokens()
    }

    #[test]
    fn scan_single_token() -> Result<(), FullParseError> {
        assert_eq!(lex("+")?, vec![Token::Plus]);
        Ok(())
    }

    #[test]
    fn fixed_tokens() -> Result<(), FullParseError> {
        assert_eq!(
            lex("=+-!*/<> <= >= == != ,;(){}")?,
            vec![
                Token::Assign,
                Token::Plus,
                Token::Minus,
                Token::Bang,
                Token::Asterisk,
                Token::Slash,
                Token::Lt,
                Token::Gt,
                Token::Lte,
                Token::Gte,
                Token::Eq,
                Token::NotEq,
                Token::Comma,
                Token::Semicolon,
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
            ]
        );
        Ok(())
    }

    #[test]
    fn two_char_operators_without_blanks() -> Result<(), FullParseError> {
        assert_eq!(
            lex("==!=<=>=")?,
            vec![Token::Eq, Token::NotEq, Token::Lte, Token::Gte]
        );
        Ok(())
    }

    #[test]
    fn blanks_are_ignored() -> Result<(), FullParseError> {
        assert_eq!(lex(" \t\r\n+")?, vec![Token::Plus]);
        Ok(())
    }

    #[test]
    fn integers() -> Result<(), FullParseError> {
        assert_eq!(
            lex("1 42")?,
            vec![
                Token::Integer("1".to_string()),
                Token::Integer("42".to_string())
            ]
        );
        Ok(())
    }

    #[test]
    fn scan_several_tokens_without_blanks() -> Result<(), FullParseError> {
        assert_eq!(
            lex("42+24")?,
            vec![
                Token::Integer("42".to_string()),
                Token::Plus,
                Token::Integer("24".to_string())
            ]
        );
        Ok(())
    }

    #[test]
    fn identifiers() -> Result<(), FullParseError> {
        let ctx = Context::new();
        assert_eq!(
            lex_with_ctx("f foo _foo", ctx.clone())?,
            vec![
                Token::Identifier(ctx.symbol("f")),
                Token::Identifier(ctx.symbol("foo")),
                Token::Identifier(ctx.symbol("_foo")),
            ]
        );
        Ok(())
    }

    #[test]
    fn identifiers_do_not_contain_digits() -> Result<(), FullParseError> {
        let ctx = Context::new();
        assert_eq!(
            lex_with_ctx("t42", ctx.clone())?,
            vec![
                Token::Identifier(ctx.symbol("t")),
                Token::Integer("42".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn keywords() -> Result<(), FullParseError> {
        assert_eq!(
            lex("fn let true false if else return nil")?,
            vec![
                Token::Function,
                Token::Let,
                Token::True,
                Token::False,
                Token::If,
                Token::Else,
                Token::Return,
                Token::Nil,
            ]
        );
        Ok(())
    }

    #[test]
    fn string_literal() -> Result<(), FullParseError> {
        assert_eq!(
            lex("\"foo bar\"")?,
            vec![Token::Str("foo bar".to_string())]
        );
        Ok(())
    }

    #[test]
    fn unterminated_string() {
        match lex("\"foo") {
            Err(FullParseError {
                pos: 1,
                error: ParseError::UnterminatedString,
            }) => (),
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn illegal_characters() {
        let ctx = Context::new();
        let mut lexer = Lexer::new("$#", ctx);
        match lexer.next() {
            Some(Err(FullParseError {
                pos: 1,
                error: ParseError::BadChar('$'),
            })) => (),
            r => panic!("unexpected output: {:?}", r),
        }
        // The offending character is consumed, so scanning can continue.
        match lexer.next() {
            Some(Err(FullParseError {
                pos: 1,
                error: ParseError::BadChar('#'),
            })) => (),
            r => panic!("unexpected output: {:?}", r),
        }
        assert!(lexer.next().is_none());
    }

    #[test]
    fn lexer_keeps_track_of_lines() -> Result<(), FullParseError> {
        let ctx = Context::new();
        let mut lexer = Lexer::new("1\n2 3\n4", ctx);
        assert_eq!(
            lexer.next_token()?,
            Some((1, Token::Integer("1".to_string())))
        );
        assert_eq!(
            lexer.next_token()?,
            Some((2, Token::Integer("2".to_string())))
        );
        assert_eq!(
            lexer.next_token()?,
            Some((2, Token::Integer("3".to_string())))
        );
        assert_eq!(
            lexer.next_token()?,
            Some((3, Token::Integer("4".to_string())))
        );
        assert_eq!(lexer.next_token()?, None);
        Ok(())
    }

    #[test]
    fn fixed_tokens_round_trip() -> Result<(), FullParseError> {
        let fixed = [
            Token::Assign,
            Token::Plus,
            Token::Minus,
            Token::Bang,
            Token::Asterisk,
            Token::Slash,
            Token::Lt,
            Token::Gt,
            Token::Lte,
            Token::Gte,
            Token::Eq,
            Token::NotEq,
            Token::Comma,
            Token::Semicolon,
            Token::LParen,
            Token::RParen,
            Token::LBrace,
            Token::RBrace,
            Token::Function,
            Token::Let,
            Token::True,
            Token::False,
            Token::If,
            Token::Else,
            Token::Return,
            Token::Nil,
        ];
        for token in fixed {
            assert_eq!(lex(&token.to_string())?, vec![token]);
        }
        Ok(())
    }
}
