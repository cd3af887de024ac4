//! API to control the interpreter.

use std::error::Error;
use std::fmt;
use std::rc::Rc;

use crate::ctx::Context;
use crate::diag::FullParseError;
use crate::eval::{Evaluator, RuntimeError, Value};
use crate::parser::Parser;

/// Tree-walk interpreter for the Monkey language.
///
/// The environment persists between [`Interpreter::eval`] calls, so a
/// binding made in one call is visible in the next.
///
/// # Example
///
/// Invoke the interpreter a first time to define a function then additional
/// times to call this function:
///
/// ```
/// # use monkey::interpreter::{Interpreter, MonkeyError};
///
/// let mut interp = Interpreter::new();
///
/// let func_def = r#"
///     let max = fn(x, y) {
///         if (x > y) {
///             return x;
///         }
///         return y;
///     };
/// "#;
/// interp.eval(func_def)?;
///
/// assert_eq!(interp.eval("max(10, 20)")?.to_string(), "20");
/// assert_eq!(interp.eval("max(5, 4)")?.to_string(), "5");
/// # Ok::<(), MonkeyError>(())
/// ```
#[derive(Debug)]
pub struct Interpreter {
    ctx: Rc<Context>,
    evaluator: Evaluator,
}

/// Errors the interpreter can raise.
#[derive(Debug)]
pub enum MonkeyError {
    /// Error occurring during lexical or syntactic analysis.
    Parse(FullParseError),

    /// Error occurring during evaluation.
    Runtime(RuntimeError),
}

impl fmt::Display for MonkeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonkeyError::Parse(e) => write!(f, "{}", e),
            MonkeyError::Runtime(e) => write!(f, "runtime error: {}", e),
        }
    }
}

impl Error for MonkeyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MonkeyError::Parse(e) => Some(e),
            MonkeyError::Runtime(e) => Some(e),
        }
    }
}

impl From<FullParseError> for MonkeyError {
    fn from(e: FullParseError) -> MonkeyError {
        MonkeyError::Parse(e)
    }
}

impl From<RuntimeError> for MonkeyError {
    fn from(e: RuntimeError) -> MonkeyError {
        MonkeyError::Runtime(e)
    }
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter {
            ctx: Context::new(),
            evaluator: Evaluator::new(),
        }
    }

    /// Runs a program and returns the value of its last statement.
    pub fn eval(&mut self, input: &str) -> Result<Value, MonkeyError> {
        let program = Parser::new(input, self.ctx.clone())?.parse_program()?;
        Ok(self.evaluator.eval_program(&program)?)
    }
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> Result<String, MonkeyError> {
        let mut interp = Interpreter::new();
        Ok(interp.eval(input)?.to_string())
    }

    #[test]
    fn literal_expressions() -> Result<(), MonkeyError> {
        let cases = [
            ("10", "10"),
            ("123", "123"),
            ("true", "true"),
            ("false", "false"),
            ("nil", "nil"),
            ("\"foo bar\"", "\"foo bar\""),
        ];
        for (input, expected) in cases {
            assert_eq!(run(input)?, expected, "input: {}", input);
        }
        Ok(())
    }

    #[test]
    fn prefix_operators() -> Result<(), MonkeyError> {
        let cases = [
            ("!!true", "true"),
            ("!true", "false"),
            ("!!false", "false"),
            ("!false", "true"),
            ("-1", "-1"),
        ];
        for (input, expected) in cases {
            assert_eq!(run(input)?, expected, "input: {}", input);
        }
        Ok(())
    }

    #[test]
    fn infix_operators() -> Result<(), MonkeyError> {
        let cases = [
            ("1 + 1", "2"),
            ("1 - 1", "0"),
            ("2 * 2", "4"),
            ("2 / 2", "1"),
            ("1 == 1", "true"),
            ("1 != 1", "false"),
            ("1 > 1", "false"),
            ("1 < 1", "false"),
            ("1 >= 1", "true"),
            ("1 <= 1", "true"),
            ("true == true", "true"),
            ("false == false", "true"),
            ("true == false", "false"),
            ("true != false", "true"),
            ("\"foo\" + \"bar\"", "\"foobar\""),
            ("\"foo\" == \"foo\"", "true"),
            ("\"foo\" != \"bar\"", "true"),
        ];
        for (input, expected) in cases {
            assert_eq!(run(input)?, expected, "input: {}", input);
        }
        Ok(())
    }

    #[test]
    fn operator_precedence() -> Result<(), MonkeyError> {
        assert_eq!(run("1 + 2 * 3")?, "7");
        assert_eq!(run("(1 + 2) * 3")?, "9");
        Ok(())
    }

    #[test]
    fn if_expressions() -> Result<(), MonkeyError> {
        let cases = [
            ("if (true) { 1 } else { 0 }", "1"),
            ("if (10 < 1) {  } else { 1 }", "1"),
            ("if (10 < 1) { 1 }", "nil"),
            // Only the taken branch is evaluated.
            ("if (10 > 1) { 10 } else { true + true }", "10"),
        ];
        for (input, expected) in cases {
            assert_eq!(run(input)?, expected, "input: {}", input);
        }
        Ok(())
    }

    #[test]
    fn return_statements() -> Result<(), MonkeyError> {
        let cases = [
            ("return 10;", "10"),
            ("1; return 10; 1;", "10"),
            ("if (10 > 1) { if (1 < 10) { return 10; 2 }; 1; }", "10"),
        ];
        for (input, expected) in cases {
            assert_eq!(run(input)?, expected, "input: {}", input);
        }
        Ok(())
    }

    #[test]
    fn let_bindings() -> Result<(), MonkeyError> {
        assert_eq!(run("let a = 10; let b = 10; b;")?, "10");
        assert_eq!(run("let a = 10;")?, "10");
        Ok(())
    }

    #[test]
    fn functions_and_calls() -> Result<(), MonkeyError> {
        let cases = [
            ("let add = fn(a, b){ a + b; }", "fn(a, b) { (a + b) }"),
            ("let add = fn(a, b){ a + b; }; add(2, 2)", "4"),
            ("let i = 1; let add = fn(a){ a + i; }; add(2)", "3"),
            (
                "let apply = fn(a, b){ b(a) }; apply(2, fn(a) { a + 1 })",
                "3",
            ),
            ("let check = fn(a){ a == 10 }; check(10)", "true"),
            ("let check = fn(a){ fn(b) { a == b } }; check(10)(10)", "true"),
            ("let a = fn() { 1 }; let b = fn() { a(); }; b()", "1"),
            (
                "let fib = fn(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); }; fib(2)",
                "1",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(run(input)?, expected, "input: {}", input);
        }
        Ok(())
    }

    #[test]
    fn closures_capture_their_defining_environment() -> Result<(), MonkeyError> {
        // The environment captured when `make` runs wins over any later
        // rebinding visible at the call site.
        let input = "
            let make = fn(a) { fn(b) { a + b } };
            let add5 = make(5);
            let a = 100;
            add5(10)
        ";
        assert_eq!(run(input)?, "15");
        Ok(())
    }

    #[test]
    fn bindings_persist_across_eval_calls() -> Result<(), MonkeyError> {
        let mut interp = Interpreter::new();
        interp.eval("let i = 1;")?;
        interp.eval("let inc = fn(n) { n + i };")?;
        assert_eq!(interp.eval("inc(41)")?.to_string(), "42");
        Ok(())
    }

    #[test]
    fn runtime_errors() {
        let cases = [
            "1/0",
            "1 > true",
            "true > 1",
            "1 == true",
            "foobar",
            "if (1) { 2 }",
            "1(2)",
            "let add = fn(a, b) { a + b }; add(1)",
            "if (10 < 1) { 10 } else { true + true }",
        ];
        for input in cases {
            match run(input) {
                Err(MonkeyError::Runtime(_)) => (),
                r => panic!("unexpected output for {}: {:?}", input, r),
            }
        }
    }

    #[test]
    fn division_by_zero() {
        match run("1/0") {
            Err(MonkeyError::Runtime(RuntimeError::DivisionByZero)) => (),
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn comparison_error_depends_on_operand_order() {
        match run("1 > true") {
            Err(MonkeyError::Runtime(RuntimeError::WrongArgumentType { .. })) => (),
            r => panic!("unexpected output: {:?}", r),
        }
        match run("true > 1") {
            Err(MonkeyError::Runtime(RuntimeError::UndefinedMethod { .. })) => (),
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn arity_mismatch() {
        match run("let add = fn(a, b) { a + b }; add(1)") {
            Err(MonkeyError::Runtime(RuntimeError::ArityMismatch {
                expected: 2,
                found: 1,
            })) => (),
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn parse_errors() {
        match run("let = 12345;") {
            Err(MonkeyError::Parse(_)) => (),
            r => panic!("unexpected output: {:?}", r),
        }
    }
}
