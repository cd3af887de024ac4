//! Monkey interpreter command-line.
//!
//! When called without argument it drops into an interactive
//! read-evaluate-print loop.
//!
//! When called with arguments, it interprets the corresponding files in a
//! single interpreter session (so definitions are shared between files) and
//! prints the final value of each.

use std::env;
use std::fs;
use std::io;
use std::io::prelude::*;

use anyhow::{self, Context};

use monkey::interpreter::Interpreter;

fn main() -> Result<(), anyhow::Error> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if !args.is_empty() {
        run_all_files(args)?;
    } else {
        run_prompt()?;
    }
    Ok(())
}

fn run_all_files(paths: Vec<String>) -> Result<(), anyhow::Error> {
    let mut interp = Interpreter::new();

    for p in &paths {
        let source =
            fs::read_to_string(p).with_context(|| format!("failed to read {}", p))?;
        let value = interp.eval(&source)?;
        println!("{}", value);
    }

    Ok(())
}

fn run_prompt() -> Result<(), io::Error> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    let mut interp = Interpreter::new();

    let mut input = String::new();
    loop {
        stdout.write_all(b">> ")?;
        stdout.flush()?;

        input.clear();
        let nbytes = stdin.read_line(&mut input)?;
        if nbytes == 0 {
            break;
        }
        if input.trim().is_empty() {
            continue;
        }

        match interp.eval(&input) {
            Ok(value) => println!("{}", value),
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}
