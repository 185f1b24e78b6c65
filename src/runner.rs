//! Program entry points: source text in, diagnostics and side effects out.
//!
//! Pipeline: scan → parse → resolve → interpret.  Lexical and syntax errors
//! are all collected before giving up; binding errors are collected by the
//! resolver; any of them means the program never runs.  A runtime error
//! halts the run and is reported on its own.

use std::io::{self, Write};

use log::{debug, info};
use serde::Serialize;

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::token::Token;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Ok,
    /// Lexical, syntax or binding errors; nothing was executed.
    CompileError,
    /// Execution started and was halted by a runtime error.
    RuntimeError,
}

impl Status {
    /// Conventional process exit code (sysexits `EX_DATAERR` /
    /// `EX_SOFTWARE`).
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::CompileError => 65,
            Status::RuntimeError => 70,
        }
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct Outcome {
    pub status: Status,
    /// Compile‑time diagnostics in the order they were found.
    pub diagnostics: Vec<LoxError>,
    pub runtime_error: Option<LoxError>,
    /// Captured `print` output (only filled by [`run_program`]).
    pub output: String,
}

/// Runs `source` on a fresh interpreter and captures everything it prints.
pub fn run_program(source: &str) -> Outcome {
    let mut buffer: Vec<u8> = Vec::new();

    let mut outcome: Outcome = run_source(source, Box::new(&mut buffer));
    outcome.output = String::from_utf8_lossy(&buffer).into_owned();

    outcome
}

/// Runs `source` on a fresh interpreter whose `print` writes to `out`.
pub fn run_source<'a>(source: &'a str, out: Box<dyn Write + 'a>) -> Outcome {
    info!("Running program of {} bytes", source.len());

    let (tokens, lex_errors) = scan_tokens(source);
    let mut interpreter: Interpreter<'_> = Interpreter::with_output(out);
    let mut next_id: usize = 0;

    execute(&mut interpreter, &tokens, lex_errors, &mut next_id)
}

/// A long‑lived interpreter for the interactive prompt: every line sees the
/// declarations of the lines before it.
pub struct Session {
    interpreter: Interpreter<'static>,
    next_id: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
            next_id: 0,
        }
    }

    /// Runs one chunk of input.  Errors do not end the session.
    pub fn run(&mut self, line: String) -> Outcome {
        // Functions declared here may be called from any later line, so the
        // text and its tokens must live as long as the session.
        let source: &'static str = Box::leak(line.into_boxed_str());
        let (tokens, lex_errors) = scan_tokens(source);
        let tokens: &'static [Token<'static>] = Box::leak(tokens.into_boxed_slice());

        execute(&mut self.interpreter, tokens, lex_errors, &mut self.next_id)
    }
}

fn execute<'a>(
    interpreter: &mut Interpreter<'a>,
    tokens: &'a [Token<'a>],
    mut diagnostics: Vec<LoxError>,
    next_id: &mut usize,
) -> Outcome {
    let mut parser: Parser<'a> = Parser::with_first_id(tokens, *next_id);
    let parsed = parser.parse();
    *next_id = parser.next_id();

    let statements = match parsed {
        Ok(statements) => statements,
        Err(errors) => {
            diagnostics.extend(errors);
            return compile_error(diagnostics);
        }
    };

    if !diagnostics.is_empty() {
        return compile_error(diagnostics);
    }

    if let Err(errors) = Resolver::new(interpreter).resolve(&statements) {
        diagnostics.extend(errors);
        return compile_error(diagnostics);
    }

    match interpreter.interpret(&statements) {
        Ok(()) => Outcome {
            status: Status::Ok,
            diagnostics,
            runtime_error: None,
            output: String::new(),
        },

        Err(e) => {
            debug!("Runtime error: {}", e);

            Outcome {
                status: Status::RuntimeError,
                diagnostics,
                runtime_error: Some(e),
                output: String::new(),
            }
        }
    }
}

fn compile_error(diagnostics: Vec<LoxError>) -> Outcome {
    info!("Compilation failed with {} error(s)", diagnostics.len());

    Outcome {
        status: Status::CompileError,
        diagnostics,
        runtime_error: None,
        output: String::new(),
    }
}
