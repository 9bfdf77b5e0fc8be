//! # Rill
//!
//! The `rill` binary runs a source file, or an interactive
//! read-eval-print loop when no file is given.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::error;

use rill_lang::interpreter::Interpreter;
use rill_lang::parser::{parse, ParseError};

/// Struct containing the CLI configuration for Rill.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// The source file to run. Starts a REPL when omitted.
    #[arg(index = 1)]
    file: Option<PathBuf>,

    /// Parse only and dump the AST as JSON instead of executing.
    #[arg(long)]
    dump_ast: bool,

    /// Specify the log level of the interpreter.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    verbosity: LogLevel,
}

/// Enum for specifying the log level of Rill.
#[derive(ValueEnum, Clone, Default, Debug)]
enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// Also log warnings.
    #[value(alias("1"))]
    Warn,

    /// Also log information about the general state of the interpreter.
    #[value(alias("2"))]
    Info,

    /// Log everything which happens internally in the interpreter.
    #[value(alias("3"))]
    Debug,

    /// Log extra information, including every produced token.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    match &args.file {
        Some(file) => run_file(file, args.dump_ast),
        None => repl(),
    }
}

fn read_source(file: &PathBuf) -> anyhow::Result<String> {
    fs::read_to_string(file).with_context(|| format!("could not read '{}'", file.display()))
}

fn run_file(file: &PathBuf, dump_ast: bool) -> ExitCode {
    let source = match read_source(file) {
        Ok(source) => source,
        Err(err) => {
            error!("{err:#}");
            return ExitCode::from(2);
        }
    };

    let statements = match parse(&source) {
        Ok(statements) => statements,
        Err(err) => {
            eprintln!("{}", format!("parse error: {err}").red());
            return ExitCode::from(3);
        }
    };

    if dump_ast {
        match serde_json::to_string_pretty(&statements) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                error!("could not serialize AST: {err}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    // runtime errors are reported and execution continues with the next
    // top-level statement
    let mut interp = Interpreter::new();
    for statement in &statements {
        if let Err(err) = interp.execute(statement) {
            eprintln!("{}", format!("runtime error: {err}").red());
        }
    }

    ExitCode::SUCCESS
}

fn repl() -> ExitCode {
    println!("Rill REPL v{}", env!("CARGO_PKG_VERSION"));

    let mut interp = Interpreter::new();
    interp.set_echo(true);

    let stdin = io::stdin();
    let mut buffer = String::new();
    let mut continuation = false;

    loop {
        let prompt = if continuation { "  ...> " } else { "rill> " };
        print!("{prompt}");
        if io::stdout().flush().is_err() {
            return ExitCode::FAILURE;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return ExitCode::SUCCESS,
            Ok(_) => {}
            Err(err) => {
                error!("could not read input: {err}");
                return ExitCode::from(2);
            }
        }

        if buffer.is_empty() && line.trim().is_empty() {
            continue;
        }
        buffer.push_str(&line);

        match parse(&buffer) {
            // an open construct: keep reading lines into the buffer
            Err(ParseError::Incomplete(_)) => {
                continuation = true;
            }
            Err(err) => {
                eprintln!("{}", format!("parse error: {err}").red());
                buffer.clear();
                continuation = false;
            }
            Ok(statements) => {
                for statement in &statements {
                    if let Err(err) = interp.execute(statement) {
                        eprintln!("{}", format!("runtime error: {err}").red());
                        break;
                    }
                }
                buffer.clear();
                continuation = false;
            }
        }
    }
}
