//! Basil Command Line Interface
//!
//! Runs a script file when one is given, or drops into an interactive shell.
//! The shell keeps a single interpreter alive across lines, so definitions
//! persist, and it survives runtime and syntax errors: they are printed and
//! the prompt comes back.

use basil::{Interpreter, Value};
use clap::{Parser, ValueEnum};
use log::error;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Script file to execute; starts the interactive shell when omitted.
    script: Option<PathBuf>,

    /// Specify the log level of the interpreter.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    verbosity: LogLevel,
}

/// Log levels selectable on the command line.
#[derive(ValueEnum, Clone, Copy, Default, Debug)]
enum LogLevel {
    /// Only critical errors are logged.
    #[default]
    #[value(alias("0"))]
    Error,
    #[value(alias("1"))]
    Warn,
    #[value(alias("2"))]
    Info,
    /// Log the pipeline's internal progress.
    #[value(alias("3"))]
    Debug,
    #[value(alias("4"))]
    Trace,
}

impl From<LogLevel> for log::Level {
    fn from(value: LogLevel) -> Self {
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

    simple_logger::init_with_level(args.verbosity.into()).unwrap();

    let mut interpreter = Interpreter::new();

    match args.script {
        Some(path) => run_file(&mut interpreter, &path),
        None => run_shell(&mut interpreter),
    }
}

/// Executes a script file; output happens through its `PRINT` calls.
fn run_file(interpreter: &mut Interpreter, path: &PathBuf) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(io_error) => {
            error!("could not read {}: {}", path.display(), io_error);
            return ExitCode::FAILURE;
        }
    };

    match interpreter.run(&path.to_string_lossy(), &source) {
        Ok(_) => ExitCode::SUCCESS,
        Err(pipeline_error) => {
            eprintln!("{}", pipeline_error);
            ExitCode::FAILURE
        }
    }
}

/// The read-eval-print shell. Errors never abort it; only end of input
/// (Ctrl-D) leaves the loop cleanly.
fn run_shell(interpreter: &mut Interpreter) -> ExitCode {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(readline_error) => {
            error!("could not start the shell: {}", readline_error);
            return ExitCode::FAILURE;
        }
    };

    loop {
        match editor.readline("basil> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());

                match interpreter.run("<stdin>", &line) {
                    Ok(value) => println!("{}", shell_repr(&value)),
                    Err(pipeline_error) => eprintln!("{}", pipeline_error),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => return ExitCode::SUCCESS,
            Err(readline_error) => {
                error!("shell input failed: {}", readline_error);
                return ExitCode::FAILURE;
            }
        }
    }
}

/// A program's value is the list of its statement values; a line with one
/// statement echoes that statement's value rather than a one-element list.
fn shell_repr(value: &Value) -> String {
    if let Value::List(elements) = value {
        let elements = elements.borrow();
        if elements.len() == 1 {
            return elements[0].to_string();
        }
    }
    value.to_string()
}
