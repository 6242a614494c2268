//! Shared test harness: an interpreter wired to a recording host.
//!
//! The recording host captures everything the program prints and serves
//! canned input lines, while still loading `RUN` scripts from the real file
//! system so script-inclusion tests can use temporary files.

#![allow(dead_code)]

use basil::{Error, Host, Interpreter, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

pub struct RecordingHost {
    output: Rc<RefCell<Vec<String>>>,
    input: VecDeque<String>,
}

impl Host for RecordingHost {
    fn print_line(&mut self, text: &str) {
        self.output.borrow_mut().push(text.to_string());
    }

    fn read_line(&mut self) -> io::Result<String> {
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"))
    }

    fn clear_screen(&mut self) {
        self.output.borrow_mut().push("<clear>".to_string());
    }

    fn load_script(&mut self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// An interpreter with a recording host and no canned input.
pub fn interpreter() -> (Interpreter, Rc<RefCell<Vec<String>>>) {
    interpreter_with_input(&[])
}

/// An interpreter whose host serves the given input lines to `INPUT`.
pub fn interpreter_with_input(lines: &[&str]) -> (Interpreter, Rc<RefCell<Vec<String>>>) {
    let output = Rc::new(RefCell::new(Vec::new()));
    let host = RecordingHost {
        output: Rc::clone(&output),
        input: lines.iter().map(|line| line.to_string()).collect(),
    };
    (Interpreter::with_host(Box::new(host)), output)
}

/// Runs a source text in a fresh interpreter.
pub fn eval(source: &str) -> Result<Value, Error> {
    let (mut interpreter, _) = interpreter();
    interpreter.run("<test>", source)
}

/// Runs a source text and renders the value of its last statement.
pub fn eval_last(source: &str) -> String {
    let value = eval(source).expect("program failed");
    last_statement(&value)
}

/// Runs a source text that must fail and renders the error.
pub fn eval_err(source: &str) -> String {
    eval(source).expect_err("program should have failed").to_string()
}

/// A program's value is the list of its statement values; this picks the
/// last one.
pub fn last_statement(value: &Value) -> String {
    match value {
        Value::List(elements) => elements
            .borrow()
            .last()
            .expect("program had no statements")
            .to_string(),
        other => other.to_string(),
    }
}
