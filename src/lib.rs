//! Basil - A Small Dynamically Typed Scripting Language
//!
//! Basil supports numbers, strings, lists, variables, arithmetic and logical
//! operators, conditionals, `FOR`/`WHILE` loops with `BREAK`/`CONTINUE`,
//! first-class user-defined and built-in functions with `RETURN`, and script
//! inclusion via the `RUN` built-in.
//!
//! ## Architecture Overview
//!
//! The crate is a linear pipeline:
//!
//! ```text
//! source text -> Lexer -> tokens -> Parser -> AST -> Interpreter -> value | error
//! ```
//!
//! - **token**: source positions and the token model
//! - **lexer**: character stream to token stream
//! - **ast**: one node variant per syntactic form
//! - **parser**: recursive descent with speculative statement consumption
//! - **value**: the runtime value sum type and its operator dispatch table
//! - **context**: symbol scope arena and the call-context chain
//! - **interpreter**: the tree-walking evaluator and non-local control flow
//! - **builtin**: the built-in function library and prelude
//! - **host**: the I/O seam between the core and the outside world
//! - **error**: error kinds with positional rendering and tracebacks
//!
//! ## Example
//!
//! ```
//! use basil::Interpreter;
//!
//! let mut interpreter = Interpreter::new();
//! let value = interpreter.run("<example>", "VAR a = 1 + 2 * 3").unwrap();
//! assert_eq!(value.to_string(), "[7]");
//! ```

pub mod ast;
pub mod builtin;
pub mod context;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;

pub use error::Error;
pub use host::{Host, StdHost};
pub use interpreter::Interpreter;
pub use value::Value;
