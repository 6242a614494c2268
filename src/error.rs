//! Error Handling for the Basil Scripting Language
//!
//! Three error kinds cover the pipeline, one per phase:
//!
//! - [`IllegalCharError`]: the lexer met a character it cannot tokenize.
//!   Lexing stops immediately; no token stream is produced.
//! - [`SyntaxError`]: the parser met a token sequence outside the grammar,
//!   with a human-readable "expected X" message.
//! - [`RuntimeError`]: the evaluator or a built-in failed. Carries the active
//!   [`Context`] so the rendered message includes a full call traceback.
//!
//! Propagation is purely by value up the call chain. Loops and function calls
//! never catch runtime errors; the only places an error is absorbed are the
//! interactive shell (which prints it and keeps going) and the `RUN` built-in
//! (which wraps the inner script's error into a new runtime error for the
//! outer one).
//!
//! Rendering follows the `ErrorName: details` / `File <name>, line <n>`
//! shape, with lines numbered from 1.

use crate::context::Context;
use crate::token::Position;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Any failure the pipeline can produce.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    IllegalChar(#[from] IllegalCharError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] Box<RuntimeError>),
}

/// An unrecognised character in the source text.
#[derive(Debug, Clone)]
pub struct IllegalCharError {
    pub pos_start: Position,
    pub pos_end: Position,
    pub details: String,
}

impl IllegalCharError {
    pub fn new(pos_start: Position, pos_end: Position, details: String) -> Self {
        Self {
            pos_start,
            pos_end,
            details,
        }
    }
}

impl fmt::Display for IllegalCharError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Illegal Character: {}\nFile {}, line {}",
            self.details,
            self.pos_start.file_name,
            self.pos_start.line + 1
        )
    }
}

impl std::error::Error for IllegalCharError {}

/// A token sequence the grammar does not accept.
#[derive(Debug, Clone)]
pub struct SyntaxError {
    pub pos_start: Position,
    pub pos_end: Position,
    pub details: String,
}

impl SyntaxError {
    pub fn new(pos_start: Position, pos_end: Position, details: String) -> Self {
        Self {
            pos_start,
            pos_end,
            details,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid Syntax: {}\nFile {}, line {}",
            self.details,
            self.pos_start.file_name,
            self.pos_start.line + 1
        )
    }
}

impl std::error::Error for SyntaxError {}

/// An evaluation failure, carrying the context chain for its traceback.
#[derive(Debug)]
pub struct RuntimeError {
    pub pos_start: Position,
    pub pos_end: Position,
    pub details: String,
    pub context: Rc<Context>,
}

impl RuntimeError {
    pub fn new(
        pos_start: Position,
        pos_end: Position,
        details: impl Into<String>,
        context: Rc<Context>,
    ) -> Box<Self> {
        Box::new(Self {
            pos_start,
            pos_end,
            details: details.into(),
            context,
        })
    }

    /// Renders one traceback line per context, outermost call first.
    ///
    /// The innermost line uses the error position itself; each enclosing
    /// line uses the position where that context was entered.
    fn traceback(&self) -> String {
        let mut frames = Vec::new();
        let mut pos = Some(&self.pos_start);
        let mut context = Some(&self.context);

        while let Some(ctx) = context {
            if let Some(p) = pos {
                frames.push(format!(
                    "  File {}, line {}, in {}",
                    p.file_name,
                    p.line + 1,
                    ctx.display_name
                ));
            }
            pos = ctx.parent_entry_pos.as_ref();
            context = ctx.parent.as_ref();
        }

        frames.reverse();
        frames.join("\n")
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Traceback (most recent call last):\n{}\nRuntime Error: {}\nFile {}, line {}",
            self.traceback(),
            self.details,
            self.pos_start.file_name,
            self.pos_start.line + 1
        )
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, ScopeArena};

    fn pos(line: usize) -> Position {
        Position {
            index: 0,
            line,
            column: 0,
            file_name: "<test>".into(),
        }
    }

    #[test]
    fn runtime_error_renders_every_frame_outermost_first() {
        let mut arena = ScopeArena::new();
        let scope = arena.new_scope(None);

        let program = Context::program(scope);
        let outer_call = Rc::new(Context {
            display_name: "outer".to_string(),
            parent: Some(Rc::clone(&program)),
            parent_entry_pos: Some(pos(0)),
            scope,
        });
        let inner_call = Rc::new(Context {
            display_name: "inner".to_string(),
            parent: Some(Rc::clone(&outer_call)),
            parent_entry_pos: Some(pos(2)),
            scope,
        });

        let error = RuntimeError::new(pos(4), pos(4), "Division by 0", inner_call);
        let rendered = error.to_string();

        let program_at = rendered.find("in <program>").unwrap();
        let outer_at = rendered.find("in outer").unwrap();
        let inner_at = rendered.find("in inner").unwrap();
        assert!(program_at < outer_at && outer_at < inner_at);
        assert!(rendered.starts_with("Traceback (most recent call last):"));
        assert!(rendered.contains("Runtime Error: Division by 0"));
        assert!(rendered.ends_with("File <test>, line 5"));
    }

    #[test]
    fn syntax_error_renders_name_and_line() {
        let error = SyntaxError::new(pos(1), pos(1), "Expected 'THEN'".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid Syntax: Expected 'THEN'\nFile <test>, line 2"
        );
    }
}
