//! Runtime Values for the Basil Scripting Language
//!
//! This module defines the [`Value`] sum type the evaluator produces, along
//! with the complete binary/unary operator dispatch table.
//!
//! ## Operator table
//!
//! ```text
//! op  | N x N | S x S  | S x N, N x S | L x L  | L x N
//! ----+-------+--------+--------------+--------+----------------
//! +   | num   | concat | -            | concat | append element
//! -   | num   | -      | -            | -      | remove at index
//! *   | num   | -      | repeat       | -      | -
//! /   | num   | -      | -            | -      | index access
//! ^   | num   | -      | -            | -      | -
//! cmp | 0/1   | -      | -            | -      | -
//! AND | 0/1   | -      | -            | -      | -
//! OR  | 0/1   | -      | -            | -      | -
//! ```
//!
//! Every other combination is an illegal operation. Dispatch is a two-level
//! match on the operand kinds and the operator, falling through to a single
//! illegal-operation arm; the interpreter attaches source positions and the
//! active context to the resulting [`OpError`].
//!
//! ## Reference semantics
//!
//! Lists are shared mutable storage: copying a list value copies a handle,
//! so `APPEND` through one name is visible through every alias. The binary
//! operators on lists, by contrast, always build a fresh list. Numbers and
//! strings are plain copies.

use crate::ast::{BinaryOp, Node, UnaryOp};
use crate::builtin::Builtin;
use crate::context::ScopeId;
use crate::token::Position;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A numeric value, integer or floating point.
///
/// Integer arithmetic stays integral where it can, promoting to float on
/// overflow; division always produces a float; comparisons across the two
/// representations compare numerically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

/// Operator failures, positioned and contextualised by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpError {
    IllegalOperation,
    DivisionByZero,
    IndexOutOfBounds,
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpError::IllegalOperation => write!(f, "Illegal operation"),
            OpError::DivisionByZero => write!(f, "Division by 0"),
            OpError::IndexOutOfBounds => write!(f, "index out of bounds"),
        }
    }
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }

    pub fn is_true(self) -> bool {
        match self {
            Number::Int(value) => value != 0,
            Number::Float(value) => value != 0.0,
        }
    }

    pub fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map(Number::Int)
                .unwrap_or(Number::Float(a as f64 + b as f64)),
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn sub(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_sub(b)
                .map(Number::Int)
                .unwrap_or(Number::Float(a as f64 - b as f64)),
            (a, b) => Number::Float(a.as_f64() - b.as_f64()),
        }
    }

    pub fn mul(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_mul(b)
                .map(Number::Int)
                .unwrap_or(Number::Float(a as f64 * b as f64)),
            (a, b) => Number::Float(a.as_f64() * b.as_f64()),
        }
    }

    /// True division: the result is always a float.
    pub fn div(self, other: Number) -> Result<Number, OpError> {
        if !other.is_true() {
            return Err(OpError::DivisionByZero);
        }
        Ok(Number::Float(self.as_f64() / other.as_f64()))
    }

    pub fn pow(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(base), Number::Int(exp)) if (0..=u32::MAX as i64).contains(&exp) => base
                .checked_pow(exp as u32)
                .map(Number::Int)
                .unwrap_or(Number::Float((base as f64).powf(exp as f64))),
            (a, b) => Number::Float(a.as_f64().powf(b.as_f64())),
        }
    }

    pub fn eq(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }

    pub fn lt(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a < b,
            (a, b) => a.as_f64() < b.as_f64(),
        }
    }

    pub fn gt(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a > b,
            (a, b) => a.as_f64() > b.as_f64(),
        }
    }

    pub fn lte(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a <= b,
            (a, b) => a.as_f64() <= b.as_f64(),
        }
    }

    pub fn gte(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a >= b,
            (a, b) => a.as_f64() >= b.as_f64(),
        }
    }

    fn from_bool(value: bool) -> Number {
        Number::Int(value as i64)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(value) => write!(f, "{}", value),
            Number::Float(value) => write!(f, "{:?}", value),
        }
    }
}

/// A user-defined function value.
///
/// The function keeps a handle on its body subtree and on the scope it was
/// defined in; calls build a child scope under that captured scope, which is
/// what makes lookup lexical.
#[derive(Debug)]
pub struct UserFunction {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Node>,
    /// True for the one-line `->` form: the body expression's value is the
    /// call result. Block bodies only return through `RETURN`.
    pub auto_return: bool,
    /// The scope the function was defined in
    pub scope: ScopeId,
    pub pos_start: Position,
    pub pos_end: Position,
}

impl UserFunction {
    /// The name shown in error messages and tracebacks.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Number(Number),
    String(String),
    List(Rc<RefCell<Vec<Value>>>),
    Function(Rc<UserFunction>),
    Builtin(&'static Builtin),
}

impl Value {
    /// The null value: `Number(0)`, also bound to `NULL` in the prelude.
    pub fn null() -> Value {
        Value::Number(Number::Int(0))
    }

    /// `1` for true, `0` for false.
    pub fn from_bool(value: bool) -> Value {
        Value::Number(Number::from_bool(value))
    }

    pub fn list(elements: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    /// Truthiness: non-zero numbers, non-empty strings, non-empty lists;
    /// functions are always true.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Number(number) => number.is_true(),
            Value::String(text) => !text.is_empty(),
            Value::List(elements) => !elements.borrow().is_empty(),
            Value::Function(_) | Value::Builtin(_) => true,
        }
    }

    /// Applies a binary operator according to the dispatch table.
    pub fn binary_op(&self, op: BinaryOp, rhs: &Value) -> Result<Value, OpError> {
        match (self, op, rhs) {
            (Value::Number(a), _, Value::Number(b)) => number_op(*a, op, *b),

            (Value::String(a), BinaryOp::Add, Value::String(b)) => {
                Ok(Value::String(format!("{}{}", a, b)))
            }
            (Value::String(text), BinaryOp::Mul, Value::Number(count))
            | (Value::Number(count), BinaryOp::Mul, Value::String(text)) => repeat(text, *count),

            (Value::List(a), BinaryOp::Add, Value::List(b)) => {
                let mut elements = a.borrow().clone();
                elements.extend(b.borrow().iter().cloned());
                Ok(Value::list(elements))
            }
            (Value::List(a), BinaryOp::Add, element) => {
                let mut elements = a.borrow().clone();
                elements.push(element.clone());
                Ok(Value::list(elements))
            }
            (Value::List(elements), BinaryOp::Sub, Value::Number(index)) => {
                let mut elements = elements.borrow().clone();
                let index = resolve_index(*index, elements.len())?;
                elements.remove(index);
                Ok(Value::list(elements))
            }
            (Value::List(elements), BinaryOp::Div, Value::Number(index)) => {
                let elements = elements.borrow();
                let index = resolve_index(*index, elements.len())?;
                Ok(elements[index].clone())
            }

            _ => Err(OpError::IllegalOperation),
        }
    }

    /// Applies a unary operator.
    ///
    /// Negation is multiplication by `-1` through the binary table, so it
    /// shares the table's behaviour for every operand kind.
    pub fn unary_op(&self, op: UnaryOp) -> Result<Value, OpError> {
        match op {
            UnaryOp::Neg => self.binary_op(BinaryOp::Mul, &Value::Number(Number::Int(-1))),
            UnaryOp::Pos => Ok(self.clone()),
            UnaryOp::Not => match self {
                Value::Number(number) => Ok(Value::from_bool(!number.is_true())),
                _ => Err(OpError::IllegalOperation),
            },
        }
    }
}

fn number_op(a: Number, op: BinaryOp, b: Number) -> Result<Value, OpError> {
    let result = match op {
        BinaryOp::Add => a.add(b),
        BinaryOp::Sub => a.sub(b),
        BinaryOp::Mul => a.mul(b),
        BinaryOp::Div => a.div(b)?,
        BinaryOp::Pow => a.pow(b),
        BinaryOp::Eq => Number::from_bool(a.eq(b)),
        BinaryOp::Ne => Number::from_bool(!a.eq(b)),
        BinaryOp::Lt => Number::from_bool(a.lt(b)),
        BinaryOp::Gt => Number::from_bool(a.gt(b)),
        BinaryOp::Lte => Number::from_bool(a.lte(b)),
        BinaryOp::Gte => Number::from_bool(a.gte(b)),
        BinaryOp::And => Number::from_bool(a.is_true() && b.is_true()),
        BinaryOp::Or => Number::from_bool(a.is_true() || b.is_true()),
    };
    Ok(Value::Number(result))
}

/// String repetition; only integer counts are meaningful, and negative
/// counts produce the empty string.
fn repeat(text: &str, count: Number) -> Result<Value, OpError> {
    match count {
        Number::Int(count) => Ok(Value::String(text.repeat(count.max(0) as usize))),
        Number::Float(_) => Err(OpError::IllegalOperation),
    }
}

/// Maps a possibly-negative index into `0..len`; negative indices count from
/// the end of the list.
pub(crate) fn resolve_index(index: Number, len: usize) -> Result<usize, OpError> {
    let Number::Int(index) = index else {
        return Err(OpError::IndexOutOfBounds);
    };

    let resolved = if index < 0 {
        index + len as i64
    } else {
        index
    };

    if (0..len as i64).contains(&resolved) {
        Ok(resolved as usize)
    } else {
        Err(OpError::IndexOutOfBounds)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(number) => write!(f, "{}", number),
            Value::String(text) => write!(f, "{}", text),
            Value::List(elements) => {
                let rendered: Vec<String> = elements
                    .borrow()
                    .iter()
                    .map(|element| element.to_string())
                    .collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Function(function) => write!(f, "<function {}>", function.display_name()),
            Value::Builtin(builtin) => write!(f, "<built-in function {}>", builtin.name),
        }
    }
}
