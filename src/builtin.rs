//! Built-in Functions for the Basil Scripting Language
//!
//! This module implements the standard library available to every script,
//! plus the prelude constants `NULL`, `TRUE` and `FALSE`.
//!
//! ## Function categories
//!
//! - **I/O**: `PRINT`, `PRINT_RET`, `INPUT`, `INPUT_INT`, `CLEAR` (alias
//!   `CLS`) - all routed through the interpreter's [`Host`](crate::host::Host)
//! - **Type predicates**: `IS_NUM`, `IS_STR`, `IS_LIST`, `IS_FUN`
//! - **List manipulation**: `APPEND`, `POP`, `EXTEND`, `LEN` - these mutate
//!   the list in place, unlike the list operators which build fresh lists
//! - **Script inclusion**: `RUN` - loads a file through the host and
//!   re-enters the whole pipeline against the global scope
//!
//! Each built-in declares a parameter name list; arity is validated against
//! it before the body runs, exactly like a user-defined function call.

use crate::context::Context;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::token::Position;
use crate::value::{resolve_index, Number, Value};
use std::fmt;
use std::rc::Rc;

/// Everything a built-in body needs about its call site.
pub struct BuiltinCall<'a> {
    /// Evaluated arguments, already checked against the parameter count
    pub args: &'a [Value],
    /// Execution context of this call, for error tracebacks
    pub context: &'a Rc<Context>,
    pub pos_start: &'a Position,
    pub pos_end: &'a Position,
}

impl BuiltinCall<'_> {
    /// A runtime error positioned at this call.
    fn error(&self, details: impl Into<String>) -> Box<RuntimeError> {
        RuntimeError::new(
            self.pos_start.clone(),
            self.pos_end.clone(),
            details,
            Rc::clone(self.context),
        )
    }
}

type BuiltinFn = fn(&mut Interpreter, &BuiltinCall) -> Result<Value, Box<RuntimeError>>;

/// A built-in function: its name, parameter names, and implementation.
pub struct Builtin {
    pub name: &'static str,
    pub params: &'static [&'static str],
    run: BuiltinFn,
}

impl Builtin {
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        call: &BuiltinCall,
    ) -> Result<Value, Box<RuntimeError>> {
        (self.run)(interpreter, call)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// The complete built-in function table.
pub static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "PRINT",
        params: &["value"],
        run: builtin_print,
    },
    Builtin {
        name: "PRINT_RET",
        params: &["value"],
        run: builtin_print_ret,
    },
    Builtin {
        name: "INPUT",
        params: &[],
        run: builtin_input,
    },
    Builtin {
        name: "INPUT_INT",
        params: &[],
        run: builtin_input_int,
    },
    Builtin {
        name: "CLEAR",
        params: &[],
        run: builtin_clear,
    },
    Builtin {
        name: "IS_NUM",
        params: &["value"],
        run: builtin_is_num,
    },
    Builtin {
        name: "IS_STR",
        params: &["value"],
        run: builtin_is_str,
    },
    Builtin {
        name: "IS_LIST",
        params: &["value"],
        run: builtin_is_list,
    },
    Builtin {
        name: "IS_FUN",
        params: &["value"],
        run: builtin_is_fun,
    },
    Builtin {
        name: "APPEND",
        params: &["list", "value"],
        run: builtin_append,
    },
    Builtin {
        name: "POP",
        params: &["list", "index"],
        run: builtin_pop,
    },
    Builtin {
        name: "EXTEND",
        params: &["listA", "listB"],
        run: builtin_extend,
    },
    Builtin {
        name: "LEN",
        params: &["list"],
        run: builtin_len,
    },
    Builtin {
        name: "RUN",
        params: &["fn"],
        run: builtin_run,
    },
];

/// Finds a built-in by name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

/// Populates the global scope with the prelude: the constants `NULL`,
/// `FALSE` and `TRUE`, every built-in function, and the `CLS` alias for
/// `CLEAR`.
pub fn install_prelude(scopes: &mut crate::context::ScopeArena, global: crate::context::ScopeId) {
    scopes.set(global, "NULL", Value::null());
    scopes.set(global, "FALSE", Value::from_bool(false));
    scopes.set(global, "TRUE", Value::from_bool(true));

    for builtin in BUILTINS {
        scopes.set(global, builtin.name, Value::Builtin(builtin));
    }
    if let Some(clear) = lookup("CLEAR") {
        scopes.set(global, "CLS", Value::Builtin(clear));
    }
}

/// `PRINT(value)` - writes the stringified value to program output.
fn builtin_print(
    interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    let text = call.args[0].to_string();
    interpreter.host_mut().print_line(&text);
    Ok(Value::null())
}

/// `PRINT_RET(value)` - returns the stringified value instead of printing it.
fn builtin_print_ret(
    _interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    Ok(Value::String(call.args[0].to_string()))
}

/// `INPUT()` - reads one line and returns it as a string.
fn builtin_input(
    interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    match interpreter.host_mut().read_line() {
        Ok(line) => Ok(Value::String(line)),
        Err(error) => Err(call.error(format!("Failed to read input: {}", error))),
    }
}

/// `INPUT_INT()` - reads lines until one parses as an integer.
fn builtin_input_int(
    interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    loop {
        let line = match interpreter.host_mut().read_line() {
            Ok(line) => line,
            Err(error) => return Err(call.error(format!("Failed to read input: {}", error))),
        };
        match line.trim().parse::<i64>() {
            Ok(value) => return Ok(Value::Number(Number::Int(value))),
            Err(_) => interpreter.host_mut().print_line("Must input an integer"),
        }
    }
}

/// `CLEAR()` / `CLS()` - clears the terminal.
fn builtin_clear(
    interpreter: &mut Interpreter,
    _call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    interpreter.host_mut().clear_screen();
    Ok(Value::null())
}

fn builtin_is_num(
    _interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    Ok(Value::from_bool(matches!(call.args[0], Value::Number(_))))
}

fn builtin_is_str(
    _interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    Ok(Value::from_bool(matches!(call.args[0], Value::String(_))))
}

fn builtin_is_list(
    _interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    Ok(Value::from_bool(matches!(call.args[0], Value::List(_))))
}

/// `IS_FUN(value)` - true for user-defined and built-in functions alike.
fn builtin_is_fun(
    _interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    Ok(Value::from_bool(matches!(
        call.args[0],
        Value::Function(_) | Value::Builtin(_)
    )))
}

/// `APPEND(list, value)` - pushes onto the list in place.
fn builtin_append(
    _interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    let Value::List(list) = &call.args[0] else {
        return Err(call.error("First argument must be a list"));
    };
    list.borrow_mut().push(call.args[1].clone());
    Ok(Value::null())
}

/// `POP(list, index)` - removes and returns the element at the index.
fn builtin_pop(
    _interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    let Value::List(list) = &call.args[0] else {
        return Err(call.error("First argument must be a list"));
    };
    let Value::Number(index) = &call.args[1] else {
        return Err(call.error("Second argument must be a number"));
    };

    let len = list.borrow().len();
    match resolve_index(*index, len) {
        Ok(resolved) => Ok(list.borrow_mut().remove(resolved)),
        Err(_) => Err(call.error(format!("Element at index {} is out of bounds", index))),
    }
}

/// `EXTEND(listA, listB)` - appends all of B's elements onto A in place.
fn builtin_extend(
    _interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    let Value::List(target) = &call.args[0] else {
        return Err(call.error("First argument must be a list"));
    };
    let Value::List(source) = &call.args[1] else {
        return Err(call.error("Second argument must be a list"));
    };

    // Snapshot first so EXTEND(L, L) cannot alias the borrows.
    let additions: Vec<Value> = source.borrow().clone();
    target.borrow_mut().extend(additions);
    Ok(Value::null())
}

/// `LEN(list)` - element count.
fn builtin_len(
    _interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    let Value::List(list) = &call.args[0] else {
        return Err(call.error("Argument must be a list"));
    };
    let len = list.borrow().len() as i64;
    Ok(Value::Number(Number::Int(len)))
}

/// `RUN(path)` - loads a script through the host and executes it against the
/// global scope. Any error from the inner pipeline is wrapped into a runtime
/// error of the outer script.
fn builtin_run(
    interpreter: &mut Interpreter,
    call: &BuiltinCall,
) -> Result<Value, Box<RuntimeError>> {
    let Value::String(path) = &call.args[0] else {
        return Err(call.error("Argument must be a string"));
    };
    let path = path.clone();

    let source = match interpreter.host_mut().load_script(&path) {
        Ok(source) => source,
        Err(_) => {
            return Err(call.error(format!("Failed to load script from file \"{}\"", path)))
        }
    };

    log::debug!("running script {}", path);
    match interpreter.run(&path, &source) {
        Ok(_) => Ok(Value::null()),
        Err(error) => Err(call.error(format!(
            "Failed to finish executing script \"{}\"\n{}",
            path, error
        ))),
    }
}
