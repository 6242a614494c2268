//! Tree-Walking Evaluator for the Basil Scripting Language
//!
//! This module implements the execution engine that walks the AST against a
//! lexically scoped symbol environment, producing values or positioned
//! runtime errors.
//!
//! ## Control flow model
//!
//! Every visit produces a [`Flow`]: a plain value, or one of the non-local
//! signals `Return`, `Break`, `Continue`. Signals are ordinary result
//! variants, not host-language panics; each visitor passes an unconsumed
//! signal straight through to its caller. Exactly three places consume them:
//!
//! - `FOR`/`WHILE` loops consume `Break` and `Continue`
//! - a function call boundary consumes `Return` (and rejects the loop
//!   signals - they cannot escape the function they were written in)
//! - the program root rejects all three as runtime errors
//!
//! ## Scoping
//!
//! Symbol frames live in a [`ScopeArena`]; lookup walks the parent chain,
//! `VAR` always binds in the current frame. Function values capture the
//! frame they were defined in, and calls build their argument frame under
//! that captured frame - lookup is lexical, and what a body sees reflects
//! the enclosing frames at call time. Separately from the symbol frames,
//! every call pushes a [`Context`] linked to its *caller*, which is what
//! runtime tracebacks are rendered from.
//!
//! ## Notable semantics
//!
//! - `AND`/`OR` evaluate both operands; there is no short-circuiting.
//! - A loop's value is the list of its per-iteration body values; block
//!   bodies (`returns_unit`) yield `null` instead.
//! - `FOR` counts from `start` while `i < end` (or `i > end` for a negative
//!   step), stepping by `STEP` or `1`.

use crate::ast::Node;
use crate::builtin::{install_prelude, Builtin, BuiltinCall};
use crate::context::{Context, ScopeArena, ScopeId};
use crate::error::{Error, RuntimeError};
use crate::host::{Host, StdHost};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::token::Position;
use crate::value::{Number, OpError, UserFunction, Value};
use log::debug;
use std::rc::Rc;

/// The result of one AST visit: a value or a non-local control-flow signal.
///
/// `Return`, `Break` and `Continue` carry the span of the statement that
/// raised them, so a signal that escapes to a boundary that cannot consume
/// it can be reported as a positioned runtime error.
#[derive(Debug)]
pub enum Flow {
    Value(Value),
    Return(Value, Position, Position),
    Break(Position, Position),
    Continue(Position, Position),
}

type RunFlow = Result<Flow, Box<RuntimeError>>;

/// Evaluates `$node` and unwraps its value, passing errors and non-local
/// signals through to the enclosing visitor.
macro_rules! eval {
    ($self:ident, $node:expr, $ctx:expr) => {
        match $self.visit($node, $ctx)? {
            Flow::Value(value) => value,
            flow => return Ok(flow),
        }
    };
}

/// The interpreter: global scope, symbol arena, and host handle.
///
/// One interpreter holds one global scope for its whole lifetime, so an
/// interactive shell can feed it line after line and keep definitions.
pub struct Interpreter {
    scopes: ScopeArena,
    global: ScopeId,
    host: Box<dyn Host>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter wired to the standard host (stdout, stdin,
    /// the file system) with the prelude installed.
    pub fn new() -> Self {
        Self::with_host(Box::new(StdHost))
    }

    /// Creates an interpreter against a custom [`Host`].
    pub fn with_host(host: Box<dyn Host>) -> Self {
        let mut scopes = ScopeArena::new();
        let global = scopes.new_scope(None);
        install_prelude(&mut scopes, global);
        Self {
            scopes,
            global,
            host,
        }
    }

    pub fn host_mut(&mut self) -> &mut dyn Host {
        self.host.as_mut()
    }

    /// Runs a source text through the full pipeline against the global
    /// scope.
    ///
    /// # Arguments
    /// * `file_name` - name reported in error positions, e.g. a path or
    ///   `<stdin>`
    /// * `source` - the program text
    ///
    /// # Returns
    /// The program's value - a list of its top-level statement values - or
    /// the first error any phase produced.
    pub fn run(&mut self, file_name: &str, source: &str) -> Result<Value, Error> {
        let tokens = Lexer::new(file_name, source).make_tokens()?;
        debug!("lexed {} tokens from {}", tokens.len(), file_name);

        let ast = Parser::new(tokens).parse()?;
        debug!("parsed {}", file_name);

        let context = Context::program(self.global);
        match self.visit(&ast, &context)? {
            Flow::Value(value) => Ok(value),
            Flow::Return(_, pos_start, pos_end) => Err(RuntimeError::new(
                pos_start,
                pos_end,
                "'RETURN' outside of a function",
                context,
            )
            .into()),
            Flow::Break(pos_start, pos_end) => Err(RuntimeError::new(
                pos_start,
                pos_end,
                "'BREAK' outside of a loop",
                context,
            )
            .into()),
            Flow::Continue(pos_start, pos_end) => Err(RuntimeError::new(
                pos_start,
                pos_end,
                "'CONTINUE' outside of a loop",
                context,
            )
            .into()),
        }
    }

    /// Dispatches on the node variant.
    fn visit(&mut self, node: &Node, context: &Rc<Context>) -> RunFlow {
        match node {
            Node::Number { value, .. } => Ok(Flow::Value(Value::Number(*value))),

            Node::Str { value, .. } => Ok(Flow::Value(Value::String(value.clone()))),

            Node::List { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(eval!(self, element, context));
                }
                Ok(Flow::Value(Value::list(values)))
            }

            Node::VarAccess {
                name,
                pos_start,
                pos_end,
            } => match self.scopes.get(context.scope, name) {
                Some(value) => Ok(Flow::Value(value)),
                None => Err(RuntimeError::new(
                    pos_start.clone(),
                    pos_end.clone(),
                    format!("'{}' is not defined", name),
                    Rc::clone(context),
                )),
            },

            Node::VarAssign { name, value, .. } => {
                let value = eval!(self, value, context);
                self.scopes.set(context.scope, name.clone(), value.clone());
                Ok(Flow::Value(value))
            }

            Node::Binary {
                op,
                lhs,
                rhs,
                pos_start,
                pos_end,
            } => {
                let lhs = eval!(self, lhs, context);
                let rhs = eval!(self, rhs, context);
                match lhs.binary_op(*op, &rhs) {
                    Ok(value) => Ok(Flow::Value(value)),
                    Err(error) => Err(self.op_error(error, pos_start, pos_end, context)),
                }
            }

            Node::Unary {
                op,
                operand,
                pos_start,
                pos_end,
            } => {
                let operand = eval!(self, operand, context);
                match operand.unary_op(*op) {
                    Ok(value) => Ok(Flow::Value(value)),
                    Err(error) => Err(self.op_error(error, pos_start, pos_end, context)),
                }
            }

            Node::If {
                cases, else_case, ..
            } => {
                for case in cases {
                    let condition = eval!(self, &case.condition, context);
                    if condition.is_true() {
                        let value = eval!(self, &case.body, context);
                        return Ok(Flow::Value(if case.returns_unit {
                            Value::null()
                        } else {
                            value
                        }));
                    }
                }

                if let Some(else_case) = else_case {
                    let value = eval!(self, &else_case.body, context);
                    return Ok(Flow::Value(if else_case.returns_unit {
                        Value::null()
                    } else {
                        value
                    }));
                }

                Ok(Flow::Value(Value::null()))
            }

            Node::For {
                var_name,
                start,
                end,
                step,
                body,
                returns_unit,
                pos_start,
                pos_end,
            } => self.visit_for(
                var_name,
                start,
                end,
                step.as_deref(),
                body,
                *returns_unit,
                pos_start,
                pos_end,
                context,
            ),

            Node::While {
                condition,
                body,
                returns_unit,
                ..
            } => {
                let mut elements = Vec::new();

                loop {
                    let condition = eval!(self, condition, context);
                    if !condition.is_true() {
                        break;
                    }

                    match self.visit(body, context)? {
                        Flow::Value(value) => elements.push(value),
                        Flow::Continue(..) => {}
                        Flow::Break(..) => break,
                        flow @ Flow::Return(..) => return Ok(flow),
                    }
                }

                Ok(Flow::Value(if *returns_unit {
                    Value::null()
                } else {
                    Value::list(elements)
                }))
            }

            Node::FunctionDef {
                name,
                params,
                body,
                auto_return,
                pos_start,
                pos_end,
            } => {
                let function = Value::Function(Rc::new(UserFunction {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    auto_return: *auto_return,
                    scope: context.scope,
                    pos_start: pos_start.clone(),
                    pos_end: pos_end.clone(),
                }));

                // The function value may outlive this call frame.
                self.scopes.pin(context.scope);

                if let Some(name) = name {
                    self.scopes
                        .set(context.scope, name.clone(), function.clone());
                }

                Ok(Flow::Value(function))
            }

            Node::Call {
                callee,
                args,
                pos_start,
                pos_end,
            } => {
                let callee = eval!(self, callee, context);

                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(eval!(self, arg, context));
                }

                let value = self.call_value(callee, arg_values, context, pos_start, pos_end)?;
                Ok(Flow::Value(value))
            }

            Node::Return {
                value,
                pos_start,
                pos_end,
            } => {
                let value = match value {
                    Some(node) => eval!(self, node, context),
                    None => Value::null(),
                };
                Ok(Flow::Return(value, pos_start.clone(), pos_end.clone()))
            }

            Node::Continue { pos_start, pos_end } => {
                Ok(Flow::Continue(pos_start.clone(), pos_end.clone()))
            }

            Node::Break { pos_start, pos_end } => {
                Ok(Flow::Break(pos_start.clone(), pos_end.clone()))
            }
        }
    }

    /// `FOR` loop: binds the counter in the current frame each iteration
    /// and collects body values.
    #[allow(clippy::too_many_arguments)]
    fn visit_for(
        &mut self,
        var_name: &str,
        start: &Node,
        end: &Node,
        step: Option<&Node>,
        body: &Node,
        returns_unit: bool,
        pos_start: &Position,
        pos_end: &Position,
        context: &Rc<Context>,
    ) -> RunFlow {
        let start = eval!(self, start, context);
        let Value::Number(start) = start else {
            return Err(RuntimeError::new(
                pos_start.clone(),
                pos_end.clone(),
                "'FOR' start value must be a number",
                Rc::clone(context),
            ));
        };

        let end = eval!(self, end, context);
        let Value::Number(end) = end else {
            return Err(RuntimeError::new(
                pos_start.clone(),
                pos_end.clone(),
                "'FOR' end value must be a number",
                Rc::clone(context),
            ));
        };

        let step = match step {
            Some(node) => {
                let step = eval!(self, node, context);
                let Value::Number(step) = step else {
                    return Err(RuntimeError::new(
                        pos_start.clone(),
                        pos_end.clone(),
                        "'FOR' step value must be a number",
                        Rc::clone(context),
                    ));
                };
                step
            }
            None => Number::Int(1),
        };

        let ascending = step.gte(Number::Int(0));
        let mut elements = Vec::new();
        let mut i = start;

        loop {
            let keep_going = if ascending { i.lt(end) } else { i.gt(end) };
            if !keep_going {
                break;
            }

            self.scopes
                .set(context.scope, var_name, Value::Number(i));
            i = i.add(step);

            match self.visit(body, context)? {
                Flow::Value(value) => elements.push(value),
                Flow::Continue(..) => {}
                Flow::Break(..) => break,
                flow @ Flow::Return(..) => return Ok(flow),
            }
        }

        Ok(Flow::Value(if returns_unit {
            Value::null()
        } else {
            Value::list(elements)
        }))
    }

    /// Invokes a callable value: arity check, argument binding, body
    /// evaluation, and consumption of the `Return` signal.
    fn call_value(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        context: &Rc<Context>,
        pos_start: &Position,
        pos_end: &Position,
    ) -> Result<Value, Box<RuntimeError>> {
        match callee {
            Value::Function(function) => {
                self.check_arity(
                    function.display_name(),
                    function.params.len(),
                    args.len(),
                    context,
                    pos_start,
                    pos_end,
                )?;

                let scope = self.scopes.new_scope(Some(function.scope));
                for (param, value) in function.params.iter().zip(args) {
                    self.scopes.set(scope, param.clone(), value);
                }

                let exec_context = Rc::new(Context {
                    display_name: function.display_name().to_string(),
                    parent: Some(Rc::clone(context)),
                    parent_entry_pos: Some(pos_start.clone()),
                    scope,
                });

                let flow = self.visit(&function.body, &exec_context);
                self.scopes.release(scope);

                match flow? {
                    Flow::Value(value) => Ok(if function.auto_return {
                        value
                    } else {
                        Value::null()
                    }),
                    Flow::Return(value, ..) => Ok(value),
                    Flow::Break(pos_start, pos_end) => Err(RuntimeError::new(
                        pos_start,
                        pos_end,
                        "'BREAK' outside of a loop",
                        exec_context,
                    )),
                    Flow::Continue(pos_start, pos_end) => Err(RuntimeError::new(
                        pos_start,
                        pos_end,
                        "'CONTINUE' outside of a loop",
                        exec_context,
                    )),
                }
            }

            Value::Builtin(builtin) => {
                self.check_arity(
                    builtin.name,
                    builtin.params.len(),
                    args.len(),
                    context,
                    pos_start,
                    pos_end,
                )?;

                let exec_context = Rc::new(Context {
                    display_name: builtin.name.to_string(),
                    parent: Some(Rc::clone(context)),
                    parent_entry_pos: Some(pos_start.clone()),
                    scope: context.scope,
                });

                self.call_builtin(builtin, &args, &exec_context, pos_start, pos_end)
            }

            _ => Err(RuntimeError::new(
                pos_start.clone(),
                pos_end.clone(),
                "Illegal operation",
                Rc::clone(context),
            )),
        }
    }

    fn call_builtin(
        &mut self,
        builtin: &'static Builtin,
        args: &[Value],
        context: &Rc<Context>,
        pos_start: &Position,
        pos_end: &Position,
    ) -> Result<Value, Box<RuntimeError>> {
        let call = BuiltinCall {
            args,
            context,
            pos_start,
            pos_end,
        };
        builtin.call(self, &call)
    }

    /// Argument counts must match the parameter list exactly.
    fn check_arity(
        &self,
        name: &str,
        expected: usize,
        got: usize,
        context: &Rc<Context>,
        pos_start: &Position,
        pos_end: &Position,
    ) -> Result<(), Box<RuntimeError>> {
        if got > expected {
            return Err(RuntimeError::new(
                pos_start.clone(),
                pos_end.clone(),
                format!("{} too many args passed into '{}'", got - expected, name),
                Rc::clone(context),
            ));
        }
        if got < expected {
            return Err(RuntimeError::new(
                pos_start.clone(),
                pos_end.clone(),
                format!("{} too few args passed into '{}'", expected - got, name),
                Rc::clone(context),
            ));
        }
        Ok(())
    }

    fn op_error(
        &self,
        error: OpError,
        pos_start: &Position,
        pos_end: &Position,
        context: &Rc<Context>,
    ) -> Box<RuntimeError> {
        RuntimeError::new(
            pos_start.clone(),
            pos_end.clone(),
            error.to_string(),
            Rc::clone(context),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// A host that records output and serves canned input lines.
    struct TestHost {
        output: Rc<RefCell<Vec<String>>>,
        input: Vec<String>,
    }

    impl Host for TestHost {
        fn print_line(&mut self, text: &str) {
            self.output.borrow_mut().push(text.to_string());
        }

        fn read_line(&mut self) -> std::io::Result<String> {
            if self.input.is_empty() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "end of input",
                ));
            }
            Ok(self.input.remove(0))
        }

        fn clear_screen(&mut self) {}

        fn load_script(&mut self, _path: &str) -> std::io::Result<String> {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no scripts in tests",
            ))
        }
    }

    fn interp() -> (Interpreter, Rc<RefCell<Vec<String>>>) {
        let output = Rc::new(RefCell::new(Vec::new()));
        let host = TestHost {
            output: Rc::clone(&output),
            input: Vec::new(),
        };
        (Interpreter::with_host(Box::new(host)), output)
    }

    /// Runs a single-statement source and returns that statement's value.
    fn eval_one(interpreter: &mut Interpreter, source: &str) -> Value {
        let result = interpreter.run("<test>", source).expect("run failed");
        match result {
            Value::List(elements) => {
                let mut elements = elements.borrow_mut();
                assert_eq!(elements.len(), 1, "expected a single statement value");
                elements.remove(0)
            }
            other => other,
        }
    }

    #[test]
    fn arithmetic_precedence() {
        let (mut interpreter, _) = interp();
        assert_eq!(eval_one(&mut interpreter, "1 + 2 * 3").to_string(), "7");
        assert_eq!(eval_one(&mut interpreter, "-2 ^ 2").to_string(), "4");
        assert_eq!(eval_one(&mut interpreter, "2 ^ 3 ^ 2").to_string(), "512");
    }

    #[test]
    fn same_source_twice_in_fresh_globals_is_deterministic() {
        let source = "VAR a = 1 + 2 * 3\nFOR i = 0 TO a THEN i * i";
        let (mut first, _) = interp();
        let (mut second, _) = interp();
        assert_eq!(
            first.run("<test>", source).unwrap().to_string(),
            second.run("<test>", source).unwrap().to_string()
        );
    }

    #[test]
    fn variables_persist_across_runs() {
        let (mut interpreter, _) = interp();
        interpreter.run("<test>", "VAR a = 41").unwrap();
        assert_eq!(eval_one(&mut interpreter, "a + 1").to_string(), "42");
    }

    #[test]
    fn function_body_sees_enclosing_frame_at_call_time() {
        let (mut interpreter, _) = interp();
        let value = eval_one(
            &mut interpreter,
            "[VAR x = 1, FUN f() -> x, VAR x = 2, f()] / 3",
        );
        assert_eq!(value.to_string(), "2");
    }

    #[test]
    fn for_loop_collects_body_values_with_exclusive_end() {
        let (mut interpreter, _) = interp();
        let value = eval_one(&mut interpreter, "FOR i = 0 TO 3 THEN i * i");
        assert_eq!(value.to_string(), "[0, 1, 4]");
    }

    #[test]
    fn block_for_loop_returns_null() {
        let (mut interpreter, _) = interp();
        let value = eval_one(&mut interpreter, "FOR i = 0 TO 3 THEN\nPRINT(i)\nEND");
        assert_eq!(value.to_string(), "0");
    }

    #[test]
    fn for_loop_with_negative_step_counts_down() {
        let (mut interpreter, _) = interp();
        let value = eval_one(&mut interpreter, "FOR i = 3 TO 0 STEP -1 THEN i");
        assert_eq!(value.to_string(), "[3, 2, 1]");
    }

    #[test]
    fn break_and_continue_affect_the_nearest_loop() {
        let (mut interpreter, _) = interp();
        let value = eval_one(
            &mut interpreter,
            "FOR i = 0 TO 5 THEN IF i == 2 THEN CONTINUE ELIF i == 4 THEN BREAK ELSE i",
        );
        assert_eq!(value.to_string(), "[0, 1, 3]");
    }

    #[test]
    fn break_only_exits_the_inner_loop() {
        let (mut interpreter, _) = interp();
        let value = eval_one(
            &mut interpreter,
            "FOR i = 0 TO 3 THEN FOR j = 0 TO 3 THEN IF j == 1 THEN BREAK ELSE j",
        );
        assert_eq!(value.to_string(), "[[0], [0], [0]]");
    }

    #[test]
    fn return_exits_a_block_function_immediately() {
        let (mut interpreter, output) = interp();
        let value = eval_one(
            &mut interpreter,
            "[FUN f()\nRETURN 1\nPRINT(\"unreachable\")\nEND, f()] / 1",
        );
        assert_eq!(value.to_string(), "1");
        assert!(output.borrow().is_empty());
    }

    #[test]
    fn block_function_without_return_yields_null() {
        let (mut interpreter, _) = interp();
        let value = eval_one(&mut interpreter, "[FUN f()\n1 + 1\nEND, f()] / 1");
        assert_eq!(value.to_string(), "0");
    }

    #[test]
    fn signals_outside_their_hosts_are_runtime_errors() {
        for (source, message) in [
            ("BREAK", "'BREAK' outside of a loop"),
            ("CONTINUE", "'CONTINUE' outside of a loop"),
            ("RETURN 1", "'RETURN' outside of a function"),
            ("[FUN g()\nBREAK\nEND, g()] / 1", "'BREAK' outside of a loop"),
        ] {
            let (mut interpreter, _) = interp();
            let error = interpreter.run("<test>", source).unwrap_err();
            assert!(
                error.to_string().contains(message),
                "{:?} should contain {:?}",
                error.to_string(),
                message
            );
        }
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let (mut interpreter, _) = interp();
        let error = interpreter.run("<test>", "nope").unwrap_err();
        assert!(error.to_string().contains("'nope' is not defined"));
    }

    #[test]
    fn calling_a_number_is_illegal() {
        let (mut interpreter, _) = interp();
        let error = interpreter.run("<test>", "VAR x = 3\nx(1)").unwrap_err();
        assert!(error.to_string().contains("Illegal operation"));
    }

    #[test]
    fn arity_is_checked_exactly() {
        let (mut interpreter, _) = interp();
        let error = interpreter
            .run("<test>", "FUN f(a, b) -> a\nf(1)")
            .unwrap_err();
        assert!(error.to_string().contains("1 too few args passed into 'f'"));

        let error = interpreter.run("<test>", "f(1, 2, 3)").unwrap_err();
        assert!(error
            .to_string()
            .contains("1 too many args passed into 'f'"));
    }

    #[test]
    fn and_or_do_not_short_circuit() {
        let (mut interpreter, output) = interp();
        // The right operand runs even though the left already decides.
        let value = eval_one(&mut interpreter, "0 AND IS_NUM(PRINT(7))");
        assert_eq!(value.to_string(), "0");
        assert_eq!(output.borrow().as_slice(), ["7"]);

        let error = interpreter.run("<test>", "1 OR 1 / 0").unwrap_err();
        assert!(error.to_string().contains("Division by 0"));
    }

    #[test]
    fn division_by_zero_carries_a_traceback() {
        let (mut interpreter, _) = interp();
        let error = interpreter
            .run("<test>", "FUN boom() -> 1 / 0\nboom()")
            .unwrap_err();
        let rendered = error.to_string();
        assert!(rendered.contains("Traceback (most recent call last):"));
        assert!(rendered.contains("in <program>"));
        assert!(rendered.contains("in boom"));
        assert!(rendered.contains("Runtime Error: Division by 0"));
    }

    #[test]
    fn recursion_reuses_released_frames() {
        // Run on a thread with a larger stack: in unoptimized debug builds the
        // tree-walking evaluator's stack frames are large enough that 100
        // levels of recursion can overflow the default test-thread stack.
        std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| {
                let (mut interpreter, _) = interp();
                let value = eval_one(
                    &mut interpreter,
                    "[FUN sum(n) -> IF n == 0 THEN 0 ELSE n + sum(n - 1), sum(100)] / 1",
                );
                assert_eq!(value.to_string(), "5050");
            })
            .unwrap()
            .join()
            .unwrap();
    }
}
