mod common;

use common::{eval_last, interpreter, interpreter_with_input};

#[test]
fn print_writes_through_the_host_and_returns_null() {
    let (mut interp, output) = interpreter();
    let value = interp
        .run("<test>", "PRINT(\"Hello, world!\")\nPRINT(1 + 1)\nPRINT([1, 2])")
        .unwrap();
    assert_eq!(output.borrow().as_slice(), ["Hello, world!", "2", "[1, 2]"]);
    assert_eq!(common::last_statement(&value), "0");
}

#[test]
fn print_ret_returns_the_rendered_value() {
    assert_eq!(eval_last("PRINT_RET(1 + 1) + \"!\""), "2!");
}

#[test]
fn input_returns_a_line_as_string() {
    let (mut interp, _) = interpreter_with_input(&["hello"]);
    let value = interp.run("<test>", "INPUT()").unwrap();
    assert_eq!(common::last_statement(&value), "hello");
}

#[test]
fn input_int_retries_until_an_integer_arrives() {
    let (mut interp, output) = interpreter_with_input(&["not a number", "4.5", "42"]);
    let value = interp.run("<test>", "INPUT_INT()").unwrap();
    assert_eq!(common::last_statement(&value), "42");
    assert_eq!(
        output.borrow().as_slice(),
        ["Must input an integer", "Must input an integer"]
    );
}

#[test]
fn input_failure_is_a_runtime_error() {
    let (mut interp, _) = interpreter_with_input(&[]);
    let error = interp.run("<test>", "INPUT()").unwrap_err();
    assert!(error.to_string().contains("Failed to read input"));
}

#[test]
fn type_predicates() {
    assert_eq!(eval_last("IS_NUM(3)"), "1");
    assert_eq!(eval_last("IS_NUM(3.5)"), "1");
    assert_eq!(eval_last("IS_NUM(\"3\")"), "0");
    assert_eq!(eval_last("IS_STR(\"x\")"), "1");
    assert_eq!(eval_last("IS_STR([])"), "0");
    assert_eq!(eval_last("IS_LIST([1])"), "1");
    assert_eq!(eval_last("IS_LIST(1)"), "0");
    assert_eq!(eval_last("FUN f() -> 0\nIS_FUN(f)"), "1");
    assert_eq!(eval_last("IS_FUN(PRINT)"), "1");
    assert_eq!(eval_last("IS_FUN(0)"), "0");
}

#[test]
fn clear_and_its_alias_go_through_the_host() {
    let (mut interp, output) = interpreter();
    interp.run("<test>", "CLEAR()\nCLS()").unwrap();
    assert_eq!(output.borrow().as_slice(), ["<clear>", "<clear>"]);
}

#[test]
fn builtins_render_as_builtin_functions() {
    assert_eq!(eval_last("PRINT"), "<built-in function PRINT>");
    assert_eq!(eval_last("CLS"), "<built-in function CLEAR>");
}
