mod common;

use common::{eval_err, eval_last};

#[test]
fn arithmetic_precedence() {
    assert_eq!(eval_last("VAR a = 1 + 2 * 3"), "7");
    assert_eq!(eval_last("(1 + 2) * 3"), "9");
    assert_eq!(eval_last("10 - 2 - 3"), "5");
}

#[test]
fn division_always_produces_a_float() {
    assert_eq!(eval_last("5 / 2"), "2.5");
    assert_eq!(eval_last("6 / 2"), "3.0");
}

#[test]
fn power_is_right_associative() {
    assert_eq!(eval_last("2 ^ 3 ^ 2"), "512");
}

#[test]
fn unary_minus_binds_tighter_than_power() {
    assert_eq!(eval_last("-2 ^ 2"), "4");
    assert_eq!(eval_last("2 ^ -1"), "0.5");
}

#[test]
fn string_concat_and_repeat() {
    assert_eq!(eval_last(r#"VAR s = "ab" * 3"#), "ababab");
    assert_eq!(eval_last(r#""foo" + "bar""#), "foobar");
    assert_eq!(eval_last(r#"3 * "ab""#), "ababab");
}

#[test]
fn comparisons_yield_zero_or_one() {
    assert_eq!(eval_last("1 < 2"), "1");
    assert_eq!(eval_last("2 <= 1"), "0");
    assert_eq!(eval_last("2 == 2.0"), "1");
    assert_eq!(eval_last("2 != 2"), "0");
    assert_eq!(eval_last("3 >= 3"), "1");
}

#[test]
fn logical_operators_on_numbers() {
    assert_eq!(eval_last("1 AND 2"), "1");
    assert_eq!(eval_last("1 AND 0"), "0");
    assert_eq!(eval_last("0 OR 3"), "1");
    assert_eq!(eval_last("0 OR 0"), "0");
    assert_eq!(eval_last("NOT 0"), "1");
    assert_eq!(eval_last("NOT 5"), "0");
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    assert!(eval_err("1 / 0").contains("Division by 0"));
}

#[test]
fn mixing_strings_and_numbers_is_illegal() {
    assert!(eval_err(r#""a" + 1"#).contains("Illegal operation"));
    assert!(eval_err(r#""a" - "b""#).contains("Illegal operation"));
    assert!(eval_err(r#"NOT "a""#).contains("Illegal operation"));
}

#[test]
fn prelude_constants_are_bound() {
    assert_eq!(eval_last("NULL"), "0");
    assert_eq!(eval_last("TRUE"), "1");
    assert_eq!(eval_last("FALSE"), "0");
}

#[test]
fn semicolons_separate_statements_like_newlines() {
    assert_eq!(eval_last("VAR a = 1; VAR b = 2; a + b"), "3");
}

#[test]
fn comments_are_ignored_to_end_of_line() {
    assert_eq!(eval_last("VAR a = 2 # twice\na * 2"), "4");
}
