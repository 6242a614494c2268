use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn script_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("could not create temp script");
    file.write_all(contents.as_bytes())
        .expect("could not write temp script");
    file
}

#[test]
fn runs_a_script_file() {
    let script = script_file("FUN fib(n) -> IF n < 2 THEN n ELSE fib(n-1) + fib(n-2)\nPRINT(fib(10))\n");

    Command::cargo_bin("basil")
        .unwrap()
        .arg(script.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("55"));
}

#[test]
fn script_errors_exit_nonzero_and_render_on_stderr() {
    let script = script_file("1 / 0\n");

    Command::cargo_bin("basil")
        .unwrap()
        .arg(script.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Division by 0"));
}

#[test]
fn missing_script_file_fails() {
    Command::cargo_bin("basil")
        .unwrap()
        .arg("/no/such/file.basil")
        .assert()
        .failure();
}
