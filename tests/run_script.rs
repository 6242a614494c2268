mod common;

use common::interpreter;
use std::io::Write;
use tempfile::NamedTempFile;

fn script_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("could not create temp script");
    file.write_all(contents.as_bytes())
        .expect("could not write temp script");
    file
}

#[test]
fn run_executes_a_script_against_the_global_scope() {
    let script = script_file("VAR greeting = \"hi\"\nPRINT(greeting)\n");
    let (mut interp, output) = interpreter();

    let source = format!("RUN(\"{}\")", script.path().display());
    interp.run("<test>", &source).unwrap();
    assert_eq!(output.borrow().as_slice(), ["hi"]);

    // Definitions made by the script land in the shared global scope.
    let value = interp.run("<test>", "greeting + \"!\"").unwrap();
    assert_eq!(common::last_statement(&value), "hi!");
}

#[test]
fn run_propagates_inner_errors_to_the_outer_script() {
    let script = script_file("VAR x = 1 / 0\n");
    let (mut interp, _) = interpreter();

    let source = format!("RUN(\"{}\")", script.path().display());
    let error = interp.run("<test>", &source).unwrap_err().to_string();
    assert!(error.contains("Failed to finish executing script"));
    assert!(error.contains("Division by 0"));
}

#[test]
fn run_reports_missing_files() {
    let (mut interp, _) = interpreter();
    let error = interp
        .run("<test>", "RUN(\"/no/such/script.basil\")")
        .unwrap_err()
        .to_string();
    assert!(error.contains("Failed to load script from file"));
}

#[test]
fn run_requires_a_string_path() {
    let (mut interp, _) = interpreter();
    let error = interp.run("<test>", "RUN(42)").unwrap_err().to_string();
    assert!(error.contains("Argument must be a string"));
}

#[test]
fn scripts_can_run_scripts() {
    let inner = script_file("PRINT(\"inner\")\n");
    let outer = script_file(&format!(
        "PRINT(\"outer\")\nRUN(\"{}\")\n",
        inner.path().display()
    ));
    let (mut interp, output) = interpreter();

    let source = format!("RUN(\"{}\")", outer.path().display());
    interp.run("<test>", &source).unwrap();
    assert_eq!(output.borrow().as_slice(), ["outer", "inner"]);
}
