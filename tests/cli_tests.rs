use pretty_assertions::assert_eq;
use std::process::{Command, Output};

fn run(args: &[&str], stdin: Option<&str>) -> Output {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = Command::new(env!("CARGO_BIN_EXE_cairn"))
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("CAIRN_PATH")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run the interpreter");

    {
        let mut input = child.stdin.take().unwrap();

        if let Some(text) = stdin {
            input.write_all(text.as_bytes()).unwrap();
        }
    }

    child.wait_with_output().unwrap()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn runs_main_and_dumps_the_stack() {
    let output = run(&["tests/scripts/hello.crn", "--dump"], None);

    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "hello, world\nsums work\n<3> 1 2 3\n");
}

#[test]
fn closures_keep_separate_state() {
    let output = run(&["tests/scripts/closures.crn"], None);

    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "123\n");
}

#[test]
fn compile_errors_fail_the_run() {
    let output = run(&["tests/scripts/duplicate.crn"], None);

    assert!(!output.status.success());
    assert!(stderr_of(&output)
        .contains("duplicate definition of ‘f’ at line 2 (previously defined at line 1)"));
    assert_eq!(stdout_of(&output), "");
}

#[test]
fn max_depth_limits_recursion() {
    let output = run(&["tests/scripts/runaway.crn", "--max-depth", "40"], None);

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("maximum call depth of 40 exceeded calling down"));
}

#[test]
fn no_std_leaves_out_the_standard_library() {
    let output = run(&["tests/scripts/closures.crn", "--no-std"], None);

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("unknown word ‘inc’"));
}

#[test]
fn repl_evaluates_lines_against_one_stack() {
    let session = "func double : 2 * .\n21 double\n.s\nfunc double : 3 * .\n2 double .s\nquit\n";
    let output = run(&[], Some(session));

    assert!(output.status.success(), "{}", stderr_of(&output));

    let text = stdout_of(&output);

    assert!(text.contains("<1> 42\n"));
    assert!(text.contains("<2> 42 6\n"));
}

#[test]
fn repl_reports_errors_and_carries_on() {
    let output = run(&[], Some("drop\n5 .s\n"));

    assert!(output.status.success());
    assert!(stderr_of(&output).contains("stack underflow"));
    assert!(stdout_of(&output).contains("<1> 5\n"));
}

#[test]
fn repl_keeps_a_word_whose_redefinition_fails() {
    let output = run(&["--no-std"], Some("func f : 1 .\nfunc f : nope .\nf .s\n"));

    assert!(output.status.success());

    let errors = stderr_of(&output);

    assert!(errors.contains("error: unknown word ‘nope’ at line 1"));
    assert!(!errors.contains("Error: error:"));
    assert!(stdout_of(&output).contains("<1> 1\n"));
}
