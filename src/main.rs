use cairn::{
    lang::diagnostics::Severity, runtime::built_ins::io_words::format_stack, CairnInterpreter,
    CodeManagement, Config, Error, Interpreter, InterpreterStack,
};
use clap::Parser as ClapParser;
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The source file to run.  Without one the REPL is started.
    #[arg(required = false, help = "The .crn file to compile and run")]
    file: Option<PathBuf>,

    #[arg(long, value_name = "P", help = "Colon separated module search path, overrides CAIRN_PATH")]
    path: Option<String>,

    #[arg(long, help = "Don't compile the standard library")]
    no_std: bool,

    #[arg(long, help = "Print the stack left behind by main")]
    dump: bool,

    #[arg(long, value_name = "N", help = "The deepest word calls may nest")]
    max_depth: Option<usize>,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = Config::from_env().with_std(!cli.no_std);

    if let Some(path) = &cli.path {
        config = config.with_search_path(path);
    }

    if let Some(max_depth) = cli.max_depth {
        config = config.with_max_call_depth(max_depth);
    }

    let mut interpreter = match CairnInterpreter::with_library(config) {
        Ok(interpreter) => interpreter,
        Err(err) => {
            eprintln!("Error loading the standard library: {}", err);
            return ExitCode::FAILURE;
        }
    };

    report_warnings(&mut interpreter);

    match &cli.file {
        Some(file) => run_file(&mut interpreter, file, cli.dump),
        None => {
            run_repl(&mut interpreter);
            ExitCode::SUCCESS
        }
    }
}

/// Compile a file into the session and run its `main`.
fn run_file(interpreter: &mut CairnInterpreter, file: &Path, dump: bool) -> ExitCode {
    let compiled = interpreter.process_source_file(file);

    report_warnings(interpreter);

    if let Err(err) = compiled {
        eprintln!("Could not compile {}.", file.display());
        report_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = interpreter.run_main() {
        report_error(&err);
        return ExitCode::FAILURE;
    }

    if dump && !interpreter.stack().is_empty() {
        print!("{}", format_stack(&*interpreter));
    }

    ExitCode::SUCCESS
}

fn run_repl(interpreter: &mut CairnInterpreter) {
    println!("cairn {}", env!("CARGO_PKG_VERSION"));
    println!("Type 'quit' to exit.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input_buffer = String::new();
    let mut line_number = 0;

    loop {
        print!("> ");
        if let Err(err) = stdout.flush() {
            eprintln!("Error flushing stdout: {}", err);
            break;
        }

        input_buffer.clear();
        match stdin.read_line(&mut input_buffer) {
            Ok(0) => break,
            Ok(_) => {
                let input = input_buffer.trim();
                line_number += 1;

                if input == "quit" {
                    break;
                }
                if input.is_empty() {
                    continue;
                }

                let path = format!("<repl:{}>", line_number);

                if let Err(err) = evaluate_line(interpreter, &path, input) {
                    report_error(&err);
                }

                report_warnings(interpreter);
            }
            Err(err) => {
                eprintln!("Error reading input: {}", err);
                break;
            }
        }
    }
}

/// Declarations are compiled into the top level scope, replacing any earlier definition of the
/// same names.  Anything else is run against the session's stack.
fn evaluate_line(interpreter: &mut CairnInterpreter, path: &str, input: &str) -> cairn::Result<()> {
    if is_declaration(input) {
        interpreter.redefine_source(path, input)
    } else {
        interpreter.evaluate_source(path, input)
    }
}

fn is_declaration(input: &str) -> bool {
    matches!(input.split_whitespace().next(), Some("func") | Some("import"))
}

/// Compile failures already label each of their errors.
fn report_error(err: &Error) {
    match err {
        Error::Compile(_) => eprintln!("{}", err),
        _ => eprintln!("Error: {}", err),
    }
}

fn report_warnings(interpreter: &mut CairnInterpreter) {
    for diagnostic in interpreter.diagnostics_mut().take() {
        if diagnostic.severity == Severity::Warning {
            eprintln!("{}", diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("func f : 1 .", true ; "func")]
    #[test_case("  import util", true ; "import")]
    #[test_case("1 2 +", false ; "words")]
    #[test_case("funcs", false ; "prefix of a word")]
    fn declaration_lines(input: &str, expected: bool) {
        assert_eq!(is_declaration(input), expected);
    }

    #[test]
    fn failed_redefinition_keeps_the_old_word() {
        let mut interpreter = CairnInterpreter::with_library(Config::default().with_std(false))
            .unwrap();

        evaluate_line(&mut interpreter, "<repl:1>", "func f : 1 .").unwrap();
        assert!(evaluate_line(&mut interpreter, "<repl:2>", "func f : nope .").is_err());
        evaluate_line(&mut interpreter, "<repl:3>", "f").unwrap();

        assert_eq!(interpreter.stack().len(), 1);
    }
}
