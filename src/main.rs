use std::fs;
use std::process;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use minischeme::env::Env;
use minischeme::evaluator::eval;
use minischeme::parser::parse;
use minischeme::reader;
use minischeme::value::Value;

fn main() {
    let mut args = std::env::args().skip(1);
    match (args.next(), args.next()) {
        (None, _) => run_repl(),
        (Some(path), None) => {
            if let Err(message) = run_file(&path) {
                eprintln!("Error: {message}");
                process::exit(1);
            }
        }
        (Some(_), Some(_)) => {
            eprintln!("usage: minischeme [script]");
            process::exit(2);
        }
    }
}

/// Evaluate every form of a script in order. Stops quietly when a form
/// yields the terminate sentinel.
fn run_file(path: &str) -> Result<(), String> {
    let source = fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
    let mut env = Env::new();
    for stx in reader::read_program(&source).map_err(|e| e.to_string())? {
        let expr = parse(&stx, &env).map_err(|e| e.to_string())?;
        if matches!(eval(&expr, &mut env).map_err(|e| e.to_string())?, Value::Terminate) {
            break;
        }
    }
    Ok(())
}

enum Outcome {
    Continue,
    Quit,
}

/// Evaluate every form on one line against the shared top-level
/// environment, printing each result that is neither void nor terminate.
fn eval_line(line: &str, env: &mut Env) -> Result<Outcome, minischeme::Error> {
    for stx in reader::read_program(line)? {
        let expr = parse(&stx, env)?;
        match eval(&expr, env)? {
            Value::Terminate => return Ok(Outcome::Quit),
            Value::Void => {}
            value => println!("{value}"),
        }
    }
    Ok(Outcome::Continue)
}

fn run_repl() {
    println!("minischeme interpreter");
    println!("Exact integers and rationals, e.g. (+ 1/2 1/3)");
    println!("Type (exit) or Ctrl+D to leave.");
    println!();

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Could not initialize line editor: {e}");
            process::exit(1);
        }
    };

    // One environment for the whole session; define persists across lines.
    let mut env = Env::new();

    loop {
        match rl.readline("scheme> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match eval_line(line, &mut env) {
                    Ok(Outcome::Continue) => {}
                    Ok(Outcome::Quit) => break,
                    // Errors abort the current line only; the environment
                    // keeps whatever mutations already happened.
                    Err(e) => println!("Error: {e}"),
                }
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(err) => {
                eprintln!("Error: {err:?}");
                break;
            }
        }
    }
}
