use crate::ast::{Expr, Stmt};
use crate::error::{DiagnosticSink, TerminalEmitter};
use crate::evaluator::Evaluator;
use crate::lexer;
use crate::parser;
use std::io::{self, BufRead, Stdout, Write};

/// Interactive loop. One evaluator lives for the whole session, so variables
/// declared on one line are visible on the next.
pub fn start(color: bool) {
    println!("Lox Interpreter v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    let mut evaluator = Evaluator::new(io::stdout());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        if let Err(error) = io::stdout().flush() {
            tracing::warn!(%error, "failed to flush prompt");
        }

        let line = match lines.next() {
            None => {
                // EOF reached (Ctrl+D or piped input ended)
                println!();
                break;
            }
            Some(Ok(line)) => line,
            Some(Err(error)) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            println!("Goodbye!");
            break;
        }

        let mut emitter = TerminalEmitter::new(line, None).with_color(color);
        run_repl_command(line, &mut evaluator, &mut emitter);
    }
}

fn run_repl_command(source: &str, evaluator: &mut Evaluator<Stdout>, sink: &mut dyn DiagnosticSink) {
    let (tokens, lex_errors) = lexer::lex(source, sink);
    let (program, parse_errors) = parser::parse(&tokens, sink);
    if lex_errors > 0 || parse_errors > 0 {
        return;
    }

    // A lone expression echoes its value; assignments stay quiet
    if let [Stmt::Expression { expr, .. }] = program.statements.as_slice() {
        if !matches!(expr, Expr::Assign { .. }) {
            match evaluator.evaluate_expression(expr) {
                Ok(value) => println!("{}", value),
                Err(error) => sink.emit(error),
            }
            return;
        }
    }

    evaluator.execute_program(&program, sink);
}
