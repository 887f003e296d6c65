use clap::{Arg, ArgAction, Command};
use lox::error::TerminalEmitter;
use lox::{lexer, parser, repl, runner};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

// Exit statuses follow the sysexits convention
const EXIT_DATA_ERROR: u8 = 65;
const EXIT_NO_INPUT: u8 = 66;
const EXIT_SOFTWARE: u8 = 70;

fn main() -> ExitCode {
    init_tracing();

    let matches = Command::new("lox")
        .about("A tree-walking interpreter for a small Lox-like scripting language")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump-tokens")
                .long("dump-tokens")
                .help("Print the token stream as line:col:kind:lexeme and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump-ast")
                .long("dump-ast")
                .help("Print the parsed program in canonical form and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Render diagnostics without ANSI colors")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let color = !matches.get_flag("no-color");

    match matches.get_one::<String>("file") {
        Some(file_path) if !matches.get_flag("interactive") => {
            let mode = if matches.get_flag("dump-tokens") {
                Mode::DumpTokens
            } else if matches.get_flag("dump-ast") {
                Mode::DumpAst
            } else {
                Mode::Run
            };
            run_file(file_path, mode, color)
        }
        _ => {
            repl::start(color);
            ExitCode::SUCCESS
        }
    }
}

/// Install a stderr subscriber only when RUST_LOG asks for one.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Run,
    DumpTokens,
    DumpAst,
}

fn run_file(path: &str, mode: Mode, color: bool) -> ExitCode {
    let path = Path::new(path);

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            return ExitCode::from(EXIT_NO_INPUT);
        }
    };

    let filename = path.to_string_lossy().into_owned();
    let mut emitter = TerminalEmitter::new(&source, Some(filename.as_str())).with_color(color);

    match mode {
        Mode::DumpTokens => {
            let (tokens, errors) = lexer::lex(&source, &mut emitter);
            for token in &tokens {
                let (line, column) = token.span.line_col(&source);
                println!("{}:{}:{}:{}", line, column, token.kind, token.lexeme);
            }
            exit_for_compile_errors(errors)
        }
        Mode::DumpAst => {
            let (tokens, lex_errors) = lexer::lex(&source, &mut emitter);
            let (program, parse_errors) = parser::parse(&tokens, &mut emitter);
            print!("{}", program);
            exit_for_compile_errors(lex_errors + parse_errors)
        }
        Mode::Run => {
            let summary = runner::run(&source, Some(filename.as_str()), color);
            if summary.has_compile_errors() {
                ExitCode::from(EXIT_DATA_ERROR)
            } else if summary.runtime_errors > 0 {
                ExitCode::from(EXIT_SOFTWARE)
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}

fn exit_for_compile_errors(errors: usize) -> ExitCode {
    if errors > 0 {
        ExitCode::from(EXIT_DATA_ERROR)
    } else {
        ExitCode::SUCCESS
    }
}
