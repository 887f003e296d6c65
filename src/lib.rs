// Lox Language Interpreter Library
//
// Front-end and evaluation core of a small dynamically-typed scripting
// language: source text is lexed into tokens, parsed into a syntax tree and
// evaluated directly against a lexically scoped environment.

// Public modules
pub mod ast;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod repl;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt};
pub use environment::Environment;
pub use error::{CollectedDiagnostics, Diagnostic, DiagnosticSink, Severity, Span};
pub use evaluator::Evaluator;
pub use lexer::{lex, Lexer, Token, TokenKind};
pub use parser::{parse, parse_expression, Parser};
pub use value::Value;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{run, run_source, RunSummary};
