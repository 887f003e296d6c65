use crate::error::{DiagnosticSink, TerminalEmitter};
use crate::evaluator::Evaluator;
use crate::lexer;
use crate::parser;
use std::io::{self, Write};

/// Error counts of one pass through the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub lex_errors: usize,
    pub parse_errors: usize,
    pub runtime_errors: usize,
}

impl RunSummary {
    pub fn succeeded(&self) -> bool {
        self.lex_errors == 0 && self.parse_errors == 0 && self.runtime_errors == 0
    }

    pub fn has_compile_errors(&self) -> bool {
        self.lex_errors > 0 || self.parse_errors > 0
    }
}

/// Lex, parse and evaluate `source`. Every stage runs to completion so one
/// pass surfaces as many diagnostics as possible: statements that parsed are
/// executed even when other statements did not.
pub fn run_source<W: Write>(source: &str, out: W, sink: &mut dyn DiagnosticSink) -> RunSummary {
    let (tokens, lex_errors) = lexer::lex(source, sink);
    let (program, parse_errors) = parser::parse(&tokens, sink);

    let mut evaluator = Evaluator::new(out);
    let runtime_errors = evaluator.execute_program(&program, sink);

    let summary = RunSummary {
        lex_errors,
        parse_errors,
        runtime_errors,
    };
    tracing::debug!(?summary, "run finished");
    summary
}

/// Run a script against stdout, rendering diagnostics to stderr.
pub fn run(source: &str, filename: Option<&str>, color: bool) -> RunSummary {
    let mut emitter = TerminalEmitter::new(source, filename).with_color(color);
    let stdout = io::stdout();
    run_source(source, stdout.lock(), &mut emitter)
}
