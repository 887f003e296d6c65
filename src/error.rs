use ariadne::{Color, Config, Fmt, IndexType, Label, Report, ReportKind, Source};
use std::fmt;

/// Byte range into the source buffer. The core only deals in offsets; resolving
/// them to lines and columns is left to whoever renders the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// 1-based (line, column) of the span start. Columns count characters,
    /// not bytes.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let offset = self.start.min(source.len());
        let mut line = 1;
        let mut line_start = 0;

        for (i, byte) in source.bytes().enumerate() {
            if i >= offset {
                break;
            }
            if byte == b'\n' {
                line += 1;
                line_start = i + 1;
            }
        }

        let column = source
            .get(line_start..offset)
            .map_or(0, |prefix| prefix.chars().count())
            + 1;
        (line, column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    RuntimeError,
}

/// Errors fail the run and are counted; notes are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Note,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            span,
            message,
            help: None,
        }
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, message)
    }

    pub fn parse_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::ParseError, span, message)
    }

    pub fn runtime_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::RuntimeError, span, message)
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn as_note(mut self) -> Self {
        self.severity = Severity::Note;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render to stderr with source context.
    pub fn report(&self, source: &str, filename: Option<&str>, color: bool) {
        let filename = filename.unwrap_or("<repl>");

        let label_color = match (self.severity, self.kind) {
            (Severity::Note, _) => Color::Cyan,
            (Severity::Error, ErrorKind::LexError) => Color::Red,
            (Severity::Error, ErrorKind::ParseError) => Color::Yellow,
            (Severity::Error, ErrorKind::RuntimeError) => Color::Magenta,
        };

        let kind_str = match self.kind {
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::RuntimeError => "Runtime Error",
        };

        let report_kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Note => ReportKind::Advice,
        };

        // Keep the label inside the buffer; EOF diagnostics point one past the end.
        let start = self.span.start.min(source.len());
        let end = self.span.end.clamp(start, source.len());

        let mut report_builder = Report::build(report_kind, filename, start)
            .with_config(
                Config::default()
                    .with_color(color)
                    .with_index_type(IndexType::Byte),
            )
            .with_message(format!("{}: {}", kind_str.fg(label_color), self.message))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(label_color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        if let Err(error) = report_builder
            .finish()
            .eprint((filename, Source::from(source)))
        {
            tracing::warn!(%error, "failed to render diagnostic");
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// Receives every diagnostic the lexer, parser and evaluator produce.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Keeps diagnostics in memory, in emission order.
#[derive(Debug, Default)]
pub struct CollectedDiagnostics {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }
}

impl DiagnosticSink for CollectedDiagnostics {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Renders diagnostics to stderr as they arrive.
pub struct TerminalEmitter<'src> {
    source: &'src str,
    filename: Option<&'src str>,
    color: bool,
}

impl<'src> TerminalEmitter<'src> {
    pub fn new(source: &'src str, filename: Option<&'src str>) -> Self {
        Self {
            source,
            filename,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

impl DiagnosticSink for TerminalEmitter<'_> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        diagnostic.report(self.source, self.filename, self.color);
    }
}

/// Per-stage front for a sink that counts the errors passing through it.
pub struct Reporter<'s> {
    sink: &'s mut dyn DiagnosticSink,
    errors: usize,
}

impl<'s> Reporter<'s> {
    pub fn new(sink: &'s mut dyn DiagnosticSink) -> Self {
        Self { sink, errors: 0 }
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.errors += 1;
        }
        self.sink.emit(diagnostic);
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }
}
