use crate::error::{Diagnostic, DiagnosticSink, Reporter, Span};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Identifier,
    String,
    Number,

    // Keywords
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    // Special
    Eof,
    Error,
}

impl TokenKind {
    /// Short name used in diagnostics and token dumps.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::LeftParen => "lparen",
            TokenKind::RightParen => "rparen",
            TokenKind::LeftBrace => "lbrace",
            TokenKind::RightBrace => "rbrace",
            TokenKind::Comma => "comma",
            TokenKind::Dot => "dot",
            TokenKind::Minus => "minus",
            TokenKind::Plus => "plus",
            TokenKind::Semicolon => "semicolon",
            TokenKind::Slash => "slash",
            TokenKind::Star => "star",
            TokenKind::Bang => "bang",
            TokenKind::BangEqual => "bang_equal",
            TokenKind::Equal => "equal",
            TokenKind::EqualEqual => "equal_equal",
            TokenKind::Greater => "gt",
            TokenKind::GreaterEqual => "ge",
            TokenKind::Less => "lt",
            TokenKind::LessEqual => "le",
            TokenKind::Identifier => "identifier",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::And => "and",
            TokenKind::Class => "class",
            TokenKind::Else => "else",
            TokenKind::False => "false",
            TokenKind::Fun => "fun",
            TokenKind::For => "for",
            TokenKind::If => "if",
            TokenKind::Nil => "nil",
            TokenKind::Or => "or",
            TokenKind::Print => "print",
            TokenKind::Return => "return",
            TokenKind::Super => "super",
            TokenKind::This => "this",
            TokenKind::True => "true",
            TokenKind::Var => "var",
            TokenKind::While => "while",
            TokenKind::Eof => "eof",
            TokenKind::Error => "error",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified slice of the source. String tokens carry their contents
/// without the surrounding quotes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub span: Span,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, lexeme: &'src str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

/// Lex `source` in one go, returning the tokens and the number of lexical errors.
pub fn lex<'src>(source: &'src str, sink: &mut dyn DiagnosticSink) -> (Vec<Token<'src>>, usize) {
    Lexer::new(source).scan_tokens(sink)
}

pub struct Lexer<'src> {
    source: &'src str,
    tokens: Vec<Token<'src>>,
    start: usize,
    current: usize,
    keywords: HashMap<&'static str, TokenKind>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("and", TokenKind::And);
        keywords.insert("class", TokenKind::Class);
        keywords.insert("else", TokenKind::Else);
        keywords.insert("false", TokenKind::False);
        keywords.insert("for", TokenKind::For);
        keywords.insert("fun", TokenKind::Fun);
        keywords.insert("if", TokenKind::If);
        keywords.insert("nil", TokenKind::Nil);
        keywords.insert("or", TokenKind::Or);
        keywords.insert("print", TokenKind::Print);
        keywords.insert("return", TokenKind::Return);
        keywords.insert("super", TokenKind::Super);
        keywords.insert("this", TokenKind::This);
        keywords.insert("true", TokenKind::True);
        keywords.insert("var", TokenKind::Var);
        keywords.insert("while", TokenKind::While);

        Self {
            source,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            keywords,
        }
    }

    /// Scan the whole buffer. The returned sequence always ends with exactly
    /// one `Eof` token, even when errors were reported.
    pub fn scan_tokens(mut self, sink: &mut dyn DiagnosticSink) -> (Vec<Token<'src>>, usize) {
        let mut reporter = Reporter::new(sink);

        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(&mut reporter);
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            "",
            Span::new(self.current, self.current),
        ));

        tracing::debug!(
            tokens = self.tokens.len(),
            errors = reporter.error_count(),
            "lexing complete"
        );
        (self.tokens, reporter.error_count())
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self, reporter: &mut Reporter<'_>) {
        let Some(c) = self.advance() else {
            return;
        };

        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            ';' => self.add_token(TokenKind::Semicolon),
            '*' => self.add_token(TokenKind::Star),
            '!' => {
                let kind = if self.match_char('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.match_char('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_char('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_char('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '/' => {
                if self.match_char('/') {
                    // Comment goes until end of line
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            c if is_whitespace(c) => {}
            '"' => self.string(reporter),
            c if c.is_ascii_digit() => self.number(reporter),
            c if is_identifier_start(c) => self.identifier(),
            _ => {
                self.skip_to_whitespace();
                let run = &self.source[self.start..self.current];
                self.error_token(reporter, format!("Unrecognized token '{}'", run));
            }
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.current += c.len_utf8();
        Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.current += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn skip_to_whitespace(&mut self) {
        while self.peek().is_some_and(|c| !is_whitespace(c)) {
            self.advance();
        }
    }

    fn string(&mut self, reporter: &mut Reporter<'_>) {
        loop {
            match self.peek() {
                None => {
                    self.error_token(reporter, "Unterminated string".to_string());
                    return;
                }
                Some('"') => break,
                Some('\\') => {
                    // The escaped character never closes the literal
                    self.advance();
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        // Consume the closing "
        self.advance();

        let content = &self.source[self.start + 1..self.current - 1];
        self.add_token_with_lexeme(TokenKind::String, content);
    }

    fn number(&mut self, reporter: &mut Reporter<'_>) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // A trailing '.' belongs to the number: `10.` is ten
        if self.match_char('.') {
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if self.peek().is_some_and(is_identifier_start) {
            self.skip_to_whitespace();
            let run = &self.source[self.start..self.current];
            self.error_token(reporter, format!("Malformed number '{}'", run));
            return;
        }

        self.add_token(TokenKind::Number);
    }

    fn identifier(&mut self) {
        while self.peek().is_some_and(is_identifier_continue) {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        let kind = self
            .keywords
            .get(text)
            .copied()
            .unwrap_or(TokenKind::Identifier);

        self.add_token(kind);
    }

    fn error_token(&mut self, reporter: &mut Reporter<'_>, message: String) {
        reporter.emit(Diagnostic::lex_error(
            Span::new(self.start, self.current),
            message,
        ));
        self.add_token(TokenKind::Error);
    }

    fn add_token(&mut self, kind: TokenKind) {
        let text = &self.source[self.start..self.current];
        self.add_token_with_lexeme(kind, text);
    }

    fn add_token_with_lexeme(&mut self, kind: TokenKind, lexeme: &'src str) {
        self.tokens.push(Token::new(
            kind,
            lexeme,
            Span::new(self.start, self.current),
        ));
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\r' | '\t' | '\n' | '\x0c')
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
