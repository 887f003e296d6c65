use crate::ast::{Expr, Program, Stmt};
use crate::error::{Diagnostic, DiagnosticSink, Reporter, Span};
use crate::lexer::{Token, TokenKind};

/// Stand-in returned by `peek` when the sequence lacks a trailing `Eof`.
static EOF: Token<'static> = Token {
    kind: TokenKind::Eof,
    lexeme: "",
    span: Span { start: 0, end: 0 },
};

/// Parse a whole program, returning it together with the syntax error count.
pub fn parse<'a>(tokens: &'a [Token<'a>], sink: &mut dyn DiagnosticSink) -> (Program<'a>, usize) {
    let mut parser = Parser::new(tokens, sink);
    let program = parser.parse();
    (program, parser.error_count())
}

/// Parse a single standalone expression. Tokens left over after it are a
/// syntax error.
pub fn parse_expression<'a>(
    tokens: &'a [Token<'a>],
    sink: &mut dyn DiagnosticSink,
) -> (Option<Expr<'a>>, usize) {
    let mut parser = Parser::new(tokens, sink);
    let expr = match parser.expression() {
        Some(expr) if parser.expect_end() => Some(expr),
        _ => None,
    };
    (expr, parser.error_count())
}

/// Recursive-descent parser. Failed productions report a diagnostic and yield
/// `None`; `declaration` recovers from them by synchronizing to the next
/// statement boundary.
pub struct Parser<'a, 's> {
    tokens: &'a [Token<'a>],
    current: usize,
    reporter: Reporter<'s>,
}

impl<'a, 's> Parser<'a, 's> {
    pub fn new(tokens: &'a [Token<'a>], sink: &'s mut dyn DiagnosticSink) -> Self {
        Self {
            tokens,
            current: 0,
            reporter: Reporter::new(sink),
        }
    }

    pub fn error_count(&self) -> usize {
        self.reporter.error_count()
    }

    pub fn parse(&mut self) -> Program<'a> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        tracing::debug!(
            statements = statements.len(),
            errors = self.error_count(),
            "parsing complete"
        );
        Program { statements }
    }

    fn declaration(&mut self) -> Option<Stmt<'a>> {
        let start = self.current;
        let stmt = if self.match_kinds(&[TokenKind::Var]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        if stmt.is_none() {
            self.synchronize(start);
        }
        stmt
    }

    fn var_declaration(&mut self) -> Option<Stmt<'a>> {
        let start = self.previous().span.start;
        let name = self.consume_with_help(
            TokenKind::Identifier,
            "A variable declaration names the variable: var name = value;",
        )?;

        let initializer = if self.match_kinds(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume_with_help(
            TokenKind::Semicolon,
            "Variable declarations end with ';'.",
        )?;

        Some(Stmt::Var {
            name,
            initializer,
            span: Span::new(start, self.previous().span.end),
        })
    }

    fn statement(&mut self) -> Option<Stmt<'a>> {
        if self.match_kinds(&[TokenKind::Print]) {
            self.print_statement()
        } else if self.match_kinds(&[TokenKind::LeftBrace]) {
            self.block()
        } else {
            self.expression_statement()
        }
    }

    fn print_statement(&mut self) -> Option<Stmt<'a>> {
        let start = self.previous().span.start;
        let expr = self.expression()?;
        self.expect_terminator();

        Some(Stmt::Print {
            expr,
            span: Span::new(start, self.previous().span.end),
        })
    }

    fn block(&mut self) -> Option<Stmt<'a>> {
        let start = self.previous().span.start;
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume_with_help(
            TokenKind::RightBrace,
            "Blocks must be closed with '}' after the opening '{'.",
        )?;

        Some(Stmt::Block {
            statements,
            span: Span::new(start, self.previous().span.end),
        })
    }

    fn expression_statement(&mut self) -> Option<Stmt<'a>> {
        let start = self.peek().span.start;
        let expr = self.expression()?;
        self.expect_terminator();

        Some(Stmt::Expression {
            expr,
            span: Span::new(start, self.previous().span.end),
        })
    }

    /// A missing `;` is reported, but the statement before it is kept.
    fn expect_terminator(&mut self) {
        if !self.match_kinds(&[TokenKind::Semicolon]) {
            let found = self.peek();
            let diagnostic = Diagnostic::parse_error(
                Span::single(self.previous().span.end),
                format!("Expected ';' after value, got {}", found.kind),
            )
            .with_help("Statements end with ';'.");
            self.reporter.emit(diagnostic);
        }
    }

    pub fn expression(&mut self) -> Option<Expr<'a>> {
        self.assignment()
    }

    fn assignment(&mut self) -> Option<Expr<'a>> {
        let expr = self.equality()?;

        if self.match_kinds(&[TokenKind::Equal]) {
            let equals = self.previous();
            let value = self.assignment()?;

            if let Expr::Variable { name, span } = expr {
                let span = span.to(value.span());
                return Some(Expr::Assign {
                    name,
                    value: Box::new(value),
                    span,
                });
            }

            let diagnostic = Diagnostic::parse_error(
                equals.span,
                "Invalid assignment target".to_string(),
            )
            .with_help("Only variables can be assigned to, e.g. 'x = 10'.");
            self.reporter.emit(diagnostic);
        }

        Some(expr)
    }

    fn equality(&mut self) -> Option<Expr<'a>> {
        self.left_associative(
            &[TokenKind::BangEqual, TokenKind::EqualEqual],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Option<Expr<'a>> {
        self.left_associative(
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Option<Expr<'a>> {
        self.left_associative(&[TokenKind::Minus, TokenKind::Plus], Self::factor)
    }

    fn factor(&mut self) -> Option<Expr<'a>> {
        self.left_associative(&[TokenKind::Slash, TokenKind::Star], Self::unary)
    }

    /// `operand (op operand)*`, folded to the left.
    fn left_associative(
        &mut self,
        operators: &[TokenKind],
        operand: fn(&mut Self) -> Option<Expr<'a>>,
    ) -> Option<Expr<'a>> {
        let mut expr = operand(self)?;

        while self.match_kinds(operators) {
            let operator = self.previous();
            let right = operand(self)?;
            let span = expr.span().to(right.span());

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span,
            };
        }

        Some(expr)
    }

    fn unary(&mut self) -> Option<Expr<'a>> {
        if self.match_kinds(&[TokenKind::Bang, TokenKind::Minus]) {
            let operator = self.previous();
            let operand = self.unary()?;
            let span = operator.span.to(operand.span());

            return Some(Expr::Unary {
                operator,
                operand: Box::new(operand),
                span,
            });
        }

        self.primary()
    }

    fn primary(&mut self) -> Option<Expr<'a>> {
        if self.match_kinds(&[
            TokenKind::True,
            TokenKind::False,
            TokenKind::Nil,
            TokenKind::Number,
            TokenKind::String,
        ]) {
            let token = self.previous();
            return Some(Expr::Literal {
                token,
                span: token.span,
            });
        }

        if self.match_kinds(&[TokenKind::Identifier]) {
            let name = self.previous();
            return Some(Expr::Variable {
                name,
                span: name.span,
            });
        }

        if self.match_kinds(&[TokenKind::LeftParen]) {
            let start = self.previous().span.start;
            let expr = self.expression()?;
            self.consume_with_help(
                TokenKind::RightParen,
                "Every '(' needs a matching ')'.",
            )?;
            return Some(Expr::Grouping {
                expr: Box::new(expr),
                span: Span::new(start, self.previous().span.end),
            });
        }

        // Error tokens were already reported by the lexer
        let found = self.peek();
        if found.kind != TokenKind::Error {
            self.reporter.emit(Diagnostic::parse_error(
                found.span,
                format!("Expected expression, got {}", found.kind),
            ));
        }
        None
    }

    /// Panic-mode recovery: skip to just past a `;` or to the next token that
    /// starts a declaration, always making progress past `start`.
    fn synchronize(&mut self, start: usize) {
        if self.current == start {
            self.advance();
        }

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return
                | TokenKind::RightBrace => return,
                _ => {}
            }

            self.advance();
        }
    }

    fn match_kinds(&mut self, kinds: &[TokenKind]) -> bool {
        for &kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, kind: TokenKind) -> bool {
        if self.is_at_end() {
            false
        } else {
            self.peek().kind == kind
        }
    }

    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &'a Token<'a> {
        self.tokens.get(self.current).unwrap_or(&EOF)
    }

    fn previous(&self) -> &'a Token<'a> {
        match self.current.checked_sub(1) {
            Some(index) => &self.tokens[index],
            None => self.peek(),
        }
    }

    fn expect_end(&mut self) -> bool {
        if self.is_at_end() {
            return true;
        }

        let found = self.peek();
        let diagnostic = Diagnostic::parse_error(
            found.span,
            format!("Unexpected token. expected {}, got {}", TokenKind::Eof, found.kind),
        )
        .with_help("Only one expression is allowed here.");
        self.reporter.emit(diagnostic);
        false
    }

    fn consume_with_help(&mut self, kind: TokenKind, help: &str) -> Option<&'a Token<'a>> {
        if self.check(kind) {
            return Some(self.advance());
        }

        let found = self.peek();
        let diagnostic = Diagnostic::parse_error(
            found.span,
            format!("Unexpected token. expected {}, got {}", kind, found.kind),
        )
        .with_help(help);
        self.reporter.emit(diagnostic);
        None
    }
}
