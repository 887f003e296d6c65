use crate::ast::{Expr, Program, Stmt};
use crate::environment::{Environment, Undefined};
use crate::error::{Diagnostic, DiagnosticSink, Reporter, Span};
use crate::lexer::{Token, TokenKind};
use crate::value::{SharedValue, Value};
use std::io::Write;
use std::rc::Rc;

/// Tree-walking evaluator. Owns the global environment and the sink `print`
/// writes to, so state persists across calls (the REPL relies on this).
pub struct Evaluator<W: Write> {
    environment: Environment,
    out: W,
    errors: usize,
}

impl<W: Write> Evaluator<W> {
    pub fn new(out: W) -> Self {
        Self {
            environment: Environment::new(),
            out,
            errors: 0,
        }
    }

    /// Runtime errors seen over the evaluator's whole lifetime.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Execute every statement in order. A failing statement is reported and
    /// skipped; the rest of the program still runs. Returns the number of
    /// runtime errors raised by this program.
    pub fn execute_program(&mut self, program: &Program<'_>, sink: &mut dyn DiagnosticSink) -> usize {
        let mut reporter = Reporter::new(sink);

        for statement in &program.statements {
            let mut pending = Vec::new();
            let result = self.walker(&mut pending).execute(statement);

            for diagnostic in pending {
                reporter.emit(diagnostic);
            }
            if let Err(error) = result {
                reporter.emit(error);
            }
        }

        self.errors += reporter.error_count();
        tracing::debug!(
            statements = program.statements.len(),
            errors = reporter.error_count(),
            "evaluation complete"
        );
        reporter.error_count()
    }

    /// Evaluate a standalone expression. A failure is counted and handed back
    /// to the caller for rendering.
    pub fn evaluate_expression(&mut self, expr: &Expr<'_>) -> Result<SharedValue, Diagnostic> {
        let mut pending = Vec::new();
        let result = self.walker(&mut pending).evaluate(expr);
        if result.is_err() {
            self.errors += 1;
        }
        result
    }

    fn walker<'w>(&'w mut self, pending: &'w mut Vec<Diagnostic>) -> Walker<'w, W> {
        Walker {
            env: &mut self.environment,
            out: &mut self.out,
            pending,
        }
    }
}

/// Borrowed view used while walking one statement. Blocks build a nested
/// walker over a scope guard, so the scope is popped on every exit path.
/// Notes and errors from statements nested in blocks queue up in `pending`
/// until the top-level statement finishes.
struct Walker<'w, W: Write> {
    env: &'w mut Environment,
    out: &'w mut W,
    pending: &'w mut Vec<Diagnostic>,
}

impl<W: Write> Walker<'_, W> {
    fn execute(&mut self, stmt: &Stmt<'_>) -> Result<(), Diagnostic> {
        tracing::trace!(span = ?stmt.span(), "executing statement");

        match stmt {
            Stmt::Expression { expr, .. } => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Print { expr, span } => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value).map_err(|error| {
                    Diagnostic::runtime_error(*span, format!("Failed to write output: {}", error))
                })
            }
            Stmt::Var {
                name, initializer, ..
            } => {
                let value = match initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Rc::new(Value::Nil),
                };

                if self.env.declare(name.lexeme, value) {
                    self.pending.push(
                        Diagnostic::runtime_error(
                            name.span,
                            format!("Variable '{}' redeclared in the same scope", name.lexeme),
                        )
                        .with_help("The previous binding is replaced.")
                        .as_note(),
                    );
                }
                Ok(())
            }
            Stmt::Block { statements, .. } => {
                let mut scope = self.env.scope();
                let mut inner = Walker {
                    env: &mut scope,
                    out: &mut *self.out,
                    pending: &mut *self.pending,
                };

                // A failing statement is skipped; the rest of the block runs
                for statement in statements {
                    if let Err(error) = inner.execute(statement) {
                        inner.pending.push(error);
                    }
                }
                Ok(())
            }
        }
    }

    fn evaluate(&mut self, expr: &Expr<'_>) -> Result<SharedValue, Diagnostic> {
        match expr {
            Expr::Literal { token, .. } => literal_value(token),
            Expr::Grouping { expr, .. } => self.evaluate(expr),
            Expr::Unary {
                operator, operand, ..
            } => {
                let operand = self.evaluate(operand)?;
                unary_op(operator, &operand)
            }
            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary_op(operator, &left, &right)
            }
            Expr::Variable { name, .. } => self
                .env
                .lookup(name.lexeme)
                .ok_or_else(|| undefined_variable(name)),
            Expr::Assign { name, value, .. } => {
                let value = self.evaluate(value)?;
                self.env
                    .assign(name.lexeme, Rc::clone(&value))
                    .map_err(|Undefined| undefined_variable(name))?;
                Ok(value)
            }
        }
    }
}

fn literal_value(token: &Token<'_>) -> Result<SharedValue, Diagnostic> {
    let value = match token.kind {
        TokenKind::Number => {
            let number = token.lexeme.parse::<f64>().map_err(|_| {
                Diagnostic::runtime_error(
                    token.span,
                    format!("Invalid number literal '{}'", token.lexeme),
                )
            })?;
            Value::Number(number)
        }
        TokenKind::String => Value::String(unescape(token.lexeme)),
        TokenKind::True => Value::Bool(true),
        TokenKind::False => Value::Bool(false),
        TokenKind::Nil => Value::Nil,
        kind => unreachable!("parser produced a literal from a {} token", kind),
    };
    Ok(Rc::new(value))
}

fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

fn unary_op(operator: &Token<'_>, operand: &Value) -> Result<SharedValue, Diagnostic> {
    let value = match operator.kind {
        TokenKind::Minus => match operand {
            Value::Number(n) => Value::Number(-n),
            _ => {
                return Err(Diagnostic::runtime_error(
                    operator.span,
                    "Operand must be a number".to_string(),
                )
                .with_help(format!("'-' cannot negate a {}.", operand.type_name())))
            }
        },
        TokenKind::Bang => Value::Bool(!operand.is_truthy()),
        kind => unreachable!("parser produced a unary {} expression", kind),
    };
    Ok(Rc::new(value))
}

fn binary_op(operator: &Token<'_>, left: &Value, right: &Value) -> Result<SharedValue, Diagnostic> {
    let value = match operator.kind {
        TokenKind::Plus => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Value::Number(l + r),
            (Value::String(l), Value::String(r)) => Value::String(format!("{}{}", l, r)),
            _ => {
                return Err(operand_error(
                    operator.span,
                    "Operands must be a number or string",
                    left,
                    right,
                ))
            }
        },
        TokenKind::EqualEqual => Value::Bool(left.is_equal(right)),
        TokenKind::BangEqual => Value::Bool(!left.is_equal(right)),
        kind => {
            let (Value::Number(l), Value::Number(r)) = (left, right) else {
                return Err(operand_error(
                    operator.span,
                    "Operands must be a number",
                    left,
                    right,
                ));
            };
            match kind {
                TokenKind::Minus => Value::Number(l - r),
                TokenKind::Star => Value::Number(l * r),
                TokenKind::Slash => Value::Number(l / r),
                TokenKind::Greater => Value::Bool(l > r),
                TokenKind::GreaterEqual => Value::Bool(l >= r),
                TokenKind::Less => Value::Bool(l < r),
                TokenKind::LessEqual => Value::Bool(l <= r),
                kind => unreachable!("parser produced a binary {} expression", kind),
            }
        }
    };
    Ok(Rc::new(value))
}

fn operand_error(span: Span, message: &str, left: &Value, right: &Value) -> Diagnostic {
    Diagnostic::runtime_error(span, message.to_string()).with_help(format!(
        "Got {} and {}.",
        left.type_name(),
        right.type_name()
    ))
}

fn undefined_variable(name: &Token<'_>) -> Diagnostic {
    Diagnostic::runtime_error(name.span, format!("Undefined variable: {}", name.lexeme))
        .with_help("Declare it first with 'var'.")
}
