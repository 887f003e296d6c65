use crate::error::Span;
use crate::lexer::Token;

/// Syntax tree over a borrowed token sequence. Operator, name and literal
/// slots point back into the lexer's tokens, so a tree can never outlive them.

#[derive(Debug, Clone, PartialEq)]
pub struct Program<'a> {
    pub statements: Vec<Stmt<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    Expression {
        expr: Expr<'a>,
        span: Span,
    },
    Print {
        expr: Expr<'a>,
        span: Span,
    },
    Var {
        name: &'a Token<'a>,
        initializer: Option<Expr<'a>>,
        span: Span,
    },
    Block {
        statements: Vec<Stmt<'a>>,
        span: Span,
    },
}

impl Stmt<'_> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expression { span, .. } => *span,
            Stmt::Print { span, .. } => *span,
            Stmt::Var { span, .. } => *span,
            Stmt::Block { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    Binary {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
        span: Span,
    },
    Unary {
        operator: &'a Token<'a>,
        operand: Box<Expr<'a>>,
        span: Span,
    },
    Grouping {
        expr: Box<Expr<'a>>,
        span: Span,
    },
    Literal {
        token: &'a Token<'a>,
        span: Span,
    },
    Variable {
        name: &'a Token<'a>,
        span: Span,
    },
    Assign {
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
        span: Span,
    },
}

impl Expr<'_> {
    pub fn span(&self) -> Span {
        match self {
            Expr::Binary { span, .. } => *span,
            Expr::Unary { span, .. } => *span,
            Expr::Grouping { span, .. } => *span,
            Expr::Literal { span, .. } => *span,
            Expr::Variable { span, .. } => *span,
            Expr::Assign { span, .. } => *span,
        }
    }
}
