//! Canonical source form of the tree. Binary expressions are fully
//! parenthesized, so re-parsing the output yields a tree that evaluates the
//! same way.

use crate::ast::{Expr, Program, Stmt};
use crate::lexer::TokenKind;
use std::fmt;

impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator.lexeme, right),
            Expr::Unary {
                operator, operand, ..
            } => write!(f, "{}{}", operator.lexeme, operand),
            Expr::Grouping { expr, .. } => write!(f, "({})", expr),
            Expr::Literal { token, .. } => match token.kind {
                TokenKind::String => write!(f, "\"{}\"", token.lexeme),
                _ => f.write_str(token.lexeme),
            },
            Expr::Variable { name, .. } => f.write_str(name.lexeme),
            Expr::Assign { name, value, .. } => write!(f, "{} = {}", name.lexeme, value),
        }
    }
}

impl fmt::Display for Stmt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expression { expr, .. } => write!(f, "{};", expr),
            Stmt::Print { expr, .. } => write!(f, "print {};", expr),
            Stmt::Var {
                name,
                initializer: Some(initializer),
                ..
            } => write!(f, "var {} = {};", name.lexeme, initializer),
            Stmt::Var { name, .. } => write!(f, "var {};", name.lexeme),
            Stmt::Block { statements, .. } => {
                write!(f, "{{")?;
                for statement in statements {
                    write!(f, " {}", statement)?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl fmt::Display for Program<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}
