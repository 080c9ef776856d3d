//! AST walker for parsed expressions.

use super::number::Number;
use super::parser::{BinaryOp, Expr, parse};
use super::CalculationError;

/// Evaluates restricted arithmetic expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, expression: &str) -> Result<Number, CalculationError> {
        let expr = parse(expression)?;
        self.eval(&expr)
    }

    pub fn eval(&self, expr: &Expr) -> Result<Number, CalculationError> {
        match expr {
            Expr::Number(n) => Ok(*n),
            Expr::Neg(inner) => Ok(self.eval(inner)?.neg()),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                match op {
                    BinaryOp::Add => Ok(lhs.add(rhs)),
                    BinaryOp::Sub => Ok(lhs.sub(rhs)),
                    BinaryOp::Mul => Ok(lhs.mul(rhs)),
                    BinaryOp::Div => lhs.div(rhs),
                    BinaryOp::Pow => lhs.pow(rhs),
                }
            }
        }
    }
}
