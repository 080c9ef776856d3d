//! Restricted arithmetic expression evaluation.
//!
//! Expressions are parsed into a small AST that can only hold numeric
//! literals, the binary operators `+ - * / **`, unary negation and
//! parentheses. Names, calls, strings, comparisons and subscripts are
//! rejected while parsing, so nothing a model submits is ever executed.
//!
//! ```text
//! "2 + 2 * 3" ──tokenize──▶ [2, +, 2, *, 3] ──parse──▶ Add(2, Mul(2, 3)) ──eval──▶ Int(8)
//! ```

mod evaluator;
mod number;
mod parser;

pub use evaluator::ExpressionEvaluator;
pub use number::Number;
pub use parser::{BinaryOp, Expr, parse};

use thiserror::Error;

/// Why an expression could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculationError {
    #[error("no expression provided")]
    Empty,

    #[error("invalid syntax: {0}")]
    Syntax(String),

    #[error("unsupported expression element: {0}")]
    Unsupported(String),

    #[error("expression nested too deeply")]
    TooDeep,

    #[error("expression has too many operators")]
    TooLong,

    #[error("division by zero")]
    DivisionByZero,

    #[error("numerical result out of range")]
    Overflow,

    #[error("complex results are not supported")]
    Complex,
}

impl CalculationError {
    /// Text reported back to the caller.
    pub fn report(&self) -> String {
        format!("Calculation error: {}", self)
    }
}

/// Parse and evaluate an expression in one step.
pub fn evaluate(expression: &str) -> Result<Number, CalculationError> {
    ExpressionEvaluator::new().evaluate(expression)
}
