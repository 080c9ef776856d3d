//! Expression strategy: safe arithmetic for calculator-style tool names.

use async_trait::async_trait;
use dispatch_domain::expression::{CalculationError, ExpressionEvaluator};
use dispatch_domain::tool::{FailureKind, Outcome, ResolverOutcome, ToolCall};
use dispatch_domain::tool::capability::is_expression_name;

use crate::ports::strategy::{ResolverStrategy, StrategyFault};

const EXPRESSION_KEYS: &[&str] = &["expression", "expr", "input", "query"];

#[derive(Debug, Default)]
pub struct ExpressionStrategy {
    evaluator: ExpressionEvaluator,
}

impl ExpressionStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&self, call: &ToolCall) -> Outcome {
        let result = match call.first_string(EXPRESSION_KEYS) {
            Some(expression) => self.evaluator.evaluate(expression),
            None => Err(CalculationError::Empty),
        };
        match result {
            Ok(number) => Outcome::completed(number.to_string()),
            Err(e) => Outcome::failed(FailureKind::CalculationError, e.report()),
        }
    }
}

#[async_trait]
impl ResolverStrategy for ExpressionStrategy {
    fn name(&self) -> &'static str {
        "expression"
    }

    fn applies(&self, call: &ToolCall) -> bool {
        is_expression_name(&call.name)
    }

    async fn resolve(&self, call: &ToolCall) -> Result<ResolverOutcome, StrategyFault> {
        Ok(self.evaluate(call).into())
    }
}
