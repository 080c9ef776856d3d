//! Resolver strategy port
//!
//! A strategy looks at a [`ToolCall`] and either claims it
//! ([`ResolverOutcome::Handled`]) or declines
//! ([`ResolverOutcome::NotApplicable`]). A strategy that fails to *apply*
//! (as opposed to failing to *execute*) returns [`StrategyFault`]; the
//! dispatcher logs it and moves on to the next strategy.

use async_trait::async_trait;
use dispatch_domain::tool::{ResolverOutcome, ToolCall};
use thiserror::Error;

/// Failure to apply a strategy. Triggers fall-through, never reaches the caller.
#[derive(Debug, Error)]
pub enum StrategyFault {
    #[error("{strategy}: {message}")]
    Apply {
        strategy: &'static str,
        message: String,
    },
}

impl StrategyFault {
    pub fn apply(strategy: &'static str, message: impl Into<String>) -> Self {
        StrategyFault::Apply {
            strategy,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ResolverStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Cheap, side-effect free check whether this strategy claims the call.
    fn applies(&self, call: &ToolCall) -> bool;

    /// Resolve a call for which [`applies`](Self::applies) returned true.
    async fn resolve(&self, call: &ToolCall) -> Result<ResolverOutcome, StrategyFault>;
}
