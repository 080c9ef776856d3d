//! Generic function fallback
//!
//! Last strategy in the chain: hands the call name verbatim to
//! [`FileCapability::invoke`]. Declines when the collaborator is absent or
//! does not know the name.

use std::sync::Arc;

use async_trait::async_trait;
use dispatch_domain::tool::{Outcome, ResolverOutcome, ToolCall};

use crate::ports::file_capability::FileCapability;
use crate::ports::strategy::{ResolverStrategy, StrategyFault};

pub struct GenericFunctionFallback {
    files: Option<Arc<dyn FileCapability>>,
}

impl GenericFunctionFallback {
    pub fn new(files: Option<Arc<dyn FileCapability>>) -> Self {
        Self { files }
    }
}

#[async_trait]
impl ResolverStrategy for GenericFunctionFallback {
    fn name(&self) -> &'static str {
        "generic_fallback"
    }

    fn applies(&self, _call: &ToolCall) -> bool {
        self.files.is_some()
    }

    async fn resolve(&self, call: &ToolCall) -> Result<ResolverOutcome, StrategyFault> {
        let outcome = self
            .files
            .as_deref()
            .and_then(|files| files.invoke(&call.name, &call.arguments))
            .map(|text| ResolverOutcome::Handled(Outcome::completed(text)))
            .unwrap_or(ResolverOutcome::NotApplicable);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::file_operations::tests::RecordingFiles;

    #[tokio::test]
    async fn test_invokes_known_extension() {
        let fallback = GenericFunctionFallback::new(Some(Arc::new(RecordingFiles::default())));
        let outcome = fallback.resolve(&ToolCall::new("file_exists")).await.unwrap();
        assert_eq!(
            outcome,
            ResolverOutcome::Handled(Outcome::completed("file_exists()"))
        );
    }

    #[tokio::test]
    async fn test_declines_unknown_names() {
        let fallback = GenericFunctionFallback::new(Some(Arc::new(RecordingFiles::default())));
        let outcome = fallback.resolve(&ToolCall::new("launch_rocket")).await.unwrap();
        assert_eq!(outcome, ResolverOutcome::NotApplicable);
    }

    #[test]
    fn test_absent_collaborator_never_applies() {
        let fallback = GenericFunctionFallback::new(None);
        assert!(!fallback.applies(&ToolCall::new("file_exists")));
    }
}
