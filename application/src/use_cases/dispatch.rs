//! Dispatch use case
//!
//! [`Dispatcher`] turns an opaque tool call into a [`ResultEnvelope`] by
//! offering it to a fixed chain of strategies. The first strategy that
//! claims the call produces the result; a strategy that faults or panics
//! is logged and skipped.
//!
//! ```text
//! WireToolCall ──decode──▶ ToolCall
//!                              │
//!   file_operations ─▶ code_execution ─▶ expression ─▶ system
//!        ─▶ raw_command ─▶ network ─▶ generic_fallback
//!                              │
//!                  Handled(outcome) │ none claimed
//!                              ▼
//!            {success, result}  │  {error, suggestion}
//! ```

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dispatch_domain::suggestion::SuggestionEngine;
use dispatch_domain::tool::{
    DispatchError, ResolverOutcome, ResultEnvelope, ToolCall, WireToolCall,
    capabilities_summary,
};
use futures::FutureExt;
use serde_json::json;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::ports::dispatch_logger::{DispatchEvent, DispatchLogger, NoDispatchLogger};
use crate::ports::strategy::ResolverStrategy;

type Slot = Option<Box<dyn ResolverStrategy>>;

/// The strategy chain, one named slot per position.
///
/// The evaluation order lives in [`ordered`](Self::ordered) and cannot be
/// changed by callers. Empty slots are skipped.
#[derive(Default)]
pub struct StrategyChain {
    pub file_operations: Slot,
    pub code_execution: Slot,
    pub expression: Slot,
    pub system: Slot,
    pub raw_command: Slot,
    pub network: Slot,
    pub generic_fallback: Slot,
}

impl StrategyChain {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Builder Methods ====================

    pub fn with_file_operations(mut self, strategy: impl ResolverStrategy + 'static) -> Self {
        self.file_operations = Some(Box::new(strategy));
        self
    }

    pub fn with_code_execution(mut self, strategy: impl ResolverStrategy + 'static) -> Self {
        self.code_execution = Some(Box::new(strategy));
        self
    }

    pub fn with_expression(mut self, strategy: impl ResolverStrategy + 'static) -> Self {
        self.expression = Some(Box::new(strategy));
        self
    }

    pub fn with_system(mut self, strategy: impl ResolverStrategy + 'static) -> Self {
        self.system = Some(Box::new(strategy));
        self
    }

    pub fn with_raw_command(mut self, strategy: impl ResolverStrategy + 'static) -> Self {
        self.raw_command = Some(Box::new(strategy));
        self
    }

    pub fn with_network(mut self, strategy: impl ResolverStrategy + 'static) -> Self {
        self.network = Some(Box::new(strategy));
        self
    }

    pub fn with_generic_fallback(mut self, strategy: impl ResolverStrategy + 'static) -> Self {
        self.generic_fallback = Some(Box::new(strategy));
        self
    }

    /// Present strategies in priority order.
    pub fn ordered(&self) -> Vec<&dyn ResolverStrategy> {
        [
            &self.file_operations,
            &self.code_execution,
            &self.expression,
            &self.system,
            &self.raw_command,
            &self.network,
            &self.generic_fallback,
        ]
        .into_iter()
        .filter_map(|slot| slot.as_deref())
        .collect()
    }

    pub fn len(&self) -> usize {
        self.ordered().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves tool calls against a fixed strategy chain.
pub struct Dispatcher {
    workspace_root: PathBuf,
    chain: StrategyChain,
    logger: Arc<dyn DispatchLogger>,
}

impl Dispatcher {
    pub fn new(workspace_root: impl Into<PathBuf>, chain: StrategyChain) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            chain,
            logger: Arc::new(NoDispatchLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn DispatchLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn chain(&self) -> &StrategyChain {
        &self.chain
    }

    /// Resolve raw wire text (`{"function": {...}}`).
    pub async fn resolve_json(&self, raw: &str) -> ResultEnvelope {
        match serde_json::from_str::<WireToolCall>(raw) {
            Ok(call) => self.resolve(call).await,
            Err(e) => {
                warn!("Malformed tool call: {}", e);
                ResultEnvelope::error(format!("Invalid tool call JSON: {}", e))
            }
        }
    }

    /// Resolve a wire-format call. Arguments are normalized first; a decode
    /// failure is returned without running any strategy.
    pub async fn resolve(&self, call: WireToolCall) -> ResultEnvelope {
        let name = call.name().to_string();
        match call.decode() {
            Ok(call) => self.resolve_call(call).await,
            Err(e) => {
                warn!(tool = %name, "Argument decoding failed: {}", e);
                let envelope = ResultEnvelope::from(e);
                self.log_result(&name, None, &envelope);
                envelope
            }
        }
    }

    /// Resolve an already-decoded call.
    pub async fn resolve_call(&self, call: ToolCall) -> ResultEnvelope {
        let span = info_span!("dispatch", tool = %call.name);
        self.run_chain(call).instrument(span).await
    }

    async fn run_chain(&self, call: ToolCall) -> ResultEnvelope {
        self.logger.log(DispatchEvent::new(
            "tool_call",
            json!({
                "tool": call.name,
                "arguments": call.arguments,
            }),
        ));

        for strategy in self.chain.ordered() {
            if !strategy.applies(&call) {
                continue;
            }
            debug!(strategy = strategy.name(), "Strategy claims call");

            let attempt = AssertUnwindSafe(strategy.resolve(&call)).catch_unwind().await;
            match attempt {
                Ok(Ok(ResolverOutcome::Handled(outcome))) => {
                    match outcome.failure_kind() {
                        Some(kind) => info!(
                            strategy = strategy.name(),
                            kind = kind.as_str(),
                            "Call handled with failure"
                        ),
                        None => info!(strategy = strategy.name(), "Call handled"),
                    }
                    let envelope = ResultEnvelope::success(outcome.into_text());
                    self.log_result(&call.name, Some(strategy.name()), &envelope);
                    return envelope;
                }
                Ok(Ok(ResolverOutcome::NotApplicable)) => {
                    debug!(strategy = strategy.name(), "Strategy declined");
                }
                Ok(Err(fault)) => {
                    warn!(strategy = strategy.name(), "Strategy fault, falling through: {}", fault);
                }
                Err(panic) => {
                    warn!(
                        strategy = strategy.name(),
                        "Strategy panicked, falling through: {}",
                        panic_message(panic.as_ref())
                    );
                }
            }
        }

        let error = DispatchError::UnknownTool {
            name: call.name.clone(),
            capabilities: capabilities_summary(),
        };
        let suggestion = SuggestionEngine::suggest(&call.name, &call.arguments);
        info!("No strategy claimed the call");
        let envelope = ResultEnvelope::error_with_suggestion(error.to_string(), suggestion);
        self.log_result(&call.name, None, &envelope);
        envelope
    }

    fn log_result(&self, tool: &str, strategy: Option<&str>, envelope: &ResultEnvelope) {
        self.logger.log(DispatchEvent::new(
            "tool_result",
            json!({
                "tool": tool,
                "strategy": strategy,
                "envelope": envelope.to_json(),
            }),
        ));
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::strategy::StrategyFault;
    use async_trait::async_trait;
    use dispatch_domain::tool::Outcome;
    use std::sync::Mutex;

    /// Test strategy with a fixed claim rule and response.
    struct Fixed {
        name: &'static str,
        claims: &'static str,
        behavior: Behavior,
    }

    #[derive(Clone, Copy)]
    enum Behavior {
        Answer(&'static str),
        Decline,
        Fault,
        Panic,
    }

    #[async_trait]
    impl ResolverStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn applies(&self, call: &ToolCall) -> bool {
            call.name == self.claims
        }

        async fn resolve(&self, _call: &ToolCall) -> Result<ResolverOutcome, StrategyFault> {
            match self.behavior {
                Behavior::Answer(text) => Ok(Outcome::completed(text).into()),
                Behavior::Decline => Ok(ResolverOutcome::NotApplicable),
                Behavior::Fault => Err(StrategyFault::apply(self.name, "boom")),
                Behavior::Panic => panic!("strategy exploded"),
            }
        }
    }

    fn fixed(name: &'static str, claims: &'static str, behavior: Behavior) -> Fixed {
        Fixed {
            name,
            claims,
            behavior,
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<&'static str>>,
    }

    impl DispatchLogger for RecordingLogger {
        fn log(&self, event: DispatchEvent) {
            self.events.lock().unwrap().push(event.event_type);
        }
    }

    #[tokio::test]
    async fn test_first_claiming_strategy_wins() {
        let chain = StrategyChain::new()
            .with_file_operations(fixed("files", "x", Behavior::Answer("from files")))
            .with_generic_fallback(fixed("generic", "x", Behavior::Answer("from generic")));
        let dispatcher = Dispatcher::new("/tmp", chain);

        let envelope = dispatcher.resolve(WireToolCall::new("x", json!({}))).await;
        assert_eq!(envelope, ResultEnvelope::success("from files"));
    }

    #[tokio::test]
    async fn test_order_is_fixed_regardless_of_construction_order() {
        let chain = StrategyChain::new()
            .with_network(fixed("network", "x", Behavior::Answer("network")))
            .with_expression(fixed("expression", "x", Behavior::Answer("expression")));
        let dispatcher = Dispatcher::new("/tmp", chain);

        let envelope = dispatcher.resolve_call(ToolCall::new("x")).await;
        assert_eq!(envelope.result(), Some("expression"));
    }

    #[tokio::test]
    async fn test_fault_and_panic_fall_through() {
        let chain = StrategyChain::new()
            .with_file_operations(fixed("files", "x", Behavior::Fault))
            .with_code_execution(fixed("code", "x", Behavior::Panic))
            .with_expression(fixed("expression", "x", Behavior::Decline))
            .with_system(fixed("system", "x", Behavior::Answer("survived")));
        let dispatcher = Dispatcher::new("/tmp", chain);

        let envelope = dispatcher.resolve_call(ToolCall::new("x")).await;
        assert_eq!(envelope.result(), Some("survived"));
    }

    #[tokio::test]
    async fn test_unclaimed_call_gets_error_and_suggestion() {
        let dispatcher = Dispatcher::new("/tmp", StrategyChain::new());
        let envelope = dispatcher
            .resolve(WireToolCall::new("totally_unknown_xyz", json!({})))
            .await;

        let error = envelope.error_message().unwrap();
        assert!(error.starts_with("Unknown tool 'totally_unknown_xyz'"));
        assert!(error.contains("Available capabilities"));
        assert!(!envelope.suggestion().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_argument_string_short_circuits() {
        let chain = StrategyChain::new()
            .with_file_operations(fixed("files", "x", Behavior::Answer("should not run")));
        let dispatcher = Dispatcher::new("/tmp", chain);

        let envelope = dispatcher.resolve(WireToolCall::new("x", json!("{not json"))).await;
        assert_eq!(envelope, ResultEnvelope::error("Invalid arguments JSON: {not json"));
    }

    #[tokio::test]
    async fn test_string_and_mapping_arguments_match() {
        let dispatcher = || {
            Dispatcher::new(
                "/tmp",
                StrategyChain::new().with_expression(fixed("e", "calc", Behavior::Answer("8"))),
            )
        };
        let from_string = dispatcher()
            .resolve(WireToolCall::new("calc", json!("{\"expression\": \"2+2*3\"}")))
            .await;
        let from_map = dispatcher()
            .resolve(WireToolCall::new("calc", json!({"expression": "2+2*3"})))
            .await;
        assert_eq!(from_string, from_map);
    }

    #[tokio::test]
    async fn test_resolve_json() {
        let dispatcher = Dispatcher::new(
            "/tmp",
            StrategyChain::new().with_expression(fixed("e", "calc", Behavior::Answer("8"))),
        );
        let envelope = dispatcher
            .resolve_json(r#"{"function": {"name": "calc", "arguments": {}}}"#)
            .await;
        assert_eq!(envelope.to_json(), json!({"success": true, "result": "8"}));

        let bad = dispatcher.resolve_json("not json").await;
        assert!(bad.error_message().unwrap().starts_with("Invalid tool call JSON"));
    }

    #[tokio::test]
    async fn test_logger_records_call_and_result() {
        let logger = Arc::new(RecordingLogger::default());
        let dispatcher = Dispatcher::new(
            "/tmp",
            StrategyChain::new().with_expression(fixed("e", "calc", Behavior::Answer("8"))),
        )
        .with_logger(logger.clone());

        dispatcher.resolve_call(ToolCall::new("calc")).await;
        assert_eq!(*logger.events.lock().unwrap(), vec!["tool_call", "tool_result"]);
    }

    #[test]
    fn test_chain_ordering_and_len() {
        let chain = StrategyChain::new()
            .with_generic_fallback(fixed("generic", "x", Behavior::Decline))
            .with_file_operations(fixed("files", "x", Behavior::Decline));
        let names: Vec<_> = chain.ordered().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["files", "generic"]);
        assert_eq!(chain.len(), 2);
        assert!(StrategyChain::new().is_empty());
    }
}
