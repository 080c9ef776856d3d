//! Domain layer for tool-dispatch
//!
//! Pure types and logic with no I/O: tool calls and their envelopes,
//! the capability alias tables, the safe expression evaluator, the
//! command translator, sandbox allow-lists and the suggestion engine.
//!
//! # Core Concepts
//!
//! ## Tool call
//!
//! A [`ToolCall`] is a name plus a JSON argument mapping. Callers send the
//! wire form (`{"function": {"name", "arguments"}}`) where `arguments` may
//! be a JSON-encoded string; [`WireToolCall::decode`] normalizes both.
//!
//! ## Outcome and envelope
//!
//! A resolver either declines a call or produces an [`Outcome`]. The
//! dispatcher turns that into a [`ResultEnvelope`], which is always exactly
//! one of `{success, result}` or `{error, suggestion?}`.

pub mod command;
pub mod expression;
pub mod sandbox;
pub mod suggestion;
pub mod tool;
pub mod util;

pub use command::{CommandBuilder, LogicalOp, Platform, SystemCommandDetector, translate};
pub use expression::{CalculationError, ExpressionEvaluator, Number};
pub use sandbox::{CapabilityAllowList, SandboxProfile};
pub use suggestion::{NO_SUGGESTION, SuggestionEngine};
pub use tool::{
    Arguments, CodeLanguage, CodeTarget, DispatchError, FailureKind, FileOperation,
    NetworkAction, Outcome, ResolverOutcome, ResultEnvelope, SystemAction, ToolCall,
    WireToolCall,
};
