//! Tool domain module
//!
//! Core abstractions for dispatching model-emitted tool calls.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌─────────────────┐    ┌────────────────┐
//! │ WireToolCall │───▶│ ToolCall     │───▶│ ResolverOutcome │───▶│ ResultEnvelope │
//! │ (raw JSON)   │    │ (decoded)    │    │ (per strategy)  │    │ (to caller)    │
//! └──────────────┘    └──────────────┘    └─────────────────┘    └────────────────┘
//! ```
//!
//! # Alias Tables
//!
//! Models do not know any fixed schema, so every strategy accepts many
//! spellings of the same capability. The tables live in [`capability`]
//! as closed enums ([`FileOperation`], [`CodeLanguage`], [`SystemAction`],
//! [`NetworkAction`]) resolved by `match`, not by dynamic lookup.
//!
//! # Architecture
//!
//! - **Domain** (this module): pure definitions, no I/O
//! - **Application** (`ResolverStrategy`, `Dispatcher`): the strategy chain
//! - **Infrastructure**: process spawning, HTTP, metrics

pub mod capability;
pub mod entities;
pub mod value_objects;

pub use capability::{
    CodeLanguage, CodeTarget, FileOperation, NetworkAction, SystemAction, capabilities_summary,
    code_target,
};
pub use entities::{Arguments, ToolCall, WireFunction, WireToolCall, normalize_arguments};
pub use value_objects::{DispatchError, FailureKind, Outcome, ResolverOutcome, ResultEnvelope};
