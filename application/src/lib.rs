//! Application layer for tool-dispatch
//!
//! This crate contains the dispatcher, the strategies that need no I/O of
//! their own, port definitions and engine settings. It depends only on the
//! domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{EngineSettings, NetworkSettings};
pub use ports::{
    dispatch_logger::{DispatchEvent, DispatchLogger, NoDispatchLogger},
    file_capability::FileCapability,
    strategy::{ResolverStrategy, StrategyFault},
};
pub use use_cases::dispatch::{Dispatcher, StrategyChain};
pub use use_cases::expression::ExpressionStrategy;
pub use use_cases::file_operations::{FileOperationResolver, NO_FILE_MANAGER};
pub use use_cases::generic_fallback::GenericFunctionFallback;
