//! Ports (interfaces) for the application layer
//!
//! Adapters for these live in the infrastructure crate.

pub mod dispatch_logger;
pub mod file_capability;
pub mod strategy;
