//! Use cases for the application layer

pub mod dispatch;
pub mod expression;
pub mod file_operations;
pub mod generic_fallback;
