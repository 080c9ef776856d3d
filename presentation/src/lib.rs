//! Presentation layer for tool-dispatch
//!
//! This crate contains the CLI definition, envelope formatters and the
//! progress spinner.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use progress::reporter::ProgressReporter;
