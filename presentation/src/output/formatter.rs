//! Output formatter trait

use dispatch_domain::tool::ResultEnvelope;

/// Trait for formatting result envelopes
pub trait OutputFormatter {
    /// Human-readable rendering
    fn format(&self, envelope: &ResultEnvelope) -> String;

    /// Single-line JSON rendering
    fn format_json(&self, envelope: &ResultEnvelope) -> String;
}
