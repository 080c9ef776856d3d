//! Console output formatter for result envelopes

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use dispatch_domain::tool::ResultEnvelope;

/// Formats envelopes for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn format(envelope: &ResultEnvelope) -> String {
        match envelope {
            ResultEnvelope::Success { result, .. } => result.clone(),
            ResultEnvelope::Error { error, suggestion } => {
                let mut output = format!("{} {}", "Error:".red().bold(), error);
                if let Some(suggestion) = suggestion {
                    output.push_str(&format!("\n{} {}", "Suggestion:".yellow().bold(), suggestion));
                }
                output
            }
        }
    }

    /// Compact JSON, one envelope per line
    pub fn format_json(envelope: &ResultEnvelope) -> String {
        envelope.to_json().to_string()
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, envelope: &ResultEnvelope) -> String {
        Self::format(envelope)
    }

    fn format_json(&self, envelope: &ResultEnvelope) -> String {
        Self::format_json(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_prints_result_verbatim() {
        colored::control::set_override(false);
        let envelope = ResultEnvelope::success("line 1\nline 2");
        assert_eq!(ConsoleFormatter::format(&envelope), "line 1\nline 2");
    }

    #[test]
    fn test_error_with_suggestion() {
        colored::control::set_override(false);
        let envelope = ResultEnvelope::error_with_suggestion("Unknown tool 'x'", "Try run_command");
        assert_eq!(
            ConsoleFormatter::format(&envelope),
            "Error: Unknown tool 'x'\nSuggestion: Try run_command"
        );
    }

    #[test]
    fn test_json_is_single_line() {
        let envelope = ResultEnvelope::success("a\nb");
        let json = ConsoleFormatter::format_json(&envelope);
        assert!(!json.contains('\n'));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&json).unwrap(),
            serde_json::json!({"success": true, "result": "a\nb"})
        );
    }
}
