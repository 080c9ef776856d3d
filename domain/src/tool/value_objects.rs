//! Tool dispatch value objects: outcomes, envelopes and the error taxonomy.
//!
//! These types form the **output side** of the dispatch pipeline:
//!
//! ```text
//! strategy ──▶ ResolverOutcome ──▶ Dispatcher ──▶ ResultEnvelope
//!              NotApplicable         (next)
//!              Handled(Outcome)      {success: true, result}
//!              (no claim)            {error, suggestion}
//! ```
//!
//! A handled call is always a success envelope, even when the strategy
//! failed internally: the failure is reported as descriptive text inside
//! `result`. Only argument decoding and unknown tools produce an `error`
//! envelope.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Classification of a failure that a strategy captured and reported.
///
/// | Kind | Raised by |
/// |------|-----------|
/// | `ExecutionTimeout` | spawned process or HTTP request exceeded its timeout |
/// | `ExecutionFailure` | non-zero exit, sandboxed runtime exception, I/O error |
/// | `DependencyMissing` | interpreter, library or collaborator absent |
/// | `CalculationError` | disallowed or malformed expression |
/// | `InvalidArgument` | missing or malformed call argument |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ExecutionTimeout,
    ExecutionFailure,
    DependencyMissing,
    CalculationError,
    InvalidArgument,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ExecutionTimeout => "execution_timeout",
            FailureKind::ExecutionFailure => "execution_failure",
            FailureKind::DependencyMissing => "dependency_missing",
            FailureKind::CalculationError => "calculation_error",
            FailureKind::InvalidArgument => "invalid_argument",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a strategy produced for a call it claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action ran; the text is its result
    Completed(String),
    /// The action was recognized but failed; the text describes why
    Failed { kind: FailureKind, message: String },
}

impl Outcome {
    pub fn completed(text: impl Into<String>) -> Self {
        Outcome::Completed(text.into())
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Outcome::Failed {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::failed(FailureKind::ExecutionTimeout, message)
    }

    pub fn execution_failure(message: impl Into<String>) -> Self {
        Self::failed(FailureKind::ExecutionFailure, message)
    }

    pub fn dependency_missing(message: impl Into<String>) -> Self {
        Self::failed(FailureKind::DependencyMissing, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::failed(FailureKind::InvalidArgument, message)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Outcome::Completed(_) => None,
            Outcome::Failed { kind, .. } => Some(*kind),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Outcome::Completed(text) => text,
            Outcome::Failed { message, .. } => message,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Outcome::Completed(text) => text,
            Outcome::Failed { message, .. } => message,
        }
    }
}

/// Per-strategy answer to "is this call yours?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverOutcome {
    /// The strategy does not recognize the call; try the next one
    NotApplicable,
    /// The strategy claimed the call; the chain stops here
    Handled(Outcome),
}

impl ResolverOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, ResolverOutcome::Handled(_))
    }
}

impl From<Outcome> for ResolverOutcome {
    fn from(outcome: Outcome) -> Self {
        ResolverOutcome::Handled(outcome)
    }
}

/// Errors the dispatcher formats itself.
///
/// Everything else is captured inside its owning strategy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Invalid arguments JSON: {raw}")]
    ArgumentDecode { raw: String },

    #[error("Unknown tool '{name}'. Available capabilities: {capabilities}")]
    UnknownTool { name: String, capabilities: String },
}

/// Uniform response returned to the caller.
///
/// Serializes to exactly one of
/// `{"success": true, "result": "..."}` or
/// `{"error": "...", "suggestion": "..."}` (suggestion optional).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultEnvelope {
    Success {
        #[serde(deserialize_with = "success_flag")]
        success: bool,
        result: String,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suggestion: Option<String>,
    },
}

/// Only `"success": true` reads back as a success envelope.
fn success_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match bool::deserialize(deserializer)? {
        true => Ok(true),
        false => Err(serde::de::Error::custom("success envelope must carry \"success\": true")),
    }
}

impl ResultEnvelope {
    pub fn success(result: impl Into<String>) -> Self {
        ResultEnvelope::Success {
            success: true,
            result: result.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        ResultEnvelope::Error {
            error: error.into(),
            suggestion: None,
        }
    }

    pub fn error_with_suggestion(error: impl Into<String>, suggestion: impl Into<String>) -> Self {
        ResultEnvelope::Error {
            error: error.into(),
            suggestion: Some(suggestion.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResultEnvelope::Success { .. })
    }

    pub fn result(&self) -> Option<&str> {
        match self {
            ResultEnvelope::Success { result, .. } => Some(result),
            ResultEnvelope::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ResultEnvelope::Success { .. } => None,
            ResultEnvelope::Error { error, .. } => Some(error),
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ResultEnvelope::Success { .. } => None,
            ResultEnvelope::Error { suggestion, .. } => suggestion.as_deref(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl From<DispatchError> for ResultEnvelope {
    fn from(err: DispatchError) -> Self {
        ResultEnvelope::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let envelope = ResultEnvelope::success("8");
        assert_eq!(envelope.to_json(), json!({"success": true, "result": "8"}));
        assert!(envelope.is_success());
        assert!(envelope.error_message().is_none());
    }

    #[test]
    fn test_error_envelope_shape() {
        let envelope = ResultEnvelope::error_with_suggestion("Unknown tool 'x'", "try calculator");
        assert_eq!(
            envelope.to_json(),
            json!({"error": "Unknown tool 'x'", "suggestion": "try calculator"})
        );
        assert!(!envelope.is_success());
        assert!(envelope.result().is_none());
    }

    #[test]
    fn test_error_envelope_omits_absent_suggestion() {
        let envelope: ResultEnvelope =
            DispatchError::ArgumentDecode { raw: "{".to_string() }.into();
        assert_eq!(envelope.to_json(), json!({"error": "Invalid arguments JSON: {"}));
    }

    #[test]
    fn test_envelope_deserializes_both_shapes() {
        let ok: ResultEnvelope = serde_json::from_str(r#"{"success":true,"result":"hi"}"#).unwrap();
        assert_eq!(ok.result(), Some("hi"));
        let err: ResultEnvelope = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert_eq!(err.error_message(), Some("nope"));
    }

    #[test]
    fn test_success_false_is_not_a_success_envelope() {
        let parsed = serde_json::from_str::<ResultEnvelope>(r#"{"success":false,"result":"hi"}"#);
        assert!(parsed.is_err());

        let with_error: ResultEnvelope =
            serde_json::from_str(r#"{"success":false,"error":"boom"}"#).unwrap();
        assert!(!with_error.is_success());
        assert_eq!(with_error.error_message(), Some("boom"));
    }

    #[test]
    fn test_outcome_text() {
        let outcome = Outcome::failed(FailureKind::CalculationError, "Calculation error: x");
        assert_eq!(outcome.failure_kind(), Some(FailureKind::CalculationError));
        assert_eq!(outcome.text(), "Calculation error: x");
        assert!(!outcome.is_completed());
        assert!(ResolverOutcome::from(outcome).is_handled());
    }
}
