//! Tool call entities: the input side of the dispatch pipeline.
//!
//! A [`ToolCall`] is what a language model emits when it wants something
//! done: a free-form name and a bag of arguments. Models follow the
//! `{"function": {"name": ..., "arguments": ...}}` convention, where the
//! arguments may arrive either as a JSON object or as a JSON-encoded string.
//! [`WireToolCall`] models that wire shape and [`normalize_arguments`]
//! turns it into a decoded [`ToolCall`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::value_objects::DispatchError;

/// Decoded argument mapping of a tool call.
pub type Arguments = serde_json::Map<String, Value>;

/// A decoded call to a tool with arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to call, exactly as the model spelled it
    pub name: String,
    /// Arguments passed to the tool
    #[serde(default)]
    pub arguments: Arguments,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Arguments::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = arguments;
        self
    }

    /// Lowercased, trimmed name used for alias matching.
    pub fn normalized_name(&self) -> String {
        self.name.trim().to_lowercase()
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument or return an error message
    pub fn require_string(&self, key: &str) -> Result<&str, String> {
        self.get_string(key)
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    /// First non-empty string among several accepted spellings of one argument.
    pub fn first_string(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.get_string(key))
            .find(|s| !s.trim().is_empty())
    }

    /// Get an i64 argument.
    ///
    /// Models regularly quote numbers, so numeric strings and integral
    /// floats are accepted as well.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.arguments.get(key)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get an optional f64 argument (numbers or numeric strings)
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.arguments.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get an optional bool argument
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.arguments.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get an object-valued argument
    pub fn get_object(&self, key: &str) -> Option<&Arguments> {
        self.arguments.get(key).and_then(|v| v.as_object())
    }

    pub fn has_arg(&self, key: &str) -> bool {
        self.arguments.contains_key(key)
    }
}

/// The `function` member of a wire-format tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFunction {
    pub name: String,
    /// Either a JSON object or a JSON-encoded string
    #[serde(default)]
    pub arguments: Value,
}

/// Wire-format tool call: `{"function": {"name": ..., "arguments": ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub function: WireFunction,
}

impl WireToolCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<Value>) -> Self {
        Self {
            function: WireFunction {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Decode the arguments and produce a [`ToolCall`].
    pub fn decode(self) -> Result<ToolCall, DispatchError> {
        let arguments = normalize_arguments(self.function.arguments)?;
        Ok(ToolCall {
            name: self.function.name,
            arguments,
        })
    }
}

/// Normalize raw wire arguments into a decoded mapping.
///
/// - an object is used as-is
/// - `null` (or an absent member) becomes an empty mapping
/// - a string is parsed as JSON and must decode to an object
///
/// Anything else is an [`DispatchError::ArgumentDecode`] carrying the raw text.
pub fn normalize_arguments(raw: Value) -> Result<Arguments, DispatchError> {
    match raw {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Arguments::new()),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(DispatchError::ArgumentDecode { raw: text }),
        },
        other => Err(DispatchError::ArgumentDecode {
            raw: other.to_string(),
        }),
    }
}
