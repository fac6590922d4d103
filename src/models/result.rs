//! Three-state result container produced by one task execution attempt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single execution attempt: absent, a value, or an error.
///
/// Immutable once recorded; the orchestration engine never inspects the value
/// payload, it only moves it through collection and publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "payload")]
pub enum TaskResult {
    None,
    Value(Value),
    Error(String),
}

impl TaskResult {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl Default for TaskResult {
    fn default() -> Self {
        Self::None
    }
}

impl std::fmt::Display for TaskResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Value(value) => write!(f, "value({value})"),
            Self::Error(message) => write!(f, "error({message})"),
        }
    }
}
