use serde::{Deserialize, Serialize};

/// One entry of a request validation failure (HTTP 422).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path to the offending field, e.g. `["body", "email"]`.
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    /// Human readable reason.
    pub msg: String,
    /// Machine readable error kind.
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// The `detail` payload of an error body.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ErrorDetail {
    /// A plain message such as `"Invalid credentials"`.
    Message(String),
    /// Field level validation errors.
    Validation(Vec<ValidationIssue>),
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// What went wrong, if the server said.
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

impl ErrorResponse {
    /// Creates an error response carrying a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            detail: Some(ErrorDetail::Message(message.into())),
        }
    }

    /// Renders the detail as a single line, or `None` when the server sent nothing useful.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            ErrorDetail::Message(message) if message.trim().is_empty() => None,
            ErrorDetail::Message(message) => Some(message.clone()),
            ErrorDetail::Validation(issues) if issues.is_empty() => None,
            ErrorDetail::Validation(issues) => Some(
                issues
                    .iter()
                    .map(|issue| issue.msg.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.message() {
            Some(message) => f.write_str(&message),
            None => f.write_str("unknown error"),
        }
    }
}

impl std::error::Error for ErrorResponse {}
