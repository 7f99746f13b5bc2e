//! Error types for structured output validation.

use std::fmt;

/// Validation error with location information.
///
/// Names the specific field that is missing or invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Error message describing what went wrong
    pub message: String,
    /// JSON path to the error location (e.g., "conversations[0].talk[1].from")
    pub path: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, path: Option<String>) -> Self {
        Self {
            message: message.into(),
            path,
        }
    }

    /// Create an error with a path.
    pub fn with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create an error without path.
    pub fn without_path(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) if !path.is_empty() => write!(f, "{}: {}", path, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Verdict of a [`Validator`](crate::structured::Validator).
///
/// Returned, never raised: the retry client turns a rejection into a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected(ValidationError),
}

impl ValidationOutcome {
    pub fn reject(message: impl Into<String>, path: impl Into<String>) -> Self {
        ValidationOutcome::Rejected(ValidationError::with_path(message, path))
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted)
    }

    pub fn rejection(&self) -> Option<&ValidationError> {
        match self {
            ValidationOutcome::Accepted => None,
            ValidationOutcome::Rejected(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            ValidationOutcome::Accepted => Ok(()),
            ValidationOutcome::Rejected(e) => Err(e),
        }
    }
}

impl From<Result<(), ValidationError>> for ValidationOutcome {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => ValidationOutcome::Accepted,
            Err(e) => ValidationOutcome::Rejected(e),
        }
    }
}
