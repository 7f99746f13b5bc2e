use crate::structured::ValidationError;
use crate::transport::TransportError;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path that caused the error (e.g., "choices[0].message.content", "OPENAI_BASE_URL")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., a snippet of the offending content)
    pub details: Option<String>,
    /// Source of the error (e.g., "response_parser", "client_builder")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for dataset generation.
///
/// Source errors (`SourceNotFound`, `SourceRead`, `MalformedSource`) are raised before any
/// network activity and are never retried. Per-attempt errors (`Transport`, `Endpoint`,
/// `MalformedResponse`, `ValidationRejected`) are retried by the client and only surface
/// wrapped in `RequestExhausted`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Source file not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Failed to read source {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed source: {message}")]
    MalformedSource { message: String },

    #[error("Endpoint error{}: {message}", format_status(.status))]
    Endpoint { status: Option<u16>, message: String },

    #[error("Malformed response: {message}{}", format_context(.context))]
    MalformedResponse {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation rejected: {0}")]
    ValidationRejected(#[from] ValidationError),

    #[error("Request exhausted after {attempts} attempts: {last}")]
    RequestExhausted { attempts: u32, last: Box<Error> },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!(" (HTTP {})", s),
        None => String::new(),
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new malformed-response error with structured context
    pub fn malformed_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::MalformedResponse {
            message: msg.into(),
            context,
        }
    }

    /// Classify an I/O failure on the input file.
    pub fn from_source_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::SourceNotFound { path }
        } else {
            Error::SourceRead { path, source: err }
        }
    }

    /// Whether this error describes a single failed attempt against the endpoint.
    ///
    /// Only these are worth another attempt; everything else fails the request immediately.
    pub fn is_attempt_failure(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::Endpoint { .. }
                | Error::MalformedResponse { .. }
                | Error::ValidationRejected(_)
        )
    }

    /// The error that ended the last attempt, looking through `RequestExhausted`.
    pub fn last_attempt_error(&self) -> &Error {
        match self {
            Error::RequestExhausted { last, .. } => last.last_attempt_error(),
            other => other,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::MalformedResponse { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}
