//! Outbound transport for chat completion calls.
//!
//! The client talks to a [`CompletionTransport`]; [`HttpTransport`] is the production
//! implementation. One call to `post_completion` is one attempt: no retries happen here.

mod http;

pub use http::{HttpTransport, CHAT_COMPLETIONS_PATH, DEFAULT_TIMEOUT};

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Posts one completion body and returns the parsed JSON response body.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn post_completion(&self, body: &serde_json::Value) -> Result<serde_json::Value>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Other(String),
}
