//! Interpreting chat completion response bodies.

use crate::{Error, ErrorContext, Result};
use serde::Deserialize;
use serde_json::Value;

/// Longest content snippet quoted back in a parse error.
const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a response body.
///
/// A body with a non-null `error` field is an endpoint error even when choices are present.
pub fn extract_content(body: &Value) -> Result<String> {
    if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
        return Err(Error::Endpoint {
            status: None,
            message: describe_endpoint_error(err),
        });
    }

    let completion: ChatCompletion = serde_json::from_value(body.clone()).map_err(|e| {
        Error::malformed_with_context(
            format!("unexpected completion shape: {}", e),
            ErrorContext::new()
                .with_field_path("choices")
                .with_source("response_parser"),
        )
    })?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| {
            Error::malformed_with_context(
                "completion has no message content",
                ErrorContext::new()
                    .with_field_path("choices[0].message.content")
                    .with_source("response_parser"),
            )
        })
}

/// Parse structured content returned in JSON mode.
pub fn parse_json_content(content: &str) -> Result<Value> {
    serde_json::from_str(content).map_err(|e| {
        Error::malformed_with_context(
            format!("content is not valid JSON: {}", e),
            ErrorContext::new()
                .with_field_path("choices[0].message.content")
                .with_details(snippet(content))
                .with_source("response_parser"),
        )
    })
}

/// Human-readable text for an `error` field (string or `{message: ...}` object).
pub fn describe_endpoint_error(err: &Value) -> String {
    match err {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
            .unwrap_or_else(|| err.to_string()),
        other => other.to_string(),
    }
}

fn snippet(content: &str) -> String {
    let mut out: String = content.chars().take(SNIPPET_CHARS).collect();
    if content.chars().count() > SNIPPET_CHARS {
        out.push('…');
    }
    out
}
