//! Chat completion request and its wire body

use crate::types::message::Message;
use crate::Result;
use serde::Serialize;

/// Sampling temperature used when a request does not set one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Shape the endpoint is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Free text
    #[default]
    Text,
    /// `response_format: {"type": "json_object"}`
    JsonObject,
}

/// One logical completion request.
///
/// Built once with the consuming setters and then only read; retries resend the same value.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    messages: Vec<Message>,
    temperature: f64,
    seed: Option<u64>,
    model: Option<String>,
    response_format: ResponseFormat,
    tag: Option<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: DEFAULT_TEMPERATURE,
            seed: None,
            model: None,
            response_format: ResponseFormat::Text,
            tag: None,
        }
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Deterministic sampling seed. A seed of `0` means "no seed" and is not sent.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = (seed != 0).then_some(seed);
        self
    }

    pub fn maybe_seed(self, seed: Option<u64>) -> Self {
        match seed {
            Some(s) => self.seed(s),
            None => self,
        }
    }

    /// Override the client's default model for this request only.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn json_object(mut self) -> Self {
        self.response_format = ResponseFormat::JsonObject;
        self
    }

    /// Free-form label carried into logs and attempt events (e.g. "chapter-3/angle-1").
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get_temperature(&self) -> f64 {
        self.temperature
    }

    pub fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn model_override(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn response_format(&self) -> ResponseFormat {
        self.response_format
    }

    pub fn get_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Compile into the OpenAI-compatible JSON body.
    pub fn to_body(&self, default_model: &str) -> Result<serde_json::Value> {
        let body = CompletionBody {
            model: self.model.as_deref().unwrap_or(default_model),
            messages: &self.messages,
            temperature: self.temperature,
            seed: self.seed,
            response_format: match self.response_format {
                ResponseFormat::Text => None,
                ResponseFormat::JsonObject => Some(ResponseFormatBody {
                    kind: "json_object",
                }),
            },
        };
        Ok(serde_json::to_value(body)?)
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatBody>,
}

#[derive(Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    kind: &'static str,
}
