use crate::transport::{CompletionTransport, TransportError};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use reqwest::Proxy;
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Path appended to the configured base URL.
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Per-call timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// reqwest-backed transport for an OpenAI-compatible endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        url::Url::parse(base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base URL '{}': {}", base_url, e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_source("http_transport"),
            )
        })?;

        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(
                env::var("NOVEL_DATAGEN_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Ok(proxy_url) = env::var("NOVEL_DATAGEN_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CHAT_COMPLETIONS_PATH),
            api_key,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn post_completion(&self, body: &Value) -> Result<Value> {
        let request_id = Uuid::new_v4().to_string();
        let mut req = self
            .client
            .post(&self.endpoint)
            .json(body)
            .header("x-request-id", &request_id);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        debug!(request_id = request_id.as_str(), endpoint = self.endpoint.as_str(), "posting chat completion");

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Transport(TransportError::Timeout(self.timeout))
            } else {
                Error::Transport(TransportError::Http(e))
            }
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::Transport(TransportError::Timeout(self.timeout))
            } else {
                Error::Transport(TransportError::Http(e))
            }
        })?;

        match serde_json::from_str::<Value>(&text) {
            // Error bodies are interpreted by the response parser.
            Ok(json) if status.is_success() || json.get("error").is_some() => Ok(json),
            Err(e) if status.is_success() => Err(Error::malformed_with_context(
                format!("response body is not JSON: {}", e),
                ErrorContext::new().with_source("http_transport"),
            )),
            _ => Err(Error::Endpoint {
                status: Some(status.as_u16()),
                message: text,
            }),
        }
    }
}
