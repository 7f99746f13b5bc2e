use crate::client::core::CompletionClient;
use crate::client::policy::RetryPolicy;
use crate::config::{ClientConfig, DEFAULT_MODEL};
use crate::telemetry::AttemptSink;
use crate::transport::{CompletionTransport, HttpTransport, DEFAULT_TIMEOUT};
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`CompletionClient`].
///
/// Keep this surface area small and predictable.
pub struct CompletionClientBuilder {
    model: String,
    base_url: Option<String>,
    api_key: Option<String>,
    policy: RetryPolicy,
    timeout: Duration,
    attempts: Arc<dyn AttemptSink>,
    transport: Option<Arc<dyn CompletionTransport>>,
    /// Override base URL (primarily for testing with mock servers)
    base_url_override: Option<String>,
}

impl CompletionClientBuilder {
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key: None,
            policy: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            attempts: crate::telemetry::noop_sink(),
            transport: None,
            base_url_override: None,
        }
    }

    /// Start from a loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut builder = Self::new()
            .model(config.model.clone())
            .base_url(config.base_url.clone())
            .retry_policy(config.retry_policy())
            .timeout(config.timeout());
        builder.api_key = config.api_key.clone();
        builder
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.policy = RetryPolicy::new(max_retries, self.policy.retry_delay);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.policy = RetryPolicy::new(self.policy.max_retries, delay);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Per-call timeout for the HTTP transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Inject an attempt sink. Default is a no-op sink.
    pub fn attempt_sink(mut self, sink: Arc<dyn AttemptSink>) -> Self {
        self.attempts = sink;
        self
    }

    /// Use a custom transport instead of HTTP.
    pub fn transport(mut self, transport: Arc<dyn CompletionTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the configured base URL.
    ///
    /// This is primarily for testing with mock servers.
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<CompletionClient> {
        if self.model.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "model must not be empty",
                ErrorContext::new()
                    .with_field_path("model")
                    .with_source("client_builder"),
            ));
        }

        let transport = match self.transport {
            Some(t) => t,
            None => {
                let base_url = self
                    .base_url_override
                    .or(self.base_url)
                    .ok_or_else(|| {
                        Error::configuration_with_context(
                            "no base URL configured",
                            ErrorContext::new()
                                .with_field_path("OPENAI_BASE_URL")
                                .with_source("client_builder"),
                        )
                    })?;
                Arc::new(HttpTransport::new(&base_url, self.api_key, self.timeout)?)
                    as Arc<dyn CompletionTransport>
            }
        };

        Ok(CompletionClient {
            transport,
            model: self.model,
            policy: self.policy,
            attempts: self.attempts,
        })
    }
}

impl Default for CompletionClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
