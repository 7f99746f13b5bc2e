use crate::client::policy::{Decision, RetryPolicy};
use crate::protocol::ChatRequest;
use crate::structured::Validator;
use crate::telemetry::{AttemptEvent, AttemptSink};
use crate::transport::CompletionTransport;
use crate::{Error, Result};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Chat completion client with bounded fixed-delay retries.
///
/// Holds no per-request state; share it across tasks behind an `Arc`.
pub struct CompletionClient {
    pub(crate) transport: Arc<dyn CompletionTransport>,
    pub(crate) model: String,
    pub(crate) policy: RetryPolicy,
    pub(crate) attempts: Arc<dyn AttemptSink>,
}

impl CompletionClient {
    pub fn builder() -> crate::client::builder::CompletionClientBuilder {
        crate::client::builder::CompletionClientBuilder::new()
    }

    /// Default model used when a request carries no override.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Send a free-text request and return the message content.
    pub async fn send(&self, request: &ChatRequest) -> Result<String> {
        self.with_retries(request, || self.attempt_text(request))
            .await
    }

    /// Send a request in JSON mode, parse the content and check it with `validator`.
    ///
    /// Parse failures and rejections count as failed attempts and are retried.
    pub async fn send_structured(
        &self,
        request: &ChatRequest,
        validator: &dyn Validator,
    ) -> Result<Value> {
        let request = request.clone().json_object();
        self.with_retries(&request, || self.attempt_structured(&request, validator))
            .await
    }

    /// Run `attempt` until it succeeds or the policy gives up.
    ///
    /// Attempts are strictly sequential. Each failure is logged and reported to the attempt
    /// sink before the delay; exhaustion is the only attempt error returned.
    async fn with_retries<T, F, Fut>(&self, request: &ChatRequest, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let request_id = Uuid::new_v4().to_string();
        let tag = request.get_tag();
        let max_retries = self.policy.max_retries;
        let mut n: u32 = 0;

        loop {
            n += 1;
            let err = match attempt().await {
                Ok(value) => {
                    if n > 1 {
                        info!(
                            request_id = request_id.as_str(),
                            tag = tag.unwrap_or(""),
                            attempts = n,
                            "completion succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let decision = self.policy.decide(&err, n);
            let will_retry = matches!(decision, Decision::Retry { .. });
            warn!(
                request_id = request_id.as_str(),
                tag = tag.unwrap_or(""),
                attempt = n,
                max_retries,
                will_retry,
                error = %err,
                "completion attempt failed"
            );
            let _ = self
                .attempts
                .report(
                    AttemptEvent::new(request_id.as_str(), n, max_retries, err.to_string())
                        .with_tag(tag)
                        .with_retry(will_retry),
                )
                .await;

            match decision {
                Decision::Retry { delay } => tokio::time::sleep(delay).await,
                Decision::Fail if err.is_attempt_failure() => {
                    return Err(Error::RequestExhausted {
                        attempts: n,
                        last: Box::new(err),
                    })
                }
                Decision::Fail => return Err(err),
            }
        }
    }
}
