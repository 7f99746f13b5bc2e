//! Single-attempt request execution.
//!
//! Retry loops live in `core`; each function here is exactly one outbound call.

use crate::protocol::{extract_content, parse_json_content, ChatRequest};
use crate::structured::{ValidationOutcome, Validator};
use crate::{Error, Result};
use serde_json::Value;
use tracing::debug;

use super::core::CompletionClient;

impl CompletionClient {
    pub(crate) async fn attempt_text(&self, request: &ChatRequest) -> Result<String> {
        let body = request.to_body(&self.model)?;
        debug!(
            tag = request.get_tag().unwrap_or(""),
            messages = request.messages().len(),
            "sending completion attempt"
        );
        let response = self.transport.post_completion(&body).await?;
        extract_content(&response)
    }

    pub(crate) async fn attempt_structured(
        &self,
        request: &ChatRequest,
        validator: &dyn Validator,
    ) -> Result<Value> {
        let content = self.attempt_text(request).await?;
        let value = parse_json_content(&content)?;
        match validator.validate(&value) {
            ValidationOutcome::Accepted => Ok(value),
            ValidationOutcome::Rejected(e) => {
                debug!(validator = validator.name(), rejection = %e, "structured response rejected");
                Err(Error::ValidationRejected(e))
            }
        }
    }
}
