//! Batch executor.

use super::group::TaskGroup;
use super::outcome::BatchOutcome;
use super::unit::{PromptBuilder, Unit};
use crate::client::CompletionClient;
use crate::structured::Validator;
use crate::{Error, ErrorContext, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Units allowed in flight when not configured.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 50;

/// Fans units out to a per-unit job under a global concurrency ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchExecutor {
    concurrency_limit: usize,
}

impl BatchExecutor {
    pub fn new() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
        }
    }

    pub fn with_concurrency(limit: usize) -> Self {
        Self {
            concurrency_limit: limit.max(1),
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Run `job` once per unit.
    ///
    /// Unit failures never fail the batch; the only error is a duplicate position,
    /// detected before anything is scheduled.
    pub async fn run_batch<T, F, Fut>(&self, units: Vec<Unit>, mut job: F) -> Result<BatchOutcome<T>>
    where
        T: Send + 'static,
        F: FnMut(Unit) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        check_positions(&units)?;
        info!(
            units = units.len(),
            concurrency_limit = self.concurrency_limit,
            "batch started"
        );

        let mut group = TaskGroup::new(self.concurrency_limit);
        for unit in units {
            let position = unit.position;
            group.submit(position, job(unit))?;
        }
        Ok(group.join_all().await)
    }

    /// Build a request per unit, send it in JSON mode, and keep the validated value.
    pub async fn run_structured<P>(
        &self,
        client: Arc<CompletionClient>,
        units: Vec<Unit>,
        prompts: Arc<P>,
        validator: Arc<dyn Validator>,
    ) -> Result<BatchOutcome<Value>>
    where
        P: PromptBuilder + ?Sized + 'static,
    {
        self.run_batch(units, move |unit| {
            let client = client.clone();
            let prompts = prompts.clone();
            let validator = validator.clone();
            async move {
                let request = prompts.build(&unit);
                client.send_structured(&request, validator.as_ref()).await
            }
        })
        .await
    }

    /// Like [`run_structured`](Self::run_structured) for free-text responses.
    pub async fn run_text<P>(
        &self,
        client: Arc<CompletionClient>,
        units: Vec<Unit>,
        prompts: Arc<P>,
    ) -> Result<BatchOutcome<String>>
    where
        P: PromptBuilder + ?Sized + 'static,
    {
        self.run_batch(units, move |unit| {
            let client = client.clone();
            let prompts = prompts.clone();
            async move {
                let request = prompts.build(&unit);
                client.send(&request).await
            }
        })
        .await
    }
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn check_positions(units: &[Unit]) -> Result<()> {
    let mut seen = HashSet::with_capacity(units.len());
    for unit in units {
        if !seen.insert(unit.position) {
            return Err(Error::configuration_with_context(
                format!("duplicate unit position {}", unit.position),
                ErrorContext::new()
                    .with_field_path("position")
                    .with_source("batch_executor"),
            ));
        }
    }
    Ok(())
}
