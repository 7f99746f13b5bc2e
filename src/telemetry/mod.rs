//! Attempt reporting.
//!
//! Every failed attempt inside the retry client is reported to an [`AttemptSink`] before
//! the client sleeps and tries again. The default sink discards events; tracing output is
//! emitted by the client regardless of the sink.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`AttemptEvent`] | One failed attempt |
//! | [`AttemptSink`] | Trait for event destinations |
//! | [`NoopAttemptSink`] | Default no-op sink |
//! | [`InMemoryAttemptSink`] | In-memory sink for testing and run summaries |

use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

fn timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// A single failed attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptEvent {
    /// Correlates all attempts of one logical request
    pub request_id: String,
    /// Request tag, if the caller set one
    pub tag: Option<String>,
    /// 1-based attempt number
    pub attempt: u32,
    pub max_retries: u32,
    pub error: String,
    /// Whether another attempt follows this one
    pub will_retry: bool,
    pub timestamp: f64,
}

impl AttemptEvent {
    pub fn new(
        request_id: impl Into<String>,
        attempt: u32,
        max_retries: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            tag: None,
            attempt,
            max_retries,
            error: error.into(),
            will_retry: false,
            timestamp: timestamp(),
        }
    }

    pub fn with_tag(mut self, tag: Option<&str>) -> Self {
        self.tag = tag.map(|t| t.to_string());
        self
    }

    pub fn with_retry(mut self, will_retry: bool) -> Self {
        self.will_retry = will_retry;
        self
    }
}

#[async_trait]
pub trait AttemptSink: Send + Sync {
    async fn report(&self, event: AttemptEvent) -> Result<()>;
}

/// Discards every event.
pub struct NoopAttemptSink;

#[async_trait]
impl AttemptSink for NoopAttemptSink {
    async fn report(&self, _event: AttemptEvent) -> Result<()> {
        Ok(())
    }
}

pub fn noop_sink() -> Arc<dyn AttemptSink> {
    Arc::new(NoopAttemptSink)
}

/// In-memory sink, bounded to the most recent `max_events`.
pub struct InMemoryAttemptSink {
    events: Arc<RwLock<Vec<AttemptEvent>>>,
    max_events: usize,
}

impl InMemoryAttemptSink {
    pub fn new(max: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            max_events: max.max(1),
        }
    }

    pub fn events(&self) -> Vec<AttemptEvent> {
        self.events
            .read()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn events_for(&self, request_id: &str) -> Vec<AttemptEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.request_id == request_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }
}

#[async_trait]
impl AttemptSink for InMemoryAttemptSink {
    async fn report(&self, event: AttemptEvent) -> Result<()> {
        if let Ok(mut events) = self.events.write() {
            events.push(event);
            if events.len() > self.max_events {
                events.remove(0);
            }
        }
        Ok(())
    }
}
