//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod mock_server;

use async_trait::async_trait;
use novel_datagen::transport::CompletionTransport;
use novel_datagen::{CompletionClient, Result};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = dyn Fn(&Value, usize) -> Result<Value> + Send + Sync;

/// In-process transport answering every call with a closure of (body, zero-based call number).
pub struct ScriptedTransport {
    responder: Box<Responder>,
    latency: Duration,
    calls: AtomicUsize,
    bodies: Mutex<Vec<Value>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Value, usize) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            bodies: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn post_completion(&self, body: &Value) -> Result<Value> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies.lock().unwrap().push(body.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.responder)(body, n)
    }
}

/// Client over `transport` with `max_retries` attempts and no delay.
pub fn client_over(transport: Arc<ScriptedTransport>, max_retries: u32) -> CompletionClient {
    CompletionClient::builder()
        .transport(transport)
        .max_retries(max_retries)
        .retry_delay(Duration::ZERO)
        .build()
        .unwrap()
}

/// A successful completion body carrying `content`.
pub fn completion(content: impl Into<String>) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content.into()},
            "finish_reason": "stop"
        }]
    })
}

pub fn error_body(message: &str) -> Value {
    json!({"error": {"message": message, "type": "server_error"}})
}

/// All message contents of a request body, joined.
pub fn prompt_text(body: &Value) -> String {
    body["messages"]
        .as_array()
        .map(|msgs| {
            msgs.iter()
                .filter_map(|m| m["content"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

pub fn is_json_mode(body: &Value) -> bool {
    body["response_format"]["type"] == "json_object"
}
