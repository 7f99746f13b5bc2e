//! Retry behavior of the completion client, on a paused clock.

mod common;

use common::{completion, error_body, ScriptedTransport};
use novel_datagen::protocol::ChatRequest;
use novel_datagen::structured::{validator_fn, ValidationOutcome};
use novel_datagen::telemetry::InMemoryAttemptSink;
use novel_datagen::{CompletionClient, Error, Message};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const DELAY: Duration = Duration::from_secs(1);

fn request() -> ChatRequest {
    ChatRequest::new(vec![Message::user("第1章")]).tag("chapter-0")
}

fn client(transport: Arc<ScriptedTransport>, sink: Arc<InMemoryAttemptSink>) -> CompletionClient {
    CompletionClient::builder()
        .transport(transport)
        .max_retries(5)
        .retry_delay(DELAY)
        .attempt_sink(sink)
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn k_failures_then_success_waits_exactly_k_delays() {
    for k in 0..5usize {
        let transport = Arc::new(ScriptedTransport::new(move |_, n| {
            if n < k {
                Ok(error_body("overloaded"))
            } else {
                Ok(completion("好的"))
            }
        }));
        let sink = Arc::new(InMemoryAttemptSink::new(100));
        let client = client(transport.clone(), sink.clone());

        let started = Instant::now();
        let content = client.send(&request()).await.unwrap();

        assert_eq!(content, "好的");
        assert_eq!(transport.calls(), k + 1);
        assert_eq!(started.elapsed(), DELAY * k as u32);
        assert_eq!(sink.len(), k);
        assert!(sink.events().iter().all(|e| e.will_retry));
    }
}

#[tokio::test(start_paused = true)]
async fn always_failing_exhausts_after_max_retries() {
    let transport = Arc::new(ScriptedTransport::new(|_, _| Ok(error_body("down"))));
    let sink = Arc::new(InMemoryAttemptSink::new(100));
    let client = client(transport.clone(), sink.clone());

    let started = Instant::now();
    let err = client.send(&request()).await.unwrap_err();

    match &err {
        Error::RequestExhausted { attempts, last } => {
            assert_eq!(*attempts, 5);
            assert!(matches!(**last, Error::Endpoint { .. }));
        }
        other => panic!("expected RequestExhausted, got {other:?}"),
    }
    assert_eq!(transport.calls(), 5);
    assert_eq!(started.elapsed(), DELAY * 4);

    let events = sink.events();
    assert_eq!(events.len(), 5);
    assert_eq!(events[4].attempt, 5);
    assert!(!events[4].will_retry);
    assert_eq!(events[0].tag.as_deref(), Some("chapter-0"));
    assert!(events.iter().all(|e| e.request_id == events[0].request_id));
}

#[tokio::test(start_paused = true)]
async fn rejected_structure_is_retried_until_valid() {
    let transport = Arc::new(ScriptedTransport::new(|_, n| {
        let content = if n == 0 {
            json!({"conversations": "not a list"})
        } else {
            json!({"conversations": []})
        };
        Ok(completion(content.to_string()))
    }));
    let sink = Arc::new(InMemoryAttemptSink::new(10));
    let client = client(transport.clone(), sink.clone());
    let validator = validator_fn("conversations_list", |v| {
        if v["conversations"].is_array() {
            ValidationOutcome::Accepted
        } else {
            ValidationOutcome::reject("Expected array", "conversations")
        }
    });

    let value = client.send_structured(&request(), &validator).await.unwrap();

    assert_eq!(value, json!({"conversations": []}));
    assert_eq!(transport.calls(), 2);
    assert!(sink.events()[0].error.contains("conversations"));
    assert!(common::is_json_mode(&transport.bodies()[0]));
}

#[tokio::test(start_paused = true)]
async fn unparseable_content_surfaces_as_malformed_after_exhaustion() {
    let transport = Arc::new(ScriptedTransport::new(|_, _| Ok(completion("not json at all"))));
    let client = client(transport.clone(), Arc::new(InMemoryAttemptSink::new(10)));
    let validator = validator_fn("any", |_| ValidationOutcome::Accepted);

    let err = client
        .send_structured(&request(), &validator)
        .await
        .unwrap_err();

    assert!(matches!(
        err.last_attempt_error(),
        Error::MalformedResponse { .. }
    ));
    assert_eq!(transport.calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn missing_content_counts_as_failed_attempt() {
    let transport = Arc::new(ScriptedTransport::new(|_, n| {
        if n == 0 {
            Ok(json!({"choices": []}))
        } else {
            Ok(completion("ok"))
        }
    }));
    let client = client(transport.clone(), Arc::new(InMemoryAttemptSink::new(10)));
    assert_eq!(client.send(&request()).await.unwrap(), "ok");
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn non_attempt_errors_are_not_retried() {
    let transport = Arc::new(ScriptedTransport::new(|_, _| {
        Err(Error::configuration("transport misconfigured"))
    }));
    let client = client(transport.clone(), Arc::new(InMemoryAttemptSink::new(10)));

    let err = client.send(&request()).await.unwrap_err();

    assert!(matches!(err, Error::Configuration { .. }));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn seed_and_temperature_reach_the_body() {
    let transport = Arc::new(ScriptedTransport::new(|_, _| Ok(completion("ok"))));
    let client = client(transport.clone(), Arc::new(InMemoryAttemptSink::new(10)));

    client
        .send(&request().temperature(0.0).seed(42))
        .await
        .unwrap();
    client.send(&request().seed(0)).await.unwrap();

    let bodies = transport.bodies();
    assert_eq!(bodies[0]["seed"], 42);
    assert_eq!(bodies[0]["temperature"], 0.0);
    assert_eq!(bodies[0]["model"], "deepseek-chat");
    assert!(bodies[1].get("seed").is_none());
}
