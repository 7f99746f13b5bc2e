//! Mock HTTP endpoint for transport tests.

use mockito::{Matcher, Mock, Server, ServerGuard};
use novel_datagen::CompletionClient;
use serde_json::Value;
use std::io::Write;
use std::time::Duration;

pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// HTTP client pointed at the mock server via `base_url_override`.
    pub fn client(&self, max_retries: u32) -> CompletionClient {
        self.client_with_timeout(max_retries, Duration::from_secs(5))
    }

    pub fn client_with_timeout(&self, max_retries: u32, timeout: Duration) -> CompletionClient {
        CompletionClient::builder()
            .base_url("https://unused.invalid")
            .base_url_override(&self.base_url)
            .api_key("sk-test")
            .max_retries(max_retries)
            .retry_delay(Duration::ZERO)
            .timeout(timeout)
            .build()
            .unwrap()
    }

    /// Accepts the request, then stalls for `stall` before finishing the body.
    pub async fn mock_stalled(&mut self, stall: Duration) -> Mock {
        self.server
            .mock("POST", COMPLETIONS_PATH)
            .with_status(200)
            .with_chunked_body(move |w| {
                std::thread::sleep(stall);
                w.write_all(b"{}")
            })
            .create_async()
            .await
    }

    /// JSON response for any authorized completion request whose body contains `partial`.
    pub async fn mock_json(
        &mut self,
        partial: Value,
        status: usize,
        body: &Value,
        hits: usize,
    ) -> Mock {
        self.server
            .mock("POST", COMPLETIONS_PATH)
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(partial))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(hits)
            .create_async()
            .await
    }

    pub async fn mock_raw(&mut self, status: usize, body: &str, hits: usize) -> Mock {
        self.server
            .mock("POST", COMPLETIONS_PATH)
            .with_status(status)
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }
}
