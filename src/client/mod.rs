//! Request/retry client.
//!
//! [`CompletionClient::send`] and [`CompletionClient::send_structured`] each perform one
//! logical request: up to `max_retries` sequential attempts separated by a fixed delay.

mod builder;
mod core;
mod execution;
mod policy;

pub use builder::CompletionClientBuilder;
pub use self::core::CompletionClient;
pub use policy::{RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
