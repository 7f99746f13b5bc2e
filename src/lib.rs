//! # novel-datagen
//!
//! Turn a plain-text novel into training datasets (pretraining chunks, sharegpt dialogues,
//! chapter QA pairs and alpaca records) through an OpenAI-compatible chat completion API.
//!
//! ## Overview
//!
//! The core is a bounded-concurrency request pipeline: chapters fan out as units, each unit
//! issues one or more requests with fixed-delay retries and optional structured validation,
//! and results come back addressable by chapter position. A chapter that exhausts its retries
//! is recorded as a failure and never aborts the batch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use novel_datagen::batch::{units_from, BatchExecutor};
//! use novel_datagen::protocol::ChatRequest;
//! use novel_datagen::source::split_by_title;
//! use novel_datagen::{CompletionClient, Message};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> novel_datagen::Result<()> {
//!     let client = Arc::new(
//!         CompletionClient::builder()
//!             .base_url("https://api.deepseek.com")
//!             .api_key("your-api-key")
//!             .build()?,
//!     );
//!
//!     let chapters = split_by_title("第1章 开始\n……\n第2章 继续\n……\n", None);
//!     let prompts = Arc::new(|unit: &novel_datagen::batch::Unit| {
//!         ChatRequest::new(vec![
//!             Message::system("Summarize this chapter in one sentence."),
//!             Message::user(unit.text.clone()),
//!         ])
//!     });
//!
//!     let outcome = BatchExecutor::new()
//!         .run_text(client, units_from(chapters), prompts)
//!         .await?;
//!     for (chapter, summary) in outcome.completed() {
//!         println!("{chapter}: {summary}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`source`] | Chapter splitting and pretraining chunk packing |
//! | [`client`] | Request/retry client and its builder |
//! | [`batch`] | Bounded concurrent pipeline |
//! | [`structured`] | Validators for JSON-mode responses |
//! | [`protocol`] | Chat completion request/response wire format |
//! | [`transport`] | HTTP transport |
//! | [`dataset`] | Conversation and alpaca records, reshaping, JSON output |
//! | [`tasks`] | Pretrain, dialogue and QA generation jobs |
//! | [`telemetry`] | Failed-attempt reporting |
//! | [`config`] | Environment-driven configuration |

pub mod batch;
pub mod client;
pub mod config;
pub mod dataset;
pub mod protocol;
pub mod source;
pub mod structured;
pub mod tasks;
pub mod telemetry;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{CompletionClient, CompletionClientBuilder};
pub use config::ClientConfig;
pub use telemetry::{AttemptEvent, AttemptSink};
pub use types::message::{Message, MessageRole};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
