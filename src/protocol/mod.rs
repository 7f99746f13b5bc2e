//! OpenAI-compatible chat completion wire format.
//!
//! [`ChatRequest`] compiles to the `POST /v1/chat/completions` body; [`response`] turns the
//! returned body into content or a classified error.

pub mod request;
pub mod response;

pub use request::{ChatRequest, ResponseFormat, DEFAULT_TEMPERATURE};
pub use response::{extract_content, parse_json_content};
